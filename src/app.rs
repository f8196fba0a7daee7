use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::actions::Action;
use crate::config::Config;
use crate::menu::{generate_menu_command, menu_args, AgentInfo};
use crate::naming::{build_base_name, format_path, parse_pi_footer, window_name, PaneContext};
use crate::process::{
    extract_filename_from_args, is_agent, is_editor, resolve_program, ProcessTable,
};
use crate::status::{attention_count, detect_status, prioritize, StatusBridge, StatusIcon};
use crate::tmux::{group_by_window, Pane, TmuxClient, Window};

/// Printed by `--menu-cmd` when there is nothing to show
pub const NO_AGENTS_COMMAND: &str = "display-message \"No AI agents running\"";

/// Decide what to do with the attention baseline.
///
/// Returns whether to ring the bell and the baseline to store, if it changed.
pub fn attention_transition(last: usize, current: usize) -> (bool, Option<usize>) {
    let ring = current > last;
    let store = (current != last).then_some(current);
    (ring, store)
}

/// One invocation's worth of state
pub struct App {
    config: Config,
    tmux: TmuxClient,
    bridge: StatusBridge,
    /// Process table, held only while an action runs
    processes: Option<ProcessTable>,
}

impl App {
    pub fn new(config: Config) -> Self {
        let tmux = TmuxClient::new(config.command_timeout());
        let bridge = StatusBridge::new(config.status_dir.clone(), config.status_max_age());
        Self {
            config,
            tmux,
            bridge,
            processes: None,
        }
    }

    /// Run one action against a fresh snapshot of tmux and the process table
    pub async fn run(&mut self, action: Action) -> Result<()> {
        if !self.tmux.has_sessions().await {
            debug!("no tmux sessions");
            match action {
                Action::Menu => self.tmux.display_message("No tmux sessions").await?,
                Action::MenuCommand => println!("{}", NO_AGENTS_COMMAND),
                _ => {}
            }
            return Ok(());
        }

        self.load_process_table().await;
        let result = match action {
            Action::Rename => {
                self.rename_all().await;
                Ok(())
            }
            Action::Status => {
                self.print_status().await;
                Ok(())
            }
            Action::Menu => self.run_menu().await,
            Action::MenuCommand => {
                self.print_menu_command().await;
                Ok(())
            }
            Action::CheckAttention => self.check_attention().await,
            Action::Tick => {
                self.rename_all().await;
                self.check_attention().await
            }
        };
        self.clear_process_table();
        result
    }

    async fn load_process_table(&mut self) {
        self.processes = Some(ProcessTable::load(self.config.ps_timeout()).await);
    }

    fn clear_process_table(&mut self) {
        self.processes = None;
    }

    fn program_for(&self, pane: &Pane) -> String {
        match &self.processes {
            Some(table) => resolve_program(&pane.command, &pane.pid, table),
            None => resolve_program(&pane.command, &pane.pid, &ProcessTable::default()),
        }
    }

    fn editor_context(&self, pane: &Pane) -> Option<PaneContext> {
        let table = self.processes.as_ref()?;
        let cmdline = table
            .child_cmdline(&pane.pid)
            .or_else(|| table.process_cmdline(&pane.pid))?;
        extract_filename_from_args(cmdline).map(|filename| PaneContext {
            filename: Some(filename),
            ..Default::default()
        })
    }

    /// Status of one agent pane: its own report if it writes one, else the screen.
    async fn agent_status(
        &self,
        pane_id: &str,
        program: &str,
        captured: Option<&str>,
    ) -> StatusIcon {
        if StatusBridge::supports(program) {
            if let Some(status) = self.bridge.read(pane_id) {
                return status;
            }
        }
        match captured {
            Some(content) => detect_status(content, Some(program)),
            None => {
                let content = self
                    .tmux
                    .capture_pane(pane_id, self.config.capture_lines)
                    .await;
                detect_status(&content, Some(program))
            }
        }
    }

    // ── Rename sweep ───────────────────────────────────────────────────────

    async fn rename_all(&self) {
        let windows = group_by_window(self.tmux.list_all_panes().await);
        for window in &windows {
            if let Err(e) = self.rename_window(window).await {
                warn!("skipping window {}: {:#}", window.id, e);
            }
        }
    }

    async fn rename_window(&self, window: &Window) -> Result<()> {
        let Some(active) = window.active_pane() else {
            return Ok(());
        };
        let program = self.program_for(active);
        let path = format_path(&active.current_path);

        let agents: Vec<(&Pane, String)> = window
            .panes
            .iter()
            .filter_map(|pane| {
                let program = self.program_for(pane);
                is_agent(&program).then_some((pane, program))
            })
            .collect();

        let mut active_content = None;
        let mut context = None;
        if program == "pi" {
            let content = self
                .tmux
                .capture_pane(&active.pane_id, self.config.capture_lines)
                .await;
            context = Some(parse_pi_footer(&content)).filter(|c| !c.is_empty());
            active_content = Some(content);
        } else if is_editor(&program) {
            context = self.editor_context(active);
        }

        let base = build_base_name(&program, &path, context.as_ref());
        if base.is_empty() && program.is_empty() {
            return Ok(());
        }

        let status = if agents.is_empty() {
            None
        } else {
            let mut statuses = Vec::with_capacity(agents.len());
            for (pane, agent) in &agents {
                let captured = if pane.pane_id == active.pane_id {
                    active_content.as_deref()
                } else {
                    None
                };
                statuses.push(self.agent_status(&pane.pane_id, agent, captured).await);
            }
            Some(prioritize(statuses))
        };

        let name = window_name(
            &base,
            status,
            self.config.show_idle_icon,
            self.config.max_name_len,
        );
        if name != window.name {
            self.tmux
                .rename_window(&window.id, &name)
                .await
                .with_context(|| format!("renaming {} to {:?}", window.id, name))?;
        }
        Ok(())
    }

    // ── Agent listing ──────────────────────────────────────────────────────

    async fn all_agents(&self) -> Vec<AgentInfo> {
        let mut agents = Vec::new();
        for pane in self.tmux.list_all_panes().await {
            let program = self.program_for(&pane);
            if !is_agent(&program) {
                continue;
            }
            let status = self.agent_status(&pane.pane_id, &program, None).await;
            debug!(
                pane = %pane.pane_id,
                window = %pane.window_name,
                "{} is {:?}",
                program,
                status
            );
            agents.push(AgentInfo {
                session: pane.session_name,
                window_index: pane.window_index,
                window_name: pane.window_name,
                pane_id: pane.pane_id,
                program,
                status,
                path: format_path(&pane.current_path),
            });
        }
        agents
    }

    async fn print_status(&self) {
        let agents = self.all_agents().await;
        if agents.is_empty() {
            return;
        }
        let top = prioritize(agents.iter().map(|a| a.status));
        println!("{} {}", top, agents.len());
    }

    // ── Menu ───────────────────────────────────────────────────────────────

    async fn print_menu_command(&self) {
        let agents = self.all_agents().await;
        match generate_menu_command(&agents) {
            Some(cmd) => println!("{}", cmd),
            None => println!("{}", NO_AGENTS_COMMAND),
        }
    }

    async fn run_menu(&self) -> Result<()> {
        let agents = self.all_agents().await;
        if agents.is_empty() {
            return self.tmux.display_message("No AI agents running").await;
        }

        if let Err(e) = self.tmux.display_menu(&menu_args(&agents)).await {
            let _ = self.tmux.display_message(&format!("Error: {:#}", e)).await;
            return Err(e);
        }
        Ok(())
    }

    // ── Attention bell ─────────────────────────────────────────────────────

    async fn check_attention(&self) -> Result<()> {
        let agents = self.all_agents().await;
        let current = attention_count(agents.iter().map(|a| a.status));
        let var = self.config.attention_env_var.as_str();

        let last = self
            .tmux
            .show_global_env(var)
            .await
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let (ring, store) = attention_transition(last, current);
        debug!(last, current, ring, "attention check");
        if ring {
            self.tmux.ring_bell().await?;
        }
        if let Some(count) = store {
            self.tmux.set_global_env(var, &count.to_string()).await?;
        }
        Ok(())
    }
}
