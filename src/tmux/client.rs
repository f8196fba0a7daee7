use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use super::Pane;
use crate::exec;

const PANE_FORMAT: &str = concat!(
    "#{session_name}\t#{window_id}\t#{window_index}\t#{window_name}\t",
    "#{pane_id}\t#{pane_pid}\t#{pane_current_command}\t#{pane_current_path}\t#{pane_active}"
);

/// Client for interacting with tmux via CLI
#[derive(Debug, Clone)]
pub struct TmuxClient {
    /// Path to tmux binary
    tmux_path: String,
    /// Upper bound for every tmux invocation
    timeout: Duration,
}

impl TmuxClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            tmux_path: "tmux".to_string(),
            timeout,
        }
    }

    /// Client for a tmux binary at a fixed path
    #[cfg(test)]
    pub(crate) fn with_binary(tmux_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            tmux_path: tmux_path.into(),
            timeout,
        }
    }

    /// Run tmux and return its non-empty output lines. Failures give no lines.
    async fn lines(&self, args: &[&str]) -> Vec<String> {
        exec::run_or_empty(&self.tmux_path, args, self.timeout)
            .await
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Run tmux for its side effect
    async fn run(&self, args: &[&str]) -> Result<()> {
        exec::run(&self.tmux_path, args, self.timeout)
            .await
            .with_context(|| format!("tmux {}", args.first().copied().unwrap_or("")))?;
        Ok(())
    }

    /// Check if the tmux server has any session
    pub async fn has_sessions(&self) -> bool {
        !self
            .lines(&["list-sessions", "-F", "#{session_id}"])
            .await
            .is_empty()
    }

    /// Every pane of every session, in one call
    pub async fn list_all_panes(&self) -> Vec<Pane> {
        self.lines(&["list-panes", "-a", "-F", PANE_FORMAT])
            .await
            .iter()
            .filter_map(|line| parse_pane_line(line))
            .collect()
    }

    /// Last `lines` lines of a pane's scrollback as plain text
    pub async fn capture_pane(&self, pane_id: &str, lines: usize) -> String {
        let start = format!("-{}", lines);
        self.lines(&["capture-pane", "-p", "-t", pane_id, "-S", &start])
            .await
            .join("\n")
    }

    pub async fn rename_window(&self, window_id: &str, name: &str) -> Result<()> {
        debug!("rename {} -> {:?}", window_id, name);
        self.run(&["rename-window", "-t", window_id, name]).await
    }

    pub async fn display_menu(&self, args: &[String]) -> Result<()> {
        let mut full = vec!["display-menu"];
        full.extend(args.iter().map(String::as_str));
        self.run(&full).await
    }

    pub async fn display_message(&self, message: &str) -> Result<()> {
        self.run(&["display-message", message]).await
    }

    /// Value of a global environment variable, `None` if unset
    pub async fn show_global_env(&self, name: &str) -> Option<String> {
        self.lines(&["show-environment", "-g", name])
            .await
            .first()
            .and_then(|line| parse_env_line(line, name))
    }

    pub async fn set_global_env(&self, name: &str, value: &str) -> Result<()> {
        self.run(&["set-environment", "-g", name, value]).await
    }

    /// Ring the terminal bell in the attached client
    pub async fn ring_bell(&self) -> Result<()> {
        self.run(&["run-shell", "-b", "printf '\\a'"]).await
    }
}

/// Parse one `PANE_FORMAT` line
fn parse_pane_line(line: &str) -> Option<Pane> {
    let mut fields = line.splitn(9, '\t');
    let mut next = || fields.next().map(str::to_string);

    // Fields in PANE_FORMAT order
    Some(Pane {
        session_name: next()?,
        window_id: next()?,
        window_index: next()?,
        window_name: next()?,
        pane_id: next()?,
        pid: next()?,
        command: next()?,
        current_path: next()?,
        active: next()? == "1",
    })
}

/// `NAME=value` → `value`; `-NAME` (unset) → `None`
fn parse_env_line(line: &str, name: &str) -> Option<String> {
    line.trim()
        .strip_prefix(name)?
        .strip_prefix('=')
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pane_line() {
        let line = "work\t@3\t2\tπ ~/s/app\t%7\t4242\tzsh\t/home/elle/src/app\t1";
        let pane = parse_pane_line(line).unwrap();
        assert_eq!(pane.session_name, "work");
        assert_eq!(pane.window_id, "@3");
        assert_eq!(pane.window_index, "2");
        assert_eq!(pane.window_name, "π ~/s/app");
        assert_eq!(pane.pane_id, "%7");
        assert_eq!(pane.pid, "4242");
        assert_eq!(pane.command, "zsh");
        assert_eq!(pane.current_path, "/home/elle/src/app");
        assert!(pane.active);
    }

    #[test]
    fn test_parse_pane_line_empty_window_name() {
        let pane = parse_pane_line("s\t@1\t0\t\t%1\t1\tbash\t/\t0").unwrap();
        assert_eq!(pane.window_name, "");
        assert!(!pane.active);
    }

    #[test]
    fn test_parse_pane_line_too_short() {
        assert_eq!(parse_pane_line("s\t@1\t0"), None);
        assert_eq!(parse_pane_line(""), None);
    }

    #[test]
    fn test_parse_env_line() {
        let var = "TMUX_AGENT_LAST_ATTENTION";
        assert_eq!(parse_env_line("TMUX_AGENT_LAST_ATTENTION=3", var), Some("3".to_string()));
        assert_eq!(parse_env_line("-TMUX_AGENT_LAST_ATTENTION", var), None);
        assert_eq!(parse_env_line("OTHER=1", var), None);
    }

    #[tokio::test]
    async fn test_missing_tmux_degrades_to_empty() {
        let client =
            TmuxClient::with_binary("tmux-smart-name-no-such-tmux", Duration::from_secs(1));
        assert!(!client.has_sessions().await);
        assert!(client.list_all_panes().await.is_empty());
        assert_eq!(client.capture_pane("%1", 20).await, "");
        assert_eq!(client.show_global_env("X").await, None);
        assert!(client.rename_window("@1", "x").await.is_err());
    }
}
