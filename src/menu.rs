//! Agent management menu for `tmux display-menu`.

use std::cmp::Ordering;

use crate::status::{attention_count, prioritize, StatusIcon};

const MENU_TITLE: &str = "Agent Management";
const MAX_MENU_PATH: usize = 20;
const KEYED_ENTRIES: usize = 9;

/// One detected agent pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentInfo {
    pub session: String,
    pub window_index: String,
    pub window_name: String,
    pub pane_id: String,
    pub program: String,
    pub status: StatusIcon,
    pub path: String,
}

impl AgentInfo {
    fn target(&self) -> String {
        format!("{}:{}", self.session, self.window_index)
    }

    /// `switch-client` to the agent's window, then focus its pane
    fn select_action(&self) -> String {
        if self.pane_id.is_empty() {
            format!("switch-client -t {}", self.target())
        } else {
            format!(
                "switch-client -t {} ; select-pane -t {}",
                self.target(),
                self.pane_id
            )
        }
    }

    fn label(&self, icon: &str) -> String {
        let mut label = format!("{} {} {}", icon, self.program, self.target());
        let path = short_menu_path(&self.path);
        if !path.is_empty() {
            label.push(' ');
            label.push_str(&path);
        }
        label
    }
}

fn short_menu_path(path: &str) -> String {
    let len = path.chars().count();
    if len <= MAX_MENU_PATH {
        return path.to_string();
    }
    let tail: String = path.chars().skip(len - (MAX_MENU_PATH - 3)).collect();
    format!("...{}", tail)
}

fn compare_window_index(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Most urgent first, then by session, then by window index.
pub fn sort_agents(agents: &[AgentInfo]) -> Vec<&AgentInfo> {
    let mut sorted: Vec<&AgentInfo> = agents.iter().collect();
    sorted.sort_by(|a, b| {
        a.status
            .priority()
            .cmp(&b.status.priority())
            .then_with(|| a.session.cmp(&b.session))
            .then_with(|| compare_window_index(&a.window_index, &b.window_index))
    });
    sorted
}

fn header(agents: &[AgentInfo], icon: &str) -> String {
    let attention = attention_count(agents.iter().map(|a| a.status));
    if attention > 0 {
        format!("{} {} agents ({} need attention)", icon, agents.len(), attention)
    } else {
        format!("{} {} agents", icon, agents.len())
    }
}

fn aggregate(agents: &[AgentInfo]) -> StatusIcon {
    prioritize(agents.iter().map(|a| a.status))
}

fn menu_key(position: usize) -> String {
    if position < KEYED_ENTRIES {
        (position + 1).to_string()
    } else {
        String::new()
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Full `display-menu` command as one string, for tmux key bindings.
///
/// `None` when there are no agents: callers should show no menu at all.
pub fn generate_menu_command(agents: &[AgentInfo]) -> Option<String> {
    if agents.is_empty() {
        return None;
    }

    let mut items: Vec<[String; 3]> = Vec::new();
    items.push([header(agents, aggregate(agents).glyph()), String::new(), String::new()]);
    items.push(["-".to_string(), String::new(), String::new()]);

    for (i, agent) in sort_agents(agents).into_iter().enumerate() {
        items.push([
            agent.label(agent.status.glyph()),
            menu_key(i),
            agent.select_action(),
        ]);
    }

    items.push(["-".to_string(), String::new(), String::new()]);
    items.push([
        "Refresh".to_string(),
        "r".to_string(),
        "run-shell -b \"#{TMUX_SMART_NAME_MENU_CMD}\"".to_string(),
    ]);
    items.push(["Close".to_string(), "q".to_string(), String::new()]);

    let body = items
        .iter()
        .map(|item| item.iter().map(|s| quote(s)).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join(" ");

    Some(format!(
        "display-menu -T {} -x C -y C {}",
        quote(MENU_TITLE),
        body
    ))
}

/// Argument vector for running `tmux display-menu` directly.
///
/// Colored icons, and an interrupt entry under every busy agent.
pub fn menu_args(agents: &[AgentInfo]) -> Vec<String> {
    let mut args: Vec<String> = ["-T", MENU_TITLE, "-x", "C", "-y", "C", "-C", "1"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut push = |label: String, key: String, action: String| {
        args.push(label);
        args.push(key);
        args.push(action);
    };

    push(header(agents, aggregate(agents).colorize()), String::new(), String::new());
    push(String::new(), String::new(), String::new());

    for (i, agent) in sort_agents(agents).into_iter().enumerate() {
        push(
            agent.label(agent.status.colorize()),
            menu_key(i),
            agent.select_action(),
        );
        if agent.status == StatusIcon::Busy && !agent.pane_id.is_empty() {
            push(
                "  ⏹ Interrupt".to_string(),
                String::new(),
                format!("send-keys -t {} Escape", agent.pane_id),
            );
        }
    }

    push(String::new(), String::new(), String::new());
    push("Close".to_string(), "q".to_string(), String::new());
    args
}
