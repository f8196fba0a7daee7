mod client;

pub use client::TmuxClient;

/// One tmux pane, as listed by `list-panes -a`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pane {
    /// Pane ID (e.g., "%3")
    pub pane_id: String,
    /// PID of the pane's shell
    pub pid: String,
    /// `pane_current_command`
    pub command: String,
    /// `pane_current_path`
    pub current_path: String,
    /// Whether this is the window's active pane
    pub active: bool,
    pub session_name: String,
    /// Window ID (e.g., "@1")
    pub window_id: String,
    pub window_index: String,
    pub window_name: String,
}

/// A window and its panes, in tmux's listing order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    pub id: String,
    pub name: String,
    pub panes: Vec<Pane>,
}

impl Window {
    /// The active pane, or the first one if tmux reported none
    pub fn active_pane(&self) -> Option<&Pane> {
        self.panes.iter().find(|p| p.active).or(self.panes.first())
    }
}

/// Group a flat pane listing into windows, keeping first-seen order.
pub fn group_by_window(panes: Vec<Pane>) -> Vec<Window> {
    let mut windows: Vec<Window> = Vec::new();
    for pane in panes {
        match windows.iter_mut().find(|w| w.id == pane.window_id) {
            Some(window) => window.panes.push(pane),
            None => windows.push(Window {
                id: pane.window_id.clone(),
                name: pane.window_name.clone(),
                panes: vec![pane],
            }),
        }
    }
    windows
}
