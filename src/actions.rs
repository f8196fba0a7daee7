/// What a single invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Rename every window from its panes
    #[default]
    Rename,
    /// Print the aggregate icon and agent count
    Status,
    /// Show the agent menu now
    Menu,
    /// Print the `display-menu` command for key bindings
    MenuCommand,
    /// Ring the bell when more agents need attention than last time
    CheckAttention,
    /// Rename, then check attention
    Tick,
}

impl Action {
    /// Pick the action from the mode flags; no flag means rename.
    pub fn from_flags(
        status: bool,
        menu: bool,
        menu_cmd: bool,
        check_attention: bool,
        tick: bool,
    ) -> Self {
        if status {
            Action::Status
        } else if menu {
            Action::Menu
        } else if menu_cmd {
            Action::MenuCommand
        } else if check_attention {
            Action::CheckAttention
        } else if tick {
            Action::Tick
        } else {
            Action::Rename
        }
    }
}
