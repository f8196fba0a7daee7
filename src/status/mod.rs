mod bridge;
mod detect;
mod patterns;

pub use bridge::StatusBridge;
pub use detect::detect_status;

use std::fmt;

/// Inferred activity state of an agent pane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusIcon {
    /// Sitting at its prompt
    Idle,
    /// Actively working (spinner, tool call)
    Busy,
    /// Blocked on a confirmation or permission prompt
    Waiting,
    /// Crashed or reporting a failure
    Error,
    /// Nothing recognizable on screen
    #[default]
    Unknown,
}

/// Urgency order, most urgent first. Aggregation and menu sorting both read this table.
const PRIORITY: [StatusIcon; 5] = [
    StatusIcon::Error,
    StatusIcon::Unknown,
    StatusIcon::Waiting,
    StatusIcon::Busy,
    StatusIcon::Idle,
];

impl StatusIcon {
    /// Position in the urgency table (lower = more urgent)
    pub fn priority(self) -> usize {
        PRIORITY
            .iter()
            .position(|s| *s == self)
            .unwrap_or(PRIORITY.len())
    }

    pub fn glyph(self) -> &'static str {
        match self {
            StatusIcon::Idle => "□",
            StatusIcon::Busy => "●",
            StatusIcon::Waiting => "■",
            StatusIcon::Error => "▲",
            StatusIcon::Unknown => "◇",
        }
    }

    /// Glyph wrapped in a tmux color format
    pub fn colorize(self) -> &'static str {
        match self {
            StatusIcon::Idle => "#[fg=blue]□#[default]",
            StatusIcon::Busy => "#[fg=cyan]●#[default]",
            StatusIcon::Waiting => "#[fg=yellow]■#[default]",
            StatusIcon::Error => "#[fg=red]▲#[default]",
            StatusIcon::Unknown => "#[fg=magenta]◇#[default]",
        }
    }

    /// Whether the user probably has to step in
    pub fn needs_attention(self) -> bool {
        matches!(
            self,
            StatusIcon::Error | StatusIcon::Waiting | StatusIcon::Unknown
        )
    }
}

impl fmt::Display for StatusIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.glyph())
    }
}

/// Reduce many pane statuses to the most urgent one. Empty input is idle.
pub fn prioritize<I>(statuses: I) -> StatusIcon
where
    I: IntoIterator<Item = StatusIcon>,
{
    statuses
        .into_iter()
        .min_by_key(|s| s.priority())
        .unwrap_or(StatusIcon::Idle)
}

/// Number of statuses that need the user
pub fn attention_count<I>(statuses: I) -> usize
where
    I: IntoIterator<Item = StatusIcon>,
{
    statuses.into_iter().filter(|s| s.needs_attention()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use StatusIcon::*;

    #[test]
    fn test_prioritize_empty_is_idle() {
        assert_eq!(prioritize(Vec::<StatusIcon>::new()), Idle);
    }

    #[test]
    fn test_prioritize_table() {
        let cases: &[(&[StatusIcon], StatusIcon)] = &[
            (&[Idle], Idle),
            (&[Busy, Idle], Busy),
            (&[Waiting, Busy], Waiting),
            (&[Unknown, Waiting], Unknown),
            (&[Error, Unknown], Error),
            (&[Idle, Busy, Waiting, Error], Error),
        ];
        for (input, expected) in cases {
            assert_eq!(prioritize(input.iter().copied()), *expected, "{:?}", input);
        }
    }

    #[test]
    fn test_error_always_wins_regardless_of_order() {
        let all = [Idle, Busy, Waiting, Unknown, Error, Error, Idle];
        for rotation in 0..all.len() {
            let mut statuses = all.to_vec();
            statuses.rotate_left(rotation);
            assert_eq!(prioritize(statuses.clone()), Error);
            statuses.reverse();
            assert_eq!(prioritize(statuses), Error);
        }
    }

    #[test]
    fn test_priority_is_total_order() {
        let ranks: Vec<usize> = [Error, Unknown, Waiting, Busy, Idle]
            .iter()
            .map(|s| s.priority())
            .collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_attention_set() {
        assert!(Error.needs_attention());
        assert!(Waiting.needs_attention());
        assert!(Unknown.needs_attention());
        assert!(!Busy.needs_attention());
        assert!(!Idle.needs_attention());
        assert_eq!(attention_count([Error, Busy, Unknown, Idle]), 2);
    }

    #[test]
    fn test_colorize_wraps_glyph() {
        for icon in [Idle, Busy, Waiting, Error, Unknown] {
            let colored = icon.colorize();
            assert!(colored.starts_with("#[fg="));
            assert!(colored.contains(icon.glyph()));
            assert!(colored.ends_with("#[default]"));
        }
        assert_eq!(Error.colorize(), "#[fg=red]▲#[default]");
    }
}
