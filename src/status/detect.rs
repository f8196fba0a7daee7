use regex::Regex;

use super::patterns::{patterns_for, strip_ansi};
use super::StatusIcon;

fn matches_any(content: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|re| re.is_match(content))
}

/// Classify captured pane text.
///
/// Categories are checked error → waiting → busy → idle → weak busy; the
/// first hit wins. Blank or unrecognized text is `Unknown`.
pub fn detect_status(content: &str, agent: Option<&str>) -> StatusIcon {
    if content.trim().is_empty() {
        return StatusIcon::Unknown;
    }

    let clean = strip_ansi(content);
    if clean.trim().is_empty() {
        return StatusIcon::Unknown;
    }

    let patterns = patterns_for(agent);

    if matches_any(&clean, &patterns.error) {
        StatusIcon::Error
    } else if matches_any(&clean, &patterns.waiting) {
        StatusIcon::Waiting
    } else if matches_any(&clean, &patterns.busy) {
        StatusIcon::Busy
    } else if matches_any(&clean, &patterns.idle) {
        StatusIcon::Idle
    } else if matches_any(&clean, &patterns.weak_busy) {
        StatusIcon::Busy
    } else {
        StatusIcon::Unknown
    }
}
