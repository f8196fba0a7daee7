//! Pattern categories for pane-content status detection.
//!
//! Each category is a named group of regexes. Groups are composed into a
//! [`PatternSet`] per agent; detection walks the set's categories in a
//! fixed order and the first category with a match decides the status.

use once_cell::sync::Lazy;
use regex::Regex;

// ── Escape stripping ───────────────────────────────────────────────────────

static RE_CSI: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b\[[0-9;?]*[a-zA-Z]").unwrap());
static RE_OSC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").unwrap());
static RE_DCS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\x1b[PX^_][^\x1b]*\x1b\\").unwrap());
static RE_CTRL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F-\x{9F}]").unwrap());

/// Remove CSI, OSC and DCS sequences and stray control characters.
///
/// Newlines, tabs and all printable unicode (box drawing, status glyphs) survive.
pub fn strip_ansi(text: &str) -> String {
    let text = RE_CSI.replace_all(text, "");
    let text = RE_OSC.replace_all(&text, "");
    let text = RE_DCS.replace_all(&text, "");
    RE_CTRL.replace_all(&text, "").into_owned()
}

// ── Shared groups (any agent) ──────────────────────────────────────────────

const SHARED_ERROR: &[&str] = &[
    r"Traceback \(most recent call last\)",
    r"(?i)UnhandledPromiseRejection",
    r"(?i)FATAL ERROR",
    r"panic:",
    r"(?i)Error: .*(API|rate limit|connection|timeout)",
];

const SHARED_WAITING: &[&str] = &[
    r"(?i)Allow (?:once|always)\?",
    r"(?i)Do you want to (?:run|execute|allow)",
    r"(?i)(?:Approve|Confirm|Accept)\?.*\[Y/n\]",
    r"(?i)Press enter to continue",
    r"(?i)Waiting for (?:input|approval|confirmation)",
    r"(?i)Permission required",
    r"(?i)(?:yes|no|skip)\s*›",
];

const SHARED_BUSY: &[&str] = &[
    r"[⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏]",
    r"(?i)Thinking\.{2,}",
    r"(?i)(?:Running|Executing|Processing)\.{2,}",
    r"(?i)Working on",
    r"(?i)Analyzing",
    r"(?i)Reading (?:file|files)",
    r"(?i)Writing (?:to|file)",
    r"(?i)Searching",
    r"(?i)Calling tool",
];

const GENERIC_IDLE: &[&str] = &[
    r"(?im)Done\.\s*$",
    r"(?i)completed successfully",
    r"(?i)Session went idle",
    r"(?im)Finished\s*$",
    r"(?m)│\s*$",
    r"(?m)❯\s*$",
];

// ── pi ─────────────────────────────────────────────────────────────────────

const PI_BUSY: &[&str] = &[
    r"(?i)Working\.\.\.",
    r"(?i)to interrupt\)",
    r"(?i)Auto-compacting\.\.\.",
    r"(?i)Retrying \(\d+/\d+\)",
    r"(?i)Summarizing branch\.\.\.",
    r"(?i)Steering:",
    r"(?i)Follow-up:",
    r"(?i)to edit all queued",
];

/// Truncated tool output stays in scrollback long after the work finished
const PI_WEAK_BUSY: &[&str] = &[r"(?i)earlier lines,", r"(?i)more lines,"];

const PI_IDLE: &[&str] = &[
    r"(?i)\(anthropic\)\s+\S+",
    r"(?i)\(openai[^)]*\)\s+\S+",
    r"(?i)\(google\)\s+\S+",
    r"↑\d+(?:\.\d+)?k?\s+↓\d+(?:\.\d+)?k?",
    r"\$\d+\.\d{3}",
    r"\d+\.\d+%/\d+k?\s+\(auto\)",
    r"\bLSP\b",
    r"\bMCP:",
];

// ── Claude Code ────────────────────────────────────────────────────────────

const CLAUDE_BUSY: &[&str] = &[r"⎿", r"(?i)Esc to cancel"];

const CLAUDE_IDLE: &[&str] = &[
    r"(?m)>\s*$",
    r"(?i)What would you like",
    r"(?i)How can I help",
    r"\d+% of \d+k",
];

// ── Amp ────────────────────────────────────────────────────────────────────

const AMP_BUSY: &[&str] = &[r"≋", r"■■■", r"(?i)esc interrupt", r"(?i)Running tools"];

const AMP_IDLE: &[&str] = &[r"(?i)ctrl\+p commands", r"(?i)ctrl\+t variants"];

// ── OpenCode ───────────────────────────────────────────────────────────────

const OPENCODE_BUSY: &[&str] = &[r"(?i)Tool:"];

const OPENCODE_IDLE: &[&str] = &[r"OpenCode \d+\.\d+\.\d+"];

// ── Codex ──────────────────────────────────────────────────────────────────

const CODEX_WAITING: &[&str] = &[
    r"(?i)Allow Codex to (?:apply proposed code changes|run|execute)",
    r"(?i)patch-approval",
    r"(?i)exec-approval",
];

const CODEX_BUSY: &[&str] = &[r"(?i)esc to interrupt", r"(?i)Running (?:tools|commands?)"];

const CODEX_IDLE: &[&str] = &[
    r"(?i)tab to add notes",
    r"(?i)Compose new task",
    r"(?i)no message yet",
];

// ── Sets ───────────────────────────────────────────────────────────────────

/// Ordered pattern categories for one agent
#[derive(Debug)]
pub struct PatternSet {
    pub error: Vec<Regex>,
    pub waiting: Vec<Regex>,
    pub busy: Vec<Regex>,
    pub idle: Vec<Regex>,
    /// Busy signals that only count when no idle pattern matched
    pub weak_busy: Vec<Regex>,
}

impl PatternSet {
    fn new(
        error: &[&[&str]],
        waiting: &[&[&str]],
        busy: &[&[&str]],
        idle: &[&[&str]],
        weak_busy: &[&[&str]],
    ) -> Self {
        Self {
            error: compile(error),
            waiting: compile(waiting),
            busy: compile(busy),
            idle: compile(idle),
            weak_busy: compile(weak_busy),
        }
    }
}

fn compile(groups: &[&[&str]]) -> Vec<Regex> {
    groups
        .iter()
        .flat_map(|group| group.iter())
        .map(|p| Regex::new(p).unwrap())
        .collect()
}

static PI: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        &[SHARED_ERROR],
        &[SHARED_WAITING],
        &[PI_BUSY, SHARED_BUSY],
        &[PI_IDLE],
        &[PI_WEAK_BUSY],
    )
});

static CLAUDE: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        &[SHARED_ERROR],
        &[SHARED_WAITING],
        &[CLAUDE_BUSY, SHARED_BUSY],
        &[CLAUDE_IDLE],
        &[],
    )
});

static AMP: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        &[SHARED_ERROR],
        &[SHARED_WAITING],
        &[AMP_BUSY, SHARED_BUSY],
        &[AMP_IDLE],
        &[],
    )
});

static OPENCODE: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        &[SHARED_ERROR],
        &[SHARED_WAITING],
        &[OPENCODE_BUSY, SHARED_BUSY],
        &[OPENCODE_IDLE],
        &[],
    )
});

static CODEX: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        &[SHARED_ERROR],
        &[CODEX_WAITING, SHARED_WAITING],
        &[CODEX_BUSY, SHARED_BUSY],
        &[CODEX_IDLE],
        &[],
    )
});

/// Fallback for agents without tuned patterns: every busy and idle group
static DEFAULT: Lazy<PatternSet> = Lazy::new(|| {
    PatternSet::new(
        &[SHARED_ERROR],
        &[SHARED_WAITING],
        &[
            SHARED_BUSY,
            PI_BUSY,
            CLAUDE_BUSY,
            AMP_BUSY,
            OPENCODE_BUSY,
            CODEX_BUSY,
        ],
        &[
            PI_IDLE,
            CLAUDE_IDLE,
            AMP_IDLE,
            OPENCODE_IDLE,
            CODEX_IDLE,
            GENERIC_IDLE,
        ],
        &[],
    )
});

/// Pattern set tuned for `agent`, or the default set
pub fn patterns_for(agent: Option<&str>) -> &'static PatternSet {
    match agent {
        Some("pi") => &PI,
        Some("claude") => &CLAUDE,
        Some("amp") => &AMP,
        Some("opencode") => &OPENCODE,
        Some("codex") => &CODEX,
        _ => &DEFAULT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_sets_compile() {
        let agents = [
            None,
            Some("pi"),
            Some("claude"),
            Some("amp"),
            Some("opencode"),
            Some("codex"),
        ];
        for agent in agents {
            let set = patterns_for(agent);
            assert!(!set.error.is_empty());
            assert!(!set.waiting.is_empty());
            assert!(!set.busy.is_empty());
            assert!(!set.idle.is_empty());
        }
    }

    #[test]
    fn test_only_pi_has_weak_busy() {
        assert!(!patterns_for(Some("pi")).weak_busy.is_empty());
        assert!(patterns_for(Some("claude")).weak_busy.is_empty());
        assert!(patterns_for(None).weak_busy.is_empty());
    }

    #[test]
    fn test_unlisted_agent_uses_default() {
        assert!(std::ptr::eq(patterns_for(Some("aider")), patterns_for(None)));
    }

    #[test]
    fn test_strip_ansi_removes_csi() {
        assert_eq!(strip_ansi("\x1b[32mgreen\x1b[0m normal"), "green normal");
    }

    #[test]
    fn test_strip_ansi_removes_osc_and_dcs() {
        assert_eq!(strip_ansi("\x1b]0;title\x07text"), "text");
        assert_eq!(strip_ansi("\x1b]8;;http://x\x1b\\link"), "link");
        assert_eq!(strip_ansi("a\x1bPq#0;2\x1b\\b"), "ab");
    }

    #[test]
    fn test_strip_ansi_keeps_newlines_drops_controls() {
        assert_eq!(strip_ansi("line1\x00\x1f\nline2"), "line1\nline2");
    }

    #[test]
    fn test_strip_ansi_preserves_unicode() {
        let text = "─────╯\n● □ ■ ▲ ◇ ⠋ π";
        assert_eq!(strip_ansi(text), text);
    }
}
