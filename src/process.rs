//! Foreground program resolution for tmux panes.
//!
//! tmux only reports the pane's own command (usually a shell or an
//! interpreter). The real program is found with a single hop through a
//! process table captured once per invocation.

use std::collections::HashMap;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::exec;

pub const SHELLS: &[&str] = &["bash", "zsh", "sh", "fish"];
pub const WRAPPERS: &[&str] = &["node", "python3", "python", "ruby", "bun"];

/// Terminal AI coding agents. Open-ended: status patterns are only tuned for some.
pub const AGENT_PROGRAMS: &[&str] = &[
    "claude",
    "codex",
    "gemini",
    "amp",
    "opencode",
    "pi",
    "aider",
    "goose",
    "mentat",
    "cline",
    "cursor",
    "zed",
    "warp",
    "continue",
    "sweep",
    "gpt-engineer",
    "gpt-pilot",
    "plandex",
    "devon",
    "roo",
];

/// Alternate binary names of agents
const AGENT_ALIASES: &[(&str, &str)] = &[("oc", "opencode"), ("codex-cli", "codex")];

const EDITORS: &[&str] = &["nvim", "vim", "vi"];

/// Programs whose window name includes the working directory
const DIR_TOOLS: &[&str] = &["nvim", "vim", "vi", "git", "jjui"];

/// Marker of our own command line, skipped during child lookup
const SELF_NAME: &str = "smart-name";

pub fn is_shell(program: &str) -> bool {
    SHELLS.contains(&program)
}

pub fn is_agent(program: &str) -> bool {
    AGENT_PROGRAMS.contains(&program)
}

pub fn is_editor(program: &str) -> bool {
    EDITORS.contains(&program)
}

pub fn is_dir_program(program: &str) -> bool {
    DIR_TOOLS.contains(&program) || is_agent(program)
}

fn alias_of(name: &str) -> Option<&'static str> {
    AGENT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, canonical)| *canonical)
}

static RE_AGENT: Lazy<Regex> = Lazy::new(|| {
    let mut names: Vec<&str> = AGENT_PROGRAMS
        .iter()
        .copied()
        .chain(AGENT_ALIASES.iter().map(|(alias, _)| *alias))
        .collect();
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    names.dedup();
    let alternation = names
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)(?:^|[ /])({})(?:\s|$|[/.:-])", alternation)).unwrap()
});
static RE_ENV_ASSIGN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=").unwrap());
static RE_SCRIPT_EXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(?:mjs|cjs|js|ts|jsx|tsx)$").unwrap());
static RE_LEADING_JUNK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^A-Za-z0-9@]+").unwrap());
static RE_TRAILING_JUNK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9-]+$").unwrap());

// ── Process table ──────────────────────────────────────────────────────────

/// One row of `ps -a -opid=,ppid=,command=`; pids live in the indexes
#[derive(Debug, Clone, PartialEq, Eq)]
struct PsEntry {
    cmdline: String,
}

/// Snapshot of the process table, indexed by pid and parent pid
#[derive(Debug, Default)]
pub struct ProcessTable {
    entries: Vec<PsEntry>,
    by_pid: HashMap<String, usize>,
    by_parent: HashMap<String, Vec<usize>>,
}

impl ProcessTable {
    /// Snapshot via one `ps` call. Failure gives an empty table.
    pub async fn load(timeout: Duration) -> Self {
        let output = exec::run_or_empty("ps", &["-a", "-opid=,ppid=,command="], timeout).await;
        let table = Self::parse(&output);
        if table.is_empty() {
            debug!("process table is empty");
        } else {
            debug!("process table: {} entries", table.len());
        }
        table
    }

    pub fn parse(output: &str) -> Self {
        let mut table = Self::default();
        for line in output.lines() {
            let mut parts = line.split_whitespace();
            let (Some(pid), Some(ppid)) = (parts.next(), parts.next()) else {
                continue;
            };
            let cmdline = parts.collect::<Vec<_>>().join(" ");
            if cmdline.is_empty() {
                continue;
            }

            let idx = table.entries.len();
            table.by_pid.insert(pid.to_string(), idx);
            table
                .by_parent
                .entry(ppid.to_string())
                .or_default()
                .push(idx);
            table.entries.push(PsEntry { cmdline });
        }
        table
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Command line of the first direct child of `pane_pid`.
    ///
    /// Our own invocations and login shells (`-zsh`) are skipped.
    pub fn child_cmdline(&self, pane_pid: &str) -> Option<&str> {
        if pane_pid.is_empty() {
            return None;
        }
        self.by_parent
            .get(pane_pid)?
            .iter()
            .map(|&idx| &self.entries[idx])
            .find(|entry| {
                let first = entry.cmdline.split_whitespace().next().unwrap_or("");
                !entry.cmdline.contains(SELF_NAME) && !first.starts_with('-')
            })
            .map(|entry| entry.cmdline.as_str())
    }

    /// Command line of the process `pid` itself
    pub fn process_cmdline(&self, pid: &str) -> Option<&str> {
        self.by_pid
            .get(pid)
            .map(|&idx| self.entries[idx].cmdline.as_str())
    }
}

// ── Normalization ──────────────────────────────────────────────────────────

fn base_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

fn canonical_agent(name: &str) -> Option<String> {
    let lowered = name.to_lowercase();
    if let Some(canonical) = alias_of(&lowered) {
        return Some(canonical.to_string());
    }
    is_agent(&lowered).then_some(lowered)
}

/// Names a token might stand for: the whole token, its basename, each path
/// segment, each with and without a script extension.
fn candidates(token: &str) -> Vec<String> {
    let cleaned = token.trim_matches(|c| c == '\'' || c == '"');
    let mut values: Vec<String> = Vec::new();
    if cleaned.is_empty() {
        return values;
    }

    let mut add = |raw: &str| {
        let value = RE_LEADING_JUNK.replace(raw, "");
        let value = RE_TRAILING_JUNK.replace(&value, "").to_lowercase();
        let value = value.strip_prefix('-').unwrap_or(&value).to_string();
        if value.is_empty() {
            return;
        }
        let bare = RE_SCRIPT_EXT.replace(&value, "").into_owned();
        for v in [value, bare] {
            if !v.is_empty() && !values.contains(&v) {
                values.push(v);
            }
        }
    };

    add(cleaned);
    add(base_name(cleaned));
    for segment in cleaned.split('/') {
        add(segment);
    }
    values
}

fn agent_from_cmdline(cmdline: &str) -> Option<String> {
    let found = cmdline
        .split_whitespace()
        .filter(|token| !RE_ENV_ASSIGN.is_match(token))
        .flat_map(candidates)
        .find_map(|candidate| canonical_agent(&candidate));
    if found.is_some() {
        return found;
    }

    RE_AGENT.captures(cmdline).map(|caps| {
        let name = &caps[1];
        canonical_agent(name).unwrap_or_else(|| name.to_lowercase())
    })
}

/// Canonical program name for a full command line.
///
/// Known agents are recognized anywhere in the line (npx wrappers, script
/// paths, aliases); anything else is the basename of the first word.
pub fn normalize_program(cmdline: &str) -> String {
    if cmdline.trim().is_empty() {
        return String::new();
    }

    if let Some(agent) = agent_from_cmdline(cmdline) {
        return agent;
    }

    let first = cmdline.split_whitespace().next().unwrap_or("");
    let name = base_name(first);
    let name = name.strip_prefix('-').unwrap_or(name);
    canonical_agent(name).unwrap_or_else(|| name.to_string())
}

/// Program actually running in a pane.
///
/// Agents reported by tmux are trusted as-is; shells and interpreter
/// wrappers are looked through to their first child.
pub fn resolve_program(pane_command: &str, pane_pid: &str, table: &ProcessTable) -> String {
    if is_agent(pane_command) {
        return pane_command.to_string();
    }
    if let Some(canonical) = alias_of(pane_command) {
        return canonical.to_string();
    }

    let wraps = is_shell(pane_command) || WRAPPERS.contains(&pane_command);
    if wraps && !pane_pid.is_empty() {
        if let Some(child) = table.child_cmdline(pane_pid) {
            let program = normalize_program(child);
            if !program.is_empty() {
                return program;
            }
        }
    }
    pane_command.to_string()
}

/// Editor flags that consume the following argument
const EDITOR_FLAGS_WITH_ARGS: &[&str] = &[
    "-c",
    "--cmd",
    "-u",
    "-U",
    "-s",
    "-w",
    "-W",
    "-T",
    "-d",
    "--servername",
    "--server-name",
    "--listen",
    "--remote-send",
    "--remote-expr",
];

/// Basename of the first file argument of an editor command line.
///
/// `nvim src/index.ts` gives `index.ts`; `vim -c cmd file.go` gives `file.go`.
pub fn extract_filename_from_args(cmdline: &str) -> Option<String> {
    let mut skip_next = false;
    for token in cmdline.split_whitespace().skip(1) {
        if skip_next {
            skip_next = false;
            continue;
        }
        if token.starts_with('-') || token.starts_with('+') {
            skip_next = EDITOR_FLAGS_WITH_ARGS.contains(&token);
            continue;
        }
        let base = base_name(token);
        if base.is_empty() || base == "." || base == ".." {
            continue;
        }
        return Some(base.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_program() {
        let cases = [
            ("node /opt/opencode/bin/oc", "opencode"),
            ("/usr/local/bin/opencode --foo", "opencode"),
            ("oc -m claude", "opencode"),
            ("claude --model sonnet", "claude"),
            ("pi --help", "pi"),
            ("amp --config foo", "amp"),
            ("aider --model gpt-4", "aider"),
            ("goose session start", "goose"),
            ("codex --full-auto", "codex"),
            ("codex-cli exec", "codex"),
            ("gemini chat", "gemini"),
            ("mentat .", "mentat"),
            ("gpt-engineer start", "gpt-engineer"),
            ("gpt-pilot run", "gpt-pilot"),
            ("npx @anthropic-ai/claude-code", "claude"),
            ("node /home/u/.bun/bin/pi.js", "pi"),
            ("FOO=1 aider", "aider"),
            ("python script.py", "python"),
            ("nvim file.txt", "nvim"),
            ("-zsh", "zsh"),
            ("/bin/bash -l", "bash"),
            ("", ""),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_program(input), expected, "{:?}", input);
        }
    }

    #[test]
    fn test_agent_list_covers_major_agents() {
        for agent in [
            "opencode", "claude", "amp", "pi", "aider", "goose", "codex", "gemini", "mentat",
            "cursor", "zed",
        ] {
            assert!(is_agent(agent), "{}", agent);
        }
    }

    const PS_OUTPUT: &str = "  100     1 -zsh
  200   100 -zsh
  201   100 node /usr/lib/node_modules/tmux-smart-name/dist/index.js
  202   100 claude --resume
  300     1 zsh
  301   300 nvim src/main.rs
  400     1 bash
  500     1 python3
  501   500 python3 /opt/aider/bin/aider --model x
";

    #[test]
    fn test_parse_skips_short_lines() {
        let table = ProcessTable::parse("  12\n\n 13 1\n 14 1 sleep 10\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.process_cmdline("14"), Some("sleep 10"));
    }

    #[test]
    fn test_child_lookup_skips_self_and_login_shells() {
        let table = ProcessTable::parse(PS_OUTPUT);
        assert_eq!(table.child_cmdline("100"), Some("claude --resume"));
        assert_eq!(table.child_cmdline("300"), Some("nvim src/main.rs"));
        assert_eq!(table.child_cmdline("400"), None);
        assert_eq!(table.child_cmdline(""), None);
    }

    #[test]
    fn test_process_cmdline() {
        let table = ProcessTable::parse(PS_OUTPUT);
        assert_eq!(table.process_cmdline("301"), Some("nvim src/main.rs"));
        assert_eq!(table.process_cmdline("999"), None);
    }

    #[test]
    fn test_resolve_program() {
        let table = ProcessTable::parse(PS_OUTPUT);
        assert_eq!(resolve_program("claude", "1", &table), "claude");
        assert_eq!(resolve_program("oc", "1", &table), "opencode");
        assert_eq!(resolve_program("zsh", "100", &table), "claude");
        assert_eq!(resolve_program("zsh", "300", &table), "nvim");
        assert_eq!(resolve_program("bash", "400", &table), "bash");
        assert_eq!(resolve_program("python3", "500", &table), "aider");
        assert_eq!(resolve_program("htop", "100", &table), "htop");
        assert_eq!(resolve_program("zsh", "", &table), "zsh");
    }

    #[test]
    fn test_empty_table_resolves_to_pane_command() {
        let table = ProcessTable::default();
        assert!(table.is_empty());
        assert_eq!(resolve_program("zsh", "100", &table), "zsh");
    }

    #[test]
    fn test_extract_filename() {
        let cases = [
            ("nvim src/index.ts", Some("index.ts")),
            ("vim -c cmd file.go", Some("file.go")),
            ("nvim +42 --listen /tmp/sock notes.md", Some("notes.md")),
            ("nvim .", None),
            ("nvim", None),
            ("", None),
        ];
        for (input, expected) in cases {
            assert_eq!(
                extract_filename_from_args(input).as_deref(),
                expected,
                "{:?}",
                input
            );
        }
    }

    #[test]
    fn test_shell_and_dir_classification() {
        assert!(is_shell("zsh"));
        assert!(!is_shell("nvim"));
        assert!(is_dir_program("nvim"));
        assert!(is_dir_program("claude"));
        assert!(!is_dir_program("python"));
        assert!(is_editor("vi"));
    }
}
