//! Window naming: program + path + agent context, trimmed to a visible budget.

use std::path::Path;

use crate::process::{is_dir_program, is_shell};
use crate::status::StatusIcon;

const ELLIPSIS: &str = "...";

/// Distinguished display names; programs without one render as themselves
const DISPLAY_NAMES: &[(&str, &str)] = &[("pi", "π")];

/// Extra labelling scraped from the pane
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaneContext {
    /// Git branch, never `main` or `master`
    pub branch: Option<String>,
    /// Agent session name
    pub session_name: Option<String>,
    /// File open in an editor
    pub filename: Option<String>,
}

impl PaneContext {
    pub fn is_empty(&self) -> bool {
        self.branch.is_none() && self.session_name.is_none() && self.filename.is_none()
    }
}

/// Replace a leading home directory with `~`.
pub fn format_path(path: &str) -> String {
    format_path_with_home(path, dirs::home_dir().as_deref())
}

fn format_path_with_home(path: &str, home: Option<&Path>) -> String {
    let Some(home) = home.and_then(Path::to_str) else {
        return path.to_string();
    };
    let home = home.trim_end_matches('/');
    if home.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(home) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => format!("~{}", rest),
        _ => path.to_string(),
    }
}

/// Abbreviate every directory but the last to its first character.
///
/// `~/src/personal/hledger` → `~/s/p/hledger`, `~/.config/nvim` → `~/.c/nvim`.
pub fn shorten_path(path: &str) -> String {
    let (prefix, rest) = if let Some(rest) = path.strip_prefix("~/") {
        ("~/", rest)
    } else if let Some(rest) = path.strip_prefix('/') {
        ("/", rest)
    } else {
        ("", path)
    };

    let parts: Vec<&str> = rest.split('/').filter(|p| !p.is_empty()).collect();
    let Some((last, dirs)) = parts.split_last() else {
        return path.to_string();
    };
    if dirs.is_empty() {
        return path.to_string();
    }

    let mut out = String::from(prefix);
    for dir in dirs {
        let mut chars = dir.chars();
        match (chars.next(), chars.next()) {
            (Some('.'), Some(second)) => {
                out.push('.');
                out.push(second);
            }
            (Some(first), _) => out.push(first),
            (None, _) => {}
        }
        out.push('/');
    }
    out.push_str(last);
    out
}

/// Byte length of a `#[...]` format token starting at `s`, if one does
fn format_token_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix("#[")?;
    body.find(']').map(|end| end + 3)
}

/// Length as shown by tmux: `#[...]` tokens take no space
pub fn visible_len(name: &str) -> usize {
    let mut len = 0;
    let mut i = 0;
    while i < name.len() {
        let rest = &name[i..];
        if let Some(token) = format_token_len(rest) {
            i += token;
            continue;
        }
        let ch = rest.chars().next().map_or(1, char::len_utf8);
        i += ch;
        len += 1;
    }
    len
}

/// Cut `name` to at most `max_len` visible characters.
///
/// Over-budget names keep `max_len - 3` characters plus `...`; budgets of 3
/// or less are cut hard. Format tokens reached before the cut are kept whole.
/// A budget of 0 means unlimited.
pub fn trim_name(name: &str, max_len: usize) -> String {
    if max_len == 0 || visible_len(name) <= max_len {
        return name.to_string();
    }

    let target = if max_len <= ELLIPSIS.len() {
        max_len
    } else {
        max_len - ELLIPSIS.len()
    };

    let mut visible = 0;
    let mut i = 0;
    while i < name.len() && visible < target {
        let rest = &name[i..];
        if let Some(token) = format_token_len(rest) {
            i += token;
            continue;
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
        visible += 1;
    }

    // Formats directly at the cut still apply to what was kept
    while let Some(token) = format_token_len(&name[i..]) {
        i += token;
    }

    let mut trimmed = name[..i].to_string();
    if max_len > ELLIPSIS.len() {
        trimmed.push_str(ELLIPSIS);
    }
    trimmed
}

/// Pull branch and session name out of pi's footer.
///
/// The footer's path line looks like `~/repo (branch) • session name` and is
/// followed by the `↑…` token-usage line.
pub fn parse_pi_footer(content: &str) -> PaneContext {
    let mut ctx = PaneContext::default();
    let lines: Vec<&str> = content.lines().map(str::trim).collect();

    for (i, line) in lines.iter().enumerate() {
        let next = lines.get(i + 1).copied().unwrap_or("");
        if !next.starts_with('↑') || !line.contains('(') {
            continue;
        }

        if let Some(branch) = first_parenthesized(line) {
            if branch != "main" && branch != "master" {
                ctx.branch = Some(branch.to_string());
            }
        }
        if let Some(bullet) = line.find('•') {
            let session = line[bullet + '•'.len_utf8()..].trim();
            if !session.is_empty() {
                ctx.session_name = Some(session.to_string());
            }
        }
        break;
    }
    ctx
}

/// Contents of the first non-empty `(...)` pair on a line
fn first_parenthesized(line: &str) -> Option<&str> {
    let mut rest = line;
    while let Some(open) = rest.find('(') {
        let after = &rest[open + 1..];
        let close = after.find(')')?;
        if close > 0 {
            return Some(&after[..close]);
        }
        rest = &after[close + 1..];
    }
    None
}

/// Human-readable window label, before status icon and trimming.
///
/// Shells show only the path. Directory-aware programs show
/// `program: path`, preferring session name, then file, then `path@branch`.
pub fn build_base_name(program: &str, path: &str, context: Option<&PaneContext>) -> String {
    if program.is_empty() {
        return shorten_path(path);
    }
    if is_shell(program) {
        return if path.is_empty() {
            program.to_string()
        } else {
            shorten_path(path)
        };
    }
    if !is_dir_program(program) {
        return program.to_string();
    }

    let display = DISPLAY_NAMES
        .iter()
        .find(|(p, _)| *p == program)
        .map(|(_, d)| *d);
    let (mut name, sep) = match display {
        Some(glyph) => (glyph.to_string(), " "),
        None => (program.to_string(), ": "),
    };
    let short = shorten_path(path);
    let ctx = context.cloned().unwrap_or_default();

    if let Some(session) = ctx.session_name {
        name.push_str(sep);
        name.push_str(&session);
    } else if let Some(file) = ctx.filename {
        name.push_str(sep);
        name.push_str(&file);
    } else if let Some(branch) = ctx.branch {
        name.push_str(sep);
        name.push_str(&short);
        name.push('@');
        name.push_str(&branch);
    } else if !short.is_empty() {
        name.push_str(sep);
        name.push_str(&short);
    }
    name
}

/// Final window name: optional colored status icon, then the base, trimmed.
pub fn window_name(
    base: &str,
    status: Option<StatusIcon>,
    show_idle_icon: bool,
    max_len: usize,
) -> String {
    let name = match status {
        Some(StatusIcon::Idle) if !show_idle_icon => base.to_string(),
        Some(icon) => format!("{} {}", icon.colorize(), base),
        None => base.to_string(),
    };
    trim_name(&name, max_len)
}
