use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

/// Environment variable pointing at an alternate config file
pub const CONFIG_ENV: &str = "TMUX_SMART_NAME_CONFIG";

/// Runtime settings, read from an optional TOML file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum visible length of a window name
    pub max_name_len: usize,
    /// Scrollback lines captured per pane for status detection
    pub capture_lines: usize,
    /// Timeout for each tmux invocation
    pub command_timeout_ms: u64,
    /// Timeout for the process table snapshot
    pub ps_timeout_ms: u64,
    /// Directory where cooperating agents write their status files
    pub status_dir: PathBuf,
    /// Status files older than this are ignored
    pub status_max_age_secs: u64,
    /// tmux global environment variable holding the attention baseline
    pub attention_env_var: String,
    /// Prefix idle agent windows with the idle icon
    pub show_idle_icon: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_name_len: 24,
            capture_lines: 20,
            command_timeout_ms: 5000,
            ps_timeout_ms: 3000,
            status_dir: PathBuf::from("/tmp/pi-tmux-status"),
            status_max_age_secs: 30,
            attention_env_var: "TMUX_AGENT_LAST_ATTENTION".to_string(),
            show_idle_icon: false,
        }
    }
}

impl Config {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    pub fn ps_timeout(&self) -> Duration {
        Duration::from_millis(self.ps_timeout_ms)
    }

    pub fn status_max_age(&self) -> Duration {
        Duration::from_secs(self.status_max_age_secs)
    }

    /// Load from `explicit`, `$TMUX_SMART_NAME_CONFIG`, or the default location.
    ///
    /// Never fails: a missing file means defaults, a broken one is logged and ignored.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(default_path);

        match path {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("no config at {}: {}", path.display(), e);
                return Self::default();
            }
        };

        match toml::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tmux-smart-name").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load_from(&dir.path().join("nope.toml"));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_name_len = 30\nshow_idle_icon = true\n").unwrap();

        let cfg = Config::load(Some(&path));
        assert_eq!(cfg.max_name_len, 30);
        assert!(cfg.show_idle_icon);
        assert_eq!(cfg.capture_lines, 20);
        assert_eq!(cfg.status_dir, PathBuf::from("/tmp/pi-tmux-status"));
    }

    #[test]
    fn test_malformed_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_name_len = \"lots\"").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_durations() {
        let cfg = Config::default();
        assert_eq!(cfg.command_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.ps_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.status_max_age(), Duration::from_secs(30));
    }
}
