use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::StatusIcon;

/// Agents that report their own status through a status file
pub const SELF_REPORTING_AGENTS: &[&str] = &["pi"];

/// State written by the agent itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportedStatus {
    Busy,
    Idle,
    Waiting,
}

impl From<ReportedStatus> for StatusIcon {
    fn from(status: ReportedStatus) -> Self {
        match status {
            ReportedStatus::Busy => StatusIcon::Busy,
            ReportedStatus::Idle => StatusIcon::Idle,
            ReportedStatus::Waiting => StatusIcon::Waiting,
        }
    }
}

/// One status file, as written by the cooperating agent
#[derive(Debug, Clone, Deserialize)]
pub struct StatusFile {
    pub status: ReportedStatus,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub ts: Option<u64>,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Read-only view of the status-file directory
#[derive(Debug, Clone)]
pub struct StatusBridge {
    dir: PathBuf,
    max_age: Duration,
}

impl StatusBridge {
    pub fn new(dir: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            dir: dir.into(),
            max_age,
        }
    }

    pub fn supports(agent: &str) -> bool {
        SELF_REPORTING_AGENTS.contains(&agent)
    }

    /// File name for a pane id: `%417` becomes `417.json`
    pub fn path_for(&self, pane_id: &str) -> PathBuf {
        let safe: String = pane_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        self.dir.join(format!("{}.json", safe))
    }

    /// Reported status for a pane, if a fresh and well-formed file exists.
    pub fn read(&self, pane_id: &str) -> Option<StatusIcon> {
        let path = self.path_for(pane_id);
        match self.read_file(&path) {
            Ok(file) => {
                debug!(
                    pane_id,
                    pid = ?file.pid,
                    ts = ?file.ts,
                    session = ?file.session,
                    cwd = ?file.cwd,
                    model = ?file.model,
                    "using reported status {:?}",
                    file.status
                );
                Some(file.status.into())
            }
            Err(e) => {
                debug!("status file {} unusable: {:#}", path.display(), e);
                None
            }
        }
    }

    fn read_file(&self, path: &Path) -> Result<StatusFile> {
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .with_context(|| format!("reading {}", path.display()))?;

        // A clock step backwards counts as fresh
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > self.max_age {
            bail!("stale ({:?} old)", age);
        }

        let raw =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn bridge(dir: &Path) -> StatusBridge {
        StatusBridge::new(dir, Duration::from_secs(30))
    }

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_maps_reported_status() {
        let dir = tempfile::tempdir().unwrap();
        let b = bridge(dir.path());

        for (raw, expected) in [
            ("busy", StatusIcon::Busy),
            ("idle", StatusIcon::Idle),
            ("waiting", StatusIcon::Waiting),
        ] {
            write(
                dir.path(),
                "999.json",
                &format!(r#"{{"status":"{}","pid":1234,"ts":1700000000000}}"#, raw),
            );
            assert_eq!(b.read("%999"), Some(expected));
        }
    }

    #[test]
    fn test_optional_fields_accepted() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "7.json",
            r#"{"status":"idle","pid":1,"ts":2,"session":"/s.jsonl","cwd":"/tmp","model":"anthropic/x"}"#,
        );
        assert_eq!(bridge(dir.path()).read("%7"), Some(StatusIcon::Idle));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(bridge(dir.path()).read("%nonexistent"), None);
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "5.json", "not json");
        assert_eq!(bridge(dir.path()).read("%5"), None);
    }

    #[test]
    fn test_unknown_status_value() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "5.json", r#"{"status":"exploded","pid":1,"ts":1}"#);
        assert_eq!(bridge(dir.path()).read("%5"), None);
    }

    #[test]
    fn test_stale_file_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "5.json", r#"{"status":"busy","pid":1,"ts":1}"#);
        let past = SystemTime::now() - Duration::from_secs(60);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(past)
            .unwrap();
        assert_eq!(bridge(dir.path()).read("%5"), None);
    }

    #[test]
    fn test_read_file_errors_carry_context() {
        let dir = tempfile::tempdir().unwrap();
        let b = bridge(dir.path());

        let missing = b.read_file(&dir.path().join("1.json")).unwrap_err();
        assert!(format!("{:#}", missing).starts_with("reading "));

        let bad = write(dir.path(), "2.json", "{");
        let err = b.read_file(&bad).unwrap_err();
        assert!(format!("{:#}", err).starts_with("parsing "));

        let old = write(dir.path(), "3.json", r#"{"status":"idle"}"#);
        File::options()
            .write(true)
            .open(&old)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(60))
            .unwrap();
        let err = b.read_file(&old).unwrap_err();
        assert!(err.to_string().starts_with("stale"));
    }

    #[test]
    fn test_pane_id_sanitized() {
        let b = StatusBridge::new("/tmp/pi-tmux-status", Duration::from_secs(30));
        assert_eq!(b.path_for("%417"), PathBuf::from("/tmp/pi-tmux-status/417.json"));
        assert_eq!(b.path_for("../%1"), PathBuf::from("/tmp/pi-tmux-status/1.json"));
    }

    #[test]
    fn test_supports_pi_only() {
        assert!(StatusBridge::supports("pi"));
        assert!(!StatusBridge::supports("claude"));
    }
}
