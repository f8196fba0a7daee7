use std::time::Duration;

use thiserror::Error;

/// Failure of an external command (tmux, ps)
#[derive(Debug, Error)]
pub enum CommandError {
    /// The binary could not be started at all
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command did not finish in time and was killed
    #[error("`{program}` timed out after {after:?}")]
    Timeout { program: String, after: Duration },

    /// The command ran but exited non-zero
    #[error("`{program}` exited with {code:?}: {stderr}")]
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
}
