use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::CommandError;

/// Run a command to completion and return its stdout.
///
/// The child is killed if it outlives `timeout`.
pub async fn run(program: &str, args: &[&str], timeout: Duration) -> Result<String, CommandError> {
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(CommandError::Spawn {
                program: program.to_string(),
                source,
            })
        }
        Err(_) => {
            return Err(CommandError::Timeout {
                program: program.to_string(),
                after: timeout,
            })
        }
    };

    if !output.status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Like [`run`], but any failure becomes empty output.
pub async fn run_or_empty(program: &str, args: &[&str], timeout: Duration) -> String {
    match run(program, args, timeout).await {
        Ok(stdout) => stdout,
        Err(e) => {
            debug!("{}", e);
            String::new()
        }
    }
}
