//! Running external programs: success, missing binary, or failure.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::{FipError, Result};

/// Run `program` with `args` to completion.
///
/// A program that cannot be spawned because it does not exist is
/// [`FipError::MissingTool`]; a non-zero exit or an expired `timeout` is
/// [`FipError::ToolFailure`].
pub async fn run_tool<I, S>(program: &Path, args: I, timeout: Option<Duration>) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let tool = tool_name(program);

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    info!("[tool] running {:?}", cmd.as_std());

    let output = cmd.output();
    let output = match timeout {
        Some(limit) => match tokio::time::timeout(limit, output).await {
            Ok(res) => res,
            Err(_) => {
                warn!("[tool] {} timed out after {:?}", tool, limit);
                return Err(FipError::tool_failure(
                    &tool,
                    format!("timed out after {}s", limit.as_secs()),
                ));
            }
        },
        None => output.await,
    };

    let output = match output {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("[tool] {} not found", tool);
            return Err(FipError::MissingTool { tool });
        }
        Err(e) => return Err(FipError::tool_failure(&tool, format!("could not start: {e}"))),
    };

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        debug!("{}: {}", tool, line);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in stderr.lines() {
        debug!("{} stderr: {}", tool, line);
    }

    if output.status.success() {
        return Ok(());
    }

    let last = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim();
    let detail = match output.status.code() {
        Some(code) if last.is_empty() => format!("exited with status {code}"),
        Some(code) => format!("exited with status {code}: {last}"),
        None => "killed by signal".to_string(),
    };
    warn!("[tool] {} {}", tool, detail);
    Err(FipError::ToolFailure { tool, detail })
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .unwrap_or(program.as_os_str())
        .to_string_lossy()
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tool() {
        let err = run_tool(Path::new("definitely-not-a-real-tool-7f3a"), ["--version"], None)
            .await
            .unwrap_err();
        assert!(err.is_missing_tool());
        assert!(err.to_string().contains("definitely-not-a-real-tool-7f3a"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success() {
        run_tool(Path::new("sh"), ["-c", "exit 0"], None).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_carries_status_and_stderr() {
        let err = run_tool(Path::new("sh"), ["-c", "echo boom >&2; exit 3"], None)
            .await
            .unwrap_err();
        match err {
            FipError::ToolFailure { tool, detail } => {
                assert_eq!(tool, "sh");
                assert!(detail.contains('3'));
                assert!(detail.contains("boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_is_failure() {
        let err = run_tool(
            Path::new("sh"),
            ["-c", "sleep 5"],
            Some(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, FipError::ToolFailure { .. }));
    }
}
