//! Shared subprocess execution.
//!
//! Every external tool runs through [`run_tool`]: spawn, capture both
//! output streams fully in memory, map a non-zero exit onto
//! [`StageError::ExternalTool`]. No timeout is enforced — a hung tool
//! stalls its job indefinitely — but the wait itself is an await point,
//! so other jobs keep making progress.

use std::process::Stdio;

use tokio::process::Command;

use huebox_core::error::StageError;

/// Captured output of a tool that exited zero.
#[derive(Debug)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `cmd` to completion and capture its output.
pub async fn run_tool(mut cmd: Command) -> Result<ToolOutput, StageError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = cmd.output().await?;
    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        return Err(StageError::ExternalTool {
            exit_code: output.status.code().unwrap_or(-1),
            stderr,
        });
    }

    Ok(ToolOutput { stdout, stderr })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn zero_exit_returns_captured_stdout() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2"]);

        let output = run_tool(cmd).await.unwrap();
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
    }

    #[tokio::test]
    async fn nonzero_exit_maps_to_external_tool_error() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo broken >&2; exit 3"]);

        let err = run_tool(cmd).await.unwrap_err();
        assert_matches!(
            err,
            StageError::ExternalTool { exit_code: 3, ref stderr } if stderr == "broken\n"
        );
    }

    #[tokio::test]
    async fn missing_binary_is_io_error() {
        let cmd = Command::new("/nonexistent/definitely-not-a-tool");
        assert_matches!(run_tool(cmd).await.unwrap_err(), StageError::Io(_));
    }
}
