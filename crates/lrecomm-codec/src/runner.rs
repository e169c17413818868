// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subprocess-backed [`ToolRunner`].

use async_trait::async_trait;
use lrecomm_core::{LrecommError, ToolOutput, ToolRunner};
use tracing::debug;

/// Runs programs found on `PATH` with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<ToolOutput, LrecommError> {
        debug!(program, ?args, "running external tool");

        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| LrecommError::Io {
                context: format!("failed to start {program}"),
                source: e,
            })?;

        if !output.status.success() {
            let status = output
                .status
                .code()
                .map_or_else(|| "signal".to_string(), |code| format!("exit code {code}"));
            return Err(LrecommError::Tool {
                program: program.to_string(),
                status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(ToolOutput {
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn captures_stdout() {
        let output = ProcessRunner
            .run("sh", &args(&["-c", "echo hello"]))
            .await
            .unwrap();
        assert_eq!(output.stdout_lossy().trim(), "hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_tool_error() {
        let err = ProcessRunner
            .run("sh", &args(&["-c", "echo broken >&2; exit 3"]))
            .await
            .unwrap_err();
        match err {
            LrecommError::Tool {
                program,
                status,
                stderr,
            } => {
                assert_eq!(program, "sh");
                assert_eq!(status, "exit code 3");
                assert_eq!(stderr, "broken");
            }
            other => panic!("expected Tool error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_program_is_io_error() {
        let err = ProcessRunner
            .run("lrecomm-no-such-program", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, LrecommError::Io { .. }));
    }
}
