//! Shell-based step execution on the host.

use crate::runner::{OutputLine, RunnerConfig, StepContext, StepResult, StepRunner};
use async_trait::async_trait;
use gantry_core::run::LogStream;
use gantry_core::{Error, Result};
use gantry_core::workflow::StepDefinition;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};
use tracing::{debug, info, warn};

/// Shell runner for executing commands on the host.
pub struct ShellRunner {
    config: RunnerConfig,
}

impl ShellRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    fn shell_command(script: &str) -> Command {
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(script);
            cmd
        }
        #[cfg(not(windows))]
        {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(script);
            cmd
        }
    }

    async fn execute_command(
        &self,
        command: &str,
        ctx: &StepContext,
        output_tx: mpsc::Sender<OutputLine>,
    ) -> Result<StepResult> {
        let start = std::time::Instant::now();

        info!(command = %command, workspace = %ctx.workspace.display(), "Executing shell command");

        let mut child = Self::shell_command(command)
            .current_dir(&ctx.workspace)
            .envs(&ctx.env)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::StepSpawn {
                step: ctx.step.name.clone(),
                message: e.to_string(),
            })?;

        let stdout = child.stdout.take().expect("stdout piped");
        let stderr = child.stderr.take().expect("stderr piped");

        // Stream stdout
        let stdout_tx = output_tx.clone();
        let stdout_handle = tokio::spawn(async move {
            let reader = BufReader::new(stdout);
            let mut lines = reader.lines();
            let mut line_num = 0u32;

            while let Ok(Some(line)) = lines.next_line().await {
                line_num += 1;
                let output = OutputLine {
                    stream: LogStream::Stdout,
                    content: line,
                    line_number: line_num,
                    timestamp: chrono::Utc::now(),
                };
                if stdout_tx.send(output).await.is_err() {
                    break;
                }
            }
        });

        // Stream stderr
        let stderr_tx = output_tx;
        let stderr_handle = tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            let mut line_num = 0u32;

            while let Ok(Some(line)) = lines.next_line().await {
                line_num += 1;
                let output = OutputLine {
                    stream: LogStream::Stderr,
                    content: line,
                    line_number: line_num,
                    timestamp: chrono::Utc::now(),
                };
                if stderr_tx.send(output).await.is_err() {
                    break;
                }
            }
        });

        // Wait for process with optional timeout
        let wait_result = if let Some(timeout_secs) = self.config.timeout_seconds {
            match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_secs, "Command timed out, killing process");
                    let _ = child.kill().await;
                    return Err(Error::JobTimeout {
                        minutes: (timeout_secs / 60).max(1) as u32,
                    });
                }
            }
        } else {
            child.wait().await
        };

        // Wait for output streaming to complete
        let _ = stdout_handle.await;
        let _ = stderr_handle.await;

        let status = wait_result
            .map_err(|e| Error::Internal(format!("Failed to wait for process: {}", e)))?;

        let exit_code = status.code().unwrap_or(-1);
        let duration_ms = start.elapsed().as_millis() as u64;

        debug!(exit_code, duration_ms, "Command completed");

        Ok(StepResult {
            exit_code,
            success: exit_code == 0,
            duration_ms,
        })
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new(RunnerConfig::default())
    }
}

#[async_trait]
impl StepRunner for ShellRunner {
    async fn execute(
        &self,
        ctx: &StepContext,
        output_tx: mpsc::Sender<OutputLine>,
    ) -> Result<StepResult> {
        let command = ctx
            .step
            .run
            .as_ref()
            .ok_or_else(|| Error::Internal("No command to run".to_string()))?;

        self.execute_command(command, ctx, output_tx).await
    }

    fn can_handle(&self, step: &StepDefinition) -> bool {
        step.run.is_some() && step.uses.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn make_step(cmd: &str) -> StepDefinition {
        StepDefinition {
            name: "test".to_string(),
            uses: None,
            run: Some(cmd.to_string()),
            env: Default::default(),
        }
    }

    fn make_ctx(cmd: &str) -> StepContext {
        StepContext {
            workspace: PathBuf::from("/tmp"),
            env: HashMap::new(),
            step: make_step(cmd),
        }
    }

    #[tokio::test]
    async fn test_shell_runner_success() {
        let runner = ShellRunner::default();
        let (tx, mut rx) = mpsc::channel(100);

        let result = runner.execute(&make_ctx("echo hello"), tx).await.unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, 0);

        // Check output
        let line = rx.recv().await.unwrap();
        assert_eq!(line.content, "hello");
        assert_eq!(line.stream, LogStream::Stdout);
    }

    #[tokio::test]
    async fn test_shell_runner_failure() {
        let runner = ShellRunner::default();
        let (tx, _rx) = mpsc::channel(100);

        let result = runner.execute(&make_ctx("exit 1"), tx).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[tokio::test]
    async fn test_shell_runner_stderr_stream() {
        let runner = ShellRunner::default();
        let (tx, mut rx) = mpsc::channel(100);

        let result = runner
            .execute(&make_ctx("echo oops >&2"), tx)
            .await
            .unwrap();
        assert!(result.success);

        let line = rx.recv().await.unwrap();
        assert_eq!(line.content, "oops");
        assert_eq!(line.stream, LogStream::Stderr);
    }

    #[tokio::test]
    async fn test_shell_runner_env_passthrough() {
        let runner = ShellRunner::default();
        let (tx, mut rx) = mpsc::channel(100);

        let mut ctx = make_ctx("echo $GREETING");
        ctx.env
            .insert("GREETING".to_string(), "bonjour".to_string());

        let result = runner.execute(&ctx, tx).await.unwrap();
        assert!(result.success);
        assert_eq!(rx.recv().await.unwrap().content, "bonjour");
    }

    #[tokio::test]
    async fn test_shell_runner_timeout_kills_process() {
        let runner = ShellRunner::new(RunnerConfig {
            timeout_seconds: Some(1),
        });
        let (tx, _rx) = mpsc::channel(100);

        let result = runner.execute(&make_ctx("sleep 5"), tx).await;
        assert!(matches!(result, Err(Error::JobTimeout { .. })));
    }

    #[test]
    fn test_can_handle_shell_steps_only() {
        let runner = ShellRunner::default();
        assert!(runner.can_handle(&make_step("echo hi")));

        let builtin = StepDefinition {
            name: "checkout".to_string(),
            uses: Some(gantry_core::workflow::BuiltinAction::Checkout),
            run: None,
            env: Default::default(),
        };
        assert!(!runner.can_handle(&builtin));
    }
}
