// src/exec/runner.rs

//! Shell-backed command runner.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::command::{CommandInvocation, CommandOutcome, CommandRunner};

/// Runs each invocation through the platform shell and awaits its exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellCommandRunner;

impl CommandRunner for ShellCommandRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a CommandInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<CommandOutcome>> + Send + 'a>> {
        Box::pin(run_shell(invocation))
    }
}

async fn run_shell(invocation: &CommandInvocation) -> Result<CommandOutcome> {
    debug!(
        step = %invocation.label,
        cmd = %invocation.cmd,
        "starting external tool"
    );

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&invocation.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&invocation.cmd);
        c
    };

    cmd.current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning '{}' for step '{}'", invocation.cmd, invocation.label))?;

    // Drain both pipes so the tool never blocks on a full buffer.
    let stdout_task = child.stdout.take().map(|stdout| {
        let label = invocation.label.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(step = %label, "stdout: {}", line);
            }
        })
    });
    let stderr_task = child.stderr.take().map(|stderr| {
        let label = invocation.label.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!(step = %label, "stderr: {}", line);
            }
        })
    });

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for step '{}'", invocation.label))?;

    for task in [stdout_task, stderr_task].into_iter().flatten() {
        let _ = task.await;
    }

    let code = status.code().unwrap_or(-1);
    if status.success() {
        debug!(step = %invocation.label, "external tool finished");
        Ok(CommandOutcome::Success)
    } else {
        info!(
            step = %invocation.label,
            exit_code = code,
            "external tool failed"
        );
        Ok(CommandOutcome::Failed(code))
    }
}
