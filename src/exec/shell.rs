// src/exec/shell.rs

//! Start action that runs a unit's `cmd` through the platform shell.

use std::process::Stdio;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::UnitConfig;
use crate::exec::action::{StartAction, StartFuture};

/// Runs `sh -c <cmd>` (`cmd /C <cmd>` on Windows) for each unit.
///
/// The unit counts as started once the command exits with status 0. If the
/// run is cancelled while the command is still running, the child process is
/// killed and the start fails.
#[derive(Debug, Clone, Default)]
pub struct ShellAction;

impl ShellAction {
    pub fn new() -> Self {
        Self
    }
}

impl StartAction<UnitConfig> for ShellAction {
    fn start(&self, ctx: CancellationToken, unit: Arc<UnitConfig>) -> StartFuture {
        Box::pin(async move { run_unit_command(&ctx, &unit).await })
    }
}

async fn run_unit_command(ctx: &CancellationToken, unit: &UnitConfig) -> Result<()> {
    info!(unit = %unit.name, cmd = %unit.cmd, "running start command");

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&unit.cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&unit.cmd);
        c
    };

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for unit '{}'", unit.name))?;

    // Always consume output so pipe buffers don't fill.
    if let Some(stdout) = child.stdout.take() {
        forward_lines(unit.name.clone(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(unit.name.clone(), "stderr", stderr);
    }

    tokio::select! {
        status_res = child.wait() => {
            let status = status_res
                .with_context(|| format!("waiting for process of unit '{}'", unit.name))?;
            let code = status.code().unwrap_or(-1);

            debug!(unit = %unit.name, exit_code = code, success = status.success(), "start command exited");

            if !status.success() {
                bail!("start command `{}` exited with code {}", unit.cmd, code);
            }
            Ok(())
        }

        _ = ctx.cancelled() => {
            warn!(unit = %unit.name, "run cancelled; killing start command");
            if let Err(e) = child.kill().await {
                warn!(unit = %unit.name, error = %e, "failed to kill start command");
            }
            bail!("start command `{}` was cancelled", unit.cmd)
        }
    }
}

fn forward_lines<R>(unit: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(unit = %unit, stream, "{}", line);
        }
    });
}
