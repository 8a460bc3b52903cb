// src/exec/process.rs

//! Production process runner built on `tokio::process`.

use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::{DevloopError, Result};

use super::delimiter::{end_delimiter, start_delimiter};
use super::runner::{
    Completion, Invocation, ProcessControl, ProcessOutcome, ProcessRunner, SpawnedProcess,
};

/// Spawns real OS processes with stdin discarded and stdout/stderr inherited,
/// so tool output shows up on the console as it is produced.
#[derive(Debug, Clone, Default)]
pub struct RealProcessRunner;

impl RealProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for RealProcessRunner {
    fn spawn(&mut self, invocation: &Invocation) -> Result<SpawnedProcess> {
        println!("{}", start_delimiter(&invocation.label));

        info!(
            stage = %invocation.stage,
            label = %invocation.label,
            cmd = %invocation.command_line(),
            "starting stage process"
        );

        // `npx` and friends are batch files on Windows and need the shell.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&invocation.program);
            c
        } else {
            Command::new(&invocation.program)
        };

        cmd.args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let child = cmd.spawn().map_err(|source| DevloopError::Spawn {
            label: invocation.label.clone(),
            program: invocation.program.clone(),
            source,
        })?;

        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let (done_tx, completion) = Completion::channel();
        let label = invocation.label.clone();

        let handle = tokio::spawn(async move {
            let outcome = supervise(child, &label, cancel_rx).await;
            println!("{}", end_delimiter(&label));
            // Nobody listening is fine: the run stage is never awaited.
            let _ = done_tx.send(outcome);
        });

        Ok(SpawnedProcess {
            control: Box::new(ActiveProcess {
                cancel: Some(cancel_tx),
                handle,
            }),
            completion,
        })
    }
}

/// Internal handle for a running child process.
///
/// - `cancel` asks the supervisor task to kill the child; `None` once used.
/// - `handle` is the Tokio task supervising the child.
struct ActiveProcess {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ProcessControl for ActiveProcess {
    fn has_exited(&self) -> bool {
        self.handle.is_finished()
    }

    fn was_killed(&self) -> bool {
        self.cancel.is_none()
    }

    fn kill(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            let Some(cancel) = self.cancel.take() else {
                debug!("kill requested twice; ignoring");
                return;
            };

            if cancel.send(()).is_err() {
                debug!("process already finished while cancelling");
            }

            // Wait for the supervisor so the old process is really gone before
            // its replacement starts (ports, file locks).
            if let Err(err) = (&mut self.handle).await {
                warn!(error = %err, "process supervisor ended abnormally");
            }
        })
    }
}

/// Wait for the child to exit, or kill it when cancellation is requested.
///
/// Dropping the handle without cancelling detaches the child: it keeps
/// running and its exit is still reported.
async fn supervise(
    mut child: Child,
    label: &str,
    mut cancel_rx: oneshot::Receiver<()>,
) -> ProcessOutcome {
    let cancelled = tokio::select! {
        status = child.wait() => return outcome_from(label, status),
        cancel = &mut cancel_rx => cancel.is_ok(),
    };

    if !cancelled {
        debug!(label, "process handle dropped; waiting for natural exit");
        return outcome_from(label, child.wait().await);
    }

    info!(label, "cancellation requested; killing process");
    if let Err(err) = child.kill().await {
        warn!(label, error = %err, "failed to kill child process on cancellation");
    }
    ProcessOutcome::Killed
}

fn outcome_from(label: &str, status: std::io::Result<ExitStatus>) -> ProcessOutcome {
    match status {
        Ok(status) => {
            let code = status.code().unwrap_or(-1);
            info!(label, exit_code = code, success = status.success(), "stage process exited");
            if status.success() {
                ProcessOutcome::Success
            } else {
                ProcessOutcome::Failed(code)
            }
        }
        Err(err) => {
            error!(label, error = %err, "waiting for process failed");
            ProcessOutcome::Failed(-1)
        }
    }
}
