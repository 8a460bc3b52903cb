// src/exec/runner.rs

//! Process runner abstraction.
//!
//! The orchestrator talks to a [`ProcessRunner`] instead of spawning
//! processes itself, so tests can substitute a fake that records invocations
//! and scripts outcomes. The production implementation lives in
//! [`super::process`].

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tokio::sync::oneshot;

use crate::errors::Result;
use crate::pipeline::StageKind;

/// A fully rendered command, ready to be spawned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub stage: StageKind,
    /// Human-readable label, e.g. `format:prettier(src/foo.ts)`.
    pub label: String,
    pub program: String,
    pub args: Vec<String>,
    /// Working directory (the project root).
    pub cwd: PathBuf,
}

impl Invocation {
    /// Program and arguments joined with spaces, for logs and dry runs.
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// How a spawned process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Exit status 0.
    Success,
    /// Non-zero exit, or killed by a signal (`-1` when no code is available).
    Failed(i32),
    /// Terminated through its [`ProcessControl`] handle.
    Killed,
}

impl ProcessOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, ProcessOutcome::Success)
    }
}

/// Live handle to a spawned process, used for cancellation.
pub trait ProcessControl: Send {
    fn has_exited(&self) -> bool;

    fn was_killed(&self) -> bool;

    /// Terminate the process. The returned future resolves once it is gone.
    fn kill(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Completion signal of a spawned process.
///
/// If the reporting side goes away without sending an outcome, the process is
/// considered killed.
#[derive(Debug)]
pub struct Completion {
    rx: oneshot::Receiver<ProcessOutcome>,
}

impl Completion {
    pub fn channel() -> (oneshot::Sender<ProcessOutcome>, Completion) {
        let (tx, rx) = oneshot::channel();
        (tx, Completion { rx })
    }

    /// A completion that is already resolved.
    pub fn ready(outcome: ProcessOutcome) -> Completion {
        let (tx, completion) = Self::channel();
        let _ = tx.send(outcome);
        completion
    }

    pub async fn wait(self) -> ProcessOutcome {
        self.rx.await.unwrap_or(ProcessOutcome::Killed)
    }
}

/// Result of a successful spawn: the handle plus its completion signal.
pub struct SpawnedProcess {
    pub control: Box<dyn ProcessControl>,
    pub completion: Completion,
}

impl fmt::Debug for SpawnedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnedProcess")
            .field("exited", &self.control.has_exited())
            .field("killed", &self.control.was_killed())
            .finish_non_exhaustive()
    }
}

/// Trait abstracting how stage commands are launched.
pub trait ProcessRunner: Send {
    /// Launch `invocation` and return immediately.
    ///
    /// An `Err` means the process could not be started at all; callers treat
    /// it like a failed stage.
    fn spawn(&mut self, invocation: &Invocation) -> Result<SpawnedProcess>;
}
