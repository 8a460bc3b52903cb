use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{oneshot, Semaphore};

use devloop::errors::{DevloopError, Result};
use devloop::exec::{
    Completion, Invocation, ProcessControl, ProcessOutcome, ProcessRunner, SpawnedProcess,
};
use devloop::pipeline::StageKind;

/// Something the orchestrator asked a [`FakeRunner`] to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerCall {
    Spawn(Invocation),
    Kill(String),
}

/// Shared, cloneable record of every call made to a [`FakeRunner`].
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<RunnerCall>>>,
}

impl CallLog {
    fn lock(&self) -> MutexGuard<'_, Vec<RunnerCall>> {
        self.calls.lock().unwrap()
    }

    fn push(&self, call: RunnerCall) {
        self.lock().push(call);
    }

    pub fn calls(&self) -> Vec<RunnerCall> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn spawned(&self) -> Vec<Invocation> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                RunnerCall::Spawn(inv) => Some(inv.clone()),
                RunnerCall::Kill(_) => None,
            })
            .collect()
    }

    pub fn spawned_stages(&self) -> Vec<StageKind> {
        self.spawned().iter().map(|inv| inv.stage).collect()
    }

    pub fn spawned_labels(&self) -> Vec<String> {
        self.spawned().into_iter().map(|inv| inv.label).collect()
    }

    /// Last invocation spawned for `stage`.
    pub fn last_spawn_of(&self, stage: StageKind) -> Option<Invocation> {
        self.spawned().into_iter().rev().find(|inv| inv.stage == stage)
    }

    pub fn kills(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|c| match c {
                RunnerCall::Kill(label) => Some(label.clone()),
                RunnerCall::Spawn(_) => None,
            })
            .collect()
    }
}

/// A scripted process runner.
///
/// - Tool stages complete immediately with `Success` unless an outcome was
///   scripted with [`FakeRunner::with_outcome`].
/// - The run stage stays alive until killed, unless an outcome was scripted
///   for it, in which case it has already exited when spawned.
/// - [`FakeRunner::with_spawn_error`] makes spawning a stage fail.
/// - [`FakeRunner::gated`] holds every tool stage until a permit is added to
///   the semaphore.
#[derive(Debug, Default)]
pub struct FakeRunner {
    log: CallLog,
    outcomes: HashMap<StageKind, ProcessOutcome>,
    spawn_errors: HashSet<StageKind>,
    gate: Option<Arc<Semaphore>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A runner whose tool stages each wait for one permit of `gate`.
    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn with_outcome(mut self, stage: StageKind, outcome: ProcessOutcome) -> Self {
        self.outcomes.insert(stage, outcome);
        self
    }

    pub fn with_spawn_error(mut self, stage: StageKind) -> Self {
        self.spawn_errors.insert(stage);
        self
    }

    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    fn tool_completion(&self, stage: StageKind) -> Completion {
        let outcome = self
            .outcomes
            .get(&stage)
            .copied()
            .unwrap_or(ProcessOutcome::Success);

        match &self.gate {
            None => Completion::ready(outcome),
            Some(gate) => {
                let gate = Arc::clone(gate);
                let (tx, completion) = Completion::channel();
                tokio::spawn(async move {
                    if let Ok(permit) = gate.acquire().await {
                        permit.forget();
                    }
                    let _ = tx.send(outcome);
                });
                completion
            }
        }
    }
}

impl ProcessRunner for FakeRunner {
    fn spawn(&mut self, invocation: &Invocation) -> Result<SpawnedProcess> {
        self.log.push(RunnerCall::Spawn(invocation.clone()));

        if self.spawn_errors.contains(&invocation.stage) {
            return Err(DevloopError::Spawn {
                label: invocation.label.clone(),
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted spawn failure"),
            });
        }

        if invocation.stage != StageKind::Run {
            return Ok(SpawnedProcess {
                control: Box::new(FakeControl::finished(&invocation.label, self.log.clone())),
                completion: self.tool_completion(invocation.stage),
            });
        }

        match self.outcomes.get(&StageKind::Run) {
            Some(outcome) => Ok(SpawnedProcess {
                control: Box::new(FakeControl::finished(&invocation.label, self.log.clone())),
                completion: Completion::ready(*outcome),
            }),
            None => {
                let (tx, completion) = Completion::channel();
                Ok(SpawnedProcess {
                    control: Box::new(FakeControl {
                        label: invocation.label.clone(),
                        log: self.log.clone(),
                        exited: false,
                        killed: false,
                        done: Some(tx),
                    }),
                    completion,
                })
            }
        }
    }
}

struct FakeControl {
    label: String,
    log: CallLog,
    exited: bool,
    killed: bool,
    done: Option<oneshot::Sender<ProcessOutcome>>,
}

impl FakeControl {
    fn finished(label: &str, log: CallLog) -> Self {
        Self {
            label: label.to_string(),
            log,
            exited: true,
            killed: false,
            done: None,
        }
    }
}

impl ProcessControl for FakeControl {
    fn has_exited(&self) -> bool {
        self.exited
    }

    fn was_killed(&self) -> bool {
        self.killed
    }

    fn kill(&mut self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.log.push(RunnerCall::Kill(self.label.clone()));
            self.killed = true;
            if let Some(done) = self.done.take() {
                let _ = done.send(ProcessOutcome::Killed);
            }
        })
    }
}
