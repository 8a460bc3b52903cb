// src/engine/orchestrator.rs

//! Executes plans against a process runner and owns the run state.

use std::fmt;

use tracing::{debug, info, warn};

use crate::exec::{Completion, Invocation, ProcessControl, ProcessOutcome, ProcessRunner};
use crate::pipeline::{FailurePolicy, Pipeline, PlanStep};
use crate::types::{Modes, Trigger};

use super::report::{PassReport, PassResult, SkipReason, StageOutcome};

/// The long-lived program instance started by the last run stage.
struct RunningProgram {
    label: String,
    control: Box<dyn ProcessControl>,
    /// Taken by [`Orchestrator::wait_for_program`].
    completion: Option<Completion>,
}

/// Mutable state carried across passes.
///
/// Owned by the orchestrator and only touched from the runtime loop, so the
/// busy flag is the only synchronisation needed.
struct RunState {
    busy: bool,
    program: Option<RunningProgram>,
    modes: Modes,
}

/// Runs one pass per trigger: format, lint, test, then (past the run-stage
/// gate) clean, compile and run.
pub struct Orchestrator<R: ProcessRunner> {
    pipeline: Pipeline,
    runner: R,
    state: RunState,
}

impl<R: ProcessRunner> fmt::Debug for Orchestrator<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("busy", &self.state.busy)
            .field("modes", &self.state.modes)
            .field(
                "program",
                &self.state.program.as_ref().map(|p| p.label.as_str()),
            )
            .finish_non_exhaustive()
    }
}

impl<R: ProcessRunner> Orchestrator<R> {
    pub fn new(pipeline: Pipeline, runner: R) -> Self {
        let modes = pipeline.modes();
        Self {
            pipeline,
            runner,
            state: RunState {
                busy: false,
                program: None,
                modes,
            },
        }
    }

    pub fn modes(&self) -> Modes {
        self.state.modes
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    /// Whether a program instance is alive (started and neither exited nor
    /// killed).
    pub fn has_live_program(&self) -> bool {
        self.state
            .program
            .as_ref()
            .is_some_and(|p| !p.control.has_exited() && !p.control.was_killed())
    }

    /// Run one orchestration pass for `trigger`.
    ///
    /// Stage failures never surface as errors; they are logged and recorded in
    /// the returned report. A trigger arriving while a pass is in flight is
    /// dropped.
    pub async fn handle(&mut self, trigger: Trigger) -> PassResult {
        if self.state.busy {
            debug!(%trigger, "pass already in progress; dropping trigger");
            return PassResult::Dropped;
        }

        self.state.busy = true;
        let report = self.execute(trigger).await;
        self.state.busy = false;

        PassResult::Completed(report)
    }

    /// Wait for the current program instance to exit on its own.
    ///
    /// Returns `None` if no program was launched or its completion was already
    /// consumed.
    pub async fn wait_for_program(&mut self) -> Option<ProcessOutcome> {
        let completion = self.state.program.as_mut()?.completion.take()?;
        Some(completion.wait().await)
    }

    /// Terminate the program instance (if alive) and reset the guard.
    pub async fn shutdown(&mut self) {
        if self.cancel_previous().await {
            info!("program instance terminated on shutdown");
        }
        self.state.busy = false;
    }

    async fn execute(&mut self, trigger: Trigger) -> PassReport {
        let plan = self.pipeline.plan(&trigger);
        info!(%trigger, stages = ?plan.executed_stages(), "starting pass");

        let mut report = PassReport::new(trigger);
        let mut aborted = false;

        for step in plan.steps {
            match step {
                PlanStep::CancelPrevious => {
                    if self.cancel_previous().await {
                        report.cancelled_previous = true;
                    }
                }
                PlanStep::Skip { stage, label } => {
                    report.record(stage, label, StageOutcome::Skipped(SkipReason::NotApplicable));
                }
                PlanStep::Execute { invocation, .. } if aborted => {
                    debug!(stage = %invocation.stage, "skipping stage after aborting failure");
                    report.record(
                        invocation.stage,
                        invocation.label,
                        StageOutcome::Skipped(SkipReason::Aborted),
                    );
                }
                PlanStep::Execute { invocation, policy } => {
                    let outcome = self.run_stage(&invocation, policy).await;

                    if outcome.is_failure() {
                        if policy == FailurePolicy::AbortRemaining {
                            warn!(label = %invocation.label, "stage failed; skipping remaining stages");
                            aborted = true;
                        } else {
                            info!(label = %invocation.label, "stage failed; continuing");
                        }
                    }

                    report.record(invocation.stage, invocation.label, outcome);
                }
            }
        }

        report
    }

    async fn run_stage(&mut self, invocation: &Invocation, policy: FailurePolicy) -> StageOutcome {
        let spawned = match self.runner.spawn(invocation) {
            Ok(spawned) => spawned,
            Err(err) => {
                warn!(label = %invocation.label, error = %err, "stage could not be started");
                return StageOutcome::Failed { code: None };
            }
        };

        if policy == FailurePolicy::Detached {
            self.state.program = Some(RunningProgram {
                label: invocation.label.clone(),
                control: spawned.control,
                completion: Some(spawned.completion),
            });
            return StageOutcome::Launched;
        }

        match spawned.completion.wait().await {
            ProcessOutcome::Success => StageOutcome::Succeeded,
            ProcessOutcome::Failed(code) => StageOutcome::Failed { code: Some(code) },
            ProcessOutcome::Killed => StageOutcome::Failed { code: None },
        }
    }

    /// Kill the previous program instance if it has not exited and was not
    /// already killed. Returns whether a kill was issued.
    async fn cancel_previous(&mut self) -> bool {
        let Some(program) = self.state.program.as_mut() else {
            return false;
        };
        if program.control.has_exited() || program.control.was_killed() {
            return false;
        }

        info!(label = %program.label, "terminating previous program instance");
        program.control.kill().await;
        true
    }
}
