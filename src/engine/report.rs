// src/engine/report.rs

//! Per-pass outcome records.

use crate::pipeline::StageKind;
use crate::types::Trigger;

/// Why a stage did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The stage's predicate rejected the trigger (or the modes exclude it).
    NotApplicable,
    /// An earlier stage with `AbortRemaining` failed.
    Aborted,
}

/// What happened to a single stage in a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded,
    /// Non-zero exit (`Some(code)`), or the process could not be started or
    /// was terminated (`None`).
    Failed { code: Option<i32> },
    /// The long-lived program was started and left running.
    Launched,
    Skipped(SkipReason),
}

impl StageOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, StageOutcome::Failed { .. })
    }

    pub fn was_executed(&self) -> bool {
        !matches!(self, StageOutcome::Skipped(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRecord {
    pub stage: StageKind,
    pub label: String,
    pub outcome: StageOutcome,
}

/// Everything one orchestration pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub trigger: Trigger,
    /// One record per stage, in pipeline order.
    pub stages: Vec<StageRecord>,
    /// Whether a still-running program instance was terminated.
    pub cancelled_previous: bool,
}

impl PassReport {
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            stages: Vec::new(),
            cancelled_previous: false,
        }
    }

    pub fn record(&mut self, stage: StageKind, label: String, outcome: StageOutcome) {
        self.stages.push(StageRecord {
            stage,
            label,
            outcome,
        });
    }

    pub fn outcome_of(&self, stage: StageKind) -> Option<StageOutcome> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.outcome)
    }

    /// Stages that actually spawned a process, in order.
    pub fn executed(&self) -> Vec<StageKind> {
        self.stages
            .iter()
            .filter(|r| r.outcome.was_executed())
            .map(|r| r.stage)
            .collect()
    }

    pub fn has_failures(&self) -> bool {
        self.stages.iter().any(|r| r.outcome.is_failure())
    }
}

/// Result of handing a trigger to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassResult {
    Completed(PassReport),
    /// A pass was already in flight; the trigger was ignored.
    Dropped,
}

impl PassResult {
    pub fn report(&self) -> Option<&PassReport> {
        match self {
            PassResult::Completed(report) => Some(report),
            PassResult::Dropped => None,
        }
    }
}
