// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::{ProcessOutcome, ProcessRunner};
use crate::types::Trigger;

use super::orchestrator::Orchestrator;
use super::report::{PassReport, PassResult};
use super::RuntimeEvent;

/// What the loop should do after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Feeds watch events into the orchestrator.
///
/// While a pass is in flight the event channel is still drained, but file
/// triggers are dropped rather than queued. A shutdown request ends the loop
/// (abandoning the current pass) and terminates the running program.
pub struct Runtime<R: ProcessRunner> {
    orchestrator: Orchestrator<R>,
    event_rx: mpsc::Receiver<RuntimeEvent>,
}

impl<R: ProcessRunner> fmt::Debug for Runtime<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("orchestrator", &self.orchestrator)
            .finish_non_exhaustive()
    }
}

impl<R: ProcessRunner> Runtime<R> {
    pub fn new(orchestrator: Orchestrator<R>, event_rx: mpsc::Receiver<RuntimeEvent>) -> Self {
        Self {
            orchestrator,
            event_rx,
        }
    }

    /// Run the start-up pass.
    ///
    /// Returns `None` when shutdown was requested during the pass; the
    /// program has then already been stopped and [`Runtime::run`] must not be
    /// called.
    pub async fn initial_pass(&mut self) -> Option<PassResult> {
        let (_, result) = self.drive_pass(Trigger::Initial).await;
        if result.is_none() {
            self.orchestrator.shutdown().await;
        }
        result
    }

    /// Wait for the launched program to exit on its own, or for a shutdown
    /// request. The program is stopped before returning either way.
    ///
    /// Returns the program's outcome, or `None` if none was running or
    /// shutdown came first.
    pub async fn wait_for_program(&mut self) -> Option<ProcessOutcome> {
        let Self {
            orchestrator,
            event_rx,
        } = self;

        let outcome = tokio::select! {
            outcome = orchestrator.wait_for_program() => outcome,
            _ = shutdown_requested(event_rx) => {
                info!("shutdown requested while waiting for the program");
                None
            }
        };

        orchestrator.shutdown().await;
        outcome
    }

    /// Stop the running program (if any).
    pub async fn shutdown(&mut self) {
        self.orchestrator.shutdown().await;
    }

    /// Main event loop. Returns once shutdown is requested or every sender
    /// is gone.
    pub async fn run(mut self) -> Result<()> {
        info!("devloop runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            match event {
                RuntimeEvent::FileChanged(path) => {
                    let (flow, _) = self.drive_pass(Trigger::FileChanged(path)).await;
                    if flow == Flow::Stop {
                        break;
                    }
                }
                RuntimeEvent::ShutdownRequested => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        self.orchestrator.shutdown().await;
        info!("runtime exiting");
        Ok(())
    }

    /// Run one pass while dropping every trigger that arrives meanwhile.
    ///
    /// The result is `None` when a shutdown request abandoned the pass.
    async fn drive_pass(&mut self, trigger: Trigger) -> (Flow, Option<PassResult>) {
        let Self {
            orchestrator,
            event_rx,
        } = self;

        let pass = orchestrator.handle(trigger);
        tokio::pin!(pass);

        let mut dropped = 0usize;
        loop {
            tokio::select! {
                result = &mut pass => {
                    if dropped > 0 {
                        debug!(dropped, "triggers dropped while pass was running");
                    }
                    log_result(&result);
                    return (Flow::Continue, Some(result));
                }
                event = event_rx.recv() => match event {
                    Some(RuntimeEvent::FileChanged(path)) => {
                        debug!(%path, "pass in progress; dropping trigger");
                        dropped += 1;
                    }
                    Some(RuntimeEvent::ShutdownRequested) => {
                        info!("shutdown requested during pass");
                        return (Flow::Stop, None);
                    }
                    None => {
                        let result = (&mut pass).await;
                        log_result(&result);
                        info!("runtime event channel closed; exiting");
                        return (Flow::Stop, Some(result));
                    }
                },
            }
        }
    }
}

/// Resolves on a shutdown request. File triggers are ignored; a closed
/// channel never resolves.
async fn shutdown_requested(event_rx: &mut mpsc::Receiver<RuntimeEvent>) {
    loop {
        match event_rx.recv().await {
            Some(RuntimeEvent::ShutdownRequested) => return,
            Some(RuntimeEvent::FileChanged(path)) => {
                debug!(%path, "not watching; ignoring trigger");
            }
            None => std::future::pending::<()>().await,
        }
    }
}

fn log_result(result: &PassResult) {
    match result {
        PassResult::Completed(report) => log_report(report),
        PassResult::Dropped => debug!("trigger dropped by busy orchestrator"),
    }
}

/// One summary line per pass.
pub fn log_report(report: &PassReport) {
    let failed: Vec<&str> = report
        .stages
        .iter()
        .filter(|r| r.outcome.is_failure())
        .map(|r| r.label.as_str())
        .collect();

    info!(
        trigger = %report.trigger,
        executed = ?report.executed(),
        ?failed,
        cancelled_previous = report.cancelled_previous,
        "pass finished"
    );
}
