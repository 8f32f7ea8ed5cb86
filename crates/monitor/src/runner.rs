//! Monitor Driver Loop
//!
//! Composes one cycle - collect logs, diagnose, extract, vet, execute,
//! notify - and repeats it on a fixed interval until shutdown. A failed cycle
//! is logged and skipped; only the shutdown signal ends the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::agent::{suggestion, DiagnosisClient, SafetyValidator, Suggestion};
use crate::config::ExecutionMode;
use crate::executor::{CommandRunner, ExecutionResult};
use crate::kubernetes::{LogBundle, LogCollector};
use crate::metrics;
use crate::notify::{NotificationRecord, Notifier};
use crate::Result;

/// What one cycle did, for logging and tests.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Nothing to look at: the namespace had no pods.
    NoPods,
    /// The diagnosis contained no actionable command.
    NoActionableFix { diagnosis: String },
    /// A suggestion was vetted, (maybe) executed, and reported.
    FixAttempted {
        suggestion: Suggestion,
        result: ExecutionResult,
        record: NotificationRecord,
    },
}

/// Everything downstream of log collection. Split out so the full chain can
/// run against a fixed bundle without a cluster.
pub struct Pipeline {
    diagnosis: DiagnosisClient,
    validator: SafetyValidator,
    runner: Arc<dyn CommandRunner>,
    notifier: Notifier,
    mode: ExecutionMode,
}

impl Pipeline {
    pub fn new(
        diagnosis: DiagnosisClient,
        validator: SafetyValidator,
        runner: Arc<dyn CommandRunner>,
        notifier: Notifier,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            diagnosis,
            validator,
            runner,
            notifier,
            mode,
        }
    }

    /// Diagnose a bundle and act on the result.
    pub async fn process(&self, bundle: &LogBundle) -> Result<CycleOutcome> {
        if bundle.is_empty() {
            info!("No pods in namespace, nothing to diagnose");
            return Ok(CycleOutcome::NoPods);
        }

        let diagnosis = self.diagnosis.diagnose(bundle).await?;

        let Some(suggestion) = suggestion::extract(&diagnosis) else {
            info!("No actionable fix suggested");
            return Ok(CycleOutcome::NoActionableFix { diagnosis });
        };

        info!(command = %suggestion.command_line(), "Extracted fix suggestion");
        let result = self.apply_fix(&suggestion).await;

        let message = format!(
            "Kubernetes issue detected and fixed.\n\nSuggested Fix:\n{}\n\nExecution Result:\n{}",
            suggestion.command_line(),
            result.result_text()
        );
        let record = self.notifier.notify_all(&message).await;

        Ok(CycleOutcome::FixAttempted {
            suggestion,
            result,
            record,
        })
    }

    /// Vet the suggestion and run it if the mode allows. Every refusal comes
    /// back as an `ExecutionResult` so the outcome is always reportable.
    async fn apply_fix(&self, suggestion: &Suggestion) -> ExecutionResult {
        if let Err(e) = self.validator.validate(suggestion) {
            warn!(command = %suggestion.command_line(), error = %e, "Suggestion rejected");
            return ExecutionResult::blocked(e.to_string());
        }

        match self.mode {
            ExecutionMode::DryRun => ExecutionResult::dry_run(&suggestion.command_line()),
            ExecutionMode::ReadOnly if self.validator.requires_enforce(suggestion) => {
                warn!(command = %suggestion.command_line(), "Mutating command blocked in read-only mode");
                ExecutionResult::blocked(format!(
                    "'{}' mutates cluster state and requires enforce mode",
                    suggestion.command_line()
                ))
            }
            _ => {
                metrics::FIXES_EXECUTED_TOTAL.inc();
                self.runner.run(&suggestion.tool, &suggestion.args).await
            }
        }
    }
}

/// The polling loop: collect, process, sleep, repeat.
pub struct Monitor {
    collector: LogCollector,
    pipeline: Pipeline,
    interval: Duration,
}

impl Monitor {
    pub fn new(collector: LogCollector, pipeline: Pipeline, interval: Duration) -> Self {
        Self {
            collector,
            pipeline,
            interval,
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleOutcome> {
        metrics::CYCLES_TOTAL.inc();
        let bundle = self.collector.collect().await?;
        self.pipeline.process(&bundle).await
    }

    /// Run until the shutdown signal fires. The ticker's missed-tick behavior
    /// guarantees a slow cycle can never overlap the next one, and the signal
    /// also preempts a cycle that is still waiting on an external call.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = self.interval.as_secs(), "Monitor loop started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => {
                    info!("Shutdown requested, stopping monitor loop");
                    break;
                }
            }

            tokio::select! {
                outcome = self.run_cycle() => match outcome {
                    Ok(CycleOutcome::FixAttempted { suggestion, record, .. }) => {
                        info!(
                            command = %suggestion.command_line(),
                            delivered = record.all_sent(),
                            "Cycle completed with a fix attempt"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        metrics::CYCLE_FAILURES_TOTAL.inc();
                        error!(error = %e, "Cycle failed, continuing");
                    }
                },
                _ = shutdown.changed() => {
                    info!("Shutdown requested mid-cycle, stopping monitor loop");
                    break;
                }
            }
        }
    }
}
