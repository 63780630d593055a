use super::config::SweepConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter, SweepStatus};
use super::runner::SimulationRunner;
use crate::core::io::results::JsonResultFile;
use crate::core::io::traits::ResultFile;
use crate::core::models::configuration::Configuration;
use crate::core::models::result::SimulationResult;
use crate::core::models::store::ResultStore;
use crate::core::transport::engine::TransportEngine;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{error, info, instrument, warn};

/// Counts kept while sweeping.
///
/// `completed` includes runs that fell back to the analytic estimate; those are also
/// counted in `transport_failures`. `failed` counts configurations that produced no
/// result at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub total: usize,
    pub skipped: usize,
    pub completed: usize,
    pub transport_failures: usize,
    pub failed: usize,
}

impl SweepSummary {
    pub fn processed(&self) -> usize {
        self.skipped + self.completed + self.failed
    }
}

#[derive(Debug)]
pub struct SweepOutcome {
    pub store: ResultStore,
    pub summary: SweepSummary,
}

/// Walks the whole parameter grid, resuming from whatever is already in the store.
pub struct SweepController<'a> {
    config: &'a SweepConfig,
    engine: &'a dyn TransportEngine,
    reporter: &'a ProgressReporter<'a>,
    interrupt: Option<&'a AtomicBool>,
}

impl<'a> SweepController<'a> {
    pub fn new(
        config: &'a SweepConfig,
        engine: &'a dyn TransportEngine,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            config,
            engine,
            reporter,
            interrupt: None,
        }
    }

    /// Stops the sweep at the next configuration boundary once `flag` is raised.
    pub fn with_interrupt(mut self, flag: &'a AtomicBool) -> Self {
        self.interrupt = Some(flag);
        self
    }

    fn interrupted(&self) -> bool {
        self.interrupt
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    #[instrument(skip_all, name = "parameter_sweep", fields(total = self.config.grid.len()))]
    pub fn run(&self, mut store: ResultStore) -> Result<SweepOutcome, EngineError> {
        let runner = SimulationRunner::new(self.config, self.engine);
        let checkpoint = self.config.checkpoint_path();
        let mut summary = SweepSummary {
            total: self.config.grid.len(),
            ..SweepSummary::default()
        };

        info!(
            "Sweeping {} configurations with the '{}' engine ({} results already stored).",
            summary.total,
            self.engine.name(),
            store.len()
        );
        self.reporter.report(Progress::TaskStart {
            total_steps: summary.total as u64,
        });
        let started = Instant::now();

        for configuration in self.config.grid.configurations() {
            if self.interrupted() {
                return Err(self.stop(&store, &summary, &checkpoint));
            }

            if store.is_complete(&configuration) {
                info!("Skipping {} - already completed.", configuration.key());
                summary.skipped += 1;
            } else {
                info!(
                    "[{}/{}] Running {}",
                    summary.processed() + 1,
                    summary.total,
                    configuration.key()
                );
                let attempt = self.attempt(&runner, &configuration);
                // A run cut short by the interrupt is not a result; it is retried on resume.
                if self.interrupted() {
                    warn!(
                        "Discarding the interrupted run for {}; it will be retried on resume.",
                        configuration.key()
                    );
                    return Err(self.stop(&store, &summary, &checkpoint));
                }
                match attempt {
                    Some(result) => record(result, &configuration, &mut store, &mut summary),
                    None => summary.failed += 1,
                }
                save_checkpoint(&store, &checkpoint);
            }

            let status = SweepStatus::new(summary.processed(), summary.total, started.elapsed());
            self.reporter.report(Progress::TaskIncrement);
            self.reporter.report(Progress::Status(status));

            if self.interrupted() {
                return Err(self.stop(&store, &summary, &checkpoint));
            }
        }

        self.reporter.report(Progress::TaskFinish);
        info!(
            "Sweep complete: {} run, {} skipped, {} fell back after a transport failure, {} failed.",
            summary.completed, summary.skipped, summary.transport_failures, summary.failed
        );
        Ok(SweepOutcome { store, summary })
    }

    /// Runs one configuration; a panic inside the run yields no result.
    fn attempt(
        &self,
        runner: &SimulationRunner,
        configuration: &Configuration,
    ) -> Option<SimulationResult> {
        match panic::catch_unwind(AssertUnwindSafe(|| runner.run(configuration))) {
            Ok(result) => Some(result),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Run for {} aborted: {}", configuration.key(), message);
                None
            }
        }
    }

    fn stop(&self, store: &ResultStore, summary: &SweepSummary, checkpoint: &Path) -> EngineError {
        warn!("Interrupt received; saving results before stopping.");
        if let Err(source) = JsonResultFile::write_to_path(store, checkpoint) {
            return EngineError::Persistence {
                path: checkpoint.to_path_buf(),
                source,
            };
        }
        self.reporter.report(Progress::Message(format!(
            "Interrupted; {} results saved.",
            store.len()
        )));
        EngineError::Interrupted {
            completed: summary.processed(),
            total: summary.total,
            checkpoint: checkpoint.to_path_buf(),
        }
    }
}

fn record(
    result: SimulationResult,
    configuration: &Configuration,
    store: &mut ResultStore,
    summary: &mut SweepSummary,
) {
    let fell_back = result.is_fallback();
    match store.insert(result) {
        Ok(()) => {
            summary.completed += 1;
            if fell_back {
                summary.transport_failures += 1;
            }
        }
        Err(e) => {
            error!("Discarding result for {}: {}", configuration.key(), e);
            summary.failed += 1;
        }
    }
}

/// A failed checkpoint leaves the previous one in place; the sweep goes on.
fn save_checkpoint(store: &ResultStore, path: &Path) {
    if let Err(e) = JsonResultFile::write_to_path(store, path) {
        warn!("Failed to save checkpoint {:?}: {}", path, e);
    }
}
