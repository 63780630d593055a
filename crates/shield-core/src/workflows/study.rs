use super::report::{self, ReportSummary};
use crate::core::io::results::{JsonResultFile, load_or_empty};
use crate::core::io::traits::ResultFile;
use crate::core::models::configuration::Configuration;
use crate::core::models::store::ResultStore;
use crate::core::transport::engine::TransportEngine;
use crate::engine::config::SweepConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::ranking::{CRITICAL_COUNT, highest_doses};
use crate::engine::sweep::{SweepController, SweepSummary};
use std::sync::atomic::AtomicBool;
use tracing::{info, instrument};

/// One entry of the critical-configuration ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct CriticalConfiguration {
    pub rank: usize,
    pub key: String,
    pub configuration: Configuration,
    pub dose_rem_per_hr: f64,
}

#[derive(Debug)]
pub struct StudyResult {
    pub store: ResultStore,
    pub sweep: SweepSummary,
    pub report: Option<ReportSummary>,
    pub critical: Vec<CriticalConfiguration>,
}

/// Runs a complete study: resume from the checkpoint, sweep, save the final results,
/// write the report artifacts and rank the critical configurations.
///
/// Only a failure to create the results directory, a failure to save the final
/// results, or an interrupt ends the study with an error.
#[instrument(skip_all, name = "dose_study_workflow")]
pub fn run(
    config: &SweepConfig,
    engine: &dyn TransportEngine,
    reporter: &ProgressReporter,
    interrupt: Option<&AtomicBool>,
) -> Result<StudyResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    std::fs::create_dir_all(&config.results_dir).map_err(|source| {
        EngineError::ResultsDirectory {
            path: config.results_dir.clone(),
            source,
        }
    })?;
    let store = load_or_empty(&config.checkpoint_path());
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Parameter Sweep",
    });
    let mut controller = SweepController::new(config, engine, reporter);
    if let Some(flag) = interrupt {
        controller = controller.with_interrupt(flag);
    }
    let outcome = controller.run(store)?;
    reporter.report(Progress::PhaseFinish);

    let final_path = config.final_results_path();
    JsonResultFile::write_to_path(&outcome.store, &final_path).map_err(|source| {
        EngineError::Persistence {
            path: final_path.clone(),
            source,
        }
    })?;
    info!(
        "Simulations complete. {} successful, {} failed. Final results saved to {:?}.",
        outcome.summary.completed, outcome.summary.failed, final_path
    );

    let report = if outcome.store.is_empty() {
        info!("No results available; skipping the report.");
        None
    } else {
        reporter.report(Progress::PhaseStart { name: "Report" });
        let summary = report::write_all(&outcome.store, config);
        reporter.report(Progress::PhaseFinish);
        Some(summary)
    };

    let critical = rank_critical(&outcome.store);
    if !critical.is_empty() {
        info!("Critical configurations (highest dose rates):");
        for entry in &critical {
            let c = &entry.configuration;
            info!(
                "{}. Energy: {} MeV, Channel Diameter: {} cm, Distance: {} cm, Angle: {}°, Dose: {:.6e} rem/hr",
                entry.rank,
                c.energy_mev,
                c.channel_diameter_cm,
                c.detector_distance_cm,
                c.detector_angle_deg,
                entry.dose_rem_per_hr
            );
        }
    }

    Ok(StudyResult {
        store: outcome.store,
        sweep: outcome.summary,
        report,
        critical,
    })
}

/// The highest-dose configurations, with their fields decoded from the stored keys.
fn rank_critical(store: &ResultStore) -> Vec<CriticalConfiguration> {
    highest_doses(store, CRITICAL_COUNT)
        .into_iter()
        .enumerate()
        .map(|(i, result)| {
            let key = result.key();
            // Stored keys are canonical, so decoding cannot disagree with the record.
            let configuration = Configuration::from_key(&key).unwrap_or(result.configuration);
            CriticalConfiguration {
                rank: i + 1,
                key,
                configuration,
                dose_rem_per_hr: result.dose_rem_per_hr,
            }
        })
        .collect()
}
