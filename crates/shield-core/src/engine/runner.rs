use super::config::SweepConfig;
use super::workdir::RunDirectory;
use crate::core::dose::analytic::AnalyticDoseModel;
use crate::core::dose::conversion::DoseConverter;
use crate::core::io::tables;
use crate::core::models::configuration::Configuration;
use crate::core::models::result::{DoseMethod, RunOutcome, SimulationResult, TallySummary};
use crate::core::transport::engine::{TransportEngine, TransportError};
use crate::core::transport::model::{RunSettings, TransportModel};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

pub const SPECTRUM_FILE: &str = "spectrum.csv";
pub const MESH_FLUX_FILE: &str = "mesh_flux.csv";

/// Runs one configuration through the transport engine and turns the outcome into a
/// dose rate.
///
/// A run never fails from the caller's point of view: any error while building,
/// executing or reading back the transport run is logged and answered with the
/// analytic estimate. There are no retries.
pub struct SimulationRunner<'a> {
    config: &'a SweepConfig,
    engine: &'a dyn TransportEngine,
    converter: DoseConverter,
    analytic: AnalyticDoseModel,
}

impl<'a> SimulationRunner<'a> {
    pub fn new(config: &'a SweepConfig, engine: &'a dyn TransportEngine) -> Self {
        let converter = DoseConverter::ncrp_38();
        Self {
            config,
            engine,
            converter,
            analytic: AnalyticDoseModel::new(config.geometry, converter),
        }
    }

    #[instrument(skip_all, name = "simulation_run", fields(key = %configuration.key()))]
    pub fn run(&self, configuration: &Configuration) -> SimulationResult {
        let detector = self.config.geometry.detector_center(
            configuration.detector_distance_cm,
            configuration.detector_angle_deg,
        );

        let (dose_rem_per_hr, outcome) = match self.transport(configuration) {
            Ok(tallies) => self.accept(configuration, tallies),
            Err(e) => {
                warn!(
                    "Transport run for {} failed: {}. Using the analytic estimate.",
                    configuration.key(),
                    e
                );
                (self.analytic_dose(configuration), RunOutcome::Fallback)
            }
        };

        SimulationResult {
            configuration: *configuration,
            detector_x: detector.x,
            detector_y: detector.y,
            dose_rem_per_hr,
            outcome,
        }
    }

    /// Dose from the closed-form model, for the full source-to-detector path.
    pub fn analytic_dose(&self, configuration: &Configuration) -> f64 {
        let path_length = self
            .config
            .geometry
            .path_length_cm(configuration.detector_distance_cm);
        self.analytic.estimate(
            configuration.energy_mev,
            configuration.channel_diameter_cm,
            configuration.detector_distance_cm,
            configuration.detector_angle_deg,
            path_length,
        )
    }

    fn transport(&self, configuration: &Configuration) -> Result<TallySummary, TransportError> {
        let key = configuration.key();
        let workdir = RunDirectory::acquire(&self.config.results_dir, &key).map_err(|source| {
            TransportError::Io {
                path: self.config.results_dir.join(format!("run_{key}")),
                source,
            }
        })?;

        let settings = RunSettings::fixed_source(
            self.config.transport.particles_for(configuration),
            self.config.transport.batches,
        );
        let model = TransportModel::build(configuration, &self.config.geometry, settings);
        debug!(
            particles = model.settings.particles,
            batches = model.settings.batches,
            "Built transport model."
        );

        self.engine.execute(&model, workdir.path())?;
        let tallies = self
            .engine
            .read_tallies(&model, workdir.path())?
            .summarize(&model.tallies)?;
        debug!(total_flux = tallies.total_flux, "Extracted tallies.");

        write_run_artifacts(workdir.path(), &model, &tallies);
        Ok(tallies)
    }

    fn accept(
        &self,
        configuration: &Configuration,
        tallies: TallySummary,
    ) -> (f64, RunOutcome) {
        let tallied = self
            .converter
            .dose_from_flux(configuration.energy_mev, tallies.total_flux);

        if self
            .config
            .fallback
            .is_insufficient(tallies.total_flux, tallied)
        {
            let dose = self.analytic_dose(configuration);
            info!(
                "Insufficient statistics for {} (flux {:.3e}, dose {:.3e}); using analytic dose {:.3e} rem/hr.",
                configuration.key(),
                tallies.total_flux,
                tallied,
                dose
            );
            (
                dose,
                RunOutcome::MonteCarlo {
                    tallies,
                    dose_method: DoseMethod::Analytic,
                },
            )
        } else {
            (
                tallied,
                RunOutcome::MonteCarlo {
                    tallies,
                    dose_method: DoseMethod::MonteCarlo,
                },
            )
        }
    }
}

fn write_run_artifacts(dir: &Path, model: &TransportModel, tallies: &TallySummary) {
    let spectrum = tables::write_spectrum(
        &dir.join(SPECTRUM_FILE),
        &model.tallies.detector.energy_edges_mev,
        &tallies.spectrum,
    );
    let mesh = tables::write_matrix(&dir.join(MESH_FLUX_FILE), &tallies.mesh);
    for e in [spectrum.err(), mesh.err()].into_iter().flatten() {
        warn!("Failed to write run artifact: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dose::conversion::factor_for_energy;
    use crate::core::geometry::ShieldingGeometry;
    use crate::engine::config::{SweepConfigBuilder, SweepGrid};
    use crate::engine::testing::{Script, ScriptedEngine};
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> SweepConfig {
        SweepConfigBuilder::new()
            .geometry(ShieldingGeometry::default())
            .grid(SweepGrid::test_mode())
            .results_dir(dir.path().to_path_buf())
            .build()
            .unwrap()
    }

    fn configuration() -> Configuration {
        Configuration::new(1.0, 0.5, 30.0, 0.0)
    }

    #[test]
    fn adequate_tallies_give_the_monte_carlo_dose() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let engine = ScriptedEngine::always(Script::Uniform(0.01));
        let result = SimulationRunner::new(&config, &engine).run(&configuration());

        let total_flux = 0.01 * 99.0;
        assert_eq!(result.dose_method(), DoseMethod::MonteCarlo);
        assert!((result.dose_rem_per_hr - total_flux * factor_for_energy(1.0)).abs() < 1e-15);
        let tallies = result.tallies().unwrap();
        assert_eq!(tallies.spectrum.len(), 99);
        assert_eq!(tallies.mesh.len(), 100);

        let run_dir = dir.path().join("run_E1_D0.5_dist30_ang0");
        assert!(run_dir.join(SPECTRUM_FILE).exists());
        assert!(run_dir.join(MESH_FLUX_FILE).exists());
        assert!(!RunDirectory::is_locked(&run_dir));
    }

    #[test]
    fn weak_flux_selects_the_analytic_dose_but_keeps_tallies() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        // 99 bins summing to 1e-7.
        let engine = ScriptedEngine::always(Script::Uniform(1e-7 / 99.0));
        let runner = SimulationRunner::new(&config, &engine);
        let result = runner.run(&configuration());

        assert_eq!(result.dose_method(), DoseMethod::Analytic);
        assert!(!result.is_fallback());
        assert!((result.tallies().unwrap().total_flux - 1e-7).abs() < 1e-18);
        assert_eq!(result.dose_rem_per_hr, runner.analytic_dose(&configuration()));
    }

    #[test]
    fn failed_execution_falls_back_without_tallies() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let engine = ScriptedEngine::always(Script::FailExecute);
        let runner = SimulationRunner::new(&config, &engine);
        let result = runner.run(&configuration());

        assert!(result.is_fallback());
        assert!(result.tallies().is_none());
        assert!(result.dose_rem_per_hr > 0.0);
        assert_eq!(engine.executions.get(), 1);

        let run_dir = dir.path().join("run_E1_D0.5_dist30_ang0");
        assert!(!run_dir.join(SPECTRUM_FILE).exists());
        assert!(!RunDirectory::is_locked(&run_dir));
    }

    #[test]
    fn failed_read_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let engine = ScriptedEngine::always(Script::FailRead);
        let result = SimulationRunner::new(&config, &engine).run(&configuration());
        assert!(result.is_fallback());
    }

    #[test]
    fn detector_position_follows_the_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let engine = ScriptedEngine::always(Script::FailExecute);
        let result = SimulationRunner::new(&config, &engine)
            .run(&Configuration::new(1.0, 0.5, 100.0, 90.0));

        let wall_back = config.geometry.wall_back_x();
        assert!((result.detector_x - wall_back).abs() < 1e-9);
        assert!((result.detector_y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn each_configuration_gets_its_own_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(&dir);
        let engine = ScriptedEngine::always(Script::Uniform(1.0));
        let runner = SimulationRunner::new(&config, &engine);
        runner.run(&Configuration::new(1.0, 0.5, 30.0, 0.0));
        runner.run(&Configuration::new(1.0, 0.5, 30.0, 15.0));

        let workdirs = engine.workdirs.borrow();
        assert_eq!(workdirs.len(), 2);
        assert_ne!(workdirs[0], workdirs[1]);
        assert!(workdirs.iter().all(|w| w.starts_with(dir.path())));
    }
}
