use crate::core::geometry::ShieldingGeometry;
use crate::core::models::configuration::Configuration;
use std::path::PathBuf;
use thiserror::Error;

pub const CHECKPOINT_FILE: &str = "intermediate_results.json";
pub const FINAL_RESULTS_FILE: &str = "final_results.json";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    Invalid {
        parameter: &'static str,
        reason: String,
    },
}

/// Parameter lists swept in nested order: energy, diameter, distance, angle.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepGrid {
    pub energies_mev: Vec<f64>,
    pub channel_diameters_cm: Vec<f64>,
    pub detector_distances_cm: Vec<f64>,
    pub detector_angles_deg: Vec<f64>,
}

impl SweepGrid {
    pub fn full() -> Self {
        Self {
            energies_mev: vec![0.1, 0.5, 1.0, 2.0, 5.0],
            channel_diameters_cm: vec![0.05, 0.1, 0.5, 1.0],
            detector_distances_cm: vec![30.0, 40.0, 60.0, 80.0, 100.0, 150.0],
            detector_angles_deg: vec![0.0, 5.0, 10.0, 15.0, 30.0, 45.0],
        }
    }

    /// A reduced grid for quick runs.
    pub fn test_mode() -> Self {
        Self {
            energies_mev: vec![0.1, 1.0, 5.0],
            channel_diameters_cm: vec![0.05, 0.5],
            detector_distances_cm: vec![30.0, 100.0],
            detector_angles_deg: vec![0.0, 15.0, 45.0],
        }
    }

    pub fn len(&self) -> usize {
        self.energies_mev.len()
            * self.channel_diameters_cm.len()
            * self.detector_distances_cm.len()
            * self.detector_angles_deg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every configuration, with the angle varying fastest.
    pub fn configurations(&self) -> impl Iterator<Item = Configuration> + '_ {
        self.energies_mev.iter().flat_map(move |&energy| {
            self.channel_diameters_cm.iter().flat_map(move |&diameter| {
                self.detector_distances_cm.iter().flat_map(move |&distance| {
                    self.detector_angles_deg
                        .iter()
                        .map(move |&angle| Configuration::new(energy, diameter, distance, angle))
                })
            })
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let lists: [(&'static str, &[f64]); 4] = [
            ("energies", &self.energies_mev),
            ("channel_diameters", &self.channel_diameters_cm),
            ("detector_distances", &self.detector_distances_cm),
            ("detector_angles", &self.detector_angles_deg),
        ];
        for (parameter, values) in lists {
            if values.is_empty() {
                return Err(ConfigError::Invalid {
                    parameter,
                    reason: "the list is empty".to_string(),
                });
            }
            if let Some(v) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
                return Err(ConfigError::Invalid {
                    parameter,
                    reason: format!("{v} is not a finite, non-negative number"),
                });
            }
        }
        if let Some(v) = self.energies_mev.iter().find(|v| **v <= 0.0) {
            return Err(ConfigError::Invalid {
                parameter: "energies",
                reason: format!("{v} MeV is not a positive energy"),
            });
        }
        Ok(())
    }
}

/// Particle counts for the transport runs.
///
/// Hard cases (wide detector angles or narrow channels) get the larger count.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportSettings {
    pub particles: u64,
    pub particles_hard_case: u64,
    pub batches: u32,
    pub hard_angle_above_deg: f64,
    pub hard_diameter_below_cm: f64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            particles: 100_000,
            particles_hard_case: 500_000,
            batches: 20,
            hard_angle_above_deg: 30.0,
            hard_diameter_below_cm: 0.1,
        }
    }
}

impl TransportSettings {
    pub fn particles_for(&self, configuration: &Configuration) -> u64 {
        if configuration.detector_angle_deg > self.hard_angle_above_deg
            || configuration.channel_diameter_cm < self.hard_diameter_below_cm
        {
            self.particles_hard_case
        } else {
            self.particles
        }
    }
}

/// Thresholds below which a tallied result is replaced by the analytic estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackCriteria {
    pub min_total_flux: f64,
    pub min_dose_rem_per_hr: f64,
}

impl Default for FallbackCriteria {
    fn default() -> Self {
        Self {
            min_total_flux: 1e-6,
            min_dose_rem_per_hr: 1e-10,
        }
    }
}

impl FallbackCriteria {
    pub fn is_insufficient(&self, total_flux: f64, dose: f64) -> bool {
        // NaN counts as insufficient.
        !(total_flux >= self.min_total_flux) || !(dose >= self.min_dose_rem_per_hr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepConfig {
    pub geometry: ShieldingGeometry,
    pub grid: SweepGrid,
    pub transport: TransportSettings,
    pub fallback: FallbackCriteria,
    pub results_dir: PathBuf,
}

impl SweepConfig {
    pub fn checkpoint_path(&self) -> PathBuf {
        self.results_dir.join(CHECKPOINT_FILE)
    }

    pub fn final_results_path(&self) -> PathBuf {
        self.results_dir.join(FINAL_RESULTS_FILE)
    }
}

#[derive(Default)]
pub struct SweepConfigBuilder {
    geometry: Option<ShieldingGeometry>,
    grid: Option<SweepGrid>,
    transport: Option<TransportSettings>,
    fallback: Option<FallbackCriteria>,
    results_dir: Option<PathBuf>,
}

impl SweepConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn geometry(mut self, geometry: ShieldingGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }
    pub fn grid(mut self, grid: SweepGrid) -> Self {
        self.grid = Some(grid);
        self
    }
    pub fn transport(mut self, transport: TransportSettings) -> Self {
        self.transport = Some(transport);
        self
    }
    pub fn fallback(mut self, fallback: FallbackCriteria) -> Self {
        self.fallback = Some(fallback);
        self
    }
    pub fn results_dir(mut self, dir: PathBuf) -> Self {
        self.results_dir = Some(dir);
        self
    }

    pub fn build(self) -> Result<SweepConfig, ConfigError> {
        let geometry = self
            .geometry
            .ok_or(ConfigError::MissingParameter("geometry"))?;
        let grid = self.grid.ok_or(ConfigError::MissingParameter("grid"))?;
        let results_dir = self
            .results_dir
            .ok_or(ConfigError::MissingParameter("results_dir"))?;

        let lengths = [
            ("wall_thickness", geometry.wall_thickness_cm),
            ("source_to_wall_distance", geometry.source_to_wall_distance_cm),
            ("detector_diameter", geometry.detector_diameter_cm),
        ];
        for (parameter, value) in lengths {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    parameter,
                    reason: format!("{value} cm is not a positive length"),
                });
            }
        }
        grid.validate()?;

        let transport = self.transport.unwrap_or_default();
        if transport.particles == 0 || transport.particles_hard_case == 0 || transport.batches == 0
        {
            return Err(ConfigError::Invalid {
                parameter: "transport",
                reason: "particle and batch counts must be positive".to_string(),
            });
        }

        Ok(SweepConfig {
            geometry,
            grid,
            transport,
            fallback: self.fallback.unwrap_or_default(),
            results_dir,
        })
    }
}
