use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileEngineConfig {
    pub program: Option<PathBuf>,
    pub args: Option<Vec<String>>,
    pub cross_sections: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileGeometryConfig {
    pub wall_thickness_cm: Option<f64>,
    pub source_to_wall_distance_cm: Option<f64>,
    pub detector_diameter_cm: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileGridConfig {
    pub energies: Option<Vec<f64>>,
    pub channel_diameters: Option<Vec<f64>>,
    pub detector_distances: Option<Vec<f64>>,
    pub detector_angles: Option<Vec<f64>>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileTransportConfig {
    pub particles: Option<u64>,
    pub particles_hard_case: Option<u64>,
    pub batches: Option<u32>,
    pub hard_angle_above_deg: Option<f64>,
    pub hard_diameter_below_cm: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileFallbackConfig {
    pub min_total_flux: Option<f64>,
    pub min_dose: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileConfig {
    pub test_mode: Option<bool>,
    pub results_dir: Option<PathBuf>,
    pub engine: Option<FileEngineConfig>,
    pub geometry: Option<FileGeometryConfig>,
    pub grid: Option<FileGridConfig>,
    pub transport: Option<FileTransportConfig>,
    pub fallback: Option<FileFallbackConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
