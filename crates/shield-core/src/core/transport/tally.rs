use super::engine::TransportError;
use super::model::TallySpecification;
use crate::core::models::result::TallySummary;
use serde::{Deserialize, Serialize};

/// Tally values as produced by an engine, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTallies {
    /// Detector-cell flux per energy bin, in bin order.
    pub detector_spectrum: Vec<f64>,
    /// Mesh flux, one row per mesh index along x.
    pub mesh_flux: Vec<Vec<f64>>,
}

impl RawTallies {
    /// Checks the tallies against the requested layout and sums the spectrum.
    ///
    /// A spectrum of the wrong length, a mesh of the wrong shape, or any non-finite
    /// or negative value is a malformed read.
    pub fn summarize(self, requested: &TallySpecification) -> Result<TallySummary, TransportError> {
        let bins = requested.detector.bin_count();
        if self.detector_spectrum.len() != bins {
            return Err(TransportError::MalformedTally(format!(
                "detector spectrum has {} bins, expected {}",
                self.detector_spectrum.len(),
                bins
            )));
        }
        if let Some(value) = self
            .detector_spectrum
            .iter()
            .find(|v| !v.is_finite() || **v < 0.0)
        {
            return Err(TransportError::MalformedTally(format!(
                "detector spectrum contains invalid flux {value}"
            )));
        }

        let [nx, ny, _] = requested.mesh.dimension;
        if self.mesh_flux.len() != nx || self.mesh_flux.iter().any(|row| row.len() != ny) {
            return Err(TransportError::MalformedTally(format!(
                "mesh flux is not {nx}x{ny}"
            )));
        }
        if self.mesh_flux.iter().flatten().any(|v| !v.is_finite()) {
            return Err(TransportError::MalformedTally(
                "mesh flux contains non-finite values".to_string(),
            ));
        }

        let total_flux = self.detector_spectrum.iter().sum();
        Ok(TallySummary {
            total_flux,
            spectrum: self.detector_spectrum,
            mesh: self.mesh_flux,
        })
    }
}
