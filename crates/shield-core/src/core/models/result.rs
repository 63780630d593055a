use super::configuration::Configuration;
use crate::core::dose::conversion::DoseConverter;
use serde::{Deserialize, Serialize};

/// How the reported dose rate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseMethod {
    /// Tallied flux multiplied by the flux-to-dose factor.
    MonteCarlo,
    /// Closed-form estimate from the analytic model.
    Analytic,
}

/// Tallies read back from a completed transport run.
#[derive(Debug, Clone, PartialEq)]
pub struct TallySummary {
    pub total_flux: f64,
    pub spectrum: Vec<f64>,
    pub mesh: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The transport run completed and its tallies were read. The dose may still
    /// come from the analytic model when the tallied signal was too weak.
    MonteCarlo {
        tallies: TallySummary,
        dose_method: DoseMethod,
    },
    /// The transport run failed; only the analytic dose is available.
    Fallback,
}

/// Result for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ResultRecord", into = "ResultRecord")]
pub struct SimulationResult {
    pub configuration: Configuration,
    pub detector_x: f64,
    pub detector_y: f64,
    pub dose_rem_per_hr: f64,
    pub outcome: RunOutcome,
}

impl SimulationResult {
    pub fn key(&self) -> String {
        self.configuration.key()
    }

    pub fn dose_method(&self) -> DoseMethod {
        match &self.outcome {
            RunOutcome::MonteCarlo { dose_method, .. } => *dose_method,
            RunOutcome::Fallback => DoseMethod::Analytic,
        }
    }

    pub fn tallies(&self) -> Option<&TallySummary> {
        match &self.outcome {
            RunOutcome::MonteCarlo { tallies, .. } => Some(tallies),
            RunOutcome::Fallback => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, RunOutcome::Fallback)
    }

    pub fn has_valid_dose(&self) -> bool {
        self.dose_rem_per_hr.is_finite() && self.dose_rem_per_hr >= 0.0
    }
}

/// On-disk shape of a result: the tally fields are present only for completed
/// transport runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResultRecord {
    #[serde(flatten)]
    configuration: Configuration,
    detector_x: f64,
    detector_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_flux: Option<f64>,
    dose_rem_per_hr: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dose_method: Option<DoseMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    spectrum: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mesh_result: Option<Vec<Vec<f64>>>,
}

impl From<SimulationResult> for ResultRecord {
    fn from(result: SimulationResult) -> Self {
        let dose_method = Some(result.dose_method());
        let (total_flux, spectrum, mesh_result) = match result.outcome {
            RunOutcome::MonteCarlo { tallies, .. } => (
                Some(tallies.total_flux),
                Some(tallies.spectrum),
                Some(tallies.mesh),
            ),
            RunOutcome::Fallback => (None, None, None),
        };
        Self {
            configuration: result.configuration,
            detector_x: result.detector_x,
            detector_y: result.detector_y,
            total_flux,
            dose_rem_per_hr: result.dose_rem_per_hr,
            dose_method,
            spectrum,
            mesh_result,
        }
    }
}

impl TryFrom<ResultRecord> for SimulationResult {
    type Error = String;

    fn try_from(record: ResultRecord) -> Result<Self, Self::Error> {
        let outcome = match (record.total_flux, record.spectrum, record.mesh_result) {
            (Some(total_flux), Some(spectrum), Some(mesh)) => {
                // Records written without a method are classified by whether the
                // stored dose is the tallied one.
                let dose_method = record.dose_method.unwrap_or_else(|| {
                    let tallied = DoseConverter::ncrp_38()
                        .dose_from_flux(record.configuration.energy_mev, total_flux);
                    let tolerance = 1e-9 * tallied.abs().max(f64::MIN_POSITIVE);
                    if (tallied - record.dose_rem_per_hr).abs() <= tolerance {
                        DoseMethod::MonteCarlo
                    } else {
                        DoseMethod::Analytic
                    }
                });
                RunOutcome::MonteCarlo {
                    tallies: TallySummary {
                        total_flux,
                        spectrum,
                        mesh,
                    },
                    dose_method,
                }
            }
            (None, None, None) => RunOutcome::Fallback,
            _ => {
                return Err(format!(
                    "result for {} has an incomplete set of tally fields",
                    record.configuration.key()
                ));
            }
        };

        Ok(Self {
            configuration: record.configuration,
            detector_x: record.detector_x,
            detector_y: record.detector_y,
            dose_rem_per_hr: record.dose_rem_per_hr,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn monte_carlo_result() -> SimulationResult {
        SimulationResult {
            configuration: Configuration::new(1.0, 0.5, 30.0, 0.0),
            detector_x: 273.84,
            detector_y: 0.0,
            dose_rem_per_hr: 2.0 * 1.98e-6,
            outcome: RunOutcome::MonteCarlo {
                tallies: TallySummary {
                    total_flux: 2.0,
                    spectrum: vec![1.5, 0.5],
                    mesh: vec![vec![0.0, 1.0], vec![2.0, 3.0]],
                },
                dose_method: DoseMethod::MonteCarlo,
            },
        }
    }

    #[test]
    fn fallback_result_omits_tally_fields() {
        let result = SimulationResult {
            configuration: Configuration::new(0.1, 0.05, 100.0, 45.0),
            detector_x: 314.55,
            detector_y: 70.71,
            dose_rem_per_hr: 1.3e-8,
            outcome: RunOutcome::Fallback,
        };
        let value = serde_json::to_value(&result).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("total_flux"));
        assert!(!object.contains_key("spectrum"));
        assert!(!object.contains_key("mesh_result"));
        assert_eq!(object["dose_rem_per_hr"], 1.3e-8);
        assert_eq!(object["energy"], 0.1);
        assert_eq!(object["dose_method"], "analytic");
    }

    #[test]
    fn monte_carlo_result_carries_tallies_under_their_field_names() {
        let value = serde_json::to_value(monte_carlo_result()).unwrap();
        assert_eq!(value["total_flux"], 2.0);
        assert_eq!(value["spectrum"], json!([1.5, 0.5]));
        assert_eq!(value["mesh_result"], json!([[0.0, 1.0], [2.0, 3.0]]));
        assert_eq!(value["dose_method"], "monte_carlo");
    }

    #[test]
    fn legacy_record_without_method_is_classified_from_its_dose() {
        let tallied = json!({
            "energy": 1.0, "channel_diameter": 0.5, "detector_distance": 30,
            "detector_angle": 0, "detector_x": 273.84, "detector_y": 0.0,
            "total_flux": 2.0, "dose_rem_per_hr": 2.0 * 1.98e-6,
            "spectrum": [2.0], "mesh_result": [[0.0]]
        });
        let result: SimulationResult = serde_json::from_value(tallied).unwrap();
        assert_eq!(result.dose_method(), DoseMethod::MonteCarlo);

        let replaced = json!({
            "energy": 1.0, "channel_diameter": 0.5, "detector_distance": 30,
            "detector_angle": 0, "detector_x": 273.84, "detector_y": 0.0,
            "total_flux": 1e-9, "dose_rem_per_hr": 4.2e-3,
            "spectrum": [1e-9], "mesh_result": [[0.0]]
        });
        let result: SimulationResult = serde_json::from_value(replaced).unwrap();
        assert_eq!(result.dose_method(), DoseMethod::Analytic);
        assert!(!result.is_fallback());
    }

    #[test]
    fn partial_tally_fields_are_rejected() {
        let broken = json!({
            "energy": 1.0, "channel_diameter": 0.5, "detector_distance": 30,
            "detector_angle": 0, "detector_x": 273.84, "detector_y": 0.0,
            "total_flux": 2.0, "dose_rem_per_hr": 1.0
        });
        assert!(serde_json::from_value::<SimulationResult>(broken).is_err());
    }

    #[test]
    fn validity_requires_finite_non_negative_dose() {
        let mut result = monte_carlo_result();
        assert!(result.has_valid_dose());
        result.dose_rem_per_hr = f64::NAN;
        assert!(!result.has_valid_dose());
        result.dose_rem_per_hr = -1.0;
        assert!(!result.has_valid_dose());
    }
}
