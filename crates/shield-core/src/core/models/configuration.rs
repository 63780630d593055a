use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum KeyError {
    #[error("Configuration key '{key}' must have exactly 4 '_'-separated fields, found {found}")]
    FieldCount { key: String, found: usize },

    #[error("Field '{field}' of configuration key '{key}' does not start with '{prefix}'")]
    MissingPrefix {
        key: String,
        field: String,
        prefix: &'static str,
    },

    #[error("Field '{field}' of configuration key '{key}' is not a number")]
    InvalidNumber { key: String, field: String },
}

/// One point of the parameter sweep.
///
/// Two configurations with the same four values are the same entity; [`key`]
/// is the identity used for lookup and resume.
///
/// [`key`]: Configuration::key
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(rename = "energy")]
    pub energy_mev: f64,
    #[serde(rename = "channel_diameter")]
    pub channel_diameter_cm: f64,
    #[serde(rename = "detector_distance")]
    pub detector_distance_cm: f64,
    #[serde(rename = "detector_angle")]
    pub detector_angle_deg: f64,
}

impl Configuration {
    pub fn new(
        energy_mev: f64,
        channel_diameter_cm: f64,
        detector_distance_cm: f64,
        detector_angle_deg: f64,
    ) -> Self {
        Self {
            energy_mev,
            channel_diameter_cm,
            detector_distance_cm,
            detector_angle_deg,
        }
    }

    /// Identity key, `E{energy}_D{diameter}_dist{distance}_ang{angle}`, with each
    /// value in shortest round-trip form and no padding.
    pub fn key(&self) -> String {
        format!(
            "E{}_D{}_dist{}_ang{}",
            self.energy_mev,
            self.channel_diameter_cm,
            self.detector_distance_cm,
            self.detector_angle_deg
        )
    }

    /// Decodes a key back into a configuration.
    ///
    /// Accepts any numeric spelling `f64` parses, so keys written as `E1.0_...`
    /// decode to the same configuration as `E1_...`.
    pub fn from_key(key: &str) -> Result<Self, KeyError> {
        let fields: Vec<&str> = key.split('_').collect();
        if fields.len() != 4 {
            return Err(KeyError::FieldCount {
                key: key.to_string(),
                found: fields.len(),
            });
        }

        let parse = |field: &str, prefix: &'static str| -> Result<f64, KeyError> {
            let value = field
                .strip_prefix(prefix)
                .ok_or_else(|| KeyError::MissingPrefix {
                    key: key.to_string(),
                    field: field.to_string(),
                    prefix,
                })?;
            value.parse::<f64>().map_err(|_| KeyError::InvalidNumber {
                key: key.to_string(),
                field: field.to_string(),
            })
        };

        Ok(Self {
            energy_mev: parse(fields[0], "E")?,
            channel_diameter_cm: parse(fields[1], "D")?,
            detector_distance_cm: parse(fields[2], "dist")?,
            detector_angle_deg: parse(fields[3], "ang")?,
        })
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Energy: {} MeV, Channel Diameter: {} cm, Distance: {} cm, Angle: {}°",
            self.energy_mev,
            self.channel_diameter_cm,
            self.detector_distance_cm,
            self.detector_angle_deg
        )
    }
}

impl FromStr for Configuration {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_unpadded_values() {
        let c = Configuration::new(0.1, 0.05, 30.0, 0.0);
        assert_eq!(c.key(), "E0.1_D0.05_dist30_ang0");
        let c = Configuration::new(5.0, 1.0, 150.0, 45.0);
        assert_eq!(c.key(), "E5_D1_dist150_ang45");
    }

    #[test]
    fn key_decodes_to_the_same_configuration() {
        let c = Configuration::new(0.5, 0.1, 60.0, 15.0);
        assert_eq!(Configuration::from_key(&c.key()).unwrap(), c);
    }

    #[test]
    fn float_spelled_keys_decode_and_recanonicalise() {
        let c: Configuration = "E1.0_D0.5_dist100_ang15".parse().unwrap();
        assert_eq!(c, Configuration::new(1.0, 0.5, 100.0, 15.0));
        assert_eq!(c.key(), "E1_D0.5_dist100_ang15");
    }

    #[test]
    fn decoding_rejects_wrong_field_count() {
        assert!(matches!(
            Configuration::from_key("E1_D0.5_dist100"),
            Err(KeyError::FieldCount { found: 3, .. })
        ));
    }

    #[test]
    fn decoding_rejects_missing_prefix() {
        assert!(matches!(
            Configuration::from_key("E1_X0.5_dist100_ang0"),
            Err(KeyError::MissingPrefix { prefix: "D", .. })
        ));
    }

    #[test]
    fn decoding_rejects_non_numeric_values() {
        assert!(matches!(
            Configuration::from_key("E1_D0.5_distfar_ang0"),
            Err(KeyError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn serialises_with_short_field_names() {
        let c = Configuration::new(1.0, 0.5, 30.0, 0.0);
        let json = serde_json::to_value(c).unwrap();
        assert_eq!(json["energy"], 1.0);
        assert_eq!(json["channel_diameter"], 0.5);
        assert_eq!(json["detector_distance"], 30.0);
        assert_eq!(json["detector_angle"], 0.0);
    }
}
