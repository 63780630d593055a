use super::configuration::Configuration;
use super::result::SimulationResult;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("Result for '{key}' has an invalid dose rate ({dose}); expected a finite, non-negative value")]
    InvalidDose { key: String, dose: f64 },
}

/// Results keyed by configuration, in insertion order.
///
/// Every stored result has a finite, non-negative dose rate. Inserting a result for
/// a key that is already present replaces it in place, keeping its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultStore {
    entries: Vec<(String, SimulationResult)>,
    index: HashMap<String, usize>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, result: SimulationResult) -> Result<(), StoreError> {
        let key = result.key();
        if !result.has_valid_dose() {
            return Err(StoreError::InvalidDose {
                key,
                dose: result.dose_rem_per_hr,
            });
        }

        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = result,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, result));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&SimulationResult> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    pub fn get_config(&self, configuration: &Configuration) -> Option<&SimulationResult> {
        self.get(&configuration.key())
    }

    /// Whether a configuration already has a usable result and can be skipped.
    pub fn is_complete(&self, configuration: &Configuration) -> bool {
        self.get_config(configuration).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SimulationResult)> {
        self.entries
            .iter()
            .map(|(key, result)| (key.as_str(), result))
    }

    pub fn results(&self) -> impl Iterator<Item = &SimulationResult> {
        self.entries.iter().map(|(_, result)| result)
    }
}

impl Serialize for ResultStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, result) in &self.entries {
            map.serialize_entry(key, result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResultStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(StoreVisitor)
    }
}

struct StoreVisitor;

impl<'de> Visitor<'de> for StoreVisitor {
    type Value = ResultStore;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map from configuration key to simulation result")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut store = ResultStore::new();
        // Records are decoded one at a time so a single bad entry does not take the
        // rest of the checkpoint with it.
        while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
            let result = match SimulationResult::deserialize(value) {
                Ok(result) => result,
                Err(e) => {
                    warn!("Skipping unreadable stored result '{}': {}", key, e);
                    continue;
                }
            };
            // The record's own fields are authoritative; keys written by other tools
            // may spell the same numbers differently.
            let canonical = result.key();
            if canonical != key {
                tracing::debug!(stored = %key, canonical = %canonical, "Re-keying stored result.");
            }
            if let Err(e) = store.insert(result) {
                warn!("Dropping stored result '{}': {}", key, e);
            }
        }
        Ok(store)
    }
}
