//! # Core Models Module
//!
//! Data structures describing one sweep point and what was learned about it.
//!
//! ## Key Components
//!
//! - [`configuration`] - The `(energy, diameter, distance, angle)` tuple and its string key
//! - [`result`] - Per-configuration result, tagged by whether transport succeeded
//! - [`store`] - Insertion-ordered key → result mapping that backs checkpoints
//!
//! ## Usage
//!
//! ```ignore
//! use gammashield::core::models::{configuration::Configuration, store::ResultStore};
//!
//! let config = Configuration::new(1.0, 0.5, 30.0, 15.0);
//! assert_eq!(config.key(), "E1_D0.5_dist30_ang15");
//!
//! let store = ResultStore::new();
//! assert!(!store.is_complete(&config));
//! ```

pub mod configuration;
pub mod result;
pub mod store;
