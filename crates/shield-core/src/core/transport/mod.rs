//! # Transport Module
//!
//! The boundary between this crate and the Monte Carlo particle-transport engine.
//!
//! - [`model`] - Geometry, materials, source, tallies and run settings for one configuration
//! - [`engine`] - The [`TransportEngine`](engine::TransportEngine) trait and its error type
//! - [`tally`] - Raw tally output and its validation into a summary
//! - [`process`] - An engine backed by an external executable
//!
//! Engines never change the working directory of this process: every call receives
//! the run directory it owns explicitly.

pub mod engine;
pub mod model;
pub mod process;
pub mod tally;
