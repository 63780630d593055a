//! # Core Module
//!
//! Stateless building blocks of the dose sweep: physics, data models, the transport
//! boundary and file I/O. Nothing here keeps state between calls or touches the
//! process environment.
//!
//! ## Overview
//!
//! - **Dose estimation** ([`dose`]) - NCRP-38 flux-to-dose table, interpolating converter
//!   and the closed-form analytic estimate used when a transport run cannot be trusted
//! - **Geometry** ([`geometry`]) - Source, wall, channel and detector layout
//! - **Data models** ([`models`]) - Configurations and their keys, per-configuration
//!   results and the keyed result store
//! - **Transport boundary** ([`transport`]) - The model handed to a Monte Carlo engine,
//!   the engine trait and tally validation
//! - **File I/O** ([`io`]) - Atomic JSON checkpoints and CSV tables

pub mod dose;
pub mod geometry;
pub mod io;
pub mod models;
pub mod transport;
