//! # Gammashield Core Library
//!
//! Parametric study of gamma-ray dose streaming through a cylindrical air channel in a
//! concrete shielding wall. Each configuration of source energy, channel diameter,
//! detector distance and detector angle is handed to a Monte Carlo transport engine;
//! the tallied flux is converted to a dose rate with the NCRP-38 factors, and an analytic
//! streaming estimate takes over whenever the transport run fails or its statistics are
//! too weak to trust.
//!
//! ## Architectural Philosophy
//!
//! The library is split into three layers:
//!
//! - **[`core`]: The Foundation.** Stateless physics (`dose`, `geometry`), data models
//!   (`Configuration`, `SimulationResult`, `ResultStore`), the transport boundary and I/O.
//!
//! - **[`engine`]: The Logic Core.** The stateful sweep: per-configuration runs with their
//!   fallback rules, scoped run directories, checkpointing, interrupts and progress.
//!
//! - **[`workflows`]: The Public API.** `study::run` executes a complete, resumable study
//!   and writes its report artifacts.

pub mod core;
pub mod engine;
pub mod workflows;
