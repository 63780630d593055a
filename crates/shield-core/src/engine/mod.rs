//! # Engine Module
//!
//! The stateful part of a dose study: it owns the result store while the sweep runs,
//! drives each configuration through the transport engine and decides which dose to
//! keep.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - The immutable sweep configuration and its builder
//! - **Single runs** ([`runner`]) - One configuration from model to dose, falling back
//!   to the analytic estimate whenever the transport run cannot be used
//! - **Run directories** ([`workdir`]) - Scoped ownership of a configuration's directory
//! - **Sweeps** ([`sweep`]) - Grid enumeration, resume, checkpointing and interrupts
//! - **Ranking** ([`ranking`]) - Critical configurations by dose rate
//! - **Progress Monitoring** ([`progress`]) - Progress events and remaining-time estimates
//! - **Error Handling** ([`error`]) - Errors that can end a sweep

pub mod config;
pub mod error;
pub mod progress;
pub mod ranking;
pub mod runner;
pub mod sweep;
#[cfg(test)]
pub(crate) mod testing;
pub mod workdir;
