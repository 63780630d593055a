//! # Workflows Module
//!
//! Top-level entry points that tie the [`core`](crate::core) and
//! [`engine`](crate::engine) layers together into complete procedures.
//!
//! - **Dose study** ([`study`]) - Checkpoint resume, the full parameter sweep, final
//!   results and the critical-configuration ranking
//! - **Reporting** ([`report`]) - CSV tables and the markdown summary written after a sweep

pub mod report;
pub mod study;
