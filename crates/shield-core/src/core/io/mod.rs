//! Provides persistence for result stores and the CSV tables written alongside them.
//!
//! Result stores are saved through the [`ResultFile`](traits::ResultFile) trait, whose
//! path-based writer replaces the target atomically. Tables are plain CSV.

pub mod results;
pub mod tables;
pub mod traits;
