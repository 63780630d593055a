//! # Dose Module
//!
//! Conversion of photon flux into biological dose rate, and the closed-form estimate
//! used whenever a Monte Carlo tally is too weak to be trusted.
//!
//! ## Components
//!
//! - [`table`] - The NCRP-38 / ANS-6.1.1-1977 flux-to-dose conversion table
//! - [`conversion`] - Interpolated factor lookup and flux-to-dose conversion
//! - [`analytic`] - Geometric attenuation model producing a fallback dose rate
//!
//! All functions here are pure: they depend only on their arguments and the constant
//! conversion table, and never fail.

pub mod analytic;
pub mod conversion;
pub mod table;
