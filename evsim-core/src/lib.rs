//! Crate containing the powertrain simulation engine for electric vehicles driven over a
//! recorded driving profile (time, target speed, elevation).
//!
//! The engine is a single forward pass of stages:
//! kinematics -> resistive forces -> torque/speed -> power draw -> thermal ->
//! electrical -> regenerative braking -> state of charge.
//! # Features:
//! - resources: bundle the files in `resources/` into the compiled crate

#[macro_use]
pub mod macros;

pub mod battery;
pub mod catalog;
pub mod energy;
pub mod error;
pub mod imports;
pub mod kinematics;
pub mod motor;
pub mod params;
pub mod powertrain;
pub mod profile;
pub mod resistance;
#[cfg(feature = "resources")]
pub mod resources;
pub mod simdrive;
pub mod summary;
pub mod thermal;
pub mod traits;
pub mod utils;
pub mod vehicle;

pub use anyhow;
pub use error::Error;
