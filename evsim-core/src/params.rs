//! Module containing physical constants and fixed engine parameters.

use crate::imports::*;

/// Unit conversions that should NEVER change
pub const KMH_PER_MPS: f64 = 3.6;
pub const M_PER_KM: f64 = 1_000.0;
pub const W_PER_KW: f64 = 1_000.0;
pub const S_PER_HR: f64 = 3_600.0;
pub const J_PER_KWH: f64 = 3_600_000.0;
pub const S_PER_MIN: f64 = 60.0;

/// State of charge every trajectory starts from, %
pub const INIT_SOC_PCT: f64 = 90.0;
/// Portion of the pack assumed usable when extrapolating range, %
pub const RANGE_USABLE_SOC_PCT: f64 = 85.0;
/// Magnitude limit for road slope, rise/run
pub const SLOPE_LIMIT: f64 = 0.2;
/// Floor on horizontal step distance used as the slope denominator, m
pub const MIN_DX_M: f64 = 1.0;
/// Additive baseline of the net motor temperature trajectory, K
pub const THERMAL_BASELINE_K: f64 = 300.0;
/// Scale applied to the loss-minus-cooling term of the net motor temperature.
/// Kept as a fixed calibration constant pending review.
pub const THERMAL_NET_SCALE: f64 = 100.0;

/// Struct containing physical properties used by the resistive force and regen stages
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PhysicalProperties {
    /// Air density, $\frac{kg}{m^3}$
    pub air_density_kg_per_m3: f64,
    /// Gravitational acceleration, $\frac{m}{s^2}$
    pub a_grav_mps2: f64,
}

impl Default for PhysicalProperties {
    fn default() -> Self {
        Self {
            air_density_kg_per_m3: 1.225,
            a_grav_mps2: 9.81,
        }
    }
}

impl SerdeAPI for PhysicalProperties {}
