//! Module containing the kinematics stage: speed, acceleration, travelled distance,
//! and road slope derived from the raw profile columns.

use crate::imports::*;
use crate::params::*;
use crate::profile::DrivingProfile;

/// Kinematic columns derived from a [`DrivingProfile`]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Kinematics {
    /// speed [m/s]
    pub speed_mps: Array1<f64>,
    /// acceleration [m/s^2]; zero where the time step is not positive
    pub accel_mps2: Array1<f64>,
    /// cumulative trapezoidal distance [km]
    pub distance_km: Array1<f64>,
    /// road slope [rise/run], bounded by [`SLOPE_LIMIT`]
    pub slope: Array1<f64>,
}

impl Kinematics {
    pub fn from_profile(profile: &DrivingProfile) -> Self {
        log::debug!("kinematics stage: {} samples", profile.len());
        let speed_mps = profile.velocity_kmh.mapv(|v| v / KMH_PER_MPS);
        let dt_s = profile.dt_s();
        let accel_mps2 = acceleration(&speed_mps, &dt_s);
        let distance_km = trapz_distance_km(&speed_mps, &dt_s);
        let slope = slope(&profile.elevation_m, &speed_mps, &dt_s);

        if !is_non_decreasing(&distance_km) {
            log::warn!(
                "distance is not monotonic in profile {:?}; check for negative velocity",
                profile.name
            );
        }
        Self {
            speed_mps,
            accel_mps2,
            distance_km,
            slope,
        }
    }
}

/// $\frac{\Delta v}{\Delta t}$, zero on the first sample and wherever
/// $\Delta t \leq 0$
pub fn acceleration(speed_mps: &Array1<f64>, dt_s: &Array1<f64>) -> Array1<f64> {
    diff(speed_mps)
        .iter()
        .zip(dt_s.iter())
        .map(|(dv, dt)| if *dt > 0.0 { dv / dt } else { 0.0 })
        .collect()
}

/// Cumulative trapezoidal integration of speed over time, in km
pub fn trapz_distance_km(speed_mps: &Array1<f64>, dt_s: &Array1<f64>) -> Array1<f64> {
    let step_dist_m = step_means(speed_mps) * dt_s;
    ndarrcumsum(&step_dist_m) / M_PER_KM
}

/// Elevation change over horizontal step distance. The distance is floored at
/// [`MIN_DX_M`], the result clamped to [`SLOPE_LIMIT`], and any non-finite value
/// (including the first sample) resolves to zero.
pub fn slope(elevation_m: &Array1<f64>, speed_mps: &Array1<f64>, dt_s: &Array1<f64>) -> Array1<f64> {
    let dh = diff(elevation_m);
    let step_dist_m = step_means(speed_mps) * dt_s;
    dh.iter()
        .zip(step_dist_m.iter())
        .enumerate()
        .map(|(i, (dh, dx))| {
            if i == 0 {
                return 0.0;
            }
            let s = dh / dx.max(MIN_DX_M);
            finite_or_zero(s).clamp(-SLOPE_LIMIT, SLOPE_LIMIT)
        })
        .collect()
}
