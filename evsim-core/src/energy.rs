//! Module containing the energy stages: regenerative braking recovery and the state
//! of charge integrator.

use itertools::izip;

use crate::catalog::CATALOG;
use crate::imports::*;
use crate::params::*;
use crate::vehicle::VehicleConfig;

/// Energy returned to the pack at each sample, $kWh$. Braking is detected as a
/// drop in kinetic plus potential energy; the recovered share is capped by the
/// hardware power limit over the step. Zero everywhere when `config.regen_mode`
/// is `None`.
pub fn recovered_energy_kwh(
    config: &VehicleConfig,
    speed_mps: &Array1<f64>,
    elevation_m: &Array1<f64>,
    dt_s: &Array1<f64>,
    props: &PhysicalProperties,
) -> anyhow::Result<Array1<f64>> {
    log::debug!("regenerative braking stage");
    let regen = match &config.regen_mode {
        Some(mode) => CATALOG
            .regen(mode)
            .with_context(|| format!("resolving regen mode for {:?}", config.name))?,
        None => return Ok(Array1::zeros(speed_mps.len())),
    };
    if regen.max_recovery_w <= 0.0 {
        log::warn!("regen mode configured with zero recovery power; nothing is recovered");
    }

    let m = config.mass_kg;
    let d_ke_j = diff(&speed_mps.mapv(|v| v.powi(2))) * 0.5 * m;
    let d_pe_j = diff(elevation_m) * m * props.a_grav_mps2;

    Ok(izip!(d_ke_j.iter(), d_pe_j.iter(), dt_s.iter())
        .enumerate()
        .map(|(i, (d_ke, d_pe, dt))| {
            if i == 0 {
                return 0.0;
            }
            let raw_j = -(d_ke + d_pe).min(0.0);
            let cap_j = regen.max_recovery_w * dt;
            finite_or_zero(regen.efficiency * raw_j.min(cap_j) / J_PER_KWH)
        })
        .collect())
}

/// Net energy drawn and resulting state of charge
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SocTrace {
    /// Consumption minus recovery per step, $kWh$
    pub energy_used_kwh: Array1<f64>,
    /// State of charge, %, starting from [`INIT_SOC_PCT`] and floored at zero
    pub soc_pct: Array1<f64>,
}

impl SocTrace {
    pub fn new(
        config: &VehicleConfig,
        power_drawn_kw: &Array1<f64>,
        recovered_kwh: &Array1<f64>,
        dt_s: &Array1<f64>,
    ) -> anyhow::Result<Self> {
        log::debug!("state of charge stage");
        if config.battery_capacity_kwh <= 0.0 {
            bail_config!(
                "battery capacity must be positive, got {} kWh",
                config.battery_capacity_kwh
            );
        }
        let energy_used_kwh = power_drawn_kw * dt_s / S_PER_HR - recovered_kwh;
        let soc_drop_pct = &energy_used_kwh / config.battery_capacity_kwh * 100.0;
        // cumulative net energy only; no clamp against the initial SOC
        let soc_pct = ndarrcumsum(&soc_drop_pct).mapv(|drop| (INIT_SOC_PCT - drop).max(0.0));
        Ok(Self {
            energy_used_kwh,
            soc_pct,
        })
    }
}
