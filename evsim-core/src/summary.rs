//! Module containing read-only reports over a completed simulation: feasibility
//! signals and aggregate summary metrics. Neither truncates the simulated table.

use crate::catalog::CATALOG;
use crate::imports::*;
use crate::params::*;
use crate::simdrive::SimDrive;

/// First sample index at which each feasibility signal trips, if any
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Feasibility {
    /// State of charge reached zero
    pub soc_exhausted: Option<usize>,
    /// Motor torque demand above the motor's rated torque
    pub torque_over_limit: Option<usize>,
    /// Inverter DC current above the battery's max continuous current
    pub current_over_limit: Option<usize>,
    /// Phase voltage at or above the rough modulation limit $V_{dc} / \sqrt{3}$.
    /// Informational; does not count as a stop.
    pub phase_voltage_over_limit: Option<usize>,
}

impl SerdeAPI for Feasibility {}

impl Feasibility {
    /// Earliest sample at which playback would halt
    pub fn first_stop(&self) -> Option<usize> {
        [
            self.soc_exhausted,
            self.torque_over_limit,
            self.current_over_limit,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    pub fn is_feasible(&self) -> bool {
        self.first_stop().is_none()
    }
}

/// Aggregate metrics of a simulation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimDriveSummary {
    pub profile_name: String,
    pub config_name: String,
    /// Index of the last sample aggregated
    pub last_sample: usize,
    pub duration_s: f64,
    pub distance_km: f64,
    pub final_soc_pct: f64,
    /// Net energy drawn from the pack, $kWh$
    pub energy_used_kwh: f64,
    pub energy_recovered_kwh: f64,
    pub peak_motor_torque_nm: f64,
    pub peak_inverter_current_a: f64,
    pub peak_motor_net_temp_k: f64,
    /// Distance extrapolated to the usable SOC window; `None` when SOC did not drop
    pub estimated_range_km: Option<f64>,
}

impl SerdeAPI for SimDriveSummary {}

impl SimDrive {
    /// Scans the simulated table for feasibility signals against
    /// `max_battery_current_a`
    pub fn feasibility(&self, max_battery_current_a: f64) -> anyhow::Result<Feasibility> {
        ensure!(self.is_simulated(), "{}\nsimulation has not been run", format_dbg!());
        let motor = CATALOG.motor(&self.config.motor_type)?;
        let phase_voltage_limit_v = self.config.system_voltage_v / 3f64.sqrt();
        let feas = Feasibility {
            soc_exhausted: first_where(&self.soc_pct, |soc| soc <= 0.0),
            torque_over_limit: first_where(&self.motor_torque_nm, |t| t > motor.rated_torque_nm),
            current_over_limit: first_where(&self.inverter_current_a, |i| {
                i > max_battery_current_a
            }),
            phase_voltage_over_limit: first_where(&self.motor_voltage_v, |v| {
                v >= phase_voltage_limit_v
            }),
        };
        if let Some(i) = feas.first_stop() {
            log::info!("configuration infeasible from sample {i}: {feas:?}");
        }
        Ok(feas)
    }

    /// Feasibility against the configured battery current limit
    pub fn config_feasibility(&self) -> anyhow::Result<Feasibility> {
        self.feasibility(self.config.battery_max_current_a)
    }

    /// Aggregates samples `0..=until`, or the whole table when `until` is `None`
    pub fn summary(&self, until: Option<usize>) -> anyhow::Result<SimDriveSummary> {
        ensure!(self.is_simulated(), "{}\nsimulation has not been run", format_dbg!());
        let last = until.unwrap_or(self.len() - 1);
        ensure!(
            last < self.len(),
            "{}\nsample {last} is past the end of a {}-sample table",
            format_dbg!(),
            self.len()
        );
        let prefix = |arr: &Array1<f64>| -> Array1<f64> { arr.iter().take(last + 1).copied().collect() };

        let distance_km = self.distance_km[last];
        let final_soc_pct = self.soc_pct[last];
        let soc_drop_pct = INIT_SOC_PCT - final_soc_pct;
        let estimated_range_km = if soc_drop_pct > 0.0 {
            Some(distance_km / soc_drop_pct * RANGE_USABLE_SOC_PCT)
        } else {
            None
        };

        Ok(SimDriveSummary {
            profile_name: self.profile.name.clone(),
            config_name: self.config.name.clone(),
            last_sample: last,
            duration_s: self.profile.time_s[last] - self.profile.time_s[0],
            distance_km,
            final_soc_pct,
            energy_used_kwh: prefix(&self.energy_used_kwh).sum(),
            energy_recovered_kwh: prefix(&self.recovered_kwh).sum(),
            peak_motor_torque_nm: ndarrmax(&prefix(&self.motor_torque_nm)),
            peak_inverter_current_a: ndarrmax(&prefix(&self.inverter_current_a)),
            peak_motor_net_temp_k: ndarrmax(&prefix(&self.motor_net_temp_rise_k)),
            estimated_range_km,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::DrivingProfile;
    use crate::vehicle::VehicleConfig;

    fn simulated() -> SimDrive {
        SimDrive::simulate(&DrivingProfile::test_profile(), &VehicleConfig::mock_config()).unwrap()
    }

    #[test]
    fn test_cruise_is_feasible() {
        let feas = simulated().config_feasibility().unwrap();
        assert!(feas.is_feasible());
        assert_eq!(feas.soc_exhausted, None);
    }

    #[test]
    fn test_current_limit_trips() {
        let sd = simulated();
        let feas = sd.feasibility(0.0).unwrap();
        // sample 0 has zero acceleration but rolling and drag torque
        assert_eq!(feas.current_over_limit, Some(0));
        assert_eq!(feas.first_stop(), Some(0));
    }

    #[test]
    fn test_first_stop_is_earliest() {
        let feas = Feasibility {
            soc_exhausted: Some(9),
            torque_over_limit: Some(4),
            current_over_limit: None,
            phase_voltage_over_limit: Some(1),
        };
        assert_eq!(feas.first_stop(), Some(4));
    }

    #[test]
    fn test_summary() {
        let sd = simulated();
        let summary = sd.summary(None).unwrap();
        assert_eq!(summary.last_sample, 10);
        assert_eq!(summary.duration_s, 10.0);
        assert_eq!(summary.distance_km, sd.distance_km[10]);
        assert!(summary
            .energy_used_kwh
            .approx_eq(&sd.energy_used_kwh.sum(), 1e-12));
        assert_eq!(summary.energy_recovered_kwh, 0.0);
        let drop = 90.0 - summary.final_soc_pct;
        assert!(summary
            .estimated_range_km
            .approx_eq(&Some(summary.distance_km / drop * 85.0), 1e-12));
    }

    #[test]
    fn test_summary_prefix() {
        let sd = simulated();
        let summary = sd.summary(Some(3)).unwrap();
        assert_eq!(summary.last_sample, 3);
        assert_eq!(summary.final_soc_pct, sd.soc_pct[3]);
        assert!(sd.summary(Some(11)).is_err());
    }

    #[test]
    fn test_range_undefined_without_soc_drop() {
        let sd = simulated();
        assert_eq!(sd.summary(Some(0)).unwrap().estimated_range_km, None);
    }

    #[test]
    fn test_reports_require_simulation() {
        let sd = SimDrive::new(DrivingProfile::test_profile(), VehicleConfig::mock_config());
        assert!(sd.summary(None).is_err());
        assert!(sd.config_feasibility().is_err());
    }
}
