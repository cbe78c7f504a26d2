//! Module containing the motor thermal stage: a per-sample forward-Euler balance of
//! motor losses against coolant heat removal. Temperature does not feed back into
//! motor efficiency.

use crate::catalog::{MotorSpec, CATALOG};
use crate::imports::*;
use crate::params::*;
use crate::vehicle::VehicleConfig;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ThermalTrace {
    /// Motor losses, $W$
    pub loss_w: Array1<f64>,
    /// Uncooled temperature rise over the step, $K$
    pub motor_temp_rise_k: Array1<f64>,
    /// Heat carried away by the coolant, $W$
    pub cooling_w: Array1<f64>,
    /// Net motor temperature trajectory, $K$
    pub motor_net_temp_rise_k: Array1<f64>,
}

impl ThermalTrace {
    pub fn new(
        config: &VehicleConfig,
        motor: &MotorSpec,
        power_drawn_kw: &Array1<f64>,
        motor_efficiency: &Array1<f64>,
        dt_s: &Array1<f64>,
    ) -> anyhow::Result<Self> {
        log::debug!("thermal stage");
        let coolant = CATALOG
            .coolant(&config.coolant_flow_class)
            .with_context(|| format!("resolving coolant flow class for {:?}", config.name))?;
        let heat_capacity_j_per_k = motor.mass_kg * motor.specific_heat_j_per_kg_k;
        ensure!(
            heat_capacity_j_per_k > 0.0,
            "{}",
            format_dbg!(heat_capacity_j_per_k)
        );
        let n = power_drawn_kw.len();

        let mut trace = Self {
            loss_w: Array1::zeros(n),
            motor_temp_rise_k: Array1::zeros(n),
            cooling_w: Array1::zeros(n),
            motor_net_temp_rise_k: Array1::zeros(n),
        };
        for i in 0..n {
            let loss_w = power_drawn_kw[i] * W_PER_KW * (1.0 - motor_efficiency[i]);
            let rise_k = loss_w * dt_s[i] / heat_capacity_j_per_k;
            let cooling_w = coolant.flow_kg_per_s * coolant.coolant_cp_j_per_kg_k * rise_k;
            trace.loss_w[i] = loss_w;
            trace.motor_temp_rise_k[i] = rise_k;
            trace.cooling_w[i] = cooling_w;
            trace.motor_net_temp_rise_k[i] = THERMAL_BASELINE_K
                + (loss_w - cooling_w) * dt_s[i] / heat_capacity_j_per_k * THERMAL_NET_SCALE;
        }
        Ok(trace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hand_computed_step() {
        let config = VehicleConfig::mock_config();
        let motor = CATALOG.motor("PMSM").unwrap();
        let trace = ThermalTrace::new(
            &config,
            motor,
            &array![10.0, 10.0],
            &array![0.9, 0.9],
            &array![0.0, 1.0],
        )
        .unwrap();
        // PMSM: 60 kg at 500 J/kg/K; coolant 0.2 kg/s at 3800 J/kg/K
        let mc = 60.0 * 500.0;
        let loss = 1000.0;
        let rise = loss / mc;
        let cool = 0.2 * 3800.0 * rise;
        assert!(trace.loss_w[1].approx_eq(&loss, 1e-9));
        assert!(trace.motor_temp_rise_k[1].approx_eq(&rise, 1e-12));
        assert!(trace.cooling_w[1].approx_eq(&cool, 1e-12));
        assert!(trace.motor_net_temp_rise_k[1]
            .approx_eq(&(300.0 + (loss - cool) / mc * 100.0), 1e-12));
    }

    #[test]
    fn test_first_sample_sits_at_baseline() {
        let config = VehicleConfig::mock_config();
        let motor = CATALOG.motor("IM").unwrap();
        let trace =
            ThermalTrace::new(&config, motor, &array![50.0], &array![0.85], &array![0.0]).unwrap();
        assert_eq!(trace.motor_temp_rise_k[0], 0.0);
        assert_eq!(trace.motor_net_temp_rise_k[0], THERMAL_BASELINE_K);
    }
}
