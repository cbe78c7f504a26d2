//! Module containing the drivetrain stages: tractive force to motor torque and
//! speed, and mechanical demand to battery-side electrical draw.

use std::f64::consts::PI;

use crate::catalog::{MotorSpec, CATALOG};
use crate::imports::*;
use crate::motor::motor_efficiency;
use crate::params::*;
use crate::vehicle::VehicleConfig;

/// Wheel and motor operating point; torque is not limited here
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct TorqueSpeed {
    pub wheel_torque_nm: Array1<f64>,
    pub motor_torque_nm: Array1<f64>,
    pub motor_speed_rpm: Array1<f64>,
}

impl TorqueSpeed {
    pub fn new(
        config: &VehicleConfig,
        force_total_n: &Array1<f64>,
        speed_mps: &Array1<f64>,
    ) -> anyhow::Result<Self> {
        log::debug!("torque/speed stage");
        let trans = CATALOG
            .transmission(&config.transmission)
            .with_context(|| format!("resolving transmission for {:?}", config.name))?;
        let r = config.wheel_radius_m;

        let wheel_torque_nm = force_total_n * r;
        let motor_torque_nm = &wheel_torque_nm / (trans.gear_ratio * trans.efficiency);
        let motor_speed_rpm = speed_mps.mapv(|v| v * S_PER_MIN / (2.0 * PI * r) * trans.gear_ratio);
        Ok(Self {
            wheel_torque_nm,
            motor_torque_nm,
            motor_speed_rpm,
        })
    }
}

/// Battery-side power demand
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PowerDraw {
    /// Tractive power at the wheels, $kW$
    pub mech_power_kw: Array1<f64>,
    /// Motor efficiency at each operating point
    pub motor_efficiency: Array1<f64>,
    /// HVAC and coolant pump load, zero while stationary, $kW$
    pub aux_power_kw: Array1<f64>,
    /// Electrical draw plus auxiliary load, $kW$
    pub power_drawn_kw: Array1<f64>,
}

impl PowerDraw {
    pub fn new(
        config: &VehicleConfig,
        motor: &MotorSpec,
        force_total_n: &Array1<f64>,
        speed_mps: &Array1<f64>,
        velocity_kmh: &Array1<f64>,
        torque_speed: &TorqueSpeed,
    ) -> anyhow::Result<Self> {
        log::debug!("power draw stage");
        let coolant = CATALOG
            .coolant(&config.coolant_flow_class)
            .with_context(|| format!("resolving coolant flow class for {:?}", config.name))?;

        let mech_power_kw = force_total_n * speed_mps / W_PER_KW;
        let motor_efficiency = motor_efficiency(
            motor,
            &torque_speed.motor_torque_nm,
            &torque_speed.motor_speed_rpm,
        )?;
        let elec_power_kw = mech_power_kw
            .iter()
            .zip(motor_efficiency.iter())
            .map(|(p, eta)| p / (eta * config.inverter_efficiency * config.system_efficiency))
            .collect::<Array1<f64>>();

        let moving_aux_kw = config.aux_load_kw / config.hvac_efficiency + coolant.pump_power_w / W_PER_KW;
        let aux_power_kw = velocity_kmh.mapv(|v| if v > 0.0 { moving_aux_kw } else { 0.0 });
        let power_drawn_kw = &elec_power_kw + &aux_power_kw;

        Ok(Self {
            mech_power_kw,
            motor_efficiency,
            aux_power_kw,
            power_drawn_kw,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torque_speed() {
        let config = VehicleConfig::mock_config();
        let ts = TorqueSpeed::new(&config, &array![1000.0, -500.0], &array![10.0, 0.0]).unwrap();
        // eGearDrive: ratio 5, efficiency 0.98
        assert!(ts.wheel_torque_nm[0].approx_eq(&216.0, 1e-12));
        assert!(ts.motor_torque_nm[0].approx_eq(&(216.0 / (5.0 * 0.98)), 1e-12));
        assert!(ts.motor_torque_nm[1] < 0.0);
        let rpm = 10.0 * 60.0 / (2.0 * PI * 0.216) * 5.0;
        assert!(ts.motor_speed_rpm[0].approx_eq(&rpm, 1e-12));
        assert_eq!(ts.motor_speed_rpm[1], 0.0);
    }

    #[test]
    fn test_unknown_transmission() {
        let mut config = VehicleConfig::mock_config();
        config.transmission = "CVT".into();
        assert!(TorqueSpeed::new(&config, &array![1.0], &array![1.0]).is_err());
    }

    #[test]
    fn test_power_draw_with_scalar_motor() {
        let config = VehicleConfig::mock_config();
        let mut motor = CATALOG.motor("PMSM").unwrap().clone();
        motor.efficiency_surface = None;
        let force = array![600.0, 600.0];
        let speed = array![0.0, 20.0];
        let velocity = speed.mapv(|v| v * 3.6);
        let ts = TorqueSpeed::new(&config, &force, &speed).unwrap();
        let pd = PowerDraw::new(&config, &motor, &force, &speed, &velocity, &ts).unwrap();

        assert_eq!(pd.power_drawn_kw[0], 0.0);
        let elec = 12.0 / (0.92 * 0.95 * 0.85);
        // heat pump 0.75 kW at 0.6 plus 400 W pump
        let aux = 0.75 / 0.6 + 0.4;
        assert!(pd.power_drawn_kw[1].approx_eq(&(elec + aux), 1e-12));
        assert_eq!(pd.motor_efficiency, array![0.92, 0.92]);
    }

    #[test]
    fn test_power_draw_prefers_surface() {
        let config = VehicleConfig::mock_config();
        let motor = CATALOG.motor("PMSM").unwrap();
        let force = array![600.0];
        let speed = array![20.0];
        let ts = TorqueSpeed::new(&config, &force, &speed).unwrap();
        let pd = PowerDraw::new(&config, motor, &force, &speed, &array![72.0], &ts).unwrap();
        let surface = motor.efficiency_surface.as_ref().unwrap();
        let eta = surface.eval(ts.motor_torque_nm[0], ts.motor_speed_rpm[0]);
        assert_eq!(pd.motor_efficiency[0], eta);
    }

    #[test]
    fn test_unknown_coolant_class() {
        let mut config = VehicleConfig::mock_config();
        config.coolant_flow_class = "1.00_kg_per_s".into();
        let motor = CATALOG.motor("PMSM").unwrap();
        let ts = TorqueSpeed::new(&config, &array![1.0], &array![1.0]).unwrap();
        let err = PowerDraw::new(&config, motor, &array![1.0], &array![1.0], &array![3.6], &ts)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ConfigurationError(_))
        ));
    }
}
