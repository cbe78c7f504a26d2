//! Module containing the resistive force stage.

use crate::catalog::CATALOG;
use crate::imports::*;
use crate::kinematics::Kinematics;
use crate::params::PhysicalProperties;
use crate::vehicle::VehicleConfig;

/// Road load components, $N$
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ResistiveForces {
    /// Rolling resistance, constant over the profile
    pub rolling_n: f64,
    pub aero_n: Array1<f64>,
    pub gradient_n: Array1<f64>,
    pub inertial_n: Array1<f64>,
    /// Sum of rolling, aerodynamic, gradient, and inertial forces
    pub total_n: Array1<f64>,
}

impl ResistiveForces {
    pub fn new(
        config: &VehicleConfig,
        kin: &Kinematics,
        props: &PhysicalProperties,
    ) -> anyhow::Result<Self> {
        log::debug!("resistive force stage");
        let crr = CATALOG
            .rolling_resistance_coef(&config.tyre_type)
            .with_context(|| format!("resolving tyre for {:?}", config.name))?;
        let m = config.mass_kg;
        let g = props.a_grav_mps2;

        let rolling_n = crr * m * g;
        let aero_n = kin.speed_mps.mapv(|v| {
            0.5 * props.air_density_kg_per_m3 * config.frontal_area_m2 * config.drag_coef * v.powi(2)
        });
        let gradient_n = kin.slope.mapv(|s| m * g * s);
        let inertial_n = kin.accel_mps2.mapv(|a| m * a);
        let total_n = &aero_n + &gradient_n + &inertial_n + rolling_n;

        Ok(Self {
            rolling_n,
            aero_n,
            gradient_n,
            inertial_n,
            total_n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::DrivingProfile;

    #[test]
    fn test_cruise_is_rolling_plus_drag() {
        let config = VehicleConfig::mock_config();
        let kin = Kinematics::from_profile(&DrivingProfile::test_profile());
        let forces = ResistiveForces::new(&config, &kin, &PhysicalProperties::default()).unwrap();

        let v: f64 = 60.0 / 3.6;
        let expected = 0.010 * 1200.0 * 9.81 + 0.5 * 1.225 * 2.2 * 0.30 * v * v;
        assert!(forces.total_n.iter().all(|f| f.approx_eq(&expected, 1e-9)));
        assert!(ndarrallzeros(&forces.gradient_n));
    }

    #[test]
    fn test_gradient_and_inertia() {
        let config = VehicleConfig::mock_config();
        let kin = Kinematics {
            speed_mps: array![0.0, 0.0],
            accel_mps2: array![0.0, 1.5],
            distance_km: array![0.0, 0.0],
            slope: array![0.0, 0.1],
        };
        let forces = ResistiveForces::new(&config, &kin, &PhysicalProperties::default()).unwrap();
        assert!(forces.gradient_n[1].approx_eq(&(1200.0 * 9.81 * 0.1), 1e-12));
        assert!(forces.inertial_n[1].approx_eq(&1800.0, 1e-12));
        assert!(forces.total_n[1]
            .approx_eq(&(forces.rolling_n + 1200.0 * 9.81 * 0.1 + 1800.0), 1e-12));
    }

    #[test]
    fn test_unknown_tyre() {
        let mut config = VehicleConfig::mock_config();
        config.tyre_type = "Slick".into();
        let kin = Kinematics::from_profile(&DrivingProfile::test_profile());
        let err = ResistiveForces::new(&config, &kin, &PhysicalProperties::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ConfigurationError(_))
        ));
    }
}
