//! Module containing the static vehicle configuration consumed by the simulation.

use validator::Validate;

use crate::battery::BatteryPack;
use crate::catalog::system_efficiency_for_voltage;
use crate::imports::*;

/// Fully resolved vehicle configuration. Catalog keys (`tyre_type`,
/// `transmission`, `motor_type`, `coolant_flow_class`, `regen_mode`) are looked up
/// by the stage that needs them, not at load time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Validate)]
pub struct VehicleConfig {
    #[serde(default)]
    pub name: String,
    /// Total vehicle mass including battery and payload, $kg$
    #[validate(range(min = 0))]
    pub mass_kg: f64,
    /// Frontal area, $m^2$
    #[validate(range(min = 0))]
    pub frontal_area_m2: f64,
    /// Aerodynamic drag coefficient
    #[validate(range(min = 0))]
    pub drag_coef: f64,
    /// Loaded tyre radius, $m$
    #[validate(range(min = 0))]
    pub wheel_radius_m: f64,
    /// Rolling resistance class, one of "Eco", "Standard", "Performance"
    pub tyre_type: String,
    /// Transmission catalog key
    pub transmission: String,
    /// Motor topology code
    pub motor_type: String,
    #[validate(range(min = 0, max = 1))]
    pub inverter_efficiency: f64,
    /// DC bus voltage, $V$
    #[validate(range(min = 0))]
    pub system_voltage_v: f64,
    /// Efficiency of the DC distribution system
    #[validate(range(min = 0, max = 1))]
    pub system_efficiency: f64,
    /// Auxiliary (HVAC) electrical load while moving, $kW$
    #[validate(range(min = 0))]
    pub aux_load_kw: f64,
    #[validate(range(min = 0, max = 1))]
    pub hvac_efficiency: f64,
    /// Coolant flow class catalog key, e.g. "0.20_kg_per_s"
    pub coolant_flow_class: String,
    /// Regen hardware catalog key; `None` disables energy recovery
    #[serde(default)]
    pub regen_mode: Option<String>,
    /// Usable battery energy, $kWh$
    #[validate(range(min = 0))]
    pub battery_capacity_kwh: f64,
    /// Max continuous battery current, $A$
    #[validate(range(min = 0))]
    pub battery_max_current_a: f64,
}

impl SerdeAPI for VehicleConfig {
    fn init(&mut self) -> anyhow::Result<()> {
        self.validate_inputs()
    }
}

impl VehicleConfig {
    /// Range validation followed by the consistency checks ranges cannot express
    pub fn validate_inputs(&self) -> anyhow::Result<()> {
        if let Err(e) = self.validate() {
            bail_config!("invalid vehicle config {:?}: {e}", self.name);
        }
        let positive = [
            ("mass_kg", self.mass_kg),
            ("wheel_radius_m", self.wheel_radius_m),
            ("inverter_efficiency", self.inverter_efficiency),
            ("system_voltage_v", self.system_voltage_v),
            ("system_efficiency", self.system_efficiency),
            ("hvac_efficiency", self.hvac_efficiency),
            ("battery_capacity_kwh", self.battery_capacity_kwh),
        ];
        for (field, value) in positive {
            if value <= 0.0 || !value.is_finite() {
                bail_config!(
                    "vehicle config {:?}: `{field}` must be positive and finite, got {value}",
                    self.name
                );
            }
        }
        Ok(())
    }

    /// Copies capacity and current limit from a resolved battery pack
    pub fn with_battery(mut self, pack: &BatteryPack) -> Self {
        self.battery_capacity_kwh = pack.energy_kwh;
        self.battery_max_current_a = pack.max_current_a;
        self
    }

    /// Sets the bus voltage and the matching distribution efficiency
    pub fn with_system_voltage(mut self, system_voltage_v: f64) -> anyhow::Result<Self> {
        self.system_efficiency = system_efficiency_for_voltage(system_voltage_v)?;
        self.system_voltage_v = system_voltage_v;
        Ok(self)
    }

    /// Compact hatchback on a 400 V bus
    pub fn mock_config() -> Self {
        Self {
            name: String::from("mock city EV"),
            mass_kg: 1200.0,
            frontal_area_m2: 2.2,
            drag_coef: 0.30,
            wheel_radius_m: 0.216,
            tyre_type: String::from("Standard"),
            transmission: String::from("eGearDrive"),
            motor_type: String::from("PMSM"),
            inverter_efficiency: 0.95,
            system_voltage_v: 400.0,
            system_efficiency: 0.85,
            aux_load_kw: 0.75,
            hvac_efficiency: 0.6,
            coolant_flow_class: String::from("0.20_kg_per_s"),
            regen_mode: Some(String::from("Full Hardware")),
            battery_capacity_kwh: 40.0,
            battery_max_current_a: 300.0,
        }
    }
}
