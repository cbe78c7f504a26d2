//! Module containing the component catalog: process-wide, read-only data
//! tables for tyres, transmissions, motors, inverters, HVAC units, regen hardware,
//! coolant-flow classes, and battery cell chemistries.
//!
//! The tables are built once on first access and never mutated. Every lookup fails
//! with [`Error::ConfigurationError`] when the key is not in the table.

use std::collections::BTreeMap;

use lazy_static::lazy_static;

use crate::imports::*;
use crate::motor::{EfficiencySurface, MotorElectricalParameters};

/// Single-speed (or fixed-ratio) transmission
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TransmissionSpec {
    /// Construction, e.g. "Single-speed planetary"
    pub kind: String,
    /// Motor revolutions per wheel revolution
    pub gear_ratio: f64,
    pub efficiency: f64,
    pub max_torque_nm: f64,
}

/// Traction motor, keyed in the catalog by its topology code
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MotorSpec {
    /// Topology code, e.g. "PMSM", "SRM"
    pub code: String,
    /// Descriptive name
    pub name: String,
    /// Thermal mass of the machine, $kg$
    pub mass_kg: f64,
    pub power_kw: f64,
    /// Rated torque; demand above this is a feasibility violation, $Nm$
    pub rated_torque_nm: f64,
    /// Scalar efficiency used when no efficiency surface is registered
    pub efficiency: f64,
    /// Specific heat of the machine, $\frac{J}{kg \cdot K}$
    pub specific_heat_j_per_kg_k: f64,
    pub efficiency_surface: Option<EfficiencySurface>,
    pub electrical: MotorElectricalParameters,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InverterSpec {
    pub efficiency: f64,
    pub supports_400v: bool,
    pub supports_800v: bool,
}

impl InverterSpec {
    /// Whether this inverter can be paired with a DC bus of `bus_voltage_v`
    pub fn supports_voltage(&self, bus_voltage_v: f64) -> bool {
        if bus_voltage_v <= 400.0 {
            self.supports_400v
        } else {
            self.supports_800v
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HvacSpec {
    /// Rated electrical load, $kW$
    pub power_kw: f64,
    pub efficiency: f64,
}

/// Regenerative braking hardware
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RegenSpec {
    /// Fraction of capped braking energy returned to the pack
    pub efficiency: f64,
    /// Recovery power limit, $W$
    pub max_recovery_w: f64,
}

/// Motor coolant loop operating point
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CoolantSpec {
    pub flow_kg_per_s: f64,
    pub approx_l_per_min: f64,
    pub pump_power_w: f64,
    /// Coolant specific heat, $\frac{J}{kg \cdot K}$
    pub coolant_cp_j_per_kg_k: f64,
}

/// Battery cell chemistry
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CellSpec {
    pub capacity_mah: f64,
    pub voltage_v: f64,
    pub max_c_rate: f64,
    /// Gravimetric energy density, $\frac{Wh}{kg}$
    pub energy_density_wh_per_kg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub tyres: BTreeMap<&'static str, f64>,
    pub transmissions: BTreeMap<&'static str, TransmissionSpec>,
    pub motors: BTreeMap<&'static str, MotorSpec>,
    pub inverters: BTreeMap<&'static str, InverterSpec>,
    pub hvac: BTreeMap<&'static str, HvacSpec>,
    pub regen: BTreeMap<&'static str, RegenSpec>,
    pub coolant: BTreeMap<&'static str, CoolantSpec>,
    pub cells: BTreeMap<&'static str, CellSpec>,
}

lazy_static! {
    pub static ref CATALOG: Catalog = Catalog::build();
}

fn lookup<'a, T>(table: &'a BTreeMap<&'static str, T>, kind: &str, key: &str) -> anyhow::Result<&'a T> {
    match table.get(key) {
        Some(value) => Ok(value),
        None => bail_config!(
            "unknown {kind} {key:?}, must be one of {:?}",
            table.keys().collect::<Vec<_>>()
        ),
    }
}

impl Catalog {
    /// Rolling resistance coefficient for tyre class
    pub fn rolling_resistance_coef(&self, tyre_type: &str) -> anyhow::Result<f64> {
        lookup(&self.tyres, "tyre type", tyre_type).copied()
    }

    pub fn transmission(&self, name: &str) -> anyhow::Result<&TransmissionSpec> {
        lookup(&self.transmissions, "transmission", name)
    }

    pub fn motor(&self, code: &str) -> anyhow::Result<&MotorSpec> {
        lookup(&self.motors, "motor topology", code)
    }

    pub fn inverter(&self, name: &str) -> anyhow::Result<&InverterSpec> {
        lookup(&self.inverters, "inverter", name)
    }

    pub fn hvac(&self, name: &str) -> anyhow::Result<&HvacSpec> {
        lookup(&self.hvac, "HVAC unit", name)
    }

    pub fn regen(&self, mode: &str) -> anyhow::Result<&RegenSpec> {
        lookup(&self.regen, "regen mode", mode)
    }

    pub fn coolant(&self, flow_class: &str) -> anyhow::Result<&CoolantSpec> {
        lookup(&self.coolant, "coolant flow class", flow_class)
    }

    pub fn cell(&self, chemistry: &str) -> anyhow::Result<&CellSpec> {
        lookup(&self.cells, "battery chemistry", chemistry)
    }

    fn build() -> Self {
        let tyres = BTreeMap::from([("Eco", 0.008), ("Standard", 0.010), ("Performance", 0.014)]);

        let transmission = |kind: &str, gear_ratio, efficiency, max_torque_nm| TransmissionSpec {
            kind: kind.into(),
            gear_ratio,
            efficiency,
            max_torque_nm,
        };
        let transmissions = BTreeMap::from([
            ("eGearDrive", transmission("Single-speed reduction", 5.0, 0.98, 300.0)),
            ("Module-e-Drive", transmission("Single-speed integrated axle", 6.0, 0.98, 350.0)),
            ("Module-3 Gearbox", transmission("Single-speed planetary", 9.0, 0.97, 400.0)),
            ("Integrated e-Drive", transmission("Single-speed helical gear", 10.0, 0.98, 400.0)),
            ("2-Speed EV Transmission", transmission("2-speed", 8.0, 0.99, 450.0)),
        ]);

        let synchronous = MotorElectricalParameters::synchronous(0.05, 0.0002, 0.0002, 0.06, 4);
        let reluctance = MotorElectricalParameters::reluctance(0.05, 0.0001, 0.0010, 4);
        #[allow(clippy::too_many_arguments)]
        fn motor(
            code: &str,
            name: &str,
            mass_kg: f64,
            power_kw: f64,
            rated_torque_nm: f64,
            efficiency: f64,
            specific_heat_j_per_kg_k: f64,
            efficiency_surface: EfficiencySurface,
            electrical: MotorElectricalParameters,
        ) -> MotorSpec {
            MotorSpec {
                code: code.into(),
                name: name.into(),
                mass_kg,
                power_kw,
                rated_torque_nm,
                efficiency,
                specific_heat_j_per_kg_k,
                efficiency_surface: Some(efficiency_surface),
                electrical,
            }
        }
        let motors = BTreeMap::from([
            (
                "PMSM",
                motor(
                    "PMSM",
                    "Permanent Magnet Synchronous Motor",
                    60.0,
                    100.0,
                    150.0,
                    0.92,
                    500.0,
                    EfficiencySurface::new(0.94, 0.6, 160.0, 6000.0, 0.6, 0.55),
                    synchronous.clone(),
                ),
            ),
            (
                "IPM",
                motor(
                    "IPM",
                    "Interior Permanent Magnet Motor",
                    80.0,
                    200.0,
                    250.0,
                    0.93,
                    385.0,
                    EfficiencySurface::new(0.96, 0.62, 320.0, 6000.0, 0.55, 0.5),
                    synchronous.clone(),
                ),
            ),
            (
                "IM",
                motor(
                    "IM",
                    "Induction Motor",
                    70.0,
                    150.0,
                    200.0,
                    0.88,
                    600.0,
                    EfficiencySurface::new(0.90, 0.6, 200.0, 5000.0, 0.7, 0.6),
                    synchronous.clone(),
                ),
            ),
            (
                "SRM",
                motor(
                    "SRM",
                    "Switched Reluctance Motor",
                    60.0,
                    120.0,
                    250.0,
                    0.90,
                    400.0,
                    EfficiencySurface::new(0.88, 0.55, 200.0, 4000.0, 0.75, 0.7),
                    reluctance,
                ),
            ),
            (
                "BLDC",
                motor(
                    "BLDC",
                    "Brushless DC Motor",
                    50.0,
                    100.0,
                    150.0,
                    0.85,
                    400.0,
                    EfficiencySurface::new(0.92, 0.55, 30.0, 4000.0, 0.65, 0.6),
                    synchronous.clone(),
                ),
            ),
            (
                "AFPM",
                motor(
                    "AFPM",
                    "Axial Flux Permanent Magnet Motor",
                    90.0,
                    300.0,
                    350.0,
                    0.94,
                    500.0,
                    EfficiencySurface::new(0.97, 0.65, 450.0, 8000.0, 0.5, 0.45),
                    synchronous,
                ),
            ),
        ]);

        let inverter = |efficiency, supports_400v, supports_800v| InverterSpec {
            efficiency,
            supports_400v,
            supports_800v,
        };
        let inverters = BTreeMap::from([
            ("2-Level IGBT VSI", inverter(0.93, true, false)),
            ("2-Level MOSFET VSI (Silicon)", inverter(0.95, true, false)),
            ("2-Level NPC (IGBT or Si MOSFET)", inverter(0.98, true, true)),
            ("2-Level SiC MOSFET VSI", inverter(0.99, true, true)),
        ]);

        let hvac = BTreeMap::from([
            (
                "HVAC Resistive",
                HvacSpec {
                    power_kw: 1.0,
                    efficiency: 0.4,
                },
            ),
            (
                "HVAC Heatpump",
                HvacSpec {
                    power_kw: 0.75,
                    efficiency: 0.6,
                },
            ),
        ]);

        let regen = BTreeMap::from([
            (
                "Full Hardware",
                RegenSpec {
                    efficiency: 0.2,
                    max_recovery_w: 40_000.0,
                },
            ),
            (
                "Software Only",
                RegenSpec {
                    efficiency: 0.1,
                    max_recovery_w: 20_000.0,
                },
            ),
        ]);

        let coolant = |flow_kg_per_s, approx_l_per_min, pump_power_w| CoolantSpec {
            flow_kg_per_s,
            approx_l_per_min,
            pump_power_w,
            // water-glycol mix
            coolant_cp_j_per_kg_k: 3800.0,
        };
        let coolant = BTreeMap::from([
            ("0.10_kg_per_s", coolant(0.10, 6.0, 200.0)),
            ("0.20_kg_per_s", coolant(0.20, 12.0, 400.0)),
            ("0.40_kg_per_s", coolant(0.40, 24.0, 800.0)),
            ("0.80_kg_per_s", coolant(0.80, 48.0, 1200.0)),
        ]);

        let cell = |capacity_mah, voltage_v, max_c_rate, energy_density_wh_per_kg| CellSpec {
            capacity_mah,
            voltage_v,
            max_c_rate,
            energy_density_wh_per_kg,
        };
        let cells = BTreeMap::from([
            ("Li-ion (NMC)", cell(3600.0, 3.6, 3.0, 200.0)),
            ("Li-ion (NCA)", cell(3200.0, 3.6, 5.0, 220.0)),
            ("Li-ion (LFP)", cell(3600.0, 3.2, 6.0, 150.0)),
            ("LTO", cell(1500.0, 2.4, 10.0, 70.0)),
            ("Solid-State", cell(4500.0, 3.8, 3.0, 300.0)),
        ]);

        Self {
            tyres,
            transmissions,
            motors,
            inverters,
            hvac,
            regen,
            coolant,
            cells,
        }
    }
}

/// Efficiency of the DC distribution system for a given bus voltage
pub fn system_efficiency_for_voltage(bus_voltage_v: f64) -> anyhow::Result<f64> {
    if bus_voltage_v == 400.0 {
        Ok(0.85)
    } else if bus_voltage_v == 800.0 {
        Ok(0.90)
    } else {
        bail_config!("unsupported system voltage {bus_voltage_v} V, must be 400 or 800")
    }
}
