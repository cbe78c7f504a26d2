//! Module containing the battery pack builder used to derive a vehicle's battery
//! capacity and current limit from a cell chemistry and pack arrangement.

use crate::catalog::CATALOG;
use crate::imports::*;
use crate::params::W_PER_KW;

/// Resolved battery pack
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BatteryPack {
    /// Key into the cell chemistry catalog
    pub chemistry: String,
    pub cells_in_series: u32,
    pub cells_in_parallel: u32,
    /// Nominal pack voltage, $V$
    pub voltage_v: f64,
    /// Pack charge capacity, $Ah$
    pub capacity_ah: f64,
    /// Pack energy capacity, $kWh$
    pub energy_kwh: f64,
    /// Max continuous discharge current, $A$
    pub max_current_a: f64,
    /// Cell mass estimated from gravimetric energy density, $kg$
    pub mass_kg: f64,
}

impl SerdeAPI for BatteryPack {}

impl BatteryPack {
    /// Builds a pack of `total_cells` cells of `chemistry`, arranged in strings of
    /// `cells_in_series`
    pub fn from_cells(chemistry: &str, total_cells: u32, cells_in_series: u32) -> anyhow::Result<Self> {
        let cell = CATALOG.cell(chemistry)?;
        if cells_in_series == 0 || total_cells == 0 {
            bail_config!("battery pack needs at least one cell in series, got {total_cells} cells with {cells_in_series} in series");
        }
        if total_cells % cells_in_series != 0 {
            bail_config!(
                "total cells ({total_cells}) must be divisible by cells in series ({cells_in_series})"
            );
        }
        let cells_in_parallel = total_cells / cells_in_series;

        let cell_capacity_ah = cell.capacity_mah / 1000.0;
        let capacity_ah = cell_capacity_ah * cells_in_parallel as f64;
        let voltage_v = cell.voltage_v * cells_in_series as f64;
        let energy_wh = capacity_ah * voltage_v;
        Ok(Self {
            chemistry: chemistry.to_string(),
            cells_in_series,
            cells_in_parallel,
            voltage_v,
            capacity_ah,
            energy_kwh: energy_wh / W_PER_KW,
            max_current_a: cell_capacity_ah * cell.max_c_rate * cells_in_parallel as f64,
            mass_kg: energy_wh / cell.energy_density_wh_per_kg,
        })
    }

    /// Builds a pack specified directly by energy and voltage, as for chemistries
    /// sold at pack level
    pub fn from_energy(chemistry: &str, energy_kwh: f64, voltage_v: f64) -> anyhow::Result<Self> {
        let cell = CATALOG.cell(chemistry)?;
        if energy_kwh <= 0.0 || voltage_v <= 0.0 {
            bail_config!(
                "battery pack energy and voltage must be positive, got {energy_kwh} kWh at {voltage_v} V"
            );
        }
        let energy_wh = energy_kwh * W_PER_KW;
        let capacity_ah = energy_wh / voltage_v;
        Ok(Self {
            chemistry: chemistry.to_string(),
            cells_in_series: 1,
            cells_in_parallel: 1,
            voltage_v,
            capacity_ah,
            energy_kwh,
            max_current_a: capacity_ah * cell.max_c_rate,
            mass_kg: energy_wh / cell.energy_density_wh_per_kg,
        })
    }

    /// Whether the pack voltage lies in the window accepted for a DC bus of
    /// `bus_voltage_v`
    pub fn fits_bus_voltage(&self, bus_voltage_v: f64) -> bool {
        let (lo, hi) = if bus_voltage_v <= 400.0 {
            (300.0, 450.0)
        } else {
            (660.0, 820.0)
        };
        (lo..=hi).contains(&self.voltage_v)
    }
}
