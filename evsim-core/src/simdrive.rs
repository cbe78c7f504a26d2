//! Module containing the simulation driver: runs every stage, in order, over a
//! [`DrivingProfile`] for a [`VehicleConfig`] and holds the augmented table.

use crate::catalog::CATALOG;
use crate::energy::{recovered_energy_kwh, SocTrace};
use crate::imports::*;
use crate::kinematics::Kinematics;
use crate::motor::electrical_outputs;
use crate::params::PhysicalProperties;
use crate::powertrain::{PowerDraw, TorqueSpeed};
use crate::profile::DrivingProfile;
use crate::resistance::ResistiveForces;
use crate::thermal::ThermalTrace;
use crate::vehicle::VehicleConfig;

/// One CSV row of simulation output
#[derive(Default, PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct SimOutputRow {
    pub time_s: f64,
    pub velocity_kmh: f64,
    pub elevation_m: f64,
    pub speed_mps: f64,
    pub accel_mps2: f64,
    pub distance_km: f64,
    pub slope: f64,
    pub force_total_n: f64,
    pub force_gradient_n: f64,
    pub motor_torque_nm: f64,
    pub motor_speed_rpm: f64,
    pub motor_efficiency: f64,
    pub power_drawn_kw: f64,
    pub motor_temp_rise_k: f64,
    pub motor_net_temp_rise_k: f64,
    pub motor_voltage_v: f64,
    pub motor_current_a: f64,
    pub inverter_current_a: f64,
    pub recovered_kwh: f64,
    pub energy_used_kwh: f64,
    pub soc_pct: f64,
}

/// Driving profile and vehicle configuration together with every derived column.
/// Output columns are empty until [`SimDrive::sim_drive`] succeeds.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SimDrive {
    pub profile: DrivingProfile,
    pub config: VehicleConfig,
    #[serde(default)]
    pub props: PhysicalProperties,

    // kinematics
    #[serde(default, with = "array_as_vec")]
    pub speed_mps: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub accel_mps2: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub distance_km: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub slope: Array1<f64>,

    // forces
    #[serde(default, with = "array_as_vec")]
    pub force_total_n: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub force_gradient_n: Array1<f64>,

    // drivetrain
    #[serde(default, with = "array_as_vec")]
    pub motor_torque_nm: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub motor_speed_rpm: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub motor_efficiency: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub power_drawn_kw: Array1<f64>,

    // thermal
    #[serde(default, with = "array_as_vec")]
    pub motor_temp_rise_k: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub motor_net_temp_rise_k: Array1<f64>,

    // electrical
    #[serde(default, with = "array_as_vec")]
    pub motor_voltage_v: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub motor_current_a: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub inverter_current_a: Array1<f64>,

    // energy
    #[serde(default, with = "array_as_vec")]
    pub recovered_kwh: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub energy_used_kwh: Array1<f64>,
    #[serde(default, with = "array_as_vec")]
    pub soc_pct: Array1<f64>,
}

impl SerdeAPI for SimDrive {
    /// Formats accepted for writing; csv cannot be read back
    const ACCEPTED_BYTE_FORMATS: &'static [&'static str] = &["yaml", "json", "csv"];
    const ACCEPTED_STR_FORMATS: &'static [&'static str] = &["yaml", "json", "csv"];

    fn init(&mut self) -> anyhow::Result<()> {
        self.profile.init()?;
        self.config.init()?;
        ensure!(
            self.is_simulated() || self.outputs_are_empty(),
            "{}\noutput columns do not match profile length {}",
            format_dbg!(),
            self.len()
        );
        Ok(())
    }

    /// CSV writes one [`SimOutputRow`] per sample; it is write-only.
    fn to_writer<W: std::io::Write>(&self, wtr: W, format: &str) -> anyhow::Result<()> {
        match format.trim_start_matches('.').to_lowercase().as_str() {
            "yaml" | "yml" => serde_yaml::to_writer(wtr, self)?,
            "json" => serde_json::to_writer(wtr, self)?,
            "csv" => {
                ensure!(
                    self.is_simulated(),
                    "{}\nsimulation has not been run",
                    format_dbg!()
                );
                let mut wtr = csv::Writer::from_writer(wtr);
                for i in 0..self.len() {
                    wtr.serialize(self.row(i))?;
                }
                wtr.flush()?
            }
            _ => bail!(Error::SerdeError(format!(
                "Unsupported format {format:?}, must be one of {:?}",
                Self::ACCEPTED_BYTE_FORMATS
            ))),
        }
        Ok(())
    }

    fn to_str(&self, format: &str) -> anyhow::Result<String> {
        Ok(
            match format.trim_start_matches('.').to_lowercase().as_str() {
                "yaml" | "yml" => self.to_yaml()?,
                "json" => self.to_json()?,
                "csv" => self.to_csv()?,
                _ => bail!(Error::SerdeError(format!(
                    "Unsupported format {format:?}, must be one of {:?}",
                    Self::ACCEPTED_STR_FORMATS
                ))),
            },
        )
    }

    fn from_str<S: AsRef<str>>(contents: S, format: &str) -> anyhow::Result<Self> {
        Self::from_reader(contents.as_ref().as_bytes(), format)
    }

    fn from_reader<R: std::io::Read>(rdr: R, format: &str) -> anyhow::Result<Self> {
        let mut deserialized: Self = match format.trim_start_matches('.').to_lowercase().as_str() {
            "yaml" | "yml" => serde_yaml::from_reader(rdr)?,
            "json" => serde_json::from_reader(rdr)?,
            "csv" => bail!(Error::SerdeError(
                "simulated tables are written to csv but cannot be read from it; use yaml or json"
                    .into()
            )),
            _ => bail!(Error::SerdeError(format!(
                "Unsupported format {format:?}, must be one of [\"yaml\", \"json\"]"
            ))),
        };
        deserialized.init()?;
        Ok(deserialized)
    }
}

impl SimDrive {
    pub fn new(profile: DrivingProfile, config: VehicleConfig) -> Self {
        Self::with_props(profile, config, PhysicalProperties::default())
    }

    pub fn with_props(profile: DrivingProfile, config: VehicleConfig, props: PhysicalProperties) -> Self {
        Self {
            profile,
            config,
            props,
            speed_mps: Array1::zeros(0),
            accel_mps2: Array1::zeros(0),
            distance_km: Array1::zeros(0),
            slope: Array1::zeros(0),
            force_total_n: Array1::zeros(0),
            force_gradient_n: Array1::zeros(0),
            motor_torque_nm: Array1::zeros(0),
            motor_speed_rpm: Array1::zeros(0),
            motor_efficiency: Array1::zeros(0),
            power_drawn_kw: Array1::zeros(0),
            motor_temp_rise_k: Array1::zeros(0),
            motor_net_temp_rise_k: Array1::zeros(0),
            motor_voltage_v: Array1::zeros(0),
            motor_current_a: Array1::zeros(0),
            inverter_current_a: Array1::zeros(0),
            recovered_kwh: Array1::zeros(0),
            energy_used_kwh: Array1::zeros(0),
            soc_pct: Array1::zeros(0),
        }
    }

    /// Runs the full pipeline and returns the populated table
    pub fn simulate(profile: &DrivingProfile, config: &VehicleConfig) -> anyhow::Result<Self> {
        let mut sd = Self::new(profile.clone(), config.clone());
        sd.sim_drive()?;
        Ok(sd)
    }

    /// Runs every stage in pipeline order. Outputs are only written once all stages
    /// succeed, so a failed run leaves `self` as it was.
    pub fn sim_drive(&mut self) -> anyhow::Result<()> {
        self.profile.init_checks()?;
        self.config.validate_inputs()?;
        let profile = &self.profile;
        let config = &self.config;
        log::info!(
            "simulating {:?} over profile {:?} ({} samples)",
            config.name,
            profile.name,
            profile.len()
        );
        let motor = CATALOG
            .motor(&config.motor_type)
            .with_context(|| format!("resolving motor for {:?}", config.name))?;
        let dt_s = profile.dt_s();

        let kin = Kinematics::from_profile(profile);
        let forces = ResistiveForces::new(config, &kin, &self.props)?;
        let torque_speed = TorqueSpeed::new(config, &forces.total_n, &kin.speed_mps)?;
        let power = PowerDraw::new(
            config,
            motor,
            &forces.total_n,
            &kin.speed_mps,
            &profile.velocity_kmh,
            &torque_speed,
        )?;
        let thermal = ThermalTrace::new(
            config,
            motor,
            &power.power_drawn_kw,
            &power.motor_efficiency,
            &dt_s,
        )?;
        log::debug!("electrical stage ({})", motor.code);
        let elec = electrical_outputs(
            motor,
            &torque_speed.motor_torque_nm,
            &torque_speed.motor_speed_rpm,
            config.system_voltage_v,
        )?;
        let recovered_kwh = recovered_energy_kwh(
            config,
            &kin.speed_mps,
            &profile.elevation_m,
            &dt_s,
            &self.props,
        )?;
        let soc = SocTrace::new(config, &power.power_drawn_kw, &recovered_kwh, &dt_s)?;

        self.speed_mps = kin.speed_mps;
        self.accel_mps2 = kin.accel_mps2;
        self.distance_km = kin.distance_km;
        self.slope = kin.slope;
        self.force_total_n = forces.total_n;
        self.force_gradient_n = forces.gradient_n;
        self.motor_torque_nm = torque_speed.motor_torque_nm;
        self.motor_speed_rpm = torque_speed.motor_speed_rpm;
        self.motor_efficiency = power.motor_efficiency;
        self.power_drawn_kw = power.power_drawn_kw;
        self.motor_temp_rise_k = thermal.motor_temp_rise_k;
        self.motor_net_temp_rise_k = thermal.motor_net_temp_rise_k;
        self.motor_voltage_v = elec.phase_voltage_v;
        self.motor_current_a = elec.phase_current_a;
        self.inverter_current_a = elec.dc_current_a;
        self.recovered_kwh = recovered_kwh;
        self.energy_used_kwh = soc.energy_used_kwh;
        self.soc_pct = soc.soc_pct;

        log::info!(
            "simulation complete: {:.3} km, final SOC {:.2} %",
            self.distance_km[self.len() - 1],
            self.soc_pct[self.len() - 1]
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.profile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn output_columns(&self) -> [&Array1<f64>; 18] {
        [
            &self.speed_mps,
            &self.accel_mps2,
            &self.distance_km,
            &self.slope,
            &self.force_total_n,
            &self.force_gradient_n,
            &self.motor_torque_nm,
            &self.motor_speed_rpm,
            &self.motor_efficiency,
            &self.power_drawn_kw,
            &self.motor_temp_rise_k,
            &self.motor_net_temp_rise_k,
            &self.motor_voltage_v,
            &self.motor_current_a,
            &self.inverter_current_a,
            &self.recovered_kwh,
            &self.energy_used_kwh,
            &self.soc_pct,
        ]
    }

    /// True once every output column covers the profile
    pub fn is_simulated(&self) -> bool {
        !self.is_empty() && self.output_columns().iter().all(|c| c.len() == self.len())
    }

    fn outputs_are_empty(&self) -> bool {
        self.output_columns().iter().all(|c| c.is_empty())
    }

    /// Output row `i`; panics if `i` is out of bounds or the simulation has not run
    pub fn row(&self, i: usize) -> SimOutputRow {
        SimOutputRow {
            time_s: self.profile.time_s[i],
            velocity_kmh: self.profile.velocity_kmh[i],
            elevation_m: self.profile.elevation_m[i],
            speed_mps: self.speed_mps[i],
            accel_mps2: self.accel_mps2[i],
            distance_km: self.distance_km[i],
            slope: self.slope[i],
            force_total_n: self.force_total_n[i],
            force_gradient_n: self.force_gradient_n[i],
            motor_torque_nm: self.motor_torque_nm[i],
            motor_speed_rpm: self.motor_speed_rpm[i],
            motor_efficiency: self.motor_efficiency[i],
            power_drawn_kw: self.power_drawn_kw[i],
            motor_temp_rise_k: self.motor_temp_rise_k[i],
            motor_net_temp_rise_k: self.motor_net_temp_rise_k[i],
            motor_voltage_v: self.motor_voltage_v[i],
            motor_current_a: self.motor_current_a[i],
            inverter_current_a: self.inverter_current_a[i],
            recovered_kwh: self.recovered_kwh[i],
            energy_used_kwh: self.energy_used_kwh[i],
            soc_pct: self.soc_pct[i],
        }
    }

    /// Write (serialize) the output table to a CSV string
    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut buf = Vec::with_capacity(self.len());
        self.to_writer(&mut buf, "csv")?;
        Ok(String::from_utf8(buf)?)
    }
}
