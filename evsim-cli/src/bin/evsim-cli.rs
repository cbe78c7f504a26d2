use clap::{ArgGroup, Parser};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

extern crate evsim_core;
use evsim_core::{
    profile::DrivingProfile,
    simdrive::SimDrive,
    summary::{Feasibility, SimDriveSummary},
    traits::SerdeAPI,
    vehicle::VehicleConfig,
};

/// Electric vehicle powertrain simulation over a recorded driving profile.
/// After running `cargo build --release`, run with
/// ```bash
/// ./target/release/evsim-cli --profile-file evsim-core/resources/profiles/urban_loop.csv --config-file evsim-core/resources/vehicles/city_ev.yaml --output urban_loop_out.csv
/// ```
/// Logging verbosity follows `RUST_LOG` (default `warn`).
#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(group(
    ArgGroup::new("driving-profile")
    .required(true)
    .args(&["profile", "profile-file"])
))]
#[clap(group(
    ArgGroup::new("vehicle")
    .args(&["config", "config-file"])
))]
struct EvSimApi {
    /// Driving profile as json string
    #[clap(long, value_parser)]
    profile: Option<String>,
    /// Path to driving profile file (csv, yaml, or json)
    #[clap(long, value_parser)]
    profile_file: Option<String>,
    /// Vehicle configuration as json string
    #[clap(long, value_parser)]
    config: Option<String>,
    /// Path to vehicle configuration file (yaml or json)
    #[clap(long, value_parser)]
    config_file: Option<String>,
    /// Path at which to write the simulated table (csv, yaml, or json)
    #[clap(long, value_parser)]
    output: Option<String>,
    /// Override of the battery's max continuous current, A
    #[clap(long, value_parser)]
    max_battery_current: Option<f64>,
    /// Aggregate the summary only up to the first feasibility stop
    #[clap(long, action)]
    until_stop: bool,
}

#[derive(Debug, Deserialize, Serialize)]
struct SimResults {
    summary: SimDriveSummary,
    feasibility: Feasibility,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // forwards the engine's `log` records through the default `tracing-log` bridge
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_profile(api: &EvSimApi) -> anyhow::Result<DrivingProfile> {
    match (&api.profile, &api.profile_file) {
        (Some(json), _) => DrivingProfile::from_json(json),
        (None, Some(path)) => {
            let is_csv = std::path::Path::new(path)
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"));
            if is_csv {
                DrivingProfile::from_csv_file(path)
            } else {
                DrivingProfile::from_file(path)
            }
        }
        (None, None) => anyhow::bail!("one of `--profile` or `--profile-file` is required"),
    }
}

fn load_config(api: &EvSimApi) -> anyhow::Result<VehicleConfig> {
    match (&api.config, &api.config_file) {
        (Some(json), _) => VehicleConfig::from_json(json),
        (None, Some(path)) => VehicleConfig::from_file(path),
        (None, None) => {
            log::warn!("no vehicle configuration given; using the mock configuration");
            Ok(VehicleConfig::mock_config())
        }
    }
}

pub fn main() -> anyhow::Result<()> {
    init_logging();
    let api = EvSimApi::parse();

    let profile = load_profile(&api)?;
    let config = load_config(&api)?;
    let sim_drive = SimDrive::simulate(&profile, &config)?;

    let feasibility =
        sim_drive.feasibility(api.max_battery_current.unwrap_or(config.battery_max_current_a))?;
    let until = if api.until_stop {
        feasibility.first_stop()
    } else {
        None
    };
    let summary = sim_drive.summary(until)?;

    if let Some(output) = &api.output {
        sim_drive.to_file(output)?;
        log::info!("wrote simulated table to {output}");
    }

    let res = SimResults {
        summary,
        feasibility,
    };
    println!("{}", serde_json::to_string(&res)?);
    Ok(())
}
