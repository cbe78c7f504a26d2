use std::path::PathBuf;
use std::process::Command;

use assert_cmd::prelude::{CommandCargoExt, OutputAssertExt};
use predicates::prelude::predicate;

fn resource(rel: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../evsim-core/resources")
        .join(rel)
        .canonicalize()
        .unwrap();
    assert!(path.exists());
    path
}

#[test]
fn test_that_cli_app_produces_result() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("evsim-cli")?;
    let profile_file = resource("profiles/urban_loop.csv");
    let config_file = resource("vehicles/city_ev.yaml");

    cmd.args([
        "--profile-file",
        profile_file.to_str().unwrap(),
        "--config-file",
        config_file.to_str().unwrap(),
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("estimated_range_km"))
        .stdout(predicate::str::contains("\"soc_exhausted\":null"));

    Ok(())
}

#[test]
fn test_that_cli_app_writes_table() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let out_file = dir.path().join("hill_descent_out.csv");
    let mut cmd = Command::cargo_bin("evsim-cli")?;
    cmd.args([
        "--profile-file",
        resource("profiles/hill_descent.csv").to_str().unwrap(),
        "--config-file",
        resource("vehicles/city_ev_srm.yaml").to_str().unwrap(),
        "--output",
        out_file.to_str().unwrap(),
    ]);
    cmd.assert().success();

    let table = std::fs::read_to_string(&out_file)?;
    let header = table.lines().next().unwrap();
    assert!(header.starts_with("time_s,velocity_kmh,elevation_m"));
    assert!(header.ends_with("soc_pct"));
    // header plus one line per sample
    assert_eq!(table.lines().count(), 66);

    Ok(())
}

#[test]
fn test_that_cli_app_falls_back_to_mock_config() -> Result<(), Box<dyn std::error::Error>> {
    let profile = r#"{"name":"inline","time_s":[0.0,1.0,2.0],"velocity_kmh":[0.0,10.0,20.0],"elevation_m":[0.0,0.0,0.0]}"#;
    let mut cmd = Command::cargo_bin("evsim-cli")?;
    cmd.args(["--profile", profile, "--until-stop"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"profile_name\":\"inline\""));

    Ok(())
}

#[test]
fn test_that_cli_app_rejects_unknown_motor() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("evsim-cli")?;
    let config_file = resource("vehicles/city_ev.yaml");
    let config = std::fs::read_to_string(config_file)?.replace("PMSM", "DCM");
    let dir = tempfile::tempdir()?;
    let bad_config = dir.path().join("bad.yaml");
    std::fs::write(&bad_config, config)?;

    cmd.args([
        "--profile-file",
        resource("profiles/urban_loop.csv").to_str().unwrap(),
        "--config-file",
        bad_config.to_str().unwrap(),
    ]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("DCM"));

    Ok(())
}

#[test]
fn test_that_cli_app_requires_profile() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("evsim-cli")?;
    cmd.assert().failure();
    Ok(())
}
