//! Module containing the recorded driving profile: the time, target speed, and
//! elevation columns every simulation is driven over.

use itertools::Itertools;

use crate::imports::*;

/// One CSV row of a driving profile
#[derive(Default, PartialEq, Clone, Debug, Deserialize, Serialize)]
pub struct ProfileElement {
    /// time [s]
    #[serde(alias = "Time [s]")]
    pub time_s: f64,
    /// target speed [km/h]
    #[serde(alias = "Velocity [km/h]")]
    pub velocity_kmh: f64,
    /// elevation [m]
    #[serde(alias = "Elevation [m]")]
    pub elevation_m: f64,
}

/// Struct of arrays holding a driving profile
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DrivingProfile {
    /// profile name, parsed from the file stem when loaded with
    /// [`DrivingProfile::from_csv_file`]
    #[serde(default)]
    pub name: String,
    /// time [s]
    #[serde(alias = "Time [s]", with = "array_as_vec")]
    pub time_s: Array1<f64>,
    /// target speed [km/h]
    #[serde(alias = "Velocity [km/h]", with = "array_as_vec")]
    pub velocity_kmh: Array1<f64>,
    /// elevation [m]
    #[serde(alias = "Elevation [m]", with = "array_as_vec")]
    pub elevation_m: Array1<f64>,
}

impl SerdeAPI for DrivingProfile {
    const ACCEPTED_BYTE_FORMATS: &'static [&'static str] = &["yaml", "json", "csv"];
    const ACCEPTED_STR_FORMATS: &'static [&'static str] = &["yaml", "json", "csv"];

    fn init(&mut self) -> anyhow::Result<()> {
        self.init_checks()
    }

    fn to_writer<W: std::io::Write>(&self, wtr: W, format: &str) -> anyhow::Result<()> {
        match format.trim_start_matches('.').to_lowercase().as_str() {
            "yaml" | "yml" => serde_yaml::to_writer(wtr, self)?,
            "json" => serde_json::to_writer(wtr, self)?,
            "csv" => {
                let mut wtr = csv::Writer::from_writer(wtr);
                for i in 0..self.len() {
                    wtr.serialize(ProfileElement {
                        time_s: self.time_s[i],
                        velocity_kmh: self.velocity_kmh[i],
                        elevation_m: self.elevation_m[i],
                    })?;
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

    /// Note that using this method to instantiate a profile from CSV, rather
    /// than the `from_csv_str` method, sets the profile name to an empty string
    fn from_str<S: AsRef<str>>(contents: S, format: &str) -> anyhow::Result<Self> {
        Ok(
            match format.trim_start_matches('.').to_lowercase().as_str() {
                "yaml" | "yml" => Self::from_yaml(contents)?,
                "json" => Self::from_json(contents)?,
                "csv" => Self::from_reader(contents.as_ref().as_bytes(), "csv")?,
                _ => bail!(Error::SerdeError(format!(
                    "Unsupported format {format:?}, must be one of {:?}",
                    Self::ACCEPTED_STR_FORMATS
                ))),
            },
        )
    }

    fn from_reader<R: std::io::Read>(rdr: R, format: &str) -> anyhow::Result<Self> {
        let mut deserialized: Self = match format.trim_start_matches('.').to_lowercase().as_str() {
            "yaml" | "yml" => serde_yaml::from_reader(rdr)?,
            "json" => serde_json::from_reader(rdr)?,
            "csv" => {
                let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
                let elements = rdr
                    .deserialize()
                    .collect::<Result<Vec<ProfileElement>, _>>()
                    .with_context(|| format!("{}\nCould not parse profile rows", format_dbg!()))?;
                Self::from_elements(&elements)
            }
            _ => bail!(Error::SerdeError(format!(
                "Unsupported format {format:?}, must be one of {:?}",
                Self::ACCEPTED_BYTE_FORMATS
            ))),
        };
        deserialized.init()?;
        Ok(deserialized)
    }
}

impl DrivingProfile {
    /// Builds a profile from its columns and runs the load-time checks
    pub fn new(
        name: &str,
        time_s: Array1<f64>,
        velocity_kmh: Array1<f64>,
        elevation_m: Array1<f64>,
    ) -> anyhow::Result<Self> {
        let mut profile = Self {
            name: name.to_string(),
            time_s,
            velocity_kmh,
            elevation_m,
        };
        profile.init()?;
        Ok(profile)
    }

    fn from_elements(elements: &[ProfileElement]) -> Self {
        Self {
            name: String::new(),
            time_s: elements.iter().map(|e| e.time_s).collect(),
            velocity_kmh: elements.iter().map(|e| e.velocity_kmh).collect(),
            elevation_m: elements.iter().map(|e| e.elevation_m).collect(),
        }
    }

    /// Load-time checks; also run by [`crate::simdrive::SimDrive::sim_drive`] since
    /// the columns are public
    pub(crate) fn init_checks(&self) -> anyhow::Result<()> {
        if self.is_empty() {
            bail!(Error::ProfileError("profile has no samples".into()));
        }
        if !self.are_fields_equal_length() {
            bail!(Error::ProfileError(format!(
                "profile has unequal field lengths\ntime_s: {}\nvelocity_kmh: {}\nelevation_m: {}",
                self.time_s.len(),
                self.velocity_kmh.len(),
                self.elevation_m.len(),
            )));
        }
        let non_finite = self
            .time_s
            .iter()
            .chain(self.velocity_kmh.iter())
            .chain(self.elevation_m.iter())
            .any(|x| !x.is_finite());
        if non_finite {
            bail!(Error::ProfileError(
                "profile contains non-finite values".into()
            ));
        }
        if let Some(i) = self.first_time_reversal() {
            bail!(Error::ProfileError(format!(
                "time runs backwards at sample {i}: {} s -> {} s",
                self.time_s[i - 1],
                self.time_s[i]
            )));
        }
        if !self.is_strictly_increasing() {
            log::warn!(
                "profile {:?} has repeated timestamps; acceleration is zero at those samples",
                self.name
            );
        }
        if self.velocity_kmh.iter().any(|v| *v < 0.0) {
            log::warn!(
                "profile {:?} has negative velocity; distance will not be monotonic",
                self.name
            );
        }
        Ok(())
    }

    /// Load profile from CSV file, parsing name from filepath
    pub fn from_csv_file<P: AsRef<Path>>(filepath: P) -> anyhow::Result<Self> {
        let filepath = filepath.as_ref();
        let name = filepath
            .file_stem()
            .and_then(OsStr::to_str)
            .with_context(|| format!("Could not parse profile name from filepath: {filepath:?}"))?
            .to_string();
        let mut profile = Self::from_file(filepath)?;
        profile.name = name;
        Ok(profile)
    }

    /// Load profile from CSV string
    pub fn from_csv_str<S: AsRef<str>>(csv_str: S, name: String) -> anyhow::Result<Self> {
        let mut profile = Self::from_str(csv_str, "csv")?;
        profile.name = name;
        Ok(profile)
    }

    /// Write (serialize) profile to a CSV string
    pub fn to_csv(&self) -> anyhow::Result<String> {
        let mut buf = Vec::with_capacity(self.len());
        self.to_writer(&mut buf, "csv")?;
        Ok(String::from_utf8(buf)?)
    }

    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time step for each sample; zero for the first
    pub fn dt_s(&self) -> Array1<f64> {
        diff(&self.time_s)
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.time_s.iter().tuple_windows().all(|(prev, next)| prev < next)
    }

    fn first_time_reversal(&self) -> Option<usize> {
        self.time_s
            .iter()
            .tuple_windows()
            .position(|(prev, next)| next < prev)
            .map(|i| i + 1)
    }

    pub fn are_fields_equal_length(&self) -> bool {
        let len = self.len();
        [self.velocity_kmh.len(), self.elevation_m.len()]
            .iter()
            .all(|l| *l == len)
    }

    /// Flat 10 s profile at constant speed, 1 s resolution
    pub fn test_profile() -> Self {
        Self {
            name: String::from("test"),
            time_s: Array::range(0.0, 11.0, 1.0),
            velocity_kmh: Array::from_elem(11, 60.0),
            elevation_m: Array::zeros(11),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "time_s,velocity_kmh,elevation_m\n0,0,100\n1,10,100.5\n2,20,101\n";

    #[test]
    fn test_csv_load() {
        let profile = DrivingProfile::from_csv_str(CSV, "ramp".into()).unwrap();
        assert_eq!(profile.name, "ramp");
        assert_eq!(profile.len(), 3);
        assert_eq!(profile.velocity_kmh, array![0.0, 10.0, 20.0]);
        assert_eq!(profile.dt_s(), array![0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_csv_header_aliases() {
        let csv_str = "Time [s],Velocity [km/h],Elevation [m]\n0,0,5\n0.5,3.6,5\n";
        let profile = DrivingProfile::from_str(csv_str, "csv").unwrap();
        assert_eq!(profile.time_s, array![0.0, 0.5]);
        assert_eq!(profile.elevation_m, array![5.0, 5.0]);
        assert_eq!(profile.name, "");
    }

    #[test]
    fn test_csv_round_trip() {
        let profile = DrivingProfile::test_profile();
        let csv_str = profile.to_csv().unwrap();
        let mut reloaded = DrivingProfile::from_str(csv_str, "csv").unwrap();
        reloaded.name = profile.name.clone();
        assert_eq!(reloaded, profile);
    }

    #[test]
    fn test_empty_profile_rejected() {
        let err = DrivingProfile::from_str("time_s,velocity_kmh,elevation_m\n", "csv").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ProfileError(_))
        ));
    }

    #[test]
    fn test_time_reversal_rejected() {
        let err = DrivingProfile::new(
            "bad",
            array![0.0, 2.0, 1.0],
            array![0.0, 0.0, 0.0],
            array![0.0, 0.0, 0.0],
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ProfileError(_))
        ));
        assert!(err.to_string().contains("sample 2"));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        assert!(DrivingProfile::new("bad", array![0.0, 1.0], array![0.0], array![0.0, 0.0]).is_err());
    }

    #[test]
    fn test_repeated_timestamps_accepted() {
        let profile = DrivingProfile::new(
            "dup",
            array![0.0, 1.0, 1.0, 2.0],
            array![0.0, 5.0, 5.0, 6.0],
            array![0.0, 0.0, 1.0, 1.0],
        )
        .unwrap();
        assert!(!profile.is_strictly_increasing());
    }

    #[test]
    fn test_hand_written_json_and_yaml() {
        let json = r#"{"name":"inline","time_s":[0.0,1.0,2.0],"velocity_kmh":[0.0,10.0,20.0],"elevation_m":[0.0,0.0,0.5]}"#;
        let profile = DrivingProfile::from_json(json).unwrap();
        assert_eq!(profile.name, "inline");
        assert_eq!(profile.velocity_kmh, array![0.0, 10.0, 20.0]);

        let yaml = "time_s: [0, 1, 2]\nvelocity_kmh: [0, 10, 20]\nelevation_m: [0, 0, 0.5]\n";
        let from_yaml = DrivingProfile::from_yaml(yaml).unwrap();
        assert_eq!(from_yaml.name, "");
        assert_eq!(from_yaml.elevation_m, profile.elevation_m);
        assert!(profile.to_json().unwrap().contains(r#""time_s":[0.0,1.0,2.0]"#));

        let backwards = json.replace("[0.0,1.0,2.0]", "[0.0,2.0,1.0]");
        assert!(DrivingProfile::from_json(backwards).is_err());
    }

    #[test]
    fn test_unsupported_format() {
        let err = DrivingProfile::test_profile().to_str("bin").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::SerdeError(_))
        ));
    }
}
