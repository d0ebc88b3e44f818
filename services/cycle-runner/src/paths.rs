//! Cycle time arithmetic and the experiment directory layout.
//!
//! ```text
//! <home>/<expid>/<YYYYMMDD>/<HH>/
//!     obs/        observations for the window
//!     ges/        background (first guess)
//!     analysis/   analysis and the forecast started from it
//!     diag/       diagnostics (GeoVaLs)
//! ```

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable holding the experiment root.
pub const HOME_ENV: &str = "AIESDA_HOME";

/// Assimilation cycles run four times a day.
pub const CYCLE_HOURS: [u32; 4] = [0, 6, 12, 18];

pub const CYCLE_INTERVAL_HOURS: i64 = 6;

/// Half-width of the observation window around the cycle time.
pub const OBS_HALF_WINDOW_HOURS: i64 = 3;

/// Valid time of one assimilation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CycleTime(NaiveDateTime);

impl CycleTime {
    /// Parse a `YYYYMMDD` date and an `HH` cycle hour (00, 06, 12 or 18).
    pub fn parse(date: &str, cycle: &str) -> Result<Self> {
        let day = NaiveDate::parse_from_str(date, "%Y%m%d")
            .with_context(|| format!("Invalid date '{}', expected YYYYMMDD", date))?;
        let hour: u32 = cycle
            .trim()
            .parse()
            .with_context(|| format!("Invalid cycle '{}', expected HH", cycle))?;
        anyhow::ensure!(
            CYCLE_HOURS.contains(&hour),
            "Invalid cycle hour {}. Must be one of: {:?}",
            hour,
            CYCLE_HOURS
        );
        let time = day
            .and_hms_opt(hour, 0, 0)
            .with_context(|| format!("Invalid cycle time {} {}", date, cycle))?;
        Ok(Self(time))
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }

    /// `YYYYMMDD`
    pub fn date_str(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// `HH`
    pub fn cycle_str(&self) -> String {
        self.0.format("%H").to_string()
    }

    /// The cycle six hours earlier.
    pub fn previous(&self) -> Self {
        Self(self.0 - Duration::hours(CYCLE_INTERVAL_HOURS))
    }

    pub fn next(&self) -> Self {
        Self(self.0 + Duration::hours(CYCLE_INTERVAL_HOURS))
    }

    /// Observation window `[t - h, t + h]`.
    pub fn obs_window(&self, half_width_hours: i64) -> (NaiveDateTime, NaiveDateTime) {
        let half = Duration::hours(half_width_hours);
        (self.0 - half, self.0 + half)
    }
}

impl fmt::Display for CycleTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}Z", self.date_str(), self.cycle_str())
    }
}

/// Experiment root from `AIESDA_HOME`, defaulting to the current directory.
pub fn home_from_env() -> PathBuf {
    std::env::var_os(HOME_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./"))
}

/// Directories and file names of one cycle.
#[derive(Debug, Clone)]
pub struct CyclePaths {
    pub home: PathBuf,
    pub expid: String,
    pub time: CycleTime,
    pub work_dir: PathBuf,
    pub obs_dir: PathBuf,
    pub ges_dir: PathBuf,
    pub analysis_dir: PathBuf,
    pub diag_dir: PathBuf,
}

impl CyclePaths {
    pub fn new(home: impl Into<PathBuf>, expid: &str, time: CycleTime) -> Self {
        let home = home.into();
        let work_dir = home.join(expid).join(time.date_str()).join(time.cycle_str());
        Self {
            obs_dir: work_dir.join("obs"),
            ges_dir: work_dir.join("ges"),
            analysis_dir: work_dir.join("analysis"),
            diag_dir: work_dir.join("diag"),
            work_dir,
            home,
            expid: expid.to_string(),
            time,
        }
    }

    /// Create every cycle directory. Safe to call repeatedly.
    pub fn create_dirs(&self) -> Result<()> {
        for dir in [&self.obs_dir, &self.ges_dir, &self.analysis_dir, &self.diag_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create cycle directory {:?}", dir))?;
        }
        debug!(work_dir = %self.work_dir.display(), "Cycle directories ready");
        Ok(())
    }

    fn stamp(&self) -> String {
        format!("{}_{}", self.time.date_str(), self.time.cycle_str())
    }

    /// `ges/bg_<date>_<cycle>.json`
    pub fn background_file(&self) -> PathBuf {
        self.ges_dir.join(format!("bg_{}.json", self.stamp()))
    }

    /// `analysis/analysis_<date>_<cycle>.json`
    pub fn analysis_file(&self) -> PathBuf {
        self.analysis_dir.join(format!("analysis_{}.json", self.stamp()))
    }

    /// `analysis/forecast_<date>_<cycle>.json`
    pub fn forecast_file(&self) -> PathBuf {
        self.analysis_dir.join(format!("forecast_{}.json", self.stamp()))
    }

    /// `diag/geovals_<date>_<cycle>.json`
    pub fn geovals_file(&self) -> PathBuf {
        self.diag_dir.join(format!("geovals_{}.json", self.stamp()))
    }

    /// `diag/perturbed_<date>_<cycle>.json`
    pub fn perturbed_state_file(&self) -> PathBuf {
        self.diag_dir.join(format!("perturbed_{}.json", self.stamp()))
    }

    /// `diag/perturbed_forecast_<date>_<cycle>.json`
    pub fn perturbed_forecast_file(&self) -> PathBuf {
        self.diag_dir.join(format!("perturbed_forecast_{}.json", self.stamp()))
    }

    /// `diag/sensitivity_<variable>_<date>_<cycle>.json`
    pub fn sensitivity_file(&self, variable: &str) -> PathBuf {
        self.diag_dir.join(format!("sensitivity_{}_{}.json", variable, self.stamp()))
    }

    /// Paths of the previous cycle in the same experiment.
    pub fn previous(&self) -> Self {
        Self::new(self.home.clone(), &self.expid, self.time.previous())
    }

    /// Default location of the experiment report card.
    pub fn report_dir(&self) -> PathBuf {
        self.home.join(&self.expid).join("reports")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_cycle_time() {
        let t = CycleTime::parse("20240115", "06").unwrap();
        assert_eq!(t.date_str(), "20240115");
        assert_eq!(t.cycle_str(), "06");
        assert_eq!(t.to_string(), "20240115 06Z");
    }

    #[test]
    fn test_rejects_bad_cycle_hour() {
        assert!(CycleTime::parse("20240115", "03").is_err());
        assert!(CycleTime::parse("20240115", "xx").is_err());
        assert!(CycleTime::parse("2024-01-15", "00").is_err());
        assert!(CycleTime::parse("20240230", "00").is_err());
    }

    #[test]
    fn test_previous_cycle_crosses_midnight() {
        let t = CycleTime::parse("20240101", "00").unwrap().previous();
        assert_eq!(t.date_str(), "20231231");
        assert_eq!(t.cycle_str(), "18");
        assert_eq!(t.next(), CycleTime::parse("20240101", "00").unwrap());
    }

    #[test]
    fn test_obs_window() {
        let t = CycleTime::parse("20240115", "00").unwrap();
        let (start, end) = t.obs_window(OBS_HALF_WINDOW_HOURS);
        assert_eq!(start.to_string(), "2024-01-14 21:00:00");
        assert_eq!(end.to_string(), "2024-01-15 03:00:00");
    }

    #[test]
    fn test_layout() {
        let home = TempDir::new().unwrap();
        let paths = CyclePaths::new(home.path(), "exp001", CycleTime::parse("20240115", "12").unwrap());

        assert_eq!(paths.work_dir, home.path().join("exp001/20240115/12"));
        assert_eq!(
            paths.background_file(),
            home.path().join("exp001/20240115/12/ges/bg_20240115_12.json")
        );
        assert!(paths.analysis_file().ends_with("analysis/analysis_20240115_12.json"));
        assert!(paths.forecast_file().ends_with("analysis/forecast_20240115_12.json"));
        assert!(paths
            .sensitivity_file("air_temperature")
            .ends_with("diag/sensitivity_air_temperature_20240115_12.json"));
        assert_eq!(
            paths.previous().forecast_file(),
            home.path().join("exp001/20240115/06/analysis/forecast_20240115_06.json")
        );

        paths.create_dirs().unwrap();
        paths.create_dirs().unwrap();
        assert!(paths.obs_dir.is_dir());
        assert!(paths.diag_dir.is_dir());
    }
}
