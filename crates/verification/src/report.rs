//! Experiment report card: per-cycle increment metrics over time.

use crate::error::{Result, VerificationError};
use crate::increment::VariableStats;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// One CSV row: increment statistics of one variable in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleMetrics {
    /// YYYYMMDD
    pub date: String,
    /// HH
    pub cycle: String,
    pub variable: String,
    pub mean_increment: f64,
    pub rms_increment: f64,
}

impl CycleMetrics {
    /// Valid time of the cycle.
    pub fn timestamp(&self) -> Result<NaiveDateTime> {
        let invalid = || VerificationError::InvalidTimestamp {
            date: self.date.clone(),
            cycle: self.cycle.clone(),
        };
        let date = NaiveDate::parse_from_str(&self.date, "%Y%m%d").map_err(|_| invalid())?;
        let hour: u32 = self.cycle.parse().map_err(|_| invalid())?;
        date.and_hms_opt(hour, 0, 0).ok_or_else(invalid)
    }
}

/// Metrics collected across the cycles of one experiment.
#[derive(Debug, Clone)]
pub struct ReportCard {
    expid: String,
    rows: Vec<CycleMetrics>,
}

impl ReportCard {
    pub fn new(expid: impl Into<String>) -> Self {
        Self {
            expid: expid.into(),
            rows: Vec::new(),
        }
    }

    pub fn expid(&self) -> &str {
        &self.expid
    }

    pub fn rows(&self) -> &[CycleMetrics] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Record the increment statistics of one cycle.
    ///
    /// The timestamp is checked up front so a bad row never reaches the report.
    pub fn collect_cycle_metrics(
        &mut self,
        date: &str,
        cycle: &str,
        stats: &BTreeMap<String, VariableStats>,
    ) -> Result<()> {
        for (variable, s) in stats {
            let row = CycleMetrics {
                date: date.to_string(),
                cycle: cycle.to_string(),
                variable: variable.clone(),
                mean_increment: s.mean,
                rms_increment: s.rms,
            };
            row.timestamp()?;
            self.rows.push(row);
        }
        Ok(())
    }

    /// Drop the rows of one cycle, so a re-run replaces rather than duplicates them.
    pub fn remove_cycle(&mut self, date: &str, cycle: &str) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !(row.date == date && row.cycle == cycle));
        before - self.rows.len()
    }

    /// File name of the metrics CSV for this experiment.
    pub fn file_name(&self) -> String {
        format!("{}_metrics.csv", self.expid)
    }

    /// Rows ordered by cycle time, then variable name.
    pub fn sorted_rows(&self) -> Result<Vec<CycleMetrics>> {
        let mut keyed = self
            .rows
            .iter()
            .map(|row| Ok((row.timestamp()?, row.clone())))
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by(|(ta, a), (tb, b)| ta.cmp(tb).then_with(|| a.variable.cmp(&b.variable)));
        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }

    /// Write `<expid>_metrics.csv` into `output_dir`, sorted by timestamp.
    pub fn write_csv(&self, output_dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(self.file_name());

        let mut writer = csv::Writer::from_writer(File::create(&path)?);
        for row in self.sorted_rows()? {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!(path = %path.display(), rows = self.rows.len(), "Wrote experiment metrics");
        Ok(path)
    }

    /// Re-open a report written by [`ReportCard::write_csv`].
    pub fn load_csv(expid: impl Into<String>, path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let rows = reader
            .deserialize()
            .collect::<std::result::Result<Vec<CycleMetrics>, csv::Error>>()?;
        Ok(Self {
            expid: expid.into(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn stats(mean: f64, rms: f64) -> BTreeMap<String, VariableStats> {
        let mut map = BTreeMap::new();
        map.insert(
            "air_temperature".to_string(),
            VariableStats {
                mean,
                rms,
                count: 10,
            },
        );
        map
    }

    #[test]
    fn test_timestamp() {
        let row = CycleMetrics {
            date: "20240115".into(),
            cycle: "18".into(),
            variable: "t".into(),
            mean_increment: 0.0,
            rms_increment: 0.0,
        };
        assert_eq!(row.timestamp().unwrap().to_string(), "2024-01-15 18:00:00");
    }

    #[test]
    fn test_rejects_bad_cycle() {
        let mut card = ReportCard::new("exp001");
        let err = card.collect_cycle_metrics("20240115", "25", &stats(0.0, 0.0));
        assert!(matches!(err, Err(VerificationError::InvalidTimestamp { .. })));
        assert!(card.is_empty());
    }

    #[test]
    fn test_write_sorted_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut card = ReportCard::new("exp001");
        card.collect_cycle_metrics("20240115", "12", &stats(0.2, 1.2)).unwrap();
        card.collect_cycle_metrics("20240114", "18", &stats(0.1, 1.1)).unwrap();
        card.collect_cycle_metrics("20240115", "00", &stats(0.3, 1.3)).unwrap();

        let path = card.write_csv(dir.path()).unwrap();
        assert!(path.ends_with("exp001_metrics.csv"));

        let loaded = ReportCard::load_csv("exp001", &path).unwrap();
        let order: Vec<(&str, &str)> = loaded
            .rows()
            .iter()
            .map(|r| (r.date.as_str(), r.cycle.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("20240114", "18"), ("20240115", "00"), ("20240115", "12")]
        );
        assert_eq!(loaded.rows()[1].rms_increment, 1.3);
    }

    #[test]
    fn test_remove_cycle() {
        let mut card = ReportCard::new("exp001");
        card.collect_cycle_metrics("20240115", "00", &stats(0.1, 1.0)).unwrap();
        card.collect_cycle_metrics("20240115", "06", &stats(0.1, 1.0)).unwrap();
        assert_eq!(card.remove_cycle("20240115", "00"), 1);
        assert_eq!(card.rows()[0].cycle, "06");
    }
}
