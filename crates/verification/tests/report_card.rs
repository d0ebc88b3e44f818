//! A day of cycles: increments into the experiment report card.

use tempfile::TempDir;
use test_utils::fixtures::{cycle, grid};
use test_utils::{assert_approx_eq, model_dataset};
use verification::{
    check_temporal_consistency, increment, increment_stats, ReportCard, DEFAULT_JUMP_THRESHOLD,
};

fn shifted(base: &esda_common::Dataset, by: f32) -> esda_common::Dataset {
    let mut out = base.clone();
    for variable in out.variables.values_mut() {
        for v in variable.data.iter_mut() {
            *v += by;
        }
    }
    out
}

#[test]
fn test_daily_report_card() {
    let background = model_dataset(&grid::QUARTER_DEGREE, None, &[], &["air_temperature", "surface_air_pressure"]);
    let dir = TempDir::new().unwrap();
    let mut card = ReportCard::new(cycle::EXPID);

    // collected out of order on purpose
    for (i, hh) in cycle::CYCLES.iter().enumerate().rev() {
        let analysis = shifted(&background, 0.5 * (i + 1) as f32);
        let stats = increment_stats(&increment(&analysis, &background));
        assert_approx_eq!(stats["air_temperature"].mean, 0.5 * (i + 1) as f64, 1e-4);
        card.collect_cycle_metrics(cycle::DATE, hh, &stats).unwrap();
    }
    assert_eq!(card.len(), 8);

    let path = card.write_csv(dir.path()).unwrap();
    let loaded = ReportCard::load_csv(cycle::EXPID, &path).unwrap();
    let cycles: Vec<&str> = loaded.rows().iter().map(|r| r.cycle.as_str()).collect();
    assert_eq!(cycles, vec!["00", "00", "06", "06", "12", "12", "18", "18"]);
    assert_eq!(loaded.rows()[0].variable, "air_temperature");
}

#[test]
fn test_temporal_jump_between_cycles() {
    let forecast = model_dataset(&grid::QUARTER_DEGREE, None, &[], &["air_temperature"]);
    let analysis = shifted(&forecast, 3.0);

    let check = check_temporal_consistency(&analysis, &forecast, DEFAULT_JUMP_THRESHOLD);
    assert_eq!(check.alerts.len(), 1);
    assert_approx_eq!(check.alerts[0].rms_jump, 3.0, 1e-4);
    assert!(check.alerts[0].to_string().contains("air_temperature"));
}
