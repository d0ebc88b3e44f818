//! Built-in registry tables.
//!
//! Entries are listed in enumeration order; fingerprint ties fall back to
//! this order.

use crate::spec::{Conversion, DerivedQuantity, LevelFingerprint, ModelFamily, ModelSpec, OceanComponent};
use std::collections::BTreeMap;

// ============================================================================
// Reference level sets
// ============================================================================

/// ERA5 / WeatherBench 37 pressure levels (hPa).
pub const ERA5_37_LEVELS: [f64; 37] = [
    1.0, 2.0, 3.0, 5.0, 7.0, 10.0, 20.0, 30.0, 50.0, 70.0, 100.0, 125.0, 150.0, 175.0, 200.0,
    225.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0, 550.0, 600.0, 650.0, 700.0, 750.0, 775.0,
    800.0, 825.0, 850.0, 875.0, 900.0, 925.0, 950.0, 975.0, 1000.0,
];

/// WeatherBench 13 pressure levels (hPa).
pub const WB13_LEVELS: [f64; 13] = [
    50.0, 100.0, 150.0, 200.0, 250.0, 300.0, 400.0, 500.0, 600.0, 700.0, 850.0, 925.0, 1000.0,
];

/// BharatFS atmosphere pressure levels (hPa).
pub const BHARAT_26_LEVELS: [f64; 26] = [
    1000.0, 975.0, 950.0, 925.0, 900.0, 850.0, 800.0, 750.0, 700.0, 650.0, 600.0, 550.0, 500.0,
    450.0, 400.0, 350.0, 300.0, 250.0, 200.0, 150.0, 100.0, 70.0, 50.0, 30.0, 20.0, 10.0,
];

/// BharatFS ocean depth levels (m).
pub const BHARAT_OCEAN_24_LEVELS: [f64; 24] = [
    5.0, 15.0, 25.0, 35.0, 45.0, 55.0, 65.0, 75.0, 85.0, 95.0, 105.0, 115.0, 125.0, 135.0, 145.0,
    155.0, 175.0, 200.0, 250.0, 300.0, 400.0, 500.0, 750.0, 1000.0,
];

/// Mithuna regional pressure levels (hPa).
pub const MITHUNA_21_LEVELS: [f64; 21] = [
    1000.0, 975.0, 950.0, 925.0, 900.0, 875.0, 850.0, 800.0, 750.0, 700.0, 650.0, 600.0, 550.0,
    500.0, 450.0, 400.0, 350.0, 300.0, 250.0, 200.0, 150.0,
];

/// NCUM global pressure levels (hPa).
pub const NCUM_22_LEVELS: [f64; 22] = [
    1000.0, 975.0, 950.0, 925.0, 900.0, 850.0, 800.0, 750.0, 700.0, 600.0, 500.0, 400.0, 300.0,
    250.0, 200.0, 150.0, 100.0, 70.0, 50.0, 30.0, 20.0, 10.0,
];

/// GFS 0.25 degree isobaric levels (hPa).
pub const GFS_41_LEVELS: [f64; 41] = [
    1000.0, 975.0, 950.0, 925.0, 900.0, 850.0, 800.0, 750.0, 700.0, 650.0, 600.0, 550.0, 500.0,
    450.0, 400.0, 350.0, 300.0, 250.0, 200.0, 150.0, 100.0, 70.0, 50.0, 40.0, 30.0, 20.0, 15.0,
    10.0, 7.0, 5.0, 3.0, 2.0, 1.0, 0.7, 0.4, 0.2, 0.1, 0.07, 0.04, 0.02, 0.01,
];

/// CRTM standard 100-layer pressure grid (hPa, layer centres).
pub const CRTM_100_LEVELS: [f64; 100] = [
    0.0050, 0.0161, 0.0384, 0.0769, 0.1370, 0.2244, 0.3454, 0.5064, 0.7140, 0.9753,
    1.2972, 1.6872, 2.1526, 2.7009, 3.3398, 4.0770, 4.9204, 5.8778, 6.9567, 8.1655,
    9.5119, 11.0038, 12.6492, 14.4559, 16.4318, 18.5847, 20.9224, 23.4526, 26.1829, 29.1210,
    32.2744, 35.6505, 39.2566, 43.1001, 47.1882, 51.5278, 56.1260, 60.9895, 66.1253, 71.5398,
    77.2396, 83.2310, 89.5204, 96.1138, 103.0172, 110.2374, 117.7802, 125.6514, 133.8568, 142.4021,
    151.2931, 160.5353, 170.1344, 180.0958, 190.4250, 201.1271, 212.2073, 223.6704, 235.5212, 247.7645,
    260.4047, 273.4462, 286.8932, 300.7496, 315.0191, 329.7052, 344.8113, 360.3404, 376.2952, 392.6784,
    409.4921, 426.7383, 444.4187, 462.5351, 481.0890, 500.0811, 519.5123, 539.3831, 559.6931, 580.4421,
    601.6293, 623.2532, 645.3121, 667.8038, 690.7259, 714.0754, 737.8491, 762.0431, 786.6534, 811.6754,
    837.1041, 862.9340, 889.1593, 915.7741, 942.7719, 970.1462, 997.8900, 1025.9961, 1054.4563, 1083.2625,
];

/// Name of the radiative-transfer reference grid.
pub const CRTM_GRID: &str = "crtm_100";

// ============================================================================
// Table helpers
// ============================================================================

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn pairs(values: &[(&str, &str)]) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn levels(name: &str, values: &[f64]) -> Option<LevelFingerprint> {
    Some(LevelFingerprint::new(name, values.to_vec()))
}

fn derive(target: &str, source: &str, conversion: Conversion, units: &str) -> DerivedQuantity {
    DerivedQuantity {
        target: target.to_string(),
        source: source.to_string(),
        conversion,
        units: Some(units.to_string()),
    }
}

fn height_from_geopotential() -> DerivedQuantity {
    derive("geopotential_height", "geopotential", Conversion::DivideByGravity, "m")
}

fn geopotential_from_height() -> DerivedQuantity {
    derive("geopotential", "geopotential_height", Conversion::MultiplyByGravity, "m2 s-2")
}

// ============================================================================
// Model tables
// ============================================================================

/// All built-in model specs, in enumeration order.
pub fn models() -> Vec<ModelSpec> {
    vec![
        anemoi(),
        graphcast(),
        pangu(),
        fuxi(),
        bharat(),
        mithuna(),
        ncum(),
        gfs(),
        monitobs(),
    ]
}

/// All built-in reference-only grids.
pub fn reference_grids() -> Vec<LevelFingerprint> {
    vec![LevelFingerprint::new(CRTM_GRID, CRTM_100_LEVELS.to_vec())]
}

fn anemoi() -> ModelSpec {
    let mut spec = ModelSpec::new("anemoi", ModelFamily::AiFoundation);
    spec.description = "Anemoi learned global forecast (ERA5 37 levels)".to_string();
    spec.resolution = Some(0.25);
    spec.levels = levels("era5_37", &ERA5_37_LEVELS);
    spec.required_variables = names(&["2t", "u10", "v10", "q", "sp"]);
    spec.mapping = pairs(&[
        ("air_temperature", "2t"),
        ("eastward_wind", "u10"),
        ("northward_wind", "v10"),
        ("specific_humidity", "q"),
        ("surface_pressure", "sp"),
        ("air_pressure", "p"),
    ]);
    spec.units = pairs(&[
        ("2t", "K"),
        ("u10", "m s-1"),
        ("v10", "m s-1"),
        ("q", "kg kg-1"),
        ("sp", "Pa"),
        ("p", "Pa"),
    ]);
    spec
}

fn graphcast() -> ModelSpec {
    let mut spec = ModelSpec::new("graphcast", ModelFamily::AiFoundation);
    spec.description = "GraphCast learned global forecast (ERA5 37 levels)".to_string();
    spec.resolution = Some(0.25);
    spec.levels = levels("era5_37", &ERA5_37_LEVELS);
    spec.required_variables = names(&[
        "2m_temperature",
        "temperature",
        "u_component_of_wind",
        "v_component_of_wind",
        "specific_humidity",
        "geopotential",
    ]);
    spec.mapping = pairs(&[
        ("air_temperature_at_2m", "2m_temperature"),
        ("eastward_wind_at_10m", "10m_u_component_of_wind"),
        ("northward_wind_at_10m", "10m_v_component_of_wind"),
        ("air_pressure_at_sea_level", "mean_sea_level_pressure"),
        ("air_temperature", "temperature"),
        ("eastward_wind", "u_component_of_wind"),
        ("northward_wind", "v_component_of_wind"),
        ("specific_humidity", "specific_humidity"),
        ("geopotential", "geopotential"),
        ("precipitation_amount", "total_precipitation_6hr"),
    ]);
    spec.units = pairs(&[
        ("2m_temperature", "K"),
        ("temperature", "K"),
        ("geopotential", "m2 s-2"),
        ("specific_humidity", "kg kg-1"),
        ("mean_sea_level_pressure", "Pa"),
    ]);
    spec.derived = vec![height_from_geopotential()];
    spec
}

fn pangu() -> ModelSpec {
    let mut spec = ModelSpec::new("pangu", ModelFamily::AiFoundation);
    spec.description = "Pangu-Weather learned global forecast (13 levels)".to_string();
    spec.resolution = Some(0.25);
    spec.levels = levels("wb13", &WB13_LEVELS);
    spec.required_variables = names(&["z", "q", "t", "u", "v", "msl", "u10", "v10", "t2m"]);
    spec.mapping = pairs(&[
        ("geopotential", "z"),
        ("specific_humidity", "q"),
        ("air_temperature", "t"),
        ("eastward_wind", "u"),
        ("northward_wind", "v"),
        ("air_pressure_at_sea_level", "msl"),
        ("eastward_wind_at_10m", "u10"),
        ("northward_wind_at_10m", "v10"),
        ("air_temperature_at_2m", "t2m"),
    ]);
    spec.units = pairs(&[
        ("z", "m2 s-2"),
        ("q", "kg kg-1"),
        ("t", "K"),
        ("msl", "Pa"),
        ("t2m", "K"),
    ]);
    spec.derived = vec![height_from_geopotential()];
    spec
}

fn fuxi() -> ModelSpec {
    let mut spec = ModelSpec::new("fuxi", ModelFamily::AiFoundation);
    spec.description = "FuXi learned global forecast (13 levels)".to_string();
    spec.resolution = Some(0.25);
    spec.levels = levels("wb13", &WB13_LEVELS);
    spec.required_variables = names(&["Z", "T", "U", "V", "R", "T2M", "U10", "V10", "MSL"]);
    spec.mapping = pairs(&[
        ("geopotential", "Z"),
        ("air_temperature", "T"),
        ("eastward_wind", "U"),
        ("northward_wind", "V"),
        ("relative_humidity", "R"),
        ("air_temperature_at_2m", "T2M"),
        ("eastward_wind_at_10m", "U10"),
        ("northward_wind_at_10m", "V10"),
        ("air_pressure_at_sea_level", "MSL"),
        ("precipitation_amount", "TP"),
    ]);
    spec.units = pairs(&[("Z", "m2 s-2"), ("T", "K"), ("R", "%"), ("T2M", "K"), ("MSL", "Pa")]);
    spec.derived = vec![height_from_geopotential()];
    spec
}

fn bharat() -> ModelSpec {
    let mut spec = ModelSpec::new("bharat", ModelFamily::CoupledDynamical);
    spec.description = "BharatFS coupled atmosphere-ocean forecast".to_string();
    spec.resolution = Some(0.125);
    spec.levels = levels("bharat_26", &BHARAT_26_LEVELS);
    spec.vertical_aliases = names(&["level", "lev", "vertical", "plev"]);
    spec.allow_nan = true;
    spec.required_variables = names(&["ta", "ua", "va", "hus", "psl", "thetao", "so"]);
    spec.mapping = pairs(&[
        ("air_temperature", "ta"),
        ("eastward_wind", "ua"),
        ("northward_wind", "va"),
        ("specific_humidity", "hus"),
        ("geopotential_height", "zg"),
        ("air_temperature_at_2m", "tas"),
        ("eastward_wind_at_10m", "uas"),
        ("northward_wind_at_10m", "vas"),
        ("air_pressure_at_sea_level", "psl"),
        ("surface_pressure", "ps"),
    ]);
    spec.units = pairs(&[
        ("ta", "K"),
        ("hus", "kg kg-1"),
        ("zg", "m"),
        ("psl", "Pa"),
        ("thetao", "degC"),
        ("so", "0.001"),
    ]);
    spec.derived = vec![geopotential_from_height()];
    spec.ocean = Some(OceanComponent {
        mapping: pairs(&[
            ("sea_water_potential_temperature", "thetao"),
            ("sea_water_salinity", "so"),
            ("eastward_sea_water_velocity", "uo"),
            ("northward_sea_water_velocity", "vo"),
            ("sea_surface_height_above_geoid", "zos"),
        ]),
        levels: levels("bharat_ocean_24", &BHARAT_OCEAN_24_LEVELS),
        vertical_aliases: names(&["depth", "deptht", "z_t", "ocean_depth"]),
        vertical_axis: "ocean_depth".to_string(),
    });
    spec
}

fn mithuna() -> ModelSpec {
    let mut spec = ModelSpec::new("mithuna", ModelFamily::RegionalDynamical);
    spec.description = "Mithuna limited-area forecast".to_string();
    spec.resolution = Some(0.1);
    spec.levels = levels("mithuna_21", &MITHUNA_21_LEVELS);
    spec.vertical_aliases = names(&["level", "lev", "pressure", "plev"]);
    spec.required_variables = names(&["T", "U", "V", "QVAPOR", "PSFC"]);
    spec.mapping = pairs(&[
        ("air_temperature", "T"),
        ("eastward_wind", "U"),
        ("northward_wind", "V"),
        ("humidity_mixing_ratio", "QVAPOR"),
        ("surface_pressure", "PSFC"),
        ("air_temperature_at_2m", "T2"),
        ("eastward_wind_at_10m", "U10"),
        ("northward_wind_at_10m", "V10"),
    ]);
    spec.units = pairs(&[("T", "K"), ("QVAPOR", "kg kg-1"), ("PSFC", "Pa"), ("T2", "K")]);
    spec
}

fn ncum() -> ModelSpec {
    let mut spec = ModelSpec::new("ncum", ModelFamily::GlobalDynamical);
    spec.description = "NCMRWF Unified Model global forecast".to_string();
    spec.resolution = Some(0.140625);
    spec.levels = levels("ncum_22", &NCUM_22_LEVELS);
    spec.required_variables = names(&["temp", "u", "v", "q", "pmsl"]);
    spec.mapping = pairs(&[
        ("air_temperature", "temp"),
        ("eastward_wind", "u"),
        ("northward_wind", "v"),
        ("specific_humidity", "q"),
        ("geopotential_height", "ht"),
        ("air_pressure_at_sea_level", "pmsl"),
        ("surface_pressure", "pstar"),
    ]);
    spec.units = pairs(&[("temp", "K"), ("q", "kg kg-1"), ("ht", "m"), ("pmsl", "Pa"), ("pstar", "Pa")]);
    spec.derived = vec![geopotential_from_height()];
    spec
}

fn gfs() -> ModelSpec {
    let mut spec = ModelSpec::new("gfs", ModelFamily::GlobalDynamical);
    spec.description = "NCEP GFS 0.25 degree global forecast".to_string();
    spec.resolution = Some(0.25);
    spec.levels = levels("gfs_41", &GFS_41_LEVELS);
    spec.vertical_aliases = names(&["isobaricInhPa", "level", "lev", "pressure", "plev"]);
    spec.required_variables = names(&["t", "u", "v", "q", "gh", "prmsl"]);
    spec.mapping = pairs(&[
        ("air_temperature", "t"),
        ("eastward_wind", "u"),
        ("northward_wind", "v"),
        ("specific_humidity", "q"),
        ("geopotential_height", "gh"),
        ("air_temperature_at_2m", "t2m"),
        ("eastward_wind_at_10m", "u10"),
        ("northward_wind_at_10m", "v10"),
        ("air_pressure_at_sea_level", "prmsl"),
        ("surface_pressure", "sp"),
    ]);
    spec.units = pairs(&[("t", "K"), ("q", "kg kg-1"), ("gh", "gpm"), ("prmsl", "Pa"), ("sp", "Pa")]);
    spec.derived = vec![geopotential_from_height()];
    spec
}

fn monitobs() -> ModelSpec {
    let mut spec = ModelSpec::new("monitobs", ModelFamily::PointObservation);
    spec.description = "Surface station observations".to_string();
    spec.allow_nan = true;
    spec.required_variables = names(&["tair", "pres"]);
    spec.mapping = pairs(&[
        ("air_temperature", "tair"),
        ("eastward_wind", "uwind"),
        ("northward_wind", "vwind"),
        ("relative_humidity", "rh"),
        ("surface_pressure", "pres"),
    ]);
    spec.units = pairs(&[("tair", "K"), ("rh", "%"), ("pres", "Pa")]);
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_counts() {
        let counts: Vec<(String, usize)> = models()
            .into_iter()
            .filter_map(|m| m.levels.map(|l| (m.key, l.len())))
            .collect();
        assert!(counts.contains(&("anemoi".to_string(), 37)));
        assert!(counts.contains(&("pangu".to_string(), 13)));
        assert!(counts.contains(&("fuxi".to_string(), 13)));
        assert_eq!(CRTM_100_LEVELS.len(), 100);
    }

    #[test]
    fn test_every_builtin_spec_checks() {
        for spec in models() {
            spec.check().unwrap_or_else(|e| panic!("{} failed: {}", spec.key, e));
        }
    }

    #[test]
    fn test_keys_are_lowercase() {
        for spec in models() {
            assert_eq!(spec.key, spec.key.to_lowercase());
        }
    }
}
