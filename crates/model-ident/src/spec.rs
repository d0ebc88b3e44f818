//! Model contracts: what a registry entry declares about a forecast model.

use crate::error::{IdentError, Result};
use esda_common::axes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Standard gravitational acceleration (m s-2).
pub const STANDARD_GRAVITY: f64 = 9.80665;

// ============================================================================
// Adapter families
// ============================================================================

/// The closed set of adapter families a registry entry can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Global learned forecast models (37- and 13-level variants)
    AiFoundation,
    /// Global coupled atmosphere-ocean dynamical models
    CoupledDynamical,
    /// Limited-area dynamical models
    RegionalDynamical,
    /// Global atmosphere-only dynamical models
    GlobalDynamical,
    /// Point-based observation sources (no grid, no levels)
    PointObservation,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 5] = [
        ModelFamily::AiFoundation,
        ModelFamily::CoupledDynamical,
        ModelFamily::RegionalDynamical,
        ModelFamily::GlobalDynamical,
        ModelFamily::PointObservation,
    ];

    /// Adapter name as written in registry configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::AiFoundation => "ai_foundation",
            ModelFamily::CoupledDynamical => "coupled_dynamical",
            ModelFamily::RegionalDynamical => "regional_dynamical",
            ModelFamily::GlobalDynamical => "global_dynamical",
            ModelFamily::PointObservation => "point_observation",
        }
    }

    pub fn from_adapter(adapter: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == adapter)
    }
}

impl std::fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Level fingerprints
// ============================================================================

/// A named, ordered set of vertical level values (hPa or metres of depth).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelFingerprint {
    pub name: String,
    pub values: Vec<f64>,
}

impl LevelFingerprint {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True if the values are strictly increasing or strictly decreasing.
    pub fn is_strictly_monotonic(&self) -> bool {
        let increasing = self.values.windows(2).all(|w| w[0] < w[1]);
        let decreasing = self.values.windows(2).all(|w| w[0] > w[1]);
        increasing || decreasing
    }

    fn check(&self, owner: &str) -> Result<()> {
        if self.values.is_empty() {
            return Err(IdentError::InvalidConfig(format!(
                "{}: level set '{}' is empty",
                owner, self.name
            )));
        }
        if self.values.iter().any(|v| !v.is_finite()) {
            return Err(IdentError::InvalidConfig(format!(
                "{}: level set '{}' contains non-finite values",
                owner, self.name
            )));
        }
        if !self.is_strictly_monotonic() {
            return Err(IdentError::InvalidConfig(format!(
                "{}: level set '{}' is not strictly monotonic",
                owner, self.name
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Derived quantities
// ============================================================================

/// Unit conversion applied when deriving one canonical field from another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conversion {
    /// Geopotential (m2 s-2) to geopotential height (m)
    DivideByGravity,
    /// Geopotential height (m) to geopotential (m2 s-2)
    MultiplyByGravity,
}

impl Conversion {
    #[inline]
    pub fn apply(&self, value: f32) -> f32 {
        match self {
            Conversion::DivideByGravity => (value as f64 / STANDARD_GRAVITY) as f32,
            Conversion::MultiplyByGravity => (value as f64 * STANDARD_GRAVITY) as f32,
        }
    }
}

/// A canonical field computed from another canonical field during standardization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedQuantity {
    /// Canonical name of the field to produce
    pub target: String,
    /// Canonical name of the field it is computed from
    pub source: String,
    pub conversion: Conversion,
    /// Units attribute written on the derived field
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
}

// ============================================================================
// Ocean component
// ============================================================================

/// Ocean half of a coupled model: its own variables and depth axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OceanComponent {
    /// Canonical name -> native name for ocean variables
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
    /// Reference depth levels (metres)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<LevelFingerprint>,
    #[serde(default = "default_ocean_aliases")]
    pub vertical_aliases: Vec<String>,
    #[serde(default = "default_ocean_axis")]
    pub vertical_axis: String,
}

impl OceanComponent {
    /// Native name -> canonical name.
    pub fn native_to_canonical(&self) -> BTreeMap<&str, &str> {
        invert(&self.mapping)
    }

    /// Whether a native or canonical variable name belongs to the ocean side.
    pub fn owns_variable(&self, name: &str) -> bool {
        self.mapping.contains_key(name) || self.mapping.values().any(|native| native == name)
    }

    /// Whether a dimension name is (or will become) the ocean depth axis.
    pub fn owns_dimension(&self, dim: &str) -> bool {
        dim == self.vertical_axis || self.vertical_aliases.iter().any(|a| a == dim)
    }
}

fn default_ocean_aliases() -> Vec<String> {
    axes::OCEAN_DEPTH_ALIASES.iter().map(|s| s.to_string()).collect()
}

fn default_ocean_axis() -> String {
    axes::CANONICAL_OCEAN_DEPTH.to_string()
}

// ============================================================================
// Model specification
// ============================================================================

/// One registry entry: the identity and contract of a forecast model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Unique identity key, also searched for in dataset metadata
    pub key: String,
    /// Adapter family name (see [`ModelFamily`])
    pub adapter: String,
    #[serde(default)]
    pub description: String,
    /// Native variable names that must be present
    #[serde(default)]
    pub required_variables: Vec<String>,
    /// Horizontal grid spacing in degrees; absent for point sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<f64>,
    /// Reference vertical levels used for fingerprinting and overwrite
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<LevelFingerprint>,
    #[serde(default = "default_vertical_axis")]
    pub vertical_axis: String,
    /// Vertical axis names this model is known to emit, in precedence order
    #[serde(default = "default_vertical_aliases")]
    pub vertical_aliases: Vec<String>,
    /// Expected units per native variable (informational)
    #[serde(default)]
    pub units: BTreeMap<String, String>,
    #[serde(default)]
    pub allow_nan: bool,
    /// Canonical name -> native name
    #[serde(default)]
    pub mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub derived: Vec<DerivedQuantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocean: Option<OceanComponent>,
}

fn default_vertical_axis() -> String {
    axes::CANONICAL_VERTICAL.to_string()
}

fn default_vertical_aliases() -> Vec<String> {
    axes::VERTICAL_ALIASES.iter().map(|s| s.to_string()).collect()
}

impl ModelSpec {
    /// Minimal spec with default axes; the builtin tables fill the rest.
    pub fn new(key: impl Into<String>, family: ModelFamily) -> Self {
        Self {
            key: key.into(),
            adapter: family.as_str().to_string(),
            description: String::new(),
            required_variables: Vec::new(),
            resolution: None,
            levels: None,
            vertical_axis: default_vertical_axis(),
            vertical_aliases: default_vertical_aliases(),
            units: BTreeMap::new(),
            allow_nan: false,
            mapping: BTreeMap::new(),
            derived: Vec::new(),
            ocean: None,
        }
    }

    /// Resolve the adapter family this spec names.
    pub fn family(&self) -> Result<ModelFamily> {
        ModelFamily::from_adapter(&self.adapter).ok_or_else(|| IdentError::UnknownInterface {
            model: self.key.clone(),
            adapter: self.adapter.clone(),
        })
    }

    /// Native name -> canonical name for the atmosphere (or only) component.
    pub fn native_to_canonical(&self) -> BTreeMap<&str, &str> {
        invert(&self.mapping)
    }

    /// Number of this spec's required variables for which `has` holds.
    pub fn required_present(&self, mut has: impl FnMut(&str) -> bool) -> usize {
        self.required_variables.iter().filter(|v| has(v)).count()
    }

    /// Check the entry for internal consistency.
    pub fn check(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(IdentError::InvalidConfig("model with empty key".to_string()));
        }
        self.family()?;

        if let Some(res) = self.resolution {
            if !(res.is_finite() && res > 0.0) {
                return Err(IdentError::InvalidConfig(format!(
                    "{}: resolution must be a positive number of degrees, got {}",
                    self.key, res
                )));
            }
        }
        if let Some(levels) = &self.levels {
            levels.check(&self.key)?;
        }
        if self.vertical_aliases.is_empty() {
            return Err(IdentError::InvalidConfig(format!(
                "{}: vertical_aliases must not be empty",
                self.key
            )));
        }

        let mut seen = HashSet::new();
        if let Some(dup) = self.required_variables.iter().find(|v| !seen.insert(v.as_str())) {
            return Err(IdentError::InvalidConfig(format!(
                "{}: required variable '{}' listed twice",
                self.key, dup
            )));
        }

        check_unique_natives(&self.key, &self.mapping)?;
        if let Some(ocean) = &self.ocean {
            check_unique_natives(&self.key, &ocean.mapping)?;
            if let Some(levels) = &ocean.levels {
                levels.check(&self.key)?;
            }
            if ocean.vertical_axis == self.vertical_axis {
                return Err(IdentError::InvalidConfig(format!(
                    "{}: ocean and atmosphere share vertical axis '{}'",
                    self.key, self.vertical_axis
                )));
            }
            if let Some(native) = self.mapping.values().find(|n| ocean.owns_variable(n)) {
                return Err(IdentError::InvalidConfig(format!(
                    "{}: '{}' is mapped by both atmosphere and ocean",
                    self.key, native
                )));
            }
        }
        Ok(())
    }
}

fn invert(mapping: &BTreeMap<String, String>) -> BTreeMap<&str, &str> {
    mapping
        .iter()
        .map(|(canonical, native)| (native.as_str(), canonical.as_str()))
        .collect()
}

fn check_unique_natives(key: &str, mapping: &BTreeMap<String, String>) -> Result<()> {
    let mut seen = HashSet::new();
    for native in mapping.values() {
        if !seen.insert(native.as_str()) {
            return Err(IdentError::InvalidConfig(format!(
                "{}: native name '{}' is mapped from more than one canonical name",
                key, native
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotonic_either_direction() {
        assert!(LevelFingerprint::new("up", vec![1.0, 2.0, 3.0]).is_strictly_monotonic());
        assert!(LevelFingerprint::new("down", vec![3.0, 2.0, 1.0]).is_strictly_monotonic());
        assert!(!LevelFingerprint::new("flat", vec![1.0, 1.0, 2.0]).is_strictly_monotonic());
        assert!(!LevelFingerprint::new("zigzag", vec![1.0, 3.0, 2.0]).is_strictly_monotonic());
    }

    #[test]
    fn test_family_round_trip() {
        for family in ModelFamily::ALL {
            assert_eq!(ModelFamily::from_adapter(family.as_str()), Some(family));
        }
        assert_eq!(ModelFamily::from_adapter("spectral"), None);
    }

    #[test]
    fn test_unknown_adapter_is_unknown_interface() {
        let mut spec = ModelSpec::new("mystery", ModelFamily::GlobalDynamical);
        spec.adapter = "spectral".to_string();
        assert!(matches!(
            spec.check(),
            Err(IdentError::UnknownInterface { ref adapter, .. }) if adapter == "spectral"
        ));
    }

    #[test]
    fn test_duplicate_native_names_rejected() {
        let mut spec = ModelSpec::new("dup", ModelFamily::GlobalDynamical);
        spec.mapping.insert("air_temperature".into(), "t".into());
        spec.mapping.insert("air_temperature_at_2m".into(), "t".into());
        assert!(matches!(spec.check(), Err(IdentError::InvalidConfig(_))));
    }

    #[test]
    fn test_native_to_canonical() {
        let mut spec = ModelSpec::new("m", ModelFamily::AiFoundation);
        spec.mapping.insert("air_temperature".into(), "2t".into());
        let inverse = spec.native_to_canonical();
        assert_eq!(inverse.get("2t"), Some(&"air_temperature"));
    }

    #[test]
    fn test_gravity_conversions() {
        let z = 9.80665_f32 * 5500.0;
        assert!((Conversion::DivideByGravity.apply(z) - 5500.0).abs() < 1e-2);
        assert!((Conversion::MultiplyByGravity.apply(1.0) - 9.80665).abs() < 1e-5);
    }

    #[test]
    fn test_spec_yaml_defaults() {
        let yaml = r#"
key: demo
adapter: global_dynamical
resolution: 0.5
mapping:
  air_temperature: temp
"#;
        let spec: ModelSpec = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(spec.vertical_axis, "lev");
        assert_eq!(spec.vertical_aliases[0], "level");
        assert!(!spec.allow_nan);
        assert!(spec.check().is_ok());
    }
}
