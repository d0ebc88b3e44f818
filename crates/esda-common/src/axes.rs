//! Well-known coordinate axis names.

/// Vertical-axis aliases in precedence order.
///
/// The first alias present in a dataset is the one treated as its
/// vertical coordinate.
pub const VERTICAL_ALIASES: &[&str] = &["level", "lev", "pressure", "plev", "vertical", "isobaricInhPa"];

/// Canonical name of the atmospheric vertical axis after standardization.
pub const CANONICAL_VERTICAL: &str = "lev";

/// Ocean depth aliases in precedence order.
pub const OCEAN_DEPTH_ALIASES: &[&str] = &["depth", "deptht", "z_t", "ocean_depth"];

/// Canonical name of the ocean vertical axis after standardization.
pub const CANONICAL_OCEAN_DEPTH: &str = "ocean_depth";

/// Longitude aliases in precedence order.
pub const LONGITUDE_ALIASES: &[&str] = &["lon", "longitude", "x"];

/// Latitude aliases in precedence order.
pub const LATITUDE_ALIASES: &[&str] = &["lat", "latitude", "y"];
