//! Common test fixtures for AIESDA tests.

/// Attribute sets for metadata resolution tests.
pub mod attrs {
    /// A producer that names itself in `source`
    pub const ANEMOI_RUN: &[(&str, &str)] = &[
        ("source", "anemoi forecast run"),
        ("Conventions", "CF-1.8"),
    ];

    /// Attributes that name no registered model
    pub const ANONYMOUS: &[(&str, &str)] = &[
        ("history", "regridded with cdo"),
        ("Conventions", "CF-1.8"),
    ];
}

/// Small horizontal patches at each registered model's grid spacing.
pub mod grid {
    /// Regular lon/lat patch.
    #[derive(Debug, Clone, Copy)]
    pub struct GridSpec {
        pub nlon: usize,
        pub nlat: usize,
        pub lon0: f64,
        pub lat0: f64,
        /// Grid spacing in degrees
        pub resolution: f64,
    }

    impl GridSpec {
        pub const fn new(nlon: usize, nlat: usize, lon0: f64, lat0: f64, resolution: f64) -> Self {
            Self {
                nlon,
                nlat,
                lon0,
                lat0,
                resolution,
            }
        }

        /// Number of horizontal points.
        pub fn size(&self) -> usize {
            self.nlon * self.nlat
        }

        pub fn lon(&self) -> Vec<f64> {
            crate::generators::axis(self.lon0, self.resolution, self.nlon)
        }

        pub fn lat(&self) -> Vec<f64> {
            crate::generators::axis(self.lat0, self.resolution, self.nlat)
        }
    }

    /// 0.25 degree (ERA5, WeatherBench, GFS)
    pub const QUARTER_DEGREE: GridSpec = GridSpec::new(6, 4, 70.0, 10.0, 0.25);

    /// 0.125 degree (BharatFS)
    pub const EIGHTH_DEGREE: GridSpec = GridSpec::new(6, 4, 70.0, 10.0, 0.125);

    /// 0.1 degree (Mithuna)
    pub const TENTH_DEGREE: GridSpec = GridSpec::new(6, 4, 70.0, 10.0, 0.1);

    /// N1280-like 0.140625 degree (NCUM)
    pub const NCUM: GridSpec = GridSpec::new(6, 4, 70.0, 10.0, 0.140625);

    /// 1 degree, matching no registered model
    pub const ONE_DEGREE: GridSpec = GridSpec::new(6, 4, 70.0, 10.0, 1.0);
}

/// Cycle identifiers.
pub mod cycle {
    /// A fixed cycle date
    pub const DATE: &str = "20240115";

    pub const CYCLES: [&str; 4] = ["00", "06", "12", "18"];

    /// Experiment id used by runner tests
    pub const EXPID: &str = "exp001";
}
