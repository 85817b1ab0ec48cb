//! # Surf Report Core Library
//!
//! This library provides the data structures and services behind the surf tracker:
//! a small set of Sydney beaches, each polled every 30 minutes against a point-forecast
//! provider, with wind and wave conditions derived for display.
//!
//! ## Design Philosophy
//!
//! ### Two models, one view
//! The provider serves wind and waves from different models (`gfs` and `gfsWave`).
//! Every refresh issues one request per model concurrently and merges the two
//! payloads into a single [`MergedForecast`] keyed on a shared timestamp axis.
//!
//! ### Derive on read
//! Raw payloads carry vector wind components and angular directions. Human-facing
//! values (km/h, compass points) are never stored; they are computed from the merged
//! forecast for a given index when something reads it (see [`conditions`]).
//!
//! ### Absence is a value
//! Provider arrays may contain `null` and a series may be missing entirely. Samples are
//! `Option<f64>` end to end, so a missing swell reading renders as `N/A` instead of
//! silently becoming zero.
//!
//! ### Data Flow
//! 1. **Poll**: [`poller::SpotPoller`] ticks for one spot (immediately, then every 30 min)
//! 2. **Fetch**: [`forecast_client::ForecastClient`] fans out wind + wave requests
//! 3. **Merge**: [`merge::merge`] unions both payloads on the wind time axis
//! 4. **Read**: consumers call [`MergedForecast::sample_at`] for derived values
//!
//! ## Core Types
//! - [`Coordinate`]: validated latitude/longitude pair
//! - [`SurfSpot`]: static reference data for one beach
//! - [`ForecastSeries`]: one parameter's samples aligned to the time axis
//! - [`ModelResponse`]: one validated provider payload
//! - [`MergedForecast`]: union of the wind and wave payloads

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// Module declarations
pub mod compass;
pub mod conditions;
pub mod config;
pub mod forecast_client;
pub mod merge;
pub mod poller;
pub mod renderer;
pub mod server;
pub mod spots;

/// Parameter key to unit string, e.g. `"waves_height-surface" -> "m"`.
pub type UnitsMap = BTreeMap<String, String>;

/// A coordinate outside the valid latitude/longitude range.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("invalid coordinate ({latitude}, {longitude})")]
pub struct CoordinateError {
    pub latitude: f64,
    pub longitude: f64,
}

/// A point on the globe identifying a surf spot.
///
/// Latitude is within `[-90, 90]` and longitude within `[-180, 180]` when built
/// through [`Coordinate::new`]. Deserialized values should be passed through
/// [`Coordinate::validate`] before use.
///
/// # Example
/// ```
/// use surf_report_lib::Coordinate;
///
/// let bondi = Coordinate::new(-33.890842, 151.274292).unwrap();
/// assert!(Coordinate::new(-91.0, 0.0).is_err());
/// assert_eq!(bondi.latitude, -33.890842);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        Coordinate {
            latitude,
            longitude,
        }
        .validate()
    }

    pub fn validate(self) -> Result<Self, CoordinateError> {
        let lat_ok = self.latitude.is_finite() && (-90.0..=90.0).contains(&self.latitude);
        let lon_ok = self.longitude.is_finite() && (-180.0..=180.0).contains(&self.longitude);
        if lat_ok && lon_ok {
            Ok(self)
        } else {
            Err(CoordinateError {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

/// A named beach with an optional surf camera.
///
/// Static reference data: defined once at process start and never mutated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfSpot {
    /// Display name, unique within a registry
    pub name: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Surf camera page, if the beach has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_url: Option<String>,
}

impl SurfSpot {
    pub fn new(name: impl Into<String>, coordinate: Coordinate, camera_url: Option<&str>) -> Self {
        SurfSpot {
            name: name.into(),
            coordinate,
            camera_url: camera_url.map(str::to_string),
        }
    }

    /// Camera page if configured, otherwise the spot on the Windy map.
    pub fn view_url(&self) -> String {
        match &self.camera_url {
            Some(url) => url.clone(),
            None => format!(
                "https://www.windyty.com/?{},{},11",
                self.coordinate.latitude, self.coordinate.longitude
            ),
        }
    }
}

/// Samples of one physical parameter aligned to a timestamp axis.
///
/// A `None` entry is a sample the provider reported as `null`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ForecastSeries(pub Vec<Option<f64>>);

impl ForecastSeries {
    /// Sample at `index`; absent when the provider sent `null` or the index is past the end.
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f64>> for ForecastSeries {
    fn from(values: Vec<f64>) -> Self {
        ForecastSeries(values.into_iter().map(Some).collect())
    }
}

/// One validated provider payload for a single model.
///
/// Every series has exactly `ts.len()` samples and `ts` is strictly increasing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Epoch milliseconds
    pub ts: Vec<i64>,
    #[serde(default)]
    pub units: UnitsMap,
    #[serde(flatten)]
    pub series: BTreeMap<String, ForecastSeries>,
}

/// Wind and wave payloads combined on one timestamp axis.
///
/// Serializes flat, the same shape the provider uses:
/// `{"ts": [...], "units": {...}, "wind_u-surface": [...], "waves_height-surface": [...]}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedForecast {
    /// Epoch milliseconds, taken from the wind payload
    pub ts: Vec<i64>,
    pub units: UnitsMap,
    #[serde(flatten)]
    pub series: BTreeMap<String, ForecastSeries>,
}

impl MergedForecast {
    pub fn series(&self, key: &str) -> Option<&ForecastSeries> {
        self.series.get(key)
    }

    /// Sample of `key` at `index`, absent if the series or the sample is missing.
    pub fn value_at(&self, key: &str, index: usize) -> Option<f64> {
        self.series.get(key).and_then(|s| s.get(index))
    }
}
