//! Derived per-timestamp conditions, computed from a [`MergedForecast`] on read.

use crate::compass::{angle_to_compass16, gust_speed_kmh, wind_vector, WindReading};
use crate::MergedForecast;
use serde::Serialize;

pub const WIND_U: &str = "wind_u-surface";
pub const WIND_V: &str = "wind_v-surface";
pub const GUST: &str = "gust-surface";

/// Provider key prefixes for the four wave components.
const WAVES: &str = "waves";
const WIND_WAVES: &str = "wwaves";
const SWELL1: &str = "swell1";
const SWELL2: &str = "swell2";

/// Number of rows in the hourly table.
pub const DEFAULT_HOURLY_ROWS: usize = 8;

/// Height, period and bearing of one wave component at one timestamp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct WaveComponent {
    pub height_m: Option<f64>,
    pub period_s: Option<f64>,
    pub direction_deg: Option<f64>,
}

impl WaveComponent {
    fn read(forecast: &MergedForecast, prefix: &str, index: usize) -> Self {
        WaveComponent {
            height_m: forecast.value_at(&format!("{prefix}_height-surface"), index),
            period_s: forecast.value_at(&format!("{prefix}_period-surface"), index),
            direction_deg: forecast.value_at(&format!("{prefix}_direction-surface"), index),
        }
    }

    /// 16-point compass bearing, `"N/A"` when the provider has no direction.
    pub fn compass(&self) -> &'static str {
        angle_to_compass16(self.direction_deg)
    }
}

/// Human-facing values at one index of the time axis. Never stored.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DerivedSample {
    pub timestamp_ms: i64,
    /// Present only when both wind components exist and are finite at this index
    pub wind: Option<WindReading>,
    pub gust_kmh: Option<f64>,
    pub waves: WaveComponent,
    pub wind_waves: WaveComponent,
    pub swell1: WaveComponent,
    pub swell2: WaveComponent,
}

impl MergedForecast {
    /// Derived conditions at `index`, or `None` past the end of the time axis.
    pub fn sample_at(&self, index: usize) -> Option<DerivedSample> {
        let timestamp_ms = *self.ts.get(index)?;

        let wind = match (self.value_at(WIND_U, index), self.value_at(WIND_V, index)) {
            (Some(u), Some(v)) if u.is_finite() && v.is_finite() => Some(wind_vector(u, v)),
            _ => None,
        };

        Some(DerivedSample {
            timestamp_ms,
            wind,
            gust_kmh: self.value_at(GUST, index).map(gust_speed_kmh),
            waves: WaveComponent::read(self, WAVES, index),
            wind_waves: WaveComponent::read(self, WIND_WAVES, index),
            swell1: WaveComponent::read(self, SWELL1, index),
            swell2: WaveComponent::read(self, SWELL2, index),
        })
    }

    /// The first `limit` samples of the time axis.
    pub fn hourly(&self, limit: usize) -> Vec<DerivedSample> {
        (0..self.ts.len().min(limit))
            .filter_map(|i| self.sample_at(i))
            .collect()
    }
}
