//! # Directional Math
//!
//! Converts raw provider values into what a surfer reads: wind vector components
//! (m/s) become a speed in km/h and a compass octant, and wave/swell bearings become
//! one of 16 compass points.
//!
//! ## Conventions
//! - `u` is the eastward and `v` the northward wind component, in m/s
//! - Wind direction is meteorological: the bearing the wind blows *from*
//! - Wave directions from the provider are already bearings in degrees
//!
//! None of these functions fail. NaN inputs produce NaN speeds, and a non-finite
//! bearing has no compass point: [`angle_to_compass16`] reports it as `"N/A"`.
//! Absent samples are guarded upstream with `Option`.

use serde::Serialize;
use std::fmt;

/// m/s to km/h
const MS_TO_KMH: f64 = 3.6;

/// Returned by [`angle_to_compass16`] when there is no bearing to convert.
pub const NOT_AVAILABLE: &str = "N/A";

const COMPASS_16: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// One of the eight principal compass points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum CompassOctant {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

impl CompassOctant {
    const ALL: [CompassOctant; 8] = [
        CompassOctant::N,
        CompassOctant::NE,
        CompassOctant::E,
        CompassOctant::SE,
        CompassOctant::S,
        CompassOctant::SW,
        CompassOctant::W,
        CompassOctant::NW,
    ];

    /// Nearest octant to a bearing in degrees. A non-finite bearing maps to `N`;
    /// use [`wind_vector`] only with finite components.
    pub fn from_degrees(degrees: f64) -> Self {
        let index = (degrees / 45.0).round() as i64;
        Self::ALL[index.rem_euclid(8) as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompassOctant::N => "N",
            CompassOctant::NE => "NE",
            CompassOctant::E => "E",
            CompassOctant::SE => "SE",
            CompassOctant::S => "S",
            CompassOctant::SW => "SW",
            CompassOctant::W => "W",
            CompassOctant::NW => "NW",
        }
    }
}

impl fmt::Display for CompassOctant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wind speed and the octant it blows from.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WindReading {
    pub speed_kmh: f64,
    pub direction: CompassOctant,
}

/// Convert wind vector components into speed (km/h) and source octant.
///
/// ```
/// use surf_report_lib::compass::{wind_vector, CompassOctant};
///
/// // Wind blowing towards the south comes from the north
/// let reading = wind_vector(0.0, -5.0);
/// assert!((reading.speed_kmh - 18.0).abs() < 1e-9);
/// assert_eq!(reading.direction, CompassOctant::N);
/// ```
pub fn wind_vector(u: f64, v: f64) -> WindReading {
    let speed = (u * u + v * v).sqrt();
    let mut direction = (270.0 - v.atan2(u).to_degrees()) % 360.0;
    if direction < 0.0 {
        direction += 360.0;
    }

    WindReading {
        speed_kmh: speed * MS_TO_KMH,
        direction: CompassOctant::from_degrees(direction),
    }
}

/// Map a bearing to one of 16 compass points, or `"N/A"` when there is none.
pub fn angle_to_compass16(degrees: Option<f64>) -> &'static str {
    match degrees {
        None => NOT_AVAILABLE,
        Some(deg) if !deg.is_finite() => NOT_AVAILABLE,
        Some(deg) => {
            let index = (deg / 22.5).round() as i64;
            COMPASS_16[index.rem_euclid(16) as usize]
        }
    }
}

pub fn gust_speed_kmh(gust_ms: f64) -> f64 {
    gust_ms * MS_TO_KMH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn northerly_wind_from_negative_v() {
        let reading = wind_vector(0.0, -5.0);
        assert!((reading.speed_kmh - 18.0).abs() < 1e-9);
        assert_eq!(reading.direction.as_str(), "N");
    }

    #[test]
    fn westerly_wind_from_positive_u() {
        assert_eq!(wind_vector(5.0, 0.0).direction, CompassOctant::W);
        assert_eq!(wind_vector(-5.0, 0.0).direction, CompassOctant::E);
        assert_eq!(wind_vector(0.0, 5.0).direction, CompassOctant::S);
        assert_eq!(wind_vector(-3.0, -3.0).direction, CompassOctant::NE);
    }

    #[test]
    fn calm_wind_is_zero_speed() {
        let reading = wind_vector(0.0, 0.0);
        assert_eq!(reading.speed_kmh, 0.0);
        // atan2(0, 0) = 0 -> 270 degrees
        assert_eq!(reading.direction, CompassOctant::W);
    }

    #[test]
    fn speed_is_never_negative() {
        for &(u, v) in &[(-7.2, -1.1), (3.0, -4.0), (-0.01, 12.5), (100.0, 100.0)] {
            let reading = wind_vector(u, v);
            assert!(reading.speed_kmh >= 0.0, "speed for ({u}, {v})");
        }
    }

    #[test]
    fn compass16_handles_missing_and_wraparound() {
        assert_eq!(angle_to_compass16(None), "N/A");
        assert_eq!(angle_to_compass16(Some(0.0)), "N");
        assert_eq!(angle_to_compass16(Some(360.0)), "N");
        assert_eq!(angle_to_compass16(Some(22.5)), "NNE");
        assert_eq!(angle_to_compass16(Some(135.0)), "SE");
        assert_eq!(angle_to_compass16(Some(200.0)), "SSW");
        assert_eq!(angle_to_compass16(Some(350.0)), "N");
    }

    #[test]
    fn gust_converts_to_kmh() {
        assert!((gust_speed_kmh(10.0) - 36.0).abs() < 1e-9);
        assert_eq!(gust_speed_kmh(0.0), 0.0);
    }

    #[test]
    fn non_finite_inputs_never_become_a_bearing() {
        assert_eq!(angle_to_compass16(Some(f64::NAN)), "N/A");
        assert_eq!(angle_to_compass16(Some(f64::INFINITY)), "N/A");
        assert_eq!(angle_to_compass16(Some(f64::NEG_INFINITY)), "N/A");

        assert!(wind_vector(f64::NAN, 1.0).speed_kmh.is_nan());
        assert!(gust_speed_kmh(f64::NAN).is_nan());
    }
}
