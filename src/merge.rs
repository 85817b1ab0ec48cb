//! # Forecast Merge
//!
//! Combines the wind-model and wave-model payloads into one [`MergedForecast`].
//!
//! The wind payload owns the time axis. Both payloads come from the same model run,
//! so the wave axis is expected to be identical, but the provider does not promise
//! it. [`merge`] performs the plain positional union. [`check_axes`] lets a caller
//! refuse to merge when the axes diverge.

use crate::{MergedForecast, ModelResponse};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// The wind and wave payloads are not on the same timestamp axis
    #[error(
        "timestamp axes differ (wind {wind_len} points, wave {wave_len} points, first divergence at {first_divergence:?})"
    )]
    AxisMismatch {
        wind_len: usize,
        wave_len: usize,
        /// First index where both axes have a value and they differ
        first_divergence: Option<usize>,
    },
}

/// Union of both payloads on the wind time axis.
///
/// Units and series are overlaid wind first, then wave, so a wave key replaces a
/// wind key with the same name. The current parameter sets never collide. Neither
/// input is modified.
pub fn merge(wind: &ModelResponse, wave: &ModelResponse) -> MergedForecast {
    let mut units = wind.units.clone();
    units.extend(wave.units.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut series = wind.series.clone();
    series.extend(wave.series.iter().map(|(k, v)| (k.clone(), v.clone())));

    MergedForecast {
        ts: wind.ts.clone(),
        units,
        series,
    }
}

/// Verify both payloads share one timestamp axis.
pub fn check_axes(wind: &ModelResponse, wave: &ModelResponse) -> Result<(), MergeError> {
    if wind.ts == wave.ts {
        return Ok(());
    }

    let first_divergence = wind
        .ts
        .iter()
        .zip(wave.ts.iter())
        .position(|(a, b)| a != b);

    Err(MergeError::AxisMismatch {
        wind_len: wind.ts.len(),
        wave_len: wave.ts.len(),
        first_divergence,
    })
}

/// [`check_axes`] followed by [`merge`].
pub fn merge_aligned(
    wind: &ModelResponse,
    wave: &ModelResponse,
) -> Result<MergedForecast, MergeError> {
    check_axes(wind, wave)?;
    Ok(merge(wind, wave))
}
