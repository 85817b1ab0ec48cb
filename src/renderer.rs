//! # Surf Report Rendering
//!
//! This module renders poller state as plain-text cards for the terminal (`--stdout`).
//! Each card mirrors what the dashboard shows for one beach:
//!
//! - **Headline**: total wave height and period, wind speed and octant
//! - **Wave details**: total waves, wind waves, swell 1 and swell 2
//! - **Hourly forecast**: the first rows of the time axis
//!
//! Every value is optional; missing ones print as `N/A` rather than zero.

use crate::compass::NOT_AVAILABLE as NA;
use crate::conditions::{DerivedSample, WaveComponent};
use crate::config::DisplayConfig;
use crate::poller::{PollSnapshot, PollState};
use crate::SurfSpot;
use chrono::{DateTime, FixedOffset, Utc};

/// Format an optional value with the given precision and unit suffix.
fn fmt_opt(value: Option<f64>, precision: usize, unit: &str) -> String {
    match value {
        Some(v) => format!("{:.*}{}", precision, v, unit),
        None => format!("{}{}", NA, unit),
    }
}

/// Local wall-clock time of an epoch-millisecond timestamp, e.g. "3:00 pm".
fn format_time(timestamp_ms: i64, offset: &FixedOffset) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_ms) {
        Some(t) => t
            .with_timezone(offset)
            .format("%-I:%M %P")
            .to_string(),
        None => NA.to_string(),
    }
}

fn wave_cell(label: &str, wave: &WaveComponent) -> String {
    format!(
        "{:<11} {:>6} {:>5} / {}",
        label,
        fmt_opt(wave.height_m, 1, "m"),
        fmt_opt(wave.period_s, 0, "s"),
        wave.compass()
    )
}

fn headline(sample: &DerivedSample) -> String {
    let mut parts = Vec::new();
    if let Some(h) = sample.waves.height_m {
        parts.push(format!("{:.1}m", h));
    }
    if let Some(p) = sample.waves.period_s {
        parts.push(format!("{:.0}s", p));
    }
    if let Some(wind) = sample.wind {
        parts.push(format!("{:.0}km/h", wind.speed_kmh));
        parts.push(wind.direction.to_string());
    }
    parts.join("  ")
}

/// Render one spot card.
pub fn render_card(spot: &SurfSpot, snapshot: &PollSnapshot, display: &DisplayConfig) -> String {
    let mut lines = vec![
        format!("── {} ──", spot.name),
        format!("View: {}", spot.view_url()),
    ];

    if snapshot.state == PollState::Loading && snapshot.forecast.is_none() {
        lines.push("Loading...".to_string());
        return finish(lines);
    }
    if let Some(err) = &snapshot.error {
        lines.push(format!("⚠ {}", err));
    }

    let forecast = snapshot.forecast.as_deref();
    let (forecast, current) = match forecast.and_then(|f| f.sample_at(0).map(|c| (f, c))) {
        Some(found) => found,
        None => {
            if snapshot.error.is_none() {
                lines.push(format!("No data available for {}", spot.name));
            }
            return finish(lines);
        }
    };

    lines.push(headline(&current));
    lines.push(String::new());
    lines.push("Wave Details".to_string());
    lines.push(format!("  {}", wave_cell("Total Waves", &current.waves)));
    lines.push(format!("  {}", wave_cell("Wind Waves", &current.wind_waves)));
    lines.push(format!("  {}", wave_cell("Swell 1", &current.swell1)));
    lines.push(format!("  {}", wave_cell("Swell 2", &current.swell2)));
    lines.push(String::new());

    let offset = display.utc_offset();
    lines.push("Hourly Forecast".to_string());
    lines.push(format!(
        "  {:<9} {:>6} {:>6} {:>9} {:>12} {:>8}",
        "Time", "Waves", "Period", "Direction", "Wind", "Gusts"
    ));
    for row in forecast.hourly(display.hourly_rows) {
        let wind = match row.wind {
            Some(w) => format!("{:.0}km/h {}", w.speed_kmh, w.direction),
            None => NA.to_string(),
        };
        lines.push(format!(
            "  {:<9} {:>6} {:>6} {:>9} {:>12} {:>8}",
            format_time(row.timestamp_ms, &offset),
            fmt_opt(row.waves.height_m, 1, "m"),
            fmt_opt(row.waves.period_s, 0, "s"),
            row.waves.compass(),
            wind,
            row.gust_kmh
                .map_or_else(|| NA.to_string(), |g| format!("{:.0}km/h", g)),
        ));
    }
    finish(lines)
}

fn finish(lines: Vec<String>) -> String {
    let mut card = lines.join("\n");
    card.push('\n');
    card
}

/// Print a card for every spot to stdout.
pub fn draw_ascii<'a>(
    cards: impl IntoIterator<Item = (&'a SurfSpot, PollSnapshot)>,
    display: &DisplayConfig,
) {
    for (spot, snapshot) in cards {
        println!("{}", render_card(spot, &snapshot, display));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{GUST, WIND_U, WIND_V};
    use crate::{Coordinate, ForecastSeries, MergedForecast};
    use std::sync::Arc;

    fn spot() -> SurfSpot {
        SurfSpot::new(
            "Bondi Beach",
            Coordinate::new(-33.89, 151.27).unwrap(),
            Some("https://bondisurfclub.com/bondi-surf-cam/"),
        )
    }

    fn snapshot(state: PollState, forecast: Option<MergedForecast>, error: Option<&str>) -> PollSnapshot {
        PollSnapshot {
            state,
            forecast: forecast.map(Arc::new),
            error: error.map(str::to_string),
            updated_at: None,
        }
    }

    fn forecast() -> MergedForecast {
        let mut f = MergedForecast {
            // 2024-01-01 00:00 and 03:00 UTC
            ts: vec![1_704_067_200_000, 1_704_078_000_000],
            ..Default::default()
        };
        let mut put = |k: &str, v: Vec<Option<f64>>| {
            f.series.insert(k.to_string(), ForecastSeries(v));
        };
        put(WIND_U, vec![Some(0.0), None]);
        put(WIND_V, vec![Some(-5.0), Some(1.0)]);
        put(GUST, vec![Some(10.0), Some(5.0)]);
        put("waves_height-surface", vec![Some(1.44), Some(1.5)]);
        put("waves_period-surface", vec![Some(9.2), Some(10.0)]);
        put("waves_direction-surface", vec![Some(135.0), None]);
        f
    }

    #[test]
    fn ready_card_shows_headline_details_and_table() {
        let card = render_card(
            &spot(),
            &snapshot(PollState::Ready, Some(forecast()), None),
            &DisplayConfig::default(),
        );

        assert!(card.contains("── Bondi Beach ──"));
        assert!(card.contains("View: https://bondisurfclub.com/bondi-surf-cam/"));
        assert!(card.contains("1.4m  9s  18km/h  N"));
        assert!(card.contains("Total Waves"));
        assert!(card.contains("N/Am"), "absent wind waves render as N/A");
        // 00:00 UTC is 10:00 am AEST
        assert!(card.contains("10:00 am"));
        assert!(card.contains("1:00 pm"));
        assert!(card.contains("18km/h N"));
        assert!(card.contains("36km/h"));
    }

    #[test]
    fn hourly_rows_are_capped() {
        let display = DisplayConfig {
            hourly_rows: 1,
            ..Default::default()
        };
        let card = render_card(&spot(), &snapshot(PollState::Ready, Some(forecast()), None), &display);
        assert!(card.contains("10:00 am"));
        assert!(!card.contains("1:00 pm"));
    }

    #[test]
    fn failed_card_shows_error_only() {
        let card = render_card(
            &spot(),
            &snapshot(PollState::Failed, None, Some("failed to fetch wind data: 500")),
            &DisplayConfig::default(),
        );
        assert!(card.contains("failed to fetch wind data: 500"));
        assert!(!card.contains("Hourly Forecast"));
        assert!(!card.contains("No data available"));
    }

    #[test]
    fn loading_and_empty_cards() {
        let loading = render_card(&spot(), &snapshot(PollState::Loading, None, None), &DisplayConfig::default());
        assert!(loading.contains("Loading..."));

        let empty = render_card(
            &spot(),
            &snapshot(PollState::Ready, Some(MergedForecast::default()), None),
            &DisplayConfig::default(),
        );
        assert!(empty.contains("No data available for Bondi Beach"));
    }

    #[test]
    fn card_sections_come_in_display_order() {
        let card = render_card(
            &spot(),
            &snapshot(PollState::Failed, Some(forecast()), Some("failed to fetch wave data: 503")),
            &DisplayConfig::default(),
        );
        let lines: Vec<&str> = card.lines().collect();

        assert_eq!(lines[0], "── Bondi Beach ──");
        assert_eq!(lines[2], "⚠ failed to fetch wave data: 503");
        assert_eq!(lines[3], "1.4m  9s  18km/h  N");
        let details = lines.iter().position(|l| *l == "Wave Details").unwrap();
        let hourly = lines.iter().position(|l| *l == "Hourly Forecast").unwrap();
        assert!(details < hourly);
        // Title, column header and one row per timestamp
        assert_eq!(lines.len(), hourly + 4);
        assert!(card.ends_with('\n'));
    }

    #[test]
    fn out_of_range_offset_prints_utc_times() {
        let display = DisplayConfig {
            utc_offset_minutes: i32::MAX,
            ..Default::default()
        };
        let card = render_card(&spot(), &snapshot(PollState::Ready, Some(forecast()), None), &display);
        assert!(card.contains("12:00 am"));
        assert!(card.contains("3:00 am"));
    }
}
