//! # Point-Forecast Fetching
//!
//! This module handles all network operations against the point-forecast provider.
//! One refresh of a spot is two requests to the same endpoint, issued concurrently:
//!
//! - **Wind leg**: model `gfs`, parameters `wind` + `windGust`
//! - **Wave leg**: model `gfsWave`, parameters `waves`, `windWaves`, `swell1`, `swell2`
//!
//! ## Request Pipeline
//! 1. **Credential**: read the API key from the environment; fail before any I/O if unset
//! 2. **Fan out**: POST both payloads and wait for both to finish
//! 3. **Status**: a non-success status on either leg fails the whole fetch
//! 4. **Parse**: decode and validate each body (series length must match `ts`)
//! 5. **Merge**: union both payloads on the wind time axis
//!
//! There are no partial results and no retries here. The poller's fixed cadence is the
//! retry policy.
//!
//! ## Error Handling
//! All failures propagate through [`ForecastError`], which records which leg failed.
//! The HTTP boundary collapses every variant into one generic response; the detail is
//! only logged.

use crate::merge::{check_axes, merge, merge_aligned, MergeError};
use crate::{config::UpstreamConfig, Coordinate, ForecastSeries, MergedForecast, ModelResponse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, error, warn};

/// One of the two concurrent upstream requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Leg {
    Wind,
    Wave,
}

impl Leg {
    pub fn model(self) -> &'static str {
        match self {
            Leg::Wind => "gfs",
            Leg::Wave => "gfsWave",
        }
    }

    pub fn parameters(self) -> &'static [&'static str] {
        match self {
            Leg::Wind => &["wind", "windGust"],
            Leg::Wave => &["waves", "windWaves", "swell1", "swell2"],
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Leg::Wind => "wind",
            Leg::Wave => "wave",
        })
    }
}

/// Coarse failure category, used for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Upstream,
    Parse,
    Axis,
}

/// Errors that can occur while fetching and merging a forecast.
#[derive(Error, Debug)]
pub enum ForecastError {
    /// No API key configured; nothing was sent
    #[error("API key is not configured (set {var})")]
    MissingCredential { var: String },

    /// Connection, timeout or body read failure
    #[error("{leg} request failed: {source}")]
    Transport {
        leg: Leg,
        #[source]
        source: reqwest::Error,
    },

    /// Provider answered with a non-success status
    #[error("failed to fetch {leg} data: {status}")]
    Upstream { leg: Leg, status: u16 },

    /// Body was not valid JSON for a point forecast
    #[error("{leg} response is not valid JSON: {source}")]
    Parse {
        leg: Leg,
        #[source]
        source: serde_json::Error,
    },

    /// Body parsed but breaks the shared-axis invariant
    #[error("{leg} response is malformed: {reason}")]
    Malformed { leg: Leg, reason: String },

    #[error(transparent)]
    AxisMismatch(#[from] MergeError),
}

impl ForecastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::MissingCredential { .. } => ErrorKind::Config,
            ForecastError::Transport { .. } | ForecastError::Upstream { .. } => {
                ErrorKind::Upstream
            }
            ForecastError::Parse { .. } | ForecastError::Malformed { .. } => ErrorKind::Parse,
            ForecastError::AxisMismatch(_) => ErrorKind::Axis,
        }
    }

    /// The leg at fault, if the failure belongs to one.
    pub fn leg(&self) -> Option<Leg> {
        match self {
            ForecastError::Transport { leg, .. }
            | ForecastError::Upstream { leg, .. }
            | ForecastError::Parse { leg, .. }
            | ForecastError::Malformed { leg, .. } => Some(*leg),
            _ => None,
        }
    }
}

/// Anything that can produce a merged forecast for a coordinate.
///
/// [`ForecastClient`] is the real implementation; pollers are generic over this so
/// they can be driven without a network.
pub trait ForecastSource: Send + Sync + 'static {
    fn fetch_merged(
        &self,
        coordinate: Coordinate,
    ) -> impl Future<Output = Result<MergedForecast, ForecastError>> + Send;
}

/// Where the API key comes from.
#[derive(Clone)]
pub enum Credential {
    /// Read the named environment variable on every request
    Env(String),
    Fixed(String),
}

impl Credential {
    fn resolve(&self) -> Result<String, ForecastError> {
        let value = match self {
            Credential::Env(var) => std::env::var(var).ok(),
            Credential::Fixed(key) => Some(key.clone()),
        };
        value
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ForecastError::MissingCredential {
                var: match self {
                    Credential::Env(var) => var.clone(),
                    Credential::Fixed(_) => "<fixed key>".to_string(),
                },
            })
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Env(var) => write!(f, "Env({var})"),
            Credential::Fixed(_) => f.write_str("Fixed(<redacted>)"),
        }
    }
}

/// Body of one point-forecast request.
#[derive(Serialize)]
pub struct PointForecastRequest<'a> {
    pub lat: f64,
    pub lon: f64,
    pub model: &'static str,
    pub parameters: &'static [&'static str],
    pub levels: [&'static str; 1],
    pub key: &'a str,
}

impl<'a> PointForecastRequest<'a> {
    pub fn new(leg: Leg, coordinate: Coordinate, key: &'a str) -> Self {
        PointForecastRequest {
            lat: coordinate.latitude,
            lon: coordinate.longitude,
            model: leg.model(),
            parameters: leg.parameters(),
            levels: ["surface"],
            key,
        }
    }
}

impl fmt::Debug for PointForecastRequest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointForecastRequest")
            .field("lat", &self.lat)
            .field("lon", &self.lon)
            .field("model", &self.model)
            .field("parameters", &self.parameters)
            .field("levels", &self.levels)
            .finish_non_exhaustive()
    }
}

/// Provider payload before validation. Non-array fields (like the provider's
/// `warning`) land in `fields` next to the series.
#[derive(Deserialize)]
struct RawModelResponse {
    ts: Vec<i64>,
    #[serde(default)]
    units: BTreeMap<String, Option<String>>,
    #[serde(flatten)]
    fields: BTreeMap<String, serde_json::Value>,
}

/// Decode and validate one leg's response body.
pub fn parse_model_response(leg: Leg, body: &[u8]) -> Result<ModelResponse, ForecastError> {
    let raw: RawModelResponse =
        serde_json::from_slice(body).map_err(|source| ForecastError::Parse { leg, source })?;

    if raw.ts.windows(2).any(|w| w[0] >= w[1]) {
        return Err(ForecastError::Malformed {
            leg,
            reason: "timestamps are not strictly increasing".to_string(),
        });
    }

    let mut series = BTreeMap::new();
    for (key, value) in raw.fields {
        match value {
            serde_json::Value::Array(_) => {
                let samples: ForecastSeries = serde_json::from_value(value)
                    .map_err(|source| ForecastError::Parse { leg, source })?;
                if samples.len() != raw.ts.len() {
                    return Err(ForecastError::Malformed {
                        leg,
                        reason: format!(
                            "{key} has {} samples for {} timestamps",
                            samples.len(),
                            raw.ts.len()
                        ),
                    });
                }
                series.insert(key, samples);
            }
            serde_json::Value::String(text) if key == "warning" => {
                warn!(%leg, "Provider warning: {}", text);
            }
            other => debug!(%leg, key = %key, "Ignoring non-series field: {}", other),
        }
    }

    // A unit of null means the provider has no unit for that key
    let units = raw
        .units
        .into_iter()
        .filter_map(|(k, v)| v.map(|unit| (k, unit)))
        .collect();

    Ok(ModelResponse {
        ts: raw.ts,
        units,
        series,
    })
}

/// HTTP client for the point-forecast provider.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    http: reqwest::Client,
    endpoint: String,
    credential: Credential,
    strict_axis: bool,
}

impl ForecastClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(ForecastClient {
            http,
            endpoint: config.endpoint.clone(),
            credential: Credential::Env(config.api_key_env.clone()),
            strict_axis: config.strict_axis,
        })
    }

    /// Replace the credential source (tests, or keys from somewhere other than env).
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    /// Fetch both legs concurrently and merge them.
    pub async fn fetch_merged(
        &self,
        coordinate: Coordinate,
    ) -> Result<MergedForecast, ForecastError> {
        let key = self.credential.resolve()?;

        let (wind, wave) = tokio::join!(
            self.fetch_leg(Leg::Wind, coordinate, &key),
            self.fetch_leg(Leg::Wave, coordinate, &key),
        );
        // Wind is checked first so a wind failure is never hidden behind a wave result
        let wind = wind?;
        let wave = wave?;

        let merged = if self.strict_axis {
            merge_aligned(&wind, &wave)?
        } else {
            if let Err(mismatch) = check_axes(&wind, &wave) {
                warn!("Merging by index despite axis mismatch: {}", mismatch);
            }
            merge(&wind, &wave)
        };
        debug!(
            points = merged.ts.len(),
            keys = ?merged.series.keys().collect::<Vec<_>>(),
            "Merged forecast"
        );
        Ok(merged)
    }

    async fn fetch_leg(
        &self,
        leg: Leg,
        coordinate: Coordinate,
        key: &str,
    ) -> Result<ModelResponse, ForecastError> {
        let request = PointForecastRequest::new(leg, coordinate, key);
        debug!(%leg, ?request, "Requesting point forecast");

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|source| ForecastError::Transport { leg, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%leg, status = status.as_u16(), "Upstream error response: {}", body);
            return Err(ForecastError::Upstream {
                leg,
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ForecastError::Transport { leg, source })?;
        parse_model_response(leg, &body)
    }
}

impl ForecastSource for ForecastClient {
    async fn fetch_merged(&self, coordinate: Coordinate) -> Result<MergedForecast, ForecastError> {
        ForecastClient::fetch_merged(self, coordinate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bondi() -> Coordinate {
        Coordinate::new(-33.89, 151.27).unwrap()
    }

    #[test]
    fn request_payloads_match_provider_contract() {
        let wind = serde_json::to_value(PointForecastRequest::new(Leg::Wind, bondi(), "k")).unwrap();
        assert_eq!(wind["model"], "gfs");
        assert_eq!(wind["parameters"], serde_json::json!(["wind", "windGust"]));
        assert_eq!(wind["levels"], serde_json::json!(["surface"]));
        assert_eq!(wind["lat"], -33.89);
        assert_eq!(wind["lon"], 151.27);
        assert_eq!(wind["key"], "k");

        let wave = serde_json::to_value(PointForecastRequest::new(Leg::Wave, bondi(), "k")).unwrap();
        assert_eq!(wave["model"], "gfsWave");
        assert_eq!(
            wave["parameters"],
            serde_json::json!(["waves", "windWaves", "swell1", "swell2"])
        );
    }

    #[test]
    fn request_debug_redacts_key() {
        let request = PointForecastRequest::new(Leg::Wind, bondi(), "super-secret");
        assert!(!format!("{request:?}").contains("super-secret"));
        assert!(!format!("{:?}", Credential::Fixed("super-secret".into())).contains("secret"));
    }

    #[test]
    fn parse_keeps_series_and_drops_warning() {
        let body = br#"{
            "ts": [100, 200],
            "units": {"wind_u-surface": "m*s-1", "gust-surface": null},
            "wind_u-surface": [1.5, null],
            "gust-surface": [3.0, 4.0],
            "warning": "trial key"
        }"#;
        let parsed = parse_model_response(Leg::Wind, body).unwrap();
        assert_eq!(parsed.ts, vec![100, 200]);
        assert_eq!(parsed.units.len(), 1);
        assert_eq!(parsed.series.len(), 2);
        assert_eq!(parsed.series["wind_u-surface"], ForecastSeries(vec![Some(1.5), None]));
    }

    #[test]
    fn parse_rejects_misaligned_series() {
        let body = br#"{"ts": [100, 200], "units": {}, "waves_height-surface": [1.0]}"#;
        let err = parse_model_response(Leg::Wave, body).unwrap_err();
        assert!(matches!(err, ForecastError::Malformed { leg: Leg::Wave, .. }));
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn parse_rejects_unordered_axis_and_bad_json() {
        let unordered = br#"{"ts": [200, 100], "units": {}}"#;
        assert!(matches!(
            parse_model_response(Leg::Wind, unordered),
            Err(ForecastError::Malformed { .. })
        ));

        let garbage = b"<html>oops</html>";
        let err = parse_model_response(Leg::Wind, garbage).unwrap_err();
        assert!(matches!(err, ForecastError::Parse { leg: Leg::Wind, .. }));
    }

    #[tokio::test]
    async fn missing_credential_fails_before_any_request() {
        // Nothing listens on this endpoint; a request attempt would be a transport error
        let config = UpstreamConfig {
            endpoint: "http://127.0.0.1:9/unreachable".to_string(),
            api_key_env: "SURF_TRACKER_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let client = ForecastClient::new(&config).unwrap();

        let err = client.fetch_merged(bondi()).await.unwrap_err();
        assert!(matches!(err, ForecastError::MissingCredential { .. }));
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.leg(), None);

        let blank = client.with_credential(Credential::Fixed("  ".into()));
        let err = blank.fetch_merged(bondi()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
