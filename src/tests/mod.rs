//! # Scenario Tests for Surf Tracker
//!
//! These tests drive the library through real HTTP against an in-process mock of the
//! point-forecast provider bound to `127.0.0.1:0`. No external network is used.


use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use surf_report_lib::config::UpstreamConfig;
use surf_report_lib::forecast_client::{Credential, ForecastClient};

/// What the mock answers for one model.
#[derive(Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
    Raw(&'static str),
}

/// Mock provider; records every request body it receives.
#[derive(Clone)]
pub struct MockUpstream {
    wind: Reply,
    wave: Reply,
    seen: Arc<Mutex<Vec<Value>>>,
}

impl MockUpstream {
    pub fn requests(&self) -> Vec<Value> {
        self.seen.lock().unwrap().clone()
    }
}

async fn handle(State(mock): State<MockUpstream>, Json(body): Json<Value>) -> Response {
    mock.seen.lock().unwrap().push(body.clone());
    let reply = if body["model"] == "gfsWave" {
        &mock.wave
    } else {
        &mock.wind
    };
    match reply {
        Reply::Json(v) => Json(v.clone()).into_response(),
        Reply::Status(code) => (
            StatusCode::from_u16(*code).unwrap(),
            "upstream exploded",
        )
            .into_response(),
        Reply::Raw(text) => (StatusCode::OK, *text).into_response(),
    }
}

/// Start the mock and return its endpoint URL.
pub async fn spawn_upstream(wind: Reply, wave: Reply) -> (String, MockUpstream) {
    let mock = MockUpstream {
        wind,
        wave,
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/api/point-forecast/v2", post(handle))
        .with_state(mock.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/api/point-forecast/v2"), mock)
}

pub fn client_for(endpoint: &str, strict_axis: bool) -> ForecastClient {
    let config = UpstreamConfig {
        endpoint: endpoint.to_string(),
        api_key_env: "SURF_TRACKER_TEST_UNUSED".to_string(),
        timeout_secs: 5,
        strict_axis,
    };
    ForecastClient::new(&config)
        .unwrap()
        .with_credential(Credential::Fixed("test-key".to_string()))
}

/// Wind-model payload: a northerly 18 km/h with 36 km/h gusts at every timestamp.
pub fn wind_payload(ts: &[i64]) -> Value {
    let n = ts.len();
    json!({
        "ts": ts,
        "units": {
            "wind_u-surface": "m*s-1",
            "wind_v-surface": "m*s-1",
            "gust-surface": "m*s-1"
        },
        "wind_u-surface": vec![0.0; n],
        "wind_v-surface": vec![-5.0; n],
        "gust-surface": vec![10.0; n],
        "warning": "The trial API version is for development purposes only."
    })
}

/// Wave-model payload: 1.4 m at 9 s from the SE, no secondary swell data.
pub fn wave_payload(ts: &[i64]) -> Value {
    let n = ts.len();
    json!({
        "ts": ts,
        "units": {
            "waves_height-surface": "m",
            "waves_period-surface": "s",
            "waves_direction-surface": "°",
            "wwaves_height-surface": "m",
            "swell1_height-surface": "m",
            "swell1_period-surface": "s",
            "swell1_direction-surface": "°",
            "swell2_height-surface": "m"
        },
        "waves_height-surface": vec![1.4; n],
        "waves_period-surface": vec![9.0; n],
        "waves_direction-surface": vec![135.0; n],
        "wwaves_height-surface": vec![0.3; n],
        "swell1_height-surface": vec![1.2; n],
        "swell1_period-surface": vec![11.0; n],
        "swell1_direction-surface": vec![160.0; n],
        "swell2_height-surface": vec![Value::Null; n]
    })
}
