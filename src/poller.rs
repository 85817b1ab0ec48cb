//! # Per-Spot Polling
//!
//! A [`SpotPoller`] keeps one spot's forecast fresh: it fetches immediately when
//! started, then again on a fixed interval (30 minutes by default), and publishes the
//! latest state for a consumer to read.
//!
//! ## State Machine
//! ```text
//! Idle -> Loading -> Ready
//!                 -> Failed
//! Ready/Failed -> Loading   (next tick)
//! ```
//! Ticks fire unconditionally. A fetch still in flight when the next tick fires is
//! not cancelled or coalesced, so two may overlap; whichever finishes last wins.
//!
//! ## Disposal
//! Dropping the [`PollerHandle`] aborts the timer task, so no new fetch starts. A fetch
//! already in flight runs to completion but cannot publish: every state update checks
//! the live flag under the state channel's write lock, and retiring the poller flips
//! that flag under the same lock.
//!
//! Pollers share nothing with each other. Each owns its timer and its state slot.

use crate::config::PollerConfig;
use crate::forecast_client::ForecastSource;
use crate::{MergedForecast, SurfSpot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// What a consumer sees of one poller.
#[derive(Clone, Debug)]
pub struct PollSnapshot {
    pub state: PollState,
    pub forecast: Option<Arc<MergedForecast>>,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PollSnapshot {
    fn idle() -> Self {
        PollSnapshot {
            state: PollState::Idle,
            forecast: None,
            error: None,
            updated_at: None,
        }
    }

    fn begin_loading(&mut self) {
        self.state = PollState::Loading;
        self.error = None;
    }

    fn succeed(&mut self, forecast: MergedForecast) {
        self.state = PollState::Ready;
        self.forecast = Some(Arc::new(forecast));
        self.error = None;
        self.updated_at = Some(Utc::now());
    }

    fn fail(&mut self, message: String, keep_last_good: bool) {
        self.state = PollState::Failed;
        if !keep_last_good {
            self.forecast = None;
        }
        self.error = Some(message);
        self.updated_at = Some(Utc::now());
    }
}

/// State slot shared between the handle, the timer and in-flight fetches.
struct Shared {
    live: AtomicBool,
    tx: watch::Sender<PollSnapshot>,
}

impl Shared {
    /// Apply `update` only while the poller is live. Returns whether it was applied.
    fn apply(&self, update: impl FnOnce(&mut PollSnapshot)) -> bool {
        self.tx.send_if_modified(|snapshot| {
            if !self.live.load(Ordering::Acquire) {
                return false;
            }
            update(snapshot);
            true
        })
    }

    fn retire(&self) {
        // Taken under the channel lock so no apply() can interleave
        self.tx.send_if_modified(|_| {
            self.live.store(false, Ordering::Release);
            false
        });
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Scheduler for one surf spot.
pub struct SpotPoller<S> {
    spot: SurfSpot,
    source: Arc<S>,
    interval: Duration,
    keep_last_good: bool,
}

impl<S: ForecastSource> SpotPoller<S> {
    pub fn new(spot: SurfSpot, source: Arc<S>, config: &PollerConfig) -> Self {
        SpotPoller {
            spot,
            source,
            interval: config.interval(),
            keep_last_good: config.keep_last_good,
        }
    }

    /// Start polling. The first fetch begins right away, without waiting a full interval.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> PollerHandle {
        let (tx, rx) = watch::channel(PollSnapshot::idle());
        let shared = Arc::new(Shared {
            live: AtomicBool::new(true),
            tx,
        });

        let spot_name = self.spot.name.clone();
        let timer = tokio::spawn(run_timer(self, Arc::clone(&shared)));

        PollerHandle {
            spot_name,
            shared,
            rx,
            timer: Some(timer),
        }
    }
}

async fn run_timer<S: ForecastSource>(poller: SpotPoller<S>, shared: Arc<Shared>) {
    let poller = Arc::new(poller);
    let mut ticker = tokio::time::interval(poller.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        spot = %poller.spot.name,
        interval_secs = poller.interval.as_secs(),
        "Poller started"
    );

    loop {
        // First tick completes immediately
        ticker.tick().await;
        if !shared.is_live() {
            break;
        }
        tokio::spawn(poll_once(Arc::clone(&poller), Arc::clone(&shared)));
    }
}

async fn poll_once<S: ForecastSource>(poller: Arc<SpotPoller<S>>, shared: Arc<Shared>) {
    let name = &poller.spot.name;
    if !shared.apply(PollSnapshot::begin_loading) {
        return;
    }
    debug!(spot = %name, "Fetching forecast");

    match poller.source.fetch_merged(poller.spot.coordinate).await {
        Ok(forecast) => {
            let points = forecast.ts.len();
            if shared.apply(|s| s.succeed(forecast)) {
                debug!(spot = %name, points, "Forecast ready");
            } else {
                debug!(spot = %name, "Discarding forecast for retired poller");
            }
        }
        Err(e) => {
            warn!(spot = %name, kind = ?e.kind(), "Forecast fetch failed: {}", e);
            let keep = poller.keep_last_good;
            shared.apply(|s| s.fail(e.to_string(), keep));
        }
    }
}

/// Consumer side of a running poller. Dropping it stops the poller.
pub struct PollerHandle {
    spot_name: String,
    shared: Arc<Shared>,
    rx: watch::Receiver<PollSnapshot>,
    timer: Option<JoinHandle<()>>,
}

impl PollerHandle {
    pub fn spot_name(&self) -> &str {
        &self.spot_name
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> PollSnapshot {
        self.rx.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.rx.clone()
    }

    pub fn is_live(&self) -> bool {
        self.shared.is_live()
    }

    /// Stop scheduling and refuse any later state updates.
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.shared.retire();
            timer.abort();
            debug!(spot = %self.spot_name, "Poller stopped");
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
