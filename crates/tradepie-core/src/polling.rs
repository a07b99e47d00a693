//! Adaptive polling controller.
//!
//! # Lifecycle
//!
//! ```text
//!            start()                        snapshot applied
//!   Idle ─────────────▶ initial load ─────────────────────▶ Polling(freq)
//!    ▲                     │ cache hit: render, arm Low          │  tick ─▶ fetch
//!    │                     │ all attempts failed: stay Idle      │  freq changed ─▶ re-arm
//!    └──────────── stop() ─┴─────────────────────────────────────┘
//! ```
//!
//! Every tick spawns one fetch; fetches may overlap. Each fetch carries a
//! sequence number and a completion older than the last applied one is
//! dropped, so renders never go backwards. Stopping (or restarting) bumps a
//! lifecycle generation, which also drops any response still in flight.

use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::data_source::{DataSource, TransportError};
use crate::frequency::{decide_frequency, PollingConfig, PollingFrequency};
use crate::retry::RetryConfig;
use crate::Snapshot;

/// Presentation hook invoked with every applied snapshot.
///
/// Called while the controller's state is locked so renders are strictly
/// ordered; implementations must not call back into the controller.
pub trait Renderer: Send + Sync {
    fn render(&self, snapshot: &Snapshot);
}

impl<F> Renderer for F
where
    F: Fn(&Snapshot) + Send + Sync,
{
    fn render(&self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

/// Receives every fetch failure that ends a cycle.
pub trait ErrorHandler: Send + Sync {
    fn handle_error(&self, error: &TransportError);
}

impl<F> ErrorHandler for F
where
    F: Fn(&TransportError) + Send + Sync,
{
    fn handle_error(&self, error: &TransportError) {
        self(error)
    }
}

/// Default handler: surfaces failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingErrorHandler;

impl ErrorHandler for LoggingErrorHandler {
    fn handle_error(&self, error: &TransportError) {
        tracing::warn!(code = error.code(), %error, "snapshot fetch failed");
    }
}

/// Whether a recurring timer is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollingPhase {
    Idle,
    Polling(PollingFrequency),
}

impl Display for PollingPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Polling(frequency) => write!(f, "polling({frequency})"),
        }
    }
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerStatus {
    pub phase: PollingPhase,
    pub current_frequency: PollingFrequency,
    pub current_interval: Duration,
    pub previous_interval: Option<Duration>,
    /// Timers armed since construction, re-arms included.
    pub timers_armed: u64,
    pub snapshots_applied: u64,
    /// Completions dropped because a newer fetch was already applied.
    pub stale_discarded: u64,
    pub fetch_failures: u64,
}

#[derive(Debug)]
struct PollingState {
    generation: u64,
    phase: PollingPhase,
    current: PollingFrequency,
    previous: Option<PollingFrequency>,
    timer: Option<JoinHandle<()>>,
    next_sequence: u64,
    last_applied: u64,
    timers_armed: u64,
    snapshots_applied: u64,
    stale_discarded: u64,
    fetch_failures: u64,
}

impl PollingState {
    fn new() -> Self {
        Self {
            generation: 0,
            phase: PollingPhase::Idle,
            current: PollingFrequency::Low,
            previous: None,
            timer: None,
            next_sequence: 0,
            last_applied: 0,
            timers_armed: 0,
            snapshots_applied: 0,
            stale_discarded: 0,
            fetch_failures: 0,
        }
    }

    /// Cancel the timer and invalidate everything issued so far.
    fn cancel(&mut self) -> u64 {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.phase = PollingPhase::Idle;
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}

struct ControllerShared {
    data_source: DataSource,
    renderer: Arc<dyn Renderer>,
    error_handler: Arc<dyn ErrorHandler>,
    config: PollingConfig,
    retry: RetryConfig,
    state: Mutex<PollingState>,
}

impl ControllerShared {
    fn lock(&self) -> MutexGuard<'_, PollingState> {
        self.state
            .lock()
            .expect("polling state lock is not poisoned")
    }

    fn begin_fetch(&self, generation: u64) -> Option<u64> {
        let mut state = self.lock();
        if state.generation != generation {
            return None;
        }
        state.next_sequence += 1;
        Some(state.next_sequence)
    }

    fn resume_from_cache(self: &Arc<Self>, generation: u64, snapshot: Snapshot) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        tracing::debug!(records = snapshot.len(), "rendering cached snapshot");
        self.arm(&mut state, PollingFrequency::Low);
        self.renderer.render(&snapshot);
    }

    async fn initial_load(self: Arc<Self>, generation: u64) {
        let attempts = self.retry.max_attempts();
        for attempt in 0..attempts {
            let Some(sequence) = self.begin_fetch(generation) else {
                return;
            };

            match self.data_source.fetch_snapshot().await {
                Ok(snapshot) => {
                    self.apply(generation, sequence, snapshot);
                    return;
                }
                Err(error) if attempt + 1 < attempts => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "initial fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => self.report_failure(generation, &error),
            }
        }
    }

    async fn poll_once(self: Arc<Self>, generation: u64, sequence: u64) {
        match self.data_source.fetch_snapshot().await {
            Ok(snapshot) => self.apply(generation, sequence, snapshot),
            Err(error) => self.report_failure(generation, &error),
        }
    }

    fn apply(self: &Arc<Self>, generation: u64, sequence: u64, snapshot: Snapshot) {
        let mut state = self.lock();
        if state.generation != generation {
            tracing::debug!(sequence, "dropping snapshot from a stopped lifecycle");
            return;
        }
        if sequence <= state.last_applied {
            state.stale_discarded += 1;
            tracing::debug!(
                sequence,
                last_applied = state.last_applied,
                "dropping out-of-order snapshot"
            );
            return;
        }
        state.last_applied = sequence;

        self.data_source.save_snapshot(&snapshot);

        let target = decide_frequency(&snapshot, &self.config);
        let previous = state.current;
        state.previous = Some(previous);
        state.current = target;
        if state.timer.is_none() || previous != target {
            self.arm(&mut state, target);
        }

        state.snapshots_applied += 1;
        self.renderer.render(&snapshot);
    }

    fn report_failure(&self, generation: u64, error: &TransportError) {
        {
            let mut state = self.lock();
            if state.generation != generation {
                return;
            }
            state.fetch_failures += 1;
        }
        self.error_handler.handle_error(error);
    }

    fn arm(self: &Arc<Self>, state: &mut PollingState, frequency: PollingFrequency) {
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let period = frequency.period(&self.config);
        state.current = frequency;
        state.phase = PollingPhase::Polling(frequency);
        state.timers_armed += 1;
        // First tick one full period after arming.
        let first_tick = Instant::now() + period;
        state.timer = Some(tokio::spawn(run_timer(
            Arc::downgrade(self),
            state.generation,
            first_tick,
            period,
        )));

        tracing::info!(
            %frequency,
            period_ms = period.as_millis() as u64,
            "polling timer armed"
        );
    }
}

async fn run_timer(
    shared: Weak<ControllerShared>,
    generation: u64,
    first_tick: Instant,
    period: Duration,
) {
    let mut ticker = tokio::time::interval_at(first_tick, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let Some(controller) = shared.upgrade() else {
            break;
        };
        let Some(sequence) = controller.begin_fetch(generation) else {
            break;
        };
        tracing::debug!(sequence, "polling tick");
        tokio::spawn(controller.poll_once(generation, sequence));
    }
}

/// Builder for [`PollingController`].
pub struct PollingControllerBuilder {
    data_source: DataSource,
    renderer: Arc<dyn Renderer>,
    error_handler: Arc<dyn ErrorHandler>,
    config: PollingConfig,
    retry: RetryConfig,
}

impl PollingControllerBuilder {
    pub fn config(mut self, config: PollingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn error_handler(mut self, error_handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = error_handler;
        self
    }

    pub fn build(self) -> PollingController {
        PollingController {
            shared: Arc::new(ControllerShared {
                data_source: self.data_source,
                renderer: self.renderer,
                error_handler: self.error_handler,
                config: self.config,
                retry: self.retry,
                state: Mutex::new(PollingState::new()),
            }),
        }
    }
}

/// Drives the fetch/render cycle at a volatility-dependent cadence.
///
/// Timers are tokio tasks, so [`start`](Self::start) must run inside a tokio
/// runtime. Dropping the controller stops it.
pub struct PollingController {
    shared: Arc<ControllerShared>,
}

impl PollingController {
    pub fn builder(
        data_source: DataSource,
        renderer: Arc<dyn Renderer>,
    ) -> PollingControllerBuilder {
        PollingControllerBuilder {
            data_source,
            renderer,
            error_handler: Arc::new(LoggingErrorHandler),
            config: PollingConfig::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Begin a fresh lifecycle, replacing any timer from a previous one.
    ///
    /// With a cached snapshot: render it and arm the low-frequency timer
    /// without touching the network. Otherwise: fetch (retrying per the
    /// configured [`RetryConfig`]), then apply it like any periodic snapshot.
    /// If every attempt fails, the error handler runs once and the controller
    /// stays [`PollingPhase::Idle`].
    pub async fn start(&self) -> PollingPhase {
        let generation = {
            let mut state = self.shared.lock();
            let generation = state.cancel();
            state.current = PollingFrequency::Low;
            state.previous = None;
            generation
        };

        match self.shared.data_source.load_cached_snapshot() {
            Some(snapshot) => self.shared.resume_from_cache(generation, snapshot),
            None => {
                tracing::debug!("no cached snapshot, fetching before first render");
                Arc::clone(&self.shared).initial_load(generation).await;
            }
        }

        self.phase()
    }

    /// Cancel the timer. Responses still in flight are dropped. Idempotent.
    pub fn stop(&self) {
        let mut state = self.shared.lock();
        if state.timer.is_some() {
            tracing::info!("polling stopped");
        }
        state.cancel();
    }

    pub fn phase(&self) -> PollingPhase {
        self.shared.lock().phase
    }

    pub fn status(&self) -> ControllerStatus {
        let state = self.shared.lock();
        let config = &self.shared.config;
        ControllerStatus {
            phase: state.phase,
            current_frequency: state.current,
            current_interval: state.current.period(config),
            previous_interval: state.previous.map(|previous| previous.period(config)),
            timers_armed: state.timers_armed,
            snapshots_applied: state.snapshots_applied,
            stale_discarded: state.stale_discarded,
            fetch_failures: state.fetch_failures,
        }
    }

    pub fn config(&self) -> &PollingConfig {
        &self.shared.config
    }

    pub fn data_source(&self) -> &DataSource {
        &self.shared.data_source
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{SnapshotFuture, SnapshotSource};
    use crate::store::SnapshotCache;

    struct FailingSource;

    impl SnapshotSource for FailingSource {
        fn fetch_snapshot(&self) -> SnapshotFuture<'_> {
            Box::pin(async { Err(TransportError::network("offline")) })
        }
    }

    fn controller() -> PollingController {
        let data_source = DataSource::new(Arc::new(FailingSource), SnapshotCache::in_memory());
        PollingController::builder(data_source, Arc::new(|_: &Snapshot| {}))
            .retry(RetryConfig::no_retry())
            .error_handler(Arc::new(|_: &TransportError| {}))
            .build()
    }

    #[test]
    fn new_controller_is_idle_at_low_frequency() {
        let controller = controller();
        let status = controller.status();

        assert_eq!(status.phase, PollingPhase::Idle);
        assert_eq!(status.current_frequency, PollingFrequency::Low);
        assert_eq!(status.current_interval, Duration::from_millis(15_000));
        assert_eq!(status.previous_interval, None);
        assert_eq!(status.timers_armed, 0);
    }

    #[test]
    fn stop_without_start_is_noop() {
        let controller = controller();
        controller.stop();
        controller.stop();
        assert_eq!(controller.phase(), PollingPhase::Idle);
    }

    #[tokio::test]
    async fn failed_initial_load_counts_one_failure() {
        let controller = controller();

        assert_eq!(controller.start().await, PollingPhase::Idle);
        assert_eq!(controller.status().fetch_failures, 1);
    }

    #[test]
    fn phase_display_names_frequency() {
        assert_eq!(PollingPhase::Idle.to_string(), "idle");
        assert_eq!(
            PollingPhase::Polling(PollingFrequency::High).to_string(),
            "polling(high)"
        );
    }
}
