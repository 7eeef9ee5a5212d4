use crate::core::error::FetchError;
use crate::core::models::{PollConfig, PollSnapshot, ResourceKey};
use crate::transport::{CancelRegistry, Fetcher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Snapshot plus the generation of the run that is allowed to mutate it.
/// Both live under one lock so a generation bump and the outcomes it
/// invalidates can never interleave.
struct PollerState<T> {
    snapshot: PollSnapshot<T>,
    generation: u64,
}

/// One poll run: the key it was started for, the generation that gates
/// its outcomes, and the admission flag bounding it to a single
/// outstanding fetch.
struct Run {
    generation: u64,
    key: ResourceKey,
    in_flight: AtomicBool,
}

struct ActiveRun {
    run: Arc<Run>,
    config: PollConfig,
    timer: JoinHandle<()>,
}

/// Periodic resource-polling controller.
///
/// Owns a repeating timer and at most one in-flight fetch, and exposes
/// the latest settled result as a `{data, loading, error}` snapshot.
/// Lifecycle is driven by the host through [`Poller::start`],
/// [`Poller::on_resource_change`] and [`Poller::stop`]; everything else
/// is internal.
///
/// Stale completions are suppressed twice over: `stop()` cancels
/// outstanding fetches through the [`CancelRegistry`], and every settled
/// outcome is checked against the current run generation under the state
/// lock before it may touch the snapshot. Once `stop()` returns, no
/// previously issued fetch can mutate the snapshot even if the transport
/// delivered its result anyway.
pub struct Poller<F: Fetcher> {
    fetcher: Arc<F>,
    registry: CancelRegistry,
    state: Arc<RwLock<PollerState<F::Output>>>,
    active: Mutex<Option<ActiveRun>>,
}

impl<F: Fetcher + 'static> Poller<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self::with_registry(fetcher, CancelRegistry::new())
    }

    pub fn with_registry(fetcher: Arc<F>, registry: CancelRegistry) -> Self {
        Self {
            fetcher,
            registry,
            state: Arc::new(RwLock::new(PollerState {
                snapshot: PollSnapshot::initial(),
                generation: 0,
            })),
            active: Mutex::new(None),
        }
    }

    /// Begin polling `key`: reset the snapshot, fetch immediately, then
    /// keep fetching every `config.interval`.
    ///
    /// The host is expected to call `stop()` first when a run is already
    /// active; if it does not, the previous run is stopped here so its
    /// timer and fetches cannot outlive their generation.
    pub async fn start(&self, key: ResourceKey, config: PollConfig) {
        let mut active = self.active.lock().await;
        if active.is_some() {
            tracing::warn!(%key, "start called while a poll run is active, replacing it");
        }
        self.teardown(&mut active).await;

        let generation = {
            let mut state = self.state.write().await;
            state.snapshot = PollSnapshot::initial();
            state.generation += 1;
            state.generation
        };

        let run = Arc::new(Run {
            generation,
            key,
            in_flight: AtomicBool::new(false),
        });

        tracing::info!(
            key = %run.key,
            generation,
            interval_ms = config.interval.as_millis() as u64,
            "Starting poll run"
        );

        let timer = tokio::spawn(Self::run_timer(
            Arc::clone(&self.fetcher),
            self.registry.clone(),
            Arc::clone(&self.state),
            Arc::clone(&run),
            config,
        ));

        *active = Some(ActiveRun { run, config, timer });
    }

    /// Switch to a new resource identity: stop, then start for the new
    /// key with the active run's config. An in-flight response for the
    /// old key must never populate state observed for the new one, so
    /// the stop is a correctness requirement, not an optimization.
    pub async fn on_resource_change(&self, new_key: ResourceKey) {
        let config = {
            let active = self.active.lock().await;
            active.as_ref().map(|a| a.config).unwrap_or_default()
        };
        tracing::info!(key = %new_key, "Polled resource changed");
        self.stop().await;
        self.start(new_key, config).await;
    }

    /// Stop polling. Idempotent and callable from any state: the timer
    /// is released, outstanding fetches are canceled, and the current
    /// generation is invalidated so nothing already in flight can write
    /// to the snapshot after this returns.
    pub async fn stop(&self) {
        let mut active = self.active.lock().await;
        self.teardown(&mut active).await;
    }

    /// Read-only projection of the current state.
    pub async fn snapshot(&self) -> PollSnapshot<F::Output> {
        self.state.read().await.snapshot.clone()
    }

    async fn teardown(&self, active: &mut Option<ActiveRun>) {
        if let Some(prev) = active.take() {
            prev.timer.abort();
            // Bump under the state lock: outcome application holds the
            // same lock, so after this block no outcome from the old
            // run can pass its generation check.
            let mut state = self.state.write().await;
            state.generation += 1;
            tracing::debug!(key = %prev.run.key, "Stopped poll run");
        }
        self.registry.cancel_all();
    }

    async fn run_timer(
        fetcher: Arc<F>,
        registry: CancelRegistry,
        state: Arc<RwLock<PollerState<F::Output>>>,
        run: Arc<Run>,
        config: PollConfig,
    ) {
        // The first tick fires immediately, which doubles as the fetch
        // issued on start.
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            Self::run_fetch_cycle(&fetcher, &registry, &state, &run);
        }
    }

    /// One fetch cycle. Ticks arriving while a fetch is outstanding are
    /// dropped, not queued: the in-flight flag bounds this poller to one
    /// concurrent request and sheds load under slow backends.
    fn run_fetch_cycle(
        fetcher: &Arc<F>,
        registry: &CancelRegistry,
        state: &Arc<RwLock<PollerState<F::Output>>>,
        run: &Arc<Run>,
    ) {
        if run.in_flight.swap(true, Ordering::SeqCst) {
            tracing::trace!(key = %run.key, "Fetch still in flight, dropping tick");
            return;
        }

        let fetcher = Arc::clone(fetcher);
        let registry = registry.clone();
        let state = Arc::clone(state);
        let run = Arc::clone(run);
        tokio::spawn(async move {
            let outcome = registry.issue(fetcher.issue(&run.key)).await;
            Self::apply_outcome(&state, &run, outcome).await;
            run.in_flight.store(false, Ordering::SeqCst);
        });
    }

    /// Apply one settled outcome as a single snapshot transition.
    async fn apply_outcome(
        state: &Arc<RwLock<PollerState<F::Output>>>,
        run: &Run,
        outcome: Result<F::Output, FetchError>,
    ) {
        let mut state = state.write().await;
        if state.generation != run.generation {
            tracing::debug!(key = %run.key, "Dropping outcome from a superseded run");
            return;
        }

        match outcome {
            Ok(data) => {
                state.snapshot.data = Some(data);
                state.snapshot.loading = false;
                state.snapshot.error.clear();
            }
            Err(FetchError::Canceled) => {
                tracing::debug!(key = %run.key, "Fetch canceled");
            }
            Err(err @ FetchError::Failed { .. }) => {
                tracing::warn!(key = %run.key, error = %err, "Fetch failed");
                state.snapshot.error = err.to_string();
                state.snapshot.loading = false;
            }
        }
    }
}

impl<F: Fetcher> Drop for Poller<F> {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.try_lock() {
            if let Some(prev) = active.take() {
                prev.timer.abort();
            }
        }
        self.registry.cancel_all();
    }
}
