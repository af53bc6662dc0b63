//! Poller — keeps the dashboard model in sync with the metrics API.
//!
//! Fetches once on start and then on a fixed interval, replacing the
//! model wholesale each time. [`Poller::refresh_now`] fetches immediately
//! outside the timer.
//!
//! Timer fetches and immediate refreshes may overlap. Every fetch takes
//! a sequence number when it is issued and a response is applied only if
//! it is newer than the one currently shown, so a slow older response
//! never overwrites a newer one. In-flight requests are never cancelled;
//! shutdown only stops the timer.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use pulseboard_store::Metric;

use crate::client::ApiClient;
use crate::views::DashboardModel;

/// Default interval between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

struct PollerInner {
    client: ApiClient,
    interval: Duration,
    model: watch::Sender<DashboardModel>,
    next_seq: AtomicU64,
    shutdown: watch::Sender<bool>,
}

/// Cloneable handle to the shared polling state.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<PollerInner>,
}

impl Poller {
    pub fn new(client: ApiClient, interval: Duration) -> Self {
        let (model, _) = watch::channel(DashboardModel::default());
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(PollerInner {
                client,
                interval,
                model,
                next_seq: AtomicU64::new(0),
                shutdown,
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// Snapshot of the current model.
    pub fn current(&self) -> DashboardModel {
        self.inner.model.borrow().clone()
    }

    /// Receiver notified each time a newer model is applied.
    pub fn subscribe(&self) -> watch::Receiver<DashboardModel> {
        self.inner.model.subscribe()
    }

    /// Fetch now and apply the result. Returns true if the model was replaced.
    pub async fn refresh_now(&self) -> bool {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        match self.inner.client.list_metrics().await {
            Ok(metrics) => self.apply(seq, metrics),
            Err(e) => {
                warn!(error = %e, seq, "metrics poll failed");
                false
            }
        }
    }

    /// Replace the model if `seq` is newer than the applied one.
    fn apply(&self, seq: u64, metrics: Vec<Metric>) -> bool {
        self.inner.model.send_if_modified(|current| {
            if seq > current.seq {
                *current = DashboardModel::build(seq, metrics);
                true
            } else {
                debug!(seq, applied = current.seq, "stale poll response discarded");
                false
            }
        })
    }

    /// Spawn the polling loop on the runtime.
    pub fn spawn(&self) -> JoinHandle<()> {
        let poller = self.clone();
        tokio::spawn(async move { poller.run().await })
    }

    /// Run the polling loop until [`Poller::shutdown`] is called.
    pub async fn run(&self) {
        let mut shutdown = self.inner.shutdown.subscribe();
        if *shutdown.borrow() {
            return;
        }

        let mut ticker = tokio::time::interval(self.inner.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            interval_ms = self.inner.interval.as_millis() as u64,
            "dashboard poller started"
        );

        loop {
            tokio::select! {
                // The first tick completes immediately: the initial load.
                _ = ticker.tick() => {
                    let poller = self.clone();
                    tokio::spawn(async move {
                        poller.refresh_now().await;
                    });
                }
                _ = shutdown.changed() => {
                    info!("dashboard poller shutting down");
                    break;
                }
            }
        }
    }

    /// Stop the polling timer.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }
}
