//! pulseboard-dashboard — the Pulseboard dashboard client.
//!
//! Polls the metrics API, aggregates the latest page client-side, and
//! serves it as server-rendered HTML with HTMX partials. The dashboard
//! also instruments itself by posting synthetic events back to the API.
//!
//! # Architecture
//!
//! ```text
//! Dashboard
//!   ├── Poller (fixed-interval fetch → DashboardModel, sequence-guarded)
//!   ├── Tracker (page_view / button_click / conversion)
//!   │   └── ClickSubscription (explicit click consumer with teardown)
//!   └── Router (askama pages + HTMX actions)
//!         └── ApiClient (hyper) → /metrics API
//! ```
//!
//! # Routes
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /dashboard` | Full page |
//! | `GET /dashboard/panel` | Counters, charts, and table partial |
//! | `GET /dashboard/form/pair` | Blank key/value row |
//! | `POST /dashboard/metrics` | Submit the metric form |
//! | `POST /dashboard/metrics/{id}/delete` | Delete a metric |
//! | `POST /dashboard/track/click` | Click instrumentation, returns the panel |
//! | `POST /dashboard/track/conversion` | Conversion instrumentation, returns the panel |

pub mod actions;
pub mod client;
pub mod form;
pub mod pages;
pub mod poller;
pub mod tracker;
pub mod views;

use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use tokio::task::JoinHandle;
use tracing::info;

pub use client::{ApiClient, ClientError, ClientResult, MetricDraft};
pub use form::{FormError, MetricForm};
pub use poller::{DEFAULT_POLL_INTERVAL, Poller};
pub use tracker::{ClickEvent, ClickSender, ClickSubscription, Tracker};
pub use views::DashboardModel;

/// Path the dashboard router is expected to be nested under.
pub const MOUNT_PATH: &str = "/dashboard";

/// Shared state for dashboard handlers.
#[derive(Clone)]
pub struct DashboardState {
    pub client: ApiClient,
    pub poller: Poller,
    pub tracker: Tracker,
    pub clicks: ClickSender,
}

/// Build the dashboard router.
pub fn dashboard_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(pages::dashboard))
        .route("/panel", get(pages::panel))
        .route("/form/pair", get(pages::pair_row))
        .route("/metrics", post(actions::create_metric))
        .route("/metrics/{id}/delete", post(actions::delete_metric))
        .route("/track/click", post(actions::track_click))
        .route("/track/conversion", post(actions::track_conversion))
        .with_state(state)
}

/// A running dashboard: poll loop, click subscription, and handler state.
pub struct Dashboard {
    state: DashboardState,
    poll_task: JoinHandle<()>,
    clicks: ClickSubscription,
}

impl Dashboard {
    /// Start polling and click tracking against the API at `client`.
    pub fn start(client: ApiClient, poll_interval: Duration) -> Self {
        let poller = Poller::new(client.clone(), poll_interval);
        let poll_task = poller.spawn();
        let tracker = Tracker::new(client.clone(), poller.clone());
        let clicks = tracker.subscribe_clicks();

        let state = DashboardState {
            client,
            poller,
            tracker,
            clicks: clicks.sender(),
        };
        info!(api = %state.client.address(), "dashboard started");

        Self {
            state,
            poll_task,
            clicks,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn router(&self) -> Router {
        dashboard_router(self.state.clone())
    }

    /// Stop the poll timer and tear down click tracking.
    pub async fn stop(self) {
        self.state.poller.shutdown();
        self.clicks.unsubscribe();
        let _ = self.poll_task.await;
        info!("dashboard stopped");
    }
}
