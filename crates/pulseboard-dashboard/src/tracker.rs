//! Synthetic instrumentation events.
//!
//! The dashboard records its own usage through the same create endpoint
//! users submit to: a `page_view` when it is opened, a `button_click` for
//! each click, and a `conversion` from a dedicated button. Each recorded
//! event triggers an immediate refresh. Failures are swallowed: they are
//! logged at debug level and never retried or shown.
//!
//! Clicks flow through an explicit [`ClickSubscription`] that owns its
//! consumer task; dropping or unsubscribing it stops click tracking.

use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::client::{ApiClient, MetricDraft};
use crate::poller::Poller;
use crate::views::{BUTTON_CLICK, CONVERSION, PAGE_VIEW};

/// Buffered clicks before new ones are dropped.
const CLICK_BUFFER: usize = 256;

/// A click on some element of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClickEvent {
    /// Tag name of the clicked element, e.g. `BUTTON`.
    pub tag: String,
    /// Element id, if it has one.
    #[serde(default)]
    pub id: Option<String>,
}

impl ClickEvent {
    fn to_draft(&self) -> MetricDraft {
        let draft = MetricDraft::new(BUTTON_CLICK, 1.0).with("tag", self.tag.as_str());
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => draft.with("id", id),
            _ => draft,
        }
    }
}

/// Records synthetic events and refreshes the dashboard after each one.
#[derive(Clone)]
pub struct Tracker {
    client: ApiClient,
    poller: Poller,
}

impl Tracker {
    pub fn new(client: ApiClient, poller: Poller) -> Self {
        Self { client, poller }
    }

    pub async fn page_view(&self, path: &str) -> bool {
        self.record(MetricDraft::new(PAGE_VIEW, 1.0).with("path", path))
            .await
    }

    pub async fn click(&self, event: &ClickEvent) -> bool {
        self.record(event.to_draft()).await
    }

    pub async fn conversion(&self) -> bool {
        self.record(MetricDraft::new(CONVERSION, 1.0)).await
    }

    async fn record(&self, draft: MetricDraft) -> bool {
        match self.client.create_metric(&draft).await {
            Ok(metric) => {
                debug!(id = %metric.id, kind = %metric.kind, "synthetic event recorded");
                self.poller.refresh_now().await;
                true
            }
            Err(e) => {
                debug!(error = %e, kind = %draft.kind, "synthetic event dropped");
                false
            }
        }
    }

    /// Start consuming clicks. Tracking lasts as long as the subscription.
    pub fn subscribe_clicks(&self) -> ClickSubscription {
        let (tx, mut rx) = mpsc::channel::<QueuedClick>(CLICK_BUFFER);
        let tracker = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(queued) = rx.recv().await {
                let recorded = tracker.click(&queued.event).await;
                if let Some(done) = queued.done {
                    let _ = done.send(recorded);
                }
            }
            debug!("click subscription drained");
        });
        debug!("click subscription started");
        ClickSubscription {
            sender: ClickSender { tx },
            handle,
        }
    }
}

struct QueuedClick {
    event: ClickEvent,
    done: Option<oneshot::Sender<bool>>,
}

/// Cloneable entry point for feeding clicks into a subscription.
#[derive(Clone)]
pub struct ClickSender {
    tx: mpsc::Sender<QueuedClick>,
}

impl ClickSender {
    /// Queue a click. Returns false if it was dropped (buffer full or
    /// subscription gone).
    pub fn send(&self, event: ClickEvent) -> bool {
        match self.tx.try_send(QueuedClick { event, done: None }) {
            Ok(()) => true,
            Err(_) => {
                debug!("click dropped");
                false
            }
        }
    }

    /// Queue a click and wait until the subscription has recorded it and
    /// refreshed the model. Returns false if it was dropped or not recorded.
    pub async fn record(&self, event: ClickEvent) -> bool {
        let (done, recorded) = oneshot::channel();
        let queued = QueuedClick {
            event,
            done: Some(done),
        };
        if self.tx.try_send(queued).is_err() {
            debug!("click dropped");
            return false;
        }
        recorded.await.unwrap_or(false)
    }
}

/// Owns the click consumer task. Dropping it stops click tracking.
pub struct ClickSubscription {
    sender: ClickSender,
    handle: JoinHandle<()>,
}

impl ClickSubscription {
    pub fn sender(&self) -> ClickSender {
        self.sender.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop consuming clicks.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for ClickSubscription {
    fn drop(&mut self) {
        self.handle.abort();
        debug!("click subscription stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::spawn_api;
    use crate::poller::DEFAULT_POLL_INTERVAL;
    use pulseboard_store::{DEFAULT_LIMIT, DataValue};
    use std::time::Duration;

    async fn tracker() -> (Tracker, Poller, pulseboard_store::MetricStore) {
        let (client, store) = spawn_api().await;
        let poller = Poller::new(client.clone(), DEFAULT_POLL_INTERVAL);
        (Tracker::new(client, poller.clone()), poller, store)
    }

    #[test]
    fn click_payload_includes_id_only_when_present() {
        let draft = ClickEvent {
            tag: "BUTTON".into(),
            id: Some("save".into()),
        }
        .to_draft();
        assert_eq!(draft.kind, BUTTON_CLICK);
        assert_eq!(draft.data.get("tag"), Some(&DataValue::from("BUTTON")));
        assert_eq!(draft.data.get("id"), Some(&DataValue::from("save")));

        let draft = ClickEvent {
            tag: "DIV".into(),
            id: Some(String::new()),
        }
        .to_draft();
        assert!(!draft.data.contains_key("id"));
    }

    #[tokio::test]
    async fn page_view_records_path_and_refreshes() {
        let (tracker, poller, store) = tracker().await;

        assert!(tracker.page_view("/dashboard/").await);

        let stored = store.list_recent(DEFAULT_LIMIT).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind, PAGE_VIEW);
        assert_eq!(stored[0].value, 1.0);
        assert_eq!(stored[0].data.get("path"), Some(&DataValue::from("/dashboard/")));

        // The refresh already pulled the new record into the model.
        assert_eq!(poller.current().counters.page_views, 1);
    }

    #[tokio::test]
    async fn conversion_is_recorded() {
        let (tracker, poller, _store) = tracker().await;
        assert!(tracker.conversion().await);
        assert_eq!(poller.current().counters.conversions, 1);
    }

    #[tokio::test]
    async fn failures_are_swallowed() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let poller = Poller::new(client.clone(), DEFAULT_POLL_INTERVAL);
        let tracker = Tracker::new(client, poller);

        assert!(!tracker.page_view("/").await);
        assert!(!tracker.conversion().await);
    }

    #[tokio::test]
    async fn record_waits_for_the_refresh() {
        let (tracker, poller, store) = tracker().await;
        let subscription = tracker.subscribe_clicks();

        let recorded = subscription
            .sender()
            .record(ClickEvent {
                tag: "BUTTON".into(),
                id: Some("conversion".into()),
            })
            .await;
        assert!(recorded);
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(poller.current().counters.button_clicks, 1);
    }

    #[tokio::test]
    async fn record_after_unsubscribe_is_dropped() {
        let (tracker, _poller, store) = tracker().await;
        let subscription = tracker.subscribe_clicks();
        let sender = subscription.sender();
        subscription.unsubscribe();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(!sender.record(ClickEvent::default()).await);
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn subscription_records_clicks_until_dropped() {
        let (tracker, poller, store) = tracker().await;
        let subscription = tracker.subscribe_clicks();
        let sender = subscription.sender();
        let mut updates = poller.subscribe();

        assert!(sender.send(ClickEvent {
            tag: "BUTTON".into(),
            id: None,
        }));
        tokio::time::timeout(Duration::from_secs(5), updates.changed())
            .await
            .expect("click recorded")
            .unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(subscription.is_active());

        subscription.unsubscribe();
        // Let the aborted task wind down and release its receiver.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!sender.send(ClickEvent {
            tag: "BUTTON".into(),
            id: None,
        }));
        assert_eq!(store.count().unwrap(), 1);
    }
}
