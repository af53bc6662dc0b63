//! Dashboard action endpoints.
//!
//! HTMX form handlers that call the metrics API, refresh the model
//! immediately, and return updated HTML fragments.

use askama::Template;
use axum::extract::{Form, Path, State};
use axum::response::Html;
use tracing::{debug, warn};

use crate::DashboardState;
use crate::form::{FormView, MetricForm};
use crate::pages::{PanelPartial, render};
use crate::tracker::ClickEvent;
use crate::views::PanelView;

// ── Create ──────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/form_slot.html")]
struct FormSlotPartial {
    form: FormView,
    /// Swapped out-of-band into `#panel` after a successful create.
    panel: Option<PanelView>,
}

/// POST /dashboard/metrics
pub async fn create_metric(
    State(state): State<DashboardState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Html<String> {
    let mut form = MetricForm::from_pairs(&fields);

    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(e) => {
            return render(FormSlotPartial {
                form: FormView::new(&form, Some(e.to_string())),
                panel: None,
            });
        }
    };

    match state.client.create_metric(&draft).await {
        Ok(metric) => {
            debug!(id = %metric.id, kind = %metric.kind, "metric created from dashboard");
            state.poller.refresh_now().await;
            form.clear();
            render(FormSlotPartial {
                form: FormView::new(&form, None),
                panel: Some(state.poller.current().view()),
            })
        }
        Err(e) => {
            warn!(error = %e, "dashboard create failed");
            render(FormSlotPartial {
                form: FormView::new(&form, Some(e.to_string())),
                panel: None,
            })
        }
    }
}

// ── Delete ──────────────────────────────────────────────────────

/// POST /dashboard/metrics/:id/delete
pub async fn delete_metric(
    State(state): State<DashboardState>,
    Path(id): Path<String>,
) -> Html<String> {
    match state.client.delete_metric(&id).await {
        Ok(true) => debug!(%id, "metric deleted from dashboard"),
        Ok(false) => debug!(%id, "metric already gone"),
        Err(e) => warn!(%id, error = %e, "dashboard delete failed"),
    }
    state.poller.refresh_now().await;

    render(PanelPartial {
        panel: state.poller.current().view(),
    })
}

// ── Instrumentation ─────────────────────────────────────────────

/// POST /dashboard/track/click
///
/// Waits for the click subscription to record the event, then returns
/// the refreshed panel.
pub async fn track_click(
    State(state): State<DashboardState>,
    Form(event): Form<ClickEvent>,
) -> Html<String> {
    state.clicks.record(event).await;
    render(PanelPartial {
        panel: state.poller.current().view(),
    })
}

/// POST /dashboard/track/conversion
pub async fn track_conversion(State(state): State<DashboardState>) -> Html<String> {
    state.tracker.conversion().await;
    render(PanelPartial {
        panel: state.poller.current().view(),
    })
}
