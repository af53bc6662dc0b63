//! Dashboard page handlers.
//!
//! The full page and the HTMX partials it polls. Opening the page fetches
//! immediately; the partials render the poller's latest model.

use askama::Template;
use axum::extract::{OriginalUri, State};
use axum::response::Html;

use crate::DashboardState;
use crate::form::{FormView, MetricForm};
use crate::views::PanelView;

pub(crate) fn render<T: Template>(tmpl: T) -> Html<String> {
    Html(tmpl.render().unwrap_or_else(|e| {
        format!("<pre>Template error: {e}</pre>")
    }))
}

// ── Dashboard ───────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "dashboard.html")]
struct DashboardTemplate {
    poll_ms: u64,
    form: FormView,
    panel: PanelView,
}

/// GET /dashboard
///
/// Records a page view and renders from a fresh fetch.
pub async fn dashboard(
    State(state): State<DashboardState>,
    OriginalUri(uri): OriginalUri,
) -> Html<String> {
    // A recorded page view already refreshed the model.
    if !state.tracker.page_view(uri.path()).await {
        state.poller.refresh_now().await;
    }

    render(DashboardTemplate {
        poll_ms: state.poller.interval().as_millis() as u64,
        form: FormView::new(&MetricForm::default(), None),
        panel: state.poller.current().view(),
    })
}

// ── Panel ───────────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/panel.html")]
pub(crate) struct PanelPartial {
    pub(crate) panel: PanelView,
}

/// GET /dashboard/panel
pub async fn panel(State(state): State<DashboardState>) -> Html<String> {
    render(PanelPartial {
        panel: state.poller.current().view(),
    })
}

// ── Form rows ───────────────────────────────────────────────────

#[derive(Template)]
#[template(path = "_partials/pair_row.html")]
struct PairRowPartial {
    key: String,
    value: String,
}

/// GET /dashboard/form/pair
pub async fn pair_row() -> Html<String> {
    render(PairRowPartial {
        key: String::new(),
        value: String::new(),
    })
}
