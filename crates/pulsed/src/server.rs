//! Combined router: REST API at the root, dashboard nested under
//! [`MOUNT_PATH`].

use axum::Router;
use axum::response::Redirect;
use axum::routing::get;

use pulseboard_dashboard::{Dashboard, MOUNT_PATH};
use pulseboard_store::MetricStore;

pub fn build_app(store: MetricStore, dashboard: &Dashboard) -> Router {
    pulseboard_api::build_router(store)
        .route("/", get(|| async { Redirect::to(MOUNT_PATH) }))
        .nest(MOUNT_PATH, dashboard.router())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use pulseboard_dashboard::ApiClient;
    use tower::ServiceExt;

    fn app() -> (Router, Dashboard) {
        let store = MetricStore::open_in_memory().unwrap();
        // Nothing listens on port 9; polls fail quietly.
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        let dashboard = Dashboard::start(client, Duration::from_secs(3600));
        (build_app(store, &dashboard), dashboard)
    }

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let (router, dashboard) = app();
        let resp = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers()[header::LOCATION], "/dashboard");
        dashboard.stop().await;
    }

    #[tokio::test]
    async fn api_and_dashboard_share_one_router() {
        let (router, dashboard) = app();

        let resp = router
            .clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = router
            .oneshot(
                Request::builder()
                    .uri("/dashboard/panel")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        dashboard.stop().await;
    }
}
