//! Metrics API client.
//!
//! A minimal HTTP/1.1 JSON client over hyper. Each call opens its own
//! connection and is bounded by a per-request timeout; nothing is pooled
//! or retried.

use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use pulseboard_store::{DataValue, Metric, MetricData};

/// Result type alias for API client calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors returned by [`ApiClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid API url: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("failed to encode request: {0}")]
    Encode(String),
}

/// Body of a create request: `{type, value, data}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MetricDraft {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
    pub data: MetricData,
}

impl MetricDraft {
    pub fn new(kind: impl Into<String>, value: f64) -> Self {
        Self {
            kind: kind.into(),
            value,
            data: MetricData::new(),
        }
    }

    /// Add a payload entry.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Client for the `/metrics` API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// `host:port` to connect to.
    address: String,
    /// Value of the `host` header.
    host: String,
    /// Path prefix in front of `/metrics`, without a trailing slash.
    base_path: String,
    timeout: Duration,
}

impl ApiClient {
    /// Default per-request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create a client for an API rooted at `base_url`, e.g. `http://127.0.0.1:3000`.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let uri: Uri = base_url
            .parse()
            .map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;

        match uri.scheme_str() {
            Some("http") => {}
            Some(other) => {
                return Err(ClientError::InvalidUrl(format!(
                    "{base_url}: unsupported scheme {other}"
                )));
            }
            None => {
                return Err(ClientError::InvalidUrl(format!("{base_url}: missing scheme")));
            }
        }

        let host = uri
            .host()
            .ok_or_else(|| ClientError::InvalidUrl(format!("{base_url}: missing host")))?;
        let port = uri.port_u16().unwrap_or(80);

        Ok(Self {
            address: format!("{host}:{port}"),
            host: match uri.port_u16() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            },
            base_path: uri.path().trim_end_matches('/').to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `host:port` this client connects to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// GET /metrics
    pub async fn list_metrics(&self) -> ClientResult<Vec<Metric>> {
        let (status, body) = self.send(Method::GET, "/metrics", None).await?;
        if status != StatusCode::OK {
            return Err(status_error(status, &body));
        }
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// POST /metrics
    pub async fn create_metric(&self, draft: &MetricDraft) -> ClientResult<Metric> {
        let payload = serde_json::to_vec(draft).map_err(|e| ClientError::Encode(e.to_string()))?;
        let (status, body) = self.send(Method::POST, "/metrics", Some(payload)).await?;
        if status != StatusCode::CREATED {
            return Err(status_error(status, &body));
        }
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// DELETE /metrics/:id. Returns false when the id does not exist.
    pub async fn delete_metric(&self, id: &str) -> ClientResult<bool> {
        let path = format!("/metrics/{id}");
        let (status, body) = self.send(Method::DELETE, &path, None).await?;
        match status {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(status_error(status, &body)),
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<Vec<u8>>,
    ) -> ClientResult<(StatusCode, Bytes)> {
        let uri = format!("{}{path}", self.base_path);
        debug!(%method, %uri, address = %self.address, "api request");

        tokio::time::timeout(self.timeout, self.exchange(method, &uri, payload))
            .await
            .map_err(|_| ClientError::Timeout(self.timeout))?
    }

    async fn exchange(
        &self,
        method: Method,
        uri: &str,
        payload: Option<Vec<u8>>,
    ) -> ClientResult<(StatusCode, Bytes)> {
        let stream = tokio::net::TcpStream::connect(&self.address)
            .await
            .map_err(|e| ClientError::Connect(e.to_string()))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let mut builder = http::Request::builder()
            .method(method)
            .uri(uri)
            .header("host", &self.host)
            .header("accept", "application/json")
            .header("user-agent", "pulseboard-dashboard/0.1");
        if payload.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let req = builder
            .body(Full::new(Bytes::from(payload.unwrap_or_default())))
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?
            .to_bytes();
        Ok((status, body))
    }
}

/// Build a status error, preferring the API's `{error}` message.
fn status_error(status: StatusCode, body: &[u8]) -> ClientError {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: String,
    }

    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
    ClientError::Status {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pulseboard_store::MetricStore;

    /// Serve the real API router over an in-memory store on an ephemeral port.
    pub(crate) async fn spawn_api() -> (ApiClient, MetricStore) {
        let store = MetricStore::open_in_memory().unwrap();
        let router = pulseboard_api::build_router(store.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        let client = ApiClient::new(&format!("http://{addr}")).unwrap();
        (client, store)
    }

    #[test]
    fn parses_base_url() {
        let client = ApiClient::new("http://localhost:3000/api/").unwrap();
        assert_eq!(client.address(), "localhost:3000");
        assert_eq!(client.host, "localhost:3000");
        assert_eq!(client.base_path, "/api");

        let client = ApiClient::new("http://metrics.internal").unwrap();
        assert_eq!(client.address(), "metrics.internal:80");
        assert_eq!(client.host, "metrics.internal");
        assert_eq!(client.base_path, "");
    }

    #[test]
    fn rejects_unsupported_urls() {
        assert!(matches!(
            ApiClient::new("https://example.com"),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("localhost:3000"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn draft_serializes_wire_shape() {
        let draft = MetricDraft::new("button_click", 1.0).with("tag", "BUTTON");
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "button_click", "value": 1.0, "data": {"tag": "BUTTON"}})
        );
    }

    #[test]
    fn status_error_uses_api_message() {
        let err = status_error(StatusCode::BAD_REQUEST, br#"{"error":"type is required"}"#);
        assert_eq!(err.to_string(), "API returned 400: type is required");

        let err = status_error(StatusCode::BAD_GATEWAY, b"upstream down");
        assert_eq!(err.to_string(), "API returned 502: upstream down");
    }

    #[tokio::test]
    async fn create_list_delete_against_api() {
        let (client, _store) = spawn_api().await;

        let created = client
            .create_metric(&MetricDraft::new("traffic", 5.0).with("path", "/"))
            .await
            .unwrap();
        assert_eq!(created.kind, "traffic");
        assert_eq!(created.value, 5.0);

        let listed = client.list_metrics().await.unwrap();
        assert_eq!(listed, vec![created.clone()]);

        assert!(client.delete_metric(&created.id).await.unwrap());
        assert!(!client.delete_metric(&created.id).await.unwrap());
        assert!(client.list_metrics().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejection_surfaces_status() {
        let (client, store) = spawn_api().await;

        let err = client
            .create_metric(&MetricDraft::new("", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 400, .. }));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn closed_port_fails_to_connect() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ApiClient::new(&format!("http://{addr}")).unwrap();
        let err = client.list_metrics().await.unwrap_err();
        assert!(matches!(err, ClientError::Connect(_)));
    }
}
