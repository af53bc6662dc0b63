//! REST API handlers.
//!
//! Each handler performs a single `MetricStore` call and returns JSON.
//! Request bodies are parsed by hand so every malformed input maps to a
//! 400 `{error}` rather than an extractor rejection.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use pulseboard_store::*;

use crate::ApiState;
use crate::error::ApiError;

#[derive(serde::Serialize)]
struct MessageBody {
    message: &'static str,
}

/// GET /metrics
pub async fn list_metrics(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let metrics = state.store.list_recent(DEFAULT_LIMIT)?;
    Ok(Json(metrics))
}

/// POST /metrics
pub async fn create_metric(
    State(state): State<ApiState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let new = parse_new_metric(&body)?;
    let metric = state.store.insert(new)?;
    Ok((StatusCode::CREATED, Json(metric)))
}

/// DELETE /metrics/:id
pub async fn delete_metric(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if state.store.delete_by_id(&id)? {
        Ok(Json(MessageBody {
            message: "Metric deleted successfully",
        }))
    } else {
        Err(ApiError::NotFound)
    }
}

// ── Body parsing ───────────────────────────────────────────────

fn invalid(msg: &str) -> ApiError {
    ApiError::Validation(msg.to_string())
}

/// Parse a create request body `{type, value, data?, timestamp?}`.
pub fn parse_new_metric(body: &[u8]) -> Result<NewMetric, ApiError> {
    let parsed: Value = if body.is_empty() {
        Value::Object(Map::new())
    } else {
        serde_json::from_slice(body)
            .map_err(|e| ApiError::Validation(format!("invalid JSON body: {e}")))?
    };
    let Value::Object(mut fields) = parsed else {
        return Err(invalid("request body must be a JSON object"));
    };

    let kind = match fields.remove("type") {
        None | Some(Value::Null) => return Err(invalid("type is required")),
        Some(Value::String(s)) if s.is_empty() => return Err(invalid("type is required")),
        Some(Value::String(s)) => s,
        Some(_) => return Err(invalid("type must be a string")),
    };

    let value = parse_value(fields.remove("value"))?;
    let data = parse_data(fields.remove("data"))?;
    let timestamp = parse_timestamp(fields.remove("timestamp"))?;

    let mut new = NewMetric::new(kind, value)?.with_data(data);
    if let Some(ts) = timestamp {
        new = new.with_timestamp(ts);
    }
    Ok(new)
}

/// Numbers pass through; numeric strings are cast.
fn parse_value(raw: Option<Value>) -> Result<f64, ApiError> {
    let value = match raw {
        None | Some(Value::Null) => return Err(invalid("value is required")),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Err(invalid("value is required"));
            }
            s.parse::<f64>().ok()
        }
        Some(_) => None,
    };
    value
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid("value must be a number"))
}

fn parse_data(raw: Option<Value>) -> Result<MetricData, ApiError> {
    match raw {
        None | Some(Value::Null) => Ok(MetricData::new()),
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(key, value)| {
                serde_json::from_value::<DataValue>(value)
                    .map(|v| (key.clone(), v))
                    .map_err(|_| {
                        ApiError::Validation(format!("data.{key} must be a string, number or boolean"))
                    })
            })
            .collect(),
        Some(_) => Err(invalid("data must be an object")),
    }
}

fn parse_timestamp(raw: Option<Value>) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|_| invalid("timestamp must be an ISO-8601 date-time")),
        Some(_) => Err(invalid("timestamp must be an ISO-8601 date-time")),
    }
}
