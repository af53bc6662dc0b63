//! View types for dashboard template rendering.
//!
//! Everything here is recomputed from the last fetched page of metrics;
//! nothing is persisted. Types carry pre-formatted strings so templates
//! stay simple.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pulseboard_store::Metric;

/// Synthetic event emitted when the dashboard is opened.
pub const PAGE_VIEW: &str = "page_view";
/// Synthetic event emitted for every click on the dashboard.
pub const BUTTON_CLICK: &str = "button_click";
/// Synthetic event emitted by the conversion button.
pub const CONVERSION: &str = "conversion";

/// Types produced by instrumentation rather than the metric form.
pub const INSTRUMENTATION_TYPES: [&str; 3] = [PAGE_VIEW, BUTTON_CLICK, CONVERSION];

const PALETTE: [&str; 8] = [
    "#6366f1", "#22c55e", "#f59e0b", "#ef4444", "#06b6d4", "#a855f7", "#84cc16", "#f97316",
];

// ── Aggregation ─────────────────────────────────────────────────

/// Sum of `value` for one metric type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeTotal {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: f64,
}

/// Group by type and sum values, in order of first occurrence.
pub fn aggregate_by_type(metrics: &[Metric]) -> Vec<TypeTotal> {
    let mut totals: Vec<TypeTotal> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for m in metrics {
        match index.get(m.kind.as_str()) {
            Some(&i) => totals[i].value += m.value,
            None => {
                index.insert(&m.kind, totals.len());
                totals.push(TypeTotal {
                    kind: m.kind.clone(),
                    value: m.value,
                });
            }
        }
    }
    totals
}

/// Counts of the instrumentation event types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngagementCounters {
    pub page_views: usize,
    pub button_clicks: usize,
    pub conversions: usize,
}

impl EngagementCounters {
    pub fn from_metrics(metrics: &[Metric]) -> Self {
        let mut counters = Self::default();
        for m in metrics {
            match m.kind.as_str() {
                PAGE_VIEW => counters.page_views += 1,
                BUTTON_CLICK => counters.button_clicks += 1,
                CONVERSION => counters.conversions += 1,
                _ => {}
            }
        }
        counters
    }

    pub fn conversion_rate(&self) -> f64 {
        conversion_rate(self.conversions, self.page_views)
    }
}

/// Conversions per page view, as a percentage. Zero without page views.
pub fn conversion_rate(conversions: usize, page_views: usize) -> f64 {
    if page_views == 0 {
        return 0.0;
    }
    conversions as f64 / page_views as f64 * 100.0
}

// ── Charts ──────────────────────────────────────────────────────

pub struct BarView {
    pub label: String,
    pub value_display: String,
    pub width_percent: String,
    pub color: &'static str,
}

pub struct SliceView {
    pub label: String,
    pub color: &'static str,
    pub percent_display: String,
}

pub struct PieView {
    /// CSS `conic-gradient(...)` for the pie disc.
    pub gradient: String,
    pub slices: Vec<SliceView>,
}

/// Bar widths are relative to the largest absolute total.
pub fn bar_chart(totals: &[TypeTotal]) -> Vec<BarView> {
    let max = totals.iter().map(|t| t.value.abs()).fold(0.0, f64::max);
    totals
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let width = if max > 0.0 { t.value.abs() / max * 100.0 } else { 0.0 };
            BarView {
                label: t.kind.clone(),
                value_display: format_value(t.value),
                width_percent: format!("{width:.1}"),
                color: PALETTE[i % PALETTE.len()],
            }
        })
        .collect()
}

/// Pie slices over the positive totals only; a pie cannot show a negative share.
pub fn pie_chart(totals: &[TypeTotal]) -> PieView {
    let sum: f64 = totals.iter().map(|t| t.value.max(0.0)).sum();
    if sum <= 0.0 {
        return PieView {
            gradient: "conic-gradient(#334155 0deg 360deg)".to_string(),
            slices: Vec::new(),
        };
    }

    let mut start = 0.0;
    let mut stops = Vec::new();
    let mut slices = Vec::new();
    for (i, t) in totals.iter().enumerate() {
        if t.value <= 0.0 {
            continue;
        }
        let color = PALETTE[i % PALETTE.len()];
        let share = t.value / sum;
        let end = start + share * 360.0;
        stops.push(format!("{color} {start:.2}deg {end:.2}deg"));
        slices.push(SliceView {
            label: t.kind.clone(),
            color,
            percent_display: format!("{:.1}", share * 100.0),
        });
        start = end;
    }

    PieView {
        gradient: format!("conic-gradient({})", stops.join(", ")),
        slices,
    }
}

// ── Table ───────────────────────────────────────────────────────

pub struct TableRow {
    pub id: String,
    pub kind: String,
    pub value_display: String,
    pub timestamp_display: String,
    /// Payload as sorted key/value pairs; empty renders as a dash.
    pub data: Vec<(String, String)>,
}

/// Rows for user-defined metrics only; instrumentation types are hidden.
pub fn table_rows(metrics: &[Metric]) -> Vec<TableRow> {
    metrics
        .iter()
        .filter(|m| !INSTRUMENTATION_TYPES.contains(&m.kind.as_str()))
        .map(|m| TableRow {
            id: m.id.clone(),
            kind: m.kind.clone(),
            value_display: format_value(m.value),
            timestamp_display: format_timestamp(&m.timestamp),
            data: m
                .data
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
        })
        .collect()
}

// ── Dashboard Model ─────────────────────────────────────────────

/// Everything the dashboard renders, rebuilt wholesale from one fetch.
#[derive(Debug, Clone, Default)]
pub struct DashboardModel {
    /// Sequence number of the fetch that produced this model (0 = none yet).
    pub seq: u64,
    pub fetched_at: Option<DateTime<Utc>>,
    pub metrics: Vec<Metric>,
    pub totals: Vec<TypeTotal>,
    pub counters: EngagementCounters,
}

impl DashboardModel {
    pub fn build(seq: u64, metrics: Vec<Metric>) -> Self {
        Self {
            seq,
            fetched_at: Some(Utc::now()),
            totals: aggregate_by_type(&metrics),
            counters: EngagementCounters::from_metrics(&metrics),
            metrics,
        }
    }

    /// Render-ready view of this model.
    pub fn view(&self) -> PanelView {
        PanelView {
            record_count: self.metrics.len(),
            page_views: self.counters.page_views,
            button_clicks: self.counters.button_clicks,
            conversions: self.counters.conversions,
            conversion_rate_display: format!("{:.2}", self.counters.conversion_rate()),
            bars: bar_chart(&self.totals),
            pie: pie_chart(&self.totals),
            rows: table_rows(&self.metrics),
            updated_display: self
                .fetched_at
                .as_ref()
                .map(format_timestamp)
                .unwrap_or_else(|| "never".to_string()),
        }
    }
}

pub struct PanelView {
    pub record_count: usize,
    pub page_views: usize,
    pub button_clicks: usize,
    pub conversions: usize,
    pub conversion_rate_display: String,
    pub bars: Vec<BarView>,
    pub pie: PieView,
    pub rows: Vec<TableRow>,
    pub updated_display: String,
}

// ── Format Helpers ──────────────────────────────────────────────

/// Integers print without a fractional part.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
