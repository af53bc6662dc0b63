//! The "add metric" form.
//!
//! Holds raw text as typed and turns it into a [`MetricDraft`] on submit.

use thiserror::Error;

use pulseboard_store::DataValue;

use crate::client::MetricDraft;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("type is required")]
    MissingType,

    #[error("value must be a number, got {0:?}")]
    InvalidValue(String),
}

/// Raw form state: type and value text plus ad hoc key/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricForm {
    pub kind: String,
    pub value: String,
    pub pairs: Vec<(String, String)>,
}

impl MetricForm {
    /// Build from urlencoded fields: `type`, `value`, and repeated
    /// `data_key` / `data_value` fields paired up in order.
    pub fn from_pairs(fields: &[(String, String)]) -> Self {
        let mut form = Self::default();
        let mut keys = Vec::new();
        let mut values = Vec::new();

        for (name, value) in fields {
            match name.as_str() {
                "type" => form.kind = value.clone(),
                "value" => form.value = value.clone(),
                "data_key" => keys.push(value.clone()),
                "data_value" => values.push(value.clone()),
                _ => {}
            }
        }

        // A key without a matching value field pairs with an empty value.
        values.resize(keys.len().max(values.len()), String::new());
        form.pairs = keys.into_iter().zip(values).collect();
        form
    }

    /// Validate and coerce into the request body. Pairs with a blank key are dropped.
    pub fn to_draft(&self) -> Result<MetricDraft, FormError> {
        if self.kind.is_empty() {
            return Err(FormError::MissingType);
        }
        let value = self
            .value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| FormError::InvalidValue(self.value.clone()))?;

        let mut draft = MetricDraft::new(self.kind.clone(), value);
        for (key, val) in &self.pairs {
            if key.trim().is_empty() {
                continue;
            }
            draft.data.insert(key.clone(), DataValue::Text(val.clone()));
        }
        Ok(draft)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Form state as rendered: always at least one key/value row.
pub struct FormView {
    pub kind: String,
    pub value: String,
    pub pairs: Vec<(String, String)>,
    pub error: Option<String>,
}

impl FormView {
    pub fn new(form: &MetricForm, error: Option<String>) -> Self {
        let mut pairs = form.pairs.clone();
        if pairs.is_empty() {
            pairs.push((String::new(), String::new()));
        }
        Self {
            kind: form.kind.clone(),
            value: form.value.clone(),
            pairs,
            error,
        }
    }
}
