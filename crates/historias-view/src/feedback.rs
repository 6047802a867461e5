//! Correction feedback over the values of a detail form.

use historias_common::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::form::RecordForm;

/// Prefix of the form inputs carrying one label each (`label.nombre`, ...).
pub const LABEL_PREFIX: &str = "label.";

/// Body of `POST /feedback`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRequest {
    pub text: String,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackField {
    pub name: String,
    pub value: String,
    pub editable: bool,
}

/// Corrections the user reviews before submitting: the original text plus one
/// editable label per form field. The `id` label is read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackForm {
    pub text: String,
    pub fields: Vec<FeedbackField>,
}

impl FeedbackForm {
    /// Open feedback over the current form values; `text` is their pretty-printed JSON.
    pub fn from_record_form(form: &RecordForm) -> Result<Self> {
        let text = serde_json::to_string_pretty(form)?;
        let fields = form
            .fields()
            .into_iter()
            .map(|(name, value)| field(name, value))
            .collect();
        Ok(Self { text, fields })
    }

    /// Rebuild from a submitted form: a `text` entry and `label.<name>` entries, in order.
    pub fn from_submission(pairs: Vec<(String, String)>) -> Self {
        let mut text = String::new();
        let mut fields: Vec<FeedbackField> = Vec::new();
        for (key, value) in pairs {
            if key == "text" {
                text = value;
            } else if let Some(name) = key.strip_prefix(LABEL_PREFIX) {
                match fields.iter_mut().find(|f| f.name == name) {
                    Some(existing) => existing.value = value,
                    None => fields.push(field(name, &value)),
                }
            }
        }
        Self { text, fields }
    }

    pub fn request(&self) -> FeedbackRequest {
        FeedbackRequest {
            text: self.text.clone(),
            labels: self
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.value.clone()))
                .collect(),
        }
    }
}

fn field(name: &str, value: &str) -> FeedbackField {
    FeedbackField {
        name: name.to_string(),
        value: value.to_string(),
        editable: !name.eq_ignore_ascii_case("id"),
    }
}
