//! Wire types exchanged with the historias backend.
//! Field names follow the backend's JSON (`fechaConsulta`, `historia_id`, ...).

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Clinical record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalRecord {
    /// Backend-assigned identity (`HC-NNN`). Empty until the backend reports one.
    #[serde(default, deserialize_with = "text_or_empty", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub cedula: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub nombre: String,
    /// `None` when the backend sent no age or one that is not a non-negative integer.
    #[serde(default, deserialize_with = "lenient_age", skip_serializing_if = "Option::is_none")]
    pub edad: Option<u32>,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub diagnostico: String,
    #[serde(rename = "fechaConsulta", default, deserialize_with = "text_or_empty")]
    pub fecha_consulta: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub direccion: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub telefono: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub observaciones: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub eps: String,
}

impl ClinicalRecord {
    pub fn has_id(&self) -> bool {
        !self.id.trim().is_empty()
    }

    /// Age as shown in the table and form; empty when unknown.
    pub fn edad_display(&self) -> String {
        self.edad.map(|e| e.to_string()).unwrap_or_default()
    }

    /// Consultation date parsed for ordering; `None` when the raw value is not a date.
    pub fn consulted_at(&self) -> Option<NaiveDateTime> {
        parse_fecha(&self.fecha_consulta)
    }

    /// Localized (`dd/mm/yyyy`) consultation date, or the raw value when unparsable.
    pub fn fecha_display(&self) -> String {
        match self.consulted_at() {
            Some(at) => at.format("%d/%m/%Y").to_string(),
            None => self.fecha_consulta.clone(),
        }
    }
}

/// Envelope returned by `GET /historiales`.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordsEnvelope {
    #[serde(default)]
    pub data: Vec<ClinicalRecord>,
}

/// Parse the date forms the backend emits: `YYYY-MM-DD`, RFC 3339 and naive timestamps.
/// Offsets are normalised to UTC.
pub fn parse_fecha(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(at);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// Metric sample
// ---------------------------------------------------------------------------

/// One numeric reading of a metric sample as it arrived on the wire.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Reading {
    Value(f64),
    #[default]
    Missing,
    /// Present but not a finite number; keeps the raw text for display.
    Malformed(String),
}

impl Reading {
    /// Value used for averaging: anything that is not a number counts as 0.
    pub fn coerced(&self) -> f64 {
        match self {
            Reading::Value(v) => *v,
            Reading::Missing | Reading::Malformed(_) => 0.0,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Reading::Missing,
            Value::Number(n) => match n.as_f64() {
                Some(v) if v.is_finite() => Reading::Value(v),
                _ => Reading::Malformed(n.to_string()),
            },
            Value::String(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => Reading::Value(v),
                _ => Reading::Malformed(s),
            },
            other => Reading::Malformed(other.to_string()),
        }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Value(v) => write!(f, "{}", v),
            Reading::Missing => f.write_str("-"),
            Reading::Malformed(raw) => f.write_str(raw),
        }
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Reading::from_json)
    }
}

impl Serialize for Reading {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Reading::Value(v) => serializer.serialize_f64(*v),
            Reading::Missing => serializer.serialize_none(),
            Reading::Malformed(raw) => serializer.serialize_str(raw),
        }
    }
}

/// Extraction model reported as the best performer for a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Modelo {
    Spacy,
    Regex,
    Other(String),
}

impl From<String> for Modelo {
    fn from(s: String) -> Self {
        match s.as_str() {
            "spacy" => Modelo::Spacy,
            "regex" => Modelo::Regex,
            _ => Modelo::Other(s),
        }
    }
}

impl From<Modelo> for String {
    fn from(m: Modelo) -> Self {
        m.as_str().to_string()
    }
}

impl Modelo {
    pub fn as_str(&self) -> &str {
        match self {
            Modelo::Spacy => "spacy",
            Modelo::Regex => "regex",
            Modelo::Other(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    #[serde(default, deserialize_with = "optional_text")]
    pub historia_id: Option<String>,
    #[serde(default)]
    pub mejor_modelo: Option<Modelo>,
    #[serde(default)]
    pub tiempo: Reading,
    #[serde(default)]
    pub accuracy: Reading,
    #[serde(default)]
    pub recall: Reading,
    #[serde(default)]
    pub f1: Reading,
    #[serde(default)]
    pub longitud_texto: Reading,
    #[serde(default, deserialize_with = "optional_text")]
    pub fecha: Option<String>,
}

impl MetricSample {
    pub fn readings(&self) -> [(&'static str, &Reading); 5] {
        [
            ("tiempo", &self.tiempo),
            ("accuracy", &self.accuracy),
            ("recall", &self.recall),
            ("f1", &self.f1),
            ("longitud_texto", &self.longitud_texto),
        ]
    }

    /// Names of the readings that are missing or not numeric.
    pub fn issues(&self) -> Vec<&'static str> {
        self.readings()
            .into_iter()
            .filter(|(_, r)| !r.is_value())
            .map(|(name, _)| name)
            .collect()
    }

    pub fn is_flagged(&self) -> bool {
        self.readings().iter().any(|(_, r)| !r.is_value())
    }
}

// ---------------------------------------------------------------------------
// Lenient field decoders
// ---------------------------------------------------------------------------

fn scalar_text<E: serde::de::Error>(value: Value) -> Result<Option<String>, E> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(E::custom(format!("expected text, found {}", other))),
    }
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    scalar_text(Value::deserialize(deserializer)?).map(Option::unwrap_or_default)
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    scalar_text(Value::deserialize(deserializer)?)
}

/// Ages arrive as integers, integral floats (`34.0`) or numeric strings.
/// Anything else decodes as `None` so one bad row does not reject the envelope.
fn lenient_age<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let age = match Value::deserialize(deserializer)? {
        Value::Number(n) => match n.as_u64() {
            Some(v) => u32::try_from(v).ok(),
            None => n.as_f64().and_then(integral_age),
        },
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>().ok().or_else(|| s.parse::<f64>().ok().and_then(integral_age))
        }
        _ => None,
    };
    Ok(age)
}

fn integral_age(v: f64) -> Option<u32> {
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX) {
        Some(v as u32)
    } else {
        None
    }
}
