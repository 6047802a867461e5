//! Detail/edit form: required-field validation and save-time coercion.

use chrono::SecondsFormat;
use historias_common::models::parse_fecha;
use historias_common::{ClinicalRecord, DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fields a user must fill before saving. `id` is shown but never user input.
pub const REQUIRED_FIELDS: [&str; 9] = [
    "cedula",
    "nombre",
    "edad",
    "diagnostico",
    "fechaConsulta",
    "direccion",
    "telefono",
    "observaciones",
    "eps",
];

/// Field name → invalid flag. Every checked field has an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, bool>);

impl FieldErrors {
    pub fn is_valid(&self) -> bool {
        !self.0.values().any(|invalid| *invalid)
    }

    pub fn is_invalid(&self, field: &str) -> bool {
        self.0.get(field).copied().unwrap_or(false)
    }

    pub fn invalid_fields(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(_, invalid)| **invalid)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn as_map(&self) -> &BTreeMap<String, bool> {
        &self.0
    }
}

/// Mark every field whose trimmed value is empty.
pub fn validate<'a>(fields: impl IntoIterator<Item = (&'a str, &'a str)>) -> FieldErrors {
    FieldErrors(
        fields
            .into_iter()
            .map(|(name, value)| (name.to_string(), value.trim().is_empty()))
            .collect(),
    )
}

/// Raw form values, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordForm {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub cedula: String,
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub edad: String,
    #[serde(default)]
    pub diagnostico: String,
    #[serde(rename = "fechaConsulta", default)]
    pub fecha_consulta: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub observaciones: String,
    #[serde(default)]
    pub eps: String,
}

impl From<&ClinicalRecord> for RecordForm {
    fn from(record: &ClinicalRecord) -> Self {
        // date inputs want YYYY-MM-DD
        let fecha_consulta = match record.consulted_at() {
            Some(at) => at.format("%Y-%m-%d").to_string(),
            None => record.fecha_consulta.clone(),
        };
        Self {
            id: record.id.clone(),
            cedula: record.cedula.clone(),
            nombre: record.nombre.clone(),
            edad: record.edad_display(),
            diagnostico: record.diagnostico.clone(),
            fecha_consulta,
            direccion: record.direccion.clone(),
            telefono: record.telefono.clone(),
            observaciones: record.observaciones.clone(),
            eps: record.eps.clone(),
        }
    }
}

impl RecordForm {
    /// All fields in display order, `id` first.
    pub fn fields(&self) -> [(&str, &str); 10] {
        [
            ("id", self.id.as_str()),
            ("cedula", self.cedula.as_str()),
            ("nombre", self.nombre.as_str()),
            ("edad", self.edad.as_str()),
            ("diagnostico", self.diagnostico.as_str()),
            ("fechaConsulta", self.fecha_consulta.as_str()),
            ("direccion", self.direccion.as_str()),
            ("telefono", self.telefono.as_str()),
            ("observaciones", self.observaciones.as_str()),
            ("eps", self.eps.as_str()),
        ]
    }

    pub fn validate(&self) -> FieldErrors {
        validate(
            self.fields()
                .into_iter()
                .filter(|(name, _)| REQUIRED_FIELDS.iter().any(|f| *f == *name)),
        )
    }

    /// Validate, then coerce into the record sent to the backend.
    ///
    /// `edad` becomes a non-negative integer and `fechaConsulta` a UTC timestamp
    /// with millisecond precision. Either conversion failing is an error; no
    /// partially converted record is produced.
    pub fn to_record(&self) -> Result<ClinicalRecord> {
        let errors = self.validate();
        if !errors.is_valid() {
            return Err(DashboardError::Validation(errors.invalid_fields()));
        }

        let edad = self.edad.trim().parse::<u32>().map_err(|_| DashboardError::Coercion {
            field: "edad",
            value: self.edad.clone(),
        })?;
        let fecha_consulta = coerce_timestamp(&self.fecha_consulta)?;

        Ok(ClinicalRecord {
            id: self.id.trim().to_string(),
            cedula: self.cedula.trim().to_string(),
            nombre: self.nombre.trim().to_string(),
            edad: Some(edad),
            diagnostico: self.diagnostico.trim().to_string(),
            fecha_consulta,
            direccion: self.direccion.trim().to_string(),
            telefono: self.telefono.trim().to_string(),
            observaciones: self.observaciones.trim().to_string(),
            eps: self.eps.trim().to_string(),
        })
    }
}

fn coerce_timestamp(raw: &str) -> Result<String> {
    parse_fecha(raw)
        .map(|at| at.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true))
        .ok_or_else(|| DashboardError::Coercion { field: "fechaConsulta", value: raw.to_string() })
}
