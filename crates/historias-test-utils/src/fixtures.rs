use chrono::{Days, NaiveDate};
use historias_common::{ClinicalRecord, MetricSample};
use serde_json::{json, Value};

/// A complete record; fields not given are filled with plausible values.
pub fn record(id: &str, nombre: &str, edad: u32, diagnostico: &str, fecha: &str) -> ClinicalRecord {
    ClinicalRecord {
        id: id.to_string(),
        cedula: format!("10{:08}", edad),
        nombre: nombre.to_string(),
        edad: Some(edad),
        diagnostico: diagnostico.to_string(),
        fecha_consulta: fecha.to_string(),
        direccion: "Calle 10 # 5-20".to_string(),
        telefono: "3001234567".to_string(),
        observaciones: "Sin novedades".to_string(),
        eps: "Sura".to_string(),
    }
}

/// `n` records `HC-001..` with one consultation per day starting 2024-01-01.
pub fn numbered_records(n: usize) -> Vec<ClinicalRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid fixture date");
    (0..n)
        .map(|i| {
            let fecha = (start + Days::new(i as u64)).format("%Y-%m-%d").to_string();
            record(
                &format!("HC-{:03}", i + 1),
                &format!("Paciente {}", i + 1),
                20 + (i as u32 % 60),
                "Control general",
                &fecha,
            )
        })
        .collect()
}

/// Decode a metric sample from loose JSON, the way the backend would send it.
pub fn sample(value: Value) -> MetricSample {
    serde_json::from_value(value).expect("fixture sample decodes")
}

/// Backend JSON for `GET /historiales`.
pub fn historiales_body(records: &[ClinicalRecord]) -> Value {
    json!({ "data": records })
}
