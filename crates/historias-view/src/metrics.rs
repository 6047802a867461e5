//! Metrics aggregator: summary statistics and chart series over metric samples.

use historias_common::{MetricSample, Modelo};
use serde::Serialize;

/// Shown in place of `ultima_fecha` when there is nothing to report.
pub const FECHA_DESCONOCIDA: &str = "-";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub muestras: usize,
    pub tiempo: f64,
    pub accuracy: f64,
    pub recall: f64,
    pub f1: f64,
    pub longitud_texto: i64,
    /// `fecha` of the first sample; the backend is trusted to send newest first.
    pub ultima_fecha: Option<String>,
    /// Samples with at least one missing or non-numeric reading.
    pub flagged: usize,
}

impl Summary {
    pub fn fecha_display(&self) -> &str {
        self.ultima_fecha.as_deref().unwrap_or(FECHA_DESCONOCIDA)
    }
}

/// Averages over all samples. Readings that are missing or malformed count as 0
/// and still contribute to the denominator.
pub fn summarize(samples: &[MetricSample]) -> Summary {
    let n = samples.len();
    let mean = |pick: fn(&MetricSample) -> f64| -> f64 {
        if n == 0 {
            0.0
        } else {
            samples.iter().map(pick).sum::<f64>() / n as f64
        }
    };

    Summary {
        muestras: n,
        tiempo: round3(mean(|s| s.tiempo.coerced())),
        accuracy: round3(mean(|s| s.accuracy.coerced())),
        recall: round3(mean(|s| s.recall.coerced())),
        f1: round3(mean(|s| s.f1.coerced())),
        longitud_texto: mean(|s| s.longitud_texto.coerced()).round() as i64,
        ultima_fecha: samples.first().and_then(|s| s.fecha.clone()),
        flagged: samples.iter().filter(|s| s.is_flagged()).count(),
    }
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// One x-axis position of the metric charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    /// Positional label `HC-{n}`; not the sample's historia_id.
    pub name: String,
    pub tiempo: f64,
    pub accuracy: f64,
    pub recall: f64,
    pub f1: f64,
}

pub fn to_series(samples: &[MetricSample]) -> Vec<SeriesPoint> {
    samples
        .iter()
        .enumerate()
        .map(|(i, s)| SeriesPoint {
            name: format!("HC-{}", i + 1),
            tiempo: s.tiempo.coerced(),
            accuracy: s.accuracy.coerced(),
            recall: s.recall.coerced(),
            f1: s.f1.coerced(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Summary tiles and sample table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Tile {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
    pub explanation: &'static str,
}

pub const TILE_KEYS: [&str; 6] = ["tiempo", "accuracy", "recall", "f1", "longitud_texto", "fecha"];

pub fn tiles(summary: &Summary) -> Vec<Tile> {
    TILE_KEYS
        .iter()
        .filter_map(|key| {
            let (label, explanation) = tile_meta(key)?;
            let value = match *key {
                "tiempo" => format!("{:.3}s", summary.tiempo),
                "accuracy" => format!("{:.3}", summary.accuracy),
                "recall" => format!("{:.3}", summary.recall),
                "f1" => format!("{:.3}", summary.f1),
                "longitud_texto" => summary.longitud_texto.to_string(),
                _ => summary.fecha_display().to_string(),
            };
            Some(Tile { key, label, value, explanation })
        })
        .collect()
}

/// Label and explanatory text of a summary tile.
pub fn tile_meta(key: &str) -> Option<(&'static str, &'static str)> {
    let meta = match key {
        "tiempo" => (
            "Tiempo promedio",
            "Tiempo medio (en segundos) que el modelo tarda en analizar una entrada. \
             Valores bajos indican mejor rendimiento; valores altos, mayor carga de cómputo.",
        ),
        "accuracy" => (
            "Exactitud (Accuracy)",
            "Proporción de predicciones correctas sobre el total de casos. Rango 0 a 1: \
             0 significa todas incorrectas, 1 todas correctas.",
        ),
        "recall" => (
            "Exhaustividad (Recall)",
            "Capacidad del modelo para detectar correctamente los casos positivos. Rango 0 a 1.",
        ),
        "f1" => (
            "F1 Score",
            "Equilibrio entre precisión y recall. Rango 0 a 1.",
        ),
        "longitud_texto" => (
            "Longitud promedio",
            "Promedio de caracteres por historia clínica procesada.",
        ),
        "fecha" => (
            "Última actualización",
            "Fecha más reciente registrada en las métricas.",
        ),
        _ => return None,
    };
    Some(meta)
}

/// One row of the per-sample metrics table.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRow {
    pub position: usize,
    pub historia_id: String,
    pub modelo: String,
    /// CSS class highlighting the winning model.
    pub modelo_class: &'static str,
    pub tiempo: String,
    pub accuracy: String,
    pub recall: String,
    pub f1: String,
    pub longitud_texto: String,
    pub fecha: String,
    pub issues: Vec<&'static str>,
}

pub fn sample_rows(samples: &[MetricSample]) -> Vec<SampleRow> {
    samples
        .iter()
        .enumerate()
        .map(|(i, s)| SampleRow {
            position: i + 1,
            historia_id: s.historia_id.clone().unwrap_or_else(|| "No identificado".to_string()),
            modelo: s.mejor_modelo.as_ref().map(|m| m.as_str().to_string()).unwrap_or_else(|| "-".to_string()),
            modelo_class: match s.mejor_modelo {
                Some(Modelo::Spacy) => "modelo-spacy",
                Some(Modelo::Regex) => "modelo-regex",
                _ => "modelo-otro",
            },
            tiempo: s.tiempo.to_string(),
            accuracy: s.accuracy.to_string(),
            recall: s.recall.to_string(),
            f1: s.f1.to_string(),
            longitud_texto: s.longitud_texto.to_string(),
            fecha: s.fecha.clone().unwrap_or_else(|| FECHA_DESCONOCIDA.to_string()),
            issues: s.issues(),
        })
        .collect()
}
