//! Backend trait and the reqwest implementation.

use async_trait::async_trait;
use historias_common::models::RecordsEnvelope;
use historias_common::{BackendConfig, ClinicalRecord, DashboardError, MetricSample, Result};
use historias_view::feedback::FeedbackRequest;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait HistoriasBackend: Send + Sync {
    async fn fetch_historias(&self) -> Result<Vec<ClinicalRecord>>;
    async fn fetch_metrics(&self) -> Result<Vec<MetricSample>>;
    /// Persist a record. Returns the record as stored; its id is whatever the
    /// backend reported, or empty when it reported none.
    async fn guardar_paciente(&self, record: &ClinicalRecord) -> Result<ClinicalRecord>;
    async fn enviar_feedback(&self, feedback: &FeedbackRequest) -> Result<()>;
    fn timeout(&self) -> Duration;
}

// ── HTTP ──────────────────────────────────────────────────────────────────────

pub struct HttpBackend {
    base_url: String,
    api_key: SecretString,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let timeout = config.timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("historias-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.feedback_api_key.clone(),
            timeout,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport(&self, err: reqwest::Error) -> DashboardError {
        if err.is_timeout() {
            DashboardError::Timeout(self.timeout)
        } else {
            DashboardError::Transport(err)
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let resp = request.send().await.map_err(|e| self.transport(e))?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.transport(e))?;
        if !status.is_success() {
            let detail = error_detail(&text)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("sin detalle").to_string());
            warn!(status = status.as_u16(), %detail, "Backend returned an error");
            return Err(DashboardError::Status { status: status.as_u16(), detail });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl HistoriasBackend for HttpBackend {
    #[instrument(skip(self))]
    async fn fetch_historias(&self) -> Result<Vec<ClinicalRecord>> {
        let body = self.send(self.client.get(self.url("/historiales"))).await?;
        let envelope: RecordsEnvelope = serde_json::from_value(body)?;
        debug!(count = envelope.data.len(), "Fetched records");
        Ok(envelope.data)
    }

    #[instrument(skip(self))]
    async fn fetch_metrics(&self) -> Result<Vec<MetricSample>> {
        let body = self.send(self.client.get(self.url("/metrics"))).await?;
        let samples: Vec<MetricSample> = serde_json::from_value(body)?;
        debug!(count = samples.len(), "Fetched metric samples");
        Ok(samples)
    }

    #[instrument(skip(self, record), fields(id = %record.id))]
    async fn guardar_paciente(&self, record: &ClinicalRecord) -> Result<ClinicalRecord> {
        let body = self
            .send(self.client.post(self.url("/pacientes")).json(record))
            .await?;
        Ok(stored_record(record, body))
    }

    #[instrument(skip(self, feedback), fields(labels = feedback.labels.len()))]
    async fn enviar_feedback(&self, feedback: &FeedbackRequest) -> Result<()> {
        let request = self
            .client
            .post(self.url("/feedback"))
            .header("x-api-key", self.api_key.expose_secret())
            .json(feedback);
        let body = self.send(request).await?;
        match body.get("status").and_then(Value::as_str) {
            Some("ok") => Ok(()),
            _ => Err(DashboardError::Status {
                status: 200,
                detail: format!("respuesta inesperada del backend: {}", body),
            }),
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// `detail` of an error payload, if the body has one. Non-string details
/// (validation error lists) are returned as compact JSON.
fn error_detail(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Resolve what the backend stored: an echoed record (bare or under `data`),
/// an echoed `id`, or else the record as sent.
fn stored_record(sent: &ClinicalRecord, body: Value) -> ClinicalRecord {
    let echoed = match body.get("data") {
        Some(data @ Value::Object(_)) => Some(data.clone()),
        _ if body.get("cedula").is_some() => Some(body.clone()),
        _ => None,
    };
    if let Some(echoed) = echoed {
        match serde_json::from_value::<ClinicalRecord>(echoed) {
            Ok(mut stored) => {
                if !stored.has_id() {
                    stored.id = sent.id.clone();
                }
                return stored;
            }
            Err(e) => debug!(error = %e, "Ignoring undecodable save echo"),
        }
    }

    let mut stored = sent.clone();
    match body.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => stored.id = id.clone(),
        Some(Value::Number(n)) => stored.id = n.to_string(),
        _ => {}
    }
    stored
}
