use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("HTTP request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Error HTTP: {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Tiempo de espera agotado tras {0:?} esperando al backend")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Campos obligatorios vacíos: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("Valor inválido para {field}: {value:?}")]
    Coercion { field: &'static str, value: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    /// True for failures that happened talking to the backend rather than in local input.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Status { .. } | Self::Timeout(_) | Self::Decode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
