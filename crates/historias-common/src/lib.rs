//! historias-common — Shared types, errors and configuration used across all Historias crates.

pub mod error;
pub mod models;
pub mod config;

// Re-export commonly used types
pub use config::{BackendConfig, Config, ServerConfig};
pub use error::{DashboardError, Result};
pub use models::{ClinicalRecord, MetricSample, Modelo, Reading};
