//! historias-client — Access to the historias backend.
//!
//! Endpoints:
//!   GET  /historiales  — clinical records
//!   GET  /metrics      — extraction metric samples
//!   POST /pacientes    — save a record
//!   POST /feedback     — correction feedback (x-api-key)

pub mod backend;
pub mod load;

pub use backend::{HistoriasBackend, HttpBackend};
pub use load::load_dashboard;
