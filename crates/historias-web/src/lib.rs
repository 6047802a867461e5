//! historias-web — Web dashboard for Historias
//! Provides:
//!   - Paginated, filterable clinical-history table
//!   - Detail/edit form with save and correction feedback
//!   - Extraction metrics summary, per-sample table and charts
//!   - JSON API over the same views

pub mod router;
pub mod handlers;
pub mod state;
pub mod error;
pub mod templates;
