//! HTTP handlers for all web routes.

pub mod historias;
pub mod detalle;
pub mod feedback;
pub mod metricas;
pub mod api;
