//! historias-test-utils — fixtures and an in-process stub of the historias backend.

pub mod fixtures;
pub mod stub_backend;

pub use fixtures::{historiales_body, numbered_records, record, sample};
pub use stub_backend::{Received, StubBackend, StubResponse};
