//! historias-view — Pure view logic for the historias dashboard:
//!   - Table view engine (sort, filter, paginate)
//!   - Metrics aggregator and summary tiles
//!   - Detail/edit form validation and coercion
//!   - Feedback form
//!   - Chart geometry
//!   - Application state

pub mod table;
pub mod metrics;
pub mod form;
pub mod feedback;
pub mod chart;
pub mod state;

pub use state::{Dashboard, LoadState};
pub use table::{TableView, ViewState, PAGE_SIZE};
