//! Application state: the record store, the metric samples and the load lifecycle.
//!
//! Updates consume the current value and return the next one; the web layer
//! swaps the result in under its lock.

use historias_common::{ClinicalRecord, MetricSample};
use serde::Serialize;
use tracing::debug;

use crate::metrics::{self, SeriesPoint, Summary};
use crate::table::{TableView, ViewState};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub records: Vec<ClinicalRecord>,
    pub samples: Vec<MetricSample>,
}

impl Dashboard {
    pub fn new(records: Vec<ClinicalRecord>, samples: Vec<MetricSample>) -> Self {
        Self { records, samples }
    }

    pub fn table(&self, state: ViewState) -> (ViewState, TableView) {
        state.view(&self.records)
    }

    pub fn find(&self, id: &str) -> Option<&ClinicalRecord> {
        if id.trim().is_empty() {
            return None;
        }
        self.records.iter().find(|r| r.id == id)
    }

    /// Store a saved record: replaces the record with the same id, otherwise appends.
    /// Records without an id are always appended.
    pub fn with_saved(mut self, record: ClinicalRecord) -> Self {
        let existing = if record.has_id() {
            self.records.iter().position(|r| r.id == record.id)
        } else {
            None
        };
        match existing {
            Some(idx) => {
                debug!(id = %record.id, "Replacing record");
                self.records[idx] = record;
            }
            None => {
                debug!(id = %record.id, "Appending record");
                self.records.push(record);
            }
        }
        self
    }

    pub fn summary(&self) -> Summary {
        metrics::summarize(&self.samples)
    }

    pub fn series(&self) -> Vec<SeriesPoint> {
        metrics::to_series(&self.samples)
    }
}

/// Where the initial load stands. There is no partially loaded state.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    #[default]
    Loading,
    Ready(Dashboard),
    Failed(String),
}

impl LoadState {
    pub fn label(&self) -> &'static str {
        match self {
            LoadState::Loading => "loading",
            LoadState::Ready(_) => "ready",
            LoadState::Failed(_) => "failed",
        }
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        match self {
            LoadState::Ready(d) => Some(d),
            _ => None,
        }
    }

    pub fn status(&self) -> LoadStatus {
        let (records, samples) = self
            .dashboard()
            .map(|d| (d.records.len(), d.samples.len()))
            .unwrap_or((0, 0));
        LoadStatus {
            status: self.label(),
            error: match self {
                LoadState::Failed(msg) => Some(msg.clone()),
                _ => None,
            },
            records,
            samples,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadStatus {
    pub status: &'static str,
    pub error: Option<String>,
    pub records: usize,
    pub samples: usize,
}
