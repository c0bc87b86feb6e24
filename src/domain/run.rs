// Run domain models
use super::sample::{SampleResult, SampleStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One pass over the catalogue. For a completed run there is exactly one result
/// per catalogue segment, in catalogue order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp_utc: DateTime<Utc>,
    pub completed: bool,
    pub results: Vec<SampleResult>,
}

impl RunRecord {
    pub fn new(timestamp_utc: DateTime<Utc>) -> Self {
        Self {
            timestamp_utc,
            completed: false,
            results: Vec::new(),
        }
    }

    pub fn count_with_status(&self, status: SampleStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }
}

/// Progress snapshot published while a run is in flight.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunProgress {
    pub running: bool,
    pub run_started_at: Option<DateTime<Utc>>,
    pub index: usize,
    pub total: usize,
}
