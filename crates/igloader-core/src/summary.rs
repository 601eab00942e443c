use serde::Serialize;

use crate::client::FailureKind;
use crate::resource::{ResourceRoute, UploadMethod};

/// A resource that could not be uploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadFailure {
    pub entry: String,
    pub route: ResourceRoute,
    pub method: UploadMethod,
    pub url: String,
    pub error: FailureKind,
}

/// Tally of one run over a pack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    /// Regular-file entries read from the pack.
    pub entries: usize,
    /// Resources a request was sent for.
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Entries that are not FHIR resources.
    pub skipped: usize,
    /// Resources left out because their type was excluded.
    pub excluded: usize,
    /// Resources never attempted because fail-fast stopped the run.
    pub not_attempted: usize,
    /// Resource types found that are not conformance types, sorted.
    pub unsupported_types: Vec<String>,
    pub failures: Vec<UploadFailure>,
}

impl UploadSummary {
    pub(crate) fn record_success(&mut self) {
        self.attempted += 1;
        self.succeeded += 1;
    }

    pub(crate) fn record_failure(&mut self, failure: UploadFailure) {
        self.attempted += 1;
        self.failed += 1;
        self.failures.push(failure);
    }

    /// True when nothing failed and nothing was cut short.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.not_attempted == 0
    }

    pub fn stopped_early(&self) -> bool {
        self.not_attempted > 0
    }
}
