//! Sync workflow state machine
//!
//! Drives "sync emails for a label" as a single-flight operation: a
//! second trigger while one is running is rejected, and a trigger
//! without a selected label never reaches the network. The terminal
//! outcome is retained for display until the next run replaces it.

use log::{info, warn};

use crate::api::ApiError;
use crate::models::{LabelId, SyncReport};

/// Where the workflow currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Syncing,
}

impl Default for SyncPhase {
    fn default() -> Self {
        SyncPhase::Idle
    }
}

/// Terminal result of the last run, kept until superseded
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Completed(SyncReport),
    Failed(String),
}

/// Reasons a sync trigger is rejected before any request is issued
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncDenied {
    #[error("Please select a label first")]
    NoLabelSelected,

    #[error("A sync is already running")]
    AlreadyRunning,
}

/// Single-flight sync state machine
#[derive(Debug, Default)]
pub struct SyncOrchestrator {
    phase: SyncPhase,
    last_outcome: Option<SyncOutcome>,
}

impl SyncOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate preconditions and enter `Syncing`.
    ///
    /// Returns the label to sync. The previous outcome is cleared so the
    /// surface stops showing a stale report while the run is in flight.
    pub fn begin(&mut self, label: Option<&LabelId>) -> Result<LabelId, SyncDenied> {
        if self.phase == SyncPhase::Syncing {
            return Err(SyncDenied::AlreadyRunning);
        }
        let label = label.ok_or(SyncDenied::NoLabelSelected)?;

        info!("Sync started for label {}", label.as_str());
        self.phase = SyncPhase::Syncing;
        self.last_outcome = None;
        Ok(label.clone())
    }

    /// Record the terminal outcome and return to `Idle`.
    ///
    /// Both arms re-enable the trigger; a failure leaves the caller free
    /// to retry.
    pub fn complete(&mut self, result: Result<SyncReport, ApiError>) -> &SyncOutcome {
        self.phase = SyncPhase::Idle;
        let outcome = match result {
            Ok(report) => {
                info!("Sync finished: {}", report.summary());
                SyncOutcome::Completed(report)
            }
            Err(e) => {
                warn!("Sync failed: {}", e);
                SyncOutcome::Failed(e.to_string())
            }
        };
        self.last_outcome.insert(outcome)
    }

    pub fn is_syncing(&self) -> bool {
        self.phase == SyncPhase::Syncing
    }

    pub fn phase(&self) -> &SyncPhase {
        &self.phase
    }

    /// The retained outcome of the last run, if any
    pub fn last_outcome(&self) -> Option<&SyncOutcome> {
        self.last_outcome.as_ref()
    }

    /// The retained report of the last successful run, if any
    pub fn last_report(&self) -> Option<&SyncReport> {
        match &self.last_outcome {
            Some(SyncOutcome::Completed(report)) => Some(report),
            _ => None,
        }
    }

    /// Drop the retained outcome (navigation away)
    pub fn clear_outcome(&mut self) {
        self.last_outcome = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label() -> LabelId {
        LabelId::new("Label_7")
    }

    #[test]
    fn test_requires_label() {
        let mut sync = SyncOrchestrator::new();
        assert_eq!(sync.begin(None), Err(SyncDenied::NoLabelSelected));
        assert!(!sync.is_syncing());
    }

    #[test]
    fn test_single_flight() {
        let mut sync = SyncOrchestrator::new();
        let l = label();

        sync.begin(Some(&l)).unwrap();
        assert!(sync.is_syncing());
        assert_eq!(sync.begin(Some(&l)), Err(SyncDenied::AlreadyRunning));

        sync.complete(Ok(SyncReport::default()));
        assert!(!sync.is_syncing());
        // Trigger is re-enabled after completion
        assert!(sync.begin(Some(&l)).is_ok());
    }

    #[test]
    fn test_success_replaces_previous_report() {
        let mut sync = SyncOrchestrator::new();
        let l = label();

        sync.begin(Some(&l)).unwrap();
        sync.complete(Ok(SyncReport {
            emails_processed: 1,
            invoices_extracted: 1,
            errors: vec![],
        }));

        sync.begin(Some(&l)).unwrap();
        // In-flight run shows no stale report
        assert!(sync.last_outcome().is_none());
        sync.complete(Ok(SyncReport {
            emails_processed: 9,
            invoices_extracted: 2,
            errors: vec![],
        }));

        assert_eq!(sync.last_report().unwrap().emails_processed, 9);
    }

    #[test]
    fn test_failure_is_retained_and_retryable() {
        let mut sync = SyncOrchestrator::new();
        let l = label();

        sync.begin(Some(&l)).unwrap();
        sync.complete(Err(ApiError::ServerError));

        assert!(!sync.is_syncing());
        assert!(matches!(
            sync.last_outcome(),
            Some(SyncOutcome::Failed(_))
        ));
        assert!(sync.last_report().is_none());
        assert!(sync.begin(Some(&l)).is_ok());
    }
}
