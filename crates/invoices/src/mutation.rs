//! Delete workflow with user confirmation
//!
//! A delete is performed in two steps: the surface opens a confirmation
//! for a target invoice, and only an explicit confirm issues the backend
//! call. Cancelling at any point before that returns to `Closed` with no
//! request made and the cache untouched.

use log::info;

use crate::models::InvoiceId;

/// Where the delete workflow currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    Closed,
    /// Waiting for the user to confirm or cancel
    ConfirmPending(InvoiceId),
    /// The delete request is in flight
    Deleting(InvoiceId),
}

impl Default for DeletePhase {
    fn default() -> Self {
        DeletePhase::Closed
    }
}

/// Reasons a transition is rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationDenied {
    #[error("no delete confirmation is open")]
    NotPending,

    #[error("a delete is already in progress")]
    InProgress,
}

/// Confirm-then-delete state machine for a single invoice
#[derive(Debug, Default)]
pub struct DeleteFlow {
    phase: DeletePhase,
}

impl DeleteFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the confirmation for a target invoice
    pub fn request(&mut self, id: InvoiceId) -> Result<(), MutationDenied> {
        match self.phase {
            DeletePhase::Deleting(_) => Err(MutationDenied::InProgress),
            // Re-requesting retargets the confirmation
            _ => {
                self.phase = DeletePhase::ConfirmPending(id);
                Ok(())
            }
        }
    }

    /// Close the confirmation without issuing any request.
    ///
    /// Returns whether a confirmation was actually open.
    pub fn cancel(&mut self) -> bool {
        match self.phase {
            DeletePhase::ConfirmPending(_) => {
                self.phase = DeletePhase::Closed;
                true
            }
            _ => false,
        }
    }

    /// Confirm the pending delete; the returned id is what the caller
    /// must now delete against the backend.
    pub fn confirm(&mut self) -> Result<InvoiceId, MutationDenied> {
        match self.phase {
            DeletePhase::ConfirmPending(id) => {
                info!("Delete confirmed for invoice {}", id);
                self.phase = DeletePhase::Deleting(id);
                Ok(id)
            }
            DeletePhase::Deleting(_) => Err(MutationDenied::InProgress),
            DeletePhase::Closed => Err(MutationDenied::NotPending),
        }
    }

    /// Return to `Closed` after the backend call finished, either way.
    ///
    /// On failure the row is still visible, so the user can re-request
    /// the delete from it.
    pub fn settle(&mut self) {
        self.phase = DeletePhase::Closed;
    }

    pub fn phase(&self) -> DeletePhase {
        self.phase
    }

    /// The invoice awaiting confirmation, if any
    pub fn pending(&self) -> Option<InvoiceId> {
        match self.phase {
            DeletePhase::ConfirmPending(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm_path() {
        let mut flow = DeleteFlow::new();
        flow.request(InvoiceId::new(4)).unwrap();
        assert_eq!(flow.pending(), Some(InvoiceId::new(4)));

        let id = flow.confirm().unwrap();
        assert_eq!(id, InvoiceId::new(4));
        assert_eq!(flow.phase(), DeletePhase::Deleting(InvoiceId::new(4)));

        flow.settle();
        assert_eq!(flow.phase(), DeletePhase::Closed);
    }

    #[test]
    fn test_cancel_closes_without_confirm() {
        let mut flow = DeleteFlow::new();
        flow.request(InvoiceId::new(4)).unwrap();
        assert!(flow.cancel());
        assert_eq!(flow.phase(), DeletePhase::Closed);
        assert_eq!(flow.confirm(), Err(MutationDenied::NotPending));
    }

    #[test]
    fn test_cancel_when_closed_is_a_noop() {
        let mut flow = DeleteFlow::new();
        assert!(!flow.cancel());
    }

    #[test]
    fn test_request_retargets_pending_confirmation() {
        let mut flow = DeleteFlow::new();
        flow.request(InvoiceId::new(1)).unwrap();
        flow.request(InvoiceId::new(2)).unwrap();
        assert_eq!(flow.pending(), Some(InvoiceId::new(2)));
    }

    #[test]
    fn test_busy_flow_rejects_reentry() {
        let mut flow = DeleteFlow::new();
        flow.request(InvoiceId::new(1)).unwrap();
        flow.confirm().unwrap();

        assert_eq!(flow.request(InvoiceId::new(2)), Err(MutationDenied::InProgress));
        assert_eq!(flow.confirm(), Err(MutationDenied::InProgress));
    }
}
