//! In-memory backend implementation
//!
//! Deterministic stand-in for the hosted service, used by unit and
//! integration tests. Failures can be scripted per operation and every
//! mutating call is recorded for assertions.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use super::types::InvoicePage;
use super::{ApiError, Backend};
use crate::models::{ExtractionMode, Invoice, InvoiceId, Label, LabelId, SyncReport, User};

/// In-memory implementation of Backend
pub struct InMemoryBackend {
    user: RwLock<User>,
    labels: RwLock<Vec<Label>>,
    invoices: RwLock<Vec<Invoice>>,
    /// Report plus freshly extracted records for the next sync call
    next_sync: RwLock<Option<(SyncReport, Vec<Invoice>)>>,
    csv: RwLock<Vec<u8>>,
    /// When set, every credentialed call answers 401
    reject_credential: AtomicBool,
    /// Scripted one-shot failures, keyed by operation name
    fail_next: RwLock<HashMap<&'static str, ApiError>>,
    deleted: RwLock<Vec<InvoiceId>>,
    synced: RwLock<Vec<LabelId>>,
}

impl InMemoryBackend {
    /// Create a backend with one default user and no data
    pub fn new() -> Self {
        let user = User {
            id: 1,
            email: "user@example.com".to_string(),
            name: Some("Test User".to_string()),
            extraction_mode: ExtractionMode::Local,
            created_at: Utc::now(),
        };

        Self {
            user: RwLock::new(user),
            labels: RwLock::new(Vec::new()),
            invoices: RwLock::new(Vec::new()),
            next_sync: RwLock::new(None),
            csv: RwLock::new(Vec::new()),
            reject_credential: AtomicBool::new(false),
            fail_next: RwLock::new(HashMap::new()),
            deleted: RwLock::new(Vec::new()),
            synced: RwLock::new(Vec::new()),
        }
    }

    /// Replace the label list served by `list_labels`
    pub fn set_labels(&self, labels: Vec<Label>) {
        *self.labels.write().unwrap() = labels;
    }

    /// Seed the invoice table
    pub fn seed_invoices(&self, invoices: Vec<Invoice>) {
        *self.invoices.write().unwrap() = invoices;
    }

    /// Script the next sync: its report plus the records it extracts
    pub fn stage_sync(&self, report: SyncReport, extracted: Vec<Invoice>) {
        *self.next_sync.write().unwrap() = Some((report, extracted));
    }

    /// Set the bytes served by `export_csv`
    pub fn set_csv(&self, bytes: Vec<u8>) {
        *self.csv.write().unwrap() = bytes;
    }

    /// Make the named operation fail once with the given error.
    ///
    /// Operation names: `current_user`, `labels`, `sync`, `list`,
    /// `delete`, `export`, `mode`, `logout`.
    pub fn fail_next(&self, op: &'static str, error: ApiError) {
        self.fail_next.write().unwrap().insert(op, error);
    }

    /// Answer 401 on every credentialed call from now on
    pub fn reject_credential(&self) {
        self.reject_credential.store(true, Ordering::SeqCst);
    }

    /// Ids passed to `delete_invoice`, in call order
    pub fn delete_calls(&self) -> Vec<InvoiceId> {
        self.deleted.read().unwrap().clone()
    }

    /// Labels passed to `sync_label`, in call order
    pub fn sync_calls(&self) -> Vec<LabelId> {
        self.synced.read().unwrap().clone()
    }

    /// Snapshot of the invoice table
    pub fn invoices(&self) -> Vec<Invoice> {
        self.invoices.read().unwrap().clone()
    }

    /// The stored user's current extraction mode
    pub fn stored_mode(&self) -> ExtractionMode {
        self.user.read().unwrap().extraction_mode
    }

    fn gate(&self, op: &'static str) -> Result<(), ApiError> {
        if self.reject_credential.load(Ordering::SeqCst) {
            return Err(ApiError::Unauthorized);
        }
        if let Some(error) = self.fail_next.write().unwrap().remove(op) {
            return Err(error);
        }
        Ok(())
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for InMemoryBackend {
    fn auth_url(&self, mode: ExtractionMode) -> Result<String, ApiError> {
        Ok(format!(
            "https://auth.example.com/consent?extraction_mode={}",
            mode.as_str()
        ))
    }

    fn exchange_code(&self, code: &str) -> Result<String, ApiError> {
        if code.is_empty() {
            return Err(ApiError::BadRequest("Exchange failed".to_string()));
        }
        Ok(format!("token-for-{}", code))
    }

    fn current_user(&self) -> Result<User, ApiError> {
        self.gate("current_user")?;
        Ok(self.user.read().unwrap().clone())
    }

    fn update_extraction_mode(&self, mode: ExtractionMode) -> Result<(), ApiError> {
        self.gate("mode")?;
        self.user.write().unwrap().extraction_mode = mode;
        Ok(())
    }

    fn logout(&self) -> Result<(), ApiError> {
        self.gate("logout")?;
        Ok(())
    }

    fn list_labels(&self) -> Result<Vec<Label>, ApiError> {
        self.gate("labels")?;
        Ok(self.labels.read().unwrap().clone())
    }

    fn sync_label(&self, label: &LabelId) -> Result<SyncReport, ApiError> {
        self.gate("sync")?;
        self.synced.write().unwrap().push(label.clone());

        match self.next_sync.write().unwrap().take() {
            Some((report, extracted)) => {
                self.invoices.write().unwrap().extend(extracted);
                Ok(report)
            }
            None => Ok(SyncReport::default()),
        }
    }

    fn list_invoices(&self, page: u32, limit: u32) -> Result<InvoicePage, ApiError> {
        self.gate("list")?;
        let invoices = self.invoices.read().unwrap();

        let offset = (page.max(1) as usize - 1) * limit as usize;
        let items = invoices
            .iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect();

        Ok(InvoicePage {
            items,
            total: invoices.len() as u64,
            page,
            limit,
        })
    }

    fn delete_invoice(&self, id: InvoiceId) -> Result<(), ApiError> {
        self.gate("delete")?;
        self.deleted.write().unwrap().push(id);

        let mut invoices = self.invoices.write().unwrap();
        let before = invoices.len();
        invoices.retain(|invoice| invoice.id != id);
        if invoices.len() == before {
            return Err(ApiError::BadRequest("Invoice not found".to_string()));
        }
        Ok(())
    }

    fn export_csv(&self) -> Result<Vec<u8>, ApiError> {
        self.gate("export")?;
        Ok(self.csv.read().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_invoice(id: i64) -> Invoice {
        Invoice::builder(id).vendor_name("Acme").build()
    }

    #[test]
    fn test_list_paginates_server_side() {
        let backend = InMemoryBackend::new();
        backend.seed_invoices((1..=5).map(make_invoice).collect());

        let page = backend.list_invoices(2, 2).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, InvoiceId::new(3));
    }

    #[test]
    fn test_delete_missing_is_bad_request() {
        let backend = InMemoryBackend::new();
        let err = backend.delete_invoice(InvoiceId::new(9)).unwrap_err();
        assert_eq!(err, ApiError::BadRequest("Invoice not found".to_string()));
    }

    #[test]
    fn test_scripted_failure_fires_once() {
        let backend = InMemoryBackend::new();
        backend.fail_next("labels", ApiError::ServerError);

        assert_eq!(backend.list_labels().unwrap_err(), ApiError::ServerError);
        assert!(backend.list_labels().is_ok());
    }

    #[test]
    fn test_rejected_credential() {
        let backend = InMemoryBackend::new();
        backend.reject_credential();
        assert_eq!(backend.current_user().unwrap_err(), ApiError::Unauthorized);
    }
}
