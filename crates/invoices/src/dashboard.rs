//! Dashboard facade
//!
//! Ties the session, the invoice cache, the sync and delete workflows,
//! and the notification queue together behind one object. This is the
//! primary entry point for a surface (terminal, UI shell) to drive the
//! client. All cache and session mutations flow through here, never
//! through direct field writes.

use anyhow::{Context, Result};
use log::warn;
use std::path::Path;
use std::sync::Arc;

use crate::api::{ApiError, Backend};
use crate::cache::{FETCH_CAP, InvoiceCache, PaginationState};
use crate::models::{ExtractionMode, Invoice, InvoiceId, Label, LabelId, SyncReport, User};
use crate::mutation::{DeleteFlow, DeletePhase, MutationDenied};
use crate::notify::NotificationBus;
use crate::session::{AuthError, Session, SessionGuard};
use crate::summary::{SpendingSummary, summarize};
use crate::sync::{SyncOrchestrator, SyncOutcome};

/// One authenticated dashboard session over the invoice service
pub struct Dashboard {
    backend: Arc<dyn Backend>,
    session: Arc<Session>,
    guard: SessionGuard,
    user: Option<User>,
    labels: Vec<Label>,
    selected_label: Option<LabelId>,
    cache: InvoiceCache,
    pagination: PaginationState,
    sync: SyncOrchestrator,
    delete_flow: DeleteFlow,
    bus: NotificationBus,
}

impl Dashboard {
    /// Create a dashboard over the given backend and session
    pub fn new(backend: Arc<dyn Backend>, session: Arc<Session>) -> Self {
        Self {
            backend,
            guard: SessionGuard::new(session.clone()),
            session,
            user: None,
            labels: Vec::new(),
            selected_label: None,
            cache: InvoiceCache::new(),
            pagination: PaginationState::default(),
            sync: SyncOrchestrator::new(),
            delete_flow: DeleteFlow::new(),
            bus: NotificationBus::new(),
        }
    }

    /// Authorize and perform the initial loads.
    ///
    /// A failed authorization is fatal to the dashboard (return to the
    /// entry surface); failed label or invoice loads are not, they leave
    /// empty state behind a notification and can be retried.
    pub fn open(&mut self) -> Result<User, AuthError> {
        let user = self.guard.authorize(self.backend.as_ref())?;
        self.user = Some(user.clone());

        match self.run(self.backend.list_labels()) {
            Ok(labels) => self.labels = labels,
            Err(e) => {
                warn!("Failed to load labels: {}", e);
                self.bus.error("Failed to load labels");
            }
        }

        if let Err(e) = self.load_invoices() {
            warn!("Failed to load invoices: {}", e);
            self.bus.error("Failed to load invoices");
        }

        Ok(user)
    }

    /// Clear the session when a response reports the credential dead
    fn run<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
        if let Err(e) = &result {
            if e.is_unauthorized() {
                warn!("Credential rejected mid-session; clearing it");
                if let Err(clear_err) = self.session.clear() {
                    warn!("Failed to clear session file: {}", clear_err);
                }
            }
        }
        result
    }

    /// Replace the working set with a fresh page-1 window.
    ///
    /// Guarded by the cache generation: if a newer load supersedes this
    /// one before it resolves, the result is discarded. The current page
    /// is re-clamped afterwards.
    fn load_invoices(&mut self) -> Result<(), ApiError> {
        let ticket = self.cache.begin_load();
        let page = self.run(self.backend.list_invoices(1, FETCH_CAP))?;
        self.cache.complete(ticket, page);
        self.pagination
            .clamp(self.cache.total_pages(self.pagination.page_size));
        Ok(())
    }

    /// Reload the working set on demand
    pub fn reload(&mut self) -> Result<()> {
        self.load_invoices()
            .context("Failed to reload invoices")
    }

    // === Labels ===

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn selected_label(&self) -> Option<&LabelId> {
        self.selected_label.as_ref()
    }

    pub fn select_label(&mut self, label: Option<LabelId>) {
        self.selected_label = label;
    }

    // === Sync ===

    /// Run the sync workflow for the selected label.
    ///
    /// Validation failures and single-flight rejections never reach the
    /// network. On success pagination resets to page 1 and the cache is
    /// reloaded before the workflow settles; on failure the previous
    /// cache is left untouched and the run can be retried.
    pub fn sync(&mut self) -> Result<SyncReport> {
        let label = match self.sync.begin(self.selected_label.as_ref()) {
            Ok(label) => label,
            Err(denied) => {
                self.bus.error(denied.to_string());
                return Err(denied.into());
            }
        };

        match self.run(self.backend.sync_label(&label)) {
            Ok(report) => {
                self.pagination.reset();
                if let Err(e) = self.load_invoices() {
                    warn!("Post-sync reload failed: {}", e);
                    self.bus.error("Failed to refresh invoices after sync");
                }
                self.sync.complete(Ok(report.clone()));
                self.bus.success(report.summary());
                Ok(report)
            }
            Err(e) => {
                self.sync.complete(Err(e.clone()));
                self.bus.error("Failed to sync emails. Please try again.");
                Err(e.into())
            }
        }
    }

    pub fn is_syncing(&self) -> bool {
        self.sync.is_syncing()
    }

    /// The retained outcome of the last sync run
    pub fn sync_outcome(&self) -> Option<&SyncOutcome> {
        self.sync.last_outcome()
    }

    /// The retained report of the last successful sync
    pub fn sync_report(&self) -> Option<&SyncReport> {
        self.sync.last_report()
    }

    /// Drop the retained sync outcome (navigation away)
    pub fn clear_sync_outcome(&mut self) {
        self.sync.clear_outcome();
    }

    // === Invoices, pagination, aggregation ===

    /// The records on the current page
    pub fn visible_invoices(&self) -> &[Invoice] {
        self.cache.slice(self.pagination.page, self.pagination.page_size)
    }

    pub fn cache(&self) -> &InvoiceCache {
        &self.cache
    }

    pub fn page(&self) -> u32 {
        self.pagination.page
    }

    pub fn total_pages(&self) -> u32 {
        self.cache.total_pages(self.pagination.page_size)
    }

    pub fn set_page(&mut self, page: u32) {
        let total_pages = self.total_pages();
        self.pagination.set_page(page, total_pages);
    }

    pub fn next_page(&mut self) {
        self.set_page(self.pagination.page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.pagination.page.saturating_sub(1));
    }

    /// Aggregate the cached working set, recomputed on every call
    pub fn summary(&self) -> SpendingSummary {
        summarize(self.cache.invoices())
    }

    // === Delete workflow ===

    /// Open the delete confirmation for an invoice
    pub fn request_delete(&mut self, id: InvoiceId) -> Result<(), MutationDenied> {
        self.delete_flow.request(id)
    }

    /// Close the confirmation with no backend call
    pub fn cancel_delete(&mut self) -> bool {
        self.delete_flow.cancel()
    }

    /// Confirm and execute the pending delete.
    ///
    /// On success the cache is reloaded so the total converges with the
    /// backend; on failure the stale row stays visible for retry.
    pub fn confirm_delete(&mut self) -> Result<()> {
        let id = self.delete_flow.confirm()?;

        let result = self.run(self.backend.delete_invoice(id));
        self.delete_flow.settle();

        match result {
            Ok(()) => {
                if let Err(e) = self.load_invoices() {
                    warn!("Post-delete reload failed: {}", e);
                    self.bus.error("Failed to refresh invoices after delete");
                }
                self.bus.success("Invoice deleted");
                Ok(())
            }
            Err(e) => {
                warn!("Delete failed for invoice {}: {}", id, e);
                self.bus.error(format!("Failed to delete invoice: {}", e));
                Err(e.into())
            }
        }
    }

    pub fn delete_phase(&self) -> DeletePhase {
        self.delete_flow.phase()
    }

    // === Export ===

    /// Download the CSV export and write it to `path`.
    ///
    /// The stream is buffered fully before anything touches disk, so a
    /// failed download leaves no partial file behind.
    pub fn export_csv(&mut self, path: &Path) -> Result<()> {
        let bytes = match self.run(self.backend.export_csv()) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.bus.error("Export failed");
                return Err(e.into());
            }
        };

        if let Err(e) = std::fs::write(path, &bytes) {
            self.bus.error("Export failed");
            return Err(e).with_context(|| format!("Failed to write {}", path.display()));
        }

        self.bus
            .success(format!("Exported {} bytes to {}", bytes.len(), path.display()));
        Ok(())
    }

    // === Account ===

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Change the extraction mode, updating the local snapshot only
    /// after the backend confirms. On failure the snapshot keeps its
    /// prior value and the failure is surfaced.
    pub fn set_extraction_mode(&mut self, mode: ExtractionMode) -> Result<()> {
        match self.run(self.backend.update_extraction_mode(mode)) {
            Ok(()) => {
                if let Some(user) = &mut self.user {
                    user.extraction_mode = mode;
                }
                self.bus
                    .success(format!("Extraction mode set to {}", mode));
                Ok(())
            }
            Err(e) => {
                warn!("Mode change failed: {}", e);
                self.bus
                    .error(format!("Failed to change extraction mode: {}", e));
                Err(e.into())
            }
        }
    }

    /// End the session: best-effort server logout, then local teardown.
    ///
    /// The credential is destroyed even when the server call fails.
    pub fn logout(&mut self) {
        if let Err(e) = self.backend.logout() {
            warn!("Logout request failed: {}", e);
        }
        if let Err(e) = self.session.clear() {
            warn!("Failed to clear session file: {}", e);
        }

        self.user = None;
        self.labels.clear();
        self.selected_label = None;
        self.cache.reset();
        self.pagination.reset();
        self.sync.clear_outcome();
        self.delete_flow.settle();
    }

    // === Notifications ===

    pub fn notifications(&mut self) -> &mut NotificationBus {
        &mut self.bus
    }
}
