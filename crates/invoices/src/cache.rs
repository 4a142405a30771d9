//! Local invoice cache and derived pagination
//!
//! The cache holds the working set fetched from the backend in one call
//! (page 1, up to [`FETCH_CAP`] records) together with the backend's
//! authoritative total. Page slices are derived locally without further
//! network round trips. Loads are guarded by a generation counter so a
//! response that resolves after a newer load has started is discarded
//! instead of overwriting fresher state.

use log::{debug, warn};

use crate::api::types::InvoicePage;
use crate::api::{ApiError, Backend};
use crate::models::Invoice;

/// Maximum records fetched in one load; the backend's documented
/// per-request limit. Past this, `total` and the visible window diverge
/// and `truncated` reports it.
pub const FETCH_CAP: u32 = 1000;

/// Default records per visible page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Ticket tying an in-flight load to the generation that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

/// Client cache of invoice records plus the server-reported total
#[derive(Debug, Default)]
pub struct InvoiceCache {
    invoices: Vec<Invoice>,
    total: u64,
    generation: u64,
}

impl InvoiceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a load, invalidating any ticket issued earlier.
    ///
    /// The caller fetches page 1 (size [`FETCH_CAP`]) from the backend
    /// and hands the result to [`complete`](Self::complete) with this
    /// ticket.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Apply a finished load if its ticket is still the latest.
    ///
    /// Returns `false` when the result was stale and discarded. A failed
    /// load simply never calls this, leaving the prior cache intact.
    pub fn complete(&mut self, ticket: LoadTicket, page: InvoicePage) -> bool {
        if ticket.generation != self.generation {
            warn!(
                "Discarding stale invoice load (generation {} < {})",
                ticket.generation, self.generation
            );
            return false;
        }

        debug!(
            "Invoice cache replaced: {} records, total {}",
            page.items.len(),
            page.total
        );
        self.invoices = page.items;
        self.total = page.total;
        true
    }

    /// Fetch and apply a fresh working set in one step
    pub fn load(&mut self, backend: &dyn Backend) -> Result<(), ApiError> {
        let ticket = self.begin_load();
        let page = backend.list_invoices(1, FETCH_CAP)?;
        self.complete(ticket, page);
        Ok(())
    }

    /// The records at offset `(page-1)*page_size`, empty past the end.
    ///
    /// Pure computation over the cached sequence; never fails and never
    /// issues a request.
    pub fn slice(&self, page: u32, page_size: u32) -> &[Invoice] {
        let start = (page.max(1) as usize - 1).saturating_mul(page_size as usize);
        if start >= self.invoices.len() {
            return &[];
        }
        let end = (start + page_size as usize).min(self.invoices.len());
        &self.invoices[start..end]
    }

    /// All cached records, for aggregation
    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    /// The backend's record count at the last successful load
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of records actually cached
    pub fn len(&self) -> usize {
        self.invoices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invoices.is_empty()
    }

    /// Number of visible pages; at least 1 so `page >= 1` always holds
    pub fn total_pages(&self, page_size: u32) -> u32 {
        let pages = self.total.div_ceil(page_size.max(1) as u64);
        (pages.max(1)).min(u32::MAX as u64) as u32
    }

    /// Whether the backend holds more records than the cached window
    pub fn truncated(&self) -> bool {
        self.total > self.invoices.len() as u64
    }

    /// Forget everything (logout)
    pub fn reset(&mut self) {
        self.invoices.clear();
        self.total = 0;
        self.generation += 1;
    }
}

/// Current page selection over the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationState {
    /// Jump to a page, clamped to `[1, total_pages]`
    pub fn set_page(&mut self, page: u32, total_pages: u32) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    /// Re-clamp after the total changed (loads, deletes)
    pub fn clamp(&mut self, total_pages: u32) {
        self.page = self.page.clamp(1, total_pages.max(1));
    }

    /// Back to the first page
    pub fn reset(&mut self) {
        self.page = 1;
    }
}
