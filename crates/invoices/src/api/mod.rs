//! Backend request/response boundary
//!
//! This module provides:
//! - The `Backend` trait enumerating every REST operation the client uses
//! - An HTTP implementation over the hosted extraction service
//! - An in-memory implementation for tests

mod error;
mod http;
mod memory;
pub mod types;

pub use error::ApiError;
pub use http::HttpBackend;
pub use memory::InMemoryBackend;

use crate::models::{ExtractionMode, InvoiceId, Label, LabelId, SyncReport, User};
use self::types::InvoicePage;

/// Trait for backend operations
///
/// Abstracts the hosted service so orchestration code can run against a
/// fake in tests. Every implementation attaches the bearer credential
/// when one is present and normalizes failures into [`ApiError`].
pub trait Backend: Send + Sync {
    /// Get the provider consent URL to start a login
    fn auth_url(&self, mode: ExtractionMode) -> Result<String, ApiError>;

    /// Exchange an authorization code for an access token
    fn exchange_code(&self, code: &str) -> Result<String, ApiError>;

    /// Fetch the account snapshot for the current credential
    fn current_user(&self) -> Result<User, ApiError>;

    /// Change which extractor the backend runs
    fn update_extraction_mode(&self, mode: ExtractionMode) -> Result<(), ApiError>;

    /// Invalidate the credential server-side
    fn logout(&self) -> Result<(), ApiError>;

    /// List the mail labels available to sync from
    fn list_labels(&self) -> Result<Vec<Label>, ApiError>;

    /// Scan emails under a label and extract invoices
    fn sync_label(&self, label: &LabelId) -> Result<SyncReport, ApiError>;

    /// Fetch one page of invoice records plus the total count
    fn list_invoices(&self, page: u32, limit: u32) -> Result<InvoicePage, ApiError>;

    /// Delete one invoice record
    fn delete_invoice(&self, id: InvoiceId) -> Result<(), ApiError>;

    /// Download all invoices as a CSV byte stream
    fn export_csv(&self) -> Result<Vec<u8>, ApiError>;
}
