//! Invoices crate - Client-side orchestration for the invoice service
//!
//! This crate provides platform-independent client functionality for the
//! hosted invoice-extraction service:
//! - Domain models (User, Label, Invoice, SyncReport)
//! - Session credential handling and the browser login flow
//! - Backend trait abstraction over the REST contract, with HTTP and
//!   in-memory implementations
//! - Local invoice cache with derived pagination and a stale-load guard
//! - Pure per-currency spend aggregation
//! - Single-flight sync and confirm-then-delete workflows
//! - A dashboard facade tying everything together for a surface
//!
//! This crate has zero UI dependencies and uses synchronous HTTP to be
//! executor-agnostic.

pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod mutation;
pub mod notify;
pub mod session;
pub mod summary;
pub mod sync;

pub use api::{ApiError, Backend, HttpBackend, InMemoryBackend};
pub use cache::{DEFAULT_PAGE_SIZE, FETCH_CAP, InvoiceCache, LoadTicket, PaginationState};
pub use config::Settings;
pub use dashboard::Dashboard;
pub use models::{ExtractionMode, Invoice, InvoiceId, Label, LabelId, SyncReport, User};
pub use mutation::{DeleteFlow, DeletePhase, MutationDenied};
pub use notify::{Notification, NotificationBus, Severity};
pub use session::{AuthError, Session, SessionGuard, interactive_login};
pub use summary::{CurrencyTotal, SpendingSummary, format_amount, summarize};
pub use sync::{SyncDenied, SyncOrchestrator, SyncOutcome, SyncPhase};
