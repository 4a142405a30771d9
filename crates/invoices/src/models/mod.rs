//! Domain models for invoice-dashboard entities

mod invoice;
mod label;
mod report;
mod user;

pub use invoice::{Invoice, InvoiceId};
pub use label::{Label, LabelId};
pub use report::SyncReport;
pub use user::{ExtractionMode, User};
