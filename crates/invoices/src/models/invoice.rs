//! Invoice model representing one extracted invoice record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an invoice (backend row id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvoiceId(pub i64);

impl InvoiceId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl From<i64> for InvoiceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

/// One invoice record extracted from an email attachment.
///
/// `None` fields mean the extractor could not find the value, not that
/// the value is an empty string. `invoice_date` and `due_date` are kept
/// as opaque strings because the backend stores them unparsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Backend row id, unique and stable
    pub id: InvoiceId,
    /// Subject of the email the invoice came from
    pub email_subject: Option<String>,
    /// When that email was received
    pub email_date: Option<DateTime<Utc>>,
    /// Vendor name as extracted
    pub vendor_name: Option<String>,
    /// Invoice number as printed on the document
    pub invoice_number: Option<String>,
    /// Invoice date as printed on the document
    pub invoice_date: Option<String>,
    /// Total amount, in the invoice's currency
    pub total_amount: Option<f64>,
    /// ISO currency code, "USD" when the extractor found none
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Due date as printed on the document
    pub due_date: Option<String>,
    /// Which extraction mode produced this record
    pub extraction_mode: Option<String>,
    /// Source attachment filename
    pub file_name: Option<String>,
    /// When the record was created on the backend
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    /// Create a new invoice builder
    pub fn builder(id: impl Into<InvoiceId>) -> InvoiceBuilder {
        InvoiceBuilder::new(id.into())
    }
}

/// Builder for creating Invoice instances
pub struct InvoiceBuilder {
    id: InvoiceId,
    email_subject: Option<String>,
    email_date: Option<DateTime<Utc>>,
    vendor_name: Option<String>,
    invoice_number: Option<String>,
    invoice_date: Option<String>,
    total_amount: Option<f64>,
    currency: String,
    due_date: Option<String>,
    extraction_mode: Option<String>,
    file_name: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl InvoiceBuilder {
    fn new(id: InvoiceId) -> Self {
        Self {
            id,
            email_subject: None,
            email_date: None,
            vendor_name: None,
            invoice_number: None,
            invoice_date: None,
            total_amount: None,
            currency: default_currency(),
            due_date: None,
            extraction_mode: None,
            file_name: None,
            created_at: None,
        }
    }

    pub fn email_subject(mut self, subject: impl Into<String>) -> Self {
        self.email_subject = Some(subject.into());
        self
    }

    pub fn email_date(mut self, date: DateTime<Utc>) -> Self {
        self.email_date = Some(date);
        self
    }

    pub fn vendor_name(mut self, vendor: impl Into<String>) -> Self {
        self.vendor_name = Some(vendor.into());
        self
    }

    pub fn invoice_number(mut self, number: impl Into<String>) -> Self {
        self.invoice_number = Some(number.into());
        self
    }

    pub fn invoice_date(mut self, date: impl Into<String>) -> Self {
        self.invoice_date = Some(date.into());
        self
    }

    pub fn total_amount(mut self, amount: f64) -> Self {
        self.total_amount = Some(amount);
        self
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn due_date(mut self, date: impl Into<String>) -> Self {
        self.due_date = Some(date.into());
        self
    }

    pub fn extraction_mode(mut self, mode: impl Into<String>) -> Self {
        self.extraction_mode = Some(mode.into());
        self
    }

    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn build(self) -> Invoice {
        Invoice {
            id: self.id,
            email_subject: self.email_subject,
            email_date: self.email_date,
            vendor_name: self.vendor_name,
            invoice_number: self.invoice_number,
            invoice_date: self.invoice_date,
            total_amount: self.total_amount,
            currency: self.currency,
            due_date: self.due_date,
            extraction_mode: self.extraction_mode,
            file_name: self.file_name,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let invoice = Invoice::builder(7).build();
        assert_eq!(invoice.id, InvoiceId::new(7));
        assert_eq!(invoice.currency, "USD");
        assert!(invoice.total_amount.is_none());
        assert!(invoice.vendor_name.is_none());
    }

    #[test]
    fn test_currency_defaults_on_deserialize() {
        let json = r#"{
            "id": 1,
            "email_subject": "Invoice from Acme",
            "email_date": null,
            "vendor_name": "Acme",
            "invoice_number": "A-100",
            "invoice_date": null,
            "total_amount": 12.5,
            "due_date": null,
            "extraction_mode": "local",
            "file_name": "acme.pdf",
            "created_at": "2024-05-01T10:00:00Z"
        }"#;

        let invoice: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.currency, "USD");
        assert_eq!(invoice.total_amount, Some(12.5));
    }
}
