//! Wire payloads for the backend REST contract

use serde::{Deserialize, Serialize};

use crate::models::Invoice;

/// Response from `GET /auth/google/url`
#[derive(Debug, Deserialize)]
pub struct AuthUrlResponse {
    pub url: String,
}

/// Request body for `POST /auth/exchange`
#[derive(Debug, Serialize)]
pub struct ExchangeRequest<'a> {
    pub code: &'a str,
}

/// Response from `POST /auth/exchange`
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Request body for `PUT /user/extraction-mode`
#[derive(Debug, Serialize)]
pub struct ModeRequest<'a> {
    pub mode: &'a str,
}

/// Request body for `POST /gmail/sync`
#[derive(Debug, Serialize)]
pub struct SyncRequest<'a> {
    pub label_id: &'a str,
}

/// One page of invoices from `GET /invoices`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvoicePage {
    pub items: Vec<Invoice>,
    /// Authoritative record count across all pages
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Error body the backend attaches to 4xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub detail: Option<String>,
}
