//! HTTP implementation of the backend boundary
//!
//! Talks JSON over bearer-token HTTP to the hosted extraction service.
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use ureq::Agent;
use url::Url;

use super::types::{
    AuthUrlResponse, ErrorBody, ExchangeRequest, InvoicePage, ModeRequest, SyncRequest,
    TokenResponse,
};
use super::{ApiError, Backend};
use crate::models::{ExtractionMode, InvoiceId, Label, LabelId, SyncReport, User};
use crate::session::Session;

type HttpResponse = ureq::http::Response<ureq::Body>;

/// HTTP client for the invoice-extraction service
pub struct HttpBackend {
    agent: Agent,
    base_url: String,
    session: Arc<Session>,
}

impl HttpBackend {
    /// Request timeout for every call
    const TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a new backend client against `base_url`
    ///
    /// The session is consulted on every request for the current
    /// credential; it is shared, not captured.
    pub fn new(base_url: &str, session: Arc<Session>) -> anyhow::Result<Self> {
        // Validate early so a bad URL fails at startup, not mid-request
        let parsed = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid backend URL {base_url}: {e}"))?;

        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Self::TIMEOUT))
            .build()
            .new_agent();

        Ok(Self {
            agent,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            session,
        })
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    fn bearer(&self) -> Option<String> {
        self.session
            .token()
            .map(|token| format!("Bearer {}", token))
    }

    fn get(&self, path: &str) -> Result<HttpResponse, ApiError> {
        let mut request = self.agent.get(self.url(path));
        if let Some(bearer) = self.bearer() {
            request = request.header("Authorization", &bearer);
        }
        Self::check(request.call())
    }

    fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError> {
        let mut request = self.agent.post(self.url(path));
        if let Some(bearer) = self.bearer() {
            request = request.header("Authorization", &bearer);
        }
        Self::check(request.send_json(body))
    }

    fn post_empty(&self, path: &str) -> Result<HttpResponse, ApiError> {
        let mut request = self.agent.post(self.url(path));
        if let Some(bearer) = self.bearer() {
            request = request.header("Authorization", &bearer);
        }
        Self::check(request.send_empty())
    }

    fn put_json<B: Serialize>(&self, path: &str, body: &B) -> Result<HttpResponse, ApiError> {
        let mut request = self.agent.put(self.url(path));
        if let Some(bearer) = self.bearer() {
            request = request.header("Authorization", &bearer);
        }
        Self::check(request.send_json(body))
    }

    fn delete(&self, path: &str) -> Result<HttpResponse, ApiError> {
        let mut request = self.agent.delete(self.url(path));
        if let Some(bearer) = self.bearer() {
            request = request.header("Authorization", &bearer);
        }
        Self::check(request.call())
    }

    /// Normalize transport errors and non-success statuses into ApiError
    fn check(result: Result<HttpResponse, ureq::Error>) -> Result<HttpResponse, ApiError> {
        let mut response = result.map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            401 => Err(ApiError::Unauthorized),
            400..=499 => {
                let detail = response
                    .body_mut()
                    .read_json::<ErrorBody>()
                    .ok()
                    .and_then(|body| body.detail)
                    .unwrap_or_else(|| "Request failed".to_string());
                Err(ApiError::BadRequest(detail))
            }
            _ => Err(ApiError::ServerError),
        }
    }

    fn json<T: DeserializeOwned>(mut response: HttpResponse) -> Result<T, ApiError> {
        response
            .body_mut()
            .read_json()
            .map_err(|e| ApiError::Network(format!("failed to decode response: {}", e)))
    }
}

impl Backend for HttpBackend {
    fn auth_url(&self, mode: ExtractionMode) -> Result<String, ApiError> {
        let path = format!(
            "/auth/google/url?extraction_mode={}",
            urlencoding::encode(mode.as_str())
        );
        let body: AuthUrlResponse = Self::json(self.get(&path)?)?;
        Ok(body.url)
    }

    fn exchange_code(&self, code: &str) -> Result<String, ApiError> {
        let response = self.post_json("/auth/exchange", &ExchangeRequest { code })?;
        let body: TokenResponse = Self::json(response)?;
        Ok(body.access_token)
    }

    fn current_user(&self) -> Result<User, ApiError> {
        Self::json(self.get("/user/me")?)
    }

    fn update_extraction_mode(&self, mode: ExtractionMode) -> Result<(), ApiError> {
        self.put_json("/user/extraction-mode", &ModeRequest { mode: mode.as_str() })?;
        Ok(())
    }

    fn logout(&self) -> Result<(), ApiError> {
        self.post_empty("/auth/logout")?;
        Ok(())
    }

    fn list_labels(&self) -> Result<Vec<Label>, ApiError> {
        Self::json(self.get("/gmail/labels")?)
    }

    fn sync_label(&self, label: &LabelId) -> Result<SyncReport, ApiError> {
        let response = self.post_json(
            "/gmail/sync",
            &SyncRequest {
                label_id: label.as_str(),
            },
        )?;
        Self::json(response)
    }

    fn list_invoices(&self, page: u32, limit: u32) -> Result<InvoicePage, ApiError> {
        let path = format!("/invoices?page={}&limit={}", page, limit);
        Self::json(self.get(&path)?)
    }

    fn delete_invoice(&self, id: InvoiceId) -> Result<(), ApiError> {
        self.delete(&format!("/invoices/{}", id))?;
        Ok(())
    }

    fn export_csv(&self) -> Result<Vec<u8>, ApiError> {
        let mut response = self.get("/invoices/export")?;
        response
            .body_mut()
            .read_to_vec()
            .map_err(|e| ApiError::Network(format!("failed to read export stream: {}", e)))
    }
}
