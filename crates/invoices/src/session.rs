//! Session credential handling
//!
//! The bearer credential lives in an explicit [`Session`] object that is
//! injected into the backend client and the dashboard, never a global.
//! The credential is persisted as JSON under the config directory, the
//! durable-storage analog of the hosted dashboard, and destroyed on
//! logout or on the first request that reports it invalid.

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::api::{ApiError, Backend};
use crate::models::{ExtractionMode, User};

/// Session filename in the Penny config directory
const SESSION_FILE: &str = "session.json";

/// Failure to establish an authorized session.
///
/// Callers must treat every variant as "return to the entry surface";
/// none of them is retryable in a loop.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No credential stored; no request was made
    #[error("no credential present")]
    Missing,

    /// The stored credential was rejected and has been cleared
    #[error("credential expired or revoked")]
    Invalid,

    /// The backend could not be reached or failed
    #[error(transparent)]
    Backend(#[from] ApiError),
}

/// Stored session data
#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    access_token: String,
}

/// Holds the bearer credential for one client instance
pub struct Session {
    token_path: PathBuf,
    token: RwLock<Option<String>>,
}

impl Session {
    /// Open the session persisted in the config directory, if any
    pub fn open() -> Result<Self> {
        let token_path =
            config::config_path(SESSION_FILE).context("Could not determine config directory")?;
        Ok(Self::at(token_path))
    }

    /// Open a session persisted at an explicit path (used by tests)
    pub fn at(token_path: PathBuf) -> Self {
        let token = Self::read_token(&token_path);
        Self {
            token_path,
            token: RwLock::new(token),
        }
    }

    fn read_token(path: &PathBuf) -> Option<String> {
        let content = fs::read_to_string(path).ok()?;
        let stored: StoredSession = serde_json::from_str(&content).ok()?;
        Some(stored.access_token)
    }

    /// The current credential, if any
    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    /// Whether a credential is present
    pub fn is_authenticated(&self) -> bool {
        self.token.read().unwrap().is_some()
    }

    /// Store a new credential, replacing any previous one
    pub fn store(&self, access_token: &str) -> Result<()> {
        if let Some(parent) = self.token_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let stored = StoredSession {
            access_token: access_token.to_string(),
        };
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&self.token_path, content)
            .with_context(|| format!("Failed to write session file: {}", self.token_path.display()))?;

        *self.token.write().unwrap() = Some(access_token.to_string());
        Ok(())
    }

    /// Destroy the credential, in memory and on disk
    pub fn clear(&self) -> Result<()> {
        *self.token.write().unwrap() = None;
        if self.token_path.exists() {
            fs::remove_file(&self.token_path).with_context(|| {
                format!("Failed to remove session file: {}", self.token_path.display())
            })?;
        }
        Ok(())
    }
}

/// Gates entry to the dashboard on a valid credential
pub struct SessionGuard {
    session: Arc<Session>,
}

impl SessionGuard {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Validate the stored credential against the backend.
    ///
    /// Fails without a network call when no credential is present. A
    /// rejected credential is cleared before the error is returned, so a
    /// second call reports `Missing` rather than hitting the backend
    /// again. Success primes the account snapshot for dependent
    /// components.
    pub fn authorize(&self, backend: &dyn Backend) -> Result<User, AuthError> {
        if !self.session.is_authenticated() {
            return Err(AuthError::Missing);
        }

        match backend.current_user() {
            Ok(user) => Ok(user),
            Err(ApiError::Unauthorized) => {
                warn!("Stored credential rejected; clearing session");
                if let Err(e) = self.session.clear() {
                    warn!("Failed to clear session file: {}", e);
                }
                Err(AuthError::Invalid)
            }
            Err(e) => Err(AuthError::Backend(e)),
        }
    }
}

/// Port range to try for the local login callback listener
const PORT_RANGE_START: u16 = 8080;
const PORT_RANGE_END: u16 = 8090;

/// Run the interactive browser login and persist the resulting credential.
///
/// Fetches the provider consent URL from the backend, opens the browser,
/// catches the redirect on a local listener, and exchanges the returned
/// code for an access token.
pub fn interactive_login(
    session: &Session,
    backend: &dyn Backend,
    mode: ExtractionMode,
) -> Result<()> {
    let auth_url = backend
        .auth_url(mode)
        .context("Failed to fetch the login URL")?;

    let (listener, port) = start_local_server()?;

    println!("\n=== Login Required ===");
    println!("Opening browser for authentication...");
    println!("If the browser doesn't open, visit: {}", auth_url);
    println!("Listening for the redirect on http://localhost:{}", port);

    if let Err(e) = open::that(&auth_url) {
        eprintln!("Failed to open browser: {}. Please open the URL manually.", e);
    }

    println!("Waiting for authorization...");
    let code = wait_for_callback(listener)?;

    println!("Exchanging authorization code...");
    let access_token = backend
        .exchange_code(&code)
        .context("Failed to exchange the authorization code")?;

    session.store(&access_token)?;
    println!("Login successful!\n");
    Ok(())
}

/// Start a local TCP server on an available port
fn start_local_server() -> Result<(TcpListener, u16)> {
    for port in PORT_RANGE_START..=PORT_RANGE_END {
        if let Ok(listener) = TcpListener::bind(format!("127.0.0.1:{}", port)) {
            return Ok((listener, port));
        }
    }
    anyhow::bail!(
        "Could not bind to any port in range {}-{}",
        PORT_RANGE_START,
        PORT_RANGE_END
    )
}

/// Wait for the login redirect and extract the authorization code
fn wait_for_callback(listener: TcpListener) -> Result<String> {
    let (mut stream, _) = listener.accept().context("Failed to accept connection")?;

    let mut reader = BufReader::new(&stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .context("Failed to read request")?;

    // Format: GET /?code=AUTH_CODE&scope=... HTTP/1.1
    let code = query_param(&request_line, "code");
    let error = query_param(&request_line, "error");

    let (status, body) = if code.is_some() {
        ("200 OK", "Login successful! You can close this window.")
    } else {
        ("400 Bad Request", "Login failed. Please try again.")
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nConnection: close\r\n\r\n<html><body><h1>{}</h1></body></html>",
        status, body
    );
    stream.write_all(response.as_bytes()).ok();

    if let Some(err) = error {
        anyhow::bail!("Authorization error: {}", err);
    }

    code.context("No authorization code received")
}

/// Pull a query parameter out of an HTTP request line
fn query_param(request_line: &str, name: &str) -> Option<String> {
    request_line
        .split_whitespace()
        .nth(1)
        .and_then(|path| path.split('?').nth(1))
        .and_then(|query| {
            query.split('&').find_map(|param| {
                let mut parts = param.split('=');
                if parts.next() == Some(name) {
                    parts.next().map(|s| s.to_string())
                } else {
                    None
                }
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::InMemoryBackend;
    use tempfile::TempDir;

    fn temp_session(dir: &TempDir) -> Session {
        Session::at(dir.path().join("session.json"))
    }

    #[test]
    fn test_store_and_reopen() {
        let dir = TempDir::new().unwrap();
        let session = temp_session(&dir);
        assert!(!session.is_authenticated());

        session.store("abc123").unwrap();
        assert_eq!(session.token().as_deref(), Some("abc123"));

        // A fresh instance picks the persisted token back up
        let reopened = temp_session(&dir);
        assert_eq!(reopened.token().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let session = temp_session(&dir);
        session.store("abc123").unwrap();
        session.clear().unwrap();

        assert!(!session.is_authenticated());
        assert!(!dir.path().join("session.json").exists());

        let reopened = temp_session(&dir);
        assert!(!reopened.is_authenticated());
    }

    #[test]
    fn test_authorize_without_credential_makes_no_call() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(temp_session(&dir));
        let backend = InMemoryBackend::new();
        // Would fail if a request were issued
        backend.reject_credential();

        let guard = SessionGuard::new(session);
        assert!(matches!(
            guard.authorize(&backend),
            Err(AuthError::Missing)
        ));
    }

    #[test]
    fn test_authorize_clears_rejected_credential() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(temp_session(&dir));
        session.store("stale").unwrap();

        let backend = InMemoryBackend::new();
        backend.reject_credential();

        let guard = SessionGuard::new(session.clone());
        assert!(matches!(guard.authorize(&backend), Err(AuthError::Invalid)));
        assert!(!session.is_authenticated());

        // Second attempt short-circuits: no retry loop against the backend
        assert!(matches!(guard.authorize(&backend), Err(AuthError::Missing)));
    }

    #[test]
    fn test_authorize_success_returns_snapshot() {
        let dir = TempDir::new().unwrap();
        let session = Arc::new(temp_session(&dir));
        session.store("good").unwrap();

        let backend = InMemoryBackend::new();
        let guard = SessionGuard::new(session.clone());

        let user = guard.authorize(&backend).unwrap();
        assert_eq!(user.email, "user@example.com");
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_query_param_extraction() {
        let line = "GET /?code=4%2FabcDEF&scope=email HTTP/1.1";
        assert_eq!(query_param(line, "code").as_deref(), Some("4%2FabcDEF"));
        assert_eq!(query_param(line, "error"), None);

        let err_line = "GET /?error=access_denied HTTP/1.1";
        assert_eq!(query_param(err_line, "error").as_deref(), Some("access_denied"));
    }
}
