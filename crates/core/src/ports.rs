//! Port interfaces for the collaborators the core depends on
//!
//! - [`Transport`]: one HTTP POST
//! - [`Authenticator`]: the login operation
//! - [`CredentialStore`]: the credential record and its session token

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use k3bridge_domain::{Credential, Result};
use serde_json::Value;

/// One outbound POST.
#[derive(Clone, PartialEq)]
pub struct TransportRequest {
    /// Absolute service or login URL.
    pub url: String,
    /// JSON request body.
    pub body: Value,
    /// Sent as the `Cookie` header when present.
    pub session_token: Option<String>,
    /// Per-request limit; the client default applies when `None`.
    pub timeout: Option<Duration>,
}

impl fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportRequest")
            .field("url", &self.url)
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed JSON. An empty body decodes as `null`.
    Json(Value),
    /// Anything that is not JSON (files, images). Never classified.
    Binary(Vec<u8>),
}

/// A 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body.
    pub body: ResponseBody,
    /// Raw `Set-Cookie` header values, in arrival order.
    pub set_cookies: Vec<String>,
}

impl TransportResponse {
    /// Plain 200 JSON response without cookies.
    pub fn json(body: Value) -> Self {
        Self { status: 200, body: ResponseBody::Json(body), set_cookies: Vec::new() }
    }
}

/// Body captured from a failed (non-2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// The body parsed as JSON.
    Json(Value),
    /// Any other text, kept as received.
    Text(String),
}

/// Transport-level failure, optionally carrying the server's error body.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    /// Short description, used as the `Display` text.
    pub message: String,
    /// HTTP status when a response arrived.
    pub status: Option<u16>,
    /// Captured response body, if any.
    pub body: Option<ErrorBody>,
}

impl TransportError {
    /// Failure before any response arrived (connect, timeout, TLS).
    pub fn network(message: impl Into<String>) -> Self {
        Self { message: message.into(), status: None, body: None }
    }

    /// Non-2xx response, with whatever body the server sent.
    pub fn status(status: u16, body: Option<ErrorBody>) -> Self {
        Self { message: format!("HTTP {status}"), status: Some(status), body }
    }

    /// 2xx response whose textual body is not JSON (an HTML login page, a
    /// plain-text notice). The text is kept for inspection.
    pub fn not_json(status: u16, text: String) -> Self {
        Self {
            message: format!("HTTP {status}: response is not JSON"),
            status: Some(status),
            body: Some(ErrorBody::Text(text)),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// Sends one HTTP POST and decodes the body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `request.body` as JSON to `request.url`.
    ///
    /// # Errors
    /// Any non-2xx status, a network failure, or a textual 2xx body that is
    /// not JSON.
    async fn post(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// The login operation.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Log in with the credential's identity and return a fresh session
    /// token.
    ///
    /// # Errors
    /// `K3Error::Authentication` when the server rejects the login,
    /// `K3Error::Transport` when the login call itself fails.
    async fn login(&self, credential: &Credential) -> Result<String>;
}

/// Storage for the credential record. Only the session token is mutable.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current credential, including the latest session token.
    async fn load(&self) -> Result<Credential>;

    /// Persist a new session token (`None` clears it).
    async fn store_session_token(&self, token: Option<String>) -> Result<()>;
}
