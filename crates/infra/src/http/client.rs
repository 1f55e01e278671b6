use std::time::Duration;

use async_trait::async_trait;
use k3bridge_core::{
    ErrorBody, ResponseBody, Transport, TransportError, TransportRequest, TransportResponse,
};
use k3bridge_domain::constants::DEFAULT_USER_AGENT;
use k3bridge_domain::K3Error;
use reqwest::header::{HeaderMap, CONTENT_TYPE, COOKIE, SET_COOKIE};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

use crate::errors::{transport_failure, InfraError};

/// HTTP client for the WebAPI endpoint.
///
/// Only connection failures are retried: the request never reached the
/// server, so resending cannot duplicate a save. Timeouts and error statuses
/// are returned to the caller as-is.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Execute the provided request builder with retry semantics.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, TransportError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                TransportError::network("request body cannot be cloned for retry")
            })?;

            let request = cloned_builder.build().map_err(|err| transport_failure(&err))?;
            let url = request.url().clone();
            debug!(attempt = attempt + 1, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %url, %status, "received HTTP response");
                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %url, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Err(transport_failure(&err));
                }
            }
        }

        Err(TransportError::network("http client exhausted retries without producing a result"))
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self.client.post(&request.url).json(&request.body);
        if let Some(token) = request.session_token.as_deref().filter(|t| !t.is_empty()) {
            builder = builder.header(COOKIE, token);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = self.send(builder).await?;
        let status = response.status();
        let set_cookies = collect_set_cookies(response.headers());
        let textual = is_textual(response.headers());
        let bytes = response.bytes().await.map_err(|err| transport_failure(&err))?;

        if !status.is_success() {
            return Err(TransportError::status(status.as_u16(), error_body(&bytes)));
        }

        let body = decode_body(textual, bytes.to_vec())
            .map_err(|text| TransportError::not_json(status.as_u16(), text))?;
        Ok(TransportResponse { status: status.as_u16(), body, set_cookies })
    }
}

fn collect_set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// JSON and text bodies are candidates for parsing; everything else is
/// binary. A missing `Content-Type` counts as text.
fn is_textual(headers: &HeaderMap) -> bool {
    match headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        Some(content_type) => {
            let content_type = content_type.to_ascii_lowercase();
            content_type.contains("json") || content_type.starts_with("text/")
        }
        None => true,
    }
}

/// Textual bodies must be JSON; `Err` carries the text that was not.
fn decode_body(textual: bool, bytes: Vec<u8>) -> Result<ResponseBody, String> {
    if !textual {
        return Ok(ResponseBody::Binary(bytes));
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ResponseBody::Json(Value::Null));
    }
    serde_json::from_slice::<Value>(&bytes)
        .map(ResponseBody::Json)
        .map_err(|_| String::from_utf8_lossy(&bytes).into_owned())
}

fn error_body(bytes: &[u8]) -> Option<ErrorBody> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => Some(ErrorBody::Json(value)),
        Err(_) => Some(ErrorBody::Text(String::from_utf8_lossy(bytes).into_owned())),
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: String,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_backoff: Duration::from_millis(200),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl HttpClientBuilder {
    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Delay before the first retry; doubles on each further retry.
    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    /// `useragent` header value; defaults to the bridge name.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// # Errors
    /// `K3Error::Transport` when the TLS backend cannot be initialised.
    pub fn build(self) -> Result<HttpClient, K3Error> {
        let client = ReqwestClient::builder()
            .user_agent(self.user_agent)
            .no_proxy()
            .build()
            .map_err(|err| K3Error::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_connect()
}
