//! Login operation
//!
//! `LoginByAppSecret` (application authorisation) or `ValidateUser`
//! (account/password), depending on the credential's [`AuthMethod`]. The
//! session token is the cookie the server sets on a successful login.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use k3bridge_core::{
    Authenticator, ErrorBody, ResponseBody, ResponseClassifier, ResponseEnvelope, Transport,
    TransportError, TransportRequest,
};
use k3bridge_domain::constants::LOGIN_SUCCESS;
use k3bridge_domain::{AuthMethod, Credential, K3Error, Result};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::errors::InfraError;

/// Request body for the credential's login action.
pub fn login_body(credential: &Credential) -> Value {
    let lcid = credential.locale.code();
    match &credential.auth {
        AuthMethod::AppSecret { app_id, app_secret } => json!({
            "acctId": credential.account_id,
            "username": credential.username,
            "appId": app_id,
            "appSecret": app_secret,
            "lcid": lcid,
        }),
        AuthMethod::Password { password } => json!({
            "acctid": credential.account_id,
            "username": credential.username,
            "password": password,
            "lcid": lcid,
        }),
    }
}

/// `name=value` part of every `Set-Cookie` header, joined with `"; "`.
pub fn session_cookie(set_cookies: &[String]) -> Option<String> {
    let parts: Vec<&str> = set_cookies
        .iter()
        .filter_map(|header| header.split(';').next())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("; "))
}

/// [`Authenticator`] that calls the auth service over a [`Transport`].
pub struct WebApiAuthenticator {
    transport: Arc<dyn Transport>,
    classifier: ResponseClassifier,
    timeout: Option<Duration>,
}

impl WebApiAuthenticator {
    /// Authenticator without a request timeout.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, classifier: ResponseClassifier::default(), timeout: None }
    }

    /// Timeout applied to the login request.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn rejected(&self, body: &Value) -> K3Error {
        let envelope = ResponseEnvelope::from_json(body);
        let detail = match envelope.login_result() {
            Some(_) => self.classifier.extract_error_message(&envelope),
            None => format!("unexpected login response: {body}"),
        };
        K3Error::Authentication(format!("login failed: {detail}"))
    }

    fn transport_failed(&self, err: TransportError) -> K3Error {
        match &err.body {
            Some(ErrorBody::Json(body)) if body.get("LoginResultType").is_some() => {
                self.rejected(body)
            }
            _ => InfraError::from(err).into(),
        }
    }
}

#[async_trait]
impl Authenticator for WebApiAuthenticator {
    #[instrument(
        skip(self, credential),
        fields(account = %credential.account_id, action = credential.auth.login_action())
    )]
    async fn login(&self, credential: &Credential) -> Result<String> {
        let request = TransportRequest {
            url: credential.login_url(),
            body: login_body(credential),
            session_token: None,
            timeout: self.timeout,
        };

        let response = match self.transport.post(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "login request failed");
                return Err(self.transport_failed(err));
            }
        };

        let body = match &response.body {
            ResponseBody::Json(body) => body,
            ResponseBody::Binary(_) => {
                return Err(K3Error::Authentication("login failed: response is not JSON".into()))
            }
        };

        let envelope = ResponseEnvelope::from_json(body);
        if envelope.login_result() != Some(Some(LOGIN_SUCCESS)) {
            let err = self.rejected(body);
            warn!(error = %err, "login rejected");
            return Err(err);
        }

        let cookie = session_cookie(&response.set_cookies).ok_or_else(|| {
            K3Error::Authentication("login succeeded but no session cookie was returned".into())
        })?;
        info!("login succeeded");
        Ok(cookie)
    }
}
