//! Credential record shared with the external credential store

use std::fmt;

use serde::{Deserialize, Serialize};

use super::locale::LanguageCode;
use super::request::service_url;
use crate::constants::{AUTH_MODULE, LOGIN_BY_APP_SECRET, VALIDATE_USER};

/// How the bridge proves its identity at login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuthMethod {
    /// Application authorisation (`LoginByAppSecret`). Recommended.
    AppSecret {
        /// Application id, including the `_` separated suffix.
        app_id: String,
        /// Application secret.
        app_secret: String,
    },
    /// Account and password (`ValidateUser`). Deprecated upstream, kept for
    /// older installations.
    Password {
        /// Account password.
        password: String,
    },
}

impl AuthMethod {
    /// Name of the login action in the auth service.
    pub fn login_action(&self) -> &'static str {
        match self {
            Self::AppSecret { .. } => LOGIN_BY_APP_SECRET,
            Self::Password { .. } => VALIDATE_USER,
        }
    }
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AppSecret { app_id, .. } => f
                .debug_struct("AppSecret")
                .field("app_id", app_id)
                .field("app_secret", &"<redacted>")
                .finish(),
            Self::Password { .. } => {
                f.debug_struct("Password").field("password", &"<redacted>").finish()
            }
        }
    }
}

/// Everything needed to log in and to call the WebAPI on behalf of one
/// account.
///
/// The session token is the only field that changes during the lifetime of a
/// credential: absent, then obtained by login, then cleared when the server
/// drops the session, then obtained again.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Base URL, e.g. `https://erp.example.com/K3Cloud`
    pub host: String,
    /// Data-center id.
    pub account_id: String,
    /// Login user name.
    pub username: String,
    /// Login method.
    pub auth: AuthMethod,
    /// Locale sent at login.
    #[serde(default)]
    pub locale: LanguageCode,
    /// Cookie header value of the current session.
    #[serde(default)]
    pub session_token: Option<String>,
}

impl Credential {
    /// Credential in the default locale, without a session.
    pub fn new(
        host: impl Into<String>,
        account_id: impl Into<String>,
        username: impl Into<String>,
        auth: AuthMethod,
    ) -> Self {
        Self {
            host: host.into(),
            account_id: account_id.into(),
            username: username.into(),
            auth,
            locale: LanguageCode::default(),
            session_token: None,
        }
    }

    /// Set the locale.
    pub fn with_locale(mut self, locale: LanguageCode) -> Self {
        self.locale = locale;
        self
    }

    /// Attach an existing session token.
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Copy of this credential with the session token removed, used to force
    /// a fresh login.
    pub fn without_session(&self) -> Self {
        Self { session_token: None, ..self.clone() }
    }

    /// Session token, treating an empty string the same as no token.
    pub fn session(&self) -> Option<&str> {
        self.session_token.as_deref().filter(|token| !token.is_empty())
    }

    /// Full URL of the login endpoint for this credential's auth method.
    pub fn login_url(&self) -> String {
        service_url(&self.host, AUTH_MODULE, self.auth.login_action())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("host", &self.host)
            .field("account_id", &self.account_id)
            .field("username", &self.username)
            .field("auth", &self.auth)
            .field("locale", &self.locale)
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
