//! Session-aware WebAPI client
//!
//! One [`SessionClient::execute`] is one outer call:
//!
//! 1. send the request with the stored session cookie;
//! 2. if the response (or a failed response's body) says the session is
//!    gone, clear the cookie, log in again and resend once;
//! 3. a second session loss on the resend is a terminal error.
//!
//! The expiry signal never leaves this module.

use std::sync::Arc;
use std::time::Duration;

use k3bridge_core::{
    normalize, Authenticator, CredentialStore, ErrorBody, ResponseBody, ResponseClassifier,
    ResponseEnvelope, Transport, TransportError, TransportRequest, Verdict,
};
use k3bridge_domain::constants::{DEFAULT_USER_AGENT, LOGIN_INVALID};
use k3bridge_domain::{ClientConfig, Credential, K3Error, LanguageCode, OperationRequest, Result};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::WebApiAuthenticator;
use crate::credentials::InMemoryCredentialStore;
use crate::errors::InfraError;
use crate::http::HttpClient;

/// Outcome of one attempt that did not succeed.
#[derive(Debug)]
enum AttemptError {
    /// Session token rejected. Handled by re-authenticating.
    SessionExpired(String),
    Failed(K3Error),
}

impl From<K3Error> for AttemptError {
    fn from(err: K3Error) -> Self {
        Self::Failed(err)
    }
}

/// Calls WebAPI operations with transparent re-authentication.
pub struct SessionClient {
    transport: Arc<dyn Transport>,
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn CredentialStore>,
    classifier: ResponseClassifier,
    user_agent: String,
    timeout: Option<Duration>,
}

impl SessionClient {
    /// Client over explicit collaborators, with the default classifier and
    /// user agent and no request timeout.
    pub fn new(
        transport: Arc<dyn Transport>,
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            transport,
            authenticator,
            store,
            classifier: ResponseClassifier::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }

    /// Wire the reqwest transport, the auth-service login and an in-memory
    /// credential store from configuration.
    ///
    /// # Errors
    /// `K3Error::Config` when the configuration is incomplete,
    /// `K3Error::Transport` when the HTTP client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let http: Arc<dyn Transport> =
            Arc::new(HttpClient::builder().user_agent(config.user_agent.clone()).build()?);
        let authenticator = WebApiAuthenticator::new(Arc::clone(&http)).with_timeout(config.timeout());
        let store = InMemoryCredentialStore::new(config.credential());

        Ok(Self::new(http, Arc::new(authenticator), Arc::new(store))
            .with_user_agent(config.user_agent.clone())
            .with_timeout(config.timeout()))
    }

    /// Replace the classifier, e.g. to recognize extra session-loss phrases.
    pub fn with_classifier(mut self, classifier: ResponseClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Value of the `useragent` field in every request body.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Per-request timeout; `None` waits indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Call an operation that returns JSON.
    ///
    /// # Errors
    /// See [`SessionClient::execute`]. A binary response is reported as
    /// `K3Error::Transport`.
    pub async fn call(&self, request: &OperationRequest) -> Result<Value> {
        match self.execute(request).await? {
            ResponseBody::Json(value) => Ok(value),
            ResponseBody::Binary(bytes) => Err(K3Error::Transport(format!(
                "expected a JSON response from {}.{}, got {} bytes",
                request.module(),
                request.action(),
                bytes.len()
            ))),
        }
    }

    /// Call an operation and return its payload: the unwrapped, normalized
    /// JSON result, or the raw bytes of a non-JSON response.
    ///
    /// # Errors
    /// - `K3Error::Api` for business failures, including a session that is
    ///   lost again right after re-authentication
    /// - `K3Error::Authentication` when the login result is not a success
    /// - `K3Error::Transport` for failures without a parseable body
    #[instrument(skip(self, request), fields(module = request.module(), action = request.action()))]
    pub async fn execute(&self, request: &OperationRequest) -> Result<ResponseBody> {
        let mut credential = self.store.load().await?;
        if credential.session().is_none() {
            debug!("no session token, logging in");
            credential = self.login(credential).await?;
        }

        match self.attempt(&credential, request).await {
            Ok(body) => Ok(body),
            Err(AttemptError::Failed(err)) => Err(err),
            Err(AttemptError::SessionExpired(reason)) => {
                info!(%reason, "session expired, re-authenticating");
                self.store.store_session_token(None).await?;
                let credential = self.login(credential.without_session()).await?;
                // No second re-authentication: a repeated loss is terminal.
                match self.attempt(&credential, request).await {
                    Ok(body) => Ok(body),
                    Err(AttemptError::Failed(err)) => Err(err),
                    Err(AttemptError::SessionExpired(reason)) => {
                        warn!(%reason, "session lost again after re-authentication");
                        Err(K3Error::Api(format!(
                            "session lost again after re-authentication: {reason}"
                        )))
                    }
                }
            }
        }
    }

    async fn login(&self, credential: Credential) -> Result<Credential> {
        let token = self.authenticator.login(&credential).await?;
        self.store.store_session_token(Some(token.clone())).await?;
        Ok(credential.with_session_token(token))
    }

    async fn attempt(
        &self,
        credential: &Credential,
        request: &OperationRequest,
    ) -> std::result::Result<ResponseBody, AttemptError> {
        let outbound = TransportRequest {
            url: request.url(&credential.host),
            body: request.body(&self.user_agent, &request_id()),
            session_token: credential.session().map(str::to_string),
            timeout: self.timeout,
        };

        match self.transport.post(outbound).await {
            Ok(response) => self.interpret(response.body, credential.locale),
            Err(err) => self.interpret_failure(err),
        }
    }

    fn interpret(
        &self,
        body: ResponseBody,
        locale: LanguageCode,
    ) -> std::result::Result<ResponseBody, AttemptError> {
        let value = match body {
            ResponseBody::Binary(bytes) => return Ok(ResponseBody::Binary(bytes)),
            ResponseBody::Json(value) => value,
        };

        let envelope = ResponseEnvelope::from_json(&value);
        match self.classifier.verdict(&envelope) {
            Verdict::Success => {
                let payload = self.classifier.extract_payload(&value);
                Ok(ResponseBody::Json(normalize(payload, locale)))
            }
            Verdict::SessionLost { message } => Err(AttemptError::SessionExpired(message)),
            Verdict::Rejected { message, login: true } => {
                Err(K3Error::Authentication(message).into())
            }
            Verdict::Rejected { message, login: false } => {
                warn!(%message, "operation rejected");
                Err(K3Error::Api(message).into())
            }
        }
    }

    /// A failed response may still carry a body worth reading: JSON is
    /// classified like a success body, plain text is only checked for
    /// session-loss wording.
    fn interpret_failure(
        &self,
        err: TransportError,
    ) -> std::result::Result<ResponseBody, AttemptError> {
        let body = match &err.body {
            Some(ErrorBody::Json(value)) => value.clone(),
            Some(ErrorBody::Text(text)) => match serde_json::from_str::<Value>(text) {
                Ok(value) => value,
                Err(_) if self.classifier.matcher().matches(text) => {
                    return Err(AttemptError::SessionExpired(text.trim().to_string()));
                }
                Err(_) => return Err(K3Error::from(InfraError::from(err)).into()),
            },
            None => return Err(K3Error::from(InfraError::from(err)).into()),
        };

        let envelope = ResponseEnvelope::from_json(&body);
        let message = self.classifier.extract_error_message(&envelope);
        let login_invalid = envelope.login_result() == Some(Some(LOGIN_INVALID));

        if login_invalid || self.classifier.is_session_lost(&envelope) {
            return Err(AttemptError::SessionExpired(message));
        }

        warn!(status = ?err.status, %message, "operation failed");
        Err(K3Error::Api(message).into())
    }
}

fn request_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use k3bridge_core::{SessionLossMatcher, TransportResponse};
    use k3bridge_domain::AuthMethod;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;

    type Reply = std::result::Result<TransportResponse, TransportError>;

    /// Replays canned replies in order and records the cookie of each call.
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Reply>>,
        cookies: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Reply>) -> Arc<Self> {
            Arc::new(Self { replies: Mutex::new(replies.into()), ..Self::default() })
        }

        fn cookies(&self) -> Vec<Option<String>> {
            self.cookies.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post(
            &self,
            request: TransportRequest,
        ) -> std::result::Result<TransportResponse, TransportError> {
            self.cookies.lock().push(request.session_token);
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::network("no scripted reply left")))
        }
    }

    /// Hands out `sid=1`, `sid=2`, ...
    #[derive(Default)]
    struct CountingAuthenticator {
        logins: AtomicUsize,
    }

    #[async_trait]
    impl Authenticator for CountingAuthenticator {
        async fn login(&self, _credential: &Credential) -> Result<String> {
            let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("sid={n}"))
        }
    }

    struct Harness {
        client: SessionClient,
        transport: Arc<ScriptedTransport>,
        auth: Arc<CountingAuthenticator>,
        store: Arc<InMemoryCredentialStore>,
    }

    fn harness(token: Option<&str>, replies: Vec<Reply>) -> Harness {
        let mut credential = Credential::new(
            "https://erp.example.com/K3Cloud",
            "acct",
            "bot",
            AuthMethod::Password { password: "pw".into() },
        )
        .with_locale(LanguageCode::ENGLISH);
        if let Some(token) = token {
            credential = credential.with_session_token(token);
        }

        let transport = ScriptedTransport::new(replies);
        let auth = Arc::new(CountingAuthenticator::default());
        let store = Arc::new(InMemoryCredentialStore::new(credential));
        let client = SessionClient::new(
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&auth) as Arc<dyn Authenticator>,
            Arc::clone(&store) as Arc<dyn CredentialStore>,
        );
        Harness { client, transport, auth, store }
    }

    fn ok(body: Value) -> Reply {
        Ok(TransportResponse::json(body))
    }

    fn session_lost() -> Reply {
        ok(json!({"Result": {"ResponseStatus": {
            "IsSuccess": false,
            "Errors": [{"Message": "会话信息已丢失，请重新登录"}]
        }}}))
    }

    fn view() -> OperationRequest {
        OperationRequest::dynamic_form("View", vec![json!("BD_MATERIAL"), json!({"Number": "M001"})])
    }

    impl Harness {
        fn logins(&self) -> usize {
            self.auth.logins.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn logs_in_first_when_no_token_is_stored() {
        let h = harness(None, vec![ok(json!({"Result": {"Result": {"FNumber": "M001"}}}))]);

        let value = h.client.call(&view()).await.unwrap();

        assert_eq!(value, json!({"FNumber": "M001"}));
        assert_eq!(h.logins(), 1);
        assert_eq!(h.transport.cookies(), vec![Some("sid=1".to_string())]);
        assert_eq!(h.store.snapshot().session(), Some("sid=1"));
    }

    #[tokio::test]
    async fn payload_is_normalized_for_the_locale() {
        let h = harness(
            Some("sid=0"),
            vec![ok(json!({"Result": {"Result": {
                "FName": [{"Key": 2052, "Value": "螺栓"}, {"Key": 1033, "Value": "Bolt"}],
                "FCreateDate": "/Date(0)/"
            }}}))],
        );

        let value = h.client.call(&view()).await.unwrap();

        assert_eq!(value, json!({"FName": "Bolt", "FCreateDate": "1970-01-01T00:00:00.000Z"}));
        assert_eq!(h.logins(), 0);
    }

    #[tokio::test]
    async fn reauthenticates_once_on_session_loss() {
        let h = harness(
            Some("sid=stale"),
            vec![session_lost(), ok(json!({"Result": {"Result": {"Id": 7}}}))],
        );

        let value = h.client.call(&view()).await.unwrap();

        assert_eq!(value, json!({"Id": 7}));
        assert_eq!(h.logins(), 1);
        assert_eq!(
            h.transport.cookies(),
            vec![Some("sid=stale".to_string()), Some("sid=1".to_string())]
        );
        assert_eq!(h.store.snapshot().session(), Some("sid=1"));
    }

    #[tokio::test]
    async fn second_session_loss_is_terminal() {
        let h = harness(Some("sid=stale"), vec![session_lost(), session_lost(), session_lost()]);

        let err = h.client.call(&view()).await.unwrap_err();

        match err {
            K3Error::Api(message) => {
                assert!(message.starts_with("session lost again after re-authentication"));
                assert!(message.contains("会话信息已丢失"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
        assert_eq!(h.logins(), 1);
        assert_eq!(h.transport.cookies().len(), 2);
    }

    #[tokio::test]
    async fn invalid_login_result_in_error_body_triggers_reauth() {
        let h = harness(
            Some("sid=stale"),
            vec![
                Err(TransportError::status(500, Some(ErrorBody::Json(json!({"LoginResultType": 0}))))),
                ok(json!({"Result": {"Result": true}})),
            ],
        );

        assert_eq!(h.client.call(&view()).await.unwrap(), json!(true));
        assert_eq!(h.logins(), 1);
    }

    #[tokio::test]
    async fn text_error_body_is_parsed_before_inspection() {
        let body = json!({"Message": "Session expired"}).to_string();
        let h = harness(
            Some("sid=stale"),
            vec![
                Err(TransportError::status(500, Some(ErrorBody::Text(body)))),
                ok(json!({"Result": {"Result": {"Id": 1}}})),
            ],
        );

        assert_eq!(h.client.call(&view()).await.unwrap(), json!({"Id": 1}));
        assert_eq!(h.logins(), 1);
    }

    #[tokio::test]
    async fn unparseable_error_body_surfaces_transport_error() {
        let h = harness(
            Some("sid=0"),
            vec![Err(TransportError::status(502, Some(ErrorBody::Text("Bad Gateway".into()))))],
        );

        let err = h.client.call(&view()).await.unwrap_err();

        assert_eq!(err, K3Error::Transport("HTTP 502".into()));
        assert_eq!(h.logins(), 0);
    }

    #[tokio::test]
    async fn business_failure_is_not_retried() {
        let h = harness(
            Some("sid=0"),
            vec![ok(json!({"Result": {"ResponseStatus": {
                "IsSuccess": false,
                "Errors": [{"Message": "编码重复"}, {"Message": "名称为空"}]
            }}}))],
        );

        let err = h.client.call(&view()).await.unwrap_err();

        assert_eq!(err, K3Error::Api("编码重复; 名称为空".into()));
        assert_eq!(h.logins(), 0);
        assert_eq!(h.transport.cookies().len(), 1);
    }

    #[tokio::test]
    async fn business_failure_in_error_body_is_an_api_error() {
        let h = harness(
            Some("sid=0"),
            vec![Err(TransportError::status(
                500,
                Some(ErrorBody::Json(json!({"Result": {"ResponseStatus": {
                    "IsSuccess": false,
                    "Errors": [{"Message": "编码重复"}, {"Message": "名称为空"}]
                }}}))),
            ))],
        );

        let err = h.client.call(&view()).await.unwrap_err();

        assert_eq!(err, K3Error::Api("编码重复; 名称为空".into()));
        assert_eq!(h.logins(), 0);
        assert_eq!(h.transport.cookies().len(), 1);
    }

    #[tokio::test]
    async fn plain_text_session_notice_triggers_reauth() {
        let h = harness(
            Some("sid=stale"),
            vec![
                Err(TransportError::not_json(200, "会话信息已丢失，请重新登录".into())),
                ok(json!({"Result": {"Result": {"Id": 3}}})),
            ],
        );

        assert_eq!(h.client.call(&view()).await.unwrap(), json!({"Id": 3}));
        assert_eq!(h.logins(), 1);
        assert_eq!(
            h.transport.cookies(),
            vec![Some("sid=stale".to_string()), Some("sid=1".to_string())]
        );
    }

    #[tokio::test]
    async fn plain_text_without_session_wording_is_a_transport_error() {
        let h = harness(
            Some("sid=0"),
            vec![Err(TransportError::not_json(200, "<html>maintenance</html>".into()))],
        );

        let err = h.client.call(&view()).await.unwrap_err();

        assert_eq!(err, K3Error::Transport("HTTP 200: response is not JSON".into()));
        assert_eq!(h.logins(), 0);
    }

    #[tokio::test]
    async fn custom_classifier_phrases_trigger_reauth() {
        let mut h = harness(
            Some("sid=stale"),
            vec![
                ok(json!({"Message": "Token revoked by administrator"})),
                ok(json!({"Result": {"Result": {"Id": 4}}})),
            ],
        );
        let matcher = SessionLossMatcher::default().with_phrase("token revoked");
        h.client = h.client.with_classifier(ResponseClassifier::new(matcher));

        assert_eq!(h.client.call(&view()).await.unwrap(), json!({"Id": 4}));
        assert_eq!(h.logins(), 1);
    }

    #[tokio::test]
    async fn binary_responses_pass_through_execute() {
        let pdf = vec![0x25, 0x50, 0x44, 0x46];
        let h = harness(
            Some("sid=0"),
            vec![
                Ok(TransportResponse {
                    status: 200,
                    body: ResponseBody::Binary(pdf.clone()),
                    set_cookies: Vec::new(),
                }),
                Ok(TransportResponse {
                    status: 200,
                    body: ResponseBody::Binary(pdf.clone()),
                    set_cookies: Vec::new(),
                }),
            ],
        );

        assert_eq!(h.client.execute(&view()).await.unwrap(), ResponseBody::Binary(pdf));
        assert!(matches!(h.client.call(&view()).await, Err(K3Error::Transport(_))));
    }
}
