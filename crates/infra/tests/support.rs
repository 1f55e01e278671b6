//! Shared wiremock fixtures for the infra integration tests

#![allow(dead_code)]

use std::sync::Arc;

use k3bridge_core::{Authenticator, CredentialStore, Transport};
use k3bridge_domain::{AuthMethod, Credential, LanguageCode};
use k3bridge_infra::{HttpClient, InMemoryCredentialStore, SessionClient, WebApiAuthenticator};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LOGIN_PATH: &str =
    "/Kingdee.BOS.WebApi.ServicesStub.AuthService.LoginByAppSecret.common.kdsvc";
pub const VIEW_PATH: &str =
    "/Kingdee.BOS.WebApi.ServicesStub.DynamicFormService.View.common.kdsvc";
pub const BILL_QUERY_PATH: &str =
    "/Kingdee.BOS.WebApi.ServicesStub.DynamicFormService.ExecuteBillQuery.common.kdsvc";

pub fn credential(host: &str) -> Credential {
    Credential::new(
        host,
        "62f0a1",
        "integration",
        AuthMethod::AppSecret { app_id: "231669_abc".into(), app_secret: "s3cret".into() },
    )
    .with_locale(LanguageCode::ENGLISH)
}

/// Client wired to real adapters against `server`.
pub fn session_client(server: &MockServer) -> (SessionClient, Arc<InMemoryCredentialStore>) {
    let http: Arc<dyn Transport> =
        Arc::new(HttpClient::builder().max_attempts(1).build().expect("http client"));
    let authenticator: Arc<dyn Authenticator> = Arc::new(WebApiAuthenticator::new(Arc::clone(&http)));
    let store = Arc::new(InMemoryCredentialStore::new(credential(&server.uri())));
    let client =
        SessionClient::new(http, authenticator, Arc::clone(&store) as Arc<dyn CredentialStore>);
    (client, store)
}

pub fn login_ok(session_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("set-cookie", format!("kdservice-sessionid={session_id}; path=/; HttpOnly"))
        .set_body_json(json!({"LoginResultType": 1, "Message": null}))
}

pub fn session_lost_body() -> Value {
    json!({"Result": {"ResponseStatus": {
        "IsSuccess": false,
        "Errors": [{"FieldName": null, "Message": "会话信息已丢失，请重新登录", "DIndex": 0}]
    }}})
}

pub fn success_body(result: Value) -> Value {
    json!({"Result": {"ResponseStatus": {"IsSuccess": true, "Errors": []}, "Result": result}})
}

pub async fn mount_login(server: &MockServer, session_id: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .respond_with(login_ok(session_id))
        .up_to_n_times(times)
        .expect(times)
        .mount(server)
        .await;
}

/// Decoded positional parameter list of a captured request.
pub fn request_parameters(request: &wiremock::Request) -> Value {
    let body: Value = serde_json::from_slice(&request.body).expect("json body");
    let parameters = body["parameters"].as_str().expect("parameters string");
    serde_json::from_str(parameters).expect("parameters json")
}
