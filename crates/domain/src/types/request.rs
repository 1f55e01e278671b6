//! One WebAPI operation call

use serde_json::{json, Value};

use crate::constants::{
    DYNAMIC_FORM_MODULE, REQUEST_FORMAT, SERVICE_STUB_PREFIX, SERVICE_SUFFIX,
};

/// Build the endpoint URL for `module.action` under `host`.
///
/// A trailing slash on `host` is ignored.
pub fn service_url(host: &str, module: &str, action: &str) -> String {
    let base = host.strip_suffix('/').unwrap_or(host);
    format!("{base}/{SERVICE_STUB_PREFIX}.{module}.{action}.{SERVICE_SUFFIX}")
}

/// Module name, action name and the positional parameter list of one call.
///
/// Maps 1:1 to one outbound POST.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    module: String,
    action: String,
    parameters: Vec<Value>,
}

impl OperationRequest {
    /// Call `module.action` with positional `parameters`.
    pub fn new(module: impl Into<String>, action: impl Into<String>, parameters: Vec<Value>) -> Self {
        Self { module: module.into(), action: action.into(), parameters }
    }

    /// Shorthand for the `DynamicFormService` module, which hosts most
    /// business operations (View, Save, ExecuteBillQuery, ExecuteOperation).
    pub fn dynamic_form(action: impl Into<String>, parameters: Vec<Value>) -> Self {
        Self::new(DYNAMIC_FORM_MODULE, action, parameters)
    }

    /// Service module, e.g. `DynamicFormService`.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Action name within the module.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Positional parameters, in call order.
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }

    /// Endpoint URL under `host`.
    pub fn url(&self, host: &str) -> String {
        service_url(host, &self.module, &self.action)
    }

    /// JSON body expected by the service stub. The parameter list travels as
    /// a JSON-encoded string, not as a nested array.
    pub fn body(&self, user_agent: &str, rid: &str) -> Value {
        json!({
            "format": REQUEST_FORMAT,
            "useragent": user_agent,
            "rid": rid,
            "parameters": Value::Array(self.parameters.clone()).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_strips_trailing_slash() {
        assert_eq!(
            service_url("https://erp/K3Cloud/", "DynamicFormService", "View"),
            "https://erp/K3Cloud/Kingdee.BOS.WebApi.ServicesStub.DynamicFormService.View.common.kdsvc"
        );
        assert_eq!(
            service_url("https://erp/K3Cloud", "DynamicFormService", "View"),
            service_url("https://erp/K3Cloud/", "DynamicFormService", "View"),
        );
    }

    #[test]
    fn body_stringifies_parameters() {
        let request = OperationRequest::dynamic_form(
            "View",
            vec![json!("BD_Empinfo"), json!({"Number": "E001"})],
        );
        let body = request.body("agent", "r1");

        assert_eq!(body["format"], json!(1));
        assert_eq!(body["useragent"], json!("agent"));
        assert_eq!(body["rid"], json!("r1"));
        let params: Value =
            serde_json::from_str(body["parameters"].as_str().unwrap()).unwrap();
        assert_eq!(params, json!(["BD_Empinfo", {"Number": "E001"}]));
    }
}
