//! Shape classification of raw WebAPI responses

use serde_json::{Map, Value};

use crate::ports::ResponseBody;

/// The shape a raw response takes. Exactly one variant applies to any
/// response; [`ResponseEnvelope::from_json`] checks them in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseEnvelope<'a> {
    /// Login result object: `{"LoginResultType": 1, ...}`.
    Login { result_type: Option<i64>, body: &'a Map<String, Value> },
    /// `{"Result": {"ResponseStatus": {...}}}`. A top-level `Message` on the
    /// same object is still reachable through `root`.
    Status { status: &'a Value, root: &'a Value },
    /// `[{"Result": {"ResponseStatus": {...}}}, ...]`
    ArrayStatus { status: &'a Value, root: &'a Value },
    /// `[[{"Result": {"ResponseStatus": {...}}}, null, ...]]`, as returned by
    /// `ExecuteBillQuery` on failure.
    NestedArrayStatus { status: &'a Value, root: &'a Value },
    /// `[{"FieldName": .., "Message": "..", "DIndex": 0}, ...]`
    ValidationErrors(&'a [Value]),
    /// Bare object with a top-level `Message` string.
    Message { text: &'a str, root: &'a Value },
    /// Non-JSON payload, passed through untouched.
    Binary(&'a [u8]),
    /// Anything else: plain data.
    Data(&'a Value),
}

impl<'a> ResponseEnvelope<'a> {
    /// Classify a transport body; bytes are always [`Self::Binary`].
    pub fn from_body(body: &'a ResponseBody) -> Self {
        match body {
            ResponseBody::Json(value) => Self::from_json(value),
            ResponseBody::Binary(bytes) => Self::Binary(bytes),
        }
    }

    /// Classify a decoded JSON value. Objects are checked for a login
    /// result, then a status, then a `Message`; arrays for a status in
    /// their first (or first nested) element, then validation errors.
    pub fn from_json(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => {
                if let Some(result_type) = map.get("LoginResultType") {
                    return Self::Login { result_type: result_type.as_i64(), body: map };
                }
                if let Some(status) = response_status(value) {
                    return Self::Status { status, root: value };
                }
                if let Some(Value::String(text)) = map.get("Message") {
                    return Self::Message { text, root: value };
                }
                Self::Data(value)
            }
            Value::Array(items) => match items.first() {
                Some(Value::Array(inner)) => match inner.first().and_then(response_status) {
                    Some(status) => Self::NestedArrayStatus { status, root: value },
                    None => Self::Data(value),
                },
                Some(first @ Value::Object(obj)) => {
                    if let Some(status) = response_status(first) {
                        Self::ArrayStatus { status, root: value }
                    } else if obj.get("Message").is_some_and(Value::is_string)
                        && obj.contains_key("DIndex")
                    {
                        Self::ValidationErrors(items)
                    } else {
                        Self::Data(value)
                    }
                }
                _ => Self::Data(value),
            },
            _ => Self::Data(value),
        }
    }

    /// The `ResponseStatus` object for the three status-carrying shapes.
    pub fn status(&self) -> Option<&'a Value> {
        match *self {
            Self::Status { status, .. }
            | Self::ArrayStatus { status, .. }
            | Self::NestedArrayStatus { status, .. } => Some(status),
            _ => None,
        }
    }

    /// `LoginResultType`, if this is a login result.
    pub fn login_result(&self) -> Option<Option<i64>> {
        match *self {
            Self::Login { result_type, .. } => Some(result_type),
            _ => None,
        }
    }
}

fn response_status(value: &Value) -> Option<&Value> {
    value.get("Result")?.get("ResponseStatus").filter(|status| !status.is_null())
}
