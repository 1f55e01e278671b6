//! Success, session-loss and error-message classification
//!
//! Every query goes through [`ResponseEnvelope`], so the shape precedence
//! lives in one place: login result first, then session loss, then the
//! generic status flag.

use k3bridge_domain::constants::{
    LOCKOUT_MARKER, LOGIN_SUCCESS, SIGNATURE_MISMATCH_CODE, UNKNOWN_ERROR,
};
use serde_json::Value;

use super::envelope::ResponseEnvelope;
use super::session::SessionLossMatcher;

const SIGNATURE_MISMATCH_HINT: &str = "hint: signature mismatch; reset the AppSecret in the \
     management console and check that the appId is complete (including the underscore)";
const LOCKOUT_HINT: &str = "hint: too many failed logins; the user may be locked, ask an \
     administrator to unlock it or wait 30 minutes";

/// Result of classifying one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The call succeeded; the payload can be extracted.
    Success,
    /// Session token rejected; the caller should re-authenticate.
    SessionLost { message: String },
    /// Any other failure. `login` marks a failed login result.
    Rejected { message: String, login: bool },
}

/// Stateless interpreter of WebAPI responses.
#[derive(Debug, Clone, Default)]
pub struct ResponseClassifier {
    matcher: SessionLossMatcher,
}

impl ResponseClassifier {
    /// Classifier that recognizes session loss with `matcher`.
    pub fn new(matcher: SessionLossMatcher) -> Self {
        Self { matcher }
    }

    /// Phrase set used for session-loss detection, also applied to
    /// plain-text bodies that never become an envelope.
    pub fn matcher(&self) -> &SessionLossMatcher {
        &self.matcher
    }

    /// True when any error text carried by the response names a lost
    /// session. Login results are never session loss.
    pub fn is_session_lost(&self, envelope: &ResponseEnvelope<'_>) -> bool {
        match *envelope {
            ResponseEnvelope::Login { .. }
            | ResponseEnvelope::Binary(_)
            | ResponseEnvelope::Data(_) => false,
            ResponseEnvelope::Status { status, root } => {
                error_messages(status).any(|m| self.matcher.matches(m))
                    || top_level_message(root).is_some_and(|m| self.matcher.matches(m))
            }
            ResponseEnvelope::ArrayStatus { status, .. }
            | ResponseEnvelope::NestedArrayStatus { status, .. } => {
                error_messages(status).any(|m| self.matcher.matches(m))
            }
            ResponseEnvelope::ValidationErrors(items) => items
                .iter()
                .filter_map(|item| item.get("Message").and_then(Value::as_str))
                .any(|m| self.matcher.matches(m)),
            ResponseEnvelope::Message { text, .. } => self.matcher.matches(text),
        }
    }

    /// Login results succeed only with the success code; everything else
    /// needs `IsSuccess == true` when a status is present.
    pub fn is_success(&self, envelope: &ResponseEnvelope<'_>) -> bool {
        if let Some(result_type) = envelope.login_result() {
            return result_type == Some(LOGIN_SUCCESS);
        }
        if self.is_session_lost(envelope) {
            return false;
        }
        match envelope.status() {
            Some(status) => status.get("IsSuccess").and_then(Value::as_bool) == Some(true),
            None => true,
        }
    }

    /// Human-readable failure text. Multiple errors are joined with `"; "`.
    pub fn extract_error_message(&self, envelope: &ResponseEnvelope<'_>) -> String {
        match *envelope {
            ResponseEnvelope::Login { body, .. } => {
                let message = body.get("Message").and_then(Value::as_str).filter(|m| !m.is_empty());
                let mut text = match message {
                    Some(m) => m.to_string(),
                    None => Value::Object(body.clone()).to_string(),
                };
                if body.get("MessageCode").and_then(Value::as_str) == Some(SIGNATURE_MISMATCH_CODE)
                {
                    text.push('\n');
                    text.push_str(SIGNATURE_MISMATCH_HINT);
                } else if message.is_some_and(|m| m.contains(LOCKOUT_MARKER)) {
                    text.push('\n');
                    text.push_str(LOCKOUT_HINT);
                }
                text
            }
            ResponseEnvelope::Status { status, root }
            | ResponseEnvelope::ArrayStatus { status, root }
            | ResponseEnvelope::NestedArrayStatus { status, root } => {
                let joined = error_messages(status).collect::<Vec<_>>().join("; ");
                if !joined.is_empty() {
                    return joined;
                }
                if let Some(message) = top_level_message(root) {
                    return message.to_string();
                }
                match status.get("Errors") {
                    Some(Value::Array(errors)) if !errors.is_empty() => {
                        Value::Array(errors.clone()).to_string()
                    }
                    _ => UNKNOWN_ERROR.to_string(),
                }
            }
            ResponseEnvelope::ValidationErrors(items) => items
                .iter()
                .map(|item| match item.get("Message").and_then(Value::as_str) {
                    Some(m) if !m.is_empty() => m.to_string(),
                    _ => item.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            ResponseEnvelope::Message { text, root } => {
                if text.is_empty() {
                    root.to_string()
                } else {
                    text.to_string()
                }
            }
            ResponseEnvelope::Binary(_) | ResponseEnvelope::Data(_) => UNKNOWN_ERROR.to_string(),
        }
    }

    /// Classify once and package the outcome.
    pub fn verdict(&self, envelope: &ResponseEnvelope<'_>) -> Verdict {
        if self.is_success(envelope) {
            return Verdict::Success;
        }
        let message = self.extract_error_message(envelope);
        match envelope {
            ResponseEnvelope::Login { .. } => Verdict::Rejected { message, login: true },
            _ if self.is_session_lost(envelope) => Verdict::SessionLost { message },
            _ => Verdict::Rejected { message, login: false },
        }
    }

    /// Unwrap `Result.Result`, else `Result`, else the value itself. Empty
    /// or falsy containers are skipped.
    pub fn extract_payload<'v>(&self, value: &'v Value) -> &'v Value {
        let outer = value.get("Result").filter(|v| is_truthy(v));
        outer
            .and_then(|r| r.get("Result"))
            .filter(|v| is_truthy(v))
            .or(outer)
            .unwrap_or(value)
    }
}

fn error_messages(status: &Value) -> impl Iterator<Item = &str> {
    status
        .get("Errors")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|e| e.get("Message").and_then(Value::as_str))
        .filter(|m| !m.is_empty())
}

/// Non-empty `Message` string on the root object, if any.
fn top_level_message(root: &Value) -> Option<&str> {
    root.get("Message").and_then(Value::as_str).filter(|m| !m.is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
