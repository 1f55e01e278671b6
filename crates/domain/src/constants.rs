//! Protocol constants
//!
//! Centralized location for the WebAPI literals used across the bridge.

// Login
/// `LoginResultType` of a successful login.
pub const LOGIN_SUCCESS: i64 = 1;
/// `LoginResultType` of an invalid or expired login.
pub const LOGIN_INVALID: i64 = 0;
/// `MessageCode` sent when the AppSecret signature does not verify.
pub const SIGNATURE_MISMATCH_CODE: &str = "002005000003016";
/// Fragment of the message sent after too many failed logins.
pub const LOCKOUT_MARKER: &str = "次数超限";
/// Module hosting the login actions.
pub const AUTH_MODULE: &str = "AuthService";
/// Application-authorisation login action.
pub const LOGIN_BY_APP_SECRET: &str = "LoginByAppSecret";
/// Password login action.
pub const VALIDATE_USER: &str = "ValidateUser";

// Endpoint layout
/// Namespace every service endpoint lives under.
pub const SERVICE_STUB_PREFIX: &str = "Kingdee.BOS.WebApi.ServicesStub";
/// Endpoint suffix.
pub const SERVICE_SUFFIX: &str = "common.kdsvc";
/// Module hosting most business operations.
pub const DYNAMIC_FORM_MODULE: &str = "DynamicFormService";
/// Row-list query action.
pub const EXECUTE_BILL_QUERY: &str = "ExecuteBillQuery";

// Request body
/// `format` field of every request body.
pub const REQUEST_FORMAT: u8 = 1;
/// `useragent` sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "k3bridge";

// Batching
/// Launches per group in parallel mode.
pub const DEFAULT_BATCH_SIZE: u32 = 50;
/// Milliseconds between launch groups.
pub const DEFAULT_BATCH_INTERVAL_MS: u64 = 0;

// Bill query paging
/// Rows requested per page by the fetch-all query.
pub const BILL_QUERY_PAGE_SIZE: u32 = 2000;

/// Fallback error text when a failure carries no message.
pub const UNKNOWN_ERROR: &str = "unknown error";
