//! Conversions from external infrastructure errors into domain errors.

use k3bridge_core::TransportError;
use k3bridge_domain::K3Error;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub K3Error);

impl From<InfraError> for K3Error {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<K3Error> for InfraError {
    fn from(value: K3Error) -> Self {
        InfraError(value)
    }
}

trait IntoK3Error {
    fn into_k3(self) -> K3Error;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → K3Error */
/* -------------------------------------------------------------------------- */

fn describe(err: &HttpError) -> String {
    if err.is_timeout() {
        return "HTTP request timed out".into();
    }

    #[cfg(not(target_arch = "wasm32"))]
    if err.is_connect() {
        return "HTTP connection failure".into();
    }

    if let Some(status) = err.status() {
        return format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown status")
        );
    }

    if err.is_decode() {
        return format!("HTTP response body could not be decoded: {err}");
    }

    format!("HTTP request failed: {err}")
}

impl IntoK3Error for HttpError {
    fn into_k3(self) -> K3Error {
        K3Error::Transport(describe(&self))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_k3())
    }
}

/// Port-level failure for a request that produced no response.
pub fn transport_failure(err: &HttpError) -> TransportError {
    TransportError::network(describe(err))
}

/* -------------------------------------------------------------------------- */
/* TransportError → K3Error */
/* -------------------------------------------------------------------------- */

impl IntoK3Error for TransportError {
    fn into_k3(self) -> K3Error {
        K3Error::Transport(self.message)
    }
}

impl From<TransportError> for InfraError {
    fn from(value: TransportError) -> Self {
        InfraError(value.into_k3())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
