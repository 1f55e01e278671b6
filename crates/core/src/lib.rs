//! # K3Bridge Core
//!
//! Pure logic layer - no HTTP or storage code.
//!
//! This crate contains:
//! - Response classification and payload normalization
//! - Output shaping and the batch executor
//! - Port interfaces (traits) for transport, login and credential storage
//!
//! ## Architecture Principles
//! - Only depends on `k3bridge-domain`
//! - All external dependencies via traits
//! - Pure, testable logic

pub mod batch;
pub mod ports;
pub mod response;

// Re-export specific items to avoid ambiguity
pub use batch::{BatchExecutor, OutputRouter, RouteOutcome};
pub use ports::{
    Authenticator, CredentialStore, ErrorBody, ResponseBody, Transport, TransportError,
    TransportRequest, TransportResponse,
};
pub use response::{
    normalize, ResponseClassifier, ResponseEnvelope, SessionLossMatcher, Verdict,
};
