//! # K3Bridge Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - reqwest-backed HTTP transport
//! - Login against the WebAPI auth service
//! - The session-aware client and bill query helpers
//! - Configuration loading and tracing setup
//!
//! ## Architecture
//! - Implements traits defined in `k3bridge-core`
//! - Depends on `k3bridge-domain` and `k3bridge-core`
//! - Contains all "impure" code (network, environment, files)

pub mod auth;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod http;
pub mod observability;
pub mod session;

// Re-export commonly used items
pub use auth::WebApiAuthenticator;
pub use credentials::InMemoryCredentialStore;
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::init_tracing;
pub use session::{merge_field_keys, rows_to_objects, BillQuery, SessionClient};
