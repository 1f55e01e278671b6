//! # K3Bridge Domain
//!
//! Business domain types for the Kingdee K/3 Cloud WebAPI bridge.
//!
//! This crate contains:
//! - Credential, request and batch data types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Protocol constants
//!
//! ## Architecture
//! - No dependencies on other K3Bridge crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::params::parse_json_field;
