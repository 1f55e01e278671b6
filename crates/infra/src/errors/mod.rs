//! Infrastructure error conversions

pub mod conversions;

pub use conversions::{transport_failure, InfraError};
