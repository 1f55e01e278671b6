//! Configuration loading
//!
//! Reads [`ClientConfig`](k3bridge_domain::ClientConfig) from environment
//! variables or a config file.

pub mod loader;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths};
