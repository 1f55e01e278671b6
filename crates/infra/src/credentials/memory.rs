//! Process-local credential store

use async_trait::async_trait;
use k3bridge_core::CredentialStore;
use k3bridge_domain::{Credential, Result};
use parking_lot::RwLock;
use tracing::debug;

/// Holds one credential in memory. Hosts that persist credentials elsewhere
/// implement [`CredentialStore`] themselves.
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    credential: RwLock<Credential>,
}

impl InMemoryCredentialStore {
    /// Store seeded with `credential`.
    pub fn new(credential: Credential) -> Self {
        Self { credential: RwLock::new(credential) }
    }

    /// Current snapshot, including the session token.
    pub fn snapshot(&self) -> Credential {
        self.credential.read().clone()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<Credential> {
        Ok(self.credential.read().clone())
    }

    async fn store_session_token(&self, token: Option<String>) -> Result<()> {
        debug!(present = token.is_some(), "storing session token");
        self.credential.write().session_token = token;
        Ok(())
    }
}
