//! In-memory credential storage for testing and direct embedding.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CredentialStore;
use crate::error::Result;
use crate::models::credentials::CredentialPair;

/// In-memory credential storage.
pub struct MemoryCredentialStore {
    pair: RwLock<CredentialPair>,
}

impl MemoryCredentialStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            pair: RwLock::new(CredentialPair::empty()),
        }
    }

    /// Create a store pre-populated with the given pair.
    pub fn with_pair(pair: CredentialPair) -> Self {
        Self {
            pair: RwLock::new(pair),
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Result<CredentialPair> {
        Ok(self.pair.read().await.clone())
    }

    async fn set(&self, access_token: Option<&str>, refresh_token: Option<&str>) -> Result<()> {
        let mut pair = self.pair.write().await;
        if let Some(token) = access_token {
            pair.access_token = Some(token.to_string());
        }
        if let Some(token) = refresh_token {
            pair.refresh_token = Some(token.to_string());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut pair = self.pair.write().await;
        *pair = CredentialPair::empty();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
