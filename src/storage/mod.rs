//! Credential storage backends.
//!
//! Provides the [`CredentialStore`] trait and implementations:
//! - [`MemoryCredentialStore`] - In-memory (testing, embedding)
//! - [`cookie`] - request/response cookie header persistence used by the
//!   route gate

mod memory;

pub mod cookie;

use async_trait::async_trait;
use tracing::debug;

pub use memory::MemoryCredentialStore;

use crate::error::Result;
use crate::models::credentials::{CredentialPair, Mutation};

/// Trait for credential storage backends.
///
/// Only the session resolver and the route gate decide on clearing;
/// stores merely execute the mutations handed to them.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Snapshot of the currently stored pair.
    async fn get(&self) -> Result<CredentialPair>;

    /// Store the given tokens. `None` leaves that entry unchanged.
    async fn set(&self, access_token: Option<&str>, refresh_token: Option<&str>) -> Result<()>;

    /// Remove both entries, even when only one is present. Idempotent:
    /// clearing an empty store is a no-op and never errors.
    async fn clear(&self) -> Result<()>;

    /// Replay resolver mutations in order.
    async fn apply(&self, mutations: &[Mutation]) -> Result<()> {
        debug!(
            store = self.name(),
            count = mutations.len(),
            "Applying credential mutations"
        );
        for mutation in mutations {
            match mutation {
                Mutation::SetAccess(token) => self.set(Some(token), None).await?,
                Mutation::SetRefresh(token) => self.set(None, Some(token)).await?,
                Mutation::ClearAll => self.clear().await?,
            }
        }
        Ok(())
    }

    /// Name of this storage backend.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Blanket impl for `Arc<T>`.
#[async_trait]
impl<T: CredentialStore + ?Sized> CredentialStore for std::sync::Arc<T> {
    async fn get(&self) -> Result<CredentialPair> {
        (**self).get().await
    }
    async fn set(&self, access_token: Option<&str>, refresh_token: Option<&str>) -> Result<()> {
        (**self).set(access_token, refresh_token).await
    }
    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }
    async fn apply(&self, mutations: &[Mutation]) -> Result<()> {
        (**self).apply(mutations).await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Blanket impl for `Box<T>`.
#[async_trait]
impl<T: CredentialStore + ?Sized> CredentialStore for Box<T> {
    async fn get(&self) -> Result<CredentialPair> {
        (**self).get().await
    }
    async fn set(&self, access_token: Option<&str>, refresh_token: Option<&str>) -> Result<()> {
        (**self).set(access_token, refresh_token).await
    }
    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }
    async fn apply(&self, mutations: &[Mutation]) -> Result<()> {
        (**self).apply(mutations).await
    }
    fn name(&self) -> &str {
        (**self).name()
    }
}
