//! Remote document store: contract and the HTTP driver

mod http;

pub use http::HttpRemoteStore;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::Entity;

/// Network-accessible authoritative store for one entity collection.
///
/// The locally generated id doubles as the remote document id, so `upsert`
/// is the single write path for creates and updates alike and no id remap
/// step exists.
#[async_trait]
pub trait RemoteStore<E: Entity>: Send + Sync {
    /// Create or replace the document addressed by the entity's id
    async fn upsert(&self, entity: &E) -> Result<E>;

    /// Delete the document; deleting an absent document succeeds
    async fn delete(&self, id: &str) -> Result<()>;

    /// Point read; `None` when the document does not exist
    async fn fetch(&self, id: &str) -> Result<Option<E>>;

    /// Read the full collection
    async fn list(&self) -> Result<Vec<E>>;
}

/// Remote stand-in for local-only (anonymous) mode.
///
/// Every call fails with a remote error, so strategies that define a local
/// fallback keep working while `Fresh`/`Synced` reads surface the failure.
pub struct UnconfiguredRemote;

impl UnconfiguredRemote {
    fn error() -> Error {
        Error::Remote("remote store is not configured".to_string())
    }
}

#[async_trait]
impl<E: Entity> RemoteStore<E> for UnconfiguredRemote {
    async fn upsert(&self, _entity: &E) -> Result<E> {
        Err(Self::error())
    }

    async fn delete(&self, _id: &str) -> Result<()> {
        Err(Self::error())
    }

    async fn fetch(&self, _id: &str) -> Result<Option<E>> {
        Err(Self::error())
    }

    async fn list(&self) -> Result<Vec<E>> {
        Err(Self::error())
    }
}
