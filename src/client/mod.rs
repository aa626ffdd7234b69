//! The narrow boundary between controllers and the remote store.

use async_trait::async_trait;

use crate::error::Result;
use crate::resource::Resource;

pub mod scripted;
pub mod sqlite;

pub use scripted::{Op, ScriptedClient};
pub use sqlite::SqliteClient;

/// Per-resource access to the remote store. No retries, no transactions
/// across resources, and last writer wins on update.
#[async_trait]
pub trait RemoteClient<R: Resource>: Send + Sync {
    /// Every row visible to the caller, in the resource's sort order.
    async fn list(&self) -> Result<Vec<R>>;

    /// Creates a row. Identity, owner and timestamps are assigned by the
    /// store. Fails with `Error::NotAuthenticated` when there is no caller.
    async fn insert(&self, fields: &R::Fields) -> Result<R>;

    /// Replaces the fields of an existing row.
    async fn update(&self, id: &str, fields: &R::Fields) -> Result<()>;

    /// Removes a row. Removing a row that is already gone succeeds.
    async fn delete(&self, id: &str) -> Result<()>;
}
