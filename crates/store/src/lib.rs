//! Document store adapter.
//!
//! Plans and habits are JSON-like documents grouped in named collections.
//! [`DocumentStore`] exposes the primitives the planning engines need:
//! equality/range queries, create with a store-assigned id, partial updates
//! with dotted-path targeting, and a change feed that [`Subscription`] turns
//! into live snapshots.

mod memory;
mod subscription;

pub use memory::*;
pub use subscription::*;

use std::sync::Arc;

use chronos_shared::{Collection, Document, Fields, Filter};
use tokio::sync::broadcast;

cfg_if::cfg_if! {
    if #[cfg(feature = "full")] {
        mod sqlite;

        pub use sqlite::*;
    }
}

#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Documents of `collection` matching every filter.
    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> chronos_shared::Result<Vec<Document>>;

    /// Inserts a new document and returns its id.
    async fn create(&self, collection: Collection, fields: Fields)
    -> chronos_shared::Result<String>;

    /// Merges `fields` into an existing document. Dotted keys only replace the
    /// nested key they name.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> chronos_shared::Result<()>;

    async fn delete(&self, collection: Collection, id: &str) -> chronos_shared::Result<()>;

    /// Notified with the collection name after every successful write.
    fn changes(&self) -> broadcast::Receiver<Collection>;
}

pub type SharedStore = Arc<dyn DocumentStore>;

pub(crate) const CHANGE_CAPACITY: usize = 256;
