use std::{
    collections::{BTreeMap, HashMap},
    sync::RwLock,
};

use chronos_shared::{Collection, Document, Fields, Filter, apply_fields, matches_all};
use tokio::sync::broadcast;
use ulid::Ulid;

use crate::{CHANGE_CAPACITY, DocumentStore};

type Documents = BTreeMap<String, Fields>;

/// In-process store used by tests and by single-session tools.
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Documents>>,
    changes: broadcast::Sender<Collection>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);

        Self {
            collections: RwLock::default(),
            changes,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw body of a document, as written.
    pub fn get(&self, collection: Collection, id: &str) -> Option<Fields> {
        let collections = self.collections.read().ok()?;
        collections.get(&collection)?.get(id).cloned()
    }

    pub fn count(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .map(|c| c.get(&collection).map(BTreeMap::len).unwrap_or_default())
            .unwrap_or_default()
    }

    fn notify(&self, collection: Collection) {
        // No subscriber is not an error.
        let _ = self.changes.send(collection);
    }
}

fn poisoned() -> chronos_shared::Error {
    chronos_shared::Error::Server("memory store lock poisoned".to_owned())
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> chronos_shared::Result<Vec<Document>> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        let Some(documents) = collections.get(&collection) else {
            return Ok(vec![]);
        };

        Ok(documents
            .iter()
            .filter(|(_, fields)| matches_all(filters, fields))
            .map(|(id, fields)| Document::new(id.to_owned(), fields.clone()))
            .collect())
    }

    async fn create(
        &self,
        collection: Collection,
        fields: Fields,
    ) -> chronos_shared::Result<String> {
        let id = Ulid::new().to_string();

        {
            let mut collections = self.collections.write().map_err(|_| poisoned())?;
            collections
                .entry(collection)
                .or_default()
                .insert(id.to_owned(), fields);
        }

        self.notify(collection);

        Ok(id)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> chronos_shared::Result<()> {
        {
            let mut collections = self.collections.write().map_err(|_| poisoned())?;
            let Some(current) = collections.get_mut(&collection).and_then(|c| c.get_mut(id))
            else {
                chronos_shared::not_found!("{collection}/{id}");
            };

            apply_fields(current, &fields);
        }

        self.notify(collection);

        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> chronos_shared::Result<()> {
        let removed = {
            let mut collections = self.collections.write().map_err(|_| poisoned())?;
            collections
                .get_mut(&collection)
                .and_then(|c| c.remove(id))
                .is_some()
        };

        if removed {
            self.notify(collection);
        }

        Ok(())
    }

    fn changes(&self) -> broadcast::Receiver<Collection> {
        self.changes.subscribe()
    }
}
