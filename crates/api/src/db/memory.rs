//! In-memory document store.
//!
//! Backs the `/api/mock` routes, and every durable route when no database is
//! configured. Nothing survives a restart.

use std::collections::HashMap;

use async_trait::async_trait;
use rootedlane_core::{Collection, Document, generate_local_id};
use tokio::sync::RwLock;

use super::{DocumentStore, Filter, RepositoryError};

/// Process-local store with one ordered, lock-guarded list per collection.
///
/// Every read-modify-write on a collection (merge on update, uniqueness checks
/// on insert) happens under that collection's write lock, so concurrent
/// requests cannot lose each other's updates.
#[derive(Debug)]
pub struct MemoryStore {
    collections: HashMap<Collection, RwLock<Vec<Document>>>,
}

impl MemoryStore {
    /// Create an empty store with every collection present.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: Collection::ALL
                .into_iter()
                .map(|collection| (collection, RwLock::new(Vec::new())))
                .collect(),
        }
    }

    fn collection(&self, collection: Collection) -> Result<&RwLock<Vec<Document>>, RepositoryError> {
        self.collections.get(&collection).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("collection {collection} is not initialized"))
        })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Find a unique field of `candidate` whose value another document already holds.
fn unique_violation(
    collection: Collection,
    documents: &[Document],
    candidate: &Document,
    skip_id: Option<&str>,
) -> Option<&'static str> {
    collection.unique_fields().iter().copied().find(|field| {
        candidate.get(field).is_some_and(|value| {
            !value.is_null()
                && documents.iter().any(|existing| {
                    skip_id.is_none_or(|skip| existing.id() != Some(skip))
                        && existing.get(field) == Some(value)
                })
        })
    })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn is_valid_id(&self, id: &str) -> bool {
        !id.is_empty()
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, RepositoryError> {
        let documents = self.collection(collection)?.read().await;
        Ok(documents.iter().find(|doc| filter.matches(doc)).cloned())
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, RepositoryError> {
        let documents = self.collection(collection)?.read().await;
        Ok(documents
            .iter()
            .filter(|doc| filter.matches(doc))
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<String, RepositoryError> {
        let mut documents = self.collection(collection)?.write().await;

        if let Some(field) = unique_violation(collection, &documents, &document, None) {
            return Err(RepositoryError::Conflict(format!(
                "{collection}.{field} already exists"
            )));
        }

        let id = generate_local_id();
        document.set_id(id.clone());
        documents.push(document);
        Ok(id)
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        mut fields: Document,
    ) -> Result<bool, RepositoryError> {
        let mut documents = self.collection(collection)?.write().await;

        // A missing target is reported before any uniqueness conflict
        let Some(position) = documents.iter().position(|doc| doc.id() == Some(id)) else {
            return Ok(false);
        };

        if let Some(field) = unique_violation(collection, &documents, &fields, Some(id)) {
            return Err(RepositoryError::Conflict(format!(
                "{collection}.{field} already exists"
            )));
        }

        let Some(existing) = documents.get_mut(position) else {
            return Ok(false);
        };

        // The id is immutable
        fields.set_id(id);
        existing.merge(fields);
        Ok(true)
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<bool, RepositoryError> {
        let mut documents = self.collection(collection)?.write().await;
        let before = documents.len();
        documents.retain(|doc| doc.id() != Some(id));
        Ok(documents.len() < before)
    }

    async fn count_all(&self, collection: Collection) -> Result<u64, RepositoryError> {
        let documents = self.collection(collection)?.read().await;
        Ok(u64::try_from(documents.len()).unwrap_or(u64::MAX))
    }
}
