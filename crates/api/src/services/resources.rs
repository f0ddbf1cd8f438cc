//! Generic CRUD over any collection and any document store.
//!
//! One [`ResourceService`] is built over the durable store and one over the
//! in-memory store; the HTTP layer picks which to call.

use std::sync::Arc;

use rootedlane_core::{CREATED_AT_FIELD, Collection, Document, ID_FIELD, UPDATED_AT_FIELD};
use thiserror::Error;
use tracing::instrument;

use crate::clock::Clock;
use crate::db::{DocumentStore, Filter, RepositoryError};

/// Errors from resource operations.
///
/// Messages use the singular resource name, e.g. `"product not found"`.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The id is not a well-formed reference for the backing store.
    #[error("invalid {} id", .0.singular())]
    InvalidId(Collection),

    /// No document with this id.
    #[error("{} not found", .0.singular())]
    NotFound(Collection),

    /// A unique field is already taken.
    #[error("{} already exists", .0.singular())]
    Conflict(Collection),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl ResourceError {
    fn from_repository(collection: Collection, err: RepositoryError) -> Self {
        match err {
            RepositoryError::Conflict(_) => Self::Conflict(collection),
            RepositoryError::InvalidId(_) => Self::InvalidId(collection),
            other => Self::Repository(other),
        }
    }
}

/// List/get/create/update/delete for every collection.
#[derive(Clone)]
pub struct ResourceService {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
}

impl ResourceService {
    /// Create a resource service over a store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Get a reference to the backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Every document in the collection, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Repository` if the store fails.
    #[instrument(skip(self), fields(backend = self.store.backend()))]
    pub async fn list(&self, collection: Collection) -> Result<Vec<Document>, ResourceError> {
        let documents = self.store.find_many(collection, &Filter::All).await?;
        Ok(documents
            .into_iter()
            .map(|doc| doc.without(collection.redacted_fields()))
            .collect())
    }

    /// A single document by id.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidId` if the store rejects the id format.
    /// Returns `ResourceError::NotFound` if no document has this id.
    #[instrument(skip(self), fields(backend = self.store.backend()))]
    pub async fn get(&self, collection: Collection, id: &str) -> Result<Document, ResourceError> {
        self.check_id(collection, id)?;

        self.store
            .find_one(collection, &Filter::Id(id.to_owned()))
            .await
            .map_err(|e| ResourceError::from_repository(collection, e))?
            .map(|doc| doc.without(collection.redacted_fields()))
            .ok_or(ResourceError::NotFound(collection))
    }

    /// Store a new document and return it with its generated id.
    ///
    /// Caller-supplied `id`, `createdAt` and `updatedAt` are replaced.
    /// Redacted fields (user passwords) are dropped; only signup sets them.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::Conflict` if a unique field is already taken.
    #[instrument(skip(self, document), fields(backend = self.store.backend()))]
    pub async fn create(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<Document, ResourceError> {
        let mut document = document.without(collection.redacted_fields());
        document.strip_server_fields();
        let now = self.clock.timestamp();
        document.insert(CREATED_AT_FIELD, now.clone());
        document.insert(UPDATED_AT_FIELD, now);

        let id = self
            .store
            .insert(collection, document.clone())
            .await
            .map_err(|e| ResourceError::from_repository(collection, e))?;
        document.set_id(id);

        tracing::debug!(id = document.id(), "document created");
        Ok(document)
    }

    /// Shallow-merge `changes` into an existing document and return the result.
    ///
    /// `id`, `createdAt` and redacted fields cannot be changed; `updatedAt`
    /// is set to now.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidId` if the store rejects the id format.
    /// Returns `ResourceError::NotFound` if no document has this id.
    /// Returns `ResourceError::Conflict` if the update takes a unique value.
    #[instrument(skip(self, changes), fields(backend = self.store.backend()))]
    pub async fn update(
        &self,
        collection: Collection,
        id: &str,
        changes: Document,
    ) -> Result<Document, ResourceError> {
        self.check_id(collection, id)?;

        let mut changes = changes.without(collection.redacted_fields());
        changes.remove(ID_FIELD);
        changes.remove(CREATED_AT_FIELD);
        changes.insert(UPDATED_AT_FIELD, self.clock.timestamp());

        let matched = self
            .store
            .update_by_id(collection, id, changes)
            .await
            .map_err(|e| ResourceError::from_repository(collection, e))?;
        if !matched {
            return Err(ResourceError::NotFound(collection));
        }

        // A delete racing in after the update reads as NotFound
        self.get(collection, id).await
    }

    /// Permanently remove a document.
    ///
    /// # Errors
    ///
    /// Returns `ResourceError::InvalidId` if the store rejects the id format.
    /// Returns `ResourceError::NotFound` if no document has this id.
    #[instrument(skip(self), fields(backend = self.store.backend()))]
    pub async fn delete(&self, collection: Collection, id: &str) -> Result<(), ResourceError> {
        self.check_id(collection, id)?;

        let deleted = self
            .store
            .delete_by_id(collection, id)
            .await
            .map_err(|e| ResourceError::from_repository(collection, e))?;
        if !deleted {
            return Err(ResourceError::NotFound(collection));
        }

        tracing::debug!("document deleted");
        Ok(())
    }

    fn check_id(&self, collection: Collection, id: &str) -> Result<(), ResourceError> {
        if id.is_empty() {
            return Err(ResourceError::NotFound(collection));
        }
        if !self.store.is_valid_id(id) {
            return Err(ResourceError::InvalidId(collection));
        }
        Ok(())
    }
}
