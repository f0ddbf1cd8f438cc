//! Document storage for the API.
//!
//! # Backends
//!
//! - [`PgDocumentStore`] - durable `PostgreSQL` storage, one JSONB row per document
//! - [`MemoryStore`] - process-local collections for tests and fallback mode
//!
//! Both implement [`DocumentStore`], so the services above are written once
//! and instantiated over whichever backend the configuration selects.
//!
//! # Tables
//!
//! - `documents` - every collection, keyed by `(collection, id)`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and embedded in the
//! binary. They run on startup unless `API_RUN_MIGRATIONS=false`.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use rootedlane_core::{Collection, Document};
use secrecy::ExposeSecret;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The identifier is not a well-formed reference for this store.
    #[error("invalid id: {0}")]
    InvalidId(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Which documents an operation applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document in the collection.
    All,
    /// The document with this `id`.
    Id(String),
    /// Documents whose field equals the value exactly.
    Field(String, Value),
}

impl Filter {
    /// Match documents whose `field` equals `value`.
    pub fn field(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Field(field.into(), value.into())
    }

    /// Whether a document satisfies the filter.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Id(id) => document.id() == Some(id.as_str()),
            Self::Field(field, value) => document.get(field) == Some(value),
        }
    }
}

/// Capabilities required of any document backend.
///
/// Identifiers are strings at this boundary. Each backend decides what a
/// well-formed id looks like through [`DocumentStore::is_valid_id`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Whether `id` is a well-formed reference for this backend.
    fn is_valid_id(&self, id: &str) -> bool;

    /// Find the first document matching the filter.
    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, RepositoryError>;

    /// Find every document matching the filter, in insertion order.
    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, RepositoryError>;

    /// Insert a document and return its generated id.
    ///
    /// Any `id` already present in `document` is ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a unique field is already taken.
    async fn insert(
        &self,
        collection: Collection,
        document: Document,
    ) -> Result<String, RepositoryError>;

    /// Shallow-merge `fields` into the document with this id.
    ///
    /// Returns `false` if no document matched.
    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        fields: Document,
    ) -> Result<bool, RepositoryError>;

    /// Delete the document with this id.
    ///
    /// Returns `false` if no document matched.
    async fn delete_by_id(&self, collection: Collection, id: &str)
    -> Result<bool, RepositoryError>;

    /// Count every document in the collection.
    async fn count_all(&self, collection: Collection) -> Result<u64, RepositoryError>;

    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply the embedded migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: Value) -> Document {
        Document::try_from(value).unwrap()
    }

    #[test]
    fn test_filter_all_matches_everything() {
        assert!(Filter::All.matches(&Document::new()));
        assert!(Filter::All.matches(&doc(json!({"id": "x"}))));
    }

    #[test]
    fn test_filter_id() {
        let product = doc(json!({"id": "abc", "name": "Mug"}));

        assert!(Filter::Id("abc".to_string()).matches(&product));
        assert!(!Filter::Id("abd".to_string()).matches(&product));
        assert!(!Filter::Id("abc".to_string()).matches(&Document::new()));
    }

    #[test]
    fn test_filter_field_is_exact_equality() {
        let user = doc(json!({"email": "a@b.c", "age": 30}));

        assert!(Filter::field("email", "a@b.c").matches(&user));
        assert!(!Filter::field("email", "A@B.C").matches(&user));
        assert!(Filter::field("age", 30).matches(&user));
        assert!(!Filter::field("age", "30").matches(&user));
        assert!(!Filter::field("missing", Value::Null).matches(&user));
    }
}
