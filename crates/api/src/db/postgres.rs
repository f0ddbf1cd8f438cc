//! `PostgreSQL` document store.
//!
//! All collections share the `documents` table. Document ids are UUIDs kept
//! in their own column; the remaining fields live in a JSONB object.

use async_trait::async_trait;
use rootedlane_core::{Collection, Document, ID_FIELD};
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use super::{DocumentStore, Filter, RepositoryError};

/// Durable store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    doc: Json<Map<String, Value>>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        let mut document = Self::from(row.doc.0);
        document.set_id(row.id.to_string());
        document
    }
}

/// A filter lowered to the optional query parameters.
///
/// `field` is an exact jsonb equality on one top-level field. For scalar
/// values `contains` repeats the same condition as a containment test, which
/// the GIN index can serve; containment alone would also match arrays and
/// objects that merely include the value.
#[derive(Debug, PartialEq)]
struct Predicate {
    id: Option<Uuid>,
    field: Option<(String, Value)>,
    contains: Option<Value>,
}

impl Predicate {
    const fn by_id(id: Option<Uuid>) -> Self {
        Self {
            id,
            field: None,
            contains: None,
        }
    }

    fn field_name(&self) -> Option<&str> {
        self.field.as_ref().map(|(name, _)| name.as_str())
    }

    fn field_value(&self) -> Option<&Value> {
        self.field.as_ref().map(|(_, value)| value)
    }
}

impl TryFrom<&Filter> for Predicate {
    type Error = RepositoryError;

    fn try_from(filter: &Filter) -> Result<Self, Self::Error> {
        match filter {
            Filter::All => Ok(Self::by_id(None)),
            Filter::Id(id) => Ok(Self::by_id(Some(parse_id(id)?))),
            // The id is a column, not part of the JSONB document
            Filter::Field(field, Value::String(id)) if field == ID_FIELD => {
                Ok(Self::by_id(Some(parse_id(id)?)))
            }
            Filter::Field(field, value) => {
                let contains = match value {
                    Value::Array(_) | Value::Object(_) => None,
                    scalar => {
                        let mut object = Map::new();
                        object.insert(field.clone(), scalar.clone());
                        Some(Value::Object(object))
                    }
                };
                Ok(Self {
                    id: None,
                    field: Some((field.clone(), value.clone())),
                    contains,
                })
            }
        }
    }
}

fn parse_id(id: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(id).map_err(|_| RepositoryError::InvalidId(id.to_owned()))
}

/// Map unique-index violations to `RepositoryError::Conflict`.
fn map_write_error(collection: Collection, e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("duplicate unique field in {collection}"));
    }
    RepositoryError::Database(e)
}

const SELECT_DOCUMENTS: &str = r"
    SELECT id, doc
    FROM documents
    WHERE collection = $1
      AND ($2::uuid IS NULL OR id = $2)
      AND ($3::text IS NULL OR doc -> $3 = $4)
      AND ($5::jsonb IS NULL OR doc @> $5)
    ORDER BY seq
";

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn is_valid_id(&self, id: &str) -> bool {
        Uuid::parse_str(id).is_ok()
    }

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, RepositoryError> {
        let predicate = Predicate::try_from(filter)?;
        let sql = format!("{SELECT_DOCUMENTS} LIMIT 1");

        let row = sqlx::query_as::<_, DocumentRow>(&sql)
            .bind(collection.as_str())
            .bind(predicate.id)
            .bind(predicate.field_name())
            .bind(predicate.field_value())
            .bind(predicate.contains.as_ref())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Document::from))
    }

    async fn find_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Vec<Document>, RepositoryError> {
        let predicate = Predicate::try_from(filter)?;

        let rows = sqlx::query_as::<_, DocumentRow>(SELECT_DOCUMENTS)
            .bind(collection.as_str())
            .bind(predicate.id)
            .bind(predicate.field_name())
            .bind(predicate.field_value())
            .bind(predicate.contains.as_ref())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn insert(
        &self,
        collection: Collection,
        mut document: Document,
    ) -> Result<String, RepositoryError> {
        document.remove(ID_FIELD);
        let id = Uuid::new_v4();

        sqlx::query(
            r"
            INSERT INTO documents (collection, id, doc)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Value::from(document))
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;

        Ok(id.to_string())
    }

    async fn update_by_id(
        &self,
        collection: Collection,
        id: &str,
        mut fields: Document,
    ) -> Result<bool, RepositoryError> {
        let id = parse_id(id)?;
        fields.remove(ID_FIELD);

        // `||` on two JSONB objects is a shallow merge, right side wins
        let result = sqlx::query(
            r"
            UPDATE documents
            SET doc = doc || $3
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(Value::from(fields))
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(collection, e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_id(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<bool, RepositoryError> {
        let id = parse_id(id)?;

        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_all(&self, collection: Collection) -> Result<u64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = $1")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count: {count}")))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
