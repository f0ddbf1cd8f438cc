//! Schemaless documents stored in a collection.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name of the identifier field carried by every stored document.
pub const ID_FIELD: &str = "id";
/// Name of the creation timestamp field.
pub const CREATED_AT_FIELD: &str = "createdAt";
/// Name of the last-update timestamp field.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Fields owned by the server. Values supplied by callers are discarded.
pub const SERVER_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// A single entity: a flat mapping from field name to JSON value.
///
/// Apart from `id`, `createdAt` and `updatedAt` the fields are whatever the
/// caller sent. There is no schema.
///
/// ## Examples
///
/// ```
/// use rootedlane_core::Document;
/// use serde_json::json;
///
/// let mut product = Document::try_from(json!({"name": "Mug", "price": 12.5})).unwrap();
/// product.merge(Document::try_from(json!({"price": 9.99})).unwrap());
///
/// assert_eq!(product.get_str("name"), Some("Mug"));
/// assert_eq!(product.get("price"), Some(&json!(9.99)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

/// Error returned when a JSON value is not an object.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("expected a JSON object, got {0}")]
pub struct NotAnObject(pub &'static str);

impl Document {
    /// Create an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// The document's `id`, if it has a string one.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get_str(ID_FIELD)
    }

    /// Set the document's `id`.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.0.insert(ID_FIELD.to_owned(), Value::String(id.into()));
    }

    /// Get a field value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a field value if it is a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Get a field value if it is a non-empty string.
    #[must_use]
    pub fn get_non_empty_str(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|s| !s.is_empty())
    }

    /// Insert or overwrite a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove a field, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Whether the document has a field.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Shallow merge: every field in `other` overwrites the field of the same
    /// name, all other fields are kept.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Drop every server-owned field (`id`, `createdAt`, `updatedAt`).
    pub fn strip_server_fields(&mut self) {
        for field in SERVER_FIELDS {
            self.0.remove(field);
        }
    }

    /// Return a copy without the given fields.
    #[must_use]
    pub fn without(mut self, fields: &[&str]) -> Self {
        for field in fields {
            self.0.remove(*field);
        }
        self
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Self::Object(document.0)
    }
}

impl TryFrom<Value> for Document {
    type Error = NotAnObject;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Err(NotAnObject("null")),
            Value::Bool(_) => Err(NotAnObject("a boolean")),
            Value::Number(_) => Err(NotAnObject("a number")),
            Value::String(_) => Err(NotAnObject("a string")),
            Value::Array(_) => Err(NotAnObject("an array")),
        }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
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
    fn test_merge_is_shallow() {
        let mut order = doc(json!({
            "status": "pending",
            "total": 29.99,
            "shipping": {"city": "Lisbon", "zip": "1000"}
        }));
        order.merge(doc(json!({"status": "shipped", "shipping": {"city": "Porto"}})));

        assert_eq!(order.get_str("status"), Some("shipped"));
        assert_eq!(order.get("total"), Some(&json!(29.99)));
        // Nested objects are replaced, not merged
        assert_eq!(order.get("shipping"), Some(&json!({"city": "Porto"})));
    }

    #[test]
    fn test_strip_server_fields() {
        let mut product = doc(json!({
            "id": "client-chosen",
            "createdAt": "yesterday",
            "updatedAt": "today",
            "name": "Mug"
        }));
        product.strip_server_fields();

        assert_eq!(product, doc(json!({"name": "Mug"})));
    }

    #[test]
    fn test_without() {
        let user = doc(json!({"email": "a@b.c", "password": "hash"}));
        let redacted = user.without(&["password"]);

        assert!(!redacted.contains_key("password"));
        assert_eq!(redacted.get_str("email"), Some("a@b.c"));
    }

    #[test]
    fn test_get_non_empty_str() {
        let user = doc(json!({"name": "", "email": "a@b.c", "age": 3}));

        assert_eq!(user.get_non_empty_str("name"), None);
        assert_eq!(user.get_non_empty_str("email"), Some("a@b.c"));
        assert_eq!(user.get_non_empty_str("age"), None);
        assert_eq!(user.get_non_empty_str("missing"), None);
    }

    #[test]
    fn test_try_from_rejects_non_objects() {
        assert_eq!(Document::try_from(json!([1, 2])), Err(NotAnObject("an array")));
        assert_eq!(Document::try_from(json!("x")), Err(NotAnObject("a string")));
        assert_eq!(Document::try_from(Value::Null), Err(NotAnObject("null")));
    }

    #[test]
    fn test_id_round_trip() {
        let mut review = Document::new();
        assert_eq!(review.id(), None);

        review.set_id("abc123");
        assert_eq!(review.id(), Some("abc123"));
        assert_eq!(Value::from(review), json!({"id": "abc123"}));
    }
}
