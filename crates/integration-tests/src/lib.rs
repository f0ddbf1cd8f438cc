//! Integration test harness for the Rootedlane API.
//!
//! Tests drive the real router in-process with `tower::ServiceExt::oneshot`,
//! so no server needs to be running. The "durable" store in most tests is a
//! [`MemoryStore`]; [`UnreachableStore`] stands in for a database that has
//! gone away. The ignored tests in `tests/postgres.rs` need a real database.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rootedlane-integration-tests
//! DATABASE_URL=postgres://localhost/rootedlane cargo test -p rootedlane-integration-tests -- --ignored
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use rootedlane_api::db::{DocumentStore, Filter, MemoryStore, RepositoryError};
use rootedlane_api::state::AppState;
use rootedlane_core::{Collection, Document};
use serde_json::Value;
use tower::ServiceExt;

/// A response reduced to what tests assert on.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Parsed JSON body; `Value::Null` when empty, a string when not JSON.
    pub body: Value,
}

/// The API router plus the state behind it.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// App with an in-memory store playing the durable store.
    #[must_use]
    pub fn durable() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// App with no durable store configured.
    #[must_use]
    pub fn fallback() -> Self {
        Self::from_state(AppState::fallback())
    }

    /// App over a specific durable store.
    #[must_use]
    pub fn with_store(store: Arc<dyn DocumentStore>) -> Self {
        Self::from_state(AppState::new(Some(store)))
    }

    fn from_state(state: AppState) -> Self {
        Self {
            router: rootedlane_api::app(state.clone()),
            state,
        }
    }

    /// Send a request with an optional JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn request(&self, method: Method, uri: &str, body: Option<&Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        self.send(request).await
    }

    /// Send a raw body with an explicit content type.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the router fails.
    pub async fn request_raw(
        &self,
        method: Method,
        uri: &str,
        content_type: &str,
        body: &'static str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .expect("valid request");

        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("readable body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// A store whose every operation fails as if the database were down.
#[derive(Debug, Default)]
pub struct UnreachableStore;

impl UnreachableStore {
    fn down() -> RepositoryError {
        RepositoryError::Database(sqlx::Error::PoolTimedOut)
    }
}

#[async_trait]
impl DocumentStore for UnreachableStore {
    fn backend(&self) -> &'static str {
        "unreachable"
    }

    fn is_valid_id(&self, id: &str) -> bool {
        !id.is_empty()
    }

    async fn find_one(
        &self,
        _collection: Collection,
        _filter: &Filter,
    ) -> Result<Option<Document>, RepositoryError> {
        Err(Self::down())
    }

    async fn find_many(
        &self,
        _collection: Collection,
        _filter: &Filter,
    ) -> Result<Vec<Document>, RepositoryError> {
        Err(Self::down())
    }

    async fn insert(
        &self,
        _collection: Collection,
        _document: Document,
    ) -> Result<String, RepositoryError> {
        Err(Self::down())
    }

    async fn update_by_id(
        &self,
        _collection: Collection,
        _id: &str,
        _fields: Document,
    ) -> Result<bool, RepositoryError> {
        Err(Self::down())
    }

    async fn delete_by_id(
        &self,
        _collection: Collection,
        _id: &str,
    ) -> Result<bool, RepositoryError> {
        Err(Self::down())
    }

    async fn count_all(&self, _collection: Collection) -> Result<u64, RepositoryError> {
        Err(Self::down())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        Err(Self::down())
    }
}
