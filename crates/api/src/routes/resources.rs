//! Generic CRUD routes for every collection.
//!
//! The same handlers serve `/{name}` (durable store) and `/api/mock/{name}`
//! (in-memory store); the [`Backend`] type parameter picks the service.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use rootedlane_core::{Collection, Document};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::services::ResourceService;
use crate::state::AppState;

/// Selects the resource service a route group is served from.
pub trait Backend: Send + Sync + 'static {
    fn service(state: &AppState) -> &ResourceService;
}

/// The durable store, or the mock store in fallback mode.
pub struct Durable;

/// Always the in-memory mock store.
pub struct Mock;

impl Backend for Durable {
    fn service(state: &AppState) -> &ResourceService {
        state.resources()
    }
}

impl Backend for Mock {
    fn service(state: &AppState) -> &ResourceService {
        state.mock_resources()
    }
}

/// Unknown resource names are 404s, like unknown paths.
fn collection(name: &str) -> Result<Collection> {
    name.parse()
        .map_err(|_| AppError::NotFound(format!("Unknown resource: {name}")))
}

/// Request bodies must be JSON objects.
fn object_body(body: std::result::Result<Json<Value>, JsonRejection>) -> Result<Document> {
    let Json(value) = body?;
    Document::try_from(value)
        .map_err(|_| AppError::InvalidArgument("Request body must be a JSON object".to_string()))
}

/// List every document in a collection.
///
/// GET /{name}
pub async fn list<B: Backend>(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Document>>> {
    let collection = collection(&name)?;
    let documents = B::service(&state).list(collection).await?;
    Ok(Json(documents))
}

/// Get a document by id.
///
/// GET /{name}/{id}
pub async fn show<B: Backend>(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<Document>> {
    let collection = collection(&name)?;
    let document = B::service(&state).get(collection, &id).await?;
    Ok(Json(document))
}

/// Create a document.
///
/// POST /{name}
pub async fn create<B: Backend>(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Document>)> {
    let collection = collection(&name)?;
    let fields = object_body(body)?;
    let document = B::service(&state).create(collection, fields).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// Merge fields into a document.
///
/// PUT /{name}/{id}
pub async fn update<B: Backend>(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Document>> {
    let collection = collection(&name)?;
    let fields = object_body(body)?;
    let document = B::service(&state).update(collection, &id, fields).await?;
    Ok(Json(document))
}

/// Delete a document.
///
/// DELETE /{name}/{id}
pub async fn destroy<B: Backend>(
    State(state): State<AppState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<StatusCode> {
    let collection = collection(&name)?;
    B::service(&state).delete(collection, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
