//! Health checks and the database probe.

use axum::{Json, extract::State, http::StatusCode};
use rootedlane_core::{Collection, Document};
use serde_json::{Value, json};

use crate::db::RepositoryError;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Pings the durable store. Always ready in fallback mode.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(store) = state.durable() else {
        return StatusCode::OK;
    };

    match store.ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Write a document to `test` and count the collection.
///
/// GET /api/test-db
pub async fn test_db(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let Some(store) = state.durable() else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "No database configured, running in fallback mode",
            })),
        );
    };

    let probe = async {
        let mut document = Document::new();
        document.insert("message", "Test document");
        document.insert("timestamp", state.clock().timestamp());

        let inserted_id = store.insert(Collection::Test, document).await?;
        let count = store.count_all(Collection::Test).await?;
        Ok::<_, RepositoryError>((inserted_id, count))
    };

    match probe.await {
        Ok((inserted_id, count)) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "insertedId": inserted_id,
                "count": count,
                "message": "Database is working correctly!",
            })),
        ),
        Err(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "database probe failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": "Database connection failed",
                })),
            )
        }
    }
}
