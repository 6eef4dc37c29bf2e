use axum::{
    body::Bytes,
    extract::{Extension, Path, State},
};
use serde_json::Value;

use crate::api::format::document_to_api_value;
use crate::database::{DocumentBody, UpdateMode};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Collection;

use super::utils::{parse_document_id, with_store_timeout};

const NOT_FOUND: &str = "Document not found";

/// GET /api/:collection/:id - Get a single document by ID
pub async fn get(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_document_id(&id)?;

    let document = with_store_timeout(&state, state.store.get(&collection.name, id))
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    Ok(ApiResponse::success(document_to_api_value(&document)))
}

/// PUT /api/:collection/:id - Replace every caller field of a document
pub async fn put(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Value> {
    update(state, collection, id, body, UpdateMode::Replace).await
}

/// PATCH /api/:collection/:id - Merge the given fields into a document
pub async fn patch(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Value> {
    update(state, collection, id, body, UpdateMode::Merge).await
}

async fn update(
    state: AppState,
    collection: Collection,
    id: String,
    body: Bytes,
    mode: UpdateMode,
) -> ApiResult<Value> {
    let id = parse_document_id(&id)?;
    let body = DocumentBody::from_slice(&body)?;

    let document = with_store_timeout(&state, state.store.update(&collection.name, id, body.into_fields(), mode))
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    tracing::debug!("Updated {} document {} ({:?})", collection.name, id, mode);
    Ok(ApiResponse::success(document_to_api_value(&document)))
}

/// DELETE /api/:collection/:id - Delete a document, returning it
pub async fn delete(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_document_id(&id)?;

    let document = with_store_timeout(&state, state.store.delete(&collection.name, id))
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;

    tracing::info!("Deleted {} document {}", collection.name, id);
    Ok(ApiResponse::success(document_to_api_value(&document)))
}
