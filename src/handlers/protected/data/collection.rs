use axum::{
    body::Bytes,
    extract::{Extension, Query, State},
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::format::{document_to_api_value, documents_to_api_values};
use crate::database::{DocumentBody, StoreError};
use crate::error::ApiError;
use crate::filter::{FilterWhere, ListQuery, Pagination};
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Collection;

use super::utils::with_store_timeout;

/// Body of `DELETE /api/:collection`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManyRequest {
    #[serde(default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub confirm_delete_all: bool,
}

/// GET /api/:collection - List documents with filtering, sorting and pagination
pub async fn get(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Vec<Value>> {
    let query = ListQuery::from_params(&params, state.max_limit)?;

    let (documents, total) = with_store_timeout(&state, async {
        let documents = state.store.find(&collection.name, &query).await?;
        let total = state.store.count(&collection.name, &query.filter).await?;
        Ok::<_, StoreError>((documents, total))
    })
    .await?;

    let pagination = Pagination::new(query.page, total);
    Ok(ApiResponse::success(documents_to_api_values(&documents)).paginated(pagination))
}

/// POST /api/:collection - Create one document
pub async fn post(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    body: Bytes,
) -> ApiResult<Value> {
    let body = DocumentBody::from_slice(&body)?;

    let document = with_store_timeout(&state, state.store.insert(&collection.name, body.into_fields())).await?;

    tracing::info!("Created {} document {}", collection.name, document.id);
    Ok(ApiResponse::created(document_to_api_value(&document)))
}

/// DELETE /api/:collection - Delete every document matching the body filter.
/// An empty filter requires `confirmDeleteAll: true`.
pub async fn delete(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    body: Bytes,
) -> ApiResult<Value> {
    let request: DeleteManyRequest = if body.iter().all(u8::is_ascii_whitespace) {
        DeleteManyRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid_json(format!("Invalid JSON body: {}", e)))?
    };

    let filter = match &request.filter {
        Some(value) => FilterWhere::from_json(value)?,
        None => Default::default(),
    };

    if filter.is_empty() && !request.confirm_delete_all {
        return Err(ApiError::bad_request(
            "Refusing to delete all documents without a filter; send confirmDeleteAll: true to proceed",
        ));
    }

    let deleted = with_store_timeout(&state, state.store.delete_many(&collection.name, &filter)).await?;

    tracing::info!("Deleted {} {} document(s)", deleted, collection.name);
    Ok(ApiResponse::success(json!({ "deletedCount": deleted })))
}
