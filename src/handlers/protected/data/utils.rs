use std::future::Future;

use uuid::Uuid;

use crate::database::{StoreError, StoreResult};
use crate::error::ApiError;
use crate::state::AppState;

/// Run a store call under the configured per-call timeout
pub async fn with_store_timeout<T, F>(state: &AppState, call: F) -> Result<T, ApiError>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(state.store_timeout, call).await {
        Ok(result) => result.map_err(ApiError::from),
        Err(_) => Err(StoreError::Timeout(state.store_timeout).into()),
    }
}

/// Parse the `:id` path segment
pub fn parse_document_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(format!("Invalid document id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_ids_must_be_uuids() {
        assert!(parse_document_id("6f1c1e9a-3a53-4d1b-9d57-0c8f1f5f2a10").is_ok());
        let err = parse_document_id("64b7f0c2e13a").unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Invalid document id: 64b7f0c2e13a");
    }
}
