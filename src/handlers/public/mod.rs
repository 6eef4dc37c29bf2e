// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Discovery, liveness, and the catch-all responses for unmatched routes
// and handler panics.

use std::any::Any;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - Service info and every registered collection endpoint
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let collections: Vec<Value> = state
        .collections
        .iter()
        .map(|c| {
            let base = c.base_path();
            let item = format!("{}/:id", base);
            json!({
                "name": c.name,
                "path": base,
                "endpoints": {
                    "create": format!("POST {}", base),
                    "list": format!("GET {}?page&limit&sort&<field>=<value>", base),
                    "get": format!("GET {}", item),
                    "replace": format!("PUT {}", item),
                    "update": format!("PATCH {}", item),
                    "delete": format!("DELETE {}", item),
                    "deleteMany": format!("DELETE {} {{ filter?, confirmDeleteAll? }}", base),
                }
            })
        })
        .collect();

    Json(json!({
        "success": true,
        "data": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
            "authentication": "Basic (required on /api/*)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
            },
            "collections": collections,
        }
    }))
}

/// GET /health - Liveness, uptime, and store reachability
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let uptime = state.uptime().as_secs_f64();

    let ping = tokio::time::timeout(state.store_timeout, state.store.ping()).await;
    match ping {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "timestamp": now,
                "uptime": uptime,
                "database": "ok"
            })),
        ),
        Ok(Err(e)) => {
            tracing::error!("Health check failed: {}", e);
            degraded(now, uptime)
        }
        Err(_) => {
            tracing::error!("Health check timed out after {:?}", state.store_timeout);
            degraded(now, uptime)
        }
    }
}

fn degraded(now: chrono::DateTime<chrono::Utc>, uptime: f64) -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({
            "status": "degraded",
            "timestamp": now,
            "uptime": uptime,
            "database": "unavailable"
        })),
    )
}

/// Fallback for unmatched routes
pub async fn not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

/// Converts a handler panic into the generic 500 envelope
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);

    ApiError::internal_server_error("Internal server error").into_response()
}
