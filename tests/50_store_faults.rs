mod common;

use std::time::Duration;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use collection_gateway::database::DocumentStore;
use collection_gateway::filter::Filter;
use common::{Fault, TestServer, LEAKED_DETAIL};

const STALL: Fault = Fault::Stall(Duration::from_millis(500));

#[tokio::test]
async fn store_failures_are_opaque_500s() -> Result<()> {
    let server = TestServer::with_fault(Fault::Unreachable, &[]);

    for (method, path, body) in [
        (Method::GET, "/api/orders", None),
        (Method::POST, "/api/orders", Some(json!({ "item": "cake" }))),
        (Method::GET, "/api/orders/6f1c1e9a-3a53-4d1b-9d57-0c8f1f5f2a10", None),
        (Method::DELETE, "/api/orders", Some(json!({ "confirmDeleteAll": true }))),
    ] {
        let res = server.send(method.clone(), path, body).await?;
        assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR, "{} {}", method, path);
        assert_eq!(res.body, json!({ "success": false, "error": "Internal server error" }));
        assert!(!res.body.to_string().contains("s3cret"), "leaked: {}", LEAKED_DETAIL);
    }
    Ok(())
}

#[tokio::test]
async fn slow_store_calls_time_out() -> Result<()> {
    let server = TestServer::with_fault(STALL, &[("STORE_TIMEOUT_MS", "20")]);

    let res = server.send(Method::POST, "/api/orders", Some(json!({ "item": "cake" }))).await?;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body, json!({ "success": false, "error": "Request processing timed out" }));
    // The stalled insert was dropped before it reached the store
    assert_eq!(server.store.count("orders", &Filter::default()).await?, 0);
    Ok(())
}

#[tokio::test]
async fn handler_panics_become_500_envelopes() -> Result<()> {
    let server = TestServer::with_fault(Fault::Panic, &[]);

    let res = server.send(Method::GET, "/api/orders", None).await?;

    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body, json!({ "success": false, "error": "Internal server error" }));

    // The router keeps serving after a panic
    let res = server.send(Method::GET, "/api/nowhere", None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn health_degrades_when_store_is_unreachable() -> Result<()> {
    let server = TestServer::with_fault(Fault::Unreachable, &[]);

    let res = server.request(Method::GET, "/health", None, None).await?;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body["status"], "degraded");
    assert_eq!(res.body["database"], "unavailable");
    assert!(res.body["uptime"].as_f64().is_some());
    Ok(())
}

#[tokio::test]
async fn health_degrades_when_store_is_slow() -> Result<()> {
    let server = TestServer::with_fault(STALL, &[("STORE_TIMEOUT_MS", "20")]);

    let res = server.request(Method::GET, "/health", None, None).await?;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body["status"], "degraded");
    Ok(())
}
