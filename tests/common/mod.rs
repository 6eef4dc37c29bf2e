#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Value};
use tower::ServiceExt;

use collection_gateway::{
    app::app,
    config::AppConfig,
    database::{Document, DocumentStore, MemoryStore, StoreError, StoreResult, UpdateMode},
    filter::{Filter, ListQuery},
    state::AppState,
};
use uuid::Uuid;

pub const USER: &str = "baker";
pub const PASS: &str = "flour";

/// In-process server over a fresh in-memory store
pub struct TestServer {
    router: Router,
    pub store: Arc<MemoryStore>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

impl TestServer {
    pub fn spawn() -> Self {
        Self::with_collections("orders,products,custom_orders")
    }

    pub fn with_collections(collections: &str) -> Self {
        Self::with_env(&[("COLLECTIONS", collections)])
    }

    /// Server configured from the test credentials plus `vars`
    pub fn with_env(vars: &[(&str, &str)]) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::build(store.clone(), store, vars)
    }

    /// Server whose store misbehaves as `fault` on every call
    pub fn with_fault(fault: Fault, vars: &[(&str, &str)]) -> Self {
        let store = Arc::new(MemoryStore::new());
        let faulty = Arc::new(FaultyStore {
            inner: store.clone(),
            fault,
        });
        Self::build(faulty, store, vars)
    }

    fn build(shared: Arc<dyn DocumentStore>, store: Arc<MemoryStore>, vars: &[(&str, &str)]) -> Self {
        let mut env: Vec<(String, String)> = vec![
            ("BASIC_AUTH_USER".to_string(), USER.to_string()),
            ("BASIC_AUTH_PASS".to_string(), PASS.to_string()),
            ("COLLECTIONS".to_string(), "orders,products,custom_orders".to_string()),
        ];
        env.extend(vars.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        let config = AppConfig::from_lookup(move |key| {
            env.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.clone())
        });

        let state = AppState::new(&config, shared).expect("valid collections");
        let router = app(state, &config.security.cors_origins);

        Self { router, store }
    }

    /// Authenticated request
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> Result<TestResponse> {
        self.request(method, uri, body, Some(basic_header(USER, PASS))).await
    }

    /// Request with an explicit Authorization header (or none)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        authorization: Option<String>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = authorization {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };
        self.raw(request).await
    }

    pub async fn raw(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await.context("router call failed")?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).with_context(|| format!("non-JSON body: {:?}", bytes))?
        };
        Ok(TestResponse { status, headers, body })
    }

    /// Create a document and return its response data
    pub async fn create(&self, path: &str, body: Value) -> Result<Value> {
        let res = self.send(Method::POST, path, Some(body)).await?;
        anyhow::ensure!(res.status == StatusCode::CREATED, "create failed: {} {}", res.status, res.body);
        Ok(res.body["data"].clone())
    }
}

pub fn basic_header(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

/// How a `FaultyStore` misbehaves
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Every call fails with a connection error carrying a secret
    Unreachable,
    /// Every call stalls before reaching the inner store
    Stall(Duration),
    /// Every call panics
    Panic,
}

pub const LEAKED_DETAIL: &str = "password authentication failed for user \"s3cret\"";

/// Memory store wrapper that injects a fault before each call
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    fault: Fault,
}

impl FaultyStore {
    async fn trip(&self) -> StoreResult<()> {
        match self.fault {
            Fault::Unreachable => Err(StoreError::ConnectionError(LEAKED_DETAIL.to_string())),
            Fault::Stall(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            Fault::Panic => panic!("store exploded"),
        }
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn insert(&self, collection: &str, fields: Map<String, Value>) -> StoreResult<Document> {
        self.trip().await?;
        self.inner.insert(collection, fields).await
    }

    async fn find(&self, collection: &str, query: &ListQuery) -> StoreResult<Vec<Document>> {
        self.trip().await?;
        self.inner.find(collection, query).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        self.trip().await?;
        self.inner.count(collection, filter).await
    }

    async fn get(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>> {
        self.trip().await?;
        self.inner.get(collection, id).await
    }

    async fn update(
        &self,
        collection: &str,
        id: Uuid,
        fields: Map<String, Value>,
        mode: UpdateMode,
    ) -> StoreResult<Option<Document>> {
        self.trip().await?;
        self.inner.update(collection, id, fields, mode).await
    }

    async fn delete(&self, collection: &str, id: Uuid) -> StoreResult<Option<Document>> {
        self.trip().await?;
        self.inner.delete(collection, id).await
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> StoreResult<u64> {
        self.trip().await?;
        self.inner.delete_many(collection, filter).await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.trip().await?;
        self.inner.ping().await
    }
}
