use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_COLLECTIONS: &[&str] = &["orders", "products", "customers", "custom_orders", "contact_messages"];

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("No document store configured; set DATABASE_URL or run with --memory")]
    MissingStoreUrl,

    #[error("BASIC_AUTH_USER and BASIC_AUTH_PASS must be set in {0:?} mode")]
    MissingCredentials(Environment),

    #[error("At least one collection must be configured")]
    NoCollections,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub store: StoreConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection string; credentials are masked whenever it is logged
    pub url: Option<String>,
    pub max_connections: u32,
    /// Upper bound for a single store call, and for acquiring a connection
    pub timeout_ms: u64,
    /// Exit when the initial connection fails instead of falling back to memory
    pub required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub collections: Vec<String>,
    pub max_limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub realm: String,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(lookup)
    }

    fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Store overrides
        if let Some(v) = ["DATABASE_URL", "MONGO_URI", "MONGODB_URI"]
            .iter()
            .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        {
            self.store.url = Some(v);
        }
        if let Some(v) = lookup("STORE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }
        if let Some(v) = lookup("STORE_TIMEOUT_MS") {
            self.store.timeout_ms = v.parse().unwrap_or(self.store.timeout_ms);
        }
        if let Some(v) = lookup("STORE_REQUIRED") {
            self.store.required = v.parse().unwrap_or(self.store.required);
        }

        // API overrides
        if let Some(v) = lookup("HOST") {
            self.api.host = v;
        }
        if let Some(v) = lookup("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Some(v) = lookup("COLLECTIONS") {
            self.api.collections = split_list(&v);
        }
        if let Some(v) = lookup("PAGE_MAX_LIMIT") {
            self.api.max_limit = v.parse().unwrap_or(self.api.max_limit);
        }

        // Security overrides
        if let Some(v) = lookup("BASIC_AUTH_USER") {
            self.security.username = v;
        }
        if let Some(v) = lookup("BASIC_AUTH_PASS") {
            self.security.password = v;
        }
        if let Some(v) = lookup("AUTH_REALM") {
            self.security.realm = v;
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }

        self
    }

    /// Checks that must pass before the server starts
    pub fn validate(&self, memory_store: bool) -> Result<(), ConfigError> {
        if !memory_store && self.store.url.is_none() {
            return Err(ConfigError::MissingStoreUrl);
        }
        if self.security.username.is_empty() || self.security.password.is_empty() {
            return Err(ConfigError::MissingCredentials(self.environment));
        }
        if self.api.collections.is_empty() {
            return Err(ConfigError::NoCollections);
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            store: StoreConfig {
                url: None,
                max_connections: 10,
                timeout_ms: 30_000,
                required: true,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                collections: default_collections(),
                max_limit: 1000,
            },
            security: SecurityConfig {
                username: "admin".to_string(),
                password: "admin".to_string(),
                realm: "collection-gateway".to_string(),
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            store: StoreConfig {
                url: None,
                max_connections: 20,
                timeout_ms: 10_000,
                required: true,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                collections: default_collections(),
                max_limit: 500,
            },
            security: SecurityConfig {
                username: String::new(),
                password: String::new(),
                realm: "collection-gateway".to_string(),
                cors_origins: vec!["https://staging.lunele.shop".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            store: StoreConfig {
                url: None,
                max_connections: 50,
                timeout_ms: 5_000,
                required: true,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 5000,
                collections: default_collections(),
                max_limit: 100,
            },
            security: SecurityConfig {
                username: String::new(),
                password: String::new(),
                realm: "collection-gateway".to_string(),
                cors_origins: vec!["https://lunele.shop".to_string()],
            },
        }
    }
}

fn default_collections() -> Vec<String> {
    DEFAULT_COLLECTIONS.iter().map(|s| s.to_string()).collect()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn development_is_the_default_environment() {
        let config = AppConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.api.port, 5000);
        assert_eq!(config.api.collections.len(), DEFAULT_COLLECTIONS.len());
        assert_eq!(config.security.username, "admin");
        assert!(config.validate(true).is_ok());
        assert_eq!(config.validate(false), Err(ConfigError::MissingStoreUrl));
    }

    #[test]
    fn test_production_requires_credentials() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("APP_ENV", "production"),
            ("DATABASE_URL", "postgres://localhost/lunele"),
        ]));
        assert_eq!(config.api.max_limit, 100);
        assert_eq!(
            config.validate(false),
            Err(ConfigError::MissingCredentials(Environment::Production))
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("MONGO_URI", "postgres://fallback/db"),
            ("PORT", "8080"),
            ("COLLECTIONS", "orders, custom_orders,,"),
            ("STORE_TIMEOUT_MS", "250"),
            ("PAGE_MAX_LIMIT", "not-a-number"),
            ("BASIC_AUTH_USER", "baker"),
            ("BASIC_AUTH_PASS", "flour"),
        ]));
        assert_eq!(config.store.url.as_deref(), Some("postgres://fallback/db"));
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.collections, vec!["orders", "custom_orders"]);
        assert_eq!(config.store.timeout_ms, 250);
        assert_eq!(config.api.max_limit, 1000);
        assert_eq!(config.security.username, "baker");
        assert_eq!(config.security.password, "flour");
    }

    #[test]
    fn test_database_url_wins_over_fallbacks() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://primary/db"),
            ("MONGODB_URI", "postgres://other/db"),
        ]));
        assert_eq!(config.store.url.as_deref(), Some("postgres://primary/db"));
    }
}
