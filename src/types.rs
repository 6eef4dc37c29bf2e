/// Shared types used across the codebase

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError {
    #[error("Collection name cannot be empty")]
    EmptyName,

    #[error("Collection name '{0}' has no path-compatible characters")]
    Unroutable(String),

    #[error("Collections '{first}' and '{second}' both map to /api/{slug}")]
    DuplicateSlug {
        first: String,
        second: String,
        slug: String,
    },
}

/// A configured collection: the store-side name plus its URL path segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collection {
    pub name: String,
    pub slug: String,
}

impl Collection {
    pub fn new(name: impl Into<String>) -> Result<Self, CollectionError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(CollectionError::EmptyName);
        }
        let slug = normalize_collection_name(&name);
        if slug.is_empty() {
            return Err(CollectionError::Unroutable(name));
        }
        Ok(Self { name, slug })
    }

    /// Base route, e.g. `/api/custom-orders`
    pub fn base_path(&self) -> String {
        format!("/api/{}", self.slug)
    }

    /// Document route, e.g. `/api/custom-orders/:id`
    pub fn item_path(&self) -> String {
        format!("/api/{}/:id", self.slug)
    }
}

/// Lowercases the name and collapses every run of path-incompatible
/// characters into a single hyphen.
pub fn normalize_collection_name(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// The fixed set of collections exposed by the gateway
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    collections: Vec<Collection>,
}

impl CollectionRegistry {
    pub fn from_names<I, S>(names: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collections: Vec<Collection> = Vec::new();
        for name in names {
            let collection = Collection::new(name)?;
            if let Some(existing) = collections.iter().find(|c| c.slug == collection.slug) {
                return Err(CollectionError::DuplicateSlug {
                    first: existing.name.clone(),
                    second: collection.name,
                    slug: existing.slug.clone(),
                });
            }
            collections.push(collection);
        }
        Ok(Self { collections })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}
