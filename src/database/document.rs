use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const ID_FIELD: &str = "_id";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Fields owned by the server; stripped from every request body
const RESERVED_FIELDS: &[&str] = &[ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD, "__v"];

/// Errors that can occur while reading a request body
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DocumentError {
    #[error("Request body is required")]
    EmptyBody,
    #[error("Request body must be a JSON object")]
    NotAnObject,
    #[error("{0}")]
    InvalidJson(String),
}

/// A stored document: caller fields plus server-owned identity and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Uuid,
    pub fields: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: Uuid, fields: Map<String, Value>, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            fields,
            created_at,
            updated_at,
        }
    }
}

/// Caller-supplied fields with reserved keys removed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentBody(Map<String, Value>);

impl DocumentBody {
    /// Parse a raw request body
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DocumentError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(DocumentError::EmptyBody);
        }
        let value: Value = serde_json::from_slice(bytes).map_err(|e| DocumentError::InvalidJson(e.to_string()))?;
        Self::from_json(value)
    }

    pub fn from_json(value: Value) -> Result<Self, DocumentError> {
        match value {
            Value::Object(mut map) => {
                for field in RESERVED_FIELDS {
                    if map.shift_remove(*field).is_some() {
                        tracing::debug!("Ignoring server-owned field '{}' in request body", field);
                    }
                }
                Ok(Self(map))
            }
            _ => Err(DocumentError::NotAnObject),
        }
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }
}

/// Wire format for timestamps: RFC 3339, UTC, microsecond precision
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Current time truncated to the precision the store keeps
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}
