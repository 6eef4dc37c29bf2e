use serde_json::Value;
use uuid::Uuid;

use super::error::FilterError;
use super::types::{Filter, FilterClause, FilterWhereInfo, SqlParam};
use crate::database::document::{format_timestamp, Document, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};

/// Query parameters that drive pagination and sorting rather than filtering
pub const RESERVED_PARAMS: &[&str] = &["page", "limit", "sort"];

const MAX_FIELD_LEN: usize = 128;

const CANONICAL_UUID_LEN: usize = 36;

/// `to_char` pattern matching `format_timestamp` output
const PG_TIMESTAMP_FORMAT: &str = "YYYY-MM-DD\"T\"HH24:MI:SS.US\"Z\"";

pub struct FilterWhere;

impl FilterWhere {
    /// Build a filter from query-string pairs, skipping reserved control parameters
    pub fn from_query(params: &[(String, String)]) -> Result<Filter, FilterError> {
        let mut filter = Filter::default();
        for (key, value) in params {
            if RESERVED_PARAMS.contains(&key.as_str()) {
                continue;
            }
            Self::validate_field(key)?;
            filter.push(key.clone(), Self::clause_for(value));
        }
        Ok(filter)
    }

    /// Build a filter from a JSON object such as a bulk-delete `filter` body
    pub fn from_json(value: &Value) -> Result<Filter, FilterError> {
        let obj = match value {
            Value::Null => return Ok(Filter::default()),
            Value::Object(obj) => obj,
            _ => return Err(FilterError::InvalidFilter("filter must be a JSON object".to_string())),
        };

        let mut filter = Filter::default();
        for (key, value) in obj {
            Self::validate_field(key)?;
            let clause = match value {
                Value::String(s) => Self::clause_for(s),
                Value::Object(inner) if inner.keys().any(|k| k.starts_with('$')) => {
                    return Err(FilterError::InvalidFilter(format!(
                        "operator expressions are not supported (field '{}')",
                        key
                    )));
                }
                other => FilterClause::Equals(other.clone()),
            };
            filter.push(key.clone(), clause);
        }
        Ok(filter)
    }

    /// Identifier-formatted values match exactly, anything else is a substring match.
    /// Only the canonical hyphenated form counts as an identifier.
    pub fn clause_for(value: &str) -> FilterClause {
        let trimmed = value.trim();
        if trimmed.len() == CANONICAL_UUID_LEN {
            if let Ok(id) = Uuid::try_parse(trimmed) {
                return FilterClause::IdEquals(id);
            }
        }
        FilterClause::Contains(value.to_string())
    }

    pub fn validate_field(field: &str) -> Result<(), FilterError> {
        if field.is_empty() {
            return Err(FilterError::InvalidField("field name cannot be empty".to_string()));
        }
        if field.len() > MAX_FIELD_LEN {
            return Err(FilterError::InvalidField(format!(
                "field name exceeds {} characters",
                MAX_FIELD_LEN
            )));
        }
        if field.starts_with('$') || field.chars().any(|c| c.is_control()) {
            return Err(FilterError::InvalidField(field.to_string()));
        }
        Ok(())
    }

    /// Render the filter as SQL conditions over the `documents` table,
    /// appending bind values to `params`. Returns an empty string for no conditions.
    pub fn generate(filter: &Filter, params: &mut Vec<SqlParam>) -> String {
        filter
            .conditions
            .iter()
            .map(|condition| Self::build_sql_condition(condition, params))
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn build_sql_condition(condition: &FilterWhereInfo, params: &mut Vec<SqlParam>) -> String {
        let field = condition.field.as_str();
        match (field, &condition.clause) {
            (ID_FIELD, FilterClause::IdEquals(id)) => {
                format!("id = {}", push_param(params, SqlParam::Uuid(*id)))
            }
            (ID_FIELD, FilterClause::Contains(text)) => {
                format!("id::text ILIKE {}", push_param(params, SqlParam::Text(like_pattern(text))))
            }
            (CREATED_AT_FIELD, FilterClause::Contains(text)) | (UPDATED_AT_FIELD, FilterClause::Contains(text)) => {
                let column = if field == CREATED_AT_FIELD { "created_at" } else { "updated_at" };
                format!(
                    "to_char({} AT TIME ZONE 'UTC', '{}') ILIKE {}",
                    column,
                    PG_TIMESTAMP_FORMAT,
                    push_param(params, SqlParam::Text(like_pattern(text)))
                )
            }
            // Reserved fields only support the clauses above
            (ID_FIELD, _) | (CREATED_AT_FIELD, _) | (UPDATED_AT_FIELD, _) => "FALSE".to_string(),
            (_, FilterClause::IdEquals(id)) => {
                let key = push_param(params, SqlParam::Text(field.to_string()));
                let value = push_param(params, SqlParam::Text(id.to_string()));
                format!("lower(data ->> {}::text) = {}", key, value)
            }
            (_, FilterClause::Contains(text)) => {
                let key = push_param(params, SqlParam::Text(field.to_string()));
                let value = push_param(params, SqlParam::Text(like_pattern(text)));
                format!("data ->> {}::text ILIKE {}", key, value)
            }
            (_, FilterClause::Equals(json)) => {
                let key = push_param(params, SqlParam::Text(field.to_string()));
                let value = push_param(params, SqlParam::Json(json.clone()));
                format!("data -> {}::text = {}::jsonb", key, value)
            }
        }
    }

    /// In-process evaluation with the same semantics as the generated SQL
    pub fn matches(filter: &Filter, document: &Document) -> bool {
        filter
            .conditions
            .iter()
            .all(|condition| Self::matches_condition(condition, document))
    }

    fn matches_condition(condition: &FilterWhereInfo, document: &Document) -> bool {
        let field = condition.field.as_str();
        match (field, &condition.clause) {
            (ID_FIELD, FilterClause::IdEquals(id)) => document.id == *id,
            (ID_FIELD, FilterClause::Contains(text)) => contains_ci(&document.id.to_string(), text),
            (CREATED_AT_FIELD, FilterClause::Contains(text)) => {
                contains_ci(&format_timestamp(&document.created_at), text)
            }
            (UPDATED_AT_FIELD, FilterClause::Contains(text)) => {
                contains_ci(&format_timestamp(&document.updated_at), text)
            }
            (ID_FIELD, _) | (CREATED_AT_FIELD, _) | (UPDATED_AT_FIELD, _) => false,
            (_, FilterClause::IdEquals(id)) => document
                .fields
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|stored| stored.to_lowercase() == id.to_string()),
            (_, FilterClause::Contains(text)) => document
                .fields
                .get(field)
                .and_then(value_text)
                .is_some_and(|stored| contains_ci(&stored, text)),
            (_, FilterClause::Equals(json)) => document.fields.get(field) == Some(json),
        }
    }
}

fn push_param(params: &mut Vec<SqlParam>, param: SqlParam) -> String {
    params.push(param);
    format!("${}", params.len())
}

/// `%text%` with LIKE metacharacters escaped so the value matches literally
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Text form of a stored value, mirroring Postgres `->>`
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => {
            let mut out = String::new();
            write_jsonb_text(other, &mut out);
            Some(out)
        }
    }
}

/// jsonb output format: `", "` and `": "` separators, object keys ordered
/// by length and then bytewise
fn write_jsonb_text(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_jsonb_text(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push_str(": ");
                write_jsonb_text(&map[key.as_str()], out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
