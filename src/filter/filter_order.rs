use std::cmp::Ordering;

use serde_json::{Map, Value};

use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::{FilterOrderInfo, Sort, SortDirection, SqlParam};
use crate::database::document::{Document, CREATED_AT_FIELD, ID_FIELD, UPDATED_AT_FIELD};

pub struct FilterOrder;

impl FilterOrder {
    /// Parse the `sort` query parameter.
    ///
    /// Accepts a JSON object (`{"price": 1, "name": "desc"}`) or a comma list
    /// (`price,-name` / `price asc, name desc`). Blank input yields the default sort.
    pub fn parse(raw: &str) -> Result<Sort, FilterError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(Sort::default());
        }

        let keys = if trimmed.starts_with('{') {
            let obj: Map<String, Value> = serde_json::from_str(trimmed)
                .map_err(|e| FilterError::InvalidSort(format!("malformed JSON: {}", e)))?;
            Self::parse_object(&obj)?
        } else {
            Self::parse_order_string(trimmed)?
        };

        if keys.is_empty() {
            return Ok(Sort::default());
        }
        Ok(Sort { keys })
    }

    fn parse_object(obj: &Map<String, Value>) -> Result<Vec<FilterOrderInfo>, FilterError> {
        let mut out = Vec::with_capacity(obj.len());
        for (field, direction) in obj {
            FilterWhere::validate_field(field).map_err(|e| FilterError::InvalidSort(e.to_string()))?;
            let sort = match direction {
                Value::Number(n) => match n.as_i64() {
                    Some(1) => SortDirection::Asc,
                    Some(-1) => SortDirection::Desc,
                    _ => return Err(FilterError::InvalidSort(format!("unknown direction '{}' for '{}'", n, field))),
                },
                Value::String(s) => Self::parse_direction(s)
                    .ok_or_else(|| FilterError::InvalidSort(format!("unknown direction '{}' for '{}'", s, field)))?,
                other => {
                    return Err(FilterError::InvalidSort(format!("unknown direction '{}' for '{}'", other, field)))
                }
            };
            out.push(FilterOrderInfo { field: field.clone(), sort });
        }
        Ok(out)
    }

    fn parse_order_string(s: &str) -> Result<Vec<FilterOrderInfo>, FilterError> {
        // split on commas, then each token into field and direction
        let mut out = Vec::new();
        for part in s.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut it = trimmed.split_whitespace();
            let (Some(token), direction, None) = (it.next(), it.next(), it.next()) else {
                return Err(FilterError::InvalidSort(format!("cannot parse '{}'", trimmed)));
            };

            let (field, prefixed) = match token.strip_prefix('-') {
                Some(rest) => (rest, Some(SortDirection::Desc)),
                None => (token.strip_prefix('+').unwrap_or(token), None),
            };
            let sort = match (prefixed, direction) {
                (Some(_), Some(_)) => {
                    return Err(FilterError::InvalidSort(format!("cannot parse '{}'", trimmed)));
                }
                (Some(sort), None) => sort,
                (None, Some(dir)) => Self::parse_direction(dir)
                    .ok_or_else(|| FilterError::InvalidSort(format!("unknown direction '{}' for '{}'", dir, field)))?,
                (None, None) => SortDirection::Asc,
            };

            FilterWhere::validate_field(field).map_err(|e| FilterError::InvalidSort(e.to_string()))?;
            out.push(FilterOrderInfo { field: field.to_string(), sort });
        }
        Ok(out)
    }

    fn parse_direction(s: &str) -> Option<SortDirection> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Some(SortDirection::Asc),
            "desc" | "descending" | "-1" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    /// Render an ORDER BY clause, appending bind values to `params`.
    /// Ties always break on the document id so pages never overlap.
    pub fn generate(sort: &Sort, params: &mut Vec<SqlParam>) -> String {
        let mut parts: Vec<String> = sort
            .keys
            .iter()
            .map(|info| {
                let expr = match info.field.as_str() {
                    ID_FIELD => "id".to_string(),
                    CREATED_AT_FIELD => "created_at".to_string(),
                    UPDATED_AT_FIELD => "updated_at".to_string(),
                    field => {
                        params.push(SqlParam::Text(field.to_string()));
                        format!("data -> ${}::text", params.len())
                    }
                };
                format!("{} {}", expr, info.sort.to_sql())
            })
            .collect();

        if !sort.keys.iter().any(|k| k.field == ID_FIELD) {
            parts.push("id ASC".to_string());
        }
        format!("ORDER BY {}", parts.join(", "))
    }

    /// In-process ordering with the same tie-breaking as the generated SQL.
    /// Missing values sort last ascending and first descending, and mixed
    /// types follow jsonb's type order. Strings compare bytewise, where
    /// Postgres applies the database collation.
    pub fn compare(sort: &Sort, a: &Document, b: &Document) -> Ordering {
        for info in &sort.keys {
            let ordering = match info.field.as_str() {
                ID_FIELD => a.id.cmp(&b.id),
                CREATED_AT_FIELD => a.created_at.cmp(&b.created_at),
                UPDATED_AT_FIELD => a.updated_at.cmp(&b.updated_at),
                field => compare_optional(a.fields.get(field), b.fields.get(field)),
            };
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        a.id.cmp(&b.id)
    }
}

fn compare_optional(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_values(a, b),
    }
}

/// jsonb: null < string < number < boolean < array < object
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::String(_) => 1,
        Value::Number(_) => 2,
        Value::Bool(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        // Longer arrays sort after shorter ones, then element by element
        (Value::Array(x), Value::Array(y)) => x.len().cmp(&y.len()).then_with(|| {
            x.iter()
                .zip(y)
                .map(|(l, r)| compare_values(l, r))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        }),
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()).then_with(|| a.to_string().cmp(&b.to_string())),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}
