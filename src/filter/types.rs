use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// How a single field is matched
#[derive(Debug, Clone, PartialEq)]
pub enum FilterClause {
    /// Exact match on an identifier-formatted value
    IdEquals(Uuid),
    /// Case-insensitive substring match
    Contains(String),
    /// Exact JSON value match (body filters with non-string values)
    Equals(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub field: String,
    pub clause: FilterClause,
}

/// Conjunction of field constraints used by list and delete-many
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub conditions: Vec<FilterWhereInfo>,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn push(&mut self, field: impl Into<String>, clause: FilterClause) {
        self.conditions.push(FilterWhereInfo {
            field: field.into(),
            clause,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub field: String,
    pub sort: SortDirection,
}

/// Ordered sort keys; earlier keys take priority
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub keys: Vec<FilterOrderInfo>,
}

impl Default for Sort {
    /// Newest first
    fn default() -> Self {
        Self {
            keys: vec![FilterOrderInfo {
                field: crate::database::document::CREATED_AT_FIELD.to_string(),
                sort: SortDirection::Desc,
            }],
        }
    }
}

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Page {
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Pagination metadata returned alongside list results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: Page, total: u64) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total,
            pages: total.div_ceil(page.limit.max(1)),
        }
    }
}

/// Everything a list request asks the store for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub filter: Filter,
    pub page: Page,
    pub sort: Sort,
}

/// A bind parameter for generated SQL
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Uuid(Uuid),
    Json(Value),
    Int(i64),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
