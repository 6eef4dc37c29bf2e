use crate::filter::{Filter, FilterOrder, FilterWhere, ListQuery, SqlParam, SqlResult};

const COLUMNS: &str = "id, data, created_at, updated_at";

/// Builds parameterized statements against the shared `documents` table,
/// always scoped to one collection (bound as `$1`).
pub struct QueryBuilder<'a> {
    collection: &'a str,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(collection: &'a str) -> Self {
        Self { collection }
    }

    pub fn select(&self, query: &ListQuery) -> SqlResult {
        let mut params = self.initial_params();
        let where_clause = self.where_clause(&query.filter, &mut params);
        let order_clause = FilterOrder::generate(&query.sort, &mut params);

        params.push(SqlParam::Int(to_i64(query.page.limit)));
        let limit = params.len();
        params.push(SqlParam::Int(to_i64(query.page.offset())));
        let offset = params.len();

        SqlResult {
            query: format!(
                "SELECT {} FROM documents WHERE {} {} LIMIT ${} OFFSET ${}",
                COLUMNS, where_clause, order_clause, limit, offset
            ),
            params,
        }
    }

    pub fn count(&self, filter: &Filter) -> SqlResult {
        let mut params = self.initial_params();
        let where_clause = self.where_clause(filter, &mut params);
        SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM documents WHERE {}", where_clause),
            params,
        }
    }

    pub fn delete_many(&self, filter: &Filter) -> SqlResult {
        let mut params = self.initial_params();
        let where_clause = self.where_clause(filter, &mut params);
        SqlResult {
            query: format!("DELETE FROM documents WHERE {}", where_clause),
            params,
        }
    }

    pub fn insert() -> String {
        format!(
            "INSERT INTO documents (collection, id, data, created_at, updated_at) \
             VALUES ($1, $2, $3, now(), now()) RETURNING {}",
            COLUMNS
        )
    }

    pub fn get() -> String {
        format!("SELECT {} FROM documents WHERE collection = $1 AND id = $2", COLUMNS)
    }

    /// `updated_at` moves forward by at least a microsecond on every write
    pub fn update(merge: bool) -> String {
        let data = if merge { "data || $3" } else { "$3" };
        format!(
            "UPDATE documents SET data = {}, \
             updated_at = GREATEST(clock_timestamp(), updated_at + interval '1 microsecond') \
             WHERE collection = $1 AND id = $2 RETURNING {}",
            data, COLUMNS
        )
    }

    pub fn delete() -> String {
        format!("DELETE FROM documents WHERE collection = $1 AND id = $2 RETURNING {}", COLUMNS)
    }

    fn initial_params(&self) -> Vec<SqlParam> {
        vec![SqlParam::Text(self.collection.to_string())]
    }

    fn where_clause(&self, filter: &Filter, params: &mut Vec<SqlParam>) -> String {
        let conditions = FilterWhere::generate(filter, params);
        if conditions.is_empty() {
            "collection = $1".to_string()
        } else {
            format!("collection = $1 AND {}", conditions)
        }
    }
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
