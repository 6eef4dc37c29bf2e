use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{ListQuery, Page, Sort, DEFAULT_LIMIT, DEFAULT_PAGE};

impl ListQuery {
    /// Translate raw query-string pairs into filter, page and sort.
    ///
    /// `page` and `limit` are lenient: anything that is not a positive integer
    /// falls back to the default. `limit` is capped at `max_limit`.
    /// A malformed `sort` fails the request.
    pub fn from_params(params: &[(String, String)], max_limit: u64) -> Result<Self, FilterError> {
        let filter = FilterWhere::from_query(params)?;

        let page = parse_positive(last_value(params, "page"), DEFAULT_PAGE);
        let mut limit = parse_positive(last_value(params, "limit"), DEFAULT_LIMIT);
        if max_limit > 0 && limit > max_limit {
            tracing::debug!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            limit = max_limit;
        }

        let sort = match last_value(params, "sort") {
            Some(raw) => FilterOrder::parse(raw)?,
            None => Sort::default(),
        };

        Ok(Self {
            filter,
            page: Page { page, limit },
            sort,
        })
    }
}

fn last_value<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::types::{FilterClause, SortDirection};

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_absent() {
        let query = ListQuery::from_params(&[], 100).unwrap();
        assert_eq!(query.page, Page { page: 1, limit: 10 });
        assert_eq!(query.sort, Sort::default());
        assert!(query.filter.is_empty());
    }

    #[test]
    fn invalid_paging_falls_back_to_defaults() {
        for (page, limit) in [("0", "0"), ("-3", "-1"), ("abc", "1.5"), ("", " ")] {
            let query = ListQuery::from_params(&pairs(&[("page", page), ("limit", limit)]), 100).unwrap();
            assert_eq!(query.page, Page { page: 1, limit: 10 }, "page={page:?} limit={limit:?}");
        }
    }

    #[test]
    fn limit_is_capped() {
        let query = ListQuery::from_params(&pairs(&[("limit", "5000")]), 100).unwrap();
        assert_eq!(query.page.limit, 100);
    }

    #[test]
    fn combines_filter_paging_and_sort() {
        let query = ListQuery::from_params(
            &pairs(&[("page", "3"), ("limit", "2"), ("sort", "-price"), ("item", "cake")]),
            100,
        )
        .unwrap();
        assert_eq!(query.page.offset(), 4);
        assert_eq!(query.sort.keys[0].sort, SortDirection::Desc);
        assert_eq!(query.filter.conditions[0].clause, FilterClause::Contains("cake".into()));
    }

    #[test]
    fn malformed_sort_fails() {
        assert!(ListQuery::from_params(&pairs(&[("sort", "{oops")]), 100).is_err());
    }
}
