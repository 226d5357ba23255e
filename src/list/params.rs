//! Lenient parsing of list query parameters.
//!
//! A list request never fails because of its query string: anything missing,
//! malformed or out of range falls back to a default.

use serde::{Deserialize, Serialize};

use crate::list::{DEFAULT_PAGE_SIZE, DEFAULT_SORT_FIELD};

/// Raw list parameters exactly as they appear on the query string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawListParams {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "sortField")]
    pub sort_field: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
    #[serde(rename = "viewType")]
    pub view_type: Option<String>,
    #[serde(rename = "ownerId")]
    pub owner_id: Option<String>,
}

impl RawListParams {
    /// Parses a URL query string, treating an unparseable string as empty.
    pub fn from_query_str(query: &str) -> Self {
        match serde_html_form::from_str::<RawListParams>(query) {
            Ok(params) => params,
            Err(err) => {
                log::warn!("Ignoring unparseable list query `{query}`: {err}");
                Self::default()
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    /// `"desc"` sorts descending; every other value sorts ascending.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("desc") => SortOrder::Descending,
            _ => SortOrder::Ascending,
        }
    }

    pub fn from_descending(descending: bool) -> Self {
        if descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Caller-supplied fallbacks for [`parse_list_query`].
#[derive(Debug, Clone)]
pub struct ListDefaults {
    pub limit: usize,
    pub sort_field: String,
}

impl Default for ListDefaults {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            sort_field: DEFAULT_SORT_FIELD.to_string(),
        }
    }
}

impl ListDefaults {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: if limit > 0 { limit } else { DEFAULT_PAGE_SIZE },
            ..Self::default()
        }
    }
}

/// Normalized pagination, sort and search parameters of one list request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Zero-based page index.
    pub page: usize,
    /// Rows per page, always greater than zero.
    pub limit: usize,
    pub sort_field: String,
    pub sort_order: SortOrder,
    /// Trimmed search term, empty when no search is applied.
    pub search: String,
}

impl ListQuery {
    /// Number of rows to skip before the requested page.
    pub fn skip(&self) -> usize {
        self.page.saturating_mul(self.limit)
    }
}

/// Extracts page, limit, sort and search from raw parameters.
pub fn parse_list_query(params: &RawListParams, defaults: &ListDefaults) -> ListQuery {
    let page = parse_integer(params.page.as_deref()).unwrap_or(0);
    let limit = parse_integer(params.per_page.as_deref())
        .filter(|limit| *limit > 0)
        .unwrap_or(if defaults.limit > 0 {
            defaults.limit
        } else {
            DEFAULT_PAGE_SIZE
        });

    let sort_field = [params.sort_field.as_deref(), Some(defaults.sort_field.as_str())]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|field| !field.is_empty())
        .unwrap_or(DEFAULT_SORT_FIELD)
        .to_string();

    ListQuery {
        page,
        limit,
        sort_field,
        sort_order: SortOrder::parse(params.sort_order.as_deref()),
        search: params
            .search
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string(),
    }
}

/// Reads the leading digits of `value`, ignoring anything after them, so
/// `"2abc"` is 2 and `"1.5"` is 1. Signs other than `+` and values without a
/// leading digit yield `None`.
fn parse_integer(value: Option<&str>) -> Option<usize> {
    let raw = value?.trim_start();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let digits = raw
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw, |end| &raw[..end]);
    digits.parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(query: &str) -> ListQuery {
        parse_list_query(&RawListParams::from_query_str(query), &ListDefaults::default())
    }

    #[test]
    fn empty_query_uses_defaults() {
        let query = parse("");
        assert_eq!(
            query,
            ListQuery {
                page: 0,
                limit: 10,
                sort_field: "createdAt".to_string(),
                sort_order: SortOrder::Ascending,
                search: String::new(),
            }
        );
    }

    #[test]
    fn full_query_is_parsed() {
        let query = parse("page=2&per_page=25&search=%20ali%20&sortField=fullname&sortOrder=desc");
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 25);
        assert_eq!(query.search, "ali");
        assert_eq!(query.sort_field, "fullname");
        assert_eq!(query.sort_order, SortOrder::Descending);
        assert_eq!(query.skip(), 50);
    }

    #[test]
    fn invalid_numbers_fall_back_to_defaults() {
        let query = parse("page=-3&per_page=0");
        assert_eq!(query.page, 0);
        assert_eq!(query.limit, 10);

        let query = parse("page=abc&per_page=ten");
        assert_eq!(query.page, 0);
        assert_eq!(query.limit, 10);
    }

    #[test]
    fn numbers_are_read_up_to_the_first_non_digit() {
        let query = parse("page=2abc&per_page=1.5");
        assert_eq!(query.page, 2);
        assert_eq!(query.limit, 1);

        let query = parse("page=%2B3&per_page=%2012");
        assert_eq!(query.page, 3);
        assert_eq!(query.limit, 12);

        // No leading digit, or zero, falls back.
        let query = parse("page=x2&per_page=0.5");
        assert_eq!(query.page, 0);
        assert_eq!(query.limit, 10);
    }

    #[test]
    fn caller_default_limit_is_used() {
        let params = RawListParams::from_query_str("page=1");
        let query = parse_list_query(&params, &ListDefaults::with_limit(8));
        assert_eq!(query.limit, 8);
    }

    #[test]
    fn unknown_sort_order_is_ascending() {
        assert_eq!(parse("sortOrder=DESC").sort_order, SortOrder::Ascending);
        assert_eq!(parse("sortOrder=random").sort_order, SortOrder::Ascending);
    }

    #[test]
    fn empty_sort_field_falls_back() {
        assert_eq!(parse("sortField=").sort_field, "createdAt");
    }

    #[test]
    fn sort_order_round_trips_through_strings() {
        assert_eq!(SortOrder::parse(Some(SortOrder::Descending.as_str())), SortOrder::Descending);
        assert_eq!(SortOrder::from_descending(false).as_str(), "asc");
    }
}
