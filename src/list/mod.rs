//! The list contract shared by the API and the list-view client.
//!
//! A list request carries `page`, `per_page`, `search`, `sortField`,
//! `sortOrder`, `viewType` and `ownerId` on the query string and is answered
//! with `{"data": [...], "totalRowCount": n}`. This module parses the
//! request, builds the filter pipeline and runs the paginated aggregation.

pub mod aggregate;
pub mod params;
pub mod pipeline;
pub mod response;
pub mod view;

pub use aggregate::{Aggregate, TOTAL_COUNT_FIELD, run_paginated_aggregation};
pub use params::{ListDefaults, ListQuery, RawListParams, SortOrder, parse_list_query};
pub use pipeline::{Filter, Pipeline, SortSpec, Stage, search_filter};
pub use response::ListResponse;
pub use view::{ViewFilter, ViewType, build_view_filter};

/// Page size used when neither the request nor the caller provides one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Sort field used when the request does not name one.
pub const DEFAULT_SORT_FIELD: &str = "createdAt";
