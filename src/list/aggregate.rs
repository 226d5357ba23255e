//! Paginated aggregation: one page of rows plus the total match count,
//! computed over any [`Aggregate`] store.

use serde_json::Value;

use crate::list::params::ListQuery;
use crate::list::pipeline::Pipeline;
use crate::list::response::ListResponse;
use crate::repository::errors::RepositoryResult;

/// Name of the count field produced by the total-count pipeline.
pub const TOTAL_COUNT_FIELD: &str = "total_count";

/// A document store able to run [`Pipeline`]s against named collections.
pub trait Aggregate {
    fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> RepositoryResult<Vec<Value>>;
}

/// Runs one page of `base` plus the total number of matching documents.
///
/// The page and the count are two independent reads issued concurrently; the
/// count of an empty match is reported as zero. Store errors are returned to
/// the caller untouched.
pub fn run_paginated_aggregation<A>(
    store: &A,
    collection: &str,
    base: &Pipeline,
    query: &ListQuery,
) -> RepositoryResult<ListResponse<Value>>
where
    A: Aggregate + Sync + ?Sized,
{
    let page_pipeline = base
        .clone()
        .sort(query.sort_field.clone(), query.sort_order)
        .skip(query.skip())
        .limit(query.limit);
    let count_pipeline = base.clone().count(TOTAL_COUNT_FIELD);

    let (data, total) = rayon::join(
        || store.aggregate(collection, &page_pipeline),
        || store.aggregate(collection, &count_pipeline),
    );

    Ok(ListResponse {
        data: data?,
        total_row_count: total_from_count(&total?),
    })
}

fn total_from_count(groups: &[Value]) -> usize {
    groups
        .first()
        .and_then(|group| group.get(TOTAL_COUNT_FIELD))
        .and_then(Value::as_u64)
        .and_then(|count| usize::try_from(count).ok())
        .unwrap_or(0)
}
