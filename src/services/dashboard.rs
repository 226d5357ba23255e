//! Dashboard statistics.

use serde_json::Value;

use crate::domain::user::USERS_COLLECTION;
use crate::dto::dashboard::{
    DashboardData, RECENT_USER_FIELDS, RECENT_USERS_LIMIT, StatusCount, UserStatus,
};
use crate::list::{Aggregate, Filter, Pipeline, SortOrder, TOTAL_COUNT_FIELD};
use crate::models::document::project;
use crate::repository::errors::RepositoryResult;
use crate::services::ServiceResult;

fn count<R>(repo: &R, base: Pipeline) -> RepositoryResult<usize>
where
    R: Aggregate + ?Sized,
{
    let groups = repo.aggregate(USERS_COLLECTION, &base.count(TOTAL_COUNT_FIELD))?;
    Ok(groups
        .first()
        .and_then(|group| group.get(TOTAL_COUNT_FIELD))
        .and_then(Value::as_u64)
        .and_then(|count| usize::try_from(count).ok())
        .unwrap_or(0))
}

/// Collects the user totals and the most recently created users.
pub fn load_dashboard<R>(repo: &R) -> ServiceResult<DashboardData>
where
    R: Aggregate + ?Sized,
{
    let user_count = count(repo, Pipeline::new())?;
    let active = count(
        repo,
        Pipeline::new().match_filter(Filter::eq("isActive", true)),
    )?;

    let users_by_status = [
        (UserStatus::Active, active),
        (UserStatus::Inactive, user_count.saturating_sub(active)),
    ]
    .into_iter()
    .filter(|(_, count)| *count > 0)
    .map(|(status, count)| StatusCount { status, count })
    .collect();

    let recent = Pipeline::new()
        .sort("createdAt", SortOrder::Descending)
        .limit(RECENT_USERS_LIMIT);
    let recent_users = repo
        .aggregate(USERS_COLLECTION, &recent)?
        .into_iter()
        .map(|user| project(user, RECENT_USER_FIELDS))
        .collect();

    Ok(DashboardData {
        user_count,
        users_by_status,
        recent_users,
    })
}
