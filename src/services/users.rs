//! User management use cases.

use serde_json::Value;

use crate::domain::types::RecordId;
use crate::domain::user::{USER_SEARCH_FIELDS, USERS_COLLECTION, User, UserRef};
use crate::dto::users::{UserDetails, UsersConfig};
use crate::forms::users::{AddUserForm, UpdateUserForm, UserPayload};
use crate::list::{
    Aggregate, Filter, ListDefaults, ListResponse, Pipeline, RawListParams, build_view_filter,
    parse_list_query, run_paginated_aggregation, search_filter,
};
use crate::repository::errors::RepositoryError;
use crate::repository::{UserReader, UserWriter};
use crate::services::{ServiceError, ServiceResult};

const DUPLICATE_EMAIL: &str = "Email ID already exists";

/// Builds the match stage of the users list: ownership scope, no super
/// admins, and the free-text search when one is given.
pub fn users_list_filter(params: &RawListParams, search: &str) -> Filter {
    let mut filters = Vec::new();
    filters.extend(build_view_filter(params).filter);
    filters.push(Filter::exists("isSuperAdmin", false));
    filters.extend(search_filter(USER_SEARCH_FIELDS, search));
    Filter::all(filters)
}

/// Answers one page of the users list for the raw request query string.
pub fn list_users<R>(
    repo: &R,
    query_string: &str,
    defaults: &ListDefaults,
) -> ServiceResult<ListResponse<Value>>
where
    R: Aggregate + Sync + ?Sized,
{
    let params = RawListParams::from_query_str(query_string);
    let query = parse_list_query(&params, defaults);

    let base = Pipeline::new().match_filter(users_list_filter(&params, &query.search));

    run_paginated_aggregation(repo, USERS_COLLECTION, &base, &query).map_err(ServiceError::from)
}

/// The unique email index can still fire when two writes race past the
/// lookup.
fn duplicate_email_as_conflict(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::ConstraintViolation(cause) => {
            log::warn!("Rejected write on email constraint: {cause}");
            ServiceError::Conflict(DUPLICATE_EMAIL.to_string())
        }
        other => ServiceError::from(other),
    }
}

fn parse_user_id(raw: &str) -> ServiceResult<RecordId> {
    RecordId::parse(raw).map_err(|_| ServiceError::NotFound)
}

fn load_ref<R>(repo: &R, id: Option<RecordId>) -> ServiceResult<Option<UserRef>>
where
    R: UserReader + ?Sized,
{
    match id {
        Some(id) => Ok(repo.get_user_by_id(id)?.as_ref().map(UserRef::from)),
        None => Ok(None),
    }
}

/// Loads one user with `createdBy`/`updatedBy` resolved to short references.
pub fn get_user<R>(repo: &R, user_id: &str) -> ServiceResult<UserDetails>
where
    R: UserReader + ?Sized,
{
    let user = repo
        .get_user_by_id(parse_user_id(user_id)?)?
        .ok_or(ServiceError::NotFound)?;

    let created_by = load_ref(repo, user.created_by)?;
    let updated_by = load_ref(repo, user.updated_by)?;

    Ok(UserDetails::new(user, created_by, updated_by))
}

/// Validates the form, rejects a taken email and stores the new user.
pub fn add_user<R>(
    repo: &R,
    audit_user: Option<RecordId>,
    form: AddUserForm,
) -> ServiceResult<User>
where
    R: UserReader + UserWriter + ?Sized,
{
    let payload = UserPayload::try_from(form)?;

    if repo.get_user_by_email(&payload.email)?.is_some() {
        return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
    }

    let user = repo
        .create_user(&payload.into_new_user(audit_user))
        .map_err(duplicate_email_as_conflict)?;
    log::info!("Created user {}", user.id);
    Ok(user)
}

/// Replaces the editable fields of an existing user.
pub fn update_user<R>(
    repo: &R,
    audit_user: Option<RecordId>,
    user_id: &str,
    form: UpdateUserForm,
) -> ServiceResult<User>
where
    R: UserReader + UserWriter + ?Sized,
{
    let id = RecordId::parse(user_id)?;
    let payload = UserPayload::try_from(form)?;

    if let Some(existing) = repo.get_user_by_email(&payload.email)?
        && existing.id != id
    {
        return Err(ServiceError::Conflict(DUPLICATE_EMAIL.to_string()));
    }

    repo.update_user(id, &payload.into_update(audit_user))
        .map_err(duplicate_email_as_conflict)
}

/// Removes a user; a missing user is not an error.
pub fn delete_user<R>(repo: &R, user_id: &str) -> ServiceResult<()>
where
    R: UserWriter + ?Sized,
{
    let id = RecordId::parse(user_id)?;
    repo.delete_user(id)?;
    Ok(())
}

pub fn users_config() -> UsersConfig {
    UsersConfig::default()
}
