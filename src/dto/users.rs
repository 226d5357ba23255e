//! DTOs of the user management endpoints.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{FullName, RecordId, UserEmail};
use crate::domain::user::{User, UserRef};

/// A single user with its audit references resolved.
///
/// A reference to a user that no longer exists serializes as `null`.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub fullname: FullName,
    pub email: UserEmail,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_by: Option<UserRef>,
    pub updated_by: Option<UserRef>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl UserDetails {
    pub fn new(user: User, created_by: Option<UserRef>, updated_by: Option<UserRef>) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname,
            email: user.email,
            phone: user.phone,
            is_active: user.is_active,
            created_by,
            updated_by,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Options the user form needs from the server.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct UsersConfig {
    pub roles: Vec<String>,
}
