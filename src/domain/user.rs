use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{FullName, RecordId, UserEmail, normalize_optional};

/// Name of the document collection holding users.
pub const USERS_COLLECTION: &str = "users";

/// Request header naming the user who performs a mutation.
pub const AUDIT_USER_HEADER: &str = "audit_user_id";

/// Fields matched by the free-text search of the users list.
pub const USER_SEARCH_FIELDS: &[&str] = &["fullname", "email", "phone"];

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub fullname: FullName,
    pub email: UserEmail,
    pub phone: Option<String>,
    pub is_active: bool,
    /// Super admins exist in the store but never show up in user lists.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_super_admin: bool,
    pub created_by: Option<RecordId>,
    pub updated_by: Option<RecordId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Short reference to a user, used to populate audit fields.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct UserRef {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub fullname: FullName,
    pub email: UserEmail,
}

impl From<&User> for UserRef {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            fullname: user.fullname.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewUser {
    pub fullname: FullName,
    pub email: UserEmail,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_by: Option<RecordId>,
}

impl NewUser {
    #[must_use]
    pub fn new(
        fullname: FullName,
        email: UserEmail,
        phone: Option<String>,
        is_active: Option<bool>,
        created_by: Option<RecordId>,
    ) -> Self {
        Self {
            fullname,
            email,
            phone: normalize_optional(phone),
            is_active: is_active.unwrap_or(true),
            created_by,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpdateUser {
    pub fullname: FullName,
    pub email: UserEmail,
    pub phone: Option<String>,
    /// `None` leaves the current activity flag untouched.
    pub is_active: Option<bool>,
    pub updated_by: Option<RecordId>,
}

impl UpdateUser {
    #[must_use]
    pub fn new(
        fullname: FullName,
        email: UserEmail,
        phone: Option<String>,
        is_active: Option<bool>,
        updated_by: Option<RecordId>,
    ) -> Self {
        Self {
            fullname,
            email,
            phone: normalize_optional(phone),
            is_active,
            updated_by,
        }
    }
}
