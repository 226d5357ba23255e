//! Bodies of the add-user and update-user requests.

use serde::Deserialize;
use validator::Validate;

use crate::domain::types::{FullName, RecordId, UserEmail};
use crate::domain::user::{NewUser, UpdateUser};
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Body of `POST /api/user/adduser`.
pub struct AddUserForm {
    #[validate(length(min = 1))]
    pub fullname: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
/// Body of `PUT /api/user/update/{userId}`.
pub struct UpdateUserForm {
    #[validate(length(min = 1))]
    pub fullname: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    /// Omitted means "keep the current flag".
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Validated user fields shared by both forms.
pub struct UserPayload {
    pub fullname: FullName,
    pub email: UserEmail,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

fn payload(
    fullname: String,
    email: String,
    phone: Option<String>,
    is_active: Option<bool>,
) -> Result<UserPayload, FormError> {
    Ok(UserPayload {
        fullname: FullName::new(fullname).map_err(|_| FormError::InvalidName)?,
        email: UserEmail::new(email).map_err(|_| FormError::InvalidEmail)?,
        phone,
        is_active,
    })
}

impl TryFrom<AddUserForm> for UserPayload {
    type Error = FormError;

    fn try_from(form: AddUserForm) -> Result<Self, Self::Error> {
        form.validate()?;
        payload(form.fullname, form.email, form.phone, form.is_active)
    }
}

impl TryFrom<UpdateUserForm> for UserPayload {
    type Error = FormError;

    fn try_from(form: UpdateUserForm) -> Result<Self, Self::Error> {
        form.validate()?;
        payload(form.fullname, form.email, form.phone, form.is_active)
    }
}

impl UserPayload {
    pub fn into_new_user(self, created_by: Option<RecordId>) -> NewUser {
        NewUser::new(
            self.fullname,
            self.email,
            self.phone,
            self.is_active,
            created_by,
        )
    }

    pub fn into_update(self, updated_by: Option<RecordId>) -> UpdateUser {
        UpdateUser::new(
            self.fullname,
            self.email,
            self.phone,
            self.is_active,
            updated_by,
        )
    }
}
