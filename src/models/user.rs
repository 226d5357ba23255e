use serde::{Deserialize, Serialize};

use crate::domain::types::{FullName, RecordId, UserEmail};
use crate::domain::user::{NewUser, UpdateUser, User};
use crate::models::document::Document;
use crate::repository::errors::RepositoryError;

fn default_active() -> bool {
    true
}

/// JSON body stored for a [`User`] document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub fullname: FullName,
    pub email: UserEmail,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Stored only when set so lists can exclude super admins by absence.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_super_admin: bool,
    #[serde(default)]
    pub created_by: Option<RecordId>,
    #[serde(default)]
    pub updated_by: Option<RecordId>,
}

impl From<&NewUser> for UserBody {
    fn from(user: &NewUser) -> Self {
        Self {
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            is_active: user.is_active,
            is_super_admin: false,
            created_by: user.created_by,
            updated_by: None,
        }
    }
}

impl UserBody {
    /// Applies an update, keeping fields the update does not carry.
    pub fn apply(&mut self, updates: &UpdateUser) {
        self.fullname = updates.fullname.clone();
        self.email = updates.email.clone();
        self.phone = updates.phone.clone();
        if let Some(is_active) = updates.is_active {
            self.is_active = is_active;
        }
        self.updated_by = updates.updated_by;
    }
}

impl TryFrom<Document> for User {
    type Error = RepositoryError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        let body: UserBody = serde_json::from_str(&document.body)?;
        let id = RecordId::parse(&document.id)?;
        Ok(Self {
            id,
            fullname: body.fullname,
            email: body.email,
            phone: body.phone,
            is_active: body.is_active,
            is_super_admin: body.is_super_admin,
            created_by: body.created_by,
            updated_by: body.updated_by,
            created_at: document.created_at,
            updated_at: document.updated_at,
        })
    }
}
