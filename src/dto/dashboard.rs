//! DTOs of the dashboard endpoint.

use serde::Serialize;
use serde_json::Value;

/// Fields kept for each entry of [`DashboardData::recent_users`].
pub const RECENT_USER_FIELDS: &[&str] =
    &["_id", "fullname", "email", "phone", "isActive", "createdAt"];

/// Number of users shown in the "recently added" panel.
pub const RECENT_USERS_LIMIT: usize = 8;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum UserStatus {
    Active,
    Inactive,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: UserStatus,
    pub count: usize,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub user_count: usize,
    /// Only statuses with at least one user are listed.
    pub users_by_status: Vec<StatusCount>,
    pub recent_users: Vec<Value>,
}

/// Envelope of `GET /api/dashboard/getdata`.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub data: DashboardData,
}
