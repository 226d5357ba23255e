//! Request bodies accepted by the admin API.

use thiserror::Error;
use validator::ValidationErrors;

pub mod users;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Full name is required")]
    InvalidName,
}
