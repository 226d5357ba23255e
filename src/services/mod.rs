//! Use cases behind the HTTP handlers.
//!
//! Services are generic over the repository traits so they can be exercised
//! with [`crate::repository::mock::MockRepository`] and stay independent of
//! actix-web.

use thiserror::Error;

use crate::forms::FormError;
use crate::repository::errors::RepositoryError;

pub mod dashboard;
pub mod users;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Form(String),

    #[error("{0}")]
    Conflict(String),

    #[error("User not found")]
    NotFound,

    #[error("{0}")]
    TypeConstraint(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            other => ServiceError::Repository(other),
        }
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Validation(errors) => {
                log::debug!("Rejected form: {errors}");
                ServiceError::Form("All fields are required and must be valid".to_string())
            }
            other => ServiceError::Form(other.to_string()),
        }
    }
}
