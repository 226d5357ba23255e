use crate::db::{DbConnection, DbPool, get_connection};
use crate::domain::types::{RecordId, UserEmail};
use crate::domain::user::{NewUser, UpdateUser, User};
use crate::repository::errors::RepositoryResult;

pub mod document;
pub mod errors;
#[cfg(any(test, feature = "test-mocks"))]
pub mod mock;
pub mod user;

/// Document store backed by the Diesel SQLite pool.
///
/// Implements [`crate::list::Aggregate`] together with the typed user
/// traits; cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(get_connection(&self.pool)?)
    }
}

pub trait UserReader {
    fn get_user_by_id(&self, id: RecordId) -> RepositoryResult<Option<User>>;
    fn get_user_by_email(&self, email: &UserEmail) -> RepositoryResult<Option<User>>;
}

pub trait UserWriter {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
    /// Fails with [`errors::RepositoryError::NotFound`] when no such user exists.
    fn update_user(&self, id: RecordId, updates: &UpdateUser) -> RepositoryResult<User>;
    /// Deleting a missing user is not an error.
    fn delete_user(&self, id: RecordId) -> RepositoryResult<()>;
}
