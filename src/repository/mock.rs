//! Mock repository for isolating services in tests.

use mockall::mock;
use serde_json::Value;

use crate::domain::types::{RecordId, UserEmail};
use crate::domain::user::{NewUser, UpdateUser, User};
use crate::list::{Aggregate, Pipeline};
use crate::repository::errors::RepositoryResult;
use crate::repository::{UserReader, UserWriter};

mock! {
    pub Repository {}

    impl Aggregate for Repository {
        fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> RepositoryResult<Vec<Value>>;
    }

    impl UserReader for Repository {
        fn get_user_by_id(&self, id: RecordId) -> RepositoryResult<Option<User>>;
        fn get_user_by_email(&self, email: &UserEmail) -> RepositoryResult<Option<User>>;
    }

    impl UserWriter for Repository {
        fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User>;
        fn update_user(&self, id: RecordId, updates: &UpdateUser) -> RepositoryResult<User>;
        fn delete_user(&self, id: RecordId) -> RepositoryResult<()>;
    }
}
