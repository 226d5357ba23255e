//! Shared SQLite fixture for integration tests.
#![allow(dead_code)]

use std::path::PathBuf;

use dashboard_admin::db::{DbPool, establish_connection_pool};
use dashboard_admin::domain::types::{FullName, RecordId, UserEmail};
use dashboard_admin::domain::user::{NewUser, User};
use dashboard_admin::repository::{DieselRepository, UserWriter};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tempfile::TempDir;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// A migrated database file that disappears with the fixture.
pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path: PathBuf = dir.path().join(name);
        let pool = establish_connection_pool(path.to_str().expect("utf-8 path"))
            .expect("create pool");
        pool.get()
            .expect("get connection")
            .run_pending_migrations(MIGRATIONS)
            .expect("run migrations");
        Self { _dir: dir, pool }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}

pub fn new_user(name: &str, email: &str, created_by: Option<RecordId>) -> NewUser {
    NewUser::new(
        FullName::new(name).unwrap(),
        UserEmail::new(email).unwrap(),
        None,
        None,
        created_by,
    )
}

/// Inserts users one by one so their insertion order is their rowid order.
pub fn seed_users(repo: &DieselRepository, users: &[(&str, &str)]) -> Vec<User> {
    users
        .iter()
        .map(|(name, email)| repo.create_user(&new_user(name, email, None)).unwrap())
        .collect()
}
