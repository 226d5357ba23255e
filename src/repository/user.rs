use chrono::Utc;
use diesel::prelude::*;

use crate::domain::types::{RecordId, UserEmail};
use crate::domain::user::{NewUser, USERS_COLLECTION, UpdateUser, User};
use crate::list::{Aggregate, Filter, Pipeline};
use crate::models::document::{Document, NewDocument, UpdateDocument};
use crate::models::user::UserBody;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, UserReader, UserWriter};

impl UserReader for DieselRepository {
    fn get_user_by_id(&self, id: RecordId) -> RepositoryResult<Option<User>> {
        use crate::schema::documents;

        let mut conn = self.conn()?;

        let document = documents::table
            .filter(documents::collection.eq(USERS_COLLECTION))
            .filter(documents::id.eq(id.to_string()))
            .first::<Document>(&mut conn)
            .optional()?;

        document.map(User::try_from).transpose()
    }

    fn get_user_by_email(&self, email: &UserEmail) -> RepositoryResult<Option<User>> {
        let pipeline = Pipeline::new()
            .match_filter(Filter::eq("email", email.as_str()))
            .limit(1);

        let Some(found) = self.aggregate(USERS_COLLECTION, &pipeline)?.into_iter().next() else {
            return Ok(None);
        };
        let id = found
            .get("_id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| RepositoryError::Unexpected("user document without an id".into()))?;

        self.get_user_by_id(RecordId::parse(id)?)
    }
}

impl UserWriter for DieselRepository {
    fn create_user(&self, new_user: &NewUser) -> RepositoryResult<User> {
        use crate::schema::documents;

        let mut conn = self.conn()?;

        let id = RecordId::generate().to_string();
        let body = serde_json::to_string(&UserBody::from(new_user))?;
        let now = Utc::now().naive_utc();

        let document = diesel::insert_into(documents::table)
            .values(&NewDocument {
                id: &id,
                collection: USERS_COLLECTION,
                body: &body,
                created_at: now,
                updated_at: now,
            })
            .get_result::<Document>(&mut conn)?;

        User::try_from(document)
    }

    fn update_user(&self, id: RecordId, updates: &UpdateUser) -> RepositoryResult<User> {
        use crate::schema::documents;

        let mut conn = self.conn()?;
        let id = id.to_string();

        let document = conn.transaction::<Document, RepositoryError, _>(|conn| {
            let current = documents::table
                .filter(documents::collection.eq(USERS_COLLECTION))
                .filter(documents::id.eq(&id))
                .first::<Document>(conn)?;
            let mut body: UserBody = serde_json::from_str(&current.body)?;
            body.apply(updates);
            let body = serde_json::to_string(&body)?;

            let updated = diesel::update(documents::table.find(&current.id))
                .set(&UpdateDocument {
                    body: &body,
                    updated_at: Utc::now().naive_utc(),
                })
                .get_result::<Document>(conn)?;
            Ok(updated)
        })?;

        User::try_from(document)
    }

    fn delete_user(&self, id: RecordId) -> RepositoryResult<()> {
        use crate::schema::documents;

        let mut conn = self.conn()?;

        let deleted = diesel::delete(
            documents::table
                .filter(documents::collection.eq(USERS_COLLECTION))
                .filter(documents::id.eq(id.to_string())),
        )
        .execute(&mut conn)?;

        if deleted == 0 {
            log::debug!("Delete of missing user {id} ignored");
        }
        Ok(())
    }
}
