use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde_json::{Map, Value};

use crate::repository::errors::{RepositoryError, RepositoryResult};

#[derive(Debug, Clone, Identifiable, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = crate::schema::documents)]
/// Diesel model of one stored document.
pub struct Document {
    pub id: String,
    pub collection: String,
    pub body: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(QueryableByName)]
pub struct DocumentCount {
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    pub count: i64,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::documents)]
/// Insertable form of [`Document`].
pub struct NewDocument<'a> {
    pub id: &'a str,
    pub collection: &'a str,
    pub body: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::documents)]
/// Replacement body of an existing [`Document`].
pub struct UpdateDocument<'a> {
    pub body: &'a str,
    pub updated_at: NaiveDateTime,
}

impl Document {
    /// Presents the document the way pipelines return it: the JSON body with
    /// `_id`, `createdAt` and `updatedAt` filled in from the columns.
    pub fn into_json(self) -> RepositoryResult<Value> {
        let mut fields = match serde_json::from_str::<Value>(&self.body)? {
            Value::Object(fields) => fields,
            other => {
                return Err(RepositoryError::ValidationError(format!(
                    "document {} has a non-object body: {other}",
                    self.id
                )));
            }
        };
        fields.insert("_id".to_string(), Value::String(self.id));
        fields.insert("createdAt".to_string(), serde_json::to_value(self.created_at)?);
        fields.insert("updatedAt".to_string(), serde_json::to_value(self.updated_at)?);
        Ok(Value::Object(fields))
    }
}

/// Keeps only the listed top-level fields of a pipeline result.
pub fn project(document: Value, fields: &[&str]) -> Value {
    match document {
        Value::Object(mut all) => Value::Object(
            fields
                .iter()
                .filter_map(|field| all.remove(*field).map(|value| (field.to_string(), value)))
                .collect::<Map<_, _>>(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use super::*;

    fn document(body: &str) -> Document {
        let now = Utc::now().naive_utc();
        Document {
            id: "67e55044-10b1-426f-9247-bb680e5fe0c8".to_string(),
            collection: "users".to_string(),
            body: body.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn into_json_merges_columns() {
        let json = document(r#"{"fullname":"Alice"}"#).into_json().unwrap();
        assert_eq!(json["_id"], "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert_eq!(json["fullname"], "Alice");
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
    }

    #[test]
    fn into_json_rejects_non_object_bodies() {
        assert!(matches!(
            document("[1,2]").into_json(),
            Err(RepositoryError::ValidationError(_))
        ));
        assert!(document("{broken").into_json().is_err());
    }

    #[test]
    fn project_keeps_listed_fields_only() {
        let projected = project(
            json!({"_id": "1", "fullname": "Alice", "createdBy": null}),
            &["_id", "fullname", "phone"],
        );
        assert_eq!(projected, json!({"_id": "1", "fullname": "Alice"}));
    }
}
