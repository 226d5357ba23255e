//! Pipeline execution over the SQLite `documents` table.
//!
//! A [`Pipeline`] is compiled into a single parameterized statement. Only the
//! stage orders `Match* Sort? Skip? Limit?` and `Match* Count` are accepted;
//! that is all the list helper and the services produce.

use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Double, Text};
use diesel::sqlite::Sqlite;
use serde_json::{Map, Value};

use crate::list::{Aggregate, Filter, Pipeline, SortOrder, SortSpec, Stage};
use crate::models::document::{Document, DocumentCount};
use crate::repository::DieselRepository;
use crate::repository::errors::{RepositoryError, RepositoryResult};

const SELECT_DOCUMENTS: &str =
    "SELECT id, collection, body, created_at, updated_at FROM documents WHERE collection = ?";
const COUNT_DOCUMENTS: &str = "SELECT COUNT(*) AS count FROM documents WHERE collection = ?";

#[derive(Debug, Clone, PartialEq)]
enum Bind {
    Text(String),
    BigInt(i64),
    Double(f64),
}

/// Where a document field lives in the table.
#[derive(Debug, Clone, PartialEq)]
enum FieldTarget {
    Column(&'static str),
    Json(String),
}

fn resolve_field(field: &str) -> Option<FieldTarget> {
    match field {
        "_id" => Some(FieldTarget::Column("id")),
        "createdAt" => Some(FieldTarget::Column("created_at")),
        "updatedAt" => Some(FieldTarget::Column("updated_at")),
        _ if is_field_path(field) => Some(FieldTarget::Json(format!("$.{field}"))),
        _ => None,
    }
}

fn is_field_path(field: &str) -> bool {
    !field.is_empty()
        && field.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Shape of a pipeline once its stage order has been checked.
#[derive(Debug, Default)]
struct Plan<'a> {
    filters: Vec<&'a Filter>,
    sort: Option<&'a SortSpec>,
    skip: Option<usize>,
    limit: Option<usize>,
    count: Option<&'a str>,
}

fn plan(pipeline: &Pipeline) -> RepositoryResult<Plan<'_>> {
    // Position of the latest stage: 0 match, 1 sort, 2 skip, 3 limit, 4 count.
    let mut position = 0;
    let mut plan = Plan::default();

    for stage in pipeline.stages() {
        let (allowed, next) = match stage {
            Stage::Match(filter) => {
                plan.filters.push(filter);
                (position == 0, 0)
            }
            Stage::Sort(sort_by) => {
                plan.sort = Some(sort_by);
                (position < 1, 1)
            }
            Stage::Skip(count) => {
                plan.skip = Some(*count);
                (position < 2, 2)
            }
            Stage::Limit(count) => {
                plan.limit = Some(*count);
                (position < 3, 3)
            }
            Stage::Count(name) => {
                plan.count = Some(name.as_str());
                (position == 0, 4)
            }
        };
        if !allowed {
            return Err(RepositoryError::ValidationError(format!(
                "unsupported pipeline: `{}` stage out of order",
                stage.name()
            )));
        }
        position = next;
    }

    Ok(plan)
}

/// SQL text plus its positional binds, kept in emission order.
#[derive(Debug, Default)]
struct SqlBuilder {
    sql: String,
    binds: Vec<Bind>,
}

impl SqlBuilder {
    fn new(prefix: &str, collection: &str) -> Self {
        Self {
            sql: prefix.to_string(),
            binds: vec![Bind::Text(collection.to_string())],
        }
    }

    fn push_target(&mut self, target: &FieldTarget) {
        match target {
            FieldTarget::Column(column) => self.sql.push_str(column),
            FieldTarget::Json(path) => {
                self.sql.push_str("json_extract(body, ?)");
                self.binds.push(Bind::Text(path.clone()));
            }
        }
    }

    fn push_filter(&mut self, filter: &Filter) -> RepositoryResult<()> {
        match filter {
            Filter::Eq { field, value } => {
                let target = filter_target(field)?;
                let bind = match value {
                    Value::Null => {
                        self.push_target(&target);
                        self.sql.push_str(" IS NULL");
                        return Ok(());
                    }
                    Value::Bool(flag) => Bind::BigInt(i64::from(*flag)),
                    Value::Number(number) => match number.as_i64() {
                        Some(int) => Bind::BigInt(int),
                        None => Bind::Double(number.as_f64().unwrap_or(f64::NAN)),
                    },
                    Value::String(text) => Bind::Text(text.clone()),
                    Value::Array(_) | Value::Object(_) => {
                        return Err(RepositoryError::ValidationError(format!(
                            "cannot compare `{field}` against a composite value"
                        )));
                    }
                };
                self.push_target(&target);
                self.sql.push_str(" = ?");
                self.binds.push(bind);
            }
            Filter::Exists { field, exists } => match filter_target(field)? {
                FieldTarget::Column(_) => {
                    self.sql.push_str(if *exists { "1 = 1" } else { "1 = 0" });
                }
                FieldTarget::Json(path) => {
                    self.sql.push_str("json_type(body, ?) IS ");
                    self.sql.push_str(if *exists { "NOT NULL" } else { "NULL" });
                    self.binds.push(Bind::Text(path));
                }
            },
            Filter::Contains { field, needle } => {
                let target = filter_target(field)?;
                self.sql.push_str("instr(unicode_lower(");
                self.push_target(&target);
                self.sql.push_str("), unicode_lower(?)) > 0");
                self.binds.push(Bind::Text(needle.clone()));
            }
            Filter::And(filters) => self.push_group(filters, " AND ", "1 = 1")?,
            Filter::Or(filters) => self.push_group(filters, " OR ", "1 = 0")?,
        }
        Ok(())
    }

    fn push_group(&mut self, filters: &[Filter], joiner: &str, empty: &str) -> RepositoryResult<()> {
        if filters.is_empty() {
            self.sql.push_str(empty);
            return Ok(());
        }
        self.sql.push('(');
        for (index, filter) in filters.iter().enumerate() {
            if index > 0 {
                self.sql.push_str(joiner);
            }
            self.push_filter(filter)?;
        }
        self.sql.push(')');
        Ok(())
    }

    fn push_filters(&mut self, filters: &[&Filter]) -> RepositoryResult<()> {
        for filter in filters {
            self.sql.push_str(" AND ");
            self.push_filter(filter)?;
        }
        Ok(())
    }

    fn push_order(&mut self, sort: Option<&SortSpec>) {
        self.sql.push_str(" ORDER BY ");
        if let Some(sort_by) = sort {
            match resolve_field(&sort_by.field) {
                Some(target) => {
                    self.push_target(&target);
                    self.sql.push_str(match sort_by.order {
                        SortOrder::Ascending => " ASC, ",
                        SortOrder::Descending => " DESC, ",
                    });
                }
                None => log::warn!("Ignoring sort on malformed field `{}`", sort_by.field),
            }
        }
        // Insertion order breaks ties so consecutive pages never overlap.
        self.sql.push_str("rowid ASC");
    }

    fn push_window(&mut self, skip: Option<usize>, limit: Option<usize>) {
        match (skip, limit) {
            (_, Some(limit)) => {
                self.sql.push_str(" LIMIT ?");
                self.binds.push(Bind::BigInt(to_i64(limit)));
            }
            (Some(_), None) => self.sql.push_str(" LIMIT -1"),
            (None, None) => return,
        }
        if let Some(skip) = skip {
            self.sql.push_str(" OFFSET ?");
            self.binds.push(Bind::BigInt(to_i64(skip)));
        }
    }
}

fn filter_target(field: &str) -> RepositoryResult<FieldTarget> {
    resolve_field(field).ok_or_else(|| {
        RepositoryError::ValidationError(format!("invalid filter field `{field}`"))
    })
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

enum Compiled {
    Documents(SqlBuilder),
    Count(SqlBuilder, String),
}

fn compile(collection: &str, pipeline: &Pipeline) -> RepositoryResult<Compiled> {
    let plan = plan(pipeline)?;
    match plan.count {
        Some(name) => {
            let mut builder = SqlBuilder::new(COUNT_DOCUMENTS, collection);
            builder.push_filters(&plan.filters)?;
            Ok(Compiled::Count(builder, name.to_string()))
        }
        None => {
            let mut builder = SqlBuilder::new(SELECT_DOCUMENTS, collection);
            builder.push_filters(&plan.filters)?;
            builder.push_order(plan.sort);
            builder.push_window(plan.skip, plan.limit);
            Ok(Compiled::Documents(builder))
        }
    }
}

fn bound_query(builder: SqlBuilder) -> BoxedSqlQuery<'static, Sqlite, SqlQuery> {
    let mut query = diesel::sql_query(builder.sql).into_boxed::<Sqlite>();
    for bind in builder.binds {
        query = match bind {
            Bind::Text(text) => query.bind::<Text, _>(text),
            Bind::BigInt(int) => query.bind::<BigInt, _>(int),
            Bind::Double(float) => query.bind::<Double, _>(float),
        };
    }
    query
}

impl Aggregate for DieselRepository {
    fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> RepositoryResult<Vec<Value>> {
        let compiled = compile(collection, pipeline)?;
        let mut conn = self.conn()?;

        match compiled {
            Compiled::Documents(builder) => bound_query(builder)
                .load::<Document>(&mut conn)?
                .into_iter()
                .map(Document::into_json)
                .collect(),
            Compiled::Count(builder, name) => {
                let count = bound_query(builder)
                    .get_result::<DocumentCount>(&mut conn)?
                    .count;
                if count == 0 {
                    return Ok(Vec::new());
                }
                let mut group = Map::new();
                group.insert(name, Value::from(count));
                Ok(vec![Value::Object(group)])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn documents_sql(pipeline: &Pipeline) -> SqlBuilder {
        match compile("users", pipeline).unwrap() {
            Compiled::Documents(builder) => builder,
            Compiled::Count(..) => panic!("expected a documents query"),
        }
    }

    #[test]
    fn compiles_filtered_sorted_window() {
        let pipeline = Pipeline::new()
            .match_filter(Filter::And(vec![
                Filter::exists("isSuperAdmin", false),
                Filter::Or(vec![
                    Filter::contains("fullname", "ali"),
                    Filter::contains("_id", "ali"),
                ]),
            ]))
            .sort("fullname", SortOrder::Descending)
            .skip(20)
            .limit(10);

        let builder = documents_sql(&pipeline);
        assert_eq!(
            builder.sql,
            format!(
                "{SELECT_DOCUMENTS} AND (json_type(body, ?) IS NULL AND \
                 (instr(unicode_lower(json_extract(body, ?)), unicode_lower(?)) > 0 \
                 OR instr(unicode_lower(id), unicode_lower(?)) > 0)) \
                 ORDER BY json_extract(body, ?) DESC, rowid ASC LIMIT ? OFFSET ?"
            )
        );
        assert_eq!(
            builder.binds,
            vec![
                Bind::Text("users".into()),
                Bind::Text("$.isSuperAdmin".into()),
                Bind::Text("$.fullname".into()),
                Bind::Text("ali".into()),
                Bind::Text("ali".into()),
                Bind::Text("$.fullname".into()),
                Bind::BigInt(10),
                Bind::BigInt(20),
            ]
        );
    }

    #[test]
    fn compiles_count_with_equality() {
        let pipeline = Pipeline::new()
            .match_filter(Filter::eq("isActive", true))
            .count("total_count");
        match compile("users", &pipeline).unwrap() {
            Compiled::Count(builder, name) => {
                assert_eq!(name, "total_count");
                assert_eq!(
                    builder.sql,
                    format!("{COUNT_DOCUMENTS} AND json_extract(body, ?) = ?")
                );
                assert_eq!(builder.binds[2], Bind::BigInt(1));
            }
            Compiled::Documents(_) => panic!("expected a count query"),
        }
    }

    #[test]
    fn timestamp_fields_sort_by_column() {
        let builder = documents_sql(&Pipeline::new().sort("createdAt", SortOrder::Ascending));
        assert!(builder.sql.ends_with("ORDER BY created_at ASC, rowid ASC"));
    }

    #[test]
    fn malformed_sort_field_is_ignored() {
        let builder =
            documents_sql(&Pipeline::new().sort("name; DROP TABLE", SortOrder::Ascending));
        assert!(builder.sql.ends_with("ORDER BY rowid ASC"));
        assert_eq!(builder.binds.len(), 1);
    }

    #[test]
    fn skip_without_limit_uses_unbounded_limit() {
        let builder = documents_sql(&Pipeline::new().skip(5));
        assert!(builder.sql.ends_with("LIMIT -1 OFFSET ?"));
    }

    #[test]
    fn rejects_out_of_order_stages() {
        let after_window = Pipeline::new()
            .limit(5)
            .match_filter(Filter::eq("isActive", true));
        assert!(matches!(
            compile("users", &after_window),
            Err(RepositoryError::ValidationError(_))
        ));

        let count_after_sort = Pipeline::new()
            .sort("fullname", SortOrder::Ascending)
            .count("n");
        assert!(compile("users", &count_after_sort).is_err());
    }

    #[test]
    fn rejects_malformed_filter_fields_and_composite_values() {
        let bad_field = Pipeline::new().match_filter(Filter::eq("a b", "x"));
        assert!(compile("users", &bad_field).is_err());

        let composite = Pipeline::new().match_filter(Filter::eq("tags", json!(["a"])));
        assert!(compile("users", &composite).is_err());
    }

    #[test]
    fn empty_groups_are_constant() {
        let builder = documents_sql(
            &Pipeline::new()
                .match_filter(Filter::Or(vec![]))
                .match_filter(Filter::And(vec![])),
        );
        assert!(builder.sql.contains("AND 1 = 0 AND 1 = 1"));
    }
}
