use chrono::Utc;
use dashboard_admin::domain::types::{FullName, RecordId, UserEmail};
use dashboard_admin::domain::user::{USERS_COLLECTION, UpdateUser};
use dashboard_admin::list::{
    Aggregate, Filter, ListDefaults, ListQuery, Pipeline, SortOrder, run_paginated_aggregation,
};
use dashboard_admin::models::document::NewDocument;
use dashboard_admin::repository::errors::RepositoryError;
use dashboard_admin::repository::{UserReader, UserWriter};
use dashboard_admin::services::users::list_users;
use diesel::RunQueryDsl;
use serde_json::Value;

mod common;

fn names(rows: &[Value]) -> Vec<&str> {
    rows.iter()
        .map(|row| row["fullname"].as_str().unwrap())
        .collect()
}

fn query(page: usize, limit: usize, sort_field: &str, sort_order: SortOrder) -> ListQuery {
    ListQuery {
        page,
        limit,
        sort_field: sort_field.to_string(),
        sort_order,
        search: String::new(),
    }
}

#[test]
fn test_user_crud() {
    let test_db = common::TestDb::new("test_user_crud.db");
    let repo = test_db.repo();

    let creator = RecordId::generate();
    let alice = repo
        .create_user(&common::new_user("Alice", "alice@example.com", Some(creator)))
        .unwrap();
    assert!(alice.is_active);
    assert_eq!(alice.created_by, Some(creator));

    let by_email = repo
        .get_user_by_email(&UserEmail::new("ALICE@example.com").unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, alice.id);

    let updated = repo
        .update_user(
            alice.id,
            &UpdateUser::new(
                FullName::new("Alicia").unwrap(),
                UserEmail::new("alicia@example.com").unwrap(),
                Some("555".to_string()),
                Some(false),
                Some(creator),
            ),
        )
        .unwrap();
    assert_eq!(updated.fullname.as_str(), "Alicia");
    assert!(!updated.is_active);
    assert_eq!(updated.created_by, Some(creator));
    assert_eq!(updated.updated_by, Some(creator));
    assert!(updated.updated_at >= alice.updated_at);

    repo.delete_user(alice.id).unwrap();
    assert!(repo.get_user_by_id(alice.id).unwrap().is_none());
    // Deleting again is not an error.
    repo.delete_user(alice.id).unwrap();
}

#[test]
fn test_update_missing_user_is_not_found() {
    let test_db = common::TestDb::new("test_update_missing_user.db");
    let repo = test_db.repo();

    let result = repo.update_user(
        RecordId::generate(),
        &UpdateUser::new(
            FullName::new("Nobody").unwrap(),
            UserEmail::new("nobody@example.com").unwrap(),
            None,
            None,
            None,
        ),
    );
    assert!(matches!(result, Err(RepositoryError::NotFound)));
}

#[test]
fn test_duplicate_email_violates_constraint() {
    let test_db = common::TestDb::new("test_duplicate_email.db");
    let repo = test_db.repo();

    repo.create_user(&common::new_user("Alice", "alice@example.com", None))
        .unwrap();
    let result = repo.create_user(&common::new_user("Other", "alice@example.com", None));
    assert!(matches!(
        result,
        Err(RepositoryError::ConstraintViolation(_))
    ));
}

#[test]
fn test_pages_partition_matches_and_total_is_stable() {
    let test_db = common::TestDb::new("test_pages_partition.db");
    let repo = test_db.repo();
    let users: Vec<(String, String)> = (0..25)
        .map(|i| (format!("User {i:02}"), format!("user{i}@example.com")))
        .collect();
    let users: Vec<(&str, &str)> = users
        .iter()
        .map(|(name, email)| (name.as_str(), email.as_str()))
        .collect();
    common::seed_users(&repo, &users);

    let base = Pipeline::new();
    let mut seen = Vec::new();
    for (page, expected_rows) in [(0, 10), (1, 10), (2, 5), (3, 0)] {
        let result = run_paginated_aggregation(
            &repo,
            USERS_COLLECTION,
            &base,
            &query(page, 10, "fullname", SortOrder::Ascending),
        )
        .unwrap();
        assert_eq!(result.data.len(), expected_rows, "page {page}");
        assert_eq!(result.total_row_count, 25, "page {page}");
        seen.extend(names(&result.data).into_iter().map(str::to_string));
    }

    let mut expected: Vec<String> = (0..25).map(|i| format!("User {i:02}")).collect();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn test_search_is_case_insensitive_substring() {
    let test_db = common::TestDb::new("test_search.db");
    let repo = test_db.repo();
    common::seed_users(
        &repo,
        &[
            ("Alice", "alice@example.com"),
            ("Bob", "bob@example.com"),
            ("Alina", "alina@example.com"),
        ],
    );

    let result = list_users(
        &repo,
        "search=ALI&sortField=fullname&sortOrder=asc",
        &ListDefaults::default(),
    )
    .unwrap();
    assert_eq!(result.total_row_count, 2);
    assert_eq!(names(&result.data), vec!["Alice", "Alina"]);
}

#[test]
fn test_search_folds_non_ascii_case() {
    let test_db = common::TestDb::new("test_search_unicode.db");
    let repo = test_db.repo();
    common::seed_users(
        &repo,
        &[
            ("Élodie", "elodie@example.com"),
            ("Zoë Ökland", "zoe@example.com"),
            ("Bob", "bob@example.com"),
        ],
    );

    let defaults = ListDefaults::default();
    // "élo"
    let lower = list_users(&repo, "search=%C3%A9lo", &defaults).unwrap();
    assert_eq!(names(&lower.data), vec!["Élodie"]);
    // "ÖKL"
    let upper = list_users(&repo, "search=%C3%96KL", &defaults).unwrap();
    assert_eq!(names(&upper.data), vec!["Zoë Ökland"]);
    // "ZOË"
    let mixed = list_users(&repo, "search=ZO%C3%8B", &defaults).unwrap();
    assert_eq!(mixed.total_row_count, 1);
}

#[test]
fn test_sort_by_fullname_both_directions() {
    let test_db = common::TestDb::new("test_sort.db");
    let repo = test_db.repo();
    common::seed_users(
        &repo,
        &[
            ("Carol", "carol@example.com"),
            ("Alice", "alice@example.com"),
            ("Bob", "bob@example.com"),
        ],
    );

    let ascending = list_users(
        &repo,
        "sortField=fullname&sortOrder=asc",
        &ListDefaults::default(),
    )
    .unwrap();
    assert_eq!(names(&ascending.data), vec!["Alice", "Bob", "Carol"]);

    let descending = list_users(
        &repo,
        "sortField=fullname&sortOrder=desc",
        &ListDefaults::default(),
    )
    .unwrap();
    assert_eq!(names(&descending.data), vec!["Carol", "Bob", "Alice"]);

    // Unknown sort orders fall back to ascending.
    let fallback = list_users(
        &repo,
        "sortField=fullname&sortOrder=sideways",
        &ListDefaults::default(),
    )
    .unwrap();
    assert_eq!(names(&fallback.data), vec!["Alice", "Bob", "Carol"]);
}

#[test]
fn test_view_type_scopes_by_owner() {
    let test_db = common::TestDb::new("test_view_type.db");
    let repo = test_db.repo();
    let owner = repo
        .create_user(&common::new_user("Owner", "owner@example.com", None))
        .unwrap();
    repo.create_user(&common::new_user("Mine", "mine@example.com", Some(owner.id)))
        .unwrap();
    repo.create_user(&common::new_user("Other", "other@example.com", None))
        .unwrap();

    let defaults = ListDefaults::default();
    let own = list_users(&repo, &format!("viewType=own&ownerId={}", owner.id), &defaults).unwrap();
    assert_eq!(names(&own.data), vec!["Mine"]);
    assert_eq!(own.total_row_count, 1);

    let own_self =
        list_users(&repo, &format!("viewType=self&ownerId={}", owner.id), &defaults).unwrap();
    assert_eq!(names(&own_self.data), vec!["Owner"]);

    let all = list_users(&repo, "viewType=all", &defaults).unwrap();
    let invalid_owner = list_users(&repo, "viewType=own&ownerId=not-an-id", &defaults).unwrap();
    assert_eq!(all.total_row_count, 3);
    assert_eq!(invalid_owner, all);
}

#[test]
fn test_super_admins_are_hidden_from_list() {
    use dashboard_admin::schema::documents;

    let test_db = common::TestDb::new("test_super_admins.db");
    let repo = test_db.repo();
    common::seed_users(&repo, &[("Alice", "alice@example.com")]);

    let now = Utc::now().naive_utc();
    let id = RecordId::generate().to_string();
    diesel::insert_into(documents::table)
        .values(&NewDocument {
            id: &id,
            collection: USERS_COLLECTION,
            body: r#"{"fullname":"Root","email":"root@example.com","isActive":true,"isSuperAdmin":true}"#,
            created_at: now,
            updated_at: now,
        })
        .execute(&mut test_db.pool().get().unwrap())
        .unwrap();

    let result = list_users(&repo, "", &ListDefaults::default()).unwrap();
    assert_eq!(result.total_row_count, 1);
    assert_eq!(names(&result.data), vec!["Alice"]);

    // Still reachable directly.
    let root = repo
        .get_user_by_id(RecordId::parse(&id).unwrap())
        .unwrap()
        .unwrap();
    assert!(root.is_super_admin);
}

#[test]
fn test_count_of_no_matches_is_empty() {
    let test_db = common::TestDb::new("test_count_empty.db");
    let repo = test_db.repo();

    let groups = repo
        .aggregate(
            USERS_COLLECTION,
            &Pipeline::new()
                .match_filter(Filter::eq("isActive", false))
                .count("n"),
        )
        .unwrap();
    assert!(groups.is_empty());
}

#[test]
fn test_out_of_order_pipeline_is_rejected() {
    let test_db = common::TestDb::new("test_out_of_order.db");
    let repo = test_db.repo();

    let result = repo.aggregate(
        USERS_COLLECTION,
        &Pipeline::new().limit(1).sort("fullname", SortOrder::Ascending),
    );
    assert!(matches!(result, Err(RepositoryError::ValidationError(_))));
}
