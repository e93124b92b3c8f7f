//! End-to-end model verbs against an in-memory SQLite database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{DateTime, TimeZone, Utc};
use minorm::{FindAll, Model, OrmError, Value};
use minorm_sqlite::{Executor, SqlitePool};
use std::sync::atomic::{AtomicI64, Ordering};

static NEXT_USER_ID: AtomicI64 = AtomicI64::new(1000);

fn next_user_id() -> i64 {
    NEXT_USER_ID.fetch_add(1, Ordering::SeqCst)
}

#[derive(Model, Debug, Clone, PartialEq)]
#[model(table = "users")]
struct User {
    #[field(primary_key, default_with = next_user_id)]
    id: Option<i64>,
    name: String,
    #[field(name = "is_admin")]
    admin: Option<bool>,
    email: Option<String>,
}

impl User {
    fn named(id: i64, name: &str) -> Self {
        Self {
            id: Some(id),
            name: name.to_string(),
            admin: None,
            email: None,
        }
    }
}

#[derive(Model, Debug)]
#[model(table = "blogs")]
struct Blog {
    #[field(primary_key, ddl = "varchar(50)")]
    id: String,
    title: String,
    #[field(text)]
    content: Option<String>,
    rating: Option<f64>,
    #[field(default_with = Utc::now)]
    created_at: Option<DateTime<Utc>>,
}

async fn setup() -> SqlitePool {
    let pool = SqlitePool::memory().await.unwrap();
    pool.execute(
        "create table `users` (`id` bigint primary key, `name` varchar(100) not null, \
         `is_admin` boolean, `email` varchar(100))",
        &[],
        true,
    )
    .await
    .unwrap();
    pool.execute(
        "create table `blogs` (`id` varchar(50) primary key, `title` varchar(100), \
         `content` text, `rating` real, `created_at` datetime)",
        &[],
        true,
    )
    .await
    .unwrap();
    pool
}

#[tokio::test]
async fn save_find_remove() {
    let pool = setup().await;

    let mut ada = User::named(1, "Ada");
    ada.save(&pool).await.unwrap();

    let found = User::find(&pool, 1i64).await.unwrap().unwrap();
    assert_eq!(found.name, "Ada");

    found.remove(&pool).await.unwrap();
    assert!(User::find(&pool, 1i64).await.unwrap().is_none());
}

#[tokio::test]
async fn save_writes_resolved_defaults() {
    let pool = setup().await;

    let mut user = User {
        id: None,
        name: "Grace".to_string(),
        admin: None,
        email: None,
    };
    user.save(&pool).await.unwrap();

    // defaults are written back onto the instance
    let id = user.id.unwrap();
    assert_eq!(user.admin, Some(false));
    assert_eq!(user.email, None);

    let found = User::find(&pool, id).await.unwrap().unwrap();
    assert_eq!(found, user);
}

#[tokio::test]
async fn update_then_find() {
    let pool = setup().await;

    let mut user = User::named(7, "Linus");
    user.save(&pool).await.unwrap();

    user.email = Some("linus@example.com".to_string());
    user.admin = Some(true);
    user.update(&pool).await.unwrap();

    let found = User::find(&pool, 7i64).await.unwrap().unwrap();
    assert_eq!(found.email.as_deref(), Some("linus@example.com"));
    assert_eq!(found.admin, Some(true));
}

#[tokio::test]
async fn update_and_remove_of_missing_row_are_not_errors() {
    let pool = setup().await;

    let ghost = User::named(404, "Ghost");
    ghost.update(&pool).await.unwrap();
    ghost.remove(&pool).await.unwrap();
}

#[tokio::test]
async fn find_all_on_empty_table() {
    let pool = setup().await;
    let users = User::find_all(&pool, FindAll::new()).await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn find_all_filters_orders_and_pages() {
    let pool = setup().await;
    for (id, name) in [(1, "a"), (2, "b"), (3, "c"), (4, "d")] {
        let mut user = User::named(id, name);
        user.admin = Some(id % 2 == 0);
        user.save(&pool).await.unwrap();
    }

    let admins = User::find_all(
        &pool,
        FindAll::new()
            .filter("`is_admin`=?", [true])
            .order_by("`id` desc"),
    )
    .await
    .unwrap();
    let ids: Vec<_> = admins.iter().map(|u| u.id.unwrap()).collect();
    assert_eq!(ids, vec![4, 2]);

    let page = User::find_all(&pool, FindAll::new().order_by("`id`").limit((1u64, 2u64)))
        .await
        .unwrap();
    let ids: Vec<_> = page.iter().map(|u| u.id.unwrap()).collect();
    assert_eq!(ids, vec![2, 3]);

    let first = User::find_all(&pool, FindAll::new().order_by("`id`").limit(1u64))
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].name, "a");
}

#[test]
fn find_all_rejects_malformed_limit() {
    let err = FindAll::new()
        .try_limit(&[Value::Int(1), Value::Int(2), Value::Int(3)])
        .unwrap_err();
    assert!(matches!(err, OrmError::InvalidLimit(_)));
}

#[tokio::test]
async fn find_number_counts_rows() {
    let pool = setup().await;
    assert_eq!(
        User::find_number(&pool, "count(`id`)", None, vec![])
            .await
            .unwrap(),
        Some(Value::Int(0))
    );

    for id in 1..=3 {
        let mut user = User::named(id, "n");
        user.admin = Some(id == 1);
        user.save(&pool).await.unwrap();
    }

    assert_eq!(
        User::find_number(&pool, "count(`id`)", None, vec![])
            .await
            .unwrap(),
        Some(Value::Int(3))
    );
    assert_eq!(
        User::find_number(&pool, "count(`id`)", Some("`is_admin`=?"), vec![true.into()])
            .await
            .unwrap(),
        Some(Value::Int(1))
    );
}

#[tokio::test]
async fn duplicate_key_is_a_constraint_violation() {
    let pool = setup().await;

    let mut first = User::named(9, "first");
    let mut second = User::named(9, "second");
    let (a, b) = tokio::join!(first.save(&pool), second.save(&pool));

    let failures = [&a, &b]
        .iter()
        .filter(|r| matches!(r, Err(OrmError::ConstraintViolation(_))))
        .count();
    assert_eq!(failures, 1);
    assert!(a.is_ok() || b.is_ok());
    assert_eq!(
        User::find_number(&pool, "count(`id`)", None, vec![])
            .await
            .unwrap(),
        Some(Value::Int(1))
    );
}

#[tokio::test]
async fn datetime_and_text_round_trip() {
    let pool = setup().await;
    let published = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();

    let mut blog = Blog {
        id: "b-1".to_string(),
        title: "Hello".to_string(),
        content: Some("A longer body".to_string()),
        rating: None,
        created_at: Some(published),
    };
    blog.save(&pool).await.unwrap();
    assert_eq!(blog.rating, Some(0.0));

    let found = Blog::find(&pool, "b-1").await.unwrap().unwrap();
    assert_eq!(found.created_at, Some(published));
    assert_eq!(found.content.as_deref(), Some("A longer body"));
    assert_eq!(found.rating, Some(0.0));
}

#[tokio::test]
async fn datetime_producer_runs_on_save() {
    let pool = setup().await;
    let before = Utc::now();

    let mut blog = Blog {
        id: "b-2".to_string(),
        title: "Now".to_string(),
        content: None,
        rating: Some(4.5),
        created_at: None,
    };
    blog.save(&pool).await.unwrap();

    let created = blog.created_at.unwrap();
    assert!(created >= before);

    let found = Blog::find(&pool, "b-2").await.unwrap().unwrap();
    assert_eq!(found.created_at, Some(created));
    assert_eq!(found.content, None);
}

#[tokio::test]
async fn rows_serialize_as_json() {
    let pool = setup().await;
    let mut user = User::named(3, "Ada");
    user.email = Some("ada@example.com".to_string());
    user.save(&pool).await.unwrap();

    let rows = pool
        .select(User::schema().find_sql(), &[Value::Int(3)], Some(1))
        .await
        .unwrap();
    let json = serde_json::to_value(&rows[0]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "id": 3,
            "name": "Ada",
            "is_admin": false,
            "email": "ada@example.com"
        })
    );
}

#[test]
fn derived_schema_statements() {
    let schema = User::schema();
    assert_eq!(User::TABLE_NAME, "users");
    assert_eq!(schema.primary_key(), "id");
    assert_eq!(
        schema.select_sql(),
        "select `id`, `name`, `is_admin`, `email` from `users`"
    );
    assert_eq!(
        schema.insert_sql(),
        "insert into `users` (`name`, `is_admin`, `email`, `id`) values (?, ?, ?, ?)"
    );
    assert_eq!(
        schema.update_sql(),
        Some("update `users` set `name`=?, `is_admin`=?, `email`=? where `id`=?")
    );
    assert_eq!(schema.delete_sql(), "delete from `users` where `id`=?");
}
