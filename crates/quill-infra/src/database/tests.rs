use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use quill_core::RepoError;
use quill_core::domain::{NewComment, PostDraft, PostPatch};
use quill_core::ports::ContentStore;

use super::PostgresContentStore;
use super::entity::{like, post};

fn post_model(slug: &str, published: bool) -> post::Model {
    let now = Utc::now();
    post::Model {
        id: Uuid::new_v4(),
        title: "Hello".to_owned(),
        content: "Body".to_owned(),
        excerpt: "Summary".to_owned(),
        slug: slug.to_owned(),
        cover_image: None,
        tags: serde_json::json!(["rust", "blog"]),
        published,
        publish_at: None,
        created_at: now.into(),
        updated_at: now.into(),
        likes: 3,
        views: 10,
        allow_comments: true,
        author: "Admin".to_owned(),
        location: None,
    }
}

fn count_row(count: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(count)))])
}

fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

#[tokio::test]
async fn test_list_published_maps_models() {
    let model = post_model("hello", true);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()]])
        .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
        .into_connection();

    let store = PostgresContentStore::new(db);
    let posts = store.list_published().await.unwrap();

    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, model.id);
    assert_eq!(posts[0].tags, vec!["rust".to_string(), "blog".to_string()]);
    assert_eq!(posts[0].comment_count, 0);
}

#[tokio::test]
async fn test_get_by_slug_missing_is_none() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let store = PostgresContentStore::new(db);
    assert!(store.get_by_slug("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn test_get_by_slug_fills_comment_count() {
    let model = post_model("hello", true);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model.clone()]])
        .append_query_results([vec![count_row(2)]])
        .into_connection();

    let store = PostgresContentStore::new(db);
    let post = store.get_by_slug("hello").await.unwrap().unwrap();

    assert_eq!(post.id, model.id);
    assert_eq!(post.comment_count, 2);
}

#[tokio::test]
async fn test_create_duplicate_slug_is_constraint() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom(
            "duplicate key value violates unique constraint \"posts_slug_key\"".to_owned(),
        )])
        .into_connection();

    let store = PostgresContentStore::new(db);
    let draft = PostDraft::new("Hello", "Body", "Summary")
        .prepare()
        .unwrap();

    let result = store.create(draft).await;
    assert!(matches!(result, Err(RepoError::Constraint(_))));
}

#[tokio::test]
async fn test_update_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let store = PostgresContentStore::new(db);
    let result = store.update(Uuid::new_v4(), PostPatch::publish(true)).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_toggle_like_inserts_when_absent() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<like::Model>::new()])
        .append_exec_results([exec(1), exec(1)])
        .into_connection();

    let store = PostgresContentStore::new(db);
    assert!(store.toggle_like(Uuid::new_v4(), "visitor").await.unwrap());
}

#[tokio::test]
async fn test_toggle_like_removes_when_present() {
    let post_id = Uuid::new_v4();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![like::Model {
            post_id,
            identity: "visitor".to_owned(),
            created_at: Utc::now().into(),
        }]])
        .append_exec_results([exec(1), exec(1)])
        .into_connection();

    let store = PostgresContentStore::new(db);
    assert!(!store.toggle_like(post_id, "visitor").await.unwrap());
}

#[tokio::test]
async fn test_toggle_like_on_missing_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<like::Model>::new()])
        .append_exec_results([exec(0)])
        .into_connection();

    let store = PostgresContentStore::new(db);
    let result = store.toggle_like(Uuid::new_v4(), "visitor").await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_delete_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([exec(0)])
        .into_connection();

    let store = PostgresContentStore::new(db);
    assert!(matches!(
        store.delete(Uuid::new_v4()).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
async fn test_comment_on_missing_post_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let store = PostgresContentStore::new(db);
    let result = store
        .create_comment(NewComment::new(Uuid::new_v4(), "Reader", "Nice"))
        .await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_increment_views_swallows_errors() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_errors([DbErr::Custom("connection reset".to_owned())])
        .into_connection();

    let store = PostgresContentStore::new(db);
    store.increment_views(Uuid::new_v4()).await;
}

#[test]
fn test_scheduled_model_maps_publish_at() {
    let mut model = post_model("later", true);
    let at = Utc::now() + Duration::hours(1);
    model.publish_at = Some(at.into());

    let post: quill_core::domain::Post = model.into();
    assert_eq!(post.publish_at.map(|t| t.timestamp()), Some(at.timestamp()));
    assert!(!post.is_live());
}
