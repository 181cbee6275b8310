//! Store tests against a live Postgres. Run with `cargo test -- --ignored`
//! and `DATABASE_URL` pointing at a scratch database.

use chrono::Utc;
use dotenv::dotenv;
use pretty_assertions::assert_eq;
use sqlx::PgPool;
use tasktracker::error::AppError;
use tasktracker::models::{NewTask, NewUser, TaskChanges, TaskPriority, TaskStatus};
use tasktracker::store::{PgStore, TaskStore, UserStore};

async fn store() -> PgStore {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    PgStore::new(pool)
}

/// Suffix keeping usernames and emails unique across runs.
fn unique() -> String {
    Utc::now().timestamp_nanos_opt().unwrap_or_default().to_string()
}

async fn new_user(store: &PgStore, name: &str) -> u64 {
    let suffix = unique();
    UserStore::insert(
        store,
        NewUser {
            username: format!("{}_{}", name, suffix),
            email: format!("{}_{}@example.com", name, suffix),
            password_hash: "not-a-real-hash".to_string(),
        },
    )
    .await
    .expect("Failed to insert user")
    .id
}

fn task_for(owner_id: u64, title: &str) -> NewTask {
    NewTask {
        owner_id,
        title: title.to_string(),
        description: String::new(),
        status: TaskStatus::default(),
        priority: TaskPriority::default(),
    }
}

#[actix_rt::test]
#[ignore]
async fn test_duplicate_user_is_conflict() {
    let store = store().await;
    let suffix = unique();
    let user = NewUser {
        username: format!("dup_{}", suffix),
        email: format!("dup_{}@example.com", suffix),
        password_hash: "hash".to_string(),
    };

    let first = UserStore::insert(&store, user.clone()).await.unwrap();
    let found = store.find_by_email(&user.email).await.unwrap().unwrap();
    assert_eq!(found.id, first.id);

    let same_email = NewUser {
        username: format!("dup2_{}", suffix),
        ..user.clone()
    };
    match UserStore::insert(&store, same_email).await {
        Err(AppError::Conflict(_)) => {}
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[actix_rt::test]
#[ignore]
async fn test_update_keeps_unset_columns() {
    let store = store().await;
    let owner = new_user(&store, "updater").await;
    let task = TaskStore::insert(
        &store,
        NewTask {
            description: "2 litres".to_string(),
            ..task_for(owner, "Buy milk")
        },
    )
    .await
    .unwrap();

    let updated = store
        .update(
            owner,
            task.id,
            TaskChanges {
                status: Some(TaskStatus::Completed),
                ..TaskChanges::default()
            },
        )
        .await
        .unwrap()
        .expect("task exists");

    assert_eq!(updated.status, TaskStatus::Completed);
    assert_eq!(updated.title, "Buy milk");
    assert_eq!(updated.description, "2 litres");
    assert_eq!(updated.priority, TaskPriority::Medium);
    assert!(updated.updated_at >= task.updated_at);

    let stranger = new_user(&store, "stranger").await;
    let hijack = TaskChanges {
        title: Some("mine now".to_string()),
        ..TaskChanges::default()
    };
    assert!(store.update(stranger, task.id, hijack).await.unwrap().is_none());
}

#[actix_rt::test]
#[ignore]
async fn test_delete_is_soft() {
    let store = store().await;
    let owner = new_user(&store, "deleter").await;
    let task = TaskStore::insert(&store, task_for(owner, "Temporary"))
        .await
        .unwrap();

    assert!(store.delete(owner, task.id).await.unwrap());
    assert!(!store.delete(owner, task.id).await.unwrap());
    assert!(store.find(owner, task.id).await.unwrap().is_none());
    assert!(store
        .list_by_owner(owner)
        .await
        .unwrap()
        .iter()
        .all(|t| t.id != task.id));

    let deleted_at: Option<chrono::DateTime<Utc>> =
        sqlx::query_scalar("SELECT deleted_at FROM tasks WHERE id = $1")
            .bind(task.id as i64)
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert!(deleted_at.is_some());
}

#[actix_rt::test]
#[ignore]
async fn test_public_tasks_have_no_owner() {
    let store = store().await;
    let owner = new_user(&store, "lister").await;
    TaskStore::insert(&store, task_for(owner, "private")).await.unwrap();
    let public = TaskStore::insert(&store, task_for(0, "shared")).await.unwrap();

    let listed = store.list_by_owner(0).await.unwrap();
    assert!(listed.iter().any(|t| t.id == public.id));
    assert!(listed.iter().all(|t| t.is_public()));

    let mine = store.list_by_owner(owner).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].title, "private");
}
