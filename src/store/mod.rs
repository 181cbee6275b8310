//! Storage backends.
//!
//! Services only see the `UserStore` and `TaskStore` traits. Which backend sits
//! behind them is decided once by [`connect`] at startup.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskChanges, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Holds user records. Usernames and emails are unique (exact match).
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persists a user, failing with `AppError::Conflict` on a duplicate username or email.
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

/// Holds task records. Every lookup is scoped by owner and skips deleted tasks.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks owned by `owner_id`, oldest first.
    async fn list_by_owner(&self, owner_id: u64) -> Result<Vec<Task>, AppError>;

    async fn insert(&self, task: NewTask) -> Result<Task, AppError>;

    async fn find(&self, owner_id: u64, id: u64) -> Result<Option<Task>, AppError>;

    /// Applies `changes` and returns the updated task, or `None` if no live task
    /// with this id belongs to `owner_id`.
    async fn update(
        &self,
        owner_id: u64,
        id: u64,
        changes: TaskChanges,
    ) -> Result<Option<Task>, AppError>;

    /// Removes the task. Returns whether a task was affected.
    async fn delete(&self, owner_id: u64, id: u64) -> Result<bool, AppError>;
}

/// Which backend is serving requests. Reported by `/health` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Postgres,
    Memory,
}

/// The stores selected at startup.
#[derive(Clone)]
pub struct Backend {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub kind: StorageKind,
}

impl Backend {
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            tasks: store,
            kind: StorageKind::Memory,
        }
    }

    pub fn postgres(store: PgStore) -> Self {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            tasks: store,
            kind: StorageKind::Postgres,
        }
    }
}

/// Connects to Postgres and runs migrations. If the database cannot be reached,
/// falls back to an in-memory store seeded with the sample public tasks.
pub async fn connect(config: &Config) -> Result<Backend, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.database_connect_timeout)
        .connect_with(config.database.clone())
        .await;

    match pool {
        Ok(pool) => {
            sqlx::migrate!("./migrations").run(&pool).await?;
            log::info!("Connected to Postgres, migrations applied");
            Ok(Backend::postgres(PgStore::new(pool)))
        }
        Err(e) => {
            log::warn!(
                "Database at {}:{} unreachable ({}), running with in-memory storage",
                config.database.get_host(),
                config.database.get_port(),
                e
            );
            Ok(Backend::memory(MemoryStore::with_public_samples()))
        }
    }
}
