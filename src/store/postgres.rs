use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewTask, NewUser, Task, TaskChanges, TaskPriority, TaskStatus, User};

const TASK_COLUMNS: &str =
    "id, owner_id, title, description, status, priority, created_at, updated_at, deleted_at";

/// Postgres-backed store. Tasks are soft-deleted through `deleted_at`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id as u64,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct TaskRow {
    id: i64,
    owner_id: i64,
    title: String,
    description: String,
    status: TaskStatus,
    priority: TaskPriority,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id as u64,
            owner_id: row.owner_id as u64,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Ids above `i64::MAX` cannot exist in a `BIGSERIAL` column.
fn db_id(id: u64) -> Option<i64> {
    i64::try_from(id).ok()
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3)
             RETURNING id, username, email, password_hash, created_at",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_by_owner(&self, owner_id: u64) -> Result<Vec<Task>, AppError> {
        let Some(owner_id) = db_id(owner_id) else {
            return Ok(Vec::new());
        };
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE owner_id = $1 AND deleted_at IS NULL
             ORDER BY created_at, id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn insert(&self, task: NewTask) -> Result<Task, AppError> {
        let owner_id = db_id(task.owner_id)
            .ok_or_else(|| AppError::BadRequest("Owner id out of range".into()))?;
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "INSERT INTO tasks (owner_id, title, description, status, priority)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.priority)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find(&self, owner_id: u64, id: u64) -> Result<Option<Task>, AppError> {
        let (Some(owner_id), Some(id)) = (db_id(owner_id), db_id(id)) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Task::from))
    }

    async fn update(
        &self,
        owner_id: u64,
        id: u64,
        changes: TaskChanges,
    ) -> Result<Option<Task>, AppError> {
        let (Some(owner_id), Some(id)) = (db_id(owner_id), db_id(id)) else {
            return Ok(None);
        };
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "UPDATE tasks SET
                 title = COALESCE($3, title),
                 description = COALESCE($4, description),
                 status = COALESCE($5, status),
                 priority = COALESCE($6, priority),
                 updated_at = now()
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.status)
        .bind(changes.priority)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Task::from))
    }

    async fn delete(&self, owner_id: u64, id: u64) -> Result<bool, AppError> {
        let (Some(owner_id), Some(id)) = (db_id(owner_id), db_id(id)) else {
            return Ok(false);
        };
        let result = sqlx::query(
            "UPDATE tasks SET deleted_at = now()
             WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
