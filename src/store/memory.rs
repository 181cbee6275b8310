use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{
    NewTask, NewUser, Task, TaskChanges, TaskPriority, TaskStatus, User, PUBLIC_OWNER_ID,
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    tasks: Vec<Task>,
    last_user_id: u64,
    last_task_id: u64,
}

/// In-process store used when no database is reachable.
///
/// A single lock guards both collections, so a uniqueness check and the insert
/// that follows it cannot interleave with another writer.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the two sample public tasks shown to anonymous visitors.
    pub fn with_public_samples() -> Self {
        let now = Utc::now();
        let samples = [
            ("Sample task 1", "This is a public task."),
            ("Sample task 2", "Anyone can see this one."),
        ];
        let tasks: Vec<Task> = samples
            .iter()
            .zip(1u64..)
            .map(|((title, description), id)| Task {
                id,
                owner_id: PUBLIC_OWNER_ID,
                title: title.to_string(),
                description: description.to_string(),
                status: TaskStatus::default(),
                priority: TaskPriority::default(),
                created_at: now,
                updated_at: now,
                deleted_at: None,
            })
            .collect();

        Self {
            state: RwLock::new(State {
                last_task_id: tasks.len() as u64,
                tasks,
                ..State::default()
            }),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        let taken = state
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email);
        if taken {
            return Err(AppError::Conflict(
                "Username or email already registered".into(),
            ));
        }

        state.last_user_id += 1;
        let user = User {
            id: state.last_user_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_by_owner(&self, owner_id: u64) -> Result<Vec<Task>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, task: NewTask) -> Result<Task, AppError> {
        let mut state = self.state.write().await;
        state.last_task_id += 1;
        let now = Utc::now();
        let task = Task {
            id: state.last_task_id,
            owner_id: task.owner_id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn find(&self, owner_id: u64, id: u64) -> Result<Option<Task>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .tasks
            .iter()
            .find(|t| t.id == id && t.owner_id == owner_id)
            .cloned())
    }

    async fn update(
        &self,
        owner_id: u64,
        id: u64,
        changes: TaskChanges,
    ) -> Result<Option<Task>, AppError> {
        let mut state = self.state.write().await;
        let task = state
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.owner_id == owner_id);
        Ok(task.map(|task| {
            task.apply(&changes, Utc::now());
            task.clone()
        }))
    }

    async fn delete(&self, owner_id: u64, id: u64) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.tasks.len();
        state
            .tasks
            .retain(|t| !(t.id == id && t.owner_id == owner_id));
        Ok(state.tasks.len() < before)
    }
}
