use std::sync::Arc;

use crate::error::AppError;
use crate::models::{
    CreateTaskRequest, NewTask, Task, TaskChanges, UpdateTaskRequest, PUBLIC_OWNER_ID,
};
use crate::store::TaskStore;

pub const TASK_NOT_FOUND: &str = "Task not found or access denied";
pub const MISSING_TITLE: &str = "Title is required";
pub const NO_FIELDS_PROVIDED: &str =
    "At least one of title, description, status or priority must be provided";

/// Ownership rules for tasks.
///
/// A missing task and someone else's task produce the same `NotFound`.
pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }

    pub async fn list_public(&self) -> Result<Vec<Task>, AppError> {
        self.tasks.list_by_owner(PUBLIC_OWNER_ID).await
    }

    pub async fn list_mine(&self, caller_id: u64) -> Result<Vec<Task>, AppError> {
        self.tasks.list_by_owner(caller_id).await
    }

    /// Creates a task owned by `caller_id`. Status and priority fall back to
    /// their defaults when omitted.
    pub async fn create(
        &self,
        caller_id: u64,
        request: CreateTaskRequest,
    ) -> Result<Task, AppError> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(AppError::BadRequest(MISSING_TITLE.into()));
        }

        self.tasks
            .insert(NewTask {
                owner_id: caller_id,
                title: title.to_string(),
                description: request.description.unwrap_or_default(),
                status: request.status.unwrap_or_default(),
                priority: request.priority.unwrap_or_default(),
            })
            .await
    }

    pub async fn get(&self, caller_id: u64, task_id: u64) -> Result<Task, AppError> {
        self.tasks
            .find(caller_id, task_id)
            .await?
            .ok_or_else(not_found)
    }

    /// Merges the non-empty fields of `request` into the caller's task.
    pub async fn update(
        &self,
        caller_id: u64,
        task_id: u64,
        request: UpdateTaskRequest,
    ) -> Result<Task, AppError> {
        let changes = TaskChanges::from(request);
        if changes.is_empty() {
            return Err(AppError::BadRequest(NO_FIELDS_PROVIDED.into()));
        }

        self.tasks
            .update(caller_id, task_id, changes)
            .await?
            .ok_or_else(not_found)
    }

    pub async fn delete(&self, caller_id: u64, task_id: u64) -> Result<(), AppError> {
        if self.tasks.delete(caller_id, task_id).await? {
            Ok(())
        } else {
            Err(not_found())
        }
    }
}

fn not_found() -> AppError {
    AppError::NotFound(TASK_NOT_FOUND.into())
}
