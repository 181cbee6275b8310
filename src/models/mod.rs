pub mod task;
pub mod user;

pub use task::{
    CreateTaskRequest, NewTask, Task, TaskChanges, TaskPriority, TaskStatus, UpdateTaskRequest,
    PUBLIC_OWNER_ID,
};
pub use user::{NewUser, User, UserResponse};
