//! Business rules sitting between the HTTP handlers and the stores.

pub mod auth;
pub mod tasks;

pub use auth::{AuthService, Session};
pub use tasks::TaskService;
