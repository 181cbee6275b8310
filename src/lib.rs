#![doc = "The `tasktracker` library crate."]
#![doc = ""]
#![doc = "Domain models, credential and task stores, the auth and task services,"]
#![doc = "and the actix-web routes of the task tracker. The binary (`main.rs`)"]
#![doc = "loads the configuration, selects a storage backend and serves the app."]

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use crate::app::AppState;
pub use crate::error::AppError;
