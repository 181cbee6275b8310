//! Shared application state.
//!
//! Built once at startup from the selected [`Backend`]; every worker clones it.

use actix_web::web;

use crate::auth::AuthMiddleware;
use crate::routes;
use crate::services::{AuthService, TaskService};
use crate::store::{Backend, StorageKind};

#[derive(Clone)]
pub struct AppState {
    pub auth: web::Data<AuthService>,
    pub tasks: web::Data<TaskService>,
    pub storage: web::Data<StorageKind>,
}

impl AppState {
    pub fn new(backend: &Backend, jwt_secret: &str, bcrypt_cost: u32) -> Self {
        Self {
            auth: web::Data::new(AuthService::new(
                backend.users.clone(),
                jwt_secret,
                bcrypt_cost,
            )),
            tasks: web::Data::new(TaskService::new(backend.tasks.clone())),
            storage: web::Data::new(backend.kind),
        }
    }

    /// Registers the services and every route on `cfg`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.auth.clone())
            .app_data(self.tasks.clone())
            .app_data(self.storage.clone());
        routes::config(cfg);
    }

    /// Middleware verifying bearer tokens through this state's `AuthService`.
    pub fn auth_middleware(&self) -> AuthMiddleware {
        AuthMiddleware::new(self.auth.clone())
    }
}
