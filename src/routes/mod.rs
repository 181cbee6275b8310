pub mod auth;
pub mod health;
pub mod tasks;

use actix_web::web;

use crate::error::AppError;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(
            web::scope("/tasks")
                // `/public` must be registered before `/{id}`.
                .service(tasks::list_public_tasks)
                .service(tasks::get_tasks)
                .service(tasks::create_task)
                .service(tasks::get_task)
                .service(tasks::update_task)
                .service(tasks::delete_task),
        );
}

/// Malformed JSON bodies become a 400 with the usual error shape.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
    })
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::BadRequest("Invalid task id".into()).into())
}
