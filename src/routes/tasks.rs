use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    models::{CreateTaskRequest, UpdateTaskRequest},
    services::TaskService,
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

/// Lists public tasks (tasks with no owner). No authentication required.
#[get("/public")]
pub async fn list_public_tasks(
    tasks: web::Data<TaskService>,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(tasks.list_public().await?))
}

/// Retrieves the authenticated user's tasks, oldest first.
///
/// ## Responses:
/// - `200 OK`: JSON array of `Task` objects.
/// - `401 Unauthorized`: missing or invalid bearer token.
#[get("")]
pub async fn get_tasks(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(tasks.list_mine(user.id).await?))
}

/// Creates a new task for the authenticated user.
///
/// The owner is always the caller; any owner field in the body is ignored.
///
/// ## Request Body:
/// - `title`: required, non-blank.
/// - `description` (optional).
/// - `status` (optional): `pending` (default), `in_progress` or `completed`.
/// - `priority` (optional): `low`, `medium` (default) or `high`.
///
/// ## Responses:
/// - `201 Created`: the new `Task`.
/// - `400 Bad Request`: missing title or malformed body.
#[post("")]
pub async fn create_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_data: web::Json<CreateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = tasks.create(user.id, task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves one of the caller's tasks.
///
/// ## Responses:
/// - `200 OK`: the `Task`.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[get("/{id}")]
pub async fn get_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let task = tasks.get(user.id, task_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates one of the caller's tasks.
///
/// Only fields present and non-empty in the body are changed.
///
/// ## Responses:
/// - `200 OK`: the updated `Task`.
/// - `400 Bad Request`: no field supplied.
/// - `404 Not Found`: no such task, or it belongs to someone else.
#[put("/{id}")]
pub async fn update_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<u64>,
    task_data: web::Json<UpdateTaskRequest>,
) -> Result<impl Responder, AppError> {
    let task = tasks
        .update(user.id, task_id.into_inner(), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Deletes one of the caller's tasks.
///
/// ## Responses:
/// - `204 No Content`: deleted.
/// - `404 Not Found`: no such task, already deleted, or it belongs to someone else.
#[delete("/{id}")]
pub async fn delete_task(
    tasks: web::Data<TaskService>,
    user: AuthenticatedUser,
    task_id: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    tasks.delete(user.id, task_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
