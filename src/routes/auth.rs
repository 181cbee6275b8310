use crate::{
    auth::{AuthenticatedUser, LoginRequest, RegisterRequest},
    error::AppError,
    models::UserResponse,
    services::AuthService,
};
use actix_web::{post, web, HttpResponse, Responder};
use serde_json::json;

/// Register a new user
///
/// Creates an account and returns it without the password hash.
#[post("/register")]
pub async fn register(
    auth: web::Data<AuthService>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let user = auth.register(register_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(&user)))
}

/// Login user
///
/// Checks the email and password and returns a bearer token valid for 24 hours.
#[post("/login")]
pub async fn login(
    auth: web::Data<AuthService>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = auth.login(login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Logout user
///
/// Tokens are not tracked server-side; the client is expected to discard its token.
#[post("/logout")]
pub async fn logout(user: AuthenticatedUser) -> impl Responder {
    log::info!("user {} logged out", user.id);
    HttpResponse::Ok().json(json!({
        "message": "Logged out. Discard the token on the client."
    }))
}
