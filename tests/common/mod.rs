#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::{to_bytes, MessageBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{header, StatusCode};
use actix_web::{test, App};
use serde_json::{json, Value};
use tasktracker::config::MIN_BCRYPT_COST;
use tasktracker::store::{Backend, MemoryStore};
use tasktracker::AppState;

pub const SECRET: &str = "integration-test-secret";

/// Application state over a fresh in-memory store holding the two sample public tasks.
pub fn memory_state() -> AppState {
    let backend = Backend::memory(MemoryStore::with_public_samples());
    AppState::new(&backend, SECRET, MIN_BCRYPT_COST)
}

pub async fn init_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .wrap(state.auth_middleware())
            .configure(move |cfg| state.configure(cfg)),
    )
    .await
}

pub struct TestUser {
    pub id: u64,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {}", self.token))
    }
}

/// Sends a request and returns the status with the body parsed as JSON
/// (`Value::Null` for an empty body).
///
/// Errors raised by middleware are rendered the way the server would render them.
pub async fn send<S, B>(app: &S, req: Request) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let (status, body) = match test::try_call_service(app, req).await {
        Ok(resp) => (resp.status(), test::read_body(resp).await),
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let body = to_bytes(resp.into_body())
                .await
                .expect("readable error body");
            (status, body)
        }
    };
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|_| {
            panic!("non-JSON body: {:?}", String::from_utf8_lossy(&body))
        })
    };
    (status, json)
}

pub async fn register_and_login<S, B>(
    app: &S,
    username: &str,
    email: &str,
    password: &str,
) -> TestUser
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "username": username, "email": email, "password": password }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);

    TestUser {
        id: body["user"]["id"].as_u64().expect("user id in login response"),
        token: body["token"]
            .as_str()
            .expect("token in login response")
            .to_string(),
    }
}
