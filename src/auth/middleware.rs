use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    web, Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use crate::auth::token::bearer_token;
use crate::error::AppError;
use crate::services::AuthService;

/// Routes reachable without a bearer token.
const PUBLIC_ROUTES: &[(&str, &str)] = &[
    ("POST", "/register"),
    ("POST", "/login"),
    ("GET", "/tasks/public"),
    ("GET", "/health"),
];

fn is_public(method: &Method, path: &str) -> bool {
    let path = path.trim_end_matches('/');
    PUBLIC_ROUTES
        .iter()
        .any(|(m, p)| method.as_str() == *m && path == *p)
}

/// Verifies the bearer token on every non-public route and stores the
/// decoded `Claims` in the request extensions.
pub struct AuthMiddleware {
    auth: web::Data<AuthService>,
}

impl AuthMiddleware {
    pub fn new(auth: web::Data<AuthService>) -> Self {
        Self { auth }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            auth: self.auth.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    auth: web::Data<AuthService>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // CORS preflight carries no credentials.
        if req.method() == Method::OPTIONS || is_public(req.method(), req.path()) {
            return Box::pin(self.service.call(req));
        }

        let verified = bearer_token(req.headers().get(header::AUTHORIZATION))
            .and_then(|token| self.auth.verify(token));

        match verified {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                Box::pin(self.service.call(req))
            }
            Err(token_err) => {
                log::debug!("rejected {} {}: {}", req.method(), req.path(), token_err);
                let app_err = AppError::from(token_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}
