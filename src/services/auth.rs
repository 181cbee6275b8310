use actix_web::web;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;
use validator::Validate;

use crate::auth::{
    hash_password, issue_token, verify_password, verify_token, Claims, LoginRequest,
    LoginResponse, RegisterRequest, TokenError,
};
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::store::UserStore;

/// The one message for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Compared against when the email is unknown, so both failures cost one bcrypt run.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

/// A successful login: the account and the claims issued for it.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub claims: Claims,
}

/// Registration, credential checks and session tokens.
///
/// Holds no session state: a token is valid exactly when its signature checks
/// out under `secret` and it has not expired.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    secret: Arc<str>,
    bcrypt_cost: u32,
    decoy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, secret: impl Into<Arc<str>>, bcrypt_cost: u32) -> Self {
        Self {
            users,
            secret: secret.into(),
            bcrypt_cost,
            decoy_hash: OnceCell::new(),
        }
    }

    /// Creates an account. Fails with `BadRequest` on blank or invalid input and
    /// `Conflict` when the username or email is taken.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        request.validate()?;
        if request.username.trim().is_empty() || request.password.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Username, email and password are required".into(),
            ));
        }

        let cost = self.bcrypt_cost;
        let password = request.password;
        let password_hash = web::block(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))??;

        let user = self
            .users
            .insert(NewUser {
                username: request.username,
                email: request.email,
                password_hash,
            })
            .await?;

        log::info!("registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Checks an email/password pair and opens a session.
    ///
    /// An unknown email and a wrong password fail with the same error after the
    /// same amount of hashing work.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            let decoy = self.decoy_hash().await?;
            self.password_matches(password, decoy).await?;
            log::info!("login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        };

        if !self
            .password_matches(password, user.password_hash.clone())
            .await?
        {
            log::info!("login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }

        let claims = Claims::for_user(&user, Utc::now());
        Ok(Session { user, claims })
    }

    /// Authenticates and issues a signed token.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;
        let session = self
            .authenticate(&request.email, &request.password)
            .await?;

        Ok(LoginResponse {
            token: self.issue_token(&session.claims)?,
            user: (&session.user).into(),
        })
    }

    pub fn issue_token(&self, claims: &Claims) -> Result<String, AppError> {
        issue_token(claims, &self.secret)
    }

    /// Checks a bearer token against this service's secret.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        verify_token(token, &self.secret)
    }

    async fn password_matches(&self, password: &str, hash: String) -> Result<bool, AppError> {
        let password = password.to_string();
        web::block(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::InternalServerError(e.to_string()))?
    }

    /// Hash of `DECOY_PASSWORD` at the configured cost, computed on first use.
    async fn decoy_hash(&self) -> Result<String, AppError> {
        let cost = self.bcrypt_cost;
        self.decoy_hash
            .get_or_try_init(|| async move {
                match web::block(move || hash_password(DECOY_PASSWORD, cost)).await {
                    Ok(hashed) => hashed,
                    Err(e) => Err(AppError::InternalServerError(e.to_string())),
                }
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_BCRYPT_COST;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), "unit-test-secret", MIN_BCRYPT_COST)
    }

    fn register_request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_register_hashes_password() {
        let auth = service();
        let user = auth
            .register(register_request("alice", "a@example.com", "secret123"))
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "secret123");
        assert!(verify_password("secret123", &user.password_hash).unwrap());
    }

    #[actix_rt::test]
    async fn test_duplicate_registration_is_rejected() {
        let auth = service();
        let first = auth
            .register(register_request("alice", "a@example.com", "secret123"))
            .await
            .unwrap();

        let same_username = auth
            .register(register_request("alice", "x@example.com", "other"))
            .await;
        assert!(matches!(same_username, Err(AppError::Conflict(_))));

        let same_email = auth
            .register(register_request("bob", "a@example.com", "other"))
            .await;
        assert!(matches!(same_email, Err(AppError::Conflict(_))));

        // The first account still authenticates with its own password.
        let session = auth.authenticate("a@example.com", "secret123").await.unwrap();
        assert_eq!(session.claims.sub, first.id);
        assert_eq!(session.user.id, first.id);
    }

    #[actix_rt::test]
    async fn test_blank_registration_fields() {
        let auth = service();
        for request in [
            register_request("   ", "a@example.com", "secret123"),
            register_request("alice", "", "secret123"),
            register_request("alice", "a@example.com", ""),
        ] {
            let result = auth.register(request).await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
    }

    #[actix_rt::test]
    async fn test_authentication_failures_are_uniform() {
        let auth = service();
        auth.register(register_request("alice", "a@example.com", "secret123"))
            .await
            .unwrap();

        let wrong_password = auth.authenticate("a@example.com", "nope").await.unwrap_err();
        let unknown_user = auth.authenticate("z@example.com", "secret123").await.unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AppError::Unauthorized(_)));
    }

    #[actix_rt::test]
    async fn test_unknown_email_still_runs_bcrypt() {
        let auth = service();
        assert!(auth.decoy_hash.get().is_none());

        let result = auth.authenticate("nobody@example.com", "secret123").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        // The decoy was hashed at the configured cost and compared against.
        let decoy = auth.decoy_hash.get().expect("decoy hash computed");
        assert!(decoy.starts_with(&format!("$2b${:02}$", MIN_BCRYPT_COST)));
        assert!(verify_password(DECOY_PASSWORD, decoy).unwrap());

        // Computed once and reused.
        auth.authenticate("other@example.com", "secret123")
            .await
            .unwrap_err();
        assert_eq!(auth.decoy_hash.get(), Some(decoy));
    }

    #[actix_rt::test]
    async fn test_known_email_does_not_need_the_decoy() {
        let auth = service();
        auth.register(register_request("alice", "a@example.com", "secret123"))
            .await
            .unwrap();

        auth.authenticate("a@example.com", "nope").await.unwrap_err();
        assert!(auth.decoy_hash.get().is_none());
    }

    #[actix_rt::test]
    async fn test_login_token_carries_identity() {
        let auth = service();
        let user = auth
            .register(register_request("alice", "a@example.com", "secret123"))
            .await
            .unwrap();

        let response = auth
            .login(LoginRequest {
                email: "a@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        let claims = auth.verify(&response.token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(response.user.id, user.id);
        assert!(claims.expires_at() > Utc::now());
    }

    #[actix_rt::test]
    async fn test_token_from_another_secret_is_rejected() {
        let auth = service();
        let other = AuthService::new(Arc::new(MemoryStore::new()), "other-secret", MIN_BCRYPT_COST);
        let user = auth
            .register(register_request("alice", "a@example.com", "secret123"))
            .await
            .unwrap();
        let token = other
            .issue_token(&Claims::for_user(&user, Utc::now()))
            .unwrap();

        assert_eq!(auth.verify(&token), Err(TokenError::InvalidSignature));
    }
}
