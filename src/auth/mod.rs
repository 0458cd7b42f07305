/*!
 * # Authentication and Authorization
 *
 * Bearer-token authentication for the portal. Users register or log in with
 * an email and password, receive an HS256 JWT, and present it on every
 * business route. Route groups are guarded by `resource:action` permissions;
 * the `admin` role bypasses permission checks.
 */

use crate::{
    config::AppConfig,
    db::DbPool,
    entities::user::{self, UserRole},
    errors::ServiceError,
    events::{Event, EventSender},
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

mod permissions;

pub use permissions::*;

/// Claims carried by every access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub nbf: i64,
    pub iss: String,
    pub aud: String,
}

/// Authenticated caller extracted from a validated token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub token_id: String,
    pub expires_at: i64,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role("admin")
    }

    pub fn user_uuid(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.user_id).map_err(|_| AuthError::InvalidToken)
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            roles: claims.roles,
            permissions: claims.permissions,
            token_id: claims.jti,
            expires_at: claims.exp,
        }
    }
}

/// Token signing configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub jwt_issuer: String,
    pub access_token_expiration: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        jwt_audience: String,
        jwt_issuer: String,
        access_token_expiration: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            jwt_audience,
            jwt_issuer,
            access_token_expiration,
        }
    }
}

impl From<&AppConfig> for AuthConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self::new(
            cfg.jwt_secret.clone(),
            cfg.jwt_audience.clone(),
            cfg.jwt_issuer.clone(),
            Duration::from_secs(cfg.jwt_expiration as u64),
        )
    }
}

#[derive(Clone, Debug)]
struct RevokedToken {
    jti: String,
    expiry: DateTime<Utc>,
}

/// Registration payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Public view of a user account
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            role: model.role,
            is_active: model.is_active,
            created_at: model.created_at,
            last_login_at: model.last_login_at,
        }
    }
}

/// Issued access token together with the account it belongs to
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserProfile,
}

/// Issues and validates tokens and manages user accounts
#[derive(Clone)]
pub struct AuthService {
    pub config: AuthConfig,
    db: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    revoked_tokens: Arc<RwLock<Vec<RevokedToken>>>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            config,
            db,
            event_sender,
            revoked_tokens: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Creates an account and signs the caller in. The first account becomes admin.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;
        let user = self
            .create_user(&request.name, &request.email, &request.password, None)
            .await?;
        let token = self.issue_token(&user)?;
        Ok(token)
    }

    /// Inserts a user. Without an explicit role the first account is admin and later ones are users.
    #[instrument(skip(self, password))]
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: Option<UserRole>,
    ) -> Result<user::Model, ServiceError> {
        let email = normalize_email(email);
        let db = &*self.db;
        let txn = db.begin().await.map_err(ServiceError::db_error)?;

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "A user with email {} already exists",
                email
            )));
        }

        let role = match role {
            Some(role) => role,
            None => {
                let count = user::Entity::find()
                    .count(&txn)
                    .await
                    .map_err(ServiceError::db_error)?;
                if count == 0 {
                    UserRole::Admin
                } else {
                    UserRole::User
                }
            }
        };

        let model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.trim().to_string()),
            email: Set(email),
            password_hash: Set(hash_password(password)?),
            role: Set(role),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            last_login_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        txn.commit().await.map_err(ServiceError::db_error)?;

        info!(user_id = %model.id, role = %model.role, "User account created");
        if let Err(e) = self.event_sender.send(Event::UserRegistered(model.id)).await {
            warn!(error = %e, user_id = %model.id, "Failed to send user registered event");
        }

        Ok(model)
    }

    /// Verifies credentials and issues a token
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ServiceError> {
        request.validate()?;
        let db = &*self.db;
        let invalid = || ServiceError::Unauthorized("Invalid email or password".to_string());

        let account = user::Entity::find()
            .filter(user::Column::Email.eq(normalize_email(&request.email)))
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(invalid)?;

        if !verify_password(&request.password, &account.password_hash)? {
            return Err(invalid());
        }
        if !account.is_active {
            return Err(ServiceError::Unauthorized(
                "User account is inactive".to_string(),
            ));
        }

        let mut active: user::ActiveModel = account.into();
        active.last_login_at = Set(Some(Utc::now()));
        let account = active.update(db).await.map_err(ServiceError::db_error)?;

        self.issue_token(&account)
    }

    /// Builds and signs an access token for `account`
    pub fn issue_token(&self, account: &user::Model) -> Result<AuthResponse, ServiceError> {
        let now = Utc::now();
        let lifetime = ChronoDuration::from_std(self.config.access_token_expiration)
            .map_err(|_| ServiceError::InternalError("Invalid token duration".to_string()))?;

        let permissions = match account.role {
            UserRole::Admin => admin_role_permissions(),
            UserRole::User => user_role_permissions(),
        };

        let claims = Claims {
            sub: account.id.to_string(),
            name: Some(account.name.clone()),
            email: Some(account.email.clone()),
            roles: vec![account.role.to_string()],
            permissions,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            nbf: now.timestamp(),
            iss: self.config.jwt_issuer.clone(),
            aud: self.config.jwt_audience.clone(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::JwtError(e.to_string()))?;

        Ok(AuthResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: lifetime.num_seconds(),
            user: UserProfile::from(account.clone()),
        })
    }

    /// Decodes a token, checking signature, expiry, issuer, audience and revocation
    pub async fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[self.config.jwt_audience.as_str()]);
        validation.set_issuer(&[self.config.jwt_issuer.as_str()]);
        validation.validate_nbf = true;

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?
        .claims;

        if self.is_token_revoked(&claims.jti).await {
            return Err(AuthError::RevokedToken);
        }

        Ok(claims)
    }

    /// Adds the caller's token id to the deny list until it would have expired anyway
    pub async fn logout(&self, caller: &AuthUser) {
        let expiry =
            DateTime::<Utc>::from_timestamp(caller.expires_at, 0).unwrap_or_else(Utc::now);
        let mut revoked = self.revoked_tokens.write().await;
        let now = Utc::now();
        revoked.retain(|t| t.expiry > now);
        revoked.push(RevokedToken {
            jti: caller.token_id.clone(),
            expiry,
        });
        info!(user_id = %caller.user_id, "Token revoked");
    }

    async fn is_token_revoked(&self, token_id: &str) -> bool {
        let revoked = self.revoked_tokens.read().await;
        revoked.iter().any(|t| t.jti == token_id)
    }

    /// Current account of an authenticated caller
    pub async fn me(&self, caller: &AuthUser) -> Result<UserProfile, ServiceError> {
        let id = caller
            .user_uuid()
            .map_err(|_| ServiceError::Unauthorized("Invalid token subject".to_string()))?;
        let account = user::Entity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::not_found("User", id))?;
        Ok(account.into())
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, ServiceError> {
        let users = user::Entity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::HashError(e.to_string()))
}

pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, ServiceError> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Rejections raised by the authentication layer
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authentication")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has been revoked")]
    RevokedToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Self::MissingAuth => (StatusCode::UNAUTHORIZED, "AUTH_MISSING"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "AUTH_INVALID_TOKEN"),
            Self::TokenExpired => (StatusCode::UNAUTHORIZED, "AUTH_TOKEN_EXPIRED"),
            Self::RevokedToken => (StatusCode::UNAUTHORIZED, "AUTH_REVOKED_TOKEN"),
            Self::InsufficientPermissions => {
                (StatusCode::FORBIDDEN, "AUTH_INSUFFICIENT_PERMISSIONS")
            }
            Self::InternalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "AUTH_INTERNAL_ERROR"),
        };

        let message = match &self {
            Self::InternalError(_) => "Authentication unavailable".to_string(),
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AuthError::MissingAuth)
    }
}

/// Rejects callers lacking `required_permission`; admins always pass
pub async fn permission_middleware(
    State(required_permission): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if user.is_admin() || user.has_permission(&required_permission) {
        Ok(next.run(request).await)
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}

/// Rejects callers lacking `required_role`
pub async fn role_middleware(
    State(required_role): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AuthError::MissingAuth)?;

    if user.has_role(&required_role) {
        Ok(next.run(request).await)
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}

/// Validates the bearer token and stores the [`AuthUser`] in request extensions
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return AuthError::InternalError("auth service missing from extensions".into())
                .into_response()
        }
    };

    match extract_bearer_user(request.headers(), &auth_service).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn extract_bearer_user(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingAuth)?;

    let claims = auth_service.validate_token(token).await?;
    Ok(AuthUser::from(claims))
}

/// Router helpers that attach the auth guards
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_permission(self, permission: &str) -> Self;
    fn with_role(self, role: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_permission(self, permission: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            permission.to_string(),
            permission_middleware,
        ))
        .with_auth()
    }

    fn with_role(self, role: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            role.to_string(),
            role_middleware,
        ))
        .with_auth()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    async fn service() -> AuthService {
        let db = crate::db::establish_connection("sqlite::memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        let (tx, _rx) = mpsc::channel(16);
        AuthService::new(
            AuthConfig::new(
                "unit_test_signing_secret_for_scm_hub_tokens".into(),
                "scm-hub-portal".into(),
                "scm-hub".into(),
                Duration::from_secs(600),
            ),
            Arc::new(db),
            Arc::new(EventSender::new(tx)),
        )
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[tokio::test]
    async fn first_user_is_admin_and_second_is_user() {
        let auth = service().await;
        let first = auth
            .create_user("Asha", "asha@example.com", "pw-one", None)
            .await
            .unwrap();
        let second = auth
            .create_user("Ravi", "ravi@example.com", "pw-two", None)
            .await
            .unwrap();
        assert_eq!(first.role, UserRole::Admin);
        assert_eq!(second.role, UserRole::User);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let auth = service().await;
        auth.create_user("Asha", "asha@example.com", "pw", None)
            .await
            .unwrap();
        let err = auth
            .create_user("Asha Again", "ASHA@example.com", "pw", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn issued_token_validates_until_logout() {
        let auth = service().await;
        auth.create_user("Asha", "asha@example.com", "pw", None)
            .await
            .unwrap();
        let response = auth
            .login(LoginRequest {
                email: "asha@example.com".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();

        let claims = auth.validate_token(&response.access_token).await.unwrap();
        assert_eq!(claims.roles, vec!["admin".to_string()]);

        auth.logout(&AuthUser::from(claims)).await;
        assert!(matches!(
            auth.validate_token(&response.access_token).await,
            Err(AuthError::RevokedToken)
        ));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let auth = service().await;
        auth.create_user("Asha", "asha@example.com", "pw", None)
            .await
            .unwrap();
        let err = auth
            .login(LoginRequest {
                email: "asha@example.com".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }
}
