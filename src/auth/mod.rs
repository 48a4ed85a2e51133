/*!
 * # Authentication and Authorization Module
 *
 * JWT-based authentication for the Imprint back-office API, with
 * role-based route gating via [`AuthRouterExt`]. Passwords are stored as
 * argon2 hashes; tokens carry the actor's role and, for school actors,
 * their school id.
 */

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::db::DbPool;
use crate::entities::user;
use crate::errors::ServiceError;

/// Role names carried in JWT claims and user rows.
pub mod consts {
    /// Back-office staff: full access, including approvals.
    pub const ROLE_ADMIN: &str = "admin";
    /// Partner-school actor: may create requests/returns and read data.
    pub const ROLE_SCHOOL: &str = "school";
}

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,            // Subject (user ID)
    pub email: Option<String>,  // User's email
    pub role: String,           // User's role
    pub school_id: Option<i32>, // School the actor belongs to, if any
    pub jti: String,            // JWT ID
    pub iat: i64,               // Issued at time
    pub exp: i64,               // Expiration time
    pub iss: String,            // Issuer
    pub aud: String,            // Audience
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: String,
    pub email: Option<String>,
    pub role: String,
    pub school_id: Option<i32>,
    pub token_id: String,
}

impl AuthUser {
    /// Check if the user has a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.role == role
    }

    /// Check if the user is an admin
    pub fn is_admin(&self) -> bool {
        self.has_role(consts::ROLE_ADMIN)
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing authentication")]
    MissingAuth,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("insufficient permissions")]
    InsufficientPermissions,
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingAuth | Self::InvalidCredentials | Self::InvalidToken
            | Self::ExpiredToken => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let body = serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
            "timestamp": Utc::now().to_rfc3339(),
        });
        (status, Json(body)).into_response()
    }
}

/// Authentication configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: String,
    pub audience: String,
    pub token_ttl: Duration,
}

impl AuthConfig {
    pub fn new(
        jwt_secret: String,
        issuer: String,
        audience: String,
        token_ttl: Duration,
    ) -> Self {
        Self {
            jwt_secret,
            issuer,
            audience,
            token_ttl,
        }
    }
}

/// Authentication service: credential checks, token issue/validation,
/// and user provisioning.
pub struct AuthService {
    config: AuthConfig,
    db: Arc<DbPool>,
}

impl AuthService {
    pub fn new(config: AuthConfig, db: Arc<DbPool>) -> Self {
        Self { config, db }
    }

    /// Hashes a password with argon2 and a fresh salt
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Verifies a password against a stored argon2 hash
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AuthError::Internal(format!("stored hash unparseable: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Issues a signed JWT for the given user
    pub fn generate_token(&self, user: &user::Model) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id.to_string(),
            email: Some(user.email.clone()),
            role: user.role.clone(),
            school_id: user.school_id,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.config.token_ttl.as_secs() as i64,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AuthError::Internal(format!("token encoding failed: {}", e)))
    }

    /// Validates a JWT and returns its claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            _ => AuthError::InvalidToken,
        })
    }

    /// Checks credentials against the users table and issues a token
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let found = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::Active.eq(true))
            .one(&*self.db)
            .await
            .map_err(|e| AuthError::Internal(format!("user lookup failed: {}", e)))?;

        let account = found.ok_or(AuthError::InvalidCredentials)?;

        if !self.verify_password(password, &account.password_hash)? {
            debug!(email, "password verification failed");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self.generate_token(&account)?;
        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.token_ttl.as_secs(),
        })
    }

    /// Provisions a user account with a hashed password
    pub async fn register_user(
        &self,
        input: RegisterUserInput,
    ) -> Result<user::Model, ServiceError> {
        input.validate()?;

        let role = input.role.as_str();
        if role != consts::ROLE_ADMIN && role != consts::ROLE_SCHOOL {
            return Err(ServiceError::ValidationError(format!(
                "unknown role '{}'",
                role
            )));
        }
        if role == consts::ROLE_SCHOOL && input.school_id.is_none() {
            return Err(ServiceError::ValidationError(
                "school role requires a school_id".to_string(),
            ));
        }

        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(&input.email))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "user with email {} already exists",
                input.email
            )));
        }

        let password_hash = self
            .hash_password(&input.password)
            .map_err(|e| ServiceError::InternalError(e.to_string()))?;

        let now = Utc::now();
        let account = user::ActiveModel {
            email: Set(input.email),
            password_hash: Set(password_hash),
            role: Set(input.role),
            school_id: Set(input.school_id),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let account = account.insert(&*self.db).await?;
        info!(user_id = account.id, "registered user");
        Ok(account)
    }
}

/// Login request payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

/// Login response payload
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// User registration payload (admin only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUserInput {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: String,
    pub school_id: Option<i32>,
}

/// Authentication middleware that extracts and validates bearer tokens
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let headers = request.headers().clone();

    let auth_service = match request.extensions().get::<Arc<AuthService>>() {
        Some(service) => service.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authentication service not available",
            )
                .into_response();
        }
    };

    match extract_auth_from_headers(&headers, &auth_service) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Role middleware to check if a user has the required role. Admins pass
/// every role gate.
pub async fn role_middleware(
    State(required_role): State<String>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let user = match request.extensions().get::<AuthUser>() {
        Some(user) => user.clone(),
        None => return Err(AuthError::MissingAuth),
    };

    if !user.is_admin() && !user.has_role(&required_role) {
        return Err(AuthError::InsufficientPermissions);
    }

    Ok(next.run(request).await)
}

fn extract_auth_from_headers(
    headers: &HeaderMap,
    auth_service: &AuthService,
) -> Result<AuthUser, AuthError> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_value) = auth_header.to_str() {
            if auth_value.starts_with("Bearer ") {
                let token = auth_value.trim_start_matches("Bearer ").trim();
                let claims = auth_service.validate_token(token)?;

                return Ok(AuthUser {
                    user_id: claims.sub,
                    email: claims.email,
                    role: claims.role,
                    school_id: claims.school_id,
                    token_id: claims.jti,
                });
            }
        }
    }

    Err(AuthError::MissingAuth)
}

/// Extension methods for Router to add auth middleware
pub trait AuthRouterExt {
    fn with_auth(self) -> Self;
    fn with_role(self, role: &str) -> Self;
}

impl<S> AuthRouterExt for axum::Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_auth(self) -> Self {
        self.layer(axum::middleware::from_fn(auth_middleware))
    }

    fn with_role(self, role: &str) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            role.to_string(),
            role_middleware,
        ))
        .with_auth()
    }
}

/// Authentication routes
pub fn auth_routes() -> axum::Router<Arc<AuthService>> {
    axum::Router::new()
        .route("/login", axum::routing::post(login_handler))
        .layer(DefaultBodyLimit::max(1024 * 64))
}

/// Login handler
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(auth_service): State<Arc<AuthService>>,
    Json(credentials): Json<LoginCredentials>,
) -> Result<Json<LoginResponse>, AuthError> {
    let response = auth_service
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> AuthService {
        let config = AuthConfig::new(
            "test_secret_key_for_testing_purposes_only_32chars".into(),
            "imprint-api".into(),
            "imprint-clients".into(),
            Duration::from_secs(3600),
        );
        // Token and password helpers never touch the pool.
        let db = Arc::new(DbPool::default());
        AuthService::new(config, db)
    }

    #[test]
    fn password_hash_roundtrip() {
        let svc = test_service();
        let hash = svc.hash_password("correct horse battery staple").unwrap();
        assert!(svc
            .verify_password("correct horse battery staple", &hash)
            .unwrap());
        assert!(!svc.verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn token_roundtrip_preserves_claims() {
        let svc = test_service();
        let account = user::Model {
            id: 7,
            email: "staff@imprintpress.example".into(),
            password_hash: String::new(),
            role: consts::ROLE_SCHOOL.into(),
            school_id: Some(3),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let token = svc.generate_token(&account).unwrap();
        let claims = svc.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.role, consts::ROLE_SCHOOL);
        assert_eq!(claims.school_id, Some(3));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let svc = test_service();
        let account = user::Model {
            id: 1,
            email: "admin@imprintpress.example".into(),
            password_hash: String::new(),
            role: consts::ROLE_ADMIN.into(),
            school_id: None,
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let mut token = svc.generate_token(&account).unwrap();
        token.push('x');
        assert!(matches!(
            svc.validate_token(&token),
            Err(AuthError::InvalidToken)
        ));
    }
}
