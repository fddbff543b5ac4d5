use axum::{
    extract::{Request, State},
    http::{Method, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    models::Role,
};

/// bcrypt work factor for stored passwords.
pub const PASSWORD_COST: u32 = 12;

/// Lifetime of a session token, in seconds.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

/// Claims
///
/// Payload of a session token. The token is signed with the secret of `role`,
/// so a student token never verifies against the librarian secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    /// Issued At: seconds since the epoch.
    pub iat: usize,
    /// Expiration Time: `iat` + one hour. Checked with zero leeway.
    pub exp: usize,
}

/// AuthUser
///
/// Identity resolved by a gate and stored in the request extensions. Handlers read
/// it with `Extension<AuthUser>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

// --- Passwords ---

/// Hashes `password` with bcrypt on the blocking pool.
pub async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, PASSWORD_COST))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(AppError::from)
}

/// Checks `password` against a stored bcrypt hash on the blocking pool.
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?
        .map_err(AppError::from)
}

// --- Tokens ---

/// Signs a one-hour session token for the given user with the secret of `role`.
pub fn issue_token(config: &AppConfig, user_id: Uuid, email: &str, role: Role) -> AppResult<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        user_id,
        email: email.to_string(),
        role,
        iat: now as usize,
        exp: (now + TOKEN_TTL_SECS) as usize,
    };

    let key = EncodingKey::from_secret(config.secret_for(role).as_bytes());
    Ok(encode(&Header::default(), &claims, &key)?)
}

/// Verifies `token` against the secret of `role`. The signature, the expiry and
/// the embedded role must all match; anything else is `None`.
pub fn verify_token(config: &AppConfig, token: &str, role: Role) -> Option<Claims> {
    let key = DecodingKey::from_secret(config.secret_for(role).as_bytes());

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    match decode::<Claims>(token, &key, &validation) {
        Ok(data) if data.claims.role == role => Some(data.claims),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(reason = ?e.kind(), %role, "token rejected");
            None
        }
    }
}

// --- Access control ---

/// Gate
///
/// Which roles a protected router admits. Each role's tokens are verified with
/// that role's own secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Catalog management: librarian tokens only.
    Librarian,
    /// Catalog reads: student or librarian tokens.
    Reader,
}

impl Gate {
    pub fn accepted_roles(&self) -> &'static [Role] {
        match self {
            Gate::Librarian => &[Role::Librarian],
            Gate::Reader => &[Role::Student, Role::Librarian],
        }
    }

    /// Resolves the identity behind an `Authorization` header value.
    pub fn authenticate(&self, config: &AppConfig, header: Option<&str>) -> AppResult<AuthUser> {
        let header = header.ok_or_else(|| AppError::Auth("Not authenticated".to_string()))?;

        // The scheme name is case-insensitive.
        let token = header
            .trim()
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Auth("Not authenticated".to_string()))?;

        self.accepted_roles()
            .iter()
            .find_map(|role| verify_token(config, token, *role))
            .map(AuthUser::from)
            .ok_or_else(|| AppError::Auth("Authentication failed!".to_string()))
    }
}

async fn enforce(gate: Gate, config: &AppConfig, mut request: Request, next: Next) -> Result<Response, AppError> {
    // Pre-flight requests carry no credentials.
    if request.method() == Method::OPTIONS {
        return Ok(next.run(request).await);
    }

    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let user = gate.authenticate(config, header)?;
    tracing::debug!(user_id = %user.id, role = %user.role, "request authenticated");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Middleware guarding the catalog management routes.
pub async fn require_librarian(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(Gate::Librarian, &config, request, next).await
}

/// Middleware guarding the catalog read routes.
pub async fn require_reader(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(Gate::Reader, &config, request, next).await
}
