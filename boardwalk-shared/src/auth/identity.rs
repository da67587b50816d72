/// Identity resolution: Bearer JWT → user id
///
/// Boardwalk delegates credential issuance to an external identity provider;
/// the engine only validates access tokens it is handed. Tokens are HS256
/// JWTs whose `sub` claim carries the user id.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Validation**: signature, expiration, and issuer checks
/// - **Secret Management**: secrets should be at least 32 bytes
///
/// # Example
///
/// ```
/// use boardwalk_shared::auth::identity::{create_access_token, validate_access_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let secret = "test-secret-key-at-least-32-bytes-long";
///
/// let token = create_access_token(user_id, secret)?;
/// let claims = validate_access_token(&token, secret)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer string stamped into and required on every token
const ISSUER: &str = "boardwalk";

/// Access token lifetime
const ACCESS_TOKEN_HOURS: i64 = 24;

/// Error type for identity resolution
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// No credential was presented
    #[error("missing credentials")]
    MissingCredentials,

    /// The Authorization header is not a Bearer token
    #[error("invalid credential format: {0}")]
    InvalidFormat(String),

    /// Token has expired
    #[error("token has expired")]
    Expired,

    /// Token failed validation (bad signature, wrong issuer, malformed)
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token creation failed
    #[error("failed to create token: {0}")]
    CreateError(String),
}

/// JWT claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Issuer - always "boardwalk"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for a user with the default access-token lifetime
    pub fn new(user_id: Uuid) -> Self {
        let now = Utc::now();
        let expiration = now + Duration::hours(ACCESS_TOKEN_HOURS);

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        }
    }
}

/// The resolved caller identity, injected into request extensions after
/// successful validation
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use boardwalk_shared::auth::identity::AuthUser;
///
/// async fn handler(Extension(auth): Extension<AuthUser>) -> String {
///     format!("caller: {}", auth.user_id)
/// }
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthUser {
    /// Authenticated user ID
    pub user_id: Uuid,
}

/// Creates a signed access token for a user
///
/// Used by tests and tooling that simulate the external identity provider.
///
/// # Errors
///
/// Returns `IdentityError::CreateError` if signing fails.
pub fn create_access_token(user_id: Uuid, secret: &str) -> Result<String, IdentityError> {
    let claims = Claims::new(user_id);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| IdentityError::CreateError(e.to_string()))
}

/// Validates an access token and returns its claims
///
/// Checks signature, expiration, and issuer.
///
/// # Errors
///
/// - `IdentityError::Expired` when the token is past its expiration
/// - `IdentityError::InvalidToken` for any other validation failure
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, IdentityError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityError::Expired,
        _ => IdentityError::InvalidToken(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Extracts the caller identity from an Authorization header value
///
/// # Errors
///
/// - `IdentityError::MissingCredentials` when no header is present
/// - `IdentityError::InvalidFormat` when it is not a Bearer token
/// - Validation errors from `validate_access_token`
pub fn resolve_bearer(header: Option<&str>, secret: &str) -> Result<AuthUser, IdentityError> {
    let header = header.ok_or(IdentityError::MissingCredentials)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| IdentityError::InvalidFormat("expected Bearer token".to_string()))?;

    let claims = validate_access_token(token, secret)?;

    Ok(AuthUser {
        user_id: claims.sub,
    })
}
