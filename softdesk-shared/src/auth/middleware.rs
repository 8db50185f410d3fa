/// Bearer-token authentication for Axum
///
/// Every protected request must carry `Authorization: Bearer <access token>`.
/// On success the caller's identity is placed in request extensions as an
/// [`AuthContext`] for handlers to pick up with `Extension<AuthContext>`.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::Next, response::Response};
/// use softdesk_shared::auth::middleware::{authenticate, AuthError};
///
/// async fn require_token(mut req: Request, next: Next) -> Result<Response, AuthError> {
///     let auth = authenticate(req.headers(), "secret")?;
///     req.extensions_mut().insert(auth);
///     Ok(next.run(req).await)
/// }
/// ```

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::jwt::{validate_access_token, Claims, JwtError};

/// Identity of the authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: i64,

    /// Superusers see every project; they are not exempt from authorship checks
    pub is_superuser: bool,
}

impl AuthContext {
    pub fn new(user_id: i64, is_superuser: bool) -> Self {
        Self {
            user_id,
            is_superuser,
        }
    }

    /// Builds the context from validated access-token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self::new(claims.sub, claims.is_superuser)
    }
}

/// Error type for authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No Authorization header
    MissingCredentials,

    /// Header present but not a Bearer token
    InvalidFormat(String),

    /// Token rejected (bad signature, expired, wrong type)
    InvalidToken(String),
}

impl AuthError {
    pub fn message(&self) -> String {
        match self {
            AuthError::MissingCredentials => {
                "Authentication credentials were not provided.".to_string()
            }
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => msg.clone(),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
            JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
            other => AuthError::InvalidToken(format!("Invalid token: {}", other)),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": "unauthorized",
            "message": self.message(),
        });

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Extracts and validates the Bearer access token from request headers
pub fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthContext, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))?;

    let claims = validate_access_token(token.trim(), secret)?;

    Ok(AuthContext::from_claims(&claims))
}
