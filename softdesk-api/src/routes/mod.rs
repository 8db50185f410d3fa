/// API route handlers
///
/// # Modules
///
/// - `health`: health check endpoint
/// - `auth`: signup, login and token refresh
/// - `users`: user listing and self-service updates
/// - `projects`: projects the caller contributes to
/// - `contributors`: project membership
/// - `issues`: issues of a project
/// - `comments`: comments on an issue
///
/// Handlers below a project share the same flow: authorize the request
/// against the project, resolve the parents named in the path, load the
/// object, authorize again with the object's author, then render.

pub mod auth;
pub mod comments;
pub mod contributors;
pub mod health;
pub mod issues;
pub mod projects;
pub mod users;

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use axum::http::Method;
use softdesk_shared::{
    auth::{
        authorization::{evaluate, AccessContext, PROJECT_RESOURCE_POLICY},
        middleware::AuthContext,
    },
    scoping::RouteIds,
};
use sqlx::PgPool;

/// Fallback for verbs a route does not support
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Request-stage check for project-scoped routes
///
/// Returns the context so the object stage can reuse the membership lookup.
pub(crate) async fn authorize_request(
    pool: &PgPool,
    auth: &AuthContext,
    method: Method,
    ids: RouteIds,
) -> ApiResult<AccessContext> {
    let ctx = AccessContext::load(pool, auth, method, ids.project_id()).await?;
    evaluate(PROJECT_RESOURCE_POLICY, auth, &ctx)?;
    Ok(ctx)
}

/// Object-stage check once the target's author is known
pub(crate) fn authorize_object(
    auth: &AuthContext,
    ctx: AccessContext,
    owner_id: i64,
) -> ApiResult<()> {
    evaluate(PROJECT_RESOURCE_POLICY, auth, &ctx.with_owner(owner_id))?;
    Ok(())
}

const REQUIRED_MESSAGE: &str = "This field is required.";

/// Unwraps a field that must be present
pub(crate) fn required<T>(value: Option<T>, field: &str) -> ApiResult<T> {
    value.ok_or_else(|| ApiError::field(field, REQUIRED_MESSAGE))
}

/// Rejects a full replacement (PUT) that leaves out writable fields
pub(crate) fn require_fields(fields: &[(&str, bool)]) -> ApiResult<()> {
    let missing: Vec<ValidationErrorDetail> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(field, _)| ValidationErrorDetail::new(*field, REQUIRED_MESSAGE))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(missing))
    }
}

/// PUT replaces every writable field, PATCH any subset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteMode {
    Replace,
    Partial,
}

impl WriteMode {
    /// Runs after the object stage, so a body never reveals more than a 403 would
    pub(crate) fn check(self, fields: &[(&str, bool)]) -> ApiResult<()> {
        match self {
            WriteMode::Replace => require_fields(fields),
            WriteMode::Partial => Ok(()),
        }
    }
}
