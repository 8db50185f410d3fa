/// Access policy for project-scoped resources and user records
///
/// A policy is an ordered list of [`Predicate`]s, each a pure function of the
/// caller and an [`AccessContext`]. A request is allowed only if every
/// predicate passes.
///
/// # Permission Model
///
/// 1. **Contributor**: anything under a project requires a contributor row
///    for that project (superusers are exempt)
/// 2. **Author or read-only**: safe methods are open to contributors, writes
///    require the caller to be the resource's author
/// 3. **Self or read-only**: writes on a user record require caller == user
///
/// # Stages
///
/// Handlers evaluate a policy twice. The request stage runs before any
/// object is loaded, so `owner_id` is unknown and the author predicate
/// defers. The object stage runs with the loaded object's author filled in.
/// A context without a project id (project list and create) defers the
/// contributor predicate.
///
/// # Example
///
/// ```
/// use axum::http::Method;
/// use softdesk_shared::auth::authorization::{evaluate, AccessContext, PROJECT_RESOURCE_POLICY};
/// use softdesk_shared::auth::middleware::AuthContext;
///
/// let caller = AuthContext::new(2, false);
///
/// // Contributor reading an issue authored by someone else
/// let ctx = AccessContext::new(Method::GET, Some(10), true).with_owner(1);
/// assert!(evaluate(PROJECT_RESOURCE_POLICY, &caller, &ctx).is_ok());
///
/// // ...but not editing it
/// let ctx = AccessContext::new(Method::PATCH, Some(10), true).with_owner(1);
/// assert!(evaluate(PROJECT_RESOURCE_POLICY, &caller, &ctx).is_err());
/// ```

use axum::http::Method;
use sqlx::PgPool;
use tracing::debug;

use super::middleware::AuthContext;
use crate::models::contributor::Contributor;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller has no contributor row for the project
    #[error("Not a contributor of project {0}")]
    NotContributor(i64),

    /// Write attempted by someone other than the resource's author
    #[error("Only the author can modify this resource")]
    NotAuthor,

    /// Write attempted on another user's record
    #[error("Users can only modify their own account")]
    NotSelf,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Everything a predicate needs to know about the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessContext {
    pub method: Method,

    /// Resolved project id, `None` for project-independent routes
    pub project_id: Option<i64>,

    /// Whether the caller contributes to `project_id`
    pub is_contributor: bool,

    /// Author of the target object, known only at the object stage
    pub owner_id: Option<i64>,
}

impl AccessContext {
    pub fn new(method: Method, project_id: Option<i64>, is_contributor: bool) -> Self {
        Self {
            method,
            project_id,
            is_contributor,
            owner_id: None,
        }
    }

    /// Context for routes with no project in scope
    pub fn unscoped(method: Method) -> Self {
        Self::new(method, None, false)
    }

    /// Moves the context to the object stage
    pub fn with_owner(mut self, owner_id: i64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Builds a request-stage context, looking up the caller's membership
    ///
    /// Superusers skip the lookup.
    pub async fn load(
        pool: &PgPool,
        auth: &AuthContext,
        method: Method,
        project_id: Option<i64>,
    ) -> Result<Self, AuthzError> {
        let is_contributor = match project_id {
            Some(project_id) if !auth.is_superuser => {
                Contributor::is_contributor(pool, project_id, auth.user_id).await?
            }
            _ => false,
        };

        Ok(Self::new(method, project_id, is_contributor))
    }
}

/// A single access rule
pub type Predicate = fn(&AuthContext, &AccessContext) -> Result<(), AuthzError>;

/// Projects, issues, comments and contributors
pub const PROJECT_RESOURCE_POLICY: &[Predicate] = &[is_contributor, is_author_or_read_only];

/// User records
pub const USER_POLICY: &[Predicate] = &[is_self_or_read_only];

/// GET, HEAD and OPTIONS
pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Caller must contribute to the project in scope
pub fn is_contributor(auth: &AuthContext, ctx: &AccessContext) -> Result<(), AuthzError> {
    let Some(project_id) = ctx.project_id else {
        return Ok(());
    };

    if auth.is_superuser || ctx.is_contributor {
        Ok(())
    } else {
        Err(AuthzError::NotContributor(project_id))
    }
}

/// Safe methods pass; writes require the caller to be the author
pub fn is_author_or_read_only(auth: &AuthContext, ctx: &AccessContext) -> Result<(), AuthzError> {
    if is_safe_method(&ctx.method) {
        return Ok(());
    }

    match ctx.owner_id {
        Some(owner_id) if owner_id != auth.user_id => Err(AuthzError::NotAuthor),
        _ => Ok(()),
    }
}

/// Safe methods pass; writes require the target user to be the caller
pub fn is_self_or_read_only(auth: &AuthContext, ctx: &AccessContext) -> Result<(), AuthzError> {
    if is_safe_method(&ctx.method) {
        return Ok(());
    }

    match ctx.owner_id {
        Some(owner_id) if owner_id != auth.user_id => Err(AuthzError::NotSelf),
        _ => Ok(()),
    }
}

/// Runs every predicate in order, stopping at the first denial
pub fn evaluate(
    policy: &[Predicate],
    auth: &AuthContext,
    ctx: &AccessContext,
) -> Result<(), AuthzError> {
    for predicate in policy {
        if let Err(err) = predicate(auth, ctx) {
            debug!(
                user_id = auth.user_id,
                method = %ctx.method,
                project_id = ?ctx.project_id,
                owner_id = ?ctx.owner_id,
                error = %err,
                "Access denied"
            );
            return Err(err);
        }
    }

    Ok(())
}
