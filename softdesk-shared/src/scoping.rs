/// Resource scoping for the nested project hierarchy
///
/// Every lookup below a project is filtered by the ids in the URL path, so an
/// id that exists but belongs to another parent is reported as not found.
///
/// ```text
/// /projects/{pk}/
/// /projects/{project_pk}/issues/{pk}/
/// /projects/{project_pk}/issues/{issue_pk}/comments/{pk}/
/// /projects/{project_pk}/contributors/{pk}/
/// ```
///
/// # Example
///
/// ```no_run
/// use softdesk_shared::auth::middleware::AuthContext;
/// use softdesk_shared::scoping::{list_projects, resolve_issue, ProjectScope};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, caller: AuthContext) -> Result<(), Box<dyn std::error::Error>> {
/// let visible = list_projects(&pool, ProjectScope::for_caller(&caller)).await?;
///
/// if let Some(project) = visible.first() {
///     // 404 unless issue 7 belongs to this project
///     let issue = resolve_issue(&pool, project.id, 7).await?;
///     println!("{}", issue.title);
/// }
/// # Ok(())
/// # }
/// ```

use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::middleware::AuthContext;
use crate::models::{
    comment::Comment, contributor::Contributor, issue::Issue, project::Project, user::User,
};

/// Error type for scoped lookups
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// The resource (or one of its parents) does not exist in this scope
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Ids captured from the URL path
///
/// `project_pk` is set on routes nested under a project, `pk` is the id of
/// the resource the route itself addresses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RouteIds {
    pub project_pk: Option<i64>,
    pub pk: Option<i64>,
}

impl RouteIds {
    /// `/projects/`
    pub fn collection() -> Self {
        Self::default()
    }

    /// `/projects/{pk}/`
    pub fn project(pk: i64) -> Self {
        Self {
            project_pk: None,
            pk: Some(pk),
        }
    }

    /// `/projects/{project_pk}/<resource>/` and `.../{pk}/`
    pub fn nested(project_pk: i64, pk: Option<i64>) -> Self {
        Self {
            project_pk: Some(project_pk),
            pk,
        }
    }

    /// Project the request is about, if any
    ///
    /// The nested id wins; on a project's own route the resource id is the
    /// project id.
    pub fn project_id(&self) -> Option<i64> {
        self.project_pk.or(self.pk)
    }
}

/// Which projects a caller can list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectScope {
    /// Superusers see every project
    Unrestricted,

    /// Everyone else sees the projects they contribute to
    ContributorOf(i64),
}

impl ProjectScope {
    pub fn for_caller(auth: &AuthContext) -> Self {
        if auth.is_superuser {
            ProjectScope::Unrestricted
        } else {
            ProjectScope::ContributorOf(auth.user_id)
        }
    }
}

pub async fn list_projects(pool: &PgPool, scope: ProjectScope) -> Result<Vec<Project>, sqlx::Error> {
    match scope {
        ProjectScope::Unrestricted => Project::list_all(pool).await,
        ProjectScope::ContributorOf(user_id) => Project::list_for_contributor(pool, user_id).await,
    }
}

pub async fn resolve_project(pool: &PgPool, project_id: i64) -> Result<Project, ScopeError> {
    Project::find_by_id(pool, project_id)
        .await?
        .ok_or(ScopeError::NotFound("Project"))
}

/// Loads an issue only if it belongs to `project_id`
pub async fn resolve_issue(
    pool: &PgPool,
    project_id: i64,
    issue_id: i64,
) -> Result<Issue, ScopeError> {
    Issue::find_in_project(pool, project_id, issue_id)
        .await?
        .ok_or(ScopeError::NotFound("Issue"))
}

/// Loads a comment only if its issue belongs to `project_id`
pub async fn resolve_comment(
    pool: &PgPool,
    project_id: i64,
    issue_id: i64,
    comment_id: i64,
) -> Result<(Issue, Comment), ScopeError> {
    let issue = resolve_issue(pool, project_id, issue_id).await?;

    let comment = Comment::find_in_issue(pool, issue.id, comment_id)
        .await?
        .ok_or(ScopeError::NotFound("Comment"))?;

    Ok((issue, comment))
}

pub async fn resolve_contributor(
    pool: &PgPool,
    project_id: i64,
    contributor_id: i64,
) -> Result<Contributor, ScopeError> {
    Contributor::find_in_project(pool, project_id, contributor_id)
        .await?
        .ok_or(ScopeError::NotFound("Contributor"))
}

pub async fn resolve_user(pool: &PgPool, user_id: i64) -> Result<User, ScopeError> {
    User::find_by_id(pool, user_id)
        .await?
        .ok_or(ScopeError::NotFound("User"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_for_each_route_shape() {
        assert_eq!(RouteIds::collection().project_id(), None);
        assert_eq!(RouteIds::project(4).project_id(), Some(4));
        assert_eq!(RouteIds::nested(4, None).project_id(), Some(4));
        assert_eq!(RouteIds::nested(4, Some(9)).project_id(), Some(4));
    }

    #[test]
    fn test_route_ids_deserialize_partial() {
        let ids: RouteIds = serde_json::from_str(r#"{"project_pk": 3}"#).unwrap();
        assert_eq!(ids, RouteIds::nested(3, None));
    }

    #[test]
    fn test_project_scope_for_caller() {
        assert_eq!(
            ProjectScope::for_caller(&AuthContext::new(1, true)),
            ProjectScope::Unrestricted
        );
        assert_eq!(
            ProjectScope::for_caller(&AuthContext::new(5, false)),
            ProjectScope::ContributorOf(5)
        );
    }

    #[test]
    fn test_scope_error_message() {
        assert_eq!(ScopeError::NotFound("Issue").to_string(), "Issue not found");
    }
}
