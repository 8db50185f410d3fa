/// Issue endpoints
///
/// - `GET /projects/{id}/issues/` - issues of the project, list shape
/// - `POST /projects/{id}/issues/` - open an issue; the caller is its author
/// - `GET /projects/{id}/issues/{iid}/` - detail with the issue's comments
/// - `PUT|PATCH /projects/{id}/issues/{iid}/` - update (issue author only)
/// - `DELETE /projects/{id}/issues/{iid}/` - delete with its comments (issue author only)
///
/// `assigned_to` defaults to the author and must be a contributor of the project.
/// When the author is not a contributor (a superuser), the project author is assigned.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    projection::{render_issue, IssueDetail, IssueList, Operation, Projected},
    routes::{authorize_object, authorize_request, require_fields, required, WriteMode},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use softdesk_shared::{
    auth::{authorization::AccessContext, middleware::AuthContext},
    models::{
        contributor::Contributor,
        issue::{CreateIssue, Issue, IssuePriority, IssueStatus, IssueTag, UpdateIssue},
        project::Project,
    },
    scoping::{resolve_issue, resolve_project, RouteIds},
};
use sqlx::PgPool;
use validator::Validate;

type IssueView = Projected<IssueList, IssueDetail>;

/// Body of POST, PUT and PATCH; `project` and `author` are never read from the client
#[derive(Debug, Default, Deserialize, Validate)]
pub struct IssueInput {
    #[validate(length(min = 1, max = 128, message = "Ensure this field has between 1 and 128 characters."))]
    pub title: Option<String>,

    #[validate(length(max = 2048, message = "Ensure this field has no more than 2048 characters."))]
    pub description: Option<String>,

    pub priority: Option<IssuePriority>,
    pub tag: Option<IssueTag>,
    pub status: Option<IssueStatus>,

    /// User ID of the assignee
    pub assigned_to: Option<i64>,
}

impl From<IssueInput> for UpdateIssue {
    fn from(input: IssueInput) -> Self {
        Self {
            title: input.title,
            description: input.description,
            priority: input.priority,
            tag: input.tag,
            status: input.status,
            assigned_to_id: input.assigned_to,
        }
    }
}

impl IssueInput {
    fn presence(&self) -> [(&'static str, bool); 6] {
        [
            ("title", self.title.is_some()),
            ("description", self.description.is_some()),
            ("priority", self.priority.is_some()),
            ("tag", self.tag.is_some()),
            ("status", self.status.is_some()),
            ("assigned_to", self.assigned_to.is_some()),
        ]
    }
}

async fn ensure_assignable(pool: &PgPool, project_id: i64, user_id: i64) -> ApiResult<()> {
    if Contributor::is_contributor(pool, project_id, user_id).await? {
        Ok(())
    } else {
        Err(ApiError::field(
            "assigned_to",
            "The assignee must be a contributor of the project.",
        ))
    }
}

/// The author when they contribute to the project, otherwise the project author
///
/// A superuser may open issues on projects they do not belong to.
async fn default_assignee(pool: &PgPool, auth: &AuthContext, project: &Project) -> ApiResult<i64> {
    if Contributor::is_contributor(pool, project.id, auth.user_id).await? {
        Ok(auth.user_id)
    } else {
        Ok(project.author_id)
    }
}

pub async fn list_issues(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<IssueView>>> {
    authorize_request(&state.db, &auth, method, RouteIds::nested(project_id, None)).await?;

    let project = resolve_project(&state.db, project_id).await?;
    let issues = Issue::list_by_project(&state.db, project.id).await?;

    let mut views = Vec::with_capacity(issues.len());
    for issue in &issues {
        views.push(render_issue(&state.db, issue, Operation::List).await?);
    }

    Ok(Json(views))
}

pub async fn create_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path(project_id): Path<i64>,
    payload: Result<Json<IssueInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IssueView>)> {
    authorize_request(&state.db, &auth, method, RouteIds::nested(project_id, None)).await?;

    let project = resolve_project(&state.db, project_id).await?;

    let Json(input) = payload?;
    input.validate()?;

    require_fields(&[
        ("title", input.title.is_some()),
        ("priority", input.priority.is_some()),
        ("tag", input.tag.is_some()),
    ])?;
    let title = required(input.title, "title")?;
    let priority = required(input.priority, "priority")?;
    let tag = required(input.tag, "tag")?;

    let assigned_to_id = match input.assigned_to {
        Some(assignee) => {
            ensure_assignable(&state.db, project.id, assignee).await?;
            assignee
        }
        None => default_assignee(&state.db, &auth, &project).await?,
    };

    let issue = Issue::create(
        &state.db,
        CreateIssue {
            title,
            description: input.description.unwrap_or_default(),
            priority,
            tag,
            status: input.status.unwrap_or_default(),
            project_id: project.id,
            author_id: auth.user_id,
            assigned_to_id,
        },
    )
    .await?;

    tracing::info!(
        issue_id = issue.id,
        project_id = project.id,
        author_id = auth.user_id,
        "Issue created"
    );

    let view = render_issue(&state.db, &issue, Operation::Create).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, issue_id)): Path<(i64, i64)>,
) -> ApiResult<Json<IssueView>> {
    let ids = RouteIds::nested(project_id, Some(issue_id));
    let ctx = authorize_request(&state.db, &auth, method, ids).await?;

    let issue = resolve_issue(&state.db, project_id, issue_id).await?;
    authorize_object(&auth, ctx, issue.author_id)?;

    Ok(Json(render_issue(&state.db, &issue, Operation::Detail).await?))
}

/// PUT: every writable field must be present
pub async fn replace_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, issue_id)): Path<(i64, i64)>,
    payload: Result<Json<IssueInput>, JsonRejection>,
) -> ApiResult<Json<IssueView>> {
    let ids = RouteIds::nested(project_id, Some(issue_id));
    let ctx = authorize_request(&state.db, &auth, method, ids).await?;

    save_issue(&state, &auth, ctx, (project_id, issue_id), WriteMode::Replace, payload).await
}

pub async fn update_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, issue_id)): Path<(i64, i64)>,
    payload: Result<Json<IssueInput>, JsonRejection>,
) -> ApiResult<Json<IssueView>> {
    let ids = RouteIds::nested(project_id, Some(issue_id));
    let ctx = authorize_request(&state.db, &auth, method, ids).await?;

    save_issue(&state, &auth, ctx, (project_id, issue_id), WriteMode::Partial, payload).await
}

async fn save_issue(
    state: &AppState,
    auth: &AuthContext,
    ctx: AccessContext,
    (project_id, issue_id): (i64, i64),
    mode: WriteMode,
    payload: Result<Json<IssueInput>, JsonRejection>,
) -> ApiResult<Json<IssueView>> {
    let issue = resolve_issue(&state.db, project_id, issue_id).await?;
    authorize_object(auth, ctx, issue.author_id)?;

    let Json(input) = payload?;
    mode.check(&input.presence())?;
    input.validate()?;
    if let Some(assignee) = input.assigned_to {
        ensure_assignable(&state.db, issue.project_id, assignee).await?;
    }

    let issue = Issue::update(&state.db, issue.project_id, issue.id, input.into())
        .await?
        .ok_or_else(|| ApiError::NotFound("Issue not found".to_string()))?;

    tracing::info!(issue_id = issue.id, project_id = issue.project_id, "Issue updated");

    Ok(Json(render_issue(&state.db, &issue, Operation::Update).await?))
}

pub async fn delete_issue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, issue_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let ids = RouteIds::nested(project_id, Some(issue_id));
    let ctx = authorize_request(&state.db, &auth, method, ids).await?;

    let issue = resolve_issue(&state.db, project_id, issue_id).await?;
    authorize_object(&auth, ctx, issue.author_id)?;

    Issue::delete(&state.db, issue.id).await?;

    tracing::info!(issue_id = issue.id, project_id = issue.project_id, "Issue deleted");

    Ok(StatusCode::NO_CONTENT)
}
