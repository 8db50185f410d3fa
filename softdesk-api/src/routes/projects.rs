/// Project endpoints
///
/// - `GET /projects/` - projects the caller contributes to (all for superusers)
/// - `POST /projects/` - create a project; the caller becomes author and
///   first contributor
/// - `GET /projects/{id}/` - detail with the project's issues
/// - `PUT|PATCH /projects/{id}/` - update (author only)
/// - `DELETE /projects/{id}/` - delete with everything under it (author only)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    projection::{render_project, Operation, ProjectDetail, ProjectList, Projected},
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
    models::project::{CreateProject, Project, ProjectType, UpdateProject},
    scoping::{self, resolve_project, ProjectScope, RouteIds},
};
use validator::Validate;

type ProjectView = Projected<ProjectList, ProjectDetail>;

/// Body of POST, PUT and PATCH; `author` is never read from the client
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ProjectInput {
    #[validate(length(min = 1, max = 100, message = "Ensure this field has between 1 and 100 characters."))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub project_type: Option<ProjectType>,
}

impl ProjectInput {
    fn presence(&self) -> [(&'static str, bool); 3] {
        [
            ("name", self.name.is_some()),
            ("description", self.description.is_some()),
            ("project_type", self.project_type.is_some()),
        ]
    }
}

impl From<ProjectInput> for UpdateProject {
    fn from(input: ProjectInput) -> Self {
        Self {
            name: input.name,
            description: input.description,
            project_type: input.project_type,
        }
    }
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<ProjectView>>> {
    let projects = scoping::list_projects(&state.db, ProjectScope::for_caller(&auth)).await?;

    let mut views = Vec::with_capacity(projects.len());
    for project in &projects {
        views.push(render_project(&state.db, project, Operation::List).await?);
    }

    Ok(Json(views))
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
    authorize_request(&state.db, &auth, method, RouteIds::collection()).await?;

    let Json(input) = payload?;
    input.validate()?;

    require_fields(&[
        ("name", input.name.is_some()),
        ("project_type", input.project_type.is_some()),
    ])?;
    let name = required(input.name, "name")?;
    let project_type = required(input.project_type, "project_type")?;

    let project = Project::create(
        &state.db,
        CreateProject {
            name,
            description: input.description.unwrap_or_default(),
            project_type,
            author_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(project_id = project.id, author_id = auth.user_id, "Project created");

    let view = render_project(&state.db, &project, Operation::Create).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<ProjectView>> {
    let ctx = authorize_request(&state.db, &auth, method, RouteIds::project(project_id)).await?;

    let project = resolve_project(&state.db, project_id).await?;
    authorize_object(&auth, ctx, project.author_id)?;

    Ok(Json(render_project(&state.db, &project, Operation::Detail).await?))
}

/// PUT: name, description and project_type must all be present
pub async fn replace_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path(project_id): Path<i64>,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> ApiResult<Json<ProjectView>> {
    let ctx = authorize_request(&state.db, &auth, method, RouteIds::project(project_id)).await?;

    save_project(&state, &auth, ctx, project_id, WriteMode::Replace, payload).await
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path(project_id): Path<i64>,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> ApiResult<Json<ProjectView>> {
    let ctx = authorize_request(&state.db, &auth, method, RouteIds::project(project_id)).await?;

    save_project(&state, &auth, ctx, project_id, WriteMode::Partial, payload).await
}

async fn save_project(
    state: &AppState,
    auth: &AuthContext,
    ctx: AccessContext,
    project_id: i64,
    mode: WriteMode,
    payload: Result<Json<ProjectInput>, JsonRejection>,
) -> ApiResult<Json<ProjectView>> {
    let project = resolve_project(&state.db, project_id).await?;
    authorize_object(auth, ctx, project.author_id)?;

    let Json(input) = payload?;
    mode.check(&input.presence())?;
    input.validate()?;

    let project = Project::update(&state.db, project.id, input.into())
        .await?
        .ok_or_else(|| ApiError::NotFound("Project not found".to_string()))?;

    tracing::info!(project_id = project.id, "Project updated");

    Ok(Json(render_project(&state.db, &project, Operation::Update).await?))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path(project_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let ctx = authorize_request(&state.db, &auth, method, RouteIds::project(project_id)).await?;

    let project = resolve_project(&state.db, project_id).await?;
    authorize_object(&auth, ctx, project.author_id)?;

    Project::delete(&state.db, project.id).await?;

    tracing::info!(project_id = project.id, "Project deleted");

    Ok(StatusCode::NO_CONTENT)
}
