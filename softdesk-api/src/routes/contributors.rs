/// Contributor endpoints
///
/// - `GET /projects/{id}/contributors/` - members of the project
/// - `POST /projects/{id}/contributors/` - add a user to the project
/// - `GET /projects/{id}/contributors/{cid}/` - one membership
/// - `DELETE /projects/{id}/contributors/{cid}/` - remove a member (project author only)
///
/// Any contributor may add members. The project author cannot be removed.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    projection::{render_contributor, ContributorDetail, ContributorList, Operation, Projected},
    routes::{authorize_object, authorize_request},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use softdesk_shared::{
    auth::middleware::AuthContext,
    models::{
        contributor::{Contributor, CreateContributor},
        user::User,
    },
    scoping::{resolve_contributor, resolve_project, RouteIds},
};

type ContributorView = Projected<ContributorList, ContributorDetail>;

/// Body of POST; the project always comes from the path
#[derive(Debug, Deserialize)]
pub struct ContributorInput {
    pub user: i64,
}

pub async fn list_contributors(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<ContributorView>>> {
    authorize_request(&state.db, &auth, method, RouteIds::nested(project_id, None)).await?;

    let project = resolve_project(&state.db, project_id).await?;
    let contributors = Contributor::list_by_project(&state.db, project.id).await?;

    Ok(Json(
        contributors
            .iter()
            .map(|c| render_contributor(c, Operation::List))
            .collect(),
    ))
}

pub async fn add_contributor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path(project_id): Path<i64>,
    payload: Result<Json<ContributorInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ContributorView>)> {
    authorize_request(&state.db, &auth, method, RouteIds::nested(project_id, None)).await?;

    let project = resolve_project(&state.db, project_id).await?;
    let Json(input) = payload?;

    if User::find_by_id(&state.db, input.user).await?.is_none() {
        return Err(ApiError::field(
            "user",
            format!("Invalid pk \"{}\" - object does not exist.", input.user),
        ));
    }

    let contributor = Contributor::create(
        &state.db,
        CreateContributor {
            project_id: project.id,
            user_id: input.user,
        },
    )
    .await?;

    tracing::info!(
        project_id = project.id,
        user_id = contributor.user_id,
        added_by = auth.user_id,
        "Contributor added"
    );

    Ok((
        StatusCode::CREATED,
        Json(render_contributor(&contributor, Operation::Create)),
    ))
}

pub async fn get_contributor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, contributor_id)): Path<(i64, i64)>,
) -> ApiResult<Json<ContributorView>> {
    let ids = RouteIds::nested(project_id, Some(contributor_id));
    let ctx = authorize_request(&state.db, &auth, method, ids).await?;

    let project = resolve_project(&state.db, project_id).await?;
    let contributor = resolve_contributor(&state.db, project.id, contributor_id).await?;
    authorize_object(&auth, ctx, project.author_id)?;

    Ok(Json(render_contributor(&contributor, Operation::Detail)))
}

pub async fn remove_contributor(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, contributor_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    let ids = RouteIds::nested(project_id, Some(contributor_id));
    let ctx = authorize_request(&state.db, &auth, method, ids).await?;

    let project = resolve_project(&state.db, project_id).await?;
    let contributor = resolve_contributor(&state.db, project.id, contributor_id).await?;
    authorize_object(&auth, ctx, project.author_id)?;

    if contributor.user_id == project.author_id {
        return Err(ApiError::BadRequest(
            "The project author cannot be removed from its contributors".to_string(),
        ));
    }

    Contributor::delete(&state.db, contributor.id).await?;

    tracing::info!(
        project_id = project.id,
        user_id = contributor.user_id,
        "Contributor removed"
    );

    Ok(StatusCode::NO_CONTENT)
}
