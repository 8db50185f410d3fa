/// Comment endpoints
///
/// - `GET .../issues/{iid}/comments/` - comments of the issue, list shape (no text)
/// - `POST .../issues/{iid}/comments/` - comment on the issue
/// - `GET .../issues/{iid}/comments/{cid}/` - full comment
/// - `PUT|PATCH .../issues/{iid}/comments/{cid}/` - edit the text (comment author only)
/// - `DELETE .../issues/{iid}/comments/{cid}/` - delete (comment author only)
///
/// The issue must belong to the project in the path, otherwise 404.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    projection::{render_comment, CommentDetail, CommentList, Operation, Projected},
    routes::{authorize_object, authorize_request, required, WriteMode},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode},
    Extension, Json,
};
use serde::Deserialize;
use softdesk_shared::{
    auth::{authorization::AccessContext, middleware::AuthContext},
    models::comment::{Comment, CreateComment},
    scoping::{resolve_comment, resolve_issue, RouteIds},
};
use validator::Validate;

type CommentView = Projected<CommentList, CommentDetail>;

/// Body of POST, PUT and PATCH; `issue` and `author` are never read from the client
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CommentInput {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub text: Option<String>,
}

impl CommentInput {
    fn presence(&self) -> [(&'static str, bool); 1] {
        [("text", self.text.is_some())]
    }
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, issue_id)): Path<(i64, i64)>,
) -> ApiResult<Json<Vec<CommentView>>> {
    authorize_request(&state.db, &auth, method, RouteIds::nested(project_id, None)).await?;

    let issue = resolve_issue(&state.db, project_id, issue_id).await?;
    let comments = Comment::list_by_issue(&state.db, issue.id).await?;

    Ok(Json(
        comments
            .iter()
            .map(|c| render_comment(c, Operation::List))
            .collect(),
    ))
}

pub async fn create_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, issue_id)): Path<(i64, i64)>,
    payload: Result<Json<CommentInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CommentView>)> {
    authorize_request(&state.db, &auth, method, RouteIds::nested(project_id, None)).await?;

    let issue = resolve_issue(&state.db, project_id, issue_id).await?;

    let Json(input) = payload?;
    input.validate()?;
    let text = required(input.text, "text")?;

    let comment = Comment::create(
        &state.db,
        CreateComment {
            text,
            issue_id: issue.id,
            author_id: auth.user_id,
        },
    )
    .await?;

    tracing::info!(
        comment_id = comment.id,
        issue_id = issue.id,
        author_id = auth.user_id,
        "Comment created"
    );

    Ok((
        StatusCode::CREATED,
        Json(render_comment(&comment, Operation::Create)),
    ))
}

pub async fn get_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, issue_id, comment_id)): Path<(i64, i64, i64)>,
) -> ApiResult<Json<CommentView>> {
    let ids = RouteIds::nested(project_id, Some(comment_id));
    let ctx = authorize_request(&state.db, &auth, method, ids).await?;

    let (_, comment) = resolve_comment(&state.db, project_id, issue_id, comment_id).await?;
    authorize_object(&auth, ctx, comment.author_id)?;

    Ok(Json(render_comment(&comment, Operation::Detail)))
}

/// PUT: `text` must be present
pub async fn replace_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, issue_id, comment_id)): Path<(i64, i64, i64)>,
    payload: Result<Json<CommentInput>, JsonRejection>,
) -> ApiResult<Json<CommentView>> {
    let ids = RouteIds::nested(project_id, Some(comment_id));
    let ctx = authorize_request(&state.db, &auth, method, ids).await?;

    let path = (project_id, issue_id, comment_id);
    save_comment(&state, &auth, ctx, path, WriteMode::Replace, payload).await
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, issue_id, comment_id)): Path<(i64, i64, i64)>,
    payload: Result<Json<CommentInput>, JsonRejection>,
) -> ApiResult<Json<CommentView>> {
    let ids = RouteIds::nested(project_id, Some(comment_id));
    let ctx = authorize_request(&state.db, &auth, method, ids).await?;

    let path = (project_id, issue_id, comment_id);
    save_comment(&state, &auth, ctx, path, WriteMode::Partial, payload).await
}

async fn save_comment(
    state: &AppState,
    auth: &AuthContext,
    ctx: AccessContext,
    (project_id, issue_id, comment_id): (i64, i64, i64),
    mode: WriteMode,
    payload: Result<Json<CommentInput>, JsonRejection>,
) -> ApiResult<Json<CommentView>> {
    let (issue, comment) = resolve_comment(&state.db, project_id, issue_id, comment_id).await?;
    authorize_object(auth, ctx, comment.author_id)?;

    let Json(input) = payload?;
    mode.check(&input.presence())?;
    input.validate()?;

    // A PATCH without text leaves the comment as it is
    let Some(text) = input.text else {
        return Ok(Json(render_comment(&comment, Operation::Update)));
    };

    let comment = Comment::update_text(&state.db, issue.id, comment.id, text)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    tracing::info!(comment_id = comment.id, issue_id = issue.id, "Comment updated");

    Ok(Json(render_comment(&comment, Operation::Update)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path((project_id, issue_id, comment_id)): Path<(i64, i64, i64)>,
) -> ApiResult<StatusCode> {
    let ids = RouteIds::nested(project_id, Some(comment_id));
    let ctx = authorize_request(&state.db, &auth, method, ids).await?;

    let (issue, comment) = resolve_comment(&state.db, project_id, issue_id, comment_id).await?;
    authorize_object(&auth, ctx, comment.author_id)?;

    Comment::delete(&state.db, comment.id).await?;

    tracing::info!(comment_id = comment.id, issue_id = issue.id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
