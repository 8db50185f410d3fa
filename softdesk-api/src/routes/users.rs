/// User endpoints
///
/// - `GET /users/` - all users, list shape, redacted
/// - `GET /users/{id}/` - one user, detail shape, redacted unless self
/// - `PUT /users/{id}/` - replace own profile
/// - `PATCH /users/{id}/` - partially update own profile
///
/// Users are created through `/signup/` and are never deleted here.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    projection::{render_user, Operation, Projected, UserDetail, UserList},
    routes::{auth::is_valid_username, WriteMode},
};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::Method,
    Extension, Json,
};
use serde::Deserialize;
use softdesk_shared::{
    auth::{
        authorization::{evaluate, AccessContext, USER_POLICY},
        middleware::AuthContext,
    },
    models::user::{UpdateUser, User},
    scoping::resolve_user,
};
use validator::Validate;

/// Body of PUT and PATCH
///
/// An empty `email` clears the address.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserInput {
    #[validate(length(min = 1, max = 150, message = "Ensure this field has between 1 and 150 characters."))]
    pub username: Option<String>,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: Option<String>,

    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: Option<String>,

    #[validate(range(min = 15, message = "User must be at least 15 years old."))]
    pub age: Option<i32>,

    pub can_be_contacted: Option<bool>,
    pub can_data_be_shared: Option<bool>,
}

impl UserInput {
    fn presence(&self) -> [(&'static str, bool); 4] {
        [
            ("username", self.username.is_some()),
            ("age", self.age.is_some()),
            ("can_be_contacted", self.can_be_contacted.is_some()),
            ("can_data_be_shared", self.can_data_be_shared.is_some()),
        ]
    }

    /// Validates the body and converts it into a store update
    pub fn into_update(mut self) -> ApiResult<UpdateUser> {
        let clear_email = matches!(self.email.as_deref(), Some(email) if email.trim().is_empty());
        if clear_email {
            self.email = None;
        }

        self.validate()?;

        if let Some(username) = &self.username {
            if !is_valid_username(username) {
                return Err(ApiError::field(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                ));
            }
        }

        let email = if clear_email {
            Some(None)
        } else {
            self.email.map(Some)
        };

        Ok(UpdateUser {
            username: self.username,
            email,
            first_name: self.first_name,
            last_name: self.last_name,
            age: self.age,
            can_be_contacted: self.can_be_contacted,
            can_data_be_shared: self.can_data_be_shared,
        })
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Projected<UserList, UserDetail>>>> {
    let users = User::list(&state.db).await?;

    Ok(Json(
        users
            .iter()
            .map(|user| render_user(user, &auth, Operation::List))
            .collect(),
    ))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(user_id): Path<i64>,
) -> ApiResult<Json<Projected<UserList, UserDetail>>> {
    let user = resolve_user(&state.db, user_id).await?;

    Ok(Json(render_user(&user, &auth, Operation::Detail)))
}

/// PUT: username, age and both privacy flags must be present
pub async fn replace_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path(user_id): Path<i64>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> ApiResult<Json<Projected<UserList, UserDetail>>> {
    save_user(state, auth, method, user_id, WriteMode::Replace, payload).await
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    method: Method,
    Path(user_id): Path<i64>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> ApiResult<Json<Projected<UserList, UserDetail>>> {
    save_user(state, auth, method, user_id, WriteMode::Partial, payload).await
}

async fn save_user(
    state: AppState,
    auth: AuthContext,
    method: Method,
    user_id: i64,
    mode: WriteMode,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> ApiResult<Json<Projected<UserList, UserDetail>>> {
    // Checked against the path id, so another user's id is 403 whether or not it exists
    let ctx = AccessContext::unscoped(method).with_owner(user_id);
    evaluate(USER_POLICY, &auth, &ctx)?;

    let user = resolve_user(&state.db, user_id).await?;

    let Json(input) = payload?;
    mode.check(&input.presence())?;
    let update = input.into_update()?;
    let user = User::update(&state.db, user.id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(user_id = user.id, "User updated");

    Ok(Json(render_user(&user, &auth, Operation::Update)))
}
