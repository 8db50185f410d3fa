/// Authentication endpoints
///
/// - `POST /signup/` - create an account
/// - `POST /login/` - exchange credentials for an access/refresh pair
/// - `POST /refresh/` - exchange a refresh token for a new access token

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    projection::{render_user, Operation, Projected, UserDetail, UserList},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use softdesk_shared::{
    auth::{
        jwt::{self, TokenPair},
        middleware::AuthContext,
        password::{self, UserAttributes},
    },
    models::user::{CreateUser, User},
};
use validator::Validate;

const INVALID_CREDENTIALS: &str = "No active account found with the given credentials";

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub username: String,

    pub password: String,

    /// Confirmation, must equal `password`; never stored
    pub password2: String,

    #[validate(range(min = 15, message = "User must be at least 15 years old."))]
    pub age: i32,

    #[serde(default)]
    pub can_be_contacted: bool,

    #[serde(default)]
    pub can_data_be_shared: bool,

    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    pub last_name: String,
}

impl SignupRequest {
    /// Runs every signup rule and reports all failures together
    pub fn check(&self) -> ApiResult<()> {
        let mut details = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => match ApiError::from(errors) {
                ApiError::ValidationError(details) => details,
                other => return Err(other),
            },
        };

        if self.username.is_empty() {
            details.push(ValidationErrorDetail::new("username", "This field may not be blank."));
        } else if !is_valid_username(&self.username) {
            details.push(ValidationErrorDetail::new(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            ));
        }

        if self.password != self.password2 {
            details.push(ValidationErrorDetail::new(
                "password",
                "Password fields didn't match.",
            ));
        }

        let attrs = UserAttributes {
            username: &self.username,
            email: self.email.as_deref(),
            first_name: &self.first_name,
            last_name: &self.last_name,
        };
        if let Err(messages) = password::validate_password(&self.password, &attrs) {
            details.extend(
                messages
                    .into_iter()
                    .map(|message| ValidationErrorDetail::new("password", message)),
            );
        }

        if details.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationError(details))
        }
    }
}

/// Letters, digits and `@ . + - _`
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Refresh token request
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Refresh token response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
}

/// Creates an account
///
/// ```text
/// POST /signup/
///
/// {
///   "username": "ada",
///   "password": "orbital-rendezvous",
///   "password2": "orbital-rendezvous",
///   "age": 36,
///   "can_be_contacted": true,
///   "can_data_be_shared": false,
///   "email": "ada@example.com"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: a field failed validation, passwords differ, age
///   below 15, or the username is taken
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Projected<UserList, UserDetail>>)> {
    let Json(mut req) = payload?;
    req.email = req.email.filter(|email| !email.trim().is_empty());
    req.check()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            password_hash,
            age: req.age,
            can_be_contacted: req.can_be_contacted,
            can_data_be_shared: req.can_data_be_shared,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User signed up");

    let viewer = AuthContext::new(user.id, user.is_superuser);
    Ok((
        StatusCode::CREATED,
        Json(render_user(&user, &viewer, Operation::Create)),
    ))
}

/// Authenticates with username and password
///
/// ```text
/// POST /login/
///
/// { "username": "ada", "password": "orbital-rendezvous" }
/// ```
///
/// Response: `{ "access": "eyJ...", "refresh": "eyJ..." }`
///
/// # Errors
///
/// - `401 Unauthorized`: unknown username or wrong password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<TokenPair>> {
    let Json(req) = payload?;

    let user = User::find_by_username(&state.db, &req.username)
        .await?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        tracing::debug!(user_id = user.id, "Login rejected");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    User::update_last_login(&state.db, user.id).await?;

    let tokens = jwt::issue_token_pair(
        user.id,
        user.is_superuser,
        state.jwt_secret(),
        &state.token_lifetimes(),
    )?;

    Ok(Json(tokens))
}

/// Exchanges a refresh token for a new access token
///
/// ```text
/// POST /refresh/
///
/// { "refresh": "eyJ..." }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: invalid, expired, or not a refresh token
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<RefreshResponse>> {
    let Json(req) = payload?;

    let access =
        jwt::refresh_access_token(&req.refresh, state.jwt_secret(), &state.token_lifetimes())?;

    Ok(Json(RefreshResponse { access }))
}
