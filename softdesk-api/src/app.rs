/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use softdesk_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let app = build_router(AppState::new(pool, config));
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use softdesk_shared::auth::{jwt::TokenLifetimes, middleware::authenticate};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }

    pub fn token_lifetimes(&self) -> TokenLifetimes {
        self.config.jwt.lifetimes()
    }
}

/// Builds the complete router with all routes and middleware
///
/// ```text
/// /
/// ├── GET  /health
/// ├── POST /signup/                       (public)
/// ├── POST /login/                        (public)
/// ├── POST /refresh/                      (public)
/// ├── /users/                             GET
/// │   └── /{id}/                          GET PUT PATCH
/// └── /projects/                          GET POST
///     └── /{project_id}/                  GET PUT PATCH DELETE
///         ├── /contributors/              GET POST
///         │   └── /{id}/                  GET DELETE
///         └── /issues/                    GET POST
///             └── /{issue_id}/            GET PUT PATCH DELETE
///                 └── /comments/          GET POST
///                     └── /{id}/          GET PUT PATCH DELETE
/// ```
///
/// Every route except health and the three auth endpoints requires a Bearer
/// access token. Verbs a route does not support answer 405.
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/signup/",
            post(routes::auth::signup).fallback(routes::method_not_allowed),
        )
        .route(
            "/login/",
            post(routes::auth::login).fallback(routes::method_not_allowed),
        )
        .route(
            "/refresh/",
            post(routes::auth::refresh).fallback(routes::method_not_allowed),
        );

    let user_routes = Router::new()
        .route(
            "/users/",
            get(routes::users::list_users).fallback(routes::method_not_allowed),
        )
        .route(
            "/users/:user_id/",
            get(routes::users::get_user)
                .put(routes::users::replace_user)
                .patch(routes::users::update_user)
                .fallback(routes::method_not_allowed),
        );

    let project_routes = Router::new()
        .route(
            "/projects/",
            get(routes::projects::list_projects)
                .post(routes::projects::create_project)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/projects/:project_id/",
            get(routes::projects::get_project)
                .put(routes::projects::replace_project)
                .patch(routes::projects::update_project)
                .delete(routes::projects::delete_project)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/projects/:project_id/contributors/",
            get(routes::contributors::list_contributors)
                .post(routes::contributors::add_contributor)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/projects/:project_id/contributors/:contributor_id/",
            get(routes::contributors::get_contributor)
                .delete(routes::contributors::remove_contributor)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/projects/:project_id/issues/",
            get(routes::issues::list_issues)
                .post(routes::issues::create_issue)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/projects/:project_id/issues/:issue_id/",
            get(routes::issues::get_issue)
                .put(routes::issues::replace_issue)
                .patch(routes::issues::update_issue)
                .delete(routes::issues::delete_issue)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/projects/:project_id/issues/:issue_id/comments/",
            get(routes::comments::list_comments)
                .post(routes::comments::create_comment)
                .fallback(routes::method_not_allowed),
        )
        .route(
            "/projects/:project_id/issues/:issue_id/comments/:comment_id/",
            get(routes::comments::get_comment)
                .put(routes::comments::replace_comment)
                .patch(routes::comments::update_comment)
                .delete(routes::comments::delete_comment)
                .fallback(routes::method_not_allowed),
        );

    let protected_routes = Router::new()
        .merge(user_routes)
        .merge(project_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), jwt_auth_layer));

    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Validates the Bearer token and injects the caller's `AuthContext`
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;

    tracing::debug!(user_id = auth_context.user_id, "Authenticated request");
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
