/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use boardwalk_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, None, config);
/// let app = boardwalk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```
use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use boardwalk_shared::auth::identity;
use boardwalk_shared::notify::Notifier;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Notification sink; None when REDIS_URL is unset
    pub notifier: Option<Notifier>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, notifier: Option<Notifier>, config: Config) -> Self {
        Self {
            db,
            notifier,
            config: Arc::new(config),
        }
    }

    /// Gets the JWT secret for token validation
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                                  # Health check (public)
/// ├── /projects                                # Project lifecycle + membership (authenticated)
/// │   ├── POST /            GET /              # Create, list mine
/// │   ├── GET  /public                         # Public listing
/// │   ├── GET/PUT/DELETE /:id                  # Read, update, soft-delete
/// │   ├── PUT  /:id/archive
/// │   ├── POST/GET /:id/members                # Add, list members
/// │   ├── DELETE /:id/members/:user_id
/// │   ├── PUT  /:id/members/:user_id/role
/// │   └── POST/GET /:id/labels
/// └── /issues                                  # Board engine (authenticated)
///     ├── POST /            GET /:id
///     ├── GET  /assigned    /reported    /due-soon
///     ├── PUT  /:id         DELETE /:id
///     ├── PUT  /:id/status  /:id/assign
///     ├── POST/GET /:id/subtasks
///     ├── GET  /project/:project_id            # Paged/filtered/searched
///     ├── GET  /project/:project_id/kanban
///     └── PUT  /project/:project_id/reorder
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (all routes except /health)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Project lifecycle, membership directory, labels
    let project_routes = Router::new()
        .route(
            "/",
            post(routes::projects::create_project).get(routes::projects::list_projects),
        )
        .route("/public", get(routes::projects::list_public_projects))
        .route(
            "/:id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route("/:id/archive", put(routes::projects::archive_project))
        .route(
            "/:id/members",
            post(routes::projects::add_member).get(routes::projects::list_members),
        )
        .route(
            "/:id/members/:user_id",
            delete(routes::projects::remove_member),
        )
        .route(
            "/:id/members/:user_id/role",
            put(routes::projects::update_member_role),
        )
        .route(
            "/:id/labels",
            post(routes::projects::create_label).get(routes::projects::list_labels),
        );

    // Issue board engine
    let issue_routes = Router::new()
        .route("/", post(routes::issues::create_issue))
        .route("/assigned", get(routes::issues::list_assigned))
        .route("/reported", get(routes::issues::list_reported))
        .route("/due-soon", get(routes::issues::list_due_soon))
        .route(
            "/:id",
            get(routes::issues::get_issue)
                .put(routes::issues::update_issue)
                .delete(routes::issues::delete_issue),
        )
        .route("/:id/status", put(routes::issues::update_status))
        .route("/:id/assign", put(routes::issues::assign_issue))
        .route(
            "/:id/subtasks",
            post(routes::issues::create_subtask).get(routes::issues::list_subtasks),
        )
        .route(
            "/project/:project_id",
            get(routes::issues::list_project_issues),
        )
        .route("/project/:project_id/kanban", get(routes::issues::kanban))
        .route(
            "/project/:project_id/reorder",
            put(routes::issues::reorder_issues),
        );

    // Every route except /health requires a resolved caller identity
    let authenticated = Router::new()
        .nest("/projects", project_routes)
        .nest("/issues", issue_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
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
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .merge(authenticated)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Identity middleware layer
///
/// Resolves the Bearer token from the Authorization header to a user id and
/// injects `AuthUser` into request extensions. This is the Identity Provider
/// collaborator boundary: tokens are only validated here, never issued.
async fn auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth_user = identity::resolve_bearer(auth_header, state.jwt_secret())?;

    req.extensions_mut().insert(auth_user);

    Ok(next.run(req).await)
}
