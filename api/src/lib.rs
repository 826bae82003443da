use authz::AuthzEngine;
use axum::{
    http::Uri,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use database::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{
    cookie::{time::Duration, SameSite},
    Expiry, SessionManagerLayer,
};
use tower_sessions_sqlx_store::SqliteStore;
use utoipa::OpenApi;

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware_hooks;
pub mod models;
pub mod password;
pub mod server;
pub mod session;


// Re-export server functions for convenience
pub use server::{start_server, start_server_with_config, ApiConfig};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub authz: Arc<AuthzEngine>,
}

impl AppState {
    pub fn new(db: Arc<Database>, authz: Arc<AuthzEngine>) -> Self {
        Self { db, authz }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::current_user,
        handlers::posts::list_posts,
        handlers::posts::show_post,
        handlers::posts::create_post,
        handlers::posts::update_post,
        handlers::posts::delete_post,
        handlers::projects::list_projects,
        handlers::projects::show_project,
        handlers::projects::create_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::users::assign_roles,
        handlers::navigation::check_navigation,
        handlers::navigation::menu,
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::LoginRequest,
            models::PostRequest,
            models::ProjectRequest,
            models::AssignRolesRequest,
            models::UserPayload,
            models::CurrentUserResponse,
            models::HealthResponse,
            models::DatabaseHealth,
            error::ApiErrorResponse,
        )
    ),
    tags(
        (name = "auth", description = "Session login and the current user"),
        (name = "posts", description = "Post CRUD"),
        (name = "projects", description = "Project CRUD"),
        (name = "users", description = "Role assignment"),
        (name = "navigation", description = "Route guard and menus"),
        (name = "health", description = "Health check endpoints"),
    ),
    info(
        title = "Postboard API",
        version = "1.0.0",
        description = "Role and permission gated posts and projects",
    ),
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn route_not_found(uri: Uri) -> error::ApiError {
    error::ApiError::NotFound(format!("route {}", uri.path()))
}

/// Sessions idle for longer than this are dropped.
pub const SESSION_IDLE_HOURS: i64 = 24;

/// Create the main API router with all routes and middleware
///
/// Sessions live in the `tower_sessions` table of the application database,
/// so they survive a restart.
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let store = SqliteStore::new(state.db.pool().clone());
    let sessions = SessionManagerLayer::new(store)
        .with_secure(config.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::hours(SESSION_IDLE_HOURS)));

    // API v1 routes
    let api_v1 = Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/user", get(handlers::auth::current_user))
        .route(
            "/posts",
            get(handlers::posts::list_posts).post(handlers::posts::create_post),
        )
        .route(
            "/posts/:id",
            get(handlers::posts::show_post)
                .put(handlers::posts::update_post)
                .delete(handlers::posts::delete_post),
        )
        .route(
            "/projects",
            get(handlers::projects::list_projects).post(handlers::projects::create_project),
        )
        .route(
            "/projects/:id",
            get(handlers::projects::show_project)
                .put(handlers::projects::update_project)
                .delete(handlers::projects::delete_project),
        )
        .route("/users/:id/roles", put(handlers::users::assign_roles))
        .route(
            "/navigation/check",
            get(handlers::navigation::check_navigation),
        )
        .route("/navigation/menu", get(handlers::navigation::menu))
        .route("/health", get(handlers::health::health_check))
        .route("/openapi.json", get(openapi_json));

    Router::new()
        .nest("/api/v1", api_v1)
        .fallback(route_not_found)
        .layer(middleware::from_fn(middleware_hooks::request_middleware))
        .layer(middleware::from_fn(middleware_hooks::response_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(sessions),
        )
        .with_state(state)
}
