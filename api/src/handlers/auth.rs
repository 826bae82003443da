//! Session login, logout and the current-user payload.

use axum::{extract::State, response::Json, Extension};
use tower_sessions::Session;
use tracing::{debug, info};

use crate::{
    error::{ApiError, ApiResult},
    extract::ApiJson,
    models::{ApiResponse, CurrentUserResponse, LoginRequest, UserPayload},
    password::verify_password,
    session::{CurrentUser, SessionKeys},
    AppState,
};

const BAD_CREDENTIALS: &str = "These credentials do not match our records.";

/// Log in with email and password
/// POST /api/v1/auth/login
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; the session cookie is set", body = CurrentUserResponse),
        (status = 422, description = "Missing fields or bad credentials", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<CurrentUserResponse>>> {
    let (email, password) = req.validate()?;
    debug!("Login attempt for {}", email);

    let user = match state.db.find_user_by_email(&email).await? {
        Some(user) if verify_password(&password, &user.password_hash) => user,
        _ => {
            info!("Failed login for {}", email);
            return Err(ApiError::invalid("email", BAD_CREDENTIALS));
        }
    };

    // New id for the authenticated session.
    session.cycle_id().await?;
    session.insert(SessionKeys::USER_ID, user.id).await?;

    let current = CurrentUser::from_session(&session, &state)
        .await?
        .ok_or(ApiError::Unauthorized)?;
    info!("User {} logged in", user.id);

    Ok(Json(ApiResponse::ok(
        "Logged in successfully",
        CurrentUserResponse {
            user: UserPayload::new(&current.user, &current.principal),
        },
    )))
}

/// Logout endpoint
/// POST /api/v1/auth/logout
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses((status = 200, description = "Session flushed")),
    tag = "auth"
)]
pub async fn logout(Extension(session): Extension<Session>) -> ApiResult<Json<ApiResponse<()>>> {
    if let Some(id) = session.get::<i64>(SessionKeys::USER_ID).await? {
        info!("User {} logged out", id);
    }
    session.flush().await?;

    Ok(Json(ApiResponse::ok("Logged out successfully", ())))
}

/// The authenticated user with role and permissions
/// GET /api/v1/user
#[utoipa::path(
    get,
    path = "/api/v1/user",
    responses(
        (status = 200, description = "Current user", body = CurrentUserResponse),
        (status = 401, description = "No session", body = ApiErrorResponse)
    ),
    tag = "auth"
)]
pub async fn current_user(current: CurrentUser) -> ApiResult<Json<ApiResponse<CurrentUserResponse>>> {
    Ok(Json(ApiResponse::ok(
        "Current user",
        CurrentUserResponse {
            user: UserPayload::new(&current.user, &current.principal),
        },
    )))
}
