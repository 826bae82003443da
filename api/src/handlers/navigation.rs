//! Front-end navigation support: route guard decisions and menus.

use authz::{navigation::NavigationItem, RouteDecision};
use axum::{
    extract::State,
    Extension, Json,
};
use tower_sessions::Session;
use tracing::warn;

use crate::{
    error::ApiResult,
    extract::ApiQuery,
    models::{ApiResponse, NavigationQuery},
    session::CurrentUser,
    AppState,
};

/// Ask the route guard about a navigation
/// GET /api/v1/navigation/check?path=
///
/// A `force_logout` decision also ends the session here.
#[utoipa::path(
    get,
    path = "/api/v1/navigation/check",
    params(("path" = String, Query, description = "Front-end path being entered")),
    responses((status = 200, description = "allow, redirect or force_logout")),
    tag = "navigation"
)]
pub async fn check_navigation(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    ApiQuery(query): ApiQuery<NavigationQuery>,
) -> ApiResult<Json<ApiResponse<RouteDecision>>> {
    let current = CurrentUser::from_session(&session, &state).await?;
    let decision = state
        .authz
        .before_enter(&query.path, current.as_ref().map(|c| &c.principal));

    if let RouteDecision::ForceLogout { .. } = decision {
        if let Some(current) = &current {
            warn!(
                "Terminating session of user {} after navigation to {}",
                current.principal.id, query.path
            );
        }
        session.flush().await?;
    }

    Ok(Json(ApiResponse::ok("Navigation checked", decision)))
}

/// GET /api/v1/navigation/menu
#[utoipa::path(
    get,
    path = "/api/v1/navigation/menu",
    responses((status = 200, description = "Menu items visible to the caller's role")),
    tag = "navigation"
)]
pub async fn menu(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<NavigationItem>>>> {
    Ok(Json(ApiResponse::ok(
        "Menu retrieved successfully",
        state.authz.menu_for(&current.principal),
    )))
}
