use authz::{Action, Resource, ResourceKind};
use axum::{
    extract::State,
    Json,
};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    models::{ApiResponse, AssignRolesRequest, UserPayload},
    session::CurrentUser,
    AppState,
};

/// Replace a user's roles
/// PUT /api/v1/users/{id}/roles
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/roles",
    params(("id" = i64, Path, description = "User id")),
    request_body = AssignRolesRequest,
    responses(
        (status = 200, description = "Roles replaced", body = UserPayload),
        (status = 403, description = "Missing user.manage", body = ApiErrorResponse),
        (status = 404, description = "No such user", body = ApiErrorResponse),
        (status = 422, description = "Unknown role", body = ApiErrorResponse)
    ),
    tag = "users"
)]
pub async fn assign_roles(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<AssignRolesRequest>,
) -> ApiResult<Json<ApiResponse<UserPayload>>> {
    state.authz.authorize(
        &current.principal,
        Action::ManageRoles,
        ResourceKind::User,
        Some(&Resource::user(id)),
    )?;
    state.authz.registry().ensure_known(&req.roles)?;

    let roles = state.db.sync_roles(id, &req.roles).await?;
    info!(
        "User {} set roles of user {} to {:?}",
        current.principal.id, id, roles
    );

    let target = state
        .db
        .user_with_roles(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {}", id)))?;
    let principal = state.authz.principal(&target);

    Ok(Json(ApiResponse::ok(
        "Roles updated successfully",
        UserPayload::new(&target, &principal),
    )))
}
