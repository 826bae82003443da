//! Project CRUD, under the same rules as posts.

use authz::{Action, ResourceKind};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
    models::{ApiResponse, ProjectRequest, ProjectView},
    session::CurrentUser,
    AppState,
};

async fn load(state: &AppState, id: i64) -> ApiResult<database::Project> {
    state
        .db
        .get_project(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("project {}", id)))
}

fn view(
    state: &AppState,
    current: &CurrentUser,
    project: database::Project,
) -> ApiResult<ProjectView> {
    let can = state
        .authz
        .policies()
        .abilities(&current.principal, &project.resource())?;
    Ok(ProjectView { project, can })
}

/// GET /api/v1/projects
#[utoipa::path(
    get,
    path = "/api/v1/projects",
    responses(
        (status = 200, description = "Projects with the caller's abilities on each"),
        (status = 401, description = "No session", body = ApiErrorResponse)
    ),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<ProjectView>>>> {
    state
        .authz
        .authorize(&current.principal, Action::Read, ResourceKind::Project, None)?;

    let projects = state
        .db
        .list_projects()
        .await?
        .into_iter()
        .map(|project| view(&state, &current, project))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(ApiResponse::ok(
        "Projects retrieved successfully",
        projects,
    )))
}

/// GET /api/v1/projects/{id}
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    params(("id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "The project"),
        (status = 404, description = "No such project", body = ApiErrorResponse)
    ),
    tag = "projects"
)]
pub async fn show_project(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ApiResponse<ProjectView>>> {
    let project = load(&state, id).await?;
    state.authz.authorize(
        &current.principal,
        Action::Read,
        ResourceKind::Project,
        Some(&project.resource()),
    )?;

    Ok(Json(ApiResponse::ok(
        "Project retrieved successfully",
        view(&state, &current, project)?,
    )))
}

/// POST /api/v1/projects
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    request_body = ProjectRequest,
    responses(
        (status = 201, description = "Project created"),
        (status = 403, description = "Missing project.create", body = ApiErrorResponse),
        (status = 422, description = "Validation failed", body = ApiErrorResponse)
    ),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<ProjectRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ProjectView>>)> {
    state.authz.authorize(
        &current.principal,
        Action::Create,
        ResourceKind::Project,
        None,
    )?;
    let input = req.validate()?;

    let project = state.db.create_project(current.principal.id, &input).await?;
    info!(
        "Project {} created by user {}",
        project.id, current.principal.id
    );

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Project created successfully",
            view(&state, &current, project)?,
        )),
    ))
}

/// PUT /api/v1/projects/{id}
#[utoipa::path(
    put,
    path = "/api/v1/projects/{id}",
    params(("id" = i64, Path, description = "Project id")),
    request_body = ProjectRequest,
    responses(
        (status = 200, description = "Project updated"),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "No such project", body = ApiErrorResponse),
        (status = 422, description = "Validation failed", body = ApiErrorResponse)
    ),
    tag = "projects"
)]
pub async fn update_project(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<ProjectRequest>,
) -> ApiResult<Json<ApiResponse<ProjectView>>> {
    let project = load(&state, id).await?;
    state.authz.authorize(
        &current.principal,
        Action::Update,
        ResourceKind::Project,
        Some(&project.resource()),
    )?;
    let input = req.validate()?;

    let project = state.db.update_project(id, &input).await?;
    info!("Project {} updated by user {}", id, current.principal.id);

    Ok(Json(ApiResponse::ok(
        "Project updated successfully",
        view(&state, &current, project)?,
    )))
}

/// DELETE /api/v1/projects/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/projects/{id}",
    params(("id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted"),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "No such project", body = ApiErrorResponse)
    ),
    tag = "projects"
)]
pub async fn delete_project(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let project = load(&state, id).await?;
    state.authz.authorize(
        &current.principal,
        Action::Delete,
        ResourceKind::Project,
        Some(&project.resource()),
    )?;

    state.db.delete_project(id).await?;
    info!("Project {} deleted by user {}", id, current.principal.id);

    Ok(Json(ApiResponse::ok("Project deleted successfully", ())))
}
