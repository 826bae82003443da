//! Post CRUD. Creation needs `post.create`; update and delete need ownership.

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
    models::{ApiResponse, PostRequest, PostView},
    session::CurrentUser,
    AppState,
};

async fn load(state: &AppState, id: i64) -> ApiResult<database::Post> {
    state
        .db
        .get_post(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("post {}", id)))
}

fn view(state: &AppState, current: &CurrentUser, post: database::Post) -> ApiResult<PostView> {
    let can = state
        .authz
        .policies()
        .abilities(&current.principal, &post.resource())?;
    Ok(PostView { post, can })
}

/// List posts, newest first
/// GET /api/v1/posts
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    responses(
        (status = 200, description = "Posts with the caller's abilities on each"),
        (status = 401, description = "No session", body = ApiErrorResponse)
    ),
    tag = "posts"
)]
pub async fn list_posts(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<ApiResponse<Vec<PostView>>>> {
    state
        .authz
        .authorize(&current.principal, Action::Read, ResourceKind::Post, None)?;

    let posts = state
        .db
        .list_posts()
        .await?
        .into_iter()
        .map(|post| view(&state, &current, post))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(Json(ApiResponse::ok("Posts retrieved successfully", posts)))
}

/// GET /api/v1/posts/{id}
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post"),
        (status = 404, description = "No such post", body = ApiErrorResponse)
    ),
    tag = "posts"
)]
pub async fn show_post(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ApiResponse<PostView>>> {
    let post = load(&state, id).await?;
    state.authz.authorize(
        &current.principal,
        Action::Read,
        ResourceKind::Post,
        Some(&post.resource()),
    )?;

    Ok(Json(ApiResponse::ok(
        "Post retrieved successfully",
        view(&state, &current, post)?,
    )))
}

/// POST /api/v1/posts
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = PostRequest,
    responses(
        (status = 201, description = "Post created"),
        (status = 403, description = "Missing post.create", body = ApiErrorResponse),
        (status = 422, description = "Validation failed", body = ApiErrorResponse)
    ),
    tag = "posts"
)]
pub async fn create_post(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<PostRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PostView>>)> {
    state
        .authz
        .authorize(&current.principal, Action::Create, ResourceKind::Post, None)?;
    let input = req.validate()?;

    let post = state.db.create_post(current.principal.id, &input).await?;
    info!("Post {} created by user {}", post.id, current.principal.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            "Post created successfully",
            view(&state, &current, post)?,
        )),
    ))
}

/// PUT /api/v1/posts/{id}
#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    request_body = PostRequest,
    responses(
        (status = 200, description = "Post updated"),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "No such post", body = ApiErrorResponse),
        (status = 422, description = "Validation failed", body = ApiErrorResponse)
    ),
    tag = "posts"
)]
pub async fn update_post(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(req): ApiJson<PostRequest>,
) -> ApiResult<Json<ApiResponse<PostView>>> {
    let post = load(&state, id).await?;
    state.authz.authorize(
        &current.principal,
        Action::Update,
        ResourceKind::Post,
        Some(&post.resource()),
    )?;
    let input = req.validate()?;

    let post = state.db.update_post(id, &input).await?;
    info!("Post {} updated by user {}", id, current.principal.id);

    Ok(Json(ApiResponse::ok(
        "Post updated successfully",
        view(&state, &current, post)?,
    )))
}

/// DELETE /api/v1/posts/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = i64, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post deleted"),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "No such post", body = ApiErrorResponse)
    ),
    tag = "posts"
)]
pub async fn delete_post(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let post = load(&state, id).await?;
    state.authz.authorize(
        &current.principal,
        Action::Delete,
        ResourceKind::Post,
        Some(&post.resource()),
    )?;

    state.db.delete_post(id).await?;
    info!("Post {} deleted by user {}", id, current.principal.id);

    Ok(Json(ApiResponse::ok("Post deleted successfully", ())))
}
