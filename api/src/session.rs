//! Session-backed authentication.
//!
//! The session only stores the user id. Roles and permissions are read from
//! the database on every request, so a role change applies on the next call.

use authz::Principal;
use axum::{extract::FromRequestParts, http::request::Parts, Extension};
use database::UserWithRoles;
use tower_sessions::Session;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Session keys used for storing data
pub struct SessionKeys;

impl SessionKeys {
    pub const USER_ID: &'static str = "user_id";
}

/// The authenticated user behind the request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: UserWithRoles,
    pub principal: Principal,
}

impl CurrentUser {
    /// Resolves the session's user, if any.
    ///
    /// A session pointing at a deleted user is flushed.
    pub async fn from_session(session: &Session, state: &AppState) -> ApiResult<Option<Self>> {
        let Some(user_id) = session.get::<i64>(SessionKeys::USER_ID).await? else {
            return Ok(None);
        };

        let Some(user) = state.db.user_with_roles(user_id).await? else {
            warn!("Session refers to missing user {}, flushing", user_id);
            session.flush().await?;
            return Ok(None);
        };

        let principal = state.authz.principal(&user);
        debug!(
            "Resolved user {} with role {:?}",
            principal.id, principal.role
        );
        Ok(Some(Self { user, principal }))
    }
}

pub async fn session_from_parts(parts: &mut Parts, state: &AppState) -> ApiResult<Session> {
    let Extension(session): Extension<Session> = Extension::from_request_parts(parts, state)
        .await
        .map_err(|_| ApiError::InternalError("session layer missing".to_string()))?;
    Ok(session)
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await?;
        CurrentUser::from_session(&session, state)
            .await?
            .ok_or(ApiError::Unauthorized)
    }
}
