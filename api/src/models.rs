use authz::{Abilities, Principal};
use chrono::{DateTime, Utc};
use database::{Post, PostInput, Project, ProjectInput, UserWithRoles};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiResult, FieldErrors};

/// Success envelope: `{success: true, message, data}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// The user payload handed to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserPayload {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl UserPayload {
    pub fn new(user: &UserWithRoles, principal: &Principal) -> Self {
        Self {
            id: user.user.id,
            name: user.user.name.clone(),
            email: user.user.email.clone(),
            role: principal.role.clone(),
            roles: principal.roles.clone(),
            permissions: authz::permission::names(&principal.permissions),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CurrentUserResponse {
    pub user: UserPayload,
}

/// A post plus what the current user may do with it.
#[derive(Debug, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub can: Abilities,
}

#[derive(Debug, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub can: Abilities,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PostRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRolesRequest {
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct NavigationQuery {
    pub path: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub message: String,
}

/// Collects field errors in the order rules are checked.
#[derive(Debug, Default)]
struct Validator {
    errors: FieldErrors,
}

impl Validator {
    fn fail(&mut self, field: &str, message: String) {
        self.errors.entry(field.to_string()).or_default().push(message);
    }

    /// Trimmed value; blank counts as missing.
    fn required(&mut self, field: &str, value: &Option<String>, max: usize) -> String {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => {
                self.max(field, v, max);
                v.to_string()
            }
            _ => {
                self.fail(field, format!("The {} field is required.", field));
                String::new()
            }
        }
    }

    fn optional(&mut self, field: &str, value: &Option<String>, max: usize) -> Option<String> {
        let v = value.as_deref().map(str::trim).filter(|v| !v.is_empty())?;
        self.max(field, v, max);
        Some(v.to_string())
    }

    fn max(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.fail(
                field,
                format!(
                    "The {} field must not be greater than {} characters.",
                    field, max
                ),
            );
        }
    }

    fn finish<T>(self, value: T) -> ApiResult<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

pub const TITLE_MAX: usize = 255;
pub const POST_DESCRIPTION_MAX: usize = 500;
pub const NAME_MAX: usize = 255;
pub const PROJECT_DESCRIPTION_MAX: usize = 1000;

impl PostRequest {
    pub fn validate(&self) -> ApiResult<PostInput> {
        let mut v = Validator::default();
        let title = v.required("title", &self.title, TITLE_MAX);
        let description = v.required("description", &self.description, POST_DESCRIPTION_MAX);
        v.finish(PostInput { title, description })
    }
}

impl ProjectRequest {
    pub fn validate(&self) -> ApiResult<ProjectInput> {
        let mut v = Validator::default();
        let name = v.required("name", &self.name, NAME_MAX);
        let description = v.optional("description", &self.description, PROJECT_DESCRIPTION_MAX);
        v.finish(ProjectInput { name, description })
    }
}

impl LoginRequest {
    /// Returns `(email, password)`.
    pub fn validate(&self) -> ApiResult<(String, String)> {
        let mut v = Validator::default();
        let email = v.required("email", &self.email, 255);
        let password = match self.password.as_deref() {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => {
                v.fail("password", "The password field is required.".to_string());
                String::new()
            }
        };
        v.finish((email, password))
    }
}
