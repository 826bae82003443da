//! Offline access-control checks against the configured rules.

use anyhow::{anyhow, Result};
use authz::{
    ui::{should_render, MatchMode, RequiredPermissions},
    Action, Permission, Resource, ResourceKind, RouteDecision, SessionContext, Subject,
};
use colored::*;
use serde_json::json;

use super::Format;
use crate::context::AppContext;

pub fn parse_action(value: &str) -> Result<Action> {
    match value {
        "create" => Ok(Action::Create),
        "read" => Ok(Action::Read),
        "update" => Ok(Action::Update),
        "delete" => Ok(Action::Delete),
        "manage" | "manage_roles" => Ok(Action::ManageRoles),
        other => Err(anyhow!("Unknown action '{}'", other)),
    }
}

pub fn parse_kind(value: &str) -> Result<ResourceKind> {
    match value {
        "post" => Ok(ResourceKind::Post),
        "project" => Ok(ResourceKind::Project),
        "user" => Ok(ResourceKind::User),
        other => Err(anyhow!("Unknown resource kind '{}'", other)),
    }
}

fn print(format: Format, value: &serde_json::Value, text: impl FnOnce()) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Yaml => println!("{}", serde_yaml::to_string(value)?),
        Format::Text => text(),
    }
    Ok(())
}

/// What the route guard does when a session with `role` enters `path`.
pub fn route(
    ctx: &AppContext,
    path: &str,
    role: Option<String>,
    anonymous: bool,
    format: Format,
) -> Result<()> {
    let session = if anonymous {
        SessionContext::anonymous()
    } else {
        SessionContext::authenticated(role)
    };
    let decision = ctx.engine.route_guard().before_enter(path, &session);

    print(format, &serde_json::to_value(&decision)?, || match &decision {
        RouteDecision::Allow => println!("{} {}", "ALLOW".green().bold(), path),
        RouteDecision::Redirect { to, redirect } => {
            print!("{} {} -> {}", "REDIRECT".yellow().bold(), path, to);
            match redirect {
                Some(back) => println!(" (then back to {})", back),
                None => println!(),
            }
        }
        RouteDecision::ForceLogout { to } => {
            println!("{} session terminated, -> {}", "FORCE LOGOUT".red().bold(), to)
        }
    })
}

/// Permission guard: would a fragment requiring `required` render for `roles`?
pub fn perms(
    ctx: &AppContext,
    roles: Vec<String>,
    required: Vec<String>,
    any: bool,
    format: Format,
) -> Result<()> {
    let required: Vec<Permission> = Permission::parse_all(&required)?.into_iter().collect();
    let subject = Subject::new(0, roles);
    let granted = ctx.engine.accessor().effective_permissions(&subject);

    let mode = if any { MatchMode::Any } else { MatchMode::All };
    let rendered = should_render(&RequiredPermissions::Many(required), mode, &granted);

    let value = json!({
        "roles": subject.roles,
        "permissions": authz::permission::names(&granted),
        "mode": mode,
        "render": rendered,
    });
    print(format, &value, || {
        let verdict = if rendered {
            "RENDER".green().bold()
        } else {
            "HIDDEN".red().bold()
        };
        println!("{} for roles [{}]", verdict, subject.roles.join(", "));
        println!(
            "Effective permissions: {}",
            authz::permission::names(&granted).join(", ")
        );
    })
}

/// Policy decision for one action, as the API would make it.
#[allow(clippy::too_many_arguments)]
pub fn policy(
    ctx: &AppContext,
    user_id: i64,
    roles: Vec<String>,
    action: &str,
    kind: &str,
    resource_id: Option<i64>,
    owner: Option<i64>,
    format: Format,
) -> Result<()> {
    let action = parse_action(action)?;
    let kind = parse_kind(kind)?;
    let principal = ctx.engine.principal(&Subject::new(user_id, roles));
    let resource = resource_id.map(|id| Resource::new(id, kind, owner));

    let decision = ctx
        .engine
        .evaluate(&principal, action, kind, resource.as_ref())?;

    print(format, &serde_json::to_value(&decision)?, || {
        if decision.allowed {
            println!("{} {} {}", "ALLOWED".green().bold(), action, kind);
        } else {
            println!(
                "{} {} {}: {}",
                "DENIED".red().bold(),
                action,
                kind,
                decision.reason.as_deref().unwrap_or("")
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_action() {
        assert_eq!(parse_action("update").unwrap(), Action::Update);
        assert_eq!(parse_action("manage").unwrap(), Action::ManageRoles);
        assert!(parse_action("publish").is_err());
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("project").unwrap(), ResourceKind::Project);
        assert!(parse_kind("comment").is_err());
    }
}
