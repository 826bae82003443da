//! Role and permission based access control for Postboard.
//!
//! This crate holds the whole access-control layer. It does no I/O apart from
//! reading its YAML configuration, so the HTTP server, the CLI and the tests
//! all run exactly the same rules.
//!
//! # Architecture Overview
//!
//! 1. **Configuration** ([`config`]) is loaded once at start-up
//! 2. The **role registry** ([`registry`]) is built and validated from it
//! 3. The **accessor** ([`accessor`]) turns a user's role assignments into an
//!    effective permission set and a [`types::Principal`]
//! 4. The **policy evaluator** ([`policy`]) combines ownership and permissions
//!    into an allow/deny [`types::AuthDecision`]
//! 5. The **route guard** ([`guard`]) and **permission guard** ([`ui`]) use the
//!    same role and permission data to gate navigation and rendering
//!
//! # Rules in one place
//!
//! - Effective permissions are the union of the user's roles' permissions.
//!   There are no per-user overrides.
//! - Creating needs the blanket `<kind>.create` permission.
//! - Updating or deleting a post or project needs ownership, and only
//!   ownership.
//! - Reading is left to authentication.
//! - A session whose role owns no section is a security anomaly and is logged
//!   out.

pub mod accessor;
pub mod config;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod permission;
pub mod policy;
pub mod registry;
pub mod types;
pub mod ui;

pub use accessor::{PermissionAccessor, RoleHolder, Subject};
pub use config::AuthzConfig;
pub use error::{AuthzError, Result};
pub use guard::{RouteDecision, RouteGuard, Section, SessionContext};
pub use permission::{Permission, PermissionSet};
pub use policy::{Abilities, Policy, PolicyEvaluator};
pub use registry::{Role, RoleDefinition, RoleRegistry, SeedReport};
pub use types::{Action, AuthDecision, Principal, Resource, ResourceKind};

use navigation::NavigationItem;

/// Everything needed to make access-control decisions, built once.
///
/// # Example
///
/// ```rust
/// use authz::{Action, AuthzEngine, Resource, ResourceKind, Subject};
///
/// let engine = AuthzEngine::with_defaults().unwrap();
/// let alice = engine.principal(&Subject::new(1, ["client"]));
/// let bobs_post = Resource::post(7, 2);
///
/// let decision = engine
///     .evaluate(&alice, Action::Update, ResourceKind::Post, Some(&bobs_post))
///     .unwrap();
/// assert!(!decision.allowed);
/// assert_eq!(decision.reason.as_deref(), Some("not owner of resource"));
/// ```
#[derive(Debug, Clone)]
pub struct AuthzEngine {
    registry: RoleRegistry,
    policies: PolicyEvaluator,
    guard: RouteGuard,
    navigation: Vec<NavigationItem>,
}

impl AuthzEngine {
    /// Builds the engine, validating every role definition.
    pub fn from_config(config: &AuthzConfig) -> Result<Self> {
        let registry = RoleRegistry::from_definitions(&config.roles)?;

        let mut sections = Vec::with_capacity(config.sections.len());
        for section in &config.sections {
            let section = section.clone().normalized();
            if !registry.contains(&section.role) {
                return Err(AuthzError::Configuration(format!(
                    "section {} belongs to unknown role '{}'",
                    section.root, section.role
                )));
            }
            section.validate()?;
            sections.push(section);
        }

        Ok(Self {
            registry,
            policies: PolicyEvaluator::new(),
            guard: RouteGuard::new(sections, config.login_path.clone()),
            navigation: config.navigation.clone(),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::from_config(&AuthzConfig::default())
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn accessor(&self) -> PermissionAccessor<'_> {
        PermissionAccessor::new(&self.registry)
    }

    pub fn policies(&self) -> &PolicyEvaluator {
        &self.policies
    }

    pub fn route_guard(&self) -> &RouteGuard {
        &self.guard
    }

    pub fn principal(&self, user: &impl RoleHolder) -> Principal {
        self.accessor().principal(user)
    }

    pub fn evaluate(
        &self,
        principal: &Principal,
        action: Action,
        kind: ResourceKind,
        resource: Option<&Resource>,
    ) -> Result<AuthDecision> {
        self.policies.evaluate(principal, action, kind, resource)
    }

    /// Like [`AuthzEngine::evaluate`] but a denial is an [`AuthzError::Denied`].
    pub fn authorize(
        &self,
        principal: &Principal,
        action: Action,
        kind: ResourceKind,
        resource: Option<&Resource>,
    ) -> Result<()> {
        self.policies.authorize(principal, action, kind, resource)
    }

    /// Session context for the route guard, from an optional principal.
    pub fn session_context(&self, principal: Option<&Principal>) -> SessionContext {
        match principal {
            Some(p) => SessionContext::authenticated(p.role.clone()),
            None => SessionContext::anonymous(),
        }
    }

    pub fn before_enter(&self, path: &str, principal: Option<&Principal>) -> RouteDecision {
        self.guard.before_enter(path, &self.session_context(principal))
    }

    /// Navigation menu visible to the principal's primary role.
    pub fn menu_for(&self, principal: &Principal) -> Vec<NavigationItem> {
        navigation::filter_for_role(&self.navigation, principal.role.as_deref())
    }
}
