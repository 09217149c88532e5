//! # Access Guard
//!
//! Coarse, route-level role gate. Each operation category carries an
//! allow-list and the caller's role must appear in it. Admin is not
//! implicitly granted anything here; the allow-lists name it explicitly.
//! Per-record ownership is a separate gate, see [`crate::mediator`].

use domains::{Actor, DomainError, Result, Role};
use tracing::warn;

/// Operation categories exposed to the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteScope {
    /// `/admin/...`
    Admin,
    /// `/agent/...`
    Agent,
    /// `/customer/...`
    Customer,
}

impl RouteScope {
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            RouteScope::Admin => &[Role::Admin],
            RouteScope::Agent => &[Role::Admin, Role::Agent],
            RouteScope::Customer => &[Role::Admin, Role::Agent, Role::Customer],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RouteScope::Admin => "admin",
            RouteScope::Agent => "agent",
            RouteScope::Customer => "customer",
        }
    }
}

/// Fails with `Forbidden` when `actor.role` is absent from `required`.
pub fn authorize(actor: &Actor, required: &[Role]) -> Result<()> {
    if required.contains(&actor.role) {
        return Ok(());
    }
    warn!(
        actor_id = %actor.id,
        role = %actor.role,
        "role gate denied access"
    );
    Err(DomainError::forbidden(format!(
        "role {} may not perform this operation",
        actor.role
    )))
}

/// Convenience wrapper for [`authorize`] over a [`RouteScope`].
pub fn authorize_scope(actor: &Actor, scope: RouteScope) -> Result<()> {
    authorize(actor, scope.allowed_roles())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor::new(1, role)
    }

    #[test]
    fn admin_scope_admits_only_admin() {
        assert!(authorize_scope(&actor(Role::Admin), RouteScope::Admin).is_ok());
        assert!(matches!(
            authorize_scope(&actor(Role::Agent), RouteScope::Admin),
            Err(DomainError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_scope(&actor(Role::Customer), RouteScope::Admin),
            Err(DomainError::Forbidden(_))
        ));
    }

    #[test]
    fn agent_scope_admits_admin_and_agent() {
        assert!(authorize_scope(&actor(Role::Admin), RouteScope::Agent).is_ok());
        assert!(authorize_scope(&actor(Role::Agent), RouteScope::Agent).is_ok());
        assert!(authorize_scope(&actor(Role::Customer), RouteScope::Agent).is_err());
    }

    #[test]
    fn customer_scope_admits_everyone() {
        for role in Role::ALL {
            assert!(authorize_scope(&actor(role), RouteScope::Customer).is_ok());
        }
    }

    #[test]
    fn admin_is_not_implicitly_admitted_to_unlisted_sets() {
        let agents_only = [Role::Agent];
        assert!(authorize(&actor(Role::Admin), &agents_only).is_err());
        assert!(authorize(&actor(Role::Agent), &agents_only).is_ok());
    }

    #[test]
    fn empty_allow_list_denies_all() {
        for role in Role::ALL {
            assert!(authorize(&actor(role), &[]).is_err());
        }
    }
}
