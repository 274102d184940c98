use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::identity::Principal;
use crate::store::SharedStore;

use super::capability::Capability;

/// Decision seam consulted ahead of every protected operation body.
/// Implementations are read-only: a check never mutates the store and a
/// denial always surfaces to the caller as a terminal error.
pub trait Authorizer: Send + Sync {
    fn check(&self, principal: Option<&Principal>, required: Capability) -> AppResult<()>;
}

/// Grant-backed gate over the entitlement store.
///
/// Allow iff a true RoleGrant row exists for the principal's role and the
/// required category/action keys. The gate does not consult the
/// category/action applicability links: a pair with no link simply has no
/// grant and denies, and an orphaned grant (pair never declared applicable)
/// is still honored if present.
#[derive(Clone)]
pub struct GrantGate {
    store: SharedStore,
}

impl GrantGate {
    pub fn new(store: SharedStore) -> Self { Self { store } }
}

impl Authorizer for GrantGate {
    fn check(&self, principal: Option<&Principal>, required: Capability) -> AppResult<()> {
        let Some(principal) = principal else {
            return Err(AppError::auth("unauthenticated", "User not authenticated"));
        };
        let Some(role_id) = principal.role_id else {
            return Err(AppError::auth("unauthenticated", "User not authenticated"));
        };
        let allowed = self.store.0.read().grant_exists(role_id, required.category, required.action);
        debug!(target: "tiffin::acl", "authorize user={} role={} required={} -> {}",
            principal.user_id, role_id, required, if allowed { "allow" } else { "deny" });
        if allowed {
            Ok(())
        } else {
            Err(AppError::missing_permission(required.category, required.action))
        }
    }
}
