//! Permission administration: the only component that mutates the grant
//! matrix. Every operation first passes the decision gate for the fixed
//! administrative capability, then acts; a failed check means the operation
//! body never runs. Mutations are attributed to the acting principal on the
//! affected rows.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppResult;
use crate::identity::Principal;
use crate::store::{Action, Category, GrantOutcome, Role, SharedStore};

use super::capability::caps;
use super::gate::{Authorizer, GrantGate};
use super::resolver::{self, RoleMatrix};

/// One (category, action) cell of the matrix, as submitted by the admin UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GrantPair {
    pub category_id: i64,
    pub action_id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoriesActions {
    pub categories: Vec<Category>,
    pub actions: Vec<Action>,
}

pub struct PermissionAdmin {
    store: SharedStore,
    gate: GrantGate,
}

impl PermissionAdmin {
    pub fn new(store: SharedStore) -> Self {
        let gate = GrantGate::new(store.clone());
        Self { store, gate }
    }

    pub fn list_roles(&self, actor: &Principal) -> AppResult<Vec<Role>> {
        self.gate.check(Some(actor), caps::PERMISSIONS_READ)?;
        Ok(self.store.0.read().list_roles())
    }

    /// Exhaustive matrix for one role, gated on the read side of the
    /// administrative capability.
    pub fn role_matrix(&self, actor: &Principal, role_id: i64) -> AppResult<RoleMatrix> {
        self.gate.check(Some(actor), caps::PERMISSIONS_READ)?;
        resolver::resolve_full(&self.store, role_id)
    }

    pub fn categories_and_actions(&self, actor: &Principal) -> AppResult<CategoriesActions> {
        self.gate.check(Some(actor), caps::PERMISSIONS_READ)?;
        let guard = self.store.0.read();
        Ok(CategoriesActions { categories: guard.list_categories(), actions: guard.list_actions() })
    }

    /// Atomic full replace of a role's grant set; returns the number of rows
    /// inserted. Not a merge: grants absent from `pairs` are gone afterwards.
    /// Aborts whole on a missing role or unknown pair id, leaving the
    /// previous grant set intact.
    pub fn replace_grants(&self, actor: &Principal, role_id: i64, pairs: &[GrantPair]) -> AppResult<usize> {
        self.gate.check(Some(actor), caps::PERMISSIONS_UPDATE)?;
        let flat: Vec<(i64, i64)> = pairs.iter().map(|p| (p.category_id, p.action_id)).collect();
        let count = self.store.0.write().replace_grants(role_id, &flat, &actor.user_id.to_string())?;
        info!(target: "tiffin::acl", "replace_grants role={} count={} actor={}", role_id, count, actor.user_id);
        Ok(count)
    }

    pub fn add_grant(&self, actor: &Principal, role_id: i64, category_id: i64, action_id: i64) -> AppResult<GrantOutcome> {
        self.gate.check(Some(actor), caps::PERMISSIONS_UPDATE)?;
        let outcome = self.store.0.write().add_grant(role_id, category_id, action_id, &actor.user_id.to_string())?;
        info!(target: "tiffin::acl", "add_grant role={} category={} action={} outcome={:?} actor={}",
            role_id, category_id, action_id, outcome, actor.user_id);
        Ok(outcome)
    }

    pub fn remove_grant(&self, actor: &Principal, role_id: i64, category_id: i64, action_id: i64) -> AppResult<()> {
        self.gate.check(Some(actor), caps::PERMISSIONS_UPDATE)?;
        self.store.0.write().remove_grant(role_id, category_id, action_id)?;
        info!(target: "tiffin::acl", "remove_grant role={} category={} action={} actor={}",
            role_id, category_id, action_id, actor.user_id);
        Ok(())
    }
}
