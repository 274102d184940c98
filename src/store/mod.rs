//!
//! tiffin entitlement store
//! ------------------------
//! In-memory relational tables for the authorization reference data and the
//! role grant matrix. The layout mirrors the persisted schema: categories,
//! actions, category/action applicability links, roles, role grants, users
//! and country-partitioned restaurants.
//!
//! Key responsibilities:
//! - Uniqueness on the composite keys that keep the matrix consistent:
//!   (category_id, action_id) for links and (role_id, category_id, action_id)
//!   for grants, plus unique category/action/role keys and user emails.
//! - The decision-time query surface: `grant_exists` joined through
//!   category/action keys, `list_grants`, and the ordered reference listings.
//! - Row mutations with audit stamping, and the atomic bulk grant replace
//!   used by the administration surface.
//!
//! The public API centers around the `AclStore` type, wrapped in a
//! thread-safe `SharedStore` (`Arc<RwLock<AclStore>>`). A writer holds the
//! lock for the whole of `replace_grants`, so concurrent readers observe
//! either the complete old grant set or the complete new one, never a
//! half-replaced state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{AppError, AppResult};

pub mod schema;
pub use schema::{Action, Audit, Category, CategoryActionLink, Country, Restaurant, Role, RoleGrant, User};

/// Epoch milliseconds, the timestamp unit for all audit stamps.
pub fn now_ms() -> i64 { chrono::Utc::now().timestamp_millis() }

/// Outcome of an idempotent single-grant insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantOutcome {
    Added,
    AlreadyExists,
}

/// Core in-memory store for the authorization tables.
#[derive(Debug, Default)]
pub struct AclStore {
    next_id: i64,
    categories: BTreeMap<i64, Category>,
    actions: BTreeMap<i64, Action>,
    links: BTreeMap<(i64, i64), CategoryActionLink>,
    roles: BTreeMap<i64, Role>,
    grants: BTreeMap<(i64, i64, i64), RoleGrant>,
    users: BTreeMap<i64, User>,
    restaurants: BTreeMap<i64, Restaurant>,
}

impl AclStore {
    pub fn new() -> Self { Self::default() }

    fn alloc_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    // ---- reference data -------------------------------------------------

    pub fn create_category(&mut self, name: &str, key: &str, description: Option<&str>, actor: &str) -> AppResult<Category> {
        if self.categories.values().any(|c| c.category_key == key || c.name == name) {
            return Err(AppError::conflict("category_exists", format!("category '{}' already exists", key)));
        }
        let id = self.alloc_id();
        let cat = Category {
            id,
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
            category_key: key.to_string(),
            audit: Audit::new(actor, now_ms()),
        };
        self.categories.insert(id, cat.clone());
        Ok(cat)
    }

    pub fn create_action(&mut self, name: &str, key: &str, description: Option<&str>, actor: &str) -> AppResult<Action> {
        if self.actions.values().any(|a| a.action_key == key || a.name == name) {
            return Err(AppError::conflict("action_exists", format!("action '{}' already exists", key)));
        }
        let id = self.alloc_id();
        let act = Action {
            id,
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
            action_key: key.to_string(),
            audit: Audit::new(actor, now_ms()),
        };
        self.actions.insert(id, act.clone());
        Ok(act)
    }

    /// Declare an action applicable to a category. Applicability is advisory
    /// reference data for the administration matrix; the decision engine
    /// consults grant rows only.
    pub fn link_action(&mut self, category_id: i64, action_id: i64, actor: &str) -> AppResult<CategoryActionLink> {
        if !self.categories.contains_key(&category_id) {
            return Err(AppError::not_found("category_not_found", format!("category {} not found", category_id)));
        }
        if !self.actions.contains_key(&action_id) {
            return Err(AppError::not_found("action_not_found", format!("action {} not found", action_id)));
        }
        if self.links.contains_key(&(category_id, action_id)) {
            return Err(AppError::conflict("link_exists", format!("link ({}, {}) already exists", category_id, action_id)));
        }
        let id = self.alloc_id();
        let link = CategoryActionLink { id, category_id, action_id, audit: Audit::new(actor, now_ms()) };
        self.links.insert((category_id, action_id), link.clone());
        Ok(link)
    }

    pub fn create_role(&mut self, name: &str, description: Option<&str>, actor: &str) -> AppResult<Role> {
        if self.roles.values().any(|r| r.name == name) {
            return Err(AppError::conflict("role_exists", format!("role '{}' already exists", name)));
        }
        let id = self.alloc_id();
        let role = Role {
            id,
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
            audit: Audit::new(actor, now_ms()),
        };
        self.roles.insert(id, role.clone());
        Ok(role)
    }

    pub fn create_user(&mut self, name: &str, email: &str, password_hash: &str, role_id: i64, country: Option<Country>, actor: &str) -> AppResult<User> {
        if self.users.values().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(AppError::conflict("user_exists", "user with this email already exists"));
        }
        if !self.roles.contains_key(&role_id) {
            return Err(AppError::not_found("role_not_found", format!("role {} not found", role_id)));
        }
        let id = self.alloc_id();
        let user = User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role_id,
            country,
            audit: Audit::new(actor, now_ms()),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn create_restaurant(&mut self, name: &str, description: Option<&str>, address: &str, country: Country, actor: &str) -> AppResult<Restaurant> {
        let id = self.alloc_id();
        let r = Restaurant {
            id,
            name: name.to_string(),
            description: description.map(|s| s.to_string()),
            address: address.to_string(),
            country,
            is_active: true,
            audit: Audit::new(actor, now_ms()),
        };
        self.restaurants.insert(id, r.clone());
        Ok(r)
    }

    // ---- lookups --------------------------------------------------------

    pub fn category_by_key(&self, key: &str) -> Option<&Category> {
        self.categories.values().find(|c| c.category_key == key)
    }

    pub fn action_by_key(&self, key: &str) -> Option<&Action> {
        self.actions.values().find(|a| a.action_key == key)
    }

    pub fn role(&self, role_id: i64) -> Option<&Role> { self.roles.get(&role_id) }

    pub fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.values().find(|r| r.name == name)
    }

    pub fn user(&self, user_id: i64) -> Option<&User> { self.users.get(&user_id) }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.values().find(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn link_exists(&self, category_id: i64, action_id: i64) -> bool {
        self.links.contains_key(&(category_id, action_id))
    }

    /// True iff a RoleGrant row with `is_allowed = true` exists for the role,
    /// matched by category/action *keys* joined through the reference tables.
    /// An unknown key simply finds no grant; the engine does not distinguish
    /// "inapplicable" from "not granted".
    pub fn grant_exists(&self, role_id: i64, category_key: &str, action_key: &str) -> bool {
        let Some(cat) = self.category_by_key(category_key) else { return false; };
        let Some(act) = self.action_by_key(action_key) else { return false; };
        self.grants
            .get(&(role_id, cat.id, act.id))
            .map(|g| g.is_allowed)
            .unwrap_or(false)
    }

    /// The raw grant row, granted or not. Exposed for audit inspection; the
    /// decision path goes through `grant_exists`.
    pub fn grant_row(&self, role_id: i64, category_id: i64, action_id: i64) -> Option<&RoleGrant> {
        self.grants.get(&(role_id, category_id, action_id))
    }

    /// All currently-true grants for a role as (category_id, action_id).
    pub fn list_grants(&self, role_id: i64) -> BTreeSet<(i64, i64)> {
        self.grants
            .values()
            .filter(|g| g.role_id == role_id && g.is_allowed)
            .map(|g| (g.category_id, g.action_id))
            .collect()
    }

    /// Categories ordered alphabetically by display name.
    pub fn list_categories(&self) -> Vec<Category> {
        let mut out: Vec<Category> = self.categories.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Actions ordered alphabetically by action key.
    pub fn list_actions(&self) -> Vec<Action> {
        let mut out: Vec<Action> = self.actions.values().cloned().collect();
        out.sort_by(|a, b| a.action_key.cmp(&b.action_key));
        out
    }

    pub fn list_roles(&self) -> Vec<Role> {
        self.roles.values().cloned().collect()
    }

    pub fn list_active_restaurants(&self) -> Vec<Restaurant> {
        self.restaurants.values().filter(|r| r.is_active).cloned().collect()
    }

    // ---- grant mutations ------------------------------------------------

    /// Idempotent single-grant insert. Re-granting an already-granted pair is
    /// a no-op reported as `AlreadyExists`, not an error.
    pub fn add_grant(&mut self, role_id: i64, category_id: i64, action_id: i64, actor: &str) -> AppResult<GrantOutcome> {
        if !self.roles.contains_key(&role_id) {
            return Err(AppError::not_found("role_not_found", format!("role {} not found", role_id)));
        }
        if !self.categories.contains_key(&category_id) {
            return Err(AppError::not_found("category_not_found", format!("category {} not found", category_id)));
        }
        if !self.actions.contains_key(&action_id) {
            return Err(AppError::not_found("action_not_found", format!("action {} not found", action_id)));
        }
        let key = (role_id, category_id, action_id);
        if let Some(existing) = self.grants.get(&key) {
            if existing.is_allowed {
                return Ok(GrantOutcome::AlreadyExists);
            }
        }
        let now = now_ms();
        match self.grants.get_mut(&key) {
            // A lingering is_allowed=false row flips to true in place.
            Some(g) => {
                g.is_allowed = true;
                g.audit.touch(actor, now);
            }
            None => {
                let id = self.alloc_id();
                self.grants.insert(key, RoleGrant {
                    id,
                    role_id,
                    category_id,
                    action_id,
                    is_allowed: true,
                    audit: Audit::new(actor, now),
                });
            }
        }
        debug!(target: "tiffin::store", "add_grant role={} category={} action={}", role_id, category_id, action_id);
        Ok(GrantOutcome::Added)
    }

    /// Delete the grant row. Revoking a pair that was never granted fails
    /// with NotFound and leaves the store unchanged.
    pub fn remove_grant(&mut self, role_id: i64, category_id: i64, action_id: i64) -> AppResult<()> {
        match self.grants.remove(&(role_id, category_id, action_id)) {
            Some(_) => {
                debug!(target: "tiffin::store", "remove_grant role={} category={} action={}", role_id, category_id, action_id);
                Ok(())
            }
            None => Err(AppError::not_found("grant_not_found", "Permission not found")),
        }
    }

    /// Atomically replace the role's entire grant set: delete all existing
    /// rows for the role, then insert one true-grant row per supplied pair.
    /// A full replace, not a merge. The caller holds the store write lock for
    /// the duration, so readers never see the half-replaced state.
    pub fn replace_grants(&mut self, role_id: i64, pairs: &[(i64, i64)], actor: &str) -> AppResult<usize> {
        if !self.roles.contains_key(&role_id) {
            return Err(AppError::not_found("role_not_found", format!("role {} not found", role_id)));
        }
        for &(category_id, action_id) in pairs {
            if !self.categories.contains_key(&category_id) {
                return Err(AppError::not_found("category_not_found", format!("category {} not found", category_id)));
            }
            if !self.actions.contains_key(&action_id) {
                return Err(AppError::not_found("action_not_found", format!("action {} not found", action_id)));
            }
        }
        self.grants.retain(|_, g| g.role_id != role_id);
        let now = now_ms();
        let mut count = 0usize;
        for &(category_id, action_id) in pairs {
            let key = (role_id, category_id, action_id);
            if self.grants.contains_key(&key) { continue; } // duplicate pair in input
            let id = self.alloc_id();
            self.grants.insert(key, RoleGrant {
                id,
                role_id,
                category_id,
                action_id,
                is_allowed: true,
                audit: Audit::new(actor, now),
            });
            count += 1;
        }
        debug!(target: "tiffin::store", "replace_grants role={} count={}", role_id, count);
        Ok(count)
    }
}

/// Thread-safe, cloneable handle to the store. Readers take the shared lock;
/// mutations take the exclusive lock for the whole operation.
#[derive(Clone)]
pub struct SharedStore(pub Arc<RwLock<AclStore>>);

impl SharedStore {
    pub fn new() -> Self { SharedStore(Arc::new(RwLock::new(AclStore::new()))) }
}

impl Default for SharedStore {
    fn default() -> Self { Self::new() }
}
