//! Permission projections over the grant rows.
//!
//! Two shapes derive from the same store query and are never cached
//! independently of it:
//! - `resolve` builds the sparse client-facing document used for UI feature
//!   gating. It is advisory only: the server-side gate re-evaluates every
//!   protected call, and nothing in this crate consults the document to make
//!   an allow/deny decision.
//! - `resolve_full` builds the exhaustive category × action matrix the
//!   administration UI renders and edits, so editing needs no second round
//!   trip for "what could be granted".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{AppError, AppResult};
use crate::store::{Role, SharedStore};

/// Sparse per-category document of granted action keys:
/// `{ categoryKey: { "parent": categoryKey, actionKey: true, ... }, ... }`.
/// Categories with zero true grants for the role are omitted entirely.
pub fn resolve(store: &SharedStore, role_id: i64) -> AppResult<Map<String, Value>> {
    let guard = store.0.read();
    let categories = guard.list_categories();
    let actions = guard.list_actions();
    let granted = guard.list_grants(role_id);

    let mut doc = Map::new();
    for cat in &categories {
        let mut node = Map::new();
        for act in &actions {
            if granted.contains(&(cat.id, act.id)) {
                node.insert(act.action_key.clone(), Value::Bool(true));
            }
        }
        if node.is_empty() { continue; }
        node.insert("parent".to_string(), Value::String(cat.category_key.clone()));
        doc.insert(cat.category_key.clone(), Value::Object(node));
    }
    Ok(doc)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActionRef {
    pub id: i64,
    pub action_key: String,
}

/// Exhaustive grant matrix for one role, plus the reference listings the
/// administration UI needs to render and edit it.
#[derive(Debug, Clone, Serialize)]
pub struct RoleMatrix {
    pub role: Role,
    /// Category display name -> action key -> granted. Every known category
    /// and every known action appears, granted or not.
    pub permissions: BTreeMap<String, BTreeMap<String, bool>>,
    pub categories: Vec<CategoryRef>,
    pub actions: Vec<ActionRef>,
}

/// Exhaustive projection: every known (category, action) cell as a boolean,
/// true only where a true grant row exists for that exact pair.
pub fn resolve_full(store: &SharedStore, role_id: i64) -> AppResult<RoleMatrix> {
    let guard = store.0.read();
    let Some(role) = guard.role(role_id).cloned() else {
        return Err(AppError::not_found("role_not_found", format!("Role with ID {} not found", role_id)));
    };
    let categories = guard.list_categories();
    let actions = guard.list_actions();
    let granted = guard.list_grants(role_id);

    let mut permissions: BTreeMap<String, BTreeMap<String, bool>> = BTreeMap::new();
    for cat in &categories {
        let mut row = BTreeMap::new();
        for act in &actions {
            row.insert(act.action_key.clone(), granted.contains(&(cat.id, act.id)));
        }
        permissions.insert(cat.name.clone(), row);
    }

    Ok(RoleMatrix {
        role,
        permissions,
        categories: categories.iter().map(|c| CategoryRef { id: c.id, name: c.name.clone() }).collect(),
        actions: actions.iter().map(|a| ActionRef { id: a.id, action_key: a.action_key.clone() }).collect(),
    })
}

/// Wrap the sparse document in the wire envelope the client consumes:
/// `{ "access": { "iWork": { ... } } }`.
pub fn permissions_response(doc: Map<String, Value>) -> Value {
    json!({ "access": { "iWork": doc } })
}
