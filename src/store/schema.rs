//! Persisted entity shapes for the entitlement store.
//! These mirror the relational layout: reference data (categories, actions,
//! applicability links), roles, the grant rows that are the single source of
//! truth at decision time, and the user/restaurant rows the identity and
//! country-scope layers read.

use serde::{Deserialize, Serialize};

/// Audit stamps carried on every persisted row. Mutations refresh
/// `updated_at`/`updated_by`; inserts set all four.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Audit {
    /// Epoch milliseconds.
    pub created_at: i64,
    pub updated_at: i64,
    pub created_by: String,
    pub updated_by: String,
}

impl Audit {
    pub fn new(actor: &str, now_ms: i64) -> Self {
        Self { created_at: now_ms, updated_at: now_ms, created_by: actor.to_string(), updated_by: actor.to_string() }
    }

    pub fn touch(&mut self, actor: &str, now_ms: i64) {
        self.updated_at = now_ms;
        self.updated_by = actor.to_string();
    }
}

/// A protected resource domain, e.g. ORDERS or PAYMENTS.
/// `category_key` is the immutable uppercase token protected operations
/// declare; `name` is the display name shown by the administration UI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category_key: String,
    #[serde(flatten)]
    pub audit: Audit,
}

/// A verb performable on a category, e.g. READ_001. Global, not
/// category-scoped; the numeric suffix is a versioning convention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Action {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub action_key: String,
    #[serde(flatten)]
    pub audit: Audit,
}

/// Declares that an action is applicable to a category. This is the set of
/// *possible* grants; a link grants nothing by itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryActionLink {
    pub id: i64,
    pub category_id: i64,
    pub action_id: i64,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

/// The actual entitlement row. Unique per (role, category, action); only a
/// row with `is_allowed = true` means granted. Absence of a row and
/// `is_allowed = false` are both denials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleGrant {
    pub id: i64,
    pub role_id: i64,
    pub category_id: i64,
    pub action_id: i64,
    pub is_allowed: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

/// Country partition for country-scoped resources.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Country {
    India,
    America,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string; never serialized out over HTTP responses.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Users reference exactly one role. Role changes take effect on the
    /// next permission evaluation; grants are never copied onto the user.
    pub role_id: i64,
    pub country: Option<Country>,
    #[serde(flatten)]
    pub audit: Audit,
}

/// Country-partitioned reference row used by the visibility filter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: String,
    pub country: Country,
    pub is_active: bool,
    #[serde(flatten)]
    pub audit: Audit,
}
