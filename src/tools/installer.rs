//! Reference-data installer: provisions the categories, actions,
//! applicability links, roles and role grants the authorization core runs
//! against, plus the default users and the country-partitioned demo
//! restaurants. Categories/actions/links are effectively static reference
//! data provisioned once at setup; the installer is idempotent so startup
//! can always run it.

use tracing::info;
use crate::tprintln;

use crate::error::{AppError, AppResult};
use crate::identity::hash_password;
use crate::store::{Country, SharedStore};

/// Seed password for the default users, matching the demo fixtures.
const DEFAULT_PASSWORD: &str = "password123";
const SYSTEM_ACTOR: &str = "system";

const CATEGORIES: &[(&str, &str, &str)] = &[
    ("Orders", "ORDERS", "Order management permissions"),
    ("Payments", "PAYMENTS", "Payment management permissions"),
    ("Restaurants", "RESTAURANTS", "Restaurant management permissions"),
    ("Users", "USERS", "User management permissions"),
    ("Dashboard", "DASHBOARD", "Dashboard access permissions"),
    ("Permissions", "PERMISSIONS", "Permission administration"),
];

const ACTIONS: &[(&str, &str, &str)] = &[
    ("Read", "READ_001", "Permission to view/read resources"),
    ("Write", "WRITE_001", "Permission to create resources"),
    ("Update", "UPDATE_001", "Permission to modify resources"),
    ("Delete", "DELETE_001", "Permission to delete resources"),
    ("Import", "IMPORT_001", "Permission to import data"),
    ("Export", "EXPORT_001", "Permission to export data"),
    ("Approve", "APPROVE_001", "Permission to approve requests"),
    ("Reject", "REJECT_001", "Permission to reject requests"),
];

/// Which actions are applicable per category. The set of *possible* grants;
/// granting itself happens per role below.
const LINKS: &[(&str, &[&str])] = &[
    ("ORDERS", &["READ_001", "WRITE_001", "UPDATE_001", "DELETE_001"]),
    ("PAYMENTS", &["READ_001", "WRITE_001", "UPDATE_001"]),
    ("RESTAURANTS", &["READ_001"]),
    ("USERS", &["READ_001", "UPDATE_001"]),
    ("DASHBOARD", &["READ_001"]),
    ("PERMISSIONS", &["READ_001", "UPDATE_001"]),
];

const MANAGER_GRANTS: &[(&str, &str)] = &[
    ("ORDERS", "READ_001"),
    ("ORDERS", "WRITE_001"),
    ("ORDERS", "UPDATE_001"),
    ("ORDERS", "DELETE_001"),
    ("RESTAURANTS", "READ_001"),
    ("DASHBOARD", "READ_001"),
];

const MEMBER_GRANTS: &[(&str, &str)] = &[
    ("ORDERS", "READ_001"),
    ("ORDERS", "WRITE_001"),
    ("RESTAURANTS", "READ_001"),
    ("DASHBOARD", "READ_001"),
];

/// Install categories, actions, links, the three stock roles and their grant
/// sets, and the demo restaurants. Safe to run repeatedly: rows that already
/// exist are left alone.
pub fn install_reference_data(store: &SharedStore) -> AppResult<()> {
    let mut guard = store.0.write();

    for &(name, key, desc) in CATEGORIES {
        if guard.category_by_key(key).is_none() {
            guard.create_category(name, key, Some(desc), SYSTEM_ACTOR)?;
        }
    }
    for &(name, key, desc) in ACTIONS {
        if guard.action_by_key(key).is_none() {
            guard.create_action(name, key, Some(desc), SYSTEM_ACTOR)?;
        }
    }
    for &(cat_key, action_keys) in LINKS {
        let cat_id = guard.category_by_key(cat_key).map(|c| c.id)
            .ok_or_else(|| AppError::internal("install_error", format!("category {} missing after install", cat_key)))?;
        for &akey in action_keys {
            let act_id = guard.action_by_key(akey).map(|a| a.id)
                .ok_or_else(|| AppError::internal("install_error", format!("action {} missing after install", akey)))?;
            if !guard.link_exists(cat_id, act_id) {
                guard.link_action(cat_id, act_id, SYSTEM_ACTOR)?;
            }
        }
    }

    for (name, desc) in [
        ("ADMIN", "Administrator with full access"),
        ("MANAGER", "Manager with limited administrative access"),
        ("MEMBER", "Regular member with basic access"),
    ] {
        if guard.role_by_name(name).is_none() {
            guard.create_role(name, Some(desc), SYSTEM_ACTOR)?;
        }
    }

    // ADMIN gets every applicable pair; the other roles get fixed subsets.
    let admin_id = guard.role_by_name("ADMIN").map(|r| r.id).unwrap();
    for &(cat_key, action_keys) in LINKS {
        let cat_id = guard.category_by_key(cat_key).map(|c| c.id).unwrap();
        for &akey in action_keys {
            let act_id = guard.action_by_key(akey).map(|a| a.id).unwrap();
            guard.add_grant(admin_id, cat_id, act_id, SYSTEM_ACTOR)?;
        }
    }
    for (role_name, grants) in [("MANAGER", MANAGER_GRANTS), ("MEMBER", MEMBER_GRANTS)] {
        let role_id = guard.role_by_name(role_name).map(|r| r.id).unwrap();
        for &(cat_key, akey) in grants {
            let cat_id = guard.category_by_key(cat_key).map(|c| c.id).unwrap();
            let act_id = guard.action_by_key(akey).map(|a| a.id).unwrap();
            guard.add_grant(role_id, cat_id, act_id, SYSTEM_ACTOR)?;
        }
    }

    if guard.list_active_restaurants().is_empty() {
        guard.create_restaurant("Spice Garden", Some("Authentic Indian cuisine with a modern twist"),
            "123 MG Road, Bangalore, Karnataka", Country::India, SYSTEM_ACTOR)?;
        guard.create_restaurant("Dosa Palace", Some("Traditional South Indian breakfast and snacks"),
            "45 Brigade Road, Bangalore, Karnataka", Country::India, SYSTEM_ACTOR)?;
        guard.create_restaurant("Biryani House", Some("Famous for Hyderabadi Biryani and Kebabs"),
            "78 Indiranagar, Bangalore, Karnataka", Country::India, SYSTEM_ACTOR)?;
        guard.create_restaurant("Burger Barn", Some("Smash burgers and shakes"),
            "901 5th Avenue, New York, NY", Country::America, SYSTEM_ACTOR)?;
    }

    info!(target: "tiffin::install", "reference data installed: {} categories, {} actions, {} roles",
        guard.list_categories().len(), guard.list_actions().len(), guard.list_roles().len());
    Ok(())
}

/// Ensure the bootstrap administrator exists so the permissions surface is
/// reachable on a fresh store.
pub fn ensure_default_admin(store: &SharedStore) -> AppResult<()> {
    {
        let guard = store.0.read();
        if guard.user_by_email("admin@food.com").is_some() { return Ok(()); }
    }
    let phc = hash_password(DEFAULT_PASSWORD)?;
    let mut guard = store.0.write();
    let admin_role = guard.role_by_name("ADMIN").map(|r| r.id)
        .ok_or_else(|| AppError::internal("install_error", "ADMIN role missing; run install_reference_data first"))?;
    guard.create_user("Admin User", "admin@food.com", &phc, admin_role, Some(Country::India), SYSTEM_ACTOR)?;
    tprintln!("installer: created default admin admin@food.com");
    Ok(())
}

/// Seed the demo manager/member users alongside the default admin.
pub fn install_demo_users(store: &SharedStore) -> AppResult<()> {
    ensure_default_admin(store)?;
    let phc = hash_password(DEFAULT_PASSWORD)?;
    let mut guard = store.0.write();
    for (name, email, role_name) in [
        ("Manager User", "manager@food.com", "MANAGER"),
        ("Member User", "member@food.com", "MEMBER"),
    ] {
        if guard.user_by_email(email).is_some() { continue; }
        let role_id = guard.role_by_name(role_name).map(|r| r.id)
            .ok_or_else(|| AppError::internal("install_error", format!("{} role missing; run install_reference_data first", role_name)))?;
        guard.create_user(name, email, &phc, role_id, Some(Country::India), SYSTEM_ACTOR)?;
    }
    Ok(())
}

/// Post-install sanity checks: every declared key resolves, and the
/// administrative capability is actually granted to ADMIN (otherwise the
/// permissions surface would be unreachable).
pub fn run_install_checks(store: &SharedStore) -> AppResult<()> {
    let guard = store.0.read();
    for &(_, key, _) in CATEGORIES {
        if guard.category_by_key(key).is_none() {
            return Err(AppError::internal("install_check_failed", format!("category {} not installed", key)));
        }
    }
    for &(_, key, _) in ACTIONS {
        if guard.action_by_key(key).is_none() {
            return Err(AppError::internal("install_check_failed", format!("action {} not installed", key)));
        }
    }
    let Some(admin) = guard.role_by_name("ADMIN") else {
        return Err(AppError::internal("install_check_failed", "ADMIN role not installed"));
    };
    if !guard.grant_exists(admin.id, "PERMISSIONS", "UPDATE_001") {
        return Err(AppError::internal("install_check_failed", "ADMIN is missing PERMISSIONS:UPDATE_001"));
    }
    Ok(())
}
