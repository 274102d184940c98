//! Country visibility filter tests: the filter narrows already-authorized
//! datasets to the principal's own country and rejects principals without
//! one. It never grants anything the capability gate denied.

use tiffin::acl::{caps, scope_by_country, Authorizer, GrantGate};
use tiffin::error::AppError;
use tiffin::identity::Principal;
use tiffin::store::{Country, SharedStore};
use tiffin::tools::installer;

fn installed_store() -> SharedStore {
    let store = SharedStore::new();
    installer::install_reference_data(&store).expect("install reference data");
    store
}

fn principal(store: &SharedStore, role_name: &str, country: Option<Country>) -> Principal {
    let role_id = store.0.read().role_by_name(role_name).expect("role").id;
    Principal { user_id: 5, role_id: Some(role_id), country }
}

#[test]
fn india_user_never_sees_america_rows() {
    let store = installed_store();
    let user = principal(&store, "MEMBER", Some(Country::India));

    let rows = store.0.read().list_active_restaurants();
    assert!(rows.iter().any(|r| r.country == Country::America), "fixture includes both partitions");

    let visible = scope_by_country(&user, rows).unwrap();
    assert!(!visible.is_empty());
    assert!(visible.iter().all(|r| r.country == Country::India));
}

#[test]
fn america_user_sees_only_america_rows() {
    let store = installed_store();
    let user = principal(&store, "MEMBER", Some(Country::America));
    let visible = scope_by_country(&user, store.0.read().list_active_restaurants()).unwrap();
    assert!(!visible.is_empty());
    assert!(visible.iter().all(|r| r.country == Country::America));
}

#[test]
fn missing_country_is_forbidden() {
    let store = installed_store();
    let user = principal(&store, "MEMBER", None);
    let res = scope_by_country(&user, store.0.read().list_active_restaurants());
    assert!(matches!(res, Err(AppError::Forbidden { .. })));
}

#[test]
fn scope_composes_after_the_grant_check_and_does_not_widen_it() {
    let store = installed_store();
    let gate = GrantGate::new(store.clone());

    // Fully-granted ADMIN with no country: the gate allows, the scope still
    // refuses. Visibility is independent of category/action grants.
    let admin_no_country = principal(&store, "ADMIN", None);
    assert!(gate.check(Some(&admin_no_country), caps::RESTAURANTS_READ).is_ok());
    assert!(scope_by_country(&admin_no_country, store.0.read().list_active_restaurants()).is_err());

    // Conversely a country never substitutes for a missing grant: strip the
    // MEMBER role's RESTAURANTS grant and the gate denies before scoping.
    let member = principal(&store, "MEMBER", Some(Country::India));
    {
        let mut guard = store.0.write();
        let role_id = member.role_id.unwrap();
        let cat = guard.category_by_key("RESTAURANTS").unwrap().id;
        let act = guard.action_by_key("READ_001").unwrap().id;
        guard.remove_grant(role_id, cat, act).unwrap();
    }
    assert!(matches!(
        gate.check(Some(&member), caps::RESTAURANTS_READ),
        Err(AppError::Forbidden { .. })
    ));
}
