//! Identity plumbing tests: registration, login, and the opaque-token
//! session lifecycle feeding principals into the authorization core.

use std::time::Duration;

use tiffin::error::AppError;
use tiffin::identity::{AuthProvider, LocalAuthProvider, LoginRequest, RegisterRequest, SessionManager};
use tiffin::store::{Country, SharedStore};
use tiffin::tools::installer;

fn provider() -> (SharedStore, LocalAuthProvider) {
    let store = SharedStore::new();
    installer::install_reference_data(&store).expect("install reference data");
    let sm = SessionManager::default();
    (store.clone(), LocalAuthProvider::new(store, sm))
}

fn register_req(email: &str, role: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Test User".into(),
        email: email.into(),
        password: "s3cr3t!".into(),
        role_name: role.into(),
        country: None,
    }
}

#[test]
fn register_issues_a_session_with_role_and_country_claims() {
    let (_store, auth) = provider();
    let resp = auth.register(&register_req("alice@food.com", "MEMBER")).unwrap();

    assert!(!resp.access_token.is_empty());
    assert_eq!(resp.user.email, "alice@food.com");
    assert_eq!(resp.user.country, Some(Country::India), "country defaults to INDIA");

    let principal = auth.sm.validate(&resp.access_token).expect("token resolves");
    assert_eq!(principal.user_id, resp.user.id);
    assert_eq!(principal.role_id, Some(resp.user.role_id));
    assert_eq!(principal.country, Some(Country::India));
}

#[test]
fn register_rejects_duplicate_email_and_unknown_role() {
    let (_store, auth) = provider();
    auth.register(&register_req("bob@food.com", "MEMBER")).unwrap();
    assert!(matches!(
        auth.register(&register_req("bob@food.com", "MANAGER")),
        Err(AppError::Conflict { .. })
    ));
    assert!(matches!(
        auth.register(&register_req("carol@food.com", "SUPERVISOR")),
        Err(AppError::UserInput { .. })
    ));
}

#[test]
fn login_verifies_the_stored_hash() {
    let (_store, auth) = provider();
    auth.register(&register_req("dave@food.com", "MANAGER")).unwrap();

    let ok = auth.login(&LoginRequest { email: "dave@food.com".into(), password: "s3cr3t!".into() });
    assert!(ok.is_ok(), "login with correct password should succeed");

    let bad = auth.login(&LoginRequest { email: "dave@food.com".into(), password: "wrong".into() });
    assert!(matches!(bad, Err(AppError::Auth { .. })), "login with wrong password must fail");

    let ghost = auth.login(&LoginRequest { email: "nobody@food.com".into(), password: "s3cr3t!".into() });
    assert!(matches!(ghost, Err(AppError::Auth { .. })));
}

#[test]
fn logout_invalidates_the_token() {
    let (_store, auth) = provider();
    let resp = auth.register(&register_req("erin@food.com", "MEMBER")).unwrap();
    assert!(auth.sm.validate(&resp.access_token).is_some());
    assert!(auth.sm.logout(&resp.access_token));
    assert!(auth.sm.validate(&resp.access_token).is_none());
    // logging out twice reports nothing removed
    assert!(!auth.sm.logout(&resp.access_token));
}

#[test]
fn expired_sessions_stop_resolving() {
    let (store, _auth) = provider();
    let sm = SessionManager { ttl: Duration::from_secs(0) };
    let auth = LocalAuthProvider::new(store, sm);
    let resp = auth.register(&register_req("frank@food.com", "MEMBER")).unwrap();
    assert!(auth.sm.validate(&resp.access_token).is_none(), "zero-ttl token is already expired");
}

#[test]
fn explicit_country_is_preserved() {
    let (_store, auth) = provider();
    let mut req = register_req("grace@food.com", "MEMBER");
    req.country = Some(Country::America);
    let resp = auth.register(&req).unwrap();
    assert_eq!(resp.user.country, Some(Country::America));
}
