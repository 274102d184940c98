//!
//! tiffin HTTP server
//! ------------------
//! This module defines the Axum-based HTTP API for the authorization core.
//!
//! Responsibilities:
//! - Login/register/logout endpoints backed by the `identity` module.
//! - The client permission document endpoint (`GET /auth/permissions`).
//! - The permissions administration endpoints (roles, per-role matrix, bulk
//!   replace, single add/remove, reference listings).
//! - The country-scoped restaurants listing demonstrating the full guard
//!   chain: capability gate first, then country visibility filter, then the
//!   operation body. Every protected handler performs its capability check
//!   before any other work; a denial means the body never runs.
//! - First-run reference-data installation and startup inventory logs.

use std::net::SocketAddr;

use axum::{routing::{delete, get, post}, Router, extract::{Path, State}, Json};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::acl::{caps, scope_by_country, Authorizer, GrantGate, GrantPair, PermissionAdmin};
use crate::error::{AppError, AppResult};
use crate::identity::{AuthProvider, LocalAuthProvider, LoginRequest, Principal, RegisterRequest, SessionManager};
use crate::store::{GrantOutcome, SharedStore};
use crate::tools::installer;

/// Shared server state injected into all handlers.
///
/// Holds the global `SharedStore` handle, the decision gate, the permissions
/// administration component, and the session/login plumbing.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub gate: GrantGate,
    pub admin: std::sync::Arc<PermissionAdmin>,
    pub auth: std::sync::Arc<LocalAuthProvider>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(store: SharedStore, sessions: SessionManager) -> Self {
        Self {
            gate: GrantGate::new(store.clone()),
            admin: std::sync::Arc::new(PermissionAdmin::new(store.clone())),
            auth: std::sync::Arc::new(LocalAuthProvider::new(store.clone(), sessions)),
            sessions,
            store,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "status": "error",
            "code": self.code_str(),
            "message": self.message(),
        }));
        (status, body).into_response()
    }
}

/// Start the tiffin HTTP server bound to the given port.
///
/// Installs the reference data on an empty store, seeds the default users,
/// runs the install checks, and mounts all HTTP routes.
pub async fn run_with_port(http_port: u16) -> anyhow::Result<()> {
    let store = SharedStore::new();
    installer::install_reference_data(&store).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    installer::install_demo_users(&store).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    installer::run_install_checks(&store).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    {
        let guard = store.0.read();
        info!(
            target: "startup",
            "tiffin starting: {} categories, {} actions, {} roles, {} restaurants",
            guard.list_categories().len(),
            guard.list_actions().len(),
            guard.list_roles().len(),
            guard.list_active_restaurants().len()
        );
    }

    let ttl_secs: u64 = std::env::var("TIFFIN_SESSION_TTL_SECS").ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(60 * 60);
    let sessions = SessionManager { ttl: std::time::Duration::from_secs(ttl_secs) };
    let app_state = AppState::new(store, sessions);

    let app = router(app_state);

    let addr: SocketAddr = format!("0.0.0.0:{}", http_port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Convenience entry point using the default port (7878).
pub async fn run() -> anyhow::Result<()> {
    run_with_port(7878).await
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "tiffin ok" }))
        .route("/auth/status", get(auth_status))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/permissions", get(my_permissions))
        .route("/auth/me", get(me))
        .route("/permissions/roles", get(list_roles))
        .route("/permissions/role/{role_id}", get(role_matrix).put(replace_role_grants))
        .route("/permissions/add", post(add_permission))
        .route("/permissions/remove", delete(remove_permission))
        .route("/permissions/categories-actions", get(categories_actions))
        .route("/restaurants", get(list_restaurants))
        .with_state(state)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let v = headers.get("authorization").or_else(|| headers.get("Authorization"))?;
    let s = v.to_str().ok()?;
    let rest = s.strip_prefix("Bearer ").or_else(|| s.strip_prefix("bearer "))?;
    if rest.is_empty() { None } else { Some(rest.to_string()) }
}

/// Resolve the request's principal from its bearer token. All claims come
/// from the server-side session map; an absent or expired token is an
/// authentication failure, never a silent anonymous principal.
fn principal_from_headers(state: &AppState, headers: &HeaderMap) -> AppResult<Principal> {
    let Some(token) = bearer_token(headers) else {
        return Err(AppError::auth("unauthenticated", "User not authenticated"));
    };
    state.sessions.validate(&token)
        .ok_or_else(|| AppError::auth("unauthenticated", "User not authenticated"))
}

// ---- auth surface -------------------------------------------------------

async fn auth_status() -> impl IntoResponse {
    Json(json!({ "status": "Auth service is running" }))
}

async fn register(State(state): State<AppState>, Json(payload): Json<RegisterRequest>) -> AppResult<impl IntoResponse> {
    let resp = state.auth.register(&payload)?;
    Ok(Json(resp))
}

async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> AppResult<impl IntoResponse> {
    let resp = state.auth.login(&payload)?;
    Ok(Json(resp))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let Some(token) = bearer_token(&headers) else {
        return Err(AppError::auth("unauthenticated", "User not authenticated"));
    };
    let removed = state.sessions.logout(&token);
    let status = if removed { "ok" } else { "unknown_token" };
    Ok(Json(json!({ "status": status })))
}

/// The advisory client document: sparse granted-action map per category.
/// UI feature gating only; every protected endpoint re-checks the grant
/// matrix server-side regardless of what this document said.
async fn my_permissions(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    let Some(role_id) = principal.role_id else {
        return Err(AppError::auth("unauthenticated", "User not authenticated"));
    };
    let doc = crate::acl::resolve(&state.store, role_id)?;
    Ok(Json(crate::acl::permissions_response(doc)))
}

async fn me(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    Ok(Json(json!({ "user": principal })))
}

// ---- permissions administration -----------------------------------------

async fn list_roles(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    let roles = state.admin.list_roles(&principal)?;
    Ok(Json(roles))
}

async fn role_matrix(State(state): State<AppState>, headers: HeaderMap, Path(role_id): Path<i64>) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    let matrix = state.admin.role_matrix(&principal, role_id)?;
    Ok(Json(matrix))
}

#[derive(Debug, Deserialize)]
struct ReplaceGrantsPayload {
    permissions: Vec<GrantPair>,
}

async fn replace_role_grants(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(role_id): Path<i64>,
    Json(payload): Json<ReplaceGrantsPayload>,
) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    let count = state.admin.replace_grants(&principal, role_id, &payload.permissions)?;
    Ok(Json(json!({ "message": "Permissions updated successfully", "count": count })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GrantRefPayload {
    role_id: i64,
    category_id: i64,
    action_id: i64,
}

async fn add_permission(State(state): State<AppState>, headers: HeaderMap, Json(payload): Json<GrantRefPayload>) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    let outcome = state.admin.add_grant(&principal, payload.role_id, payload.category_id, payload.action_id)?;
    let message = match outcome {
        GrantOutcome::Added => "Permission added successfully",
        GrantOutcome::AlreadyExists => "Permission already exists",
    };
    Ok(Json(json!({ "message": message })))
}

async fn remove_permission(State(state): State<AppState>, headers: HeaderMap, Json(payload): Json<GrantRefPayload>) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    state.admin.remove_grant(&principal, payload.role_id, payload.category_id, payload.action_id)?;
    Ok(Json(json!({ "message": "Permission removed successfully" })))
}

async fn categories_actions(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    let out = state.admin.categories_and_actions(&principal)?;
    Ok(Json(out))
}

// ---- country-scoped data ------------------------------------------------

/// Full guard chain: capability gate, then country scope, then the body.
async fn list_restaurants(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let principal = principal_from_headers(&state, &headers)?;
    state.gate.check(Some(&principal), caps::RESTAURANTS_READ)?;
    let rows = state.store.0.read().list_active_restaurants();
    let visible = scope_by_country(&principal, rows)?;
    Ok(Json(visible))
}
