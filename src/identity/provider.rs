use anyhow::anyhow;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use serde::{Deserialize, Serialize};
use crate::tprintln;

use crate::error::{AppError, AppResult};
use crate::store::{Country, SharedStore, User};

use super::principal::Principal;
use super::session::{Session, SessionManager};

pub fn hash_password(password: &str) -> AppResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
    let argon2 = Argon2::default();
    let phc = argon2.hash_password(password.as_bytes(), &salt).map_err(|e| anyhow!(e.to_string()))?.to_string();
    Ok(phc)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else { false }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role_name: String,
    #[serde(default)]
    pub country: Option<Country>,
}

/// Client-facing slice of a user row; never includes the password hash.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role_id: i64,
    pub country: Option<Country>,
}

impl From<&User> for UserInfo {
    fn from(u: &User) -> Self {
        Self { id: u.id, name: u.name.clone(), email: u.email.clone(), role_id: u.role_id, country: u.country }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserInfo,
}

pub trait AuthProvider: Send + Sync {
    fn login(&self, req: &LoginRequest) -> AppResult<AuthResponse>;
}

/// Login/registration over the local user table with Argon2 PHC hashes.
pub struct LocalAuthProvider {
    pub store: SharedStore,
    pub sm: SessionManager,
}

impl LocalAuthProvider {
    pub fn new(store: SharedStore, sm: SessionManager) -> Self { Self { store, sm } }

    /// Create a user and log them in. Email uniqueness is enforced by the
    /// store; the role is resolved by name; country defaults to INDIA.
    pub fn register(&self, req: &RegisterRequest) -> AppResult<AuthResponse> {
        let role_id = {
            let guard = self.store.0.read();
            match guard.role_by_name(&req.role_name) {
                Some(r) => r.id,
                None => return Err(AppError::user("invalid_role", "Invalid role")),
            }
        };
        let phc = hash_password(&req.password)?;
        let country = Some(req.country.unwrap_or(Country::India));
        let user = self.store.0.write().create_user(&req.name, &req.email, &phc, role_id, country, &req.email)?;
        let session = self.issue_for(&user);
        tprintln!("auth.register user={} sid={}", user.id, session.session_id);
        Ok(AuthResponse { access_token: session.token, user: UserInfo::from(&user) })
    }

    fn issue_for(&self, user: &User) -> Session {
        let principal = Principal {
            user_id: user.id,
            role_id: Some(user.role_id),
            country: user.country,
        };
        self.sm.issue(principal)
    }
}

impl AuthProvider for LocalAuthProvider {
    fn login(&self, req: &LoginRequest) -> AppResult<AuthResponse> {
        // Look up and verify without holding the lock across hashing
        let user = {
            let guard = self.store.0.read();
            guard.user_by_email(&req.email).cloned()
        };
        let Some(user) = user else {
            return Err(AppError::auth("invalid_credentials", "Invalid credentials"));
        };
        if !verify_password(&user.password_hash, &req.password) {
            return Err(AppError::auth("invalid_credentials", "Invalid credentials"));
        }
        let session = self.issue_for(&user);
        tprintln!("auth.login user={} sid={}", user.id, session.session_id);
        Ok(AuthResponse { access_token: session.token, user: UserInfo::from(&user) })
    }
}
