//! Central identity and session management for unified login across tiffin.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;

pub use principal::Principal;
pub use provider::{hash_password, verify_password, AuthProvider, AuthResponse, LocalAuthProvider, LoginRequest, RegisterRequest, UserInfo};
pub use session::{Session, SessionManager, SessionToken};
