use serde::{Deserialize, Serialize};

use crate::store::Country;

/// Identity claims resolved from a validated session token. Asserted
/// authentic upstream; this is what the authorization core sees.
///
/// The role is carried by reference only: the gate re-reads the role's
/// grants from the store on every check, so a role's grant edits take effect
/// on the next evaluation without reissuing tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    #[serde(default)]
    pub role_id: Option<i64>,
    #[serde(default)]
    pub country: Option<Country>,
}
