use std::fmt::{Display, Formatter};

/// The (category, action) pair a protected operation requires.
///
/// Every protected operation declares its capability up front as a const and
/// passes it to the gate before the operation body runs; there are no inline
/// ad-hoc permission strings at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability {
    pub category: &'static str,
    pub action: &'static str,
}

impl Capability {
    pub const fn new(category: &'static str, action: &'static str) -> Self {
        Self { category, action }
    }
}

impl Display for Capability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.action)
    }
}

/// Capability table for the known protected operations. Category and action
/// keys match the reference data installed at setup; the `_001` suffix is the
/// action-key versioning convention.
pub mod caps {
    use super::Capability;

    pub const ORDERS_READ: Capability = Capability::new("ORDERS", "READ_001");
    pub const ORDERS_WRITE: Capability = Capability::new("ORDERS", "WRITE_001");
    pub const ORDERS_UPDATE: Capability = Capability::new("ORDERS", "UPDATE_001");
    pub const ORDERS_DELETE: Capability = Capability::new("ORDERS", "DELETE_001");

    pub const PAYMENTS_READ: Capability = Capability::new("PAYMENTS", "READ_001");
    pub const PAYMENTS_WRITE: Capability = Capability::new("PAYMENTS", "WRITE_001");
    pub const PAYMENTS_DELETE: Capability = Capability::new("PAYMENTS", "DELETE_001");

    pub const RESTAURANTS_READ: Capability = Capability::new("RESTAURANTS", "READ_001");

    pub const USERS_READ: Capability = Capability::new("USERS", "READ_001");
    pub const USERS_UPDATE: Capability = Capability::new("USERS", "UPDATE_001");

    pub const DASHBOARD_READ: Capability = Capability::new("DASHBOARD", "READ_001");

    /// The fixed administrative pair gating the permissions surface itself.
    pub const PERMISSIONS_READ: Capability = Capability::new("PERMISSIONS", "READ_001");
    pub const PERMISSIONS_UPDATE: Capability = Capability::new("PERMISSIONS", "UPDATE_001");
}
