//! Authorization engine: capability declarations, the request-time decision
//! gate, permission projections (client document and admin matrix), the
//! administration surface that edits the grant matrix, and the country
//! visibility filter.
//! Keep the public surface thin and split implementation across sub-modules.

mod capability;
mod gate;
mod resolver;
mod admin;
mod country;

pub use capability::Capability;
pub use capability::caps;
pub use gate::{Authorizer, GrantGate};
pub use resolver::{permissions_response, resolve, resolve_full, ActionRef, CategoryRef, RoleMatrix};
pub use admin::{CategoriesActions, GrantPair, PermissionAdmin};
pub use country::{scope_by_country, CountryScoped};
