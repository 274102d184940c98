use crate::error::{AppError, AppResult};
use crate::identity::Principal;
use crate::store::{Country, Restaurant};

/// Rows carrying a country partition tag.
pub trait CountryScoped {
    fn country(&self) -> Country;
}

impl CountryScoped for Restaurant {
    fn country(&self) -> Country { self.country }
}

/// Narrow a country-partitioned dataset to the principal's own country.
///
/// A data-visibility filter, not a permission grant: it composes *after* the
/// capability gate allows the operation, and only for operations explicitly
/// marked country-scoped. A principal with no country set is rejected
/// outright rather than shown everything.
pub fn scope_by_country<T: CountryScoped>(principal: &Principal, rows: Vec<T>) -> AppResult<Vec<T>> {
    let Some(country) = principal.country else {
        return Err(AppError::forbidden("country_unavailable", "Country information not available"));
    };
    Ok(rows.into_iter().filter(|r| r.country() == country).collect())
}
