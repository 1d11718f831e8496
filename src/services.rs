pub mod auth;
pub use auth::AuthService;
pub mod daily_hours;
pub mod engin_service;
pub use engin_service::EnginService;
pub mod entreprise_service;
pub use entreprise_service::EntrepriseService;
pub mod import_service;
pub use import_service::ImportService;
pub mod lubrifiant_service;
pub use lubrifiant_service::LubrifiantService;
pub mod organisation_service;
pub use organisation_service::OrganisationService;
pub mod panne_service;
pub use panne_service::PanneService;
pub mod rbac_service;
pub use rbac_service::RbacService;
pub mod saisie_service;
pub use saisie_service::SaisieService;

use crate::common::error::{field_error, AppError};

/// Nome aparado; vazio depois do trim é erro de validação.
pub(crate) fn clean_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(field_error("name", "validation.required"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(clean_name("  CHG-01 ").unwrap(), "CHG-01");
        assert!(clean_name("   ").is_err());
    }
}
