// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::get_me,

        // --- Entreprises (super admin) ---
        handlers::entreprises::list_entreprises,
        handlers::entreprises::create_entreprise,
        handlers::entreprises::get_entreprise,
        handlers::entreprises::update_entreprise,
        handlers::entreprises::delete_entreprise,

        // --- RBAC ---
        handlers::rbac::list_permissions,
        handlers::rbac::list_roles,
        handlers::rbac::create_role,
        handlers::rbac::get_role,
        handlers::rbac::update_role,
        handlers::rbac::replace_role_permissions,
        handlers::rbac::delete_role,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,

        // --- Organisation ---
        handlers::organisation::list_sites,
        handlers::organisation::create_site,
        handlers::organisation::get_site,
        handlers::organisation::update_site,
        handlers::organisation::delete_site,
        handlers::organisation::list_typeparcs,
        handlers::organisation::create_typeparc,
        handlers::organisation::get_typeparc,
        handlers::organisation::update_typeparc,
        handlers::organisation::delete_typeparc,
        handlers::organisation::list_parcs,
        handlers::organisation::create_parc,
        handlers::organisation::get_parc,
        handlers::organisation::update_parc,
        handlers::organisation::delete_parc,

        // --- Engins ---
        handlers::engins::list_engins,
        handlers::engins::create_engin,
        handlers::engins::get_engin,
        handlers::engins::update_engin,
        handlers::engins::delete_engin,
        handlers::engins::get_heures_chassis,

        // --- Pannes ---
        handlers::pannes::list_typepannes,
        handlers::pannes::create_typepanne,
        handlers::pannes::get_typepanne,
        handlers::pannes::update_typepanne,
        handlers::pannes::delete_typepanne,
        handlers::pannes::list_pannes,
        handlers::pannes::create_panne,
        handlers::pannes::get_panne,
        handlers::pannes::update_panne,
        handlers::pannes::delete_panne,

        // --- Saisies ---
        handlers::saisies::list_saisiehrms,
        handlers::saisies::create_saisiehrm,
        handlers::saisies::get_saisiehrm,
        handlers::saisies::update_saisiehrm,
        handlers::saisies::delete_saisiehrm,
        handlers::saisies::list_saisiehims,
        handlers::saisies::create_saisiehim,
        handlers::saisies::get_saisiehim,
        handlers::saisies::update_saisiehim,
        handlers::saisies::delete_saisiehim,

        // --- Lubrifiants ---
        handlers::lubrifiants::list_typelubrifiants,
        handlers::lubrifiants::create_typelubrifiant,
        handlers::lubrifiants::get_typelubrifiant,
        handlers::lubrifiants::update_typelubrifiant,
        handlers::lubrifiants::delete_typelubrifiant,
        handlers::lubrifiants::list_typeconsommationlubs,
        handlers::lubrifiants::create_typeconsommationlub,
        handlers::lubrifiants::get_typeconsommationlub,
        handlers::lubrifiants::update_typeconsommationlub,
        handlers::lubrifiants::delete_typeconsommationlub,
        handlers::lubrifiants::list_lubrifiants,
        handlers::lubrifiants::create_lubrifiant,
        handlers::lubrifiants::get_lubrifiant,
        handlers::lubrifiants::update_lubrifiant,
        handlers::lubrifiants::delete_lubrifiant,
        handlers::lubrifiants::list_saisielubrifiants,
        handlers::lubrifiants::create_saisielubrifiant,
        handlers::lubrifiants::get_saisielubrifiant,
        handlers::lubrifiants::update_saisielubrifiant,
        handlers::lubrifiants::delete_saisielubrifiant,

        // --- Imports ---
        handlers::imports::import_resource,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,
            models::auth::SessionView,
            models::auth::CreateUserPayload,
            models::auth::UpdateUserPayload,
            models::auth::UserResponse,

            // --- Entreprises ---
            models::entreprise::Entreprise,
            models::entreprise::CreateEntreprisePayload,
            models::entreprise::UpdateEntreprisePayload,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Permission,
            models::rbac::CreateRolePayload,
            models::rbac::UpdateRolePayload,
            models::rbac::RoleResponse,
            handlers::rbac::RolePermissionsPayload,

            // --- Organisation ---
            models::organisation::Site,
            models::organisation::CreateSitePayload,
            models::organisation::UpdateSitePayload,
            models::organisation::TypeParc,
            models::organisation::NamePayload,
            models::organisation::Parc,
            models::organisation::ParcDetail,
            models::organisation::CreateParcPayload,
            models::organisation::UpdateParcPayload,

            // --- Engins ---
            models::engin::Engin,
            models::engin::CreateEnginPayload,
            models::engin::UpdateEnginPayload,
            models::engin::HeuresChassis,

            // --- Pannes ---
            models::panne::TypePanne,
            models::panne::TypePannePayload,
            models::panne::Panne,
            models::panne::PanneDetail,
            models::panne::CreatePannePayload,
            models::panne::UpdatePannePayload,

            // --- Saisies ---
            models::saisie::Saisiehrm,
            models::saisie::CreateSaisiehrmPayload,
            models::saisie::UpdateSaisiehrmPayload,
            models::saisie::Saisiehim,
            models::saisie::CreateSaisiehimPayload,
            models::saisie::UpdateSaisiehimPayload,
            models::saisie::SaisiehrmDetail,

            // --- Lubrifiants ---
            models::lubrifiant::TypeLubrifiant,
            models::lubrifiant::Lubrifiant,
            models::lubrifiant::CreateLubrifiantPayload,
            models::lubrifiant::UpdateLubrifiantPayload,
            models::lubrifiant::TypeConsommationLub,
            models::lubrifiant::Saisielubrifiant,
            models::lubrifiant::CreateSaisielubrifiantPayload,
            models::lubrifiant::UpdateSaisielubrifiantPayload,

            // --- Imports ---
            models::import::ImportMode,
            models::import::ImportRowError,
            models::import::ImportSummary,
            models::import::ImportReport,

            // --- Paginação ---
            crate::common::db_utils::PageMeta,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e sessão"),
        (name = "Entreprises", description = "Console do super admin"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Users", description = "Usuários da entreprise"),
        (name = "Organisation", description = "Sites, types de parc e parcs"),
        (name = "Engins", description = "Equipamentos e horímetro do chassi"),
        (name = "Pannes", description = "Catálogo de pannes"),
        (name = "Saisies", description = "Lançamentos diários HRM / HIM"),
        (name = "Lubrifiants", description = "Lubrificantes e consumo"),
        (name = "Imports", description = "Importação de planilhas Excel")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tenant_route_declares_the_jwt_scheme() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        assert!(json["components"]["securitySchemes"]["api_jwt"].is_object());
        for path in ["/api/saisiehrms", "/api/engins/{id}/heures-chassis", "/api/imports/{resource}"] {
            assert!(json["paths"][path].is_object(), "{}", path);
        }
    }
}
