// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use std::marker::PhantomData;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::{resolve_locale, Locale},
    models::auth::Session,
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// Verifica a capacidade da sessão contra o slug exigido.
pub fn check_permission(session: &Session, slug: &str) -> Result<(), AppError> {
    if session.capability.allows(slug) {
        return Ok(());
    }
    tracing::warn!(user_id = %session.user.id, permission = slug, "permissão negada");
    Err(AppError::PermissionDenied { slug: slug.to_string() })
}

/// 2. O Extractor (Guardião)
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AppError::InvalidToken)
            .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        check_permission(session, T::slug()).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        Ok(RequirePermission(PhantomData))
    }
}

// Console das entreprises: só super admin (roda depois do auth_guard)
pub async fn super_admin_guard(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = request.extensions().get::<Session>();
    let locale = resolve_locale(
        request.headers(),
        session,
        &app_state.i18n_store,
        &app_state.settings.default_locale,
    );

    match session {
        Some(session) if session.is_super_admin() => Ok(next.run(request).await),
        Some(_) => Err(AppError::SuperAdminRequired.to_api_error(&locale, &app_state.i18n_store)),
        None => Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store)),
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

macro_rules! permissions {
    ($($name:ident => $slug:literal),* $(,)?) => {
        $(
            pub struct $name;
            impl PermissionDef for $name {
                fn slug() -> &'static str { $slug }
            }
        )*
    };
}

permissions! {
    PermSitesRead => "sites:read",
    PermSitesCreate => "sites:create",
    PermSitesUpdate => "sites:update",
    PermSitesDelete => "sites:delete",

    PermTypeparcsRead => "typeparcs:read",
    PermTypeparcsCreate => "typeparcs:create",
    PermTypeparcsUpdate => "typeparcs:update",
    PermTypeparcsDelete => "typeparcs:delete",

    PermParcsRead => "parcs:read",
    PermParcsCreate => "parcs:create",
    PermParcsUpdate => "parcs:update",
    PermParcsDelete => "parcs:delete",

    PermEnginsRead => "engins:read",
    PermEnginsCreate => "engins:create",
    PermEnginsUpdate => "engins:update",
    PermEnginsDelete => "engins:delete",

    PermTypepannesRead => "typepannes:read",
    PermTypepannesCreate => "typepannes:create",
    PermTypepannesUpdate => "typepannes:update",
    PermTypepannesDelete => "typepannes:delete",

    PermPannesRead => "pannes:read",
    PermPannesCreate => "pannes:create",
    PermPannesUpdate => "pannes:update",
    PermPannesDelete => "pannes:delete",

    PermSaisiehrmsRead => "saisiehrms:read",
    PermSaisiehrmsCreate => "saisiehrms:create",
    PermSaisiehrmsUpdate => "saisiehrms:update",
    PermSaisiehrmsDelete => "saisiehrms:delete",

    PermSaisiehimsRead => "saisiehims:read",
    PermSaisiehimsCreate => "saisiehims:create",
    PermSaisiehimsUpdate => "saisiehims:update",
    PermSaisiehimsDelete => "saisiehims:delete",

    // Cobre também os catálogos de tipos de lubrifiant e de consumo
    PermLubrifiantsRead => "lubrifiants:read",
    PermLubrifiantsCreate => "lubrifiants:create",
    PermLubrifiantsUpdate => "lubrifiants:update",
    PermLubrifiantsDelete => "lubrifiants:delete",

    PermSaisielubrifiantsRead => "saisielubrifiants:read",
    PermSaisielubrifiantsCreate => "saisielubrifiants:create",
    PermSaisielubrifiantsUpdate => "saisielubrifiants:update",
    PermSaisielubrifiantsDelete => "saisielubrifiants:delete",

    PermRolesRead => "roles:read",
    PermRolesCreate => "roles:create",
    PermRolesUpdate => "roles:update",
    PermRolesDelete => "roles:delete",

    PermUsersRead => "users:read",
    PermUsersCreate => "users:create",
    PermUsersUpdate => "users:update",
    PermUsersDelete => "users:delete",

    PermImportsCreate => "imports:create",
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auth::User, rbac::Capability};
    use chrono::Utc;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn session(capability: Capability) -> Session {
        Session {
            user: User {
                id: Uuid::new_v4(),
                entreprise_id: Some(Uuid::new_v4()),
                email: "op@example.com".into(),
                name: "Opérateur".into(),
                password_hash: String::new(),
                active: true,
                is_super_admin: false,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            entreprise: None,
            roles: vec!["Saisie".into()],
            capability,
        }
    }

    #[test]
    fn scoped_session_needs_the_exact_slug() {
        let s = session(Capability::Scoped(HashSet::from(["saisiehrms:create".to_string()])));

        assert!(check_permission(&s, PermSaisiehrmsCreate::slug()).is_ok());
        assert!(matches!(
            check_permission(&s, PermSaisiehrmsDelete::slug()),
            Err(AppError::PermissionDenied { slug }) if slug == "saisiehrms:delete"
        ));
    }

    #[test]
    fn full_access_passes_everything() {
        let s = session(Capability::FullAccess);
        assert!(check_permission(&s, PermRolesDelete::slug()).is_ok());
        assert!(check_permission(&s, PermImportsCreate::slug()).is_ok());
    }
}
