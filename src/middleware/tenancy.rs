// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Session,
};

// Só o super admin escolhe a entreprise por cabeçalho
pub const ENTREPRISE_ID_HEADER: &str = "x-entreprise-id";

// Entreprise sobre a qual a requisição opera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantContext(pub Uuid);

/// Usuário comum: sempre a própria entreprise (o cabeçalho é ignorado).
/// Super admin: a do cabeçalho `x-entreprise-id`.
pub fn resolve_tenant(session: &Session, headers: &HeaderMap) -> Result<TenantContext, AppError> {
    if let Some(entreprise_id) = session.entreprise_id() {
        return Ok(TenantContext(entreprise_id));
    }

    if session.is_super_admin() {
        return headers
            .get(ENTREPRISE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(TenantContext)
            .ok_or(AppError::MissingTenant);
    }

    Err(AppError::MissingTenant)
}

impl<S> FromRequestParts<S> for TenantContext
where
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

        let tenant =
            resolve_tenant(session, &parts.headers).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

        // Entreprise escolhida por cabeçalho precisa existir
        if session.entreprise_id().is_none() {
            app_state
                .entreprise_service
                .get(tenant.0)
                .await
                .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
        }

        Ok(tenant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{auth::User, entreprise::Entreprise, rbac::Capability};
    use axum::http::HeaderValue;
    use chrono::Utc;
    use std::collections::HashSet;

    fn session(entreprise: Option<Entreprise>, is_super_admin: bool) -> Session {
        Session {
            user: User {
                id: Uuid::new_v4(),
                entreprise_id: entreprise.as_ref().map(|e| e.id),
                email: "u@example.com".into(),
                name: "U".into(),
                password_hash: String::new(),
                active: true,
                is_super_admin,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            entreprise,
            roles: vec![],
            capability: Capability::Scoped(HashSet::new()),
        }
    }

    fn entreprise() -> Entreprise {
        Entreprise {
            id: Uuid::new_v4(),
            name: "ENAFOR".into(),
            active: true,
            language: "fr".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn header(id: Uuid) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ENTREPRISE_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());
        headers
    }

    #[test]
    fn regular_user_cannot_switch_tenant_by_header() {
        let own = entreprise();
        let own_id = own.id;
        let s = session(Some(own), false);

        let tenant = resolve_tenant(&s, &header(Uuid::new_v4())).unwrap();
        assert_eq!(tenant.0, own_id);
    }

    #[test]
    fn super_admin_targets_the_header_entreprise() {
        let target = Uuid::new_v4();
        let s = session(None, true);

        assert_eq!(resolve_tenant(&s, &header(target)).unwrap().0, target);
        assert!(matches!(resolve_tenant(&s, &HeaderMap::new()), Err(AppError::MissingTenant)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn super_admin_header_must_name_an_existing_entreprise(pool: sqlx::PgPool) {
        let state = crate::common::test_support::state(pool.clone());
        let known = crate::common::test_support::entreprise(&pool, "ENAFOR").await;

        let parts_for = |id: Uuid| {
            let (mut parts, _) = axum::http::Request::builder()
                .header(ENTREPRISE_ID_HEADER, id.to_string())
                .body(())
                .unwrap()
                .into_parts();
            parts.extensions.insert(session(None, true));
            parts
        };

        let tenant = TenantContext::from_request_parts(&mut parts_for(known), &state).await.unwrap();
        assert_eq!(tenant.0, known);

        let err = TenantContext::from_request_parts(&mut parts_for(Uuid::new_v4()), &state)
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::NOT_FOUND);
    }
}
