// src/handlers/lubrifiants.rs
//
// Os catálogos (types de lubrifiant, types de consommation) usam as
// mesmas permissões `lubrifiants:*`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::Pagination,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{
            PermLubrifiantsCreate, PermLubrifiantsDelete, PermLubrifiantsRead, PermLubrifiantsUpdate,
            PermSaisielubrifiantsCreate, PermSaisielubrifiantsDelete, PermSaisielubrifiantsRead,
            PermSaisielubrifiantsUpdate, RequirePermission,
        },
        tenancy::TenantContext,
    },
    models::{
        lubrifiant::{
            CreateLubrifiantPayload, CreateSaisielubrifiantPayload, Lubrifiant, Saisielubrifiant,
            SaisielubrifiantFilter, TypeConsommationLub, TypeLubrifiant, UpdateLubrifiantPayload,
            UpdateSaisielubrifiantPayload,
        },
        organisation::NamePayload,
    },
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct LubrifiantQuery {
    pub typelubrifiant_id: Option<Uuid>,
}

// =============================================================================
//  1. TYPES DE LUBRIFIANT
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/typelubrifiants",
    tag = "Lubrifiants",
    responses((status = 200, description = "Types de lubrifiant", body = [TypeLubrifiant])),
    security(("api_jwt" = []))
)]
pub async fn list_typelubrifiants(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let types = app_state
        .lubrifiant_service
        .list_typelubrifiants(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(types))
}

#[utoipa::path(
    post,
    path = "/api/typelubrifiants",
    tag = "Lubrifiants",
    request_body = NamePayload,
    responses((status = 201, description = "Type de lubrifiant criado", body = TypeLubrifiant)),
    security(("api_jwt" = []))
)]
pub async fn create_typelubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsCreate>,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .lubrifiant_service
        .create_typelubrifiant(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/typelubrifiants/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID do type de lubrifiant")),
    responses((status = 200, description = "Type de lubrifiant", body = TypeLubrifiant)),
    security(("api_jwt" = []))
)]
pub async fn get_typelubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let found = app_state
        .lubrifiant_service
        .get_typelubrifiant(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(found))
}

#[utoipa::path(
    patch,
    path = "/api/typelubrifiants/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID do type de lubrifiant")),
    request_body = NamePayload,
    responses((status = 200, description = "Type de lubrifiant renomeado", body = TypeLubrifiant)),
    security(("api_jwt" = []))
)]
pub async fn update_typelubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .lubrifiant_service
        .update_typelubrifiant(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/typelubrifiants/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID do type de lubrifiant")),
    responses(
        (status = 204, description = "Type de lubrifiant excluído"),
        (status = 400, description = "Ainda usado por lubrifiants")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_typelubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lubrifiant_service
        .delete_typelubrifiant(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  2. TYPES DE CONSOMMATION
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/typeconsommationlubs",
    tag = "Lubrifiants",
    responses((status = 200, description = "Types de consommation", body = [TypeConsommationLub])),
    security(("api_jwt" = []))
)]
pub async fn list_typeconsommationlubs(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let types = app_state
        .lubrifiant_service
        .list_typeconsommationlubs(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(types))
}

#[utoipa::path(
    post,
    path = "/api/typeconsommationlubs",
    tag = "Lubrifiants",
    request_body = NamePayload,
    responses((status = 201, description = "Type de consommation criado", body = TypeConsommationLub)),
    security(("api_jwt" = []))
)]
pub async fn create_typeconsommationlub(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsCreate>,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .lubrifiant_service
        .create_typeconsommationlub(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/typeconsommationlubs/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID do type de consommation")),
    responses((status = 200, description = "Type de consommation", body = TypeConsommationLub)),
    security(("api_jwt" = []))
)]
pub async fn get_typeconsommationlub(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let found = app_state
        .lubrifiant_service
        .get_typeconsommationlub(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(found))
}

#[utoipa::path(
    patch,
    path = "/api/typeconsommationlubs/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID do type de consommation")),
    request_body = NamePayload,
    responses((status = 200, description = "Type de consommation renomeado", body = TypeConsommationLub)),
    security(("api_jwt" = []))
)]
pub async fn update_typeconsommationlub(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .lubrifiant_service
        .update_typeconsommationlub(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/typeconsommationlubs/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID do type de consommation")),
    responses(
        (status = 204, description = "Type de consommation excluído"),
        (status = 400, description = "Ainda usado por saisies de lubrifiant")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_typeconsommationlub(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lubrifiant_service
        .delete_typeconsommationlub(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  3. LUBRIFIANTS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/lubrifiants",
    tag = "Lubrifiants",
    params(LubrifiantQuery),
    responses((status = 200, description = "Lubrifiants", body = [Lubrifiant])),
    security(("api_jwt" = []))
)]
pub async fn list_lubrifiants(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsRead>,
    Query(query): Query<LubrifiantQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let lubrifiants = app_state
        .lubrifiant_service
        .list_lubrifiants(tenant.0, query.typelubrifiant_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lubrifiants))
}

#[utoipa::path(
    post,
    path = "/api/lubrifiants",
    tag = "Lubrifiants",
    request_body = CreateLubrifiantPayload,
    responses(
        (status = 201, description = "Lubrifiant criado", body = Lubrifiant),
        (status = 400, description = "Type de lubrifiant fora da entreprise")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_lubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsCreate>,
    Json(payload): Json<CreateLubrifiantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lubrifiant = app_state
        .lubrifiant_service
        .create_lubrifiant(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(lubrifiant)))
}

#[utoipa::path(
    get,
    path = "/api/lubrifiants/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID do lubrifiant")),
    responses((status = 200, description = "Lubrifiant", body = Lubrifiant)),
    security(("api_jwt" = []))
)]
pub async fn get_lubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let lubrifiant = app_state
        .lubrifiant_service
        .get_lubrifiant(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lubrifiant))
}

#[utoipa::path(
    patch,
    path = "/api/lubrifiants/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID do lubrifiant")),
    request_body = UpdateLubrifiantPayload,
    responses((status = 200, description = "Lubrifiant atualizado", body = Lubrifiant)),
    security(("api_jwt" = []))
)]
pub async fn update_lubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLubrifiantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let lubrifiant = app_state
        .lubrifiant_service
        .update_lubrifiant(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(lubrifiant))
}

#[utoipa::path(
    delete,
    path = "/api/lubrifiants/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID do lubrifiant")),
    responses(
        (status = 204, description = "Lubrifiant excluído"),
        (status = 400, description = "Ainda referenciado por saisies")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermLubrifiantsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lubrifiant_service
        .delete_lubrifiant(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  4. SAISIES DE LUBRIFIANT
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/saisielubrifiants",
    tag = "Lubrifiants",
    params(SaisielubrifiantFilter, Pagination),
    responses((status = 200, description = "Página de saisies ({ data, pagination })", body = [Saisielubrifiant])),
    security(("api_jwt" = []))
)]
pub async fn list_saisielubrifiants(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisielubrifiantsRead>,
    Query(filter): Query<SaisielubrifiantFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .lubrifiant_service
        .list_saisielubrifiants(tenant.0, filter, pagination)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/saisielubrifiants",
    tag = "Lubrifiants",
    request_body = CreateSaisielubrifiantPayload,
    responses(
        (status = 201, description = "Consumo registrado", body = Saisielubrifiant),
        (status = 400, description = "Type de consommation não autorizado para o parc")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_saisielubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisielubrifiantsCreate>,
    Json(payload): Json<CreateSaisielubrifiantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let saisie = app_state
        .lubrifiant_service
        .create_saisielubrifiant(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(saisie)))
}

#[utoipa::path(
    get,
    path = "/api/saisielubrifiants/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID da saisie de lubrifiant")),
    responses((status = 200, description = "Saisie de lubrifiant", body = Saisielubrifiant)),
    security(("api_jwt" = []))
)]
pub async fn get_saisielubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisielubrifiantsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let saisie = app_state
        .lubrifiant_service
        .get_saisielubrifiant(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(saisie))
}

#[utoipa::path(
    patch,
    path = "/api/saisielubrifiants/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID da saisie de lubrifiant")),
    request_body = UpdateSaisielubrifiantPayload,
    responses((status = 200, description = "Saisie de lubrifiant atualizada", body = Saisielubrifiant)),
    security(("api_jwt" = []))
)]
pub async fn update_saisielubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisielubrifiantsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSaisielubrifiantPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let saisie = app_state
        .lubrifiant_service
        .update_saisielubrifiant(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(saisie))
}

#[utoipa::path(
    delete,
    path = "/api/saisielubrifiants/{id}",
    tag = "Lubrifiants",
    params(("id" = Uuid, Path, description = "ID da saisie de lubrifiant")),
    responses((status = 204, description = "Saisie de lubrifiant excluída")),
    security(("api_jwt" = []))
)]
pub async fn delete_saisielubrifiant(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisielubrifiantsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .lubrifiant_service
        .delete_saisielubrifiant(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
