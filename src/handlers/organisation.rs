// src/handlers/organisation.rs
//
// Sites, types de parc e parcs.

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
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{
            PermParcsCreate, PermParcsDelete, PermParcsRead, PermParcsUpdate, PermSitesCreate, PermSitesDelete,
            PermSitesRead, PermSitesUpdate, PermTypeparcsCreate, PermTypeparcsDelete, PermTypeparcsRead,
            PermTypeparcsUpdate, RequirePermission,
        },
        tenancy::TenantContext,
    },
    models::organisation::{
        CreateParcPayload, CreateSitePayload, NamePayload, Parc, ParcDetail, Site, TypeParc, UpdateParcPayload,
        UpdateSitePayload,
    },
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ParcQuery {
    pub typeparc_id: Option<Uuid>,
}

// =============================================================================
//  1. SITES
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/sites",
    tag = "Organisation",
    responses((status = 200, description = "Sites da entreprise", body = [Site])),
    security(("api_jwt" = []))
)]
pub async fn list_sites(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSitesRead>,
) -> Result<impl IntoResponse, ApiError> {
    let sites = app_state
        .organisation_service
        .list_sites(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(sites))
}

#[utoipa::path(
    post,
    path = "/api/sites",
    tag = "Organisation",
    request_body = CreateSitePayload,
    responses(
        (status = 201, description = "Site criado", body = Site),
        (status = 409, description = "Nome já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_site(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSitesCreate>,
    Json(payload): Json<CreateSitePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let site = app_state
        .organisation_service
        .create_site(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(site)))
}

#[utoipa::path(
    get,
    path = "/api/sites/{id}",
    tag = "Organisation",
    params(("id" = Uuid, Path, description = "ID do site")),
    responses((status = 200, description = "Site", body = Site)),
    security(("api_jwt" = []))
)]
pub async fn get_site(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSitesRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let site = app_state
        .organisation_service
        .get_site(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(site))
}

#[utoipa::path(
    patch,
    path = "/api/sites/{id}",
    tag = "Organisation",
    params(("id" = Uuid, Path, description = "ID do site")),
    request_body = UpdateSitePayload,
    responses((status = 200, description = "Site atualizado", body = Site)),
    security(("api_jwt" = []))
)]
pub async fn update_site(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSitesUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSitePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let site = app_state
        .organisation_service
        .update_site(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(site))
}

#[utoipa::path(
    delete,
    path = "/api/sites/{id}",
    tag = "Organisation",
    params(("id" = Uuid, Path, description = "ID do site")),
    responses(
        (status = 204, description = "Site excluído"),
        (status = 400, description = "Site ainda tem engins")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_site(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSitesDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .organisation_service
        .delete_site(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  2. TYPES DE PARC
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/typeparcs",
    tag = "Organisation",
    responses((status = 200, description = "Types de parc", body = [TypeParc])),
    security(("api_jwt" = []))
)]
pub async fn list_typeparcs(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermTypeparcsRead>,
) -> Result<impl IntoResponse, ApiError> {
    let typeparcs = app_state
        .organisation_service
        .list_typeparcs(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(typeparcs))
}

#[utoipa::path(
    post,
    path = "/api/typeparcs",
    tag = "Organisation",
    request_body = NamePayload,
    responses((status = 201, description = "Type de parc criado", body = TypeParc)),
    security(("api_jwt" = []))
)]
pub async fn create_typeparc(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermTypeparcsCreate>,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let typeparc = app_state
        .organisation_service
        .create_typeparc(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(typeparc)))
}

#[utoipa::path(
    get,
    path = "/api/typeparcs/{id}",
    tag = "Organisation",
    params(("id" = Uuid, Path, description = "ID do type de parc")),
    responses((status = 200, description = "Type de parc", body = TypeParc)),
    security(("api_jwt" = []))
)]
pub async fn get_typeparc(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermTypeparcsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let typeparc = app_state
        .organisation_service
        .get_typeparc(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(typeparc))
}

#[utoipa::path(
    patch,
    path = "/api/typeparcs/{id}",
    tag = "Organisation",
    params(("id" = Uuid, Path, description = "ID do type de parc")),
    request_body = NamePayload,
    responses((status = 200, description = "Type de parc renomeado", body = TypeParc)),
    security(("api_jwt" = []))
)]
pub async fn update_typeparc(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermTypeparcsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NamePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let typeparc = app_state
        .organisation_service
        .update_typeparc(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(typeparc))
}

#[utoipa::path(
    delete,
    path = "/api/typeparcs/{id}",
    tag = "Organisation",
    params(("id" = Uuid, Path, description = "ID do type de parc")),
    responses(
        (status = 204, description = "Type de parc excluído"),
        (status = 400, description = "Ainda usado por parcs")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_typeparc(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermTypeparcsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .organisation_service
        .delete_typeparc(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  3. PARCS
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/parcs",
    tag = "Organisation",
    params(ParcQuery),
    responses((status = 200, description = "Parcs", body = [Parc])),
    security(("api_jwt" = []))
)]
pub async fn list_parcs(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermParcsRead>,
    Query(query): Query<ParcQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let parcs = app_state
        .organisation_service
        .list_parcs(tenant.0, query.typeparc_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(parcs))
}

#[utoipa::path(
    post,
    path = "/api/parcs",
    tag = "Organisation",
    request_body = CreateParcPayload,
    responses(
        (status = 201, description = "Parc criado com suas associações", body = ParcDetail),
        (status = 400, description = "Referência fora da entreprise")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_parc(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermParcsCreate>,
    Json(payload): Json<CreateParcPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let parc = app_state
        .organisation_service
        .create_parc(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(parc)))
}

#[utoipa::path(
    get,
    path = "/api/parcs/{id}",
    tag = "Organisation",
    params(("id" = Uuid, Path, description = "ID do parc")),
    responses((status = 200, description = "Parc com associações", body = ParcDetail)),
    security(("api_jwt" = []))
)]
pub async fn get_parc(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermParcsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let parc = app_state
        .organisation_service
        .get_parc(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(parc))
}

#[utoipa::path(
    patch,
    path = "/api/parcs/{id}",
    tag = "Organisation",
    params(("id" = Uuid, Path, description = "ID do parc")),
    request_body = UpdateParcPayload,
    responses((status = 200, description = "Parc atualizado", body = ParcDetail)),
    security(("api_jwt" = []))
)]
pub async fn update_parc(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermParcsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateParcPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let parc = app_state
        .organisation_service
        .update_parc(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(parc))
}

#[utoipa::path(
    delete,
    path = "/api/parcs/{id}",
    tag = "Organisation",
    params(("id" = Uuid, Path, description = "ID do parc")),
    responses(
        (status = 204, description = "Parc excluído"),
        (status = 400, description = "Parc ainda tem engins")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_parc(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermParcsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .organisation_service
        .delete_parc(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
