// src/handlers/saisies.rs
//
// Saisies diárias: HRM (horas de marcha) e HIM (horas de imobilização).
// A regra das 24h vive no `SaisieService`; aqui só validação de forma.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
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
            PermSaisiehimsCreate, PermSaisiehimsDelete, PermSaisiehimsRead, PermSaisiehimsUpdate,
            PermSaisiehrmsCreate, PermSaisiehrmsDelete, PermSaisiehrmsRead, PermSaisiehrmsUpdate, RequirePermission,
        },
        tenancy::TenantContext,
    },
    models::saisie::{
        CreateSaisiehimPayload, CreateSaisiehrmPayload, Saisiehim, SaisiehimFilter, Saisiehrm, SaisiehrmDetail,
        SaisiehrmFilter, UpdateSaisiehimPayload, UpdateSaisiehrmPayload,
    },
};

// =============================================================================
//  1. HRM
// =============================================================================

// GET /api/saisiehrms?enginId=&siteId=&du=&from=&to=
#[utoipa::path(
    get,
    path = "/api/saisiehrms",
    tag = "Saisies",
    params(SaisiehrmFilter, Pagination),
    responses(
        (status = 200, description = "Página de saisies HRM ({ data, pagination })", body = [Saisiehrm]),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_saisiehrms(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisiehrmsRead>,
    Query(filter): Query<SaisiehrmFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    filter
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let page = app_state
        .saisie_service
        .list_saisiehrms(tenant.0, filter, pagination)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/saisiehrms",
    tag = "Saisies",
    request_body = CreateSaisiehrmPayload,
    responses(
        (status = 201, description = "Saisie HRM criada", body = Saisiehrm),
        (status = 400, description = "Horas fora de [0, 24] ou engin inativo"),
        (status = 409, description = "Já existe uma saisie para este engin neste dia")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_saisiehrm(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisiehrmsCreate>,
    Json(payload): Json<CreateSaisiehrmPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let saisiehrm = app_state
        .saisie_service
        .create_saisiehrm(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(saisiehrm)))
}

#[utoipa::path(
    get,
    path = "/api/saisiehrms/{id}",
    tag = "Saisies",
    params(("id" = Uuid, Path, description = "ID da saisie HRM")),
    responses((status = 200, description = "Saisie HRM com as HIM do dia e o saldo", body = SaisiehrmDetail)),
    security(("api_jwt" = []))
)]
pub async fn get_saisiehrm(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisiehrmsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = app_state
        .saisie_service
        .get_saisiehrm(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

#[utoipa::path(
    patch,
    path = "/api/saisiehrms/{id}",
    tag = "Saisies",
    params(("id" = Uuid, Path, description = "ID da saisie HRM")),
    request_body = UpdateSaisiehrmPayload,
    responses(
        (status = 200, description = "Saisie HRM atualizada", body = Saisiehrm),
        (status = 400, description = "HRM + ΣHIM ultrapassaria 24h")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_saisiehrm(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisiehrmsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSaisiehrmPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let saisiehrm = app_state
        .saisie_service
        .update_saisiehrm(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(saisiehrm))
}

#[utoipa::path(
    delete,
    path = "/api/saisiehrms/{id}",
    tag = "Saisies",
    params(("id" = Uuid, Path, description = "ID da saisie HRM")),
    responses(
        (status = 204, description = "Saisie HRM excluída"),
        (status = 400, description = "Ainda possui saisies HIM")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_saisiehrm(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisiehrmsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .saisie_service
        .delete_saisiehrm(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  2. HIM
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/saisiehims",
    tag = "Saisies",
    params(SaisiehimFilter, Pagination),
    responses((status = 200, description = "Página de saisies HIM ({ data, pagination })", body = [Saisiehim])),
    security(("api_jwt" = []))
)]
pub async fn list_saisiehims(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisiehimsRead>,
    Query(filter): Query<SaisiehimFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .saisie_service
        .list_saisiehims(tenant.0, filter, pagination)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/saisiehims",
    tag = "Saisies",
    request_body = CreateSaisiehimPayload,
    responses(
        (status = 201, description = "Saisie HIM criada", body = Saisiehim),
        (status = 400, description = "Engin divergente, panne não autorizada ou total acima de 24h"),
        (status = 409, description = "Panne já lançada nesta saisie HRM")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_saisiehim(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisiehimsCreate>,
    Json(payload): Json<CreateSaisiehimPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let saisiehim = app_state
        .saisie_service
        .create_saisiehim(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(saisiehim)))
}

#[utoipa::path(
    get,
    path = "/api/saisiehims/{id}",
    tag = "Saisies",
    params(("id" = Uuid, Path, description = "ID da saisie HIM")),
    responses((status = 200, description = "Saisie HIM", body = Saisiehim)),
    security(("api_jwt" = []))
)]
pub async fn get_saisiehim(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisiehimsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let saisiehim = app_state
        .saisie_service
        .get_saisiehim(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(saisiehim))
}

#[utoipa::path(
    patch,
    path = "/api/saisiehims/{id}",
    tag = "Saisies",
    params(("id" = Uuid, Path, description = "ID da saisie HIM")),
    request_body = UpdateSaisiehimPayload,
    responses((status = 200, description = "Saisie HIM atualizada", body = Saisiehim)),
    security(("api_jwt" = []))
)]
pub async fn update_saisiehim(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisiehimsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSaisiehimPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let saisiehim = app_state
        .saisie_service
        .update_saisiehim(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(saisiehim))
}

#[utoipa::path(
    delete,
    path = "/api/saisiehims/{id}",
    tag = "Saisies",
    params(("id" = Uuid, Path, description = "ID da saisie HIM")),
    responses(
        (status = 204, description = "Saisie HIM excluída"),
        (status = 400, description = "Ainda possui saisies de lubrifiant")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_saisiehim(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermSaisiehimsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .saisie_service
        .delete_saisiehim(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
