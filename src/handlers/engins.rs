// src/handlers/engins.rs

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
        rbac::{PermEnginsCreate, PermEnginsDelete, PermEnginsRead, PermEnginsUpdate, RequirePermission},
        tenancy::TenantContext,
    },
    models::engin::{CreateEnginPayload, Engin, EnginFilter, HeuresChassis, HeuresChassisQuery, UpdateEnginPayload},
};

// GET /api/engins?parcId=&siteId=&active=&search=&page=&pageSize=
#[utoipa::path(
    get,
    path = "/api/engins",
    tag = "Engins",
    params(EnginFilter, Pagination),
    responses((status = 200, description = "Página de engins ({ data, pagination })", body = [Engin])),
    security(("api_jwt" = []))
)]
pub async fn list_engins(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermEnginsRead>,
    Query(filter): Query<EnginFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .engin_service
        .list(tenant.0, filter, pagination)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/engins",
    tag = "Engins",
    request_body = CreateEnginPayload,
    responses(
        (status = 201, description = "Engin criado", body = Engin),
        (status = 400, description = "Parc ou site fora da entreprise"),
        (status = 409, description = "Nome já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_engin(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermEnginsCreate>,
    Json(payload): Json<CreateEnginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let engin = app_state
        .engin_service
        .create(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(engin)))
}

#[utoipa::path(
    get,
    path = "/api/engins/{id}",
    tag = "Engins",
    params(("id" = Uuid, Path, description = "ID do engin")),
    responses(
        (status = 200, description = "Engin", body = Engin),
        (status = 404, description = "Engin não encontrado na entreprise")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_engin(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermEnginsRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let engin = app_state
        .engin_service
        .get(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(engin))
}

#[utoipa::path(
    patch,
    path = "/api/engins/{id}",
    tag = "Engins",
    params(("id" = Uuid, Path, description = "ID do engin")),
    request_body = UpdateEnginPayload,
    responses((status = 200, description = "Engin atualizado", body = Engin)),
    security(("api_jwt" = []))
)]
pub async fn update_engin(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermEnginsUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEnginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let engin = app_state
        .engin_service
        .update(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(engin))
}

#[utoipa::path(
    delete,
    path = "/api/engins/{id}",
    tag = "Engins",
    params(("id" = Uuid, Path, description = "ID do engin")),
    responses(
        (status = 204, description = "Engin excluído"),
        (status = 400, description = "Engin ainda tem saisies HRM")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_engin(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermEnginsDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .engin_service
        .delete(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/engins/{id}/heures-chassis?au=YYYY-MM-DD
#[utoipa::path(
    get,
    path = "/api/engins/{id}/heures-chassis",
    tag = "Engins",
    params(("id" = Uuid, Path, description = "ID do engin"), HeuresChassisQuery),
    responses((status = 200, description = "Horímetro do chassi na data", body = HeuresChassis)),
    security(("api_jwt" = []))
)]
pub async fn get_heures_chassis(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermEnginsRead>,
    Path(id): Path<Uuid>,
    Query(query): Query<HeuresChassisQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let heures = app_state
        .engin_service
        .heures_chassis(tenant.0, id, query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(heures))
}
