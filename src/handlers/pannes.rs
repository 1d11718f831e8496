// src/handlers/pannes.rs
//
// Catálogo de types de panne e pannes (com os parcs autorizados).

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
            PermPannesCreate, PermPannesDelete, PermPannesRead, PermPannesUpdate, PermTypepannesCreate,
            PermTypepannesDelete, PermTypepannesRead, PermTypepannesUpdate, RequirePermission,
        },
        tenancy::TenantContext,
    },
    models::panne::{CreatePannePayload, Panne, PanneDetail, PanneFilter, TypePanne, TypePannePayload, UpdatePannePayload},
};

// ---
// Types de panne
// ---

#[utoipa::path(
    get,
    path = "/api/typepannes",
    tag = "Pannes",
    responses((status = 200, description = "Types de panne", body = [TypePanne])),
    security(("api_jwt" = []))
)]
pub async fn list_typepannes(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermTypepannesRead>,
) -> Result<impl IntoResponse, ApiError> {
    let typepannes = app_state
        .panne_service
        .list_typepannes(tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(typepannes))
}

#[utoipa::path(
    post,
    path = "/api/typepannes",
    tag = "Pannes",
    request_body = TypePannePayload,
    responses((status = 201, description = "Type de panne criado", body = TypePanne)),
    security(("api_jwt" = []))
)]
pub async fn create_typepanne(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermTypepannesCreate>,
    Json(payload): Json<TypePannePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let typepanne = app_state
        .panne_service
        .create_typepanne(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(typepanne)))
}

#[utoipa::path(
    get,
    path = "/api/typepannes/{id}",
    tag = "Pannes",
    params(("id" = Uuid, Path, description = "ID do type de panne")),
    responses((status = 200, description = "Type de panne", body = TypePanne)),
    security(("api_jwt" = []))
)]
pub async fn get_typepanne(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermTypepannesRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let typepanne = app_state
        .panne_service
        .get_typepanne(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(typepanne))
}

#[utoipa::path(
    patch,
    path = "/api/typepannes/{id}",
    tag = "Pannes",
    params(("id" = Uuid, Path, description = "ID do type de panne")),
    request_body = TypePannePayload,
    responses((status = 200, description = "Type de panne atualizado", body = TypePanne)),
    security(("api_jwt" = []))
)]
pub async fn update_typepanne(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermTypepannesUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TypePannePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let typepanne = app_state
        .panne_service
        .update_typepanne(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(typepanne))
}

#[utoipa::path(
    delete,
    path = "/api/typepannes/{id}",
    tag = "Pannes",
    params(("id" = Uuid, Path, description = "ID do type de panne")),
    responses(
        (status = 204, description = "Type de panne excluído"),
        (status = 400, description = "Ainda usado por pannes")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_typepanne(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermTypepannesDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .panne_service
        .delete_typepanne(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Pannes
// ---

#[utoipa::path(
    get,
    path = "/api/pannes",
    tag = "Pannes",
    params(PanneFilter, Pagination),
    responses((status = 200, description = "Página de pannes ({ data, pagination })", body = [Panne])),
    security(("api_jwt" = []))
)]
pub async fn list_pannes(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermPannesRead>,
    Query(filter): Query<PanneFilter>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, ApiError> {
    let page = app_state
        .panne_service
        .list_pannes(tenant.0, filter, pagination)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(page))
}

#[utoipa::path(
    post,
    path = "/api/pannes",
    tag = "Pannes",
    request_body = CreatePannePayload,
    responses(
        (status = 201, description = "Panne criada", body = PanneDetail),
        (status = 400, description = "Type de panne ou parc fora da entreprise")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_panne(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermPannesCreate>,
    Json(payload): Json<CreatePannePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let panne = app_state
        .panne_service
        .create_panne(tenant.0, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(panne)))
}

#[utoipa::path(
    get,
    path = "/api/pannes/{id}",
    tag = "Pannes",
    params(("id" = Uuid, Path, description = "ID da panne")),
    responses((status = 200, description = "Panne com parcs autorizados", body = PanneDetail)),
    security(("api_jwt" = []))
)]
pub async fn get_panne(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermPannesRead>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let panne = app_state
        .panne_service
        .get_panne(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(panne))
}

#[utoipa::path(
    patch,
    path = "/api/pannes/{id}",
    tag = "Pannes",
    params(("id" = Uuid, Path, description = "ID da panne")),
    request_body = UpdatePannePayload,
    responses((status = 200, description = "Panne atualizada", body = PanneDetail)),
    security(("api_jwt" = []))
)]
pub async fn update_panne(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermPannesUpdate>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePannePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let panne = app_state
        .panne_service
        .update_panne(tenant.0, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(panne))
}

#[utoipa::path(
    delete,
    path = "/api/pannes/{id}",
    tag = "Pannes",
    params(("id" = Uuid, Path, description = "ID da panne")),
    responses(
        (status = 204, description = "Panne excluída"),
        (status = 400, description = "Panne ainda referenciada por saisies HIM")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_panne(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermPannesDelete>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .panne_service
        .delete_panne(tenant.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
