// src/handlers/entreprises.rs
//
// Console do super admin (a rota inteira passa pelo `super_admin_guard`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::entreprise::{CreateEntreprisePayload, Entreprise, UpdateEntreprisePayload},
};

#[utoipa::path(
    get,
    path = "/api/entreprises",
    tag = "Entreprises",
    responses(
        (status = 200, description = "Todas as entreprises", body = [Entreprise]),
        (status = 401, description = "Apenas super admin")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_entreprises(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<impl IntoResponse, ApiError> {
    let entreprises = app_state
        .entreprise_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entreprises))
}

#[utoipa::path(
    post,
    path = "/api/entreprises",
    tag = "Entreprises",
    request_body = CreateEntreprisePayload,
    responses(
        (status = 201, description = "Entreprise criada com cargo admin e primeiro usuário", body = Entreprise),
        (status = 409, description = "Nome ou e-mail já usado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_entreprise(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<CreateEntreprisePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let entreprise = app_state
        .entreprise_service
        .create_with_admin(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(entreprise)))
}

#[utoipa::path(
    get,
    path = "/api/entreprises/{id}",
    tag = "Entreprises",
    params(("id" = Uuid, Path, description = "ID da entreprise")),
    responses((status = 200, description = "Entreprise", body = Entreprise)),
    security(("api_jwt" = []))
)]
pub async fn get_entreprise(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let entreprise = app_state
        .entreprise_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entreprise))
}

#[utoipa::path(
    patch,
    path = "/api/entreprises/{id}",
    tag = "Entreprises",
    params(("id" = Uuid, Path, description = "ID da entreprise")),
    request_body = UpdateEntreprisePayload,
    responses((status = 200, description = "Entreprise atualizada", body = Entreprise)),
    security(("api_jwt" = []))
)]
pub async fn update_entreprise(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEntreprisePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let entreprise = app_state
        .entreprise_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(entreprise))
}

#[utoipa::path(
    delete,
    path = "/api/entreprises/{id}",
    tag = "Entreprises",
    params(("id" = Uuid, Path, description = "ID da entreprise")),
    responses(
        (status = 204, description = "Entreprise excluída"),
        (status = 400, description = "Ainda possui usuários ou sites")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_entreprise(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .entreprise_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
