// src/handlers/imports.rs
//
// Upload de planilha Excel (campo multipart "file").

use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermImportsCreate, RequirePermission},
        tenancy::TenantContext,
    },
    models::import::{ImportQuery, ImportReport, ImportResource},
};

// POST /api/imports/{resource}?mode=create|update
#[utoipa::path(
    post,
    path = "/api/imports/{resource}",
    tag = "Imports",
    params(
        ("resource" = String, Path, description = "sites | parcs | engins | pannes"),
        ImportQuery
    ),
    request_body(content = String, content_type = "multipart/form-data", description = "Campo `file` com o .xlsx"),
    responses(
        (status = 200, description = "Relatório linha a linha", body = ImportReport),
        (status = 400, description = "Arquivo ilegível ou recurso desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_resource(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequirePermission<PermImportsCreate>,
    Path(resource): Path<String>,
    Query(query): Query<ImportQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let resource: ImportResource = resource.parse().map_err(to_api)?;

    let mut file_data: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| to_api(AppError::InvalidImportFile(e.to_string())))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| to_api(AppError::InvalidImportFile(e.to_string())))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes = file_data.ok_or_else(|| to_api(AppError::InvalidImportFile("file".to_string())))?;

    tracing::info!(entreprise_id = %tenant.0, ?resource, mode = ?query.mode, size = bytes.len(), "importação recebida");

    let report = app_state
        .import_service
        .import(tenant.0, resource, query.mode, &locale, bytes)
        .await
        .map_err(to_api)?;

    Ok(Json(report))
}
