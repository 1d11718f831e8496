// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // ---
    // Regras das saisies (HRM / HIM)
    // ---
    #[error("HRM + HIM ultrapassa 24h (total: {total}h)")]
    DailyHoursExceeded { total: Decimal },

    #[error("Valor de horas inválido no campo {field}")]
    InvalidHours { field: &'static str },

    #[error("O engin informado não corresponde ao engin da saisie HRM")]
    EnginMismatch,

    #[error("Engin inativo: {name}")]
    EnginInactive { name: String },

    #[error("A panne não está associada ao parc do engin")]
    PanneNotAllowedForParc,

    #[error("O tipo de consumo não está associado ao parc do engin")]
    ConsommationNotAllowedForParc,

    // ---
    // Existência / posse (multi-entreprise)
    // ---
    #[error("Recurso não encontrado: {resource}")]
    NotFound { resource: &'static str },

    #[error("Referência inválida: {field}")]
    ReferenceNotFound { field: &'static str },

    // ---
    // Conflitos de unicidade
    // ---
    #[error("Nome já existe ({resource}): {name}")]
    NameAlreadyExists { resource: &'static str, name: String },

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Já existe uma saisie HRM para esse engin em {du}")]
    SaisiehrmAlreadyExists { du: NaiveDate },

    #[error("Já existe uma saisie HIM para essa panne nesta saisie HRM")]
    SaisiehimAlreadyExists,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    // ---
    // Guarda de exclusão
    // ---
    #[error("Exclusão bloqueada: {count} {relation} dependentes")]
    HasDependents { relation: &'static str, count: i64 },

    // ---
    // Importação
    // ---
    #[error("Arquivo de importação inválido: {0}")]
    InvalidImportFile(String),

    #[error("Recurso de importação desconhecido: {0}")]
    UnknownImportResource(String),

    // ---
    // Autenticação / autorização
    // ---
    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Conta ou entreprise inativa")]
    InactiveAccount,

    #[error("Permissão ausente: {slug}")]
    PermissionDenied { slug: String },

    #[error("Acesso restrito ao super admin")]
    SuperAdminRequired,

    #[error("Nome de cargo reservado: {name}")]
    ReservedRoleName { name: String },

    #[error("Contexto de entreprise ausente")]
    MissingTenant,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Erro pronto para a resposta HTTP (já traduzido).
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::DailyHoursExceeded { .. }
            | AppError::InvalidHours { .. }
            | AppError::EnginMismatch
            | AppError::EnginInactive { .. }
            | AppError::PanneNotAllowedForParc
            | AppError::ConsommationNotAllowedForParc
            | AppError::ReferenceNotFound { .. }
            | AppError::HasDependents { .. }
            | AppError::InvalidImportFile(_)
            | AppError::UnknownImportResource(_)
            | AppError::MissingTenant => StatusCode::BAD_REQUEST,

            AppError::NotFound { .. } => StatusCode::NOT_FOUND,

            AppError::NameAlreadyExists { .. }
            | AppError::EmailAlreadyExists
            | AppError::SaisiehrmAlreadyExists { .. }
            | AppError::SaisiehimAlreadyExists
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,

            AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::InactiveAccount
            | AppError::PermissionDenied { .. }
            | AppError::SuperAdminRequired
            | AppError::ReservedRoleName { .. } => StatusCode::UNAUTHORIZED,

            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave do catálogo de mensagens + argumentos para interpolação.
    fn message_key(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => ("validation.invalid_fields", vec![]),
            AppError::DailyHoursExceeded { total } => (
                "hours.daily_limit_exceeded",
                vec![("total", total.normalize().to_string())],
            ),
            AppError::InvalidHours { field } => ("hours.out_of_range", vec![("field", field.to_string())]),
            AppError::EnginMismatch => ("saisie.engin_mismatch", vec![]),
            AppError::EnginInactive { name } => ("saisie.engin_inactive", vec![("name", name.clone())]),
            AppError::PanneNotAllowedForParc => ("saisie.panne_parc", vec![]),
            AppError::ConsommationNotAllowedForParc => ("saisie.consommation_parc", vec![]),
            AppError::NotFound { resource } => ("resource.not_found", vec![("resource", resource.to_string())]),
            AppError::ReferenceNotFound { field } => ("reference.not_found", vec![("field", field.to_string())]),
            AppError::NameAlreadyExists { resource, name } => (
                "conflict.name",
                vec![("resource", resource.to_string()), ("name", name.clone())],
            ),
            AppError::EmailAlreadyExists => ("conflict.email", vec![]),
            AppError::SaisiehrmAlreadyExists { du } => ("conflict.saisiehrm", vec![("du", du.to_string())]),
            AppError::SaisiehimAlreadyExists => ("conflict.saisiehim", vec![]),
            AppError::UniqueConstraintViolation(detail) => ("conflict.generic", vec![("detail", detail.clone())]),
            AppError::HasDependents { relation, count } => (
                "delete.has_dependents",
                vec![("relation", relation.to_string()), ("count", count.to_string())],
            ),
            AppError::InvalidImportFile(detail) => ("import.invalid_file", vec![("detail", detail.clone())]),
            AppError::UnknownImportResource(resource) => {
                ("import.unknown_resource", vec![("resource", resource.clone())])
            }
            AppError::InvalidCredentials => ("auth.invalid_credentials", vec![]),
            AppError::InvalidToken => ("auth.invalid_token", vec![]),
            AppError::InactiveAccount => ("auth.inactive", vec![]),
            AppError::PermissionDenied { slug } => ("auth.permission_denied", vec![("permission", slug.clone())]),
            AppError::SuperAdminRequired => ("auth.super_admin_required", vec![]),
            AppError::ReservedRoleName { name } => ("auth.reserved_role", vec![("name", name.clone())]),
            AppError::MissingTenant => ("tenant.missing", vec![]),
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => ("internal.unexpected", vec![]),
        }
    }

    /// Converte o erro de domínio num `ApiError` traduzido para o idioma da requisição.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let (key, args) = self.message_key();
        let args: Vec<(&str, String)> = args
            .into_iter()
            .map(|(name, value)| match name {
                // Nomes de recursos/relações também passam pelo catálogo
                "resource" | "relation" | "field" => (name, i18n.label(&locale.0, &value)),
                _ => (name, value),
            })
            .collect();
        let message = i18n.translate(&locale.0, key, &args);

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<Value> = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or("validation.invalid");
                            Value::String(i18n.translate(&locale.0, key, &[]))
                        })
                        .collect();
                    details.insert(field.to_string(), Value::Array(messages));
                }
                Some(Value::Object(details))
            }
            _ => None,
        };

        ApiError { status, message, details }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "message": self.message, "details": details }),
            None => json!({ "message": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

// Fallback para caminhos que não têm Locale à mão (ex.: middleware).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::global_fallback())
            .into_response()
    }
}

/// Erro de validação de um único campo (mesmo formato do `validator`).
pub fn field_error(field: &'static str, message_key: &'static str) -> AppError {
    let mut err = validator::ValidationError::new("invalid");
    err.message = Some(message_key.into());
    let mut errors = validator::ValidationErrors::new();
    errors.add(field, err);
    AppError::ValidationError(errors)
}

/// Converte `unique_violation` do Postgres no erro de conflito indicado.
pub fn map_unique_violation(e: sqlx::Error, conflict: impl FnOnce(&str) -> AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            return conflict(&constraint);
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> I18nStore {
        I18nStore::load("fr").expect("catalogues embutidos")
    }

    #[test]
    fn daily_hours_error_names_the_total() {
        let err = AppError::DailyHoursExceeded { total: Decimal::new(2500, 2) };
        let api = err.to_api_error(&Locale("en".into()), &store());

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.message.contains("Total: 25h"), "{}", api.message);
    }

    #[test]
    fn fractional_total_keeps_significant_digits() {
        let err = AppError::DailyHoursExceeded { total: Decimal::new(2450, 2) };
        let api = err.to_api_error(&Locale("fr".into()), &store());

        assert!(api.message.contains("Total: 24.5h"), "{}", api.message);
    }

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(AppError::NotFound { resource: "engin" }.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::SaisiehimAlreadyExists.status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::SaisiehrmAlreadyExists { du: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() }.status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::HasDependents { relation: "engins", count: 2 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PermissionDenied { slug: "engins:read".into() }.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InternalServerError(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn dependents_message_names_relation_and_count() {
        let err = AppError::HasDependents { relation: "engins", count: 3 };
        let api = err.to_api_error(&Locale("fr".into()), &store());

        assert!(api.message.contains('3'), "{}", api.message);
        assert!(api.message.to_lowercase().contains("engin"), "{}", api.message);
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco vazou"));
        let api = err.to_api_error(&Locale("fr".into()), &store());

        assert!(!api.message.contains("senha"));
    }

    #[test]
    fn single_field_error_is_a_validation_error() {
        let err = field_error("name", "validation.required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let api = err.to_api_error(&Locale("fr".into()), &store());
        assert!(api.details.expect("details").get("name").is_some());
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let mut errors = validator::ValidationErrors::new();
        let mut e = validator::ValidationError::new("required");
        e.message = Some("validation.required".into());
        errors.add("name", e);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("en".into()), &store());
        let details = api.details.expect("details");

        assert!(details.get("name").is_some());
    }
}
