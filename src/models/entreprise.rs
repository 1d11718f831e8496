// src/models/entreprise.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// ---
// Entreprise (o "tenant")
// ---
// Raiz do isolamento: toda outra entidade carrega `entreprise_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Entreprise {
    pub id: Uuid,
    #[schema(example = "Sonatrach Maintenance")]
    pub name: String,
    pub active: bool,
    #[schema(example = "fr")]
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Criação pelo super admin: a entreprise nasce com um cargo "admin" e o primeiro usuário.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEntreprisePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,

    #[validate(length(min = 2, max = 5, message = "validation.invalid"))]
    pub language: Option<String>,

    #[validate(email(message = "validation.email"))]
    pub admin_email: String,

    #[validate(length(min = 1, message = "validation.required"))]
    pub admin_name: String,

    #[validate(length(min = 6, message = "validation.password_length"))]
    pub admin_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEntreprisePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: Option<String>,
    pub active: Option<bool>,
    #[validate(length(min = 2, max = 5, message = "validation.invalid"))]
    pub language: Option<String>,
}
