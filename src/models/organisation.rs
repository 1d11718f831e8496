// src/models/organisation.rs
//
// Hierarquia física da entreprise: sites, tipos de parc e parcs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- 1. Site ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    #[schema(example = "Hassi Messaoud")]
    pub name: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSitePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSitePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: Option<String>,
    pub active: Option<bool>,
}

// --- 2. Type de parc ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeParc {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    #[schema(example = "Engins de terrassement")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Payload simples usado pelos catálogos "só nome" (typeparcs, typelubrifiants, ...)
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,
}

// --- 3. Parc ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Parc {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    pub typeparc_id: Uuid,
    #[schema(example = "Chargeuses 980")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Parc + associações (tipos de panne e tipos de consumo de lubrificante)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParcDetail {
    #[serde(flatten)]
    pub parc: Parc,
    pub typepanne_ids: Vec<Uuid>,
    pub typeconsommationlub_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateParcPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,

    #[validate(required(message = "validation.required"))]
    pub typeparc_id: Option<Uuid>,

    #[serde(default)]
    pub typepanne_ids: Vec<Uuid>,

    #[serde(default)]
    pub typeconsommationlub_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParcPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: Option<String>,
    pub typeparc_id: Option<Uuid>,
    pub typepanne_ids: Option<Vec<Uuid>>,
    pub typeconsommationlub_ids: Option<Vec<Uuid>>,
}
