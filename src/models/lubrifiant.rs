// src/models/lubrifiant.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::engin::validate_not_negative;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeLubrifiant {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    #[schema(example = "Huile moteur")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lubrifiant {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    pub typelubrifiant_id: Uuid,
    #[schema(example = "15W40")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLubrifiantPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,
    #[validate(required(message = "validation.required"))]
    pub typelubrifiant_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLubrifiantPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: Option<String>,
    pub typelubrifiant_id: Option<Uuid>,
}

// Categoria de consumo ("appoint", "vidange"...), associada aos parcs
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypeConsommationLub {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    #[schema(example = "Vidange")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Saisielubrifiant {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    pub saisiehim_id: Uuid,
    pub lubrifiant_id: Uuid,
    pub typeconsommationlub_id: Option<Uuid>,
    #[schema(example = 12.5)]
    pub qte: Decimal,
    pub obs: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaisielubrifiantPayload {
    #[validate(required(message = "validation.required"))]
    pub saisiehim_id: Option<Uuid>,

    #[validate(required(message = "validation.required"))]
    pub lubrifiant_id: Option<Uuid>,

    pub typeconsommationlub_id: Option<Uuid>,

    #[validate(required(message = "validation.required"), custom(function = "validate_not_negative"))]
    pub qte: Option<Decimal>,

    pub obs: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaisielubrifiantPayload {
    pub lubrifiant_id: Option<Uuid>,
    pub typeconsommationlub_id: Option<Uuid>,
    #[validate(custom(function = "validate_not_negative"))]
    pub qte: Option<Decimal>,
    pub obs: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SaisielubrifiantFilter {
    pub saisiehim_id: Option<Uuid>,
    pub lubrifiant_id: Option<Uuid>,
}
