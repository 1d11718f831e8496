// src/models/panne.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypePanne {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    #[schema(example = "Hydraulique")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TypePannePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Panne {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    pub typepanne_id: Uuid,
    #[schema(example = "Fuite vérin de levage")]
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Panne + parcs onde ela pode ocorrer
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PanneDetail {
    #[serde(flatten)]
    pub panne: Panne,
    pub parc_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePannePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,

    #[validate(required(message = "validation.required"))]
    pub typepanne_id: Option<Uuid>,

    // Uma panne pertence a pelo menos um parc
    #[validate(length(min = 1, message = "validation.at_least_one_parc"))]
    pub parc_ids: Vec<Uuid>,

    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePannePayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: Option<String>,
    pub typepanne_id: Option<Uuid>,
    #[validate(length(min = 1, message = "validation.at_least_one_parc"))]
    pub parc_ids: Option<Vec<Uuid>>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PanneFilter {
    pub typepanne_id: Option<Uuid>,
    pub parc_id: Option<Uuid>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panne_requires_at_least_one_parc() {
        let payload: CreatePannePayload = serde_json::from_value(serde_json::json!({
            "name": "Fuite",
            "typepanneId": Uuid::nil(),
            "parcIds": [],
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("parc_ids"));
    }
}
