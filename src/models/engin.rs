// src/models/engin.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Equipamento acompanhado pela manutenção
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Engin {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    pub parc_id: Uuid,
    pub site_id: Uuid,
    #[schema(example = "CHG-980-012")]
    pub name: String,
    pub active: bool,
    #[schema(example = 12500.5)]
    pub initial_heure_chassis: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("validation.not_negative".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEnginPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: String,

    #[validate(required(message = "validation.required"))]
    pub parc_id: Option<Uuid>,

    #[validate(required(message = "validation.required"))]
    pub site_id: Option<Uuid>,

    // Se omitido, o engin nasce ativo
    pub active: Option<bool>,

    #[validate(custom(function = "validate_not_negative"))]
    pub initial_heure_chassis: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEnginPayload {
    #[validate(length(min = 1, message = "validation.required"))]
    pub name: Option<String>,
    pub parc_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub active: Option<bool>,
    #[validate(custom(function = "validate_not_negative"))]
    pub initial_heure_chassis: Option<Decimal>,
}

// Filtros da listagem (GET /api/engins)
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct EnginFilter {
    pub parc_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub active: Option<bool>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct HeuresChassisQuery {
    /// Data limite (inclusive); hoje se omitida
    pub au: Option<NaiveDate>,
}

// Horímetro do chassi = base inicial + Σ HRM até a data
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HeuresChassis {
    pub engin_id: Uuid,
    pub au: NaiveDate,
    pub initial_heure_chassis: Decimal,
    pub total_hrm: Decimal,
    pub heure_chassis: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_defaults_are_optional() {
        let payload: CreateEnginPayload = serde_json::from_value(serde_json::json!({
            "name": "CHG-01",
            "parcId": Uuid::nil(),
            "siteId": Uuid::nil(),
        }))
        .unwrap();

        assert!(payload.validate().is_ok());
        assert!(payload.active.is_none());
        assert!(payload.initial_heure_chassis.is_none());
    }

    #[test]
    fn create_payload_requires_parc_and_site() {
        let payload: CreateEnginPayload =
            serde_json::from_value(serde_json::json!({ "name": "CHG-01" })).unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("parc_id"));
        assert!(fields.contains_key("site_id"));
    }

    #[test]
    fn negative_chassis_hours_are_rejected() {
        let payload: CreateEnginPayload = serde_json::from_value(serde_json::json!({
            "name": "CHG-01",
            "parcId": Uuid::nil(),
            "siteId": Uuid::nil(),
            "initialHeureChassis": -5.0,
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }
}
