// src/models/saisie.rs
//
// Saisies diárias: HRM (horas de marcha) e HIM (horas de imobilização por panne).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::services::daily_hours::{round_hours, HOURS_PER_DAY};

// Mesma fronteira do serviço: arredonda antes de comparar
fn validate_hours(val: &Decimal) -> Result<(), ValidationError> {
    let rounded = round_hours(*val);
    if (rounded.is_sign_negative() && !rounded.is_zero()) || rounded > HOURS_PER_DAY {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0);
        err.add_param("max".into(), &24);
        err.message = Some("validation.hours_range".into());
        return Err(err);
    }
    Ok(())
}

fn validate_compteur(val: &Decimal) -> Result<(), ValidationError> {
    crate::models::engin::validate_not_negative(val)
}

// ---
// HRM
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Saisiehrm {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    #[schema(example = "2024-03-01")]
    pub du: NaiveDate,
    pub engin_id: Uuid,
    pub site_id: Uuid,
    #[schema(example = 10.5)]
    pub hrm: Decimal,
    pub compteur: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaisiehrmPayload {
    #[validate(required(message = "validation.required"))]
    pub du: Option<NaiveDate>,

    #[validate(required(message = "validation.required"))]
    pub engin_id: Option<Uuid>,

    #[validate(required(message = "validation.required"), custom(function = "validate_hours"))]
    pub hrm: Option<Decimal>,

    #[validate(custom(function = "validate_compteur"))]
    pub compteur: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaisiehrmPayload {
    pub du: Option<NaiveDate>,
    pub engin_id: Option<Uuid>,
    #[validate(custom(function = "validate_hours"))]
    pub hrm: Option<Decimal>,
    #[validate(custom(function = "validate_compteur"))]
    pub compteur: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_period"))]
pub struct SaisiehrmFilter {
    pub engin_id: Option<Uuid>,
    pub site_id: Option<Uuid>,
    pub du: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

fn validate_period(filter: &SaisiehrmFilter) -> Result<(), ValidationError> {
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            let mut err = ValidationError::new("date_range");
            err.message = Some("validation.date_range".into());
            return Err(err);
        }
    }
    Ok(())
}

// ---
// HIM
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Saisiehim {
    pub id: Uuid,
    #[schema(ignore)]
    pub entreprise_id: Uuid,
    pub panne_id: Uuid,
    pub saisiehrm_id: Uuid,
    pub engin_id: Uuid,
    #[schema(example = 2.5)]
    pub him: Decimal,
    pub ni: i32,
    pub obs: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaisiehimPayload {
    #[validate(required(message = "validation.required"))]
    pub panne_id: Option<Uuid>,

    #[validate(required(message = "validation.required"), custom(function = "validate_hours"))]
    pub him: Option<Decimal>,

    #[validate(range(min = 0, message = "validation.not_negative"))]
    #[serde(default)]
    pub ni: i32,

    #[validate(required(message = "validation.required"))]
    pub saisiehrm_id: Option<Uuid>,

    #[validate(required(message = "validation.required"))]
    pub engin_id: Option<Uuid>,

    pub obs: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSaisiehimPayload {
    pub panne_id: Option<Uuid>,
    #[validate(custom(function = "validate_hours"))]
    pub him: Option<Decimal>,
    #[validate(range(min = 0, message = "validation.not_negative"))]
    pub ni: Option<i32>,
    pub obs: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SaisiehimFilter {
    pub saisiehrm_id: Option<Uuid>,
    pub engin_id: Option<Uuid>,
    pub panne_id: Option<Uuid>,
}

// ---
// Visão consolidada do dia
// ---
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaisiehrmDetail {
    #[serde(flatten)]
    pub saisiehrm: Saisiehrm,
    pub saisiehims: Vec<Saisiehim>,
    pub total_him: Decimal,
    pub total: Decimal,
    pub remaining: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hrm_above_twenty_four_fails_validation() {
        let payload: CreateSaisiehrmPayload = serde_json::from_value(json!({
            "du": "2024-03-01",
            "enginId": Uuid::nil(),
            "hrm": 24.5,
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("hrm"));
    }

    #[test]
    fn hours_are_checked_after_rounding() {
        let h = |v: &str| v.parse::<Decimal>().unwrap();

        assert!(validate_hours(&h("23.996")).is_ok());
        assert!(validate_hours(&h("24.004")).is_ok());
        assert!(validate_hours(&h("-0.001")).is_ok());
        assert!(validate_hours(&h("24.005")).is_err());
        assert!(validate_hours(&h("-0.005")).is_err());
    }

    #[test]
    fn him_payload_requires_parent_and_panne() {
        let payload: CreateSaisiehimPayload = serde_json::from_value(json!({ "him": 2 })).unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("panne_id"));
        assert!(fields.contains_key("saisiehrm_id"));
        assert!(fields.contains_key("engin_id"));
    }

    #[test]
    fn negative_incident_count_is_rejected() {
        let payload: CreateSaisiehimPayload = serde_json::from_value(json!({
            "panneId": Uuid::nil(),
            "him": 1,
            "ni": -1,
            "saisiehrmId": Uuid::nil(),
            "enginId": Uuid::nil(),
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }

    #[test]
    fn inverted_period_is_rejected() {
        let filter = SaisiehrmFilter {
            from: NaiveDate::from_ymd_opt(2024, 3, 10),
            to: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }
}
