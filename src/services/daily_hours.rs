// src/services/daily_hours.rs
//
// Regra central das saisies: por engin e por dia, HRM + Σ HIM <= 24h.
// As horas são tratadas em ponto fixo com duas casas decimais.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::common::error::AppError;

/// Teto diário (24h).
pub const HOURS_PER_DAY: Decimal = Decimal::from_parts(24, 0, 0, false, 0);

/// Casas decimais guardadas para HRM/HIM.
pub const HOURS_SCALE: u32 = 2;

/// Duas casas, meio para longe de zero.
pub fn round_hours(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(HOURS_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Arredonda e valida o intervalo [0, 24].
pub fn normalize_hours(value: Decimal, field: &'static str) -> Result<Decimal, AppError> {
    let rounded = round_hours(value);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        return Err(AppError::InvalidHours { field });
    }
    if rounded > HOURS_PER_DAY {
        return Err(AppError::InvalidHours { field });
    }
    Ok(rounded.abs())
}

/// Soma as HIM já registradas na saisie HRM.
pub fn sum_him<I>(siblings: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    siblings.into_iter().fold(Decimal::ZERO, |acc, him| acc + him)
}

/// Verifica o teto diário e devolve o total do dia.
///
/// `sibling_him` não deve conter a linha que está sendo alterada.
pub fn ensure_within_day(hrm: Decimal, sibling_him: Decimal, incoming_him: Decimal) -> Result<Decimal, AppError> {
    let total = hrm + sibling_him + incoming_him;
    if total > HOURS_PER_DAY {
        tracing::debug!(%hrm, %sibling_him, %incoming_him, %total, "teto diário excedido");
        return Err(AppError::DailyHoursExceeded { total });
    }
    Ok(total)
}

/// Horas ainda disponíveis no dia (nunca negativo).
pub fn remaining(total: Decimal) -> Decimal {
    (HOURS_PER_DAY - total).max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(value: &str) -> Decimal {
        value.parse().unwrap()
    }

    #[test]
    fn accepts_when_total_is_under_the_ceiling() {
        // hrm=10, HIM existentes=8, nova=5 -> 23
        let total = ensure_within_day(h("10"), sum_him([h("5"), h("3")]), h("5")).unwrap();
        assert_eq!(total, h("23"));
    }

    #[test]
    fn rejects_and_reports_the_total() {
        // hrm=10, HIM existentes=8, nova=7 -> 25
        let err = ensure_within_day(h("10"), h("8"), h("7")).unwrap_err();
        match err {
            AppError::DailyHoursExceeded { total } => assert_eq!(total, h("25")),
            other => panic!("erro inesperado: {:?}", other),
        }
    }

    #[test]
    fn exactly_twenty_four_is_accepted() {
        assert_eq!(ensure_within_day(h("20"), h("3.5"), h("0.5")).unwrap(), h("24"));
    }

    #[test]
    fn one_hundredth_over_is_rejected() {
        assert!(ensure_within_day(h("20"), h("3.5"), h("0.51")).is_err());
    }

    #[test]
    fn hrm_update_is_checked_against_existing_siblings() {
        // nenhuma HIM nova: só o HRM muda
        assert!(ensure_within_day(h("17"), h("8"), Decimal::ZERO).is_err());
        assert!(ensure_within_day(h("16"), h("8"), Decimal::ZERO).is_ok());
    }

    #[test]
    fn normalization_rounds_half_away_from_zero() {
        assert_eq!(normalize_hours(h("7.125"), "him").unwrap(), h("7.13"));
        assert_eq!(normalize_hours(h("7.124"), "him").unwrap(), h("7.12"));
        assert_eq!(normalize_hours(h("23.999"), "hrm").unwrap(), h("24.00"));
    }

    #[test]
    fn normalization_rejects_out_of_range_values() {
        assert!(matches!(normalize_hours(h("-1"), "hrm"), Err(AppError::InvalidHours { field: "hrm" })));
        assert!(normalize_hours(h("24.01"), "hrm").is_err());
        assert!(normalize_hours(h("-0.001"), "hrm").is_ok());
    }

    #[test]
    fn remaining_never_goes_negative() {
        assert_eq!(remaining(h("23")), h("1"));
        assert_eq!(remaining(h("24")), Decimal::ZERO);
        assert_eq!(remaining(h("25")), Decimal::ZERO);
    }

    #[test]
    fn empty_siblings_sum_to_zero() {
        assert_eq!(sum_him(Vec::<Decimal>::new()), Decimal::ZERO);
    }
}
