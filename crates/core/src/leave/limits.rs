//! Entitlement and balance limit rules.
//!
//! Two regimes exist. A leave type with a positive annual entitlement is
//! capped per calendar year by the credit of every live transaction of that
//! type. Any other leave type is capped by the employee's running balance of
//! its charging mode, and `ND` types are never capped.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::leave::error::LeaveError;
use crate::leave::types::ChargingMode;

/// Figures a limit decision was based on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitContext {
    /// Annual cap, in the annual regime.
    pub annual_entitlement: Option<Decimal>,
    /// Credit already reserved this year, in the annual regime.
    pub total_annual_used: Option<Decimal>,
    /// Credit still available under the rule that applied.
    pub available_balance: Option<Decimal>,
    /// Running balance compared against, in the balance regime.
    pub balance: Option<Decimal>,
    /// Charging mode of the leave type.
    pub charging_mode: ChargingMode,
}

impl LimitContext {
    /// Context for a leave type that never deducts.
    #[must_use]
    pub const fn no_deduction() -> Self {
        Self {
            annual_entitlement: None,
            total_annual_used: None,
            available_balance: None,
            balance: None,
            charging_mode: ChargingMode::Nd,
        }
    }
}

/// Year whose usage a request is counted against: the year of the earliest
/// requested date, or `today`'s year when no dates are given.
#[must_use]
pub fn anchor_year(dates: &[NaiveDate], today: NaiveDate) -> i32 {
    dates.iter().min().map_or(today.year(), |d| d.year())
}

/// Checks a request against an annual cap.
///
/// # Errors
///
/// Returns `LeaveError::ValidationFailed` when `requested` exceeds what is
/// left of `entitlement` after `used`.
pub fn check_annual_cap(
    charging_mode: ChargingMode,
    entitlement: Decimal,
    used: Decimal,
    requested: Decimal,
) -> Result<LimitContext, LeaveError> {
    let available = entitlement - used;
    let context = LimitContext {
        annual_entitlement: Some(entitlement),
        total_annual_used: Some(used),
        available_balance: Some(available),
        balance: None,
        charging_mode,
    };

    if requested > available {
        return Err(LeaveError::ValidationFailed {
            message: format!(
                "Leave entitlement limit exceeded. Annual entitlement: {} days, \
                 Already used: {} days, Available: {} days, Requested: {} days. \
                 Please reduce the number of days or contact HR.",
                days(entitlement),
                days(used),
                days(available.max(Decimal::ZERO)),
                days(requested),
            ),
            context,
        });
    }

    Ok(context)
}

/// Checks a request against a running balance.
///
/// `ND` always passes.
///
/// # Errors
///
/// Returns `LeaveError::ValidationFailed` when `requested` exceeds `balance`.
pub fn check_running_balance(
    charging_mode: ChargingMode,
    balance: Decimal,
    requested: Decimal,
) -> Result<LimitContext, LeaveError> {
    if !charging_mode.deducts() {
        return Ok(LimitContext::no_deduction());
    }

    let context = LimitContext {
        annual_entitlement: None,
        total_annual_used: None,
        available_balance: Some(balance),
        balance: Some(balance),
        charging_mode,
    };

    if requested > balance {
        return Err(LeaveError::ValidationFailed {
            message: format!(
                "Insufficient leave balance. Available {charging_mode} balance: {} days, \
                 Requested: {} days. Please reduce the number of days or contact HR.",
                days(balance),
                days(requested),
            ),
            context,
        });
    }

    Ok(context)
}

fn days(value: Decimal) -> Decimal {
    value.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_anchor_year_uses_earliest_date() {
        let today = day(2026, 6, 1);
        let dates = [day(2026, 1, 2), day(2025, 12, 31)];
        assert_eq!(anchor_year(&dates, today), 2025);
    }

    #[test]
    fn test_anchor_year_defaults_to_today() {
        assert_eq!(anchor_year(&[], day(2026, 6, 1)), 2026);
    }

    #[test]
    fn test_annual_cap_boundary() {
        assert!(check_annual_cap(ChargingMode::Vl, dec!(10), dec!(0), dec!(10)).is_ok());

        let err = check_annual_cap(ChargingMode::Vl, dec!(10), dec!(0), dec!(11)).unwrap_err();
        let LeaveError::ValidationFailed { message, context } = err else {
            panic!("expected ValidationFailed");
        };
        assert_eq!(
            message,
            "Leave entitlement limit exceeded. Annual entitlement: 10 days, Already used: 0 days, \
             Available: 10 days, Requested: 11 days. Please reduce the number of days or contact HR."
        );
        assert_eq!(context.total_annual_used, Some(dec!(0)));
        assert_eq!(context.available_balance, Some(dec!(10)));
    }

    #[test]
    fn test_annual_cap_counts_usage() {
        let ctx = check_annual_cap(ChargingMode::Sl, dec!(10), dec!(7.5), dec!(2.5)).unwrap();
        assert_eq!(ctx.available_balance, Some(dec!(2.5)));
        assert!(check_annual_cap(ChargingMode::Sl, dec!(10), dec!(10), dec!(1)).is_err());
    }

    #[test]
    fn test_running_balance_boundary() {
        assert!(check_running_balance(ChargingMode::Vl, dec!(5), dec!(5)).is_ok());

        let err = check_running_balance(ChargingMode::Vl, dec!(5.00), dec!(6)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. Available VL balance: 5 days, Requested: 6 days. \
             Please reduce the number of days or contact HR."
        );
    }

    #[test]
    fn test_no_deduction_always_passes() {
        let ctx = check_running_balance(ChargingMode::Nd, dec!(0), dec!(100)).unwrap();
        assert_eq!(ctx, LimitContext::no_deduction());
    }
}
