//! Property-based tests for the ledger, the transition planner and the
//! per-day credit split.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use kawani_shared::types::{EmployeeId, LeaveTransactionId};

use crate::leave::details::{distinct_dates, split_credit};
use crate::leave::ledger::Posting;
use crate::leave::status::LeaveStatus;
use crate::leave::transition::TransitionService;
use crate::leave::types::{ChargingMode, LeaveBalance};

/// Strategy for generating random LeaveStatus values.
fn arb_status() -> impl Strategy<Value = LeaveStatus> {
    prop_oneof![
        Just(LeaveStatus::ForApproval),
        Just(LeaveStatus::Approved),
        Just(LeaveStatus::Returned),
        Just(LeaveStatus::Cancelled),
    ]
}

/// Strategy for credits between 0 and 30 days with up to 2 decimal places.
fn arb_credit() -> impl Strategy<Value = Decimal> {
    (0i64..=3000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating dates in one year, duplicates allowed.
fn arb_dates() -> impl Strategy<Value = Vec<NaiveDate>> {
    prop::collection::vec(1u32..=365, 1..15).prop_map(|ordinals| {
        ordinals
            .into_iter()
            .filter_map(|o| NaiveDate::from_yo_opt(2026, o))
            .collect()
    })
}

fn arb_mode() -> impl Strategy<Value = ChargingMode> {
    prop_oneof![
        Just(ChargingMode::Vl),
        Just(ChargingMode::Sl),
        Just(ChargingMode::Nd),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Details sum exactly to the total, one non-negative row per distinct date.
    #[test]
    fn prop_split_sums_to_total(dates in arb_dates(), total in arb_credit()) {
        let distinct = distinct_dates(&dates);
        let rows = split_credit(LeaveTransactionId::new(), &distinct, total);

        prop_assert_eq!(rows.len(), distinct.len());
        let sum: Decimal = rows.iter().map(|r| r.credit_for_day).sum();
        prop_assert_eq!(sum, total);
        prop_assert!(rows.iter().all(|r| r.credit_for_day >= Decimal::ZERO));
    }

    /// Whatever path a transaction takes, the balance always equals the
    /// starting balance minus its credit when approved, and nothing otherwise.
    #[test]
    fn prop_balance_is_conserved(
        mode in arb_mode(),
        amount in arb_credit(),
        path in prop::collection::vec(arb_status(), 1..20),
    ) {
        let start = Decimal::new(100, 0);
        let mut balance = LeaveBalance::new(EmployeeId::new(), start, start);
        let posting = Posting::new(mode, amount);
        let mut status = LeaveStatus::ForApproval;

        for target in path {
            let Ok(plan) = TransitionService::plan(status, target, posting, posting) else {
                prop_assert!(!TransitionService::is_valid_transition(status, target));
                continue;
            };
            balance.post(plan.reverse, plan.charge).unwrap();
            status = plan.to;

            let charged = if status == LeaveStatus::Approved && mode.deducts() {
                amount
            } else {
                Decimal::ZERO
            };
            let expected_vl = if mode == ChargingMode::Vl { start - charged } else { start };
            let expected_sl = if mode == ChargingMode::Sl { start - charged } else { start };
            prop_assert_eq!(balance.vl, expected_vl);
            prop_assert_eq!(balance.sl, expected_sl);
        }
    }

    /// Un-approving right after approving always restores the balance.
    #[test]
    fn prop_unapprove_restores_balance(mode in arb_mode(), amount in arb_credit()) {
        let start = Decimal::new(50, 0);
        let mut balance = LeaveBalance::new(EmployeeId::new(), start, start);
        let posting = Posting::new(mode, amount);

        let approve = TransitionService::plan(
            LeaveStatus::ForApproval,
            LeaveStatus::Approved,
            posting,
            posting,
        ).unwrap();
        balance.post(approve.reverse, approve.charge).unwrap();

        let unapprove = TransitionService::unapprove(LeaveStatus::Approved, posting).unwrap();
        balance.post(unapprove.reverse, unapprove.charge).unwrap();

        prop_assert_eq!(balance.vl, start);
        prop_assert_eq!(balance.sl, start);
    }

    /// Returned is only ever reached from For Approval.
    #[test]
    fn prop_return_origin(from in arb_status()) {
        let ok = TransitionService::is_valid_transition(from, LeaveStatus::Returned);
        prop_assert_eq!(
            ok,
            matches!(from, LeaveStatus::ForApproval | LeaveStatus::Returned)
        );
    }

    /// A debit never leaves a bucket negative.
    #[test]
    fn prop_debit_never_goes_negative(start in arb_credit(), amount in arb_credit()) {
        let mut balance = LeaveBalance::new(EmployeeId::new(), start, start);
        let result = balance.debit(ChargingMode::Vl, amount);

        prop_assert_eq!(result.is_ok(), amount <= start);
        prop_assert!(balance.vl >= Decimal::ZERO);
    }
}
