//! Status transition planning.
//!
//! The planner decides, from the current and requested status, which ledger
//! postings a change implies and what happens to the approval stamp. It
//! performs no I/O; [`LeaveService`](crate::leave::LeaveService) applies the
//! plan inside a unit of work.

use rust_decimal::Decimal;

use crate::leave::error::LeaveError;
use crate::leave::ledger::Posting;
use crate::leave::status::LeaveStatus;
use crate::leave::types::ChargingMode;

/// What to do with `approved_by` / `approved_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStamp {
    /// Leave as is.
    Keep,
    /// Set to the acting user and now.
    Stamp,
    /// Reset to null.
    Clear,
}

/// Ledger and audit effects of a status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionPlan {
    /// Current status.
    pub from: LeaveStatus,
    /// Resulting status.
    pub to: LeaveStatus,
    /// Credit restoring a previous deduction, applied first.
    pub reverse: Option<Posting>,
    /// Debit for the new deduction, applied second.
    pub charge: Option<Posting>,
    /// Approval stamp handling.
    pub approval: ApprovalStamp,
}

impl TransitionPlan {
    const fn new(from: LeaveStatus, to: LeaveStatus) -> Self {
        Self {
            from,
            to,
            reverse: None,
            charge: None,
            approval: ApprovalStamp::Keep,
        }
    }

    /// Whether applying this plan changes any balance.
    #[must_use]
    pub fn touches_balance(&self) -> bool {
        self.reverse.is_some_and(|p| p.is_effective())
            || self.charge.is_some_and(|p| p.is_effective())
    }
}

/// Stateless transition planner.
pub struct TransitionService;

impl TransitionService {
    /// Whether `from -> to` is permitted.
    #[must_use]
    pub fn is_valid_transition(from: LeaveStatus, to: LeaveStatus) -> bool {
        let nothing = Posting::new(ChargingMode::Nd, Decimal::ZERO);
        Self::plan(from, to, nothing, nothing).is_ok()
    }

    /// Plans a change from `from` to `to`.
    ///
    /// `previous` is what the transaction row currently charges (its
    /// snapshot), `next` what it will charge after the edit. Reversals always
    /// use `previous` and debits always use `next`.
    ///
    /// # Errors
    ///
    /// Returns `LeaveError::InvalidState` for a transition not in the table.
    pub fn plan(
        from: LeaveStatus,
        to: LeaveStatus,
        previous: Posting,
        next: Posting,
    ) -> Result<TransitionPlan, LeaveError> {
        use LeaveStatus::{Approved, Cancelled, ForApproval, Returned};

        let mut plan = TransitionPlan::new(from, to);

        match (from, to) {
            // Cancellation first so an approved leave is credited exactly once.
            (_, Cancelled) => {
                if from == Approved {
                    plan.reverse = Some(previous);
                }
                plan.approval = ApprovalStamp::Clear;
            }
            (Approved, Approved) => {
                if previous != next {
                    plan.reverse = Some(previous);
                    plan.charge = Some(next);
                }
            }
            (ForApproval, Approved) => {
                plan.charge = Some(next);
                plan.approval = ApprovalStamp::Stamp;
            }
            (Returned | Cancelled, Approved) => {
                return Err(LeaveError::invalid_state(
                    from,
                    to,
                    "resubmit the leave for approval first",
                ));
            }
            (Approved, ForApproval) => {
                plan.reverse = Some(previous);
                plan.approval = ApprovalStamp::Clear;
            }
            (ForApproval, ForApproval) | (ForApproval | Returned, Returned) => {}
            (Returned | Cancelled, ForApproval) => {
                plan.approval = ApprovalStamp::Clear;
            }
            (Approved | Cancelled, Returned) => {
                return Err(LeaveError::invalid_state(
                    from,
                    to,
                    "only leaves awaiting approval can be returned",
                ));
            }
        }

        Ok(plan)
    }

    /// Plans the initial status of a new transaction.
    ///
    /// # Errors
    ///
    /// Returns `LeaveError::InvalidState` unless `status` is `ForApproval`
    /// or `Approved`.
    pub fn initial(status: LeaveStatus, posting: Posting) -> Result<TransitionPlan, LeaveError> {
        match status {
            LeaveStatus::ForApproval | LeaveStatus::Approved => {
                Self::plan(LeaveStatus::ForApproval, status, posting, posting)
            }
            _ => Err(LeaveError::invalid_state(
                LeaveStatus::ForApproval,
                status,
                "new leaves start awaiting approval or approved",
            )),
        }
    }

    /// Plans an explicit un-approval.
    ///
    /// # Errors
    ///
    /// Returns `LeaveError::InvalidState` unless `from` is `Approved`.
    pub fn unapprove(from: LeaveStatus, previous: Posting) -> Result<TransitionPlan, LeaveError> {
        if from != LeaveStatus::Approved {
            return Err(LeaveError::invalid_state(
                from,
                LeaveStatus::ForApproval,
                "only approved leaves can be unapproved",
            ));
        }
        Self::plan(from, LeaveStatus::ForApproval, previous, previous)
    }

    /// Plans the ledger effect of deleting a transaction: approved leaves are
    /// credited back, anything else is left alone.
    #[must_use]
    pub fn removal(from: LeaveStatus, previous: Posting) -> TransitionPlan {
        let mut plan = TransitionPlan::new(from, from);
        if from == LeaveStatus::Approved {
            plan.reverse = Some(previous);
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn vl(amount: Decimal) -> Posting {
        Posting::new(ChargingMode::Vl, amount)
    }

    #[test]
    fn test_approve_from_for_approval_charges_new_values() {
        let plan = TransitionService::plan(
            LeaveStatus::ForApproval,
            LeaveStatus::Approved,
            vl(dec!(1)),
            vl(dec!(2)),
        )
        .unwrap();

        assert_eq!(plan.reverse, None);
        assert_eq!(plan.charge, Some(vl(dec!(2))));
        assert_eq!(plan.approval, ApprovalStamp::Stamp);
    }

    #[test]
    fn test_cancel_approved_credits_old_values_once() {
        let plan = TransitionService::plan(
            LeaveStatus::Approved,
            LeaveStatus::Cancelled,
            vl(dec!(1)),
            vl(dec!(3)),
        )
        .unwrap();

        assert_eq!(plan.reverse, Some(vl(dec!(1))));
        assert_eq!(plan.charge, None);
        assert_eq!(plan.approval, ApprovalStamp::Clear);
    }

    #[test]
    fn test_cancel_pending_has_no_ledger_effect() {
        let plan = TransitionService::plan(
            LeaveStatus::ForApproval,
            LeaveStatus::Cancelled,
            vl(dec!(1)),
            vl(dec!(1)),
        )
        .unwrap();
        assert!(!plan.touches_balance());
    }

    #[test]
    fn test_approved_edit_swaps_postings() {
        let previous = vl(dec!(2));
        let next = Posting::new(ChargingMode::Sl, dec!(1));
        let plan =
            TransitionService::plan(LeaveStatus::Approved, LeaveStatus::Approved, previous, next)
                .unwrap();

        assert_eq!(plan.reverse, Some(previous));
        assert_eq!(plan.charge, Some(next));
        assert_eq!(plan.approval, ApprovalStamp::Keep);
    }

    #[test]
    fn test_approved_unchanged_is_noop() {
        let plan = TransitionService::plan(
            LeaveStatus::Approved,
            LeaveStatus::Approved,
            vl(dec!(2)),
            vl(dec!(2)),
        )
        .unwrap();
        assert!(!plan.touches_balance());
    }

    #[test]
    fn test_return_requires_for_approval() {
        for from in [LeaveStatus::Approved, LeaveStatus::Cancelled] {
            let err = TransitionService::plan(from, LeaveStatus::Returned, vl(dec!(1)), vl(dec!(1)))
                .unwrap_err();
            assert!(matches!(err, LeaveError::InvalidState { .. }));
        }
    }

    #[test]
    fn test_approve_after_return_requires_resubmit() {
        let err = TransitionService::plan(
            LeaveStatus::Returned,
            LeaveStatus::Approved,
            vl(dec!(1)),
            vl(dec!(1)),
        )
        .unwrap_err();
        assert!(matches!(err, LeaveError::InvalidState { .. }));

        let plan = TransitionService::plan(
            LeaveStatus::Returned,
            LeaveStatus::ForApproval,
            vl(dec!(1)),
            vl(dec!(1)),
        )
        .unwrap();
        assert!(!plan.touches_balance());
    }

    #[test]
    fn test_initial_status() {
        let plan = TransitionService::initial(LeaveStatus::Approved, vl(dec!(1))).unwrap();
        assert_eq!(plan.charge, Some(vl(dec!(1))));
        assert_eq!(plan.approval, ApprovalStamp::Stamp);

        let plan = TransitionService::initial(LeaveStatus::ForApproval, vl(dec!(1))).unwrap();
        assert!(!plan.touches_balance());

        assert!(TransitionService::initial(LeaveStatus::Returned, vl(dec!(1))).is_err());
    }

    #[test]
    fn test_unapprove() {
        let plan = TransitionService::unapprove(LeaveStatus::Approved, vl(dec!(2))).unwrap();
        assert_eq!(plan.to, LeaveStatus::ForApproval);
        assert_eq!(plan.reverse, Some(vl(dec!(2))));
        assert_eq!(plan.approval, ApprovalStamp::Clear);

        assert!(TransitionService::unapprove(LeaveStatus::ForApproval, vl(dec!(2))).is_err());
    }

    #[test]
    fn test_removal() {
        let plan = TransitionService::removal(LeaveStatus::Approved, vl(dec!(2)));
        assert_eq!(plan.reverse, Some(vl(dec!(2))));

        let plan = TransitionService::removal(LeaveStatus::Returned, vl(dec!(2)));
        assert!(!plan.touches_balance());
    }
}
