//! Leave transaction manager.
//!
//! Every mutating operation runs in one unit of work: limit validation, the
//! header and detail writes, and the balance postings either all commit or
//! none do. Change events are published only after the commit.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

use kawani_shared::types::{EmployeeId, LeaveTransactionId, LeaveTypeId, UserId};

use crate::leave::access::Actor;
use crate::leave::details::{CREDIT_SCALE, distinct_dates, split_credit, transaction_number};
use crate::leave::error::LeaveError;
use crate::leave::ledger::Posting;
use crate::leave::limits::{self, LimitContext, anchor_year};
use crate::leave::notify::{ChangeAction, ChangeNotifier, LeaveChangeEvent};
use crate::leave::status::LeaveStatus;
use crate::leave::store::{LeaveStore, LeaveUnitOfWork};
use crate::leave::transition::{ApprovalStamp, TransitionPlan, TransitionService};
use crate::leave::types::{
    CreateLeaveTransaction, CreatedLeaveTransaction, EmployeeLeaveSummary, LeaveBalance,
    LeaveTransaction, LeaveTransactionRecord, LeaveType, LimitCheck, TransactionFilter,
    UpdateLeaveTransaction,
};

/// Orchestrates leave transactions over a [`LeaveStore`].
pub struct LeaveService<S> {
    store: S,
    notifier: Arc<dyn ChangeNotifier>,
}

impl<S: std::fmt::Debug> std::fmt::Debug for LeaveService<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeaveService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<S: LeaveStore> LeaveService<S> {
    /// Creates a service.
    pub fn new(store: S, notifier: Arc<dyn ChangeNotifier>) -> Self {
        Self { store, notifier }
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Checks a request against the leave type's limits without writing.
    ///
    /// # Errors
    ///
    /// `ValidationFailed` when the request exceeds the limit, `NotFound`
    /// variants for a missing leave type, balance row or excluded
    /// transaction, `Storage` on persistence failure.
    pub async fn validate_limits(&self, check: &LimitCheck) -> Result<LimitContext, LeaveError> {
        ensure_credit(check.requested_credit)?;

        let mut uow = self.store.begin().await?;
        let leave_type = find_leave_type(&mut uow, check.leave_type_id).await?;
        let excluded = match check.exclude_transaction_id {
            Some(id) => Some(find_transaction(&mut uow, id).await?),
            None => None,
        };
        let dates = distinct_dates(&check.dates);

        let result = check_limits(
            &mut uow,
            check.employee_id,
            &leave_type,
            check.requested_credit,
            &dates,
            excluded.as_ref(),
        )
        .await;

        // Dry run: the unit is dropped, never committed.
        drop(uow);

        debug!(
            employee_id = %check.employee_id,
            leave_type_id = %check.leave_type_id,
            valid = result.is_ok(),
            "Leave limits checked"
        );
        result
    }

    /// Files a leave request.
    ///
    /// # Errors
    ///
    /// `InvalidInput` without dates or with a negative credit,
    /// `InvalidState` for an initial status other than `For Approval` or
    /// `Approved`, `ValidationFailed` when over the limit, `NotFound`
    /// variants, `BalanceWouldGoNegative`, `Storage`.
    pub async fn create(
        &self,
        input: CreateLeaveTransaction,
        actor: &Actor,
    ) -> Result<CreatedLeaveTransaction, LeaveError> {
        if input.dates.is_empty() {
            return Err(LeaveError::InvalidInput(
                "At least one leave date is required".to_string(),
            ));
        }
        ensure_credit(input.deducted_credit)?;
        let status = input.status.unwrap_or(LeaveStatus::ForApproval);

        let mut uow = self.store.begin().await?;
        let leave_type = find_leave_type(&mut uow, input.leave_type_id).await?;
        let plan = TransitionService::initial(
            status,
            Posting::new(leave_type.charging_mode, input.deducted_credit),
        )?;

        let dates = distinct_dates(&input.dates);
        check_limits(
            &mut uow,
            input.employee_id,
            &leave_type,
            input.deducted_credit,
            &dates,
            None,
        )
        .await?;

        let now = Utc::now();
        let created_today = uow.count_created_on(now.date_naive()).await?;
        let mut transaction = LeaveTransaction {
            id: LeaveTransactionId::new(),
            transaction_no: transaction_number(now.date_naive(), created_today),
            employee_id: input.employee_id,
            leave_type_id: leave_type.id,
            charging_mode: leave_type.charging_mode,
            deducted_credit: input.deducted_credit,
            purpose: input.purpose,
            remarks: input.remarks,
            status,
            created_by: Some(actor.user_id),
            created_at: now,
            approved_by: None,
            approved_at: None,
            updated_by: Some(actor.user_id),
            updated_at: now,
        };
        apply_stamp(&mut transaction, plan.approval, actor.user_id, now);

        uow.insert_transaction(&transaction).await?;
        uow.replace_details(
            transaction.id,
            &split_credit(transaction.id, &dates, transaction.deducted_credit),
        )
        .await?;
        if let Some(answer) = input.question_answer.as_ref().filter(|qa| qa.is_answered()) {
            uow.replace_question_answer(transaction.id, Some(answer))
                .await?;
        }
        apply_plan(&mut uow, transaction.employee_id, &plan).await?;
        uow.commit().await?;

        info!(
            transaction_id = %transaction.id,
            transaction_no = %transaction.transaction_no,
            employee_id = %transaction.employee_id,
            status = %transaction.status,
            "Leave transaction created"
        );

        self.publish(change_event(&transaction, ChangeAction::Created, None));

        Ok(CreatedLeaveTransaction {
            transaction_id: transaction.id,
            transaction_no: transaction.transaction_no,
        })
    }

    /// Edits a leave request and applies any status change.
    ///
    /// Limits are re-checked only when the leave type, the credit or the
    /// date set actually changes, or when a cancelled leave is resubmitted.
    /// Detail rows are rebuilt only when the
    /// credit or the date set changes.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound`, `InvalidState` for a transition outside the
    /// table, `ValidationFailed`, `BalanceWouldGoNegative`, `Storage`.
    pub async fn update(
        &self,
        id: LeaveTransactionId,
        patch: UpdateLeaveTransaction,
        actor: &Actor,
    ) -> Result<LeaveTransaction, LeaveError> {
        if let Some(credit) = patch.deducted_credit {
            ensure_credit(credit)?;
        }

        let mut uow = self.store.begin().await?;
        let current = find_transaction(&mut uow, id).await?;
        let current_dates = uow.detail_dates(id).await?;

        let requested_dates = patch
            .dates
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(distinct_dates);
        let leave_type_changed = patch
            .leave_type_id
            .is_some_and(|t| t != current.leave_type_id);
        let credit_changed = patch
            .deducted_credit
            .is_some_and(|c| c != current.deducted_credit);
        let dates_changed = requested_dates
            .as_ref()
            .is_some_and(|d| *d != current_dates);

        let leave_type_id = patch.leave_type_id.unwrap_or(current.leave_type_id);
        let deducted_credit = patch.deducted_credit.unwrap_or(current.deducted_credit);
        let dates = requested_dates.unwrap_or(current_dates);
        let target = patch.status.unwrap_or(current.status);
        // A cancelled leave brought back starts reserving credit again.
        let revived =
            !current.status.counts_toward_annual_usage() && target.counts_toward_annual_usage();

        let leave_type = if leave_type_changed || credit_changed || dates_changed || revived {
            Some(find_leave_type(&mut uow, leave_type_id).await?)
        } else {
            None
        };
        let charging_mode = leave_type
            .as_ref()
            .filter(|_| leave_type_changed)
            .map_or(current.charging_mode, |lt| lt.charging_mode);

        let plan = TransitionService::plan(
            current.status,
            target,
            current.posting(),
            Posting::new(charging_mode, deducted_credit),
        )?;

        if let Some(leave_type) = &leave_type {
            check_limits(
                &mut uow,
                current.employee_id,
                leave_type,
                deducted_credit,
                &dates,
                Some(&current),
            )
            .await?;
        }

        let now = Utc::now();
        let mut updated = current.clone();
        updated.leave_type_id = leave_type_id;
        updated.charging_mode = charging_mode;
        updated.deducted_credit = deducted_credit;
        if let Some(purpose) = patch.purpose {
            updated.purpose = Some(purpose);
        }
        if let Some(remarks) = patch.remarks {
            updated.remarks = Some(remarks);
        }
        updated.status = target;
        updated.updated_by = Some(actor.user_id);
        updated.updated_at = now;
        apply_stamp(&mut updated, plan.approval, actor.user_id, now);

        uow.update_transaction(&updated).await?;
        if credit_changed || dates_changed {
            uow.replace_details(id, &split_credit(id, &dates, deducted_credit))
                .await?;
        }
        if let Some(answer) = &patch.question_answer {
            uow.replace_question_answer(id, Some(answer).filter(|qa| qa.is_answered()))
                .await?;
        }
        apply_plan(&mut uow, current.employee_id, &plan).await?;
        uow.commit().await?;

        info!(
            transaction_id = %id,
            employee_id = %updated.employee_id,
            from = %current.status,
            to = %updated.status,
            "Leave transaction updated"
        );

        self.publish(change_event(
            &updated,
            ChangeAction::Updated,
            Some(current.status),
        ));

        Ok(updated)
    }

    /// Reverts an approval: credits the balance back and returns the leave
    /// to `For Approval`. A non-blank `remark` replaces the remarks.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound`, `InvalidState` unless approved, `Storage`.
    pub async fn unapprove(
        &self,
        id: LeaveTransactionId,
        remark: Option<String>,
        actor: &Actor,
    ) -> Result<LeaveTransaction, LeaveError> {
        let mut uow = self.store.begin().await?;
        let current = find_transaction(&mut uow, id).await?;
        let plan = TransitionService::unapprove(current.status, current.posting())?;

        let now = Utc::now();
        let mut updated = current.clone();
        updated.status = plan.to;
        updated.updated_by = Some(actor.user_id);
        updated.updated_at = now;
        if let Some(remark) = remark.filter(|r| !r.trim().is_empty()) {
            updated.remarks = Some(remark);
        }
        apply_stamp(&mut updated, plan.approval, actor.user_id, now);

        uow.update_transaction(&updated).await?;
        apply_plan(&mut uow, current.employee_id, &plan).await?;
        uow.commit().await?;

        info!(
            transaction_id = %id,
            employee_id = %updated.employee_id,
            credited = %current.deducted_credit,
            "Leave transaction unapproved"
        );

        self.publish(change_event(
            &updated,
            ChangeAction::Updated,
            Some(current.status),
        ));

        Ok(updated)
    }

    /// Removes a leave request, crediting it back first when approved.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound`, `BalanceNotFound`, `Storage`.
    pub async fn delete(&self, id: LeaveTransactionId, actor: &Actor) -> Result<(), LeaveError> {
        let mut uow = self.store.begin().await?;
        let current = find_transaction(&mut uow, id).await?;
        let plan = TransitionService::removal(current.status, current.posting());

        apply_plan(&mut uow, current.employee_id, &plan).await?;
        uow.delete_transaction(id).await?;
        uow.commit().await?;

        info!(
            transaction_id = %id,
            employee_id = %current.employee_id,
            status = %current.status,
            deleted_by = %actor.user_id,
            "Leave transaction deleted"
        );

        let mut event = change_event(&current, ChangeAction::Deleted, Some(current.status));
        event.status = None;
        self.publish(event);

        Ok(())
    }

    /// Approves a leave awaiting approval.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub async fn approve(
        &self,
        id: LeaveTransactionId,
        remarks: Option<String>,
        actor: &Actor,
    ) -> Result<LeaveTransaction, LeaveError> {
        self.change_status(id, LeaveStatus::Approved, remarks, actor)
            .await
    }

    /// Returns a leave awaiting approval to its filer.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub async fn return_leave(
        &self,
        id: LeaveTransactionId,
        remarks: Option<String>,
        actor: &Actor,
    ) -> Result<LeaveTransaction, LeaveError> {
        self.change_status(id, LeaveStatus::Returned, remarks, actor)
            .await
    }

    /// Cancels a leave in any status.
    ///
    /// # Errors
    ///
    /// Same as [`update`](Self::update).
    pub async fn cancel(
        &self,
        id: LeaveTransactionId,
        remarks: Option<String>,
        actor: &Actor,
    ) -> Result<LeaveTransaction, LeaveError> {
        self.change_status(id, LeaveStatus::Cancelled, remarks, actor)
            .await
    }

    async fn change_status(
        &self,
        id: LeaveTransactionId,
        status: LeaveStatus,
        remarks: Option<String>,
        actor: &Actor,
    ) -> Result<LeaveTransaction, LeaveError> {
        let patch = UpdateLeaveTransaction {
            status: Some(status),
            remarks: remarks.filter(|r| !r.trim().is_empty()),
            ..Default::default()
        };
        self.update(id, patch, actor).await
    }

    /// Reads one transaction with its details and answer.
    ///
    /// # Errors
    ///
    /// `TransactionNotFound`, `Storage`.
    pub async fn get(&self, id: LeaveTransactionId) -> Result<LeaveTransactionRecord, LeaveError> {
        self.store
            .find_transaction(id)
            .await?
            .ok_or(LeaveError::TransactionNotFound(id))
    }

    /// Lists transactions, newest first.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for an inverted date range, `Storage`.
    pub async fn list(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<LeaveTransactionRecord>, LeaveError> {
        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to)
            && from > to
        {
            return Err(LeaveError::InvalidInput(format!(
                "Date range is inverted: {from} is after {to}"
            )));
        }
        self.store.list_transactions(filter).await
    }

    /// Lists all leave types.
    ///
    /// # Errors
    ///
    /// `Storage`.
    pub async fn list_leave_types(&self) -> Result<Vec<LeaveType>, LeaveError> {
        self.store.list_leave_types().await
    }

    /// Reads an employee's balance.
    ///
    /// # Errors
    ///
    /// `BalanceNotFound`, `Storage`.
    pub async fn balance(&self, employee_id: EmployeeId) -> Result<LeaveBalance, LeaveError> {
        self.store
            .find_balance(employee_id)
            .await?
            .ok_or(LeaveError::BalanceNotFound(employee_id))
    }

    /// Returns the leave roll-up of every employee with a balance row.
    ///
    /// # Errors
    ///
    /// `Storage` on persistence failure.
    pub async fn employee_summaries(&self) -> Result<Vec<EmployeeLeaveSummary>, LeaveError> {
        self.store.employee_summaries().await
    }

    fn publish(&self, event: LeaveChangeEvent) {
        let transaction_id = event.transaction_id;
        if let Err(e) = self.notifier.notify(event) {
            warn!(error = %e, transaction_id = %transaction_id, "Failed to publish leave change");
        }
    }
}

async fn find_leave_type<U: LeaveUnitOfWork>(
    uow: &mut U,
    id: LeaveTypeId,
) -> Result<LeaveType, LeaveError> {
    uow.find_leave_type(id)
        .await?
        .ok_or(LeaveError::LeaveTypeNotFound(id))
}

async fn find_transaction<U: LeaveUnitOfWork>(
    uow: &mut U,
    id: LeaveTransactionId,
) -> Result<LeaveTransaction, LeaveError> {
    uow.lock_transaction(id)
        .await?
        .ok_or(LeaveError::TransactionNotFound(id))
}

/// Runs the limit rules of `leave_type` inside `uow`.
///
/// `excluded` is the transaction being edited: it is left out of annual
/// usage, and when it is approved against the same bucket its credit is
/// added back to the comparable balance.
async fn check_limits<U: LeaveUnitOfWork>(
    uow: &mut U,
    employee_id: EmployeeId,
    leave_type: &LeaveType,
    requested: Decimal,
    dates: &[NaiveDate],
    excluded: Option<&LeaveTransaction>,
) -> Result<LimitContext, LeaveError> {
    let entitlement = leave_type.entitlement();
    let mode = entitlement.charging_mode;

    if let Some(cap) = entitlement.annual_cap() {
        let year = anchor_year(dates, Utc::now().date_naive());
        uow.lock_annual_usage(employee_id, leave_type.id, year)
            .await?;
        let used = uow
            .annual_usage(employee_id, leave_type.id, year, excluded.map(|t| t.id))
            .await?;
        return limits::check_annual_cap(mode, cap, used, requested);
    }

    if !mode.deducts() {
        return Ok(LimitContext::no_deduction());
    }

    let balance = uow
        .lock_balance(employee_id)
        .await?
        .ok_or(LeaveError::BalanceNotFound(employee_id))?;
    let mut available = balance.available(mode).unwrap_or_default();
    if let Some(t) = excluded.filter(|t| {
        t.employee_id == employee_id && t.status == LeaveStatus::Approved && t.charging_mode == mode
    }) {
        available += t.deducted_credit;
    }

    limits::check_running_balance(mode, available, requested)
}

async fn apply_plan<U: LeaveUnitOfWork>(
    uow: &mut U,
    employee_id: EmployeeId,
    plan: &TransitionPlan,
) -> Result<(), LeaveError> {
    if !plan.touches_balance() {
        return Ok(());
    }

    let mut balance = uow
        .lock_balance(employee_id)
        .await?
        .ok_or(LeaveError::BalanceNotFound(employee_id))?;
    balance.post(
        plan.reverse.filter(Posting::is_effective),
        plan.charge.filter(Posting::is_effective),
    )?;
    uow.save_balance(&balance).await
}

fn apply_stamp(
    transaction: &mut LeaveTransaction,
    stamp: ApprovalStamp,
    user_id: UserId,
    now: DateTime<Utc>,
) {
    match stamp {
        ApprovalStamp::Keep => {}
        ApprovalStamp::Stamp => {
            transaction.approved_by = Some(user_id);
            transaction.approved_at = Some(now);
        }
        ApprovalStamp::Clear => {
            transaction.approved_by = None;
            transaction.approved_at = None;
        }
    }
}

fn ensure_credit(credit: Decimal) -> Result<(), LeaveError> {
    if credit < Decimal::ZERO {
        return Err(LeaveError::InvalidInput(
            "Deducted credit cannot be negative".to_string(),
        ));
    }
    if credit.round_dp(CREDIT_SCALE) != credit {
        return Err(LeaveError::InvalidInput(format!(
            "Deducted credit supports at most {CREDIT_SCALE} decimal places"
        )));
    }
    Ok(())
}

fn change_event(
    transaction: &LeaveTransaction,
    action: ChangeAction,
    previous_status: Option<LeaveStatus>,
) -> LeaveChangeEvent {
    let mut event = LeaveChangeEvent::new(transaction.employee_id, action, transaction.id);
    event.transaction_no = Some(transaction.transaction_no.clone());
    event.status = Some(transaction.status);
    event.previous_status = previous_status;
    event.leave_type_id = Some(transaction.leave_type_id);
    event
}
