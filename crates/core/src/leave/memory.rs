//! In-memory leave store.
//!
//! Units of work hold an owned lock on the whole state and stage their
//! changes on a copy, so they are serialized and all-or-nothing like the
//! Postgres store. Used by tests and for running the API without a database.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, OwnedMutexGuard};

use kawani_shared::types::{EmployeeId, LeaveTransactionId, LeaveTypeId};

use crate::leave::error::LeaveError;
use crate::leave::store::{LeaveStore, LeaveUnitOfWork};
use crate::leave::types::{
    EmployeeLeaveSummary, LeaveBalance, LeaveTransaction, LeaveTransactionDetail,
    LeaveTransactionRecord, LeaveType, QuestionAnswer, TransactionFilter,
};

#[derive(Debug, Clone, Default)]
struct LeaveState {
    leave_types: HashMap<LeaveTypeId, LeaveType>,
    balances: HashMap<EmployeeId, LeaveBalance>,
    transactions: HashMap<LeaveTransactionId, LeaveTransaction>,
    details: HashMap<LeaveTransactionId, Vec<LeaveTransactionDetail>>,
    answers: HashMap<LeaveTransactionId, QuestionAnswer>,
}

impl LeaveState {
    fn dates(&self, id: LeaveTransactionId) -> Vec<NaiveDate> {
        self.details
            .get(&id)
            .map(|rows| rows.iter().map(|r| r.leave_date).collect())
            .unwrap_or_default()
    }

    fn record(&self, transaction: &LeaveTransaction) -> LeaveTransactionRecord {
        LeaveTransactionRecord {
            transaction: transaction.clone(),
            details: self
                .details
                .get(&transaction.id)
                .cloned()
                .unwrap_or_default(),
            question_answer: self.answers.get(&transaction.id).cloned(),
        }
    }
}

/// Leave store kept in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeaveStore {
    state: Arc<Mutex<LeaveState>>,
    fail_next_commit: Arc<AtomicBool>,
}

impl InMemoryLeaveStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a leave type.
    pub async fn put_leave_type(&self, leave_type: LeaveType) {
        self.state
            .lock()
            .await
            .leave_types
            .insert(leave_type.id, leave_type);
    }

    /// Adds or replaces a balance row.
    pub async fn put_balance(&self, balance: LeaveBalance) {
        self.state
            .lock()
            .await
            .balances
            .insert(balance.employee_id, balance);
    }

    /// Makes the next commit fail with a storage error.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }
}

/// Unit of work over [`InMemoryLeaveStore`].
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<LeaveState>,
    staged: LeaveState,
    fail_commit: Arc<AtomicBool>,
}

#[async_trait]
impl LeaveUnitOfWork for InMemoryUnitOfWork {
    async fn find_leave_type(&mut self, id: LeaveTypeId) -> Result<Option<LeaveType>, LeaveError> {
        Ok(self.staged.leave_types.get(&id).cloned())
    }

    async fn lock_balance(
        &mut self,
        employee_id: EmployeeId,
    ) -> Result<Option<LeaveBalance>, LeaveError> {
        Ok(self.staged.balances.get(&employee_id).cloned())
    }

    async fn save_balance(&mut self, balance: &LeaveBalance) -> Result<(), LeaveError> {
        self.staged
            .balances
            .insert(balance.employee_id, balance.clone());
        Ok(())
    }

    async fn lock_annual_usage(
        &mut self,
        _employee_id: EmployeeId,
        _leave_type_id: LeaveTypeId,
        _year: i32,
    ) -> Result<(), LeaveError> {
        // The unit already holds the whole state.
        Ok(())
    }

    async fn annual_usage(
        &mut self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        year: i32,
        exclude: Option<LeaveTransactionId>,
    ) -> Result<Decimal, LeaveError> {
        let state = &self.staged;
        Ok(state
            .transactions
            .values()
            .filter(|t| {
                t.employee_id == employee_id
                    && t.leave_type_id == leave_type_id
                    && t.status.counts_toward_annual_usage()
                    && exclude != Some(t.id)
            })
            .filter(|t| {
                state
                    .dates(t.id)
                    .into_iter()
                    .min()
                    .is_some_and(|first| first.year() == year)
            })
            .map(|t| t.deducted_credit)
            .sum())
    }

    async fn lock_transaction(
        &mut self,
        id: LeaveTransactionId,
    ) -> Result<Option<LeaveTransaction>, LeaveError> {
        Ok(self.staged.transactions.get(&id).cloned())
    }

    async fn detail_dates(&mut self, id: LeaveTransactionId) -> Result<Vec<NaiveDate>, LeaveError> {
        let mut dates = self.staged.dates(id);
        dates.sort_unstable();
        Ok(dates)
    }

    async fn count_created_on(&mut self, day: NaiveDate) -> Result<u64, LeaveError> {
        let count = self
            .staged
            .transactions
            .values()
            .filter(|t| t.created_at.date_naive() == day)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn insert_transaction(
        &mut self,
        transaction: &LeaveTransaction,
    ) -> Result<(), LeaveError> {
        if self.staged.transactions.contains_key(&transaction.id) {
            return Err(LeaveError::Storage(format!(
                "duplicate leave transaction {}",
                transaction.id
            )));
        }
        self.staged
            .transactions
            .insert(transaction.id, transaction.clone());
        Ok(())
    }

    async fn update_transaction(
        &mut self,
        transaction: &LeaveTransaction,
    ) -> Result<(), LeaveError> {
        match self.staged.transactions.get_mut(&transaction.id) {
            Some(row) => {
                *row = transaction.clone();
                Ok(())
            }
            None => Err(LeaveError::TransactionNotFound(transaction.id)),
        }
    }

    async fn replace_details(
        &mut self,
        id: LeaveTransactionId,
        details: &[LeaveTransactionDetail],
    ) -> Result<(), LeaveError> {
        let mut rows = details.to_vec();
        rows.sort_by_key(|r| r.leave_date);
        self.staged.details.insert(id, rows);
        Ok(())
    }

    async fn replace_question_answer(
        &mut self,
        id: LeaveTransactionId,
        answer: Option<&QuestionAnswer>,
    ) -> Result<(), LeaveError> {
        match answer {
            Some(answer) => {
                self.staged.answers.insert(id, answer.clone());
            }
            None => {
                self.staged.answers.remove(&id);
            }
        }
        Ok(())
    }

    async fn delete_transaction(&mut self, id: LeaveTransactionId) -> Result<(), LeaveError> {
        self.staged.answers.remove(&id);
        self.staged.details.remove(&id);
        self.staged.transactions.remove(&id);
        Ok(())
    }

    async fn commit(mut self) -> Result<(), LeaveError> {
        if self.fail_commit.swap(false, Ordering::SeqCst) {
            return Err(LeaveError::Storage("commit failed".to_string()));
        }
        *self.guard = std::mem::take(&mut self.staged);
        Ok(())
    }
}

#[async_trait]
impl LeaveStore for InMemoryLeaveStore {
    type UnitOfWork = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<Self::UnitOfWork, LeaveError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryUnitOfWork {
            guard,
            staged,
            fail_commit: Arc::clone(&self.fail_next_commit),
        })
    }

    async fn list_leave_types(&self) -> Result<Vec<LeaveType>, LeaveError> {
        let state = self.state.lock().await;
        let mut types: Vec<LeaveType> = state.leave_types.values().cloned().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn find_balance(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Option<LeaveBalance>, LeaveError> {
        Ok(self.state.lock().await.balances.get(&employee_id).cloned())
    }

    async fn find_transaction(
        &self,
        id: LeaveTransactionId,
    ) -> Result<Option<LeaveTransactionRecord>, LeaveError> {
        let state = self.state.lock().await;
        Ok(state.transactions.get(&id).map(|t| state.record(t)))
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<LeaveTransactionRecord>, LeaveError> {
        let state = self.state.lock().await;
        let mut records: Vec<LeaveTransactionRecord> = state
            .transactions
            .values()
            .filter(|t| filter.matches(t, &state.dates(t.id)))
            .map(|t| state.record(t))
            .collect();
        records.sort_by(|a, b| {
            b.transaction
                .created_at
                .cmp(&a.transaction.created_at)
                .then_with(|| b.transaction.id.cmp(&a.transaction.id))
        });
        Ok(records)
    }

    async fn employee_summaries(&self) -> Result<Vec<EmployeeLeaveSummary>, LeaveError> {
        let state = self.state.lock().await;
        let mut summaries: HashMap<EmployeeId, EmployeeLeaveSummary> = state
            .balances
            .values()
            .map(|b| (b.employee_id, EmployeeLeaveSummary::from_balance(b)))
            .collect();
        for transaction in state.transactions.values() {
            if let Some(summary) = summaries.get_mut(&transaction.employee_id) {
                summary.add(transaction);
            }
        }
        let mut summaries: Vec<EmployeeLeaveSummary> = summaries.into_values().collect();
        summaries.sort_by_key(|s| s.employee_id);
        Ok(summaries)
    }
}
