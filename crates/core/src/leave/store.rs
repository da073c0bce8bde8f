//! Persistence seam for the leave ledger.
//!
//! A [`LeaveStore`] hands out one [`LeaveUnitOfWork`] per operation. Every
//! read and write of that operation goes through the unit of work, and
//! nothing is visible to other units until [`LeaveUnitOfWork::commit`].
//! Dropping a unit of work without committing rolls it back.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use kawani_shared::types::{EmployeeId, LeaveTransactionId, LeaveTypeId};

use crate::leave::error::LeaveError;
use crate::leave::types::{
    EmployeeLeaveSummary, LeaveBalance, LeaveTransaction, LeaveTransactionDetail,
    LeaveTransactionRecord, LeaveType, QuestionAnswer, TransactionFilter,
};

/// One atomic unit of work.
#[async_trait]
pub trait LeaveUnitOfWork: Send {
    /// Looks up a leave type.
    async fn find_leave_type(&mut self, id: LeaveTypeId) -> Result<Option<LeaveType>, LeaveError>;

    /// Reads an employee's balance row and holds it until the unit ends.
    async fn lock_balance(
        &mut self,
        employee_id: EmployeeId,
    ) -> Result<Option<LeaveBalance>, LeaveError>;

    /// Writes back a balance row read with [`lock_balance`](Self::lock_balance).
    async fn save_balance(&mut self, balance: &LeaveBalance) -> Result<(), LeaveError>;

    /// Serializes annual-cap checks for one employee, leave type and year.
    async fn lock_annual_usage(
        &mut self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        year: i32,
    ) -> Result<(), LeaveError>;

    /// Sums the credit of live transactions of a leave type whose earliest
    /// date falls in `year`, leaving out `exclude`.
    async fn annual_usage(
        &mut self,
        employee_id: EmployeeId,
        leave_type_id: LeaveTypeId,
        year: i32,
        exclude: Option<LeaveTransactionId>,
    ) -> Result<Decimal, LeaveError>;

    /// Reads a transaction header and holds it until the unit ends.
    async fn lock_transaction(
        &mut self,
        id: LeaveTransactionId,
    ) -> Result<Option<LeaveTransaction>, LeaveError>;

    /// Returns the dates of a transaction, ascending.
    async fn detail_dates(&mut self, id: LeaveTransactionId) -> Result<Vec<NaiveDate>, LeaveError>;

    /// Counts transactions created on `day`.
    async fn count_created_on(&mut self, day: NaiveDate) -> Result<u64, LeaveError>;

    /// Inserts a new transaction header.
    async fn insert_transaction(&mut self, transaction: &LeaveTransaction)
    -> Result<(), LeaveError>;

    /// Overwrites a transaction header.
    async fn update_transaction(&mut self, transaction: &LeaveTransaction)
    -> Result<(), LeaveError>;

    /// Replaces all detail rows of a transaction.
    async fn replace_details(
        &mut self,
        id: LeaveTransactionId,
        details: &[LeaveTransactionDetail],
    ) -> Result<(), LeaveError>;

    /// Replaces the question answer of a transaction; `None` removes it.
    async fn replace_question_answer(
        &mut self,
        id: LeaveTransactionId,
        answer: Option<&QuestionAnswer>,
    ) -> Result<(), LeaveError>;

    /// Removes the question answer, the details and the header, in that order.
    async fn delete_transaction(&mut self, id: LeaveTransactionId) -> Result<(), LeaveError>;

    /// Makes every change of this unit visible.
    async fn commit(self) -> Result<(), LeaveError>;
}

/// Entry point to leave persistence.
#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Unit of work type.
    type UnitOfWork: LeaveUnitOfWork;

    /// Starts a unit of work.
    async fn begin(&self) -> Result<Self::UnitOfWork, LeaveError>;

    /// Lists all leave types by name.
    async fn list_leave_types(&self) -> Result<Vec<LeaveType>, LeaveError>;

    /// Reads a balance row without locking.
    async fn find_balance(
        &self,
        employee_id: EmployeeId,
    ) -> Result<Option<LeaveBalance>, LeaveError>;

    /// Reads a transaction with its details and answer.
    async fn find_transaction(
        &self,
        id: LeaveTransactionId,
    ) -> Result<Option<LeaveTransactionRecord>, LeaveError>;

    /// Lists transactions matching `filter`, newest first.
    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<LeaveTransactionRecord>, LeaveError>;

    /// Rolls up balances and transactions per employee, by employee ID.
    async fn employee_summaries(&self) -> Result<Vec<EmployeeLeaveSummary>, LeaveError>;
}
