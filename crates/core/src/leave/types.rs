//! Leave domain types.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use kawani_shared::types::{EmployeeId, LeaveTransactionId, LeaveTypeId, UserId};

use crate::leave::details::distinct_dates;
use crate::leave::status::LeaveStatus;

/// Which balance bucket a leave type draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChargingMode {
    /// Vacation leave balance.
    Vl,
    /// Sick leave balance.
    Sl,
    /// No deduction.
    Nd,
}

impl ChargingMode {
    /// Returns the stored code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Vl => "VL",
            Self::Sl => "SL",
            Self::Nd => "ND",
        }
    }

    /// Parses a stored code. Blank input defaults to `VL`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "" | "VL" => Some(Self::Vl),
            "SL" => Some(Self::Sl),
            "ND" => Some(Self::Nd),
            _ => None,
        }
    }

    /// Whether postings in this mode touch a balance bucket.
    #[must_use]
    pub const fn deducts(&self) -> bool {
        !matches!(self, Self::Nd)
    }
}

impl fmt::Display for ChargingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Limit rules for a leave type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entitlement {
    /// Balance bucket charged on approval.
    pub charging_mode: ChargingMode,
    /// Annual cap in days. Absent or zero means no cap.
    pub annual_entitlement: Option<Decimal>,
}

impl Entitlement {
    /// Returns the annual cap if one applies.
    #[must_use]
    pub fn annual_cap(&self) -> Option<Decimal> {
        self.annual_entitlement.filter(|cap| *cap > Decimal::ZERO)
    }
}

/// A configured leave type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveType {
    /// Leave type ID.
    pub id: LeaveTypeId,
    /// Short code (e.g. "VL").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Balance bucket charged on approval.
    pub charging_mode: ChargingMode,
    /// Annual cap in days, if any.
    pub annual_entitlement: Option<Decimal>,
}

impl LeaveType {
    /// Returns the limit rules of this leave type.
    #[must_use]
    pub const fn entitlement(&self) -> Entitlement {
        Entitlement {
            charging_mode: self.charging_mode,
            annual_entitlement: self.annual_entitlement,
        }
    }
}

/// Per-employee running balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveBalance {
    /// Owning employee.
    pub employee_id: EmployeeId,
    /// Vacation leave balance in days.
    pub vl: Decimal,
    /// Sick leave balance in days.
    pub sl: Decimal,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl LeaveBalance {
    /// Creates a balance row.
    #[must_use]
    pub fn new(employee_id: EmployeeId, vl: Decimal, sl: Decimal) -> Self {
        Self {
            employee_id,
            vl,
            sl,
            updated_at: Utc::now(),
        }
    }

    /// Returns the balance of a bucket. `ND` has none.
    #[must_use]
    pub const fn available(&self, mode: ChargingMode) -> Option<Decimal> {
        match mode {
            ChargingMode::Vl => Some(self.vl),
            ChargingMode::Sl => Some(self.sl),
            ChargingMode::Nd => None,
        }
    }
}

/// Leave roll-up for one employee.
///
/// Every employee with a balance row gets one, even without transactions.
/// Cancelled leaves are left out of `filed_credit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmployeeLeaveSummary {
    /// Employee.
    pub employee_id: EmployeeId,
    /// Vacation leave balance in days.
    pub vl: Decimal,
    /// Sick leave balance in days.
    pub sl: Decimal,
    /// Credit of all live transactions.
    pub filed_credit: Decimal,
    /// Number of approved transactions.
    pub approved_count: u64,
}

impl EmployeeLeaveSummary {
    /// Starts a summary with no transactions.
    #[must_use]
    pub fn from_balance(balance: &LeaveBalance) -> Self {
        Self {
            employee_id: balance.employee_id,
            vl: balance.vl,
            sl: balance.sl,
            filed_credit: Decimal::ZERO,
            approved_count: 0,
        }
    }

    /// Folds one transaction in.
    pub fn add(&mut self, transaction: &LeaveTransaction) {
        if transaction.status.counts_toward_annual_usage() {
            self.filed_credit += transaction.deducted_credit;
        }
        if transaction.status == LeaveStatus::Approved {
            self.approved_count += 1;
        }
    }
}

/// Header row of a leave request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTransaction {
    /// Transaction ID.
    pub id: LeaveTransactionId,
    /// Human-readable number, `YYMMDDLV-NNN`.
    pub transaction_no: String,
    /// Filing employee.
    pub employee_id: EmployeeId,
    /// Leave type.
    pub leave_type_id: LeaveTypeId,
    /// Bucket captured when the leave type was last set.
    pub charging_mode: ChargingMode,
    /// Total credit in days.
    pub deducted_credit: Decimal,
    /// Reason for the leave.
    pub purpose: Option<String>,
    /// Free-form remarks.
    pub remarks: Option<String>,
    /// Current status.
    pub status: LeaveStatus,
    /// Creator.
    pub created_by: Option<UserId>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Approver, present only while `Approved`.
    pub approved_by: Option<UserId>,
    /// Approval time, present only while `Approved`.
    pub approved_at: Option<DateTime<Utc>>,
    /// Last editor.
    pub updated_by: Option<UserId>,
    /// Last edit time.
    pub updated_at: DateTime<Utc>,
}

/// One leave date of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTransactionDetail {
    /// Owning transaction.
    pub transaction_id: LeaveTransactionId,
    /// Leave date.
    pub leave_date: NaiveDate,
    /// Share of the total credit charged to this date.
    pub credit_for_day: Decimal,
}

/// Answer to the leave type's screening question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionAnswer {
    /// Question identifier.
    pub question_id: String,
    /// Answer text.
    pub answer: String,
}

impl QuestionAnswer {
    /// Whether both the question and the answer are filled in.
    #[must_use]
    pub fn is_answered(&self) -> bool {
        !self.question_id.trim().is_empty() && !self.answer.trim().is_empty()
    }
}

/// A transaction with its details and answer, as returned to readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTransactionRecord {
    /// Header fields.
    #[serde(flatten)]
    pub transaction: LeaveTransaction,
    /// Leave dates, ascending.
    pub details: Vec<LeaveTransactionDetail>,
    /// Screening answer, if any.
    pub question_answer: Option<QuestionAnswer>,
}

/// Filter for listing transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransactionFilter {
    /// Restrict to one employee.
    pub employee_id: Option<EmployeeId>,
    /// Restrict to one leave type.
    pub leave_type_id: Option<LeaveTypeId>,
    /// Restrict to one status.
    pub status: Option<LeaveStatus>,
    /// Keep transactions with at least one date on or after this day.
    pub date_from: Option<NaiveDate>,
    /// Keep transactions with at least one date on or before this day.
    pub date_to: Option<NaiveDate>,
}

impl TransactionFilter {
    /// Whether a transaction and its dates satisfy this filter.
    #[must_use]
    pub fn matches(&self, transaction: &LeaveTransaction, dates: &[NaiveDate]) -> bool {
        if self.employee_id.is_some_and(|id| id != transaction.employee_id) {
            return false;
        }
        if self
            .leave_type_id
            .is_some_and(|id| id != transaction.leave_type_id)
        {
            return false;
        }
        if self.status.is_some_and(|s| s != transaction.status) {
            return false;
        }
        if self.date_from.is_none() && self.date_to.is_none() {
            return true;
        }
        dates.iter().any(|d| {
            self.date_from.is_none_or(|from| *d >= from) && self.date_to.is_none_or(|to| *d <= to)
        })
    }
}

/// Input for filing a leave request.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLeaveTransaction {
    /// Filing employee.
    pub employee_id: EmployeeId,
    /// Leave type.
    pub leave_type_id: LeaveTypeId,
    /// Reason for the leave.
    #[serde(default)]
    pub purpose: Option<String>,
    /// Free-form remarks.
    #[serde(default)]
    pub remarks: Option<String>,
    /// Leave dates; duplicates are collapsed.
    pub dates: Vec<NaiveDate>,
    /// Total credit in days.
    pub deducted_credit: Decimal,
    /// `For Approval` (default) or `Approved`.
    #[serde(default)]
    pub status: Option<LeaveStatus>,
    /// Screening answer.
    #[serde(default)]
    pub question_answer: Option<QuestionAnswer>,
}

/// Partial update of a leave request. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLeaveTransaction {
    /// New leave type.
    #[serde(default)]
    pub leave_type_id: Option<LeaveTypeId>,
    /// New total credit.
    #[serde(default)]
    pub deducted_credit: Option<Decimal>,
    /// New leave dates. An empty list keeps the current dates.
    #[serde(default)]
    pub dates: Option<Vec<NaiveDate>>,
    /// New purpose.
    #[serde(default)]
    pub purpose: Option<String>,
    /// New remarks.
    #[serde(default)]
    pub remarks: Option<String>,
    /// Target status.
    #[serde(default)]
    pub status: Option<LeaveStatus>,
    /// Replacement screening answer. An unanswered value removes it.
    #[serde(default)]
    pub question_answer: Option<QuestionAnswer>,
}

impl UpdateLeaveTransaction {
    /// Whether applying the patch to `current` changes what the leave
    /// charges: its leave type, its credit, or its set of dates.
    #[must_use]
    pub fn changes_posting(&self, current: &LeaveTransactionRecord) -> bool {
        let header = &current.transaction;
        let type_changed = self
            .leave_type_id
            .is_some_and(|id| id != header.leave_type_id);
        let credit_changed = self
            .deducted_credit
            .is_some_and(|credit| credit != header.deducted_credit);
        let dates_changed = self.dates.as_deref().filter(|d| !d.is_empty()).is_some_and(|d| {
            let stored: Vec<NaiveDate> = current.details.iter().map(|row| row.leave_date).collect();
            distinct_dates(d) != distinct_dates(&stored)
        });
        type_changed || credit_changed || dates_changed
    }
}

/// Dry-run limit check request.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitCheck {
    /// Employee to check.
    pub employee_id: EmployeeId,
    /// Leave type to check.
    pub leave_type_id: LeaveTypeId,
    /// Requested credit in days.
    #[serde(default)]
    pub requested_credit: Decimal,
    /// Dates used to pick the anchor year.
    #[serde(default)]
    pub dates: Vec<NaiveDate>,
    /// Transaction being edited, excluded from usage.
    #[serde(default)]
    pub exclude_transaction_id: Option<LeaveTransactionId>,
}

/// Identifiers assigned to a new transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedLeaveTransaction {
    /// Transaction ID.
    pub transaction_id: LeaveTransactionId,
    /// Transaction number.
    pub transaction_no: String,
}
