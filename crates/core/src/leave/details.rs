//! Detail rows and transaction numbering.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use kawani_shared::types::LeaveTransactionId;

use crate::leave::types::LeaveTransactionDetail;

/// Decimal places kept for per-day credit.
pub const CREDIT_SCALE: u32 = 4;

/// Marker between the date part and the sequence of a transaction number.
pub const TRANSACTION_NO_MARKER: &str = "LV";

/// Sorts and deduplicates requested dates.
#[must_use]
pub fn distinct_dates(dates: &[NaiveDate]) -> Vec<NaiveDate> {
    let mut out = dates.to_vec();
    out.sort_unstable();
    out.dedup();
    out
}

/// Splits `total` across `dates`.
///
/// Each date gets `total / n` truncated to [`CREDIT_SCALE`] places; the last
/// date absorbs the remainder so the rows sum exactly to `total` and no row
/// is negative.
/// `dates` must already be distinct.
#[must_use]
pub fn split_credit(
    transaction_id: LeaveTransactionId,
    dates: &[NaiveDate],
    total: Decimal,
) -> Vec<LeaveTransactionDetail> {
    let Some((last, head)) = dates.split_last() else {
        return Vec::new();
    };

    let per_day = (total / Decimal::from(dates.len()))
        .round_dp_with_strategy(CREDIT_SCALE, RoundingStrategy::ToZero);
    let remainder = total - per_day * Decimal::from(head.len());

    head.iter()
        .map(|d| (*d, per_day))
        .chain(std::iter::once((*last, remainder)))
        .map(|(leave_date, credit_for_day)| LeaveTransactionDetail {
            transaction_id,
            leave_date,
            credit_for_day,
        })
        .collect()
}

/// Formats a transaction number, `YYMMDDLV-NNN`, where `NNN` is one more
/// than the number of transactions already created on `day`.
#[must_use]
pub fn transaction_number(day: NaiveDate, created_today: u64) -> String {
    format!(
        "{}{TRANSACTION_NO_MARKER}-{:03}",
        day.format("%y%m%d"),
        created_today + 1
    )
}
