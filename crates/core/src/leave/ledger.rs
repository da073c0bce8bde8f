//! Balance ledger: debits and credits against a locked balance row.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::leave::error::LeaveError;
use crate::leave::types::{ChargingMode, LeaveBalance, LeaveTransaction};

/// An amount charged to or restored to one balance bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Posting {
    /// Bucket.
    pub charging_mode: ChargingMode,
    /// Days.
    pub amount: Decimal,
}

impl Posting {
    /// Creates a posting.
    #[must_use]
    pub const fn new(charging_mode: ChargingMode, amount: Decimal) -> Self {
        Self {
            charging_mode,
            amount,
        }
    }

    /// Whether applying this posting changes any balance.
    #[must_use]
    pub fn is_effective(&self) -> bool {
        self.charging_mode.deducts() && !self.amount.is_zero()
    }
}

impl LeaveTransaction {
    /// What this transaction charges while approved, from its snapshot.
    #[must_use]
    pub const fn posting(&self) -> Posting {
        Posting::new(self.charging_mode, self.deducted_credit)
    }
}

impl LeaveBalance {
    /// Deducts `amount` from the bucket of `mode`. `ND` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative amount and
    /// `BalanceWouldGoNegative` when the bucket would drop below zero.
    pub fn debit(&mut self, mode: ChargingMode, amount: Decimal) -> Result<(), LeaveError> {
        ensure_non_negative(amount)?;
        let employee_id = self.employee_id;
        let Some(field) = self.bucket_mut(mode) else {
            return Ok(());
        };

        if *field < amount {
            return Err(LeaveError::BalanceWouldGoNegative {
                employee_id,
                charging_mode: mode,
                balance: *field,
                amount,
            });
        }

        *field -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Restores `amount` to the bucket of `mode`. `ND` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a negative amount.
    pub fn credit(&mut self, mode: ChargingMode, amount: Decimal) -> Result<(), LeaveError> {
        ensure_non_negative(amount)?;
        if let Some(field) = self.bucket_mut(mode) {
            *field += amount;
            self.updated_at = Utc::now();
        }
        Ok(())
    }

    /// Restores `reverse` then charges `charge`, all or nothing.
    ///
    /// # Errors
    ///
    /// Propagates the first failing credit or debit. The balance is left
    /// untouched on error.
    pub fn post(
        &mut self,
        reverse: Option<Posting>,
        charge: Option<Posting>,
    ) -> Result<(), LeaveError> {
        let mut next = self.clone();
        if let Some(p) = reverse {
            next.credit(p.charging_mode, p.amount)?;
        }
        if let Some(p) = charge {
            next.debit(p.charging_mode, p.amount)?;
        }
        *self = next;
        Ok(())
    }

    fn bucket_mut(&mut self, mode: ChargingMode) -> Option<&mut Decimal> {
        match mode {
            ChargingMode::Vl => Some(&mut self.vl),
            ChargingMode::Sl => Some(&mut self.sl),
            ChargingMode::Nd => None,
        }
    }
}

fn ensure_non_negative(amount: Decimal) -> Result<(), LeaveError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(LeaveError::InvalidInput(format!(
            "Leave credit cannot be negative: {amount}"
        )));
    }
    Ok(())
}
