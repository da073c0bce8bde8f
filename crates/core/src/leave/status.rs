//! Leave transaction status and its normalization.
//!
//! The store has accumulated several spellings of the initial state over
//! time (blank, `pending`, `PENDING`, `For Approval`). Every read and write
//! boundary goes through [`LeaveStatus::normalize`] so the rest of the crate
//! only ever compares enum variants.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Canonical status of a leave transaction.
///
/// - `ForApproval` is the initial state.
/// - `Approved` is the only state in which credits are deducted.
/// - `Returned` is only reachable from `ForApproval`.
/// - `Cancelled` is reachable from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaveStatus {
    /// Filed and awaiting a decision.
    ForApproval,
    /// Approved; credits are deducted from the employee's balance.
    Approved,
    /// Sent back to the filer for correction.
    Returned,
    /// Withdrawn or voided.
    Cancelled,
}

impl LeaveStatus {
    /// All canonical statuses.
    pub const ALL: [Self; 4] = [
        Self::ForApproval,
        Self::Approved,
        Self::Returned,
        Self::Cancelled,
    ];

    /// Returns the canonical stored spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ForApproval => "For Approval",
            Self::Approved => "Approved",
            Self::Returned => "Returned",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Maps a raw, possibly legacy status string onto a canonical status.
    ///
    /// Blank input and any casing of `pending` map to `ForApproval`. Other
    /// values are trimmed and matched case-insensitively, ignoring spaces,
    /// underscores and hyphens. Unrecognized legacy values fall back to
    /// `ForApproval`. Never fails.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "approved" => Self::Approved,
            "returned" => Self::Returned,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::ForApproval,
        }
    }

    /// Same as [`normalize`](Self::normalize) but treats a missing value as blank.
    #[must_use]
    pub fn normalize_opt(raw: Option<&str>) -> Self {
        raw.map_or(Self::ForApproval, Self::normalize)
    }

    /// Whether a transaction in this status reserves annual entitlement.
    ///
    /// `Returned` counts alongside `Approved` and `ForApproval`.
    #[must_use]
    pub const fn counts_toward_annual_usage(&self) -> bool {
        matches!(self, Self::Approved | Self::ForApproval | Self::Returned)
    }
}

impl fmt::Display for LeaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaveStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl Serialize for LeaveStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LeaveStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Self::normalize_opt(raw.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("", LeaveStatus::ForApproval)]
    #[case("   ", LeaveStatus::ForApproval)]
    #[case("pending", LeaveStatus::ForApproval)]
    #[case("PENDING", LeaveStatus::ForApproval)]
    #[case(" Pending ", LeaveStatus::ForApproval)]
    #[case("For Approval", LeaveStatus::ForApproval)]
    #[case("for_approval", LeaveStatus::ForApproval)]
    #[case("Approved", LeaveStatus::Approved)]
    #[case("  approved ", LeaveStatus::Approved)]
    #[case("Returned", LeaveStatus::Returned)]
    #[case("Cancelled", LeaveStatus::Cancelled)]
    #[case("canceled", LeaveStatus::Cancelled)]
    #[case("something-legacy", LeaveStatus::ForApproval)]
    fn test_normalize(#[case] raw: &str, #[case] expected: LeaveStatus) {
        assert_eq!(LeaveStatus::normalize(raw), expected);
    }

    #[test]
    fn test_normalize_missing_value() {
        assert_eq!(LeaveStatus::normalize_opt(None), LeaveStatus::ForApproval);
    }

    #[test]
    fn test_canonical_spellings_round_trip() {
        for status in LeaveStatus::ALL {
            assert_eq!(LeaveStatus::normalize(status.as_str()), status);
        }
    }

    #[test]
    fn test_serde_uses_canonical_spelling() {
        let json = serde_json::to_string(&LeaveStatus::ForApproval).unwrap();
        assert_eq!(json, "\"For Approval\"");

        let parsed: LeaveStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, LeaveStatus::ForApproval);

        let parsed: LeaveStatus = serde_json::from_str("null").unwrap();
        assert_eq!(parsed, LeaveStatus::ForApproval);

        let parsed: LeaveStatus = serde_json::from_str("\"APPROVED\"").unwrap();
        assert_eq!(parsed, LeaveStatus::Approved);
    }

    #[test]
    fn test_annual_usage_statuses() {
        assert!(LeaveStatus::Approved.counts_toward_annual_usage());
        assert!(LeaveStatus::ForApproval.counts_toward_annual_usage());
        assert!(LeaveStatus::Returned.counts_toward_annual_usage());
        assert!(!LeaveStatus::Cancelled.counts_toward_annual_usage());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Normalizing twice gives the same answer as normalizing once.
        #[test]
        fn prop_normalize_is_idempotent(raw in ".{0,24}") {
            let once = LeaveStatus::normalize(&raw);
            let twice = LeaveStatus::normalize(once.as_str());
            prop_assert_eq!(once, twice);
        }
    }
}
