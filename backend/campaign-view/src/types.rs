// backend/campaign-view/src/types.rs
//
// Domain types for campaigns and tiers as read from the factory and the
// per-campaign contracts. Amounts are integers in the ledger's smallest unit;
// percentages are kept in basis points so no floating point ever enters the
// aggregation path.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Amount in the ledger's smallest currency unit.
pub type Amount = u128;

/// Basis points representing 100%.
pub const FULLY_FUNDED_BPS: u32 = 10_000;

/// Opaque ledger address (campaign, factory or account).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Lifecycle state of a campaign as reported by its contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CampaignStatus {
    /// Accepting pledges.
    Active,
    /// Finalized with the goal reached.
    Successful,
    /// Finalized without reaching the goal.
    Failed,
    /// The contract reported a code this client does not know.
    Unknown,
}

impl CampaignStatus {
    /// Map the raw `state()` code. Unrecognised codes become `Unknown`.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Active,
            1 => Self::Successful,
            2 => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Successful => "Successful",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Directory entry returned by the factory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CampaignSummary {
    pub address: Address,
    pub owner: Address,
    pub name: String,
    /// Unix timestamp of the deployment.
    pub creation_time: u64,
}

/// A fixed-amount pledge option. Its position in the roster is its identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Tier {
    pub name: String,
    pub amount: Amount,
    pub backers: u64,
}

/// Raw campaign attributes once every field has resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Campaign {
    pub address: Address,
    pub owner: Address,
    pub name: String,
    pub description: String,
    pub goal: Amount,
    /// Unix timestamp (seconds).
    pub deadline: u64,
    pub balance: Amount,
    pub status: CampaignStatus,
}

impl Campaign {
    pub fn progress(&self) -> FundingProgress {
        FundingProgress::compute(self.balance, self.goal)
    }

    pub fn has_expired(&self, now: u64) -> bool {
        has_expired(self.deadline, now)
    }

    pub fn deadline_date(&self) -> Option<DateTime<Utc>> {
        deadline_date(self.deadline)
    }
}

/// `now > deadline`, independent of the contract's own lifecycle code.
pub fn has_expired(deadline: u64, now: u64) -> bool {
    now > deadline
}

/// Display conversion of a Unix deadline.
pub fn deadline_date(deadline: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(deadline).ok()?;
    DateTime::from_timestamp(secs, 0)
}

/// Funding progress in basis points, clamped to 100%.
///
/// Derived on every read from `(balance, goal)` and never stored. A goal of
/// zero is treated as one so the ratio is always defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct FundingProgress {
    basis_points: u32,
}

impl FundingProgress {
    pub fn compute(balance: Amount, goal: Amount) -> Self {
        let goal = goal.max(1);
        if balance >= goal {
            return Self {
                basis_points: FULLY_FUNDED_BPS,
            };
        }
        let full = Amount::from(FULLY_FUNDED_BPS);
        let basis_points = match balance.checked_mul(full) {
            Some(scaled) => (scaled / goal) as u32,
            None => scaled_fraction(balance, goal),
        };
        Self { basis_points }
    }

    /// Hundredths of a percent, `0..=10_000`.
    pub fn basis_points(&self) -> u32 {
        self.basis_points
    }

    /// Whole percent, rounded down.
    pub fn percent(&self) -> u32 {
        self.basis_points / 100
    }

    pub fn is_fully_funded(&self) -> bool {
        self.basis_points >= FULLY_FUNDED_BPS
    }
}

/// `floor(numerator * 10_000 / denominator)` for `numerator < denominator`,
/// by decimal long division. The remainder stays below `denominator`, so
/// nothing overflows and the result is at most 9_999.
fn scaled_fraction(numerator: Amount, denominator: Amount) -> u32 {
    let mut remainder = numerator;
    let mut basis_points = 0u32;
    for _ in 0..4 {
        // remainder * 10 = digit * denominator + next
        let mut digit = 0u32;
        let mut next: Amount = 0;
        for _ in 0..10 {
            if next >= denominator - remainder {
                next -= denominator - remainder;
                digit += 1;
            } else {
                next += remainder;
            }
        }
        basis_points = basis_points * 10 + digit;
        remainder = next;
    }
    basis_points
}

impl fmt::Display for FundingProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}%",
            self.basis_points / 100,
            self.basis_points % 100
        )
    }
}
