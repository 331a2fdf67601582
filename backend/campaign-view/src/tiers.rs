// backend/campaign-view/src/tiers.rs
//
// Tier roster of one campaign. A tier is addressed by its position in the
// ledger-ordered list; pledges and removals target an index, so every write
// re-reads the roster and checks the selected position still holds the same
// tier before anything is submitted.

use std::sync::Arc;

use serde::Serialize;

use crate::config::ViewConfig;
use crate::error::{ReadFailure, ValidationFailure};
use crate::field::Listing;
use crate::gateway::{bounded_read, LedgerGateway, WriteCall};
use crate::types::{Address, Amount, Tier};

/// Smallest accepted tier amount.
pub const MIN_TIER_AMOUNT: Amount = 1;

/// A tier picked from a roster the caller last read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TierSelection {
    pub campaign: Address,
    pub index: usize,
    pub tier: Tier,
}

impl TierSelection {
    pub fn from_listing(campaign: &Address, tiers: &Listing<Tier>, index: usize) -> Option<Self> {
        tiers.items().get(index).map(|tier| Self {
            campaign: campaign.clone(),
            index,
            tier: tier.clone(),
        })
    }

    /// Check the selection against the current roster and return the live tier.
    ///
    /// Backer counts are expected to move; name and amount are not.
    pub fn verify<'a>(&self, current: &'a [Tier]) -> Result<&'a Tier, ValidationFailure> {
        let live = current
            .get(self.index)
            .ok_or(ValidationFailure::TierIndexOutOfRange {
                index: self.index,
                len: current.len(),
            })?;
        if live.name != self.tier.name || live.amount != self.tier.amount {
            return Err(ValidationFailure::TierChanged { index: self.index });
        }
        Ok(live)
    }
}

pub struct TierLedger {
    gateway: Arc<dyn LedgerGateway>,
    config: ViewConfig,
}

impl TierLedger {
    pub fn new(gateway: Arc<dyn LedgerGateway>, config: ViewConfig) -> Self {
        Self { gateway, config }
    }

    /// `getTiers()` in ledger order.
    pub async fn list_tiers(&self, campaign: &Address) -> Listing<Tier> {
        self.fetch_roster(campaign).await.into()
    }

    pub(crate) async fn fetch_roster(&self, campaign: &Address) -> Result<Vec<Tier>, ReadFailure> {
        bounded_read(self.config.read_timeout, self.gateway.tiers(campaign))
            .await
            .inspect_err(|err| {
                tracing::warn!(campaign = %campaign, field = "tiers", error = %err, "tier read failed");
            })
    }

    /// Build an `addTier` call. Ownership is left to the ledger.
    pub fn add_tier_call(
        campaign: &Address,
        name: impl Into<String>,
        amount: Amount,
    ) -> Result<WriteCall, ValidationFailure> {
        if amount < MIN_TIER_AMOUNT {
            return Err(ValidationFailure::TierAmountBelowMinimum);
        }
        Ok(WriteCall::AddTier {
            campaign: campaign.clone(),
            name: name.into(),
            amount,
        })
    }
}
