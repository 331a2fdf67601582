//! Campaign aggregation and funding-state model for the crowdfunding factory.
//!
//! Ground truth lives on the ledger; this crate turns contract reads into a
//! derived view (progress, expiry, status, tier roster) and mediates the
//! user-initiated writes (create campaign, add/remove tier, pledge).
//!
//! The active account is always an explicit argument. The only mutable state
//! held here is the [`ViewCache`], invalidated whole on confirmed mutations.

use std::sync::Arc;

mod cache;
mod clock;
mod config;
mod directory;
mod error;
mod events;
mod field;
mod gateway;
pub mod logging;
mod mutation;
mod reader;
mod tiers;
mod types;

#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

#[cfg(test)]
mod test_mutations;
#[cfg(test)]
mod test_properties;

pub use cache::{DirectoryKey, Snapshot, ViewCache};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::ViewConfig;
pub use directory::CampaignDirectory;
pub use error::{
    ConfigError, ErrorCategory, GatewayError, MutationError, ReadFailure, ValidationFailure,
};
pub use events::{CampaignDeployed, MutationEvent, PledgeConfirmed, TierAdded, TierRemoved};
pub use field::{Field, Listing};
pub use gateway::{LedgerGateway, Receipt, TxId, WriteCall};
pub use mutation::{
    coerce_duration_days, coerce_goal, MutationService, MutationStatus, NewCampaign,
    PendingMutation,
};
pub use reader::{CampaignCard, CampaignReader, CampaignView};
pub use tiers::{TierLedger, TierSelection};
pub use types::{
    Address, Amount, Campaign, CampaignStatus, CampaignSummary, FundingProgress, Tier,
};

/// Directory, reader, tier ledger and mutation service over one gateway and
/// one shared cache.
pub struct CampaignCore {
    pub directory: CampaignDirectory,
    pub reader: CampaignReader,
    pub tiers: TierLedger,
    pub mutations: MutationService,
    cache: Arc<ViewCache>,
}

impl CampaignCore {
    pub fn new(gateway: Arc<dyn LedgerGateway>, config: ViewConfig) -> Self {
        Self::with_clock(gateway, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        gateway: Arc<dyn LedgerGateway>,
        config: ViewConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(ViewCache::new());
        Self {
            directory: CampaignDirectory::new(
                Arc::clone(&gateway),
                Arc::clone(&cache),
                config.clone(),
            ),
            reader: CampaignReader::new(
                Arc::clone(&gateway),
                Arc::clone(&cache),
                clock,
                config.clone(),
            ),
            tiers: TierLedger::new(Arc::clone(&gateway), config.clone()),
            mutations: MutationService::new(gateway, Arc::clone(&cache), config),
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ViewCache> {
        &self.cache
    }
}
