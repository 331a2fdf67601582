// backend/campaign-view/src/reader.rs
//
// Campaign State Reader.
//
// All eight contract reads of a campaign are issued together and resolve
// independently: a field that times out or comes back malformed is recorded
// as `Field::Failed` and the rest of the view still renders. Status, expiry
// and progress are derived from whatever resolved, fresh on every read.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;

use crate::cache::{Snapshot, ViewCache};
use crate::clock::Clock;
use crate::config::ViewConfig;
use crate::error::GatewayError;
use crate::field::{Field, Listing};
use crate::gateway::{bounded_read, LedgerGateway};
use crate::tiers::{TierLedger, TierSelection};
use crate::types::{
    has_expired, Address, Amount, Campaign, CampaignStatus, FundingProgress, Tier,
};

/// Display state of one campaign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CampaignView {
    pub address: Address,
    pub name: Field<String>,
    pub description: Field<String>,
    pub owner: Field<Address>,
    pub goal: Field<Amount>,
    /// Unix timestamp (seconds).
    pub deadline: Field<u64>,
    pub balance: Field<Amount>,
    /// Raw `state()` code as reported by the contract.
    pub raw_state: Field<u8>,
    pub status: Field<CampaignStatus>,
    /// `now > deadline`. Reported beside `status`, never folded into it.
    pub has_expired: Field<bool>,
    pub progress: Field<FundingProgress>,
    pub tiers: Listing<Tier>,
    /// Clock reading used for `has_expired`.
    pub read_at: u64,
}

impl CampaignView {
    /// Whether `account` owns this campaign. False until the owner resolves.
    pub fn is_owned_by(&self, account: &Address) -> bool {
        self.owner.ready() == Some(account)
    }

    pub fn select_tier(&self, index: usize) -> Option<TierSelection> {
        TierSelection::from_listing(&self.address, &self.tiers, index)
    }

    /// The fully resolved campaign, if every scalar field is ready.
    pub fn campaign(&self) -> Option<Campaign> {
        Some(Campaign {
            address: self.address.clone(),
            owner: self.owner.ready()?.clone(),
            name: self.name.ready()?.clone(),
            description: self.description.ready()?.clone(),
            goal: *self.goal.ready()?,
            deadline: *self.deadline.ready()?,
            balance: *self.balance.ready()?,
            status: *self.status.ready()?,
        })
    }
}

/// The subset of a campaign shown on a directory card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CampaignCard {
    pub address: Address,
    pub name: Field<String>,
    pub description: Field<String>,
    pub goal: Field<Amount>,
    pub balance: Field<Amount>,
    pub progress: Field<FundingProgress>,
}

fn derive_progress(balance: &Field<Amount>, goal: &Field<Amount>) -> Field<FundingProgress> {
    balance
        .clone()
        .zip(goal.clone())
        .map(|(balance, goal)| FundingProgress::compute(balance, goal))
}

pub struct CampaignReader {
    gateway: Arc<dyn LedgerGateway>,
    cache: Arc<ViewCache>,
    clock: Arc<dyn Clock>,
    tiers: TierLedger,
    config: ViewConfig,
}

impl CampaignReader {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        cache: Arc<ViewCache>,
        clock: Arc<dyn Clock>,
        config: ViewConfig,
    ) -> Self {
        let tiers = TierLedger::new(Arc::clone(&gateway), config.clone());
        Self {
            gateway,
            cache,
            clock,
            tiers,
            config,
        }
    }

    async fn field<T>(
        &self,
        campaign: &Address,
        name: &'static str,
        read: impl Future<Output = Result<T, GatewayError>>,
    ) -> Field<T> {
        let result = bounded_read(self.config.read_timeout, read).await;
        if let Err(err) = &result {
            tracing::warn!(campaign = %campaign, field = name, error = %err, "campaign read failed");
        }
        result.into()
    }

    /// Read every field of `address` without touching the cache.
    pub async fn fetch(&self, address: &Address) -> CampaignView {
        let gw = &self.gateway;
        let (name, description, owner, goal, deadline, balance, raw_state, tiers) = tokio::join!(
            self.field(address, "name", gw.name(address)),
            self.field(address, "description", gw.description(address)),
            self.field(address, "owner", gw.owner(address)),
            self.field(address, "goal", gw.goal(address)),
            self.field(address, "deadline", gw.deadline(address)),
            self.field(address, "balance", gw.balance(address)),
            self.field(address, "state", gw.state(address)),
            self.tiers.list_tiers(address),
        );

        let now = self.clock.now();
        let status = raw_state.clone().map(CampaignStatus::from_code);
        let expired = deadline.clone().map(|deadline| has_expired(deadline, now));
        let progress = derive_progress(&balance, &goal);

        CampaignView {
            address: address.clone(),
            name,
            description,
            owner,
            goal,
            deadline,
            balance,
            raw_state,
            status,
            has_expired: expired,
            progress,
            tiers,
            read_at: now,
        }
    }

    /// Read `address` and install the result unless a newer read or an
    /// invalidation superseded it meanwhile.
    pub async fn read_campaign(&self, address: &Address) -> Arc<CampaignView> {
        let ticket = self.cache.campaigns.begin(address).await;
        let view = Arc::new(self.fetch(address).await);
        if !self.cache.campaigns.commit(address, ticket, Arc::clone(&view)).await {
            tracing::debug!(campaign = %address, "discarding superseded campaign read");
        }
        view
    }

    /// Read several campaigns concurrently. No ordering between them is implied.
    pub async fn read_many(&self, addresses: &[Address]) -> HashMap<Address, Arc<CampaignView>> {
        let views = join_all(addresses.iter().map(|address| self.read_campaign(address))).await;
        addresses.iter().cloned().zip(views).collect()
    }

    /// Card projection: name, description, goal, balance and progress.
    pub async fn read_card(&self, address: &Address) -> CampaignCard {
        let gw = &self.gateway;
        let (name, description, goal, balance) = tokio::join!(
            self.field(address, "name", gw.name(address)),
            self.field(address, "description", gw.description(address)),
            self.field(address, "goal", gw.goal(address)),
            self.field(address, "balance", gw.balance(address)),
        );
        let progress = derive_progress(&balance, &goal);
        CampaignCard {
            address: address.clone(),
            name,
            description,
            goal,
            balance,
            progress,
        }
    }

    /// Cached view, `Pending` if never read.
    pub async fn snapshot(&self, address: &Address) -> Snapshot<CampaignView> {
        self.cache.campaign(address).await
    }

    /// Drop the cached view; any in-flight read for it is discarded on arrival.
    pub async fn forget(&self, address: &Address) {
        self.cache.evict_campaign(address).await;
    }
}
