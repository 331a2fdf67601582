//! Campaign Directory: the factory's campaign index, globally and per owner.
//!
//! The directory is polled, never pushed to. A listing that has not loaded
//! is `Snapshot::Pending`; a loaded one is `Listing::Empty` or
//! `Listing::Populated`.

use std::sync::Arc;

use crate::cache::{DirectoryKey, Snapshot, ViewCache};
use crate::config::ViewConfig;
use crate::field::Listing;
use crate::gateway::{bounded_read, LedgerGateway};
use crate::types::{Address, CampaignSummary};

pub struct CampaignDirectory {
    gateway: Arc<dyn LedgerGateway>,
    cache: Arc<ViewCache>,
    config: ViewConfig,
}

impl CampaignDirectory {
    pub fn new(gateway: Arc<dyn LedgerGateway>, cache: Arc<ViewCache>, config: ViewConfig) -> Self {
        Self {
            gateway,
            cache,
            config,
        }
    }

    /// `getAllCampaigns()` on the configured factory.
    pub async fn list_all(&self) -> Listing<CampaignSummary> {
        self.load(DirectoryKey::All).await
    }

    /// `getUserCampaigns(owner)` on the configured factory.
    pub async fn list_by_owner(&self, owner: &Address) -> Listing<CampaignSummary> {
        self.load(DirectoryKey::Owner(owner.clone())).await
    }

    pub async fn cached_all(&self) -> Snapshot<Listing<CampaignSummary>> {
        self.cache.listing(&DirectoryKey::All).await
    }

    pub async fn cached_by_owner(&self, owner: &Address) -> Snapshot<Listing<CampaignSummary>> {
        self.cache.listing(&DirectoryKey::Owner(owner.clone())).await
    }

    async fn load(&self, key: DirectoryKey) -> Listing<CampaignSummary> {
        let ticket = self.cache.directory.begin(&key).await;
        let factory = &self.config.factory;
        let read = match &key {
            DirectoryKey::All => self.gateway.all_campaigns(factory),
            DirectoryKey::Owner(owner) => self.gateway.user_campaigns(factory, owner),
        };

        let listing: Listing<CampaignSummary> =
            match bounded_read(self.config.read_timeout, read).await {
                Ok(items) => Listing::from_items(items),
                Err(err) => {
                    tracing::warn!(factory = %factory, listing = ?key, error = %err, "directory read failed");
                    Listing::Failed(err)
                }
            };

        let view = Arc::new(listing.clone());
        if !self.cache.directory.commit(&key, ticket, view).await {
            tracing::debug!(listing = ?key, "discarding superseded directory read");
        }
        listing
    }
}
