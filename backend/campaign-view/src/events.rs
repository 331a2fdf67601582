// backend/campaign-view/src/events.rs
//
// Events for confirmed mutations. Each is logged once on confirmation and
// handed back to the caller inside the confirmed status.

use serde::Serialize;

use crate::gateway::{Receipt, TxId, WriteCall};
use crate::types::{Address, Amount};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CampaignDeployed {
    pub tx: TxId,
    pub factory: Address,
    pub owner: Address,
    /// Present when the gateway reports the deployed address.
    pub campaign: Option<Address>,
    pub name: String,
    pub goal: Amount,
    pub duration_days: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TierAdded {
    pub tx: TxId,
    pub campaign: Address,
    pub name: String,
    pub amount: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TierRemoved {
    pub tx: TxId,
    pub campaign: Address,
    pub index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PledgeConfirmed {
    pub tx: TxId,
    pub campaign: Address,
    pub backer: Address,
    pub tier_index: usize,
    pub amount: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MutationEvent {
    CampaignDeployed(CampaignDeployed),
    TierAdded(TierAdded),
    TierRemoved(TierRemoved),
    PledgeConfirmed(PledgeConfirmed),
}

impl MutationEvent {
    pub fn from_receipt(caller: &Address, call: &WriteCall, receipt: &Receipt) -> Self {
        let tx = receipt.tx.clone();
        match call {
            WriteCall::DeployCampaign {
                factory,
                name,
                goal,
                duration_days,
                ..
            } => Self::CampaignDeployed(CampaignDeployed {
                tx,
                factory: factory.clone(),
                owner: caller.clone(),
                campaign: receipt.deployed.clone(),
                name: name.clone(),
                goal: *goal,
                duration_days: *duration_days,
            }),
            WriteCall::AddTier {
                campaign,
                name,
                amount,
            } => Self::TierAdded(TierAdded {
                tx,
                campaign: campaign.clone(),
                name: name.clone(),
                amount: *amount,
            }),
            WriteCall::RemoveTier { campaign, index } => Self::TierRemoved(TierRemoved {
                tx,
                campaign: campaign.clone(),
                index: *index,
            }),
            WriteCall::Fund {
                campaign,
                tier_index,
                value,
            } => Self::PledgeConfirmed(PledgeConfirmed {
                tx,
                campaign: campaign.clone(),
                backer: caller.clone(),
                tier_index: *tier_index,
                amount: *value,
            }),
        }
    }
}

pub fn emit(event: &MutationEvent) {
    match event {
        MutationEvent::CampaignDeployed(e) => tracing::info!(
            tx = %e.tx,
            factory = %e.factory,
            owner = %e.owner,
            campaign = ?e.campaign,
            goal = %e.goal,
            duration_days = e.duration_days,
            "campaign deployed"
        ),
        MutationEvent::TierAdded(e) => tracing::info!(
            tx = %e.tx,
            campaign = %e.campaign,
            name = %e.name,
            amount = %e.amount,
            "tier added"
        ),
        MutationEvent::TierRemoved(e) => tracing::info!(
            tx = %e.tx,
            campaign = %e.campaign,
            index = e.index,
            "tier removed"
        ),
        MutationEvent::PledgeConfirmed(e) => tracing::info!(
            tx = %e.tx,
            campaign = %e.campaign,
            backer = %e.backer,
            tier_index = e.tier_index,
            amount = %e.amount,
            "pledge confirmed"
        ),
    }
}
