//! Ledger gateway seam.
//!
//! The ledger runtime, signing and submission live outside this crate. The
//! core only sees typed read calls against a factory or campaign contract and
//! write calls that are submitted, then confirmed.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{GatewayError, ReadFailure};
use crate::types::{Address, Amount, CampaignSummary, Tier};

/// Identifier of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TxId(pub String);

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Write calls the core issues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteCall {
    /// Factory deployment of a new campaign contract.
    DeployCampaign {
        factory: Address,
        name: String,
        description: String,
        goal: Amount,
        duration_days: u64,
    },
    /// `addTier(name, amount)`
    AddTier {
        campaign: Address,
        name: String,
        amount: Amount,
    },
    /// `removeTier(index)`
    RemoveTier { campaign: Address, index: usize },
    /// `fund(tierIndex)` carrying `value`.
    Fund {
        campaign: Address,
        tier_index: usize,
        value: Amount,
    },
}

impl WriteCall {
    /// Contract the call targets.
    pub fn target(&self) -> &Address {
        match self {
            Self::DeployCampaign { factory, .. } => factory,
            Self::AddTier { campaign, .. }
            | Self::RemoveTier { campaign, .. }
            | Self::Fund { campaign, .. } => campaign,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::DeployCampaign { .. } => "deploy",
            Self::AddTier { .. } => "addTier",
            Self::RemoveTier { .. } => "removeTier",
            Self::Fund { .. } => "fund",
        }
    }
}

/// Confirmation of a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub tx: TxId,
    /// Address of the contract created by a deployment, if any.
    pub deployed: Option<Address>,
}

/// Read/write access to the factory and campaign contracts.
///
/// Implementations must not retry writes on their own.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    // Campaign contract reads

    async fn name(&self, campaign: &Address) -> Result<String, GatewayError>;
    async fn description(&self, campaign: &Address) -> Result<String, GatewayError>;
    async fn deadline(&self, campaign: &Address) -> Result<u64, GatewayError>;
    async fn goal(&self, campaign: &Address) -> Result<Amount, GatewayError>;
    /// `getContractBalance()`
    async fn balance(&self, campaign: &Address) -> Result<Amount, GatewayError>;
    /// `getTiers()`, in ledger order.
    async fn tiers(&self, campaign: &Address) -> Result<Vec<Tier>, GatewayError>;
    async fn owner(&self, campaign: &Address) -> Result<Address, GatewayError>;
    /// `state()` raw lifecycle code.
    async fn state(&self, campaign: &Address) -> Result<u8, GatewayError>;

    // Factory reads

    /// `getAllCampaigns()`
    async fn all_campaigns(&self, factory: &Address) -> Result<Vec<CampaignSummary>, GatewayError>;
    /// `getUserCampaigns(owner)`
    async fn user_campaigns(
        &self,
        factory: &Address,
        owner: &Address,
    ) -> Result<Vec<CampaignSummary>, GatewayError>;

    // Writes

    /// Sign and submit `call` on behalf of `caller`.
    async fn submit(&self, caller: &Address, call: WriteCall) -> Result<TxId, GatewayError>;

    /// Wait until `tx` is final on the ledger.
    async fn confirmation(&self, tx: &TxId) -> Result<Receipt, GatewayError>;
}

/// Run one read under `timeout`, mapping gateway errors to [`ReadFailure`].
pub(crate) async fn bounded_read<T>(
    timeout: Duration,
    read: impl Future<Output = Result<T, GatewayError>>,
) -> Result<T, ReadFailure> {
    match tokio::time::timeout(timeout, read).await {
        Ok(result) => result.map_err(ReadFailure::from),
        Err(_) => Err(ReadFailure::Timeout),
    }
}
