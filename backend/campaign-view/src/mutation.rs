// backend/campaign-view/src/mutation.rs
//
// Campaign Mutation Service.
//
// Every mutation runs: local validation -> submit -> await confirmation ->
// invalidate. Validation failures never reach the ledger. Ownership is
// never checked here; the ledger's rejection comes back as
// `MutationError::Authorization`. Nothing is retried and nothing is applied
// optimistically: on confirmation the affected views are invalidated and the
// next read picks up the ledger's numbers.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::cache::ViewCache;
use crate::config::ViewConfig;
use crate::error::{MutationError, ValidationFailure};
use crate::events::{self, MutationEvent};
use crate::gateway::{LedgerGateway, Receipt, TxId, WriteCall};
use crate::tiers::{TierLedger, TierSelection};
use crate::types::{Address, Amount};

pub const MIN_GOAL: Amount = 1;
pub const MIN_DURATION_DAYS: u64 = 1;

/// Raw form input for a new campaign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCampaign {
    pub name: String,
    pub description: String,
    /// Signed so that negative form input can be clamped. Goals above
    /// `i128::MAX` cannot be requested through this form.
    pub goal: i128,
    pub duration_days: i64,
}

/// Clamp a goal input to at least [`MIN_GOAL`].
pub fn coerce_goal(goal: i128) -> Amount {
    Amount::try_from(goal).unwrap_or(0).max(MIN_GOAL)
}

/// Clamp a campaign length input to at least [`MIN_DURATION_DAYS`].
pub fn coerce_duration_days(days: i64) -> u64 {
    u64::try_from(days).unwrap_or(0).max(MIN_DURATION_DAYS)
}

/// What must be refetched once a mutation confirms.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Invalidation {
    Directory,
    Campaign(Address),
}

/// Observable state of a mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MutationStatus {
    Submitted {
        tx: TxId,
    },
    Confirmed {
        receipt: Receipt,
        event: MutationEvent,
    },
    Failed {
        #[serde(serialize_with = "display")]
        error: MutationError,
    },
}

fn display<S: serde::Serializer>(err: &MutationError, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(err)
}

impl MutationStatus {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    pub fn into_result(self) -> Result<MutationEvent, MutationError> {
        match self {
            Self::Confirmed { event, .. } => Ok(event),
            Self::Failed { error } => Err(error),
            Self::Submitted { tx } => Err(MutationError::Transaction(format!(
                "transaction {tx} not confirmed"
            ))),
        }
    }
}

/// A transaction that reached the ledger.
///
/// Dropping it abandons the wait only; the ledger may still confirm the
/// transaction later.
pub struct PendingMutation {
    gateway: Arc<dyn LedgerGateway>,
    cache: Arc<ViewCache>,
    caller: Address,
    call: WriteCall,
    tx: TxId,
    invalidation: Invalidation,
    timeout: Duration,
}

impl PendingMutation {
    pub fn tx(&self) -> &TxId {
        &self.tx
    }

    pub fn status(&self) -> MutationStatus {
        MutationStatus::Submitted {
            tx: self.tx.clone(),
        }
    }

    /// Wait for the ledger. Invalidation happens only on confirmation.
    pub async fn confirmed(self) -> MutationStatus {
        let outcome = tokio::time::timeout(self.timeout, self.gateway.confirmation(&self.tx)).await;
        let receipt = match outcome {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(err)) => {
                let error = MutationError::from(err);
                tracing::warn!(tx = %self.tx, method = self.call.method(), error = %error, "transaction failed");
                return MutationStatus::Failed { error };
            }
            Err(_) => {
                tracing::warn!(tx = %self.tx, method = self.call.method(), "confirmation timed out");
                return MutationStatus::Failed {
                    error: MutationError::Transaction(format!(
                        "transaction {} not confirmed within {:?}",
                        self.tx, self.timeout
                    )),
                };
            }
        };

        match &self.invalidation {
            Invalidation::Directory => self.cache.invalidate_directory().await,
            Invalidation::Campaign(address) => self.cache.invalidate_campaign(address).await,
        }

        let event = MutationEvent::from_receipt(&self.caller, &self.call, &receipt);
        events::emit(&event);
        MutationStatus::Confirmed { receipt, event }
    }
}

pub struct MutationService {
    gateway: Arc<dyn LedgerGateway>,
    cache: Arc<ViewCache>,
    tiers: TierLedger,
    config: ViewConfig,
}

impl MutationService {
    pub fn new(gateway: Arc<dyn LedgerGateway>, cache: Arc<ViewCache>, config: ViewConfig) -> Self {
        let tiers = TierLedger::new(Arc::clone(&gateway), config.clone());
        Self {
            gateway,
            cache,
            tiers,
            config,
        }
    }

    async fn submit(
        &self,
        caller: &Address,
        call: WriteCall,
        invalidation: Invalidation,
    ) -> Result<PendingMutation, MutationError> {
        let method = call.method();
        let target = call.target().clone();
        let tx = self
            .gateway
            .submit(caller, call.clone())
            .await
            .map_err(|err| {
                let error = MutationError::from(err);
                tracing::warn!(caller = %caller, contract = %target, method, error = %error, "submission failed");
                error
            })?;
        tracing::info!(caller = %caller, contract = %target, method, tx = %tx, "transaction submitted");

        Ok(PendingMutation {
            gateway: Arc::clone(&self.gateway),
            cache: Arc::clone(&self.cache),
            caller: caller.clone(),
            call,
            tx,
            invalidation,
            timeout: self.config.confirmation_timeout,
        })
    }

    /// Deploy a campaign through the factory. Goal and length are clamped to
    /// their minimums first. The directory is invalidated on confirmation and
    /// shows the campaign on its next poll.
    pub async fn create_campaign(
        &self,
        caller: &Address,
        input: NewCampaign,
    ) -> Result<PendingMutation, MutationError> {
        let call = WriteCall::DeployCampaign {
            factory: self.config.factory.clone(),
            name: input.name,
            description: input.description,
            goal: coerce_goal(input.goal),
            duration_days: coerce_duration_days(input.duration_days),
        };
        self.submit(caller, call, Invalidation::Directory).await
    }

    /// `addTier(name, amount)`. The new tier is not appended locally.
    pub async fn add_tier(
        &self,
        caller: &Address,
        campaign: &Address,
        name: impl Into<String>,
        amount: Amount,
    ) -> Result<PendingMutation, MutationError> {
        let call = TierLedger::add_tier_call(campaign, name, amount)?;
        self.submit(caller, call, Invalidation::Campaign(campaign.clone()))
            .await
    }

    /// `removeTier(index)` for a tier the caller selected from a roster.
    pub async fn remove_tier(
        &self,
        caller: &Address,
        selection: &TierSelection,
    ) -> Result<PendingMutation, MutationError> {
        self.verify_selection(selection).await?;
        let call = WriteCall::RemoveTier {
            campaign: selection.campaign.clone(),
            index: selection.index,
        };
        self.submit(caller, call, Invalidation::Campaign(selection.campaign.clone()))
            .await
    }

    /// Pledge `amount` to the selected tier. The amount must equal the tier's
    /// current amount and the tier must still sit at the selected index.
    pub async fn pledge(
        &self,
        caller: &Address,
        selection: &TierSelection,
        amount: Amount,
    ) -> Result<PendingMutation, MutationError> {
        let expected = self.verify_selection(selection).await?;
        if amount != expected {
            return Err(ValidationFailure::PledgeAmountMismatch {
                expected,
                offered: amount,
            }
            .into());
        }
        let call = WriteCall::Fund {
            campaign: selection.campaign.clone(),
            tier_index: selection.index,
            value: expected,
        };
        self.submit(caller, call, Invalidation::Campaign(selection.campaign.clone()))
            .await
    }

    /// Re-read the roster and return the live amount of the selected tier.
    async fn verify_selection(&self, selection: &TierSelection) -> Result<Amount, MutationError> {
        let current = self
            .tiers
            .fetch_roster(&selection.campaign)
            .await
            .map_err(ValidationFailure::TierRosterUnavailable)?;
        let tier = selection.verify(&current).inspect_err(|err| {
            tracing::warn!(campaign = %selection.campaign, index = selection.index, error = %err, "stale tier selection");
        })?;
        Ok(tier.amount)
    }
}
