// backend/campaign-view/src/testutils.rs
//
// In-memory factory + campaign contracts implementing `LedgerGateway`.
//
// Writes are queued on `submit` and executed on `confirmation`, so a test can
// observe the submitted state before anything changes. Contract rules:
//   - deploy:      owner = caller, deadline = now + days * 86400, state 0
//   - addTier:     owner only, amount > 0, appended at the end
//   - removeTier:  owner only, index in range, later tiers shift down
//   - fund:        state 0, index in range, value == tier amount;
//                  balance += value, backers += 1
//
// Reads and confirmations can be made to fail or hang per campaign/field.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::GatewayError;
use crate::gateway::{LedgerGateway, Receipt, TxId, WriteCall};
use crate::types::{Address, Amount, CampaignSummary, Tier};

pub const SECONDS_PER_DAY: u64 = 86_400;

#[derive(Clone, Debug)]
struct CampaignRecord {
    owner: Address,
    name: String,
    description: String,
    goal: Amount,
    deadline: u64,
    balance: Amount,
    state: u8,
    creation_time: u64,
    tiers: Vec<Tier>,
}

/// How an injected fault behaves.
#[derive(Clone, Debug)]
pub enum Fault {
    Fail(GatewayError),
    /// Never resolve; the caller's timeout decides.
    Hang,
}

#[derive(Default)]
struct LedgerState {
    now: u64,
    next_campaign: u64,
    next_tx: u64,
    campaigns: BTreeMap<Address, CampaignRecord>,
    deployment_order: Vec<Address>,
    queued: HashMap<TxId, (Address, WriteCall)>,
    read_faults: HashMap<(Address, &'static str), Fault>,
    submit_fault: Option<GatewayError>,
    stall_confirmations: bool,
    confirmed: HashSet<TxId>,
    submissions: usize,
}

/// Ledger double for tests and local demos.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new(now: u64) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                now,
                ..LedgerState::default()
            }),
        }
    }

    /// Register a campaign directly, bypassing the factory transaction.
    pub async fn seed_campaign(
        &self,
        owner: &Address,
        name: &str,
        goal: Amount,
        deadline: u64,
    ) -> Address {
        let mut state = self.state.lock().await;
        let now = state.now;
        state.deploy(owner, name, "", goal, deadline, now)
    }

    pub async fn seed_tier(&self, campaign: &Address, name: &str, amount: Amount) {
        if let Some(record) = self.state.lock().await.campaigns.get_mut(campaign) {
            record.tiers.push(Tier {
                name: name.to_string(),
                amount,
                backers: 0,
            });
        }
    }

    pub async fn set_balance(&self, campaign: &Address, balance: Amount) {
        if let Some(record) = self.state.lock().await.campaigns.get_mut(campaign) {
            record.balance = balance;
        }
    }

    pub async fn set_state(&self, campaign: &Address, code: u8) {
        if let Some(record) = self.state.lock().await.campaigns.get_mut(campaign) {
            record.state = code;
        }
    }

    /// Make reads of `field` (e.g. `"tiers"`, `"name"`) on `campaign` misbehave.
    pub async fn inject_read_fault(&self, campaign: &Address, field: &'static str, fault: Fault) {
        self.state
            .lock()
            .await
            .read_faults
            .insert((campaign.clone(), field), fault);
    }

    pub async fn reject_submissions(&self, error: Option<GatewayError>) {
        self.state.lock().await.submit_fault = error;
    }

    pub async fn stall_confirmations(&self, stall: bool) {
        self.state.lock().await.stall_confirmations = stall;
    }

    /// Number of transactions that reached `submit` successfully.
    pub async fn submissions(&self) -> usize {
        self.state.lock().await.submissions
    }

    /// Execute every queued transaction, as the ledger would after the
    /// caller stopped waiting.
    pub async fn settle_all(&self) {
        let mut state = self.state.lock().await;
        let queued: Vec<TxId> = state.queued.keys().cloned().collect();
        for tx in queued {
            let _ = state.execute(&tx);
        }
    }

    pub async fn tier(&self, campaign: &Address, index: usize) -> Option<Tier> {
        self.state
            .lock()
            .await
            .campaigns
            .get(campaign)
            .and_then(|r| r.tiers.get(index).cloned())
    }

    async fn check_fault(&self, campaign: &Address, field: &'static str) -> Result<(), GatewayError> {
        let fault = self
            .state
            .lock()
            .await
            .read_faults
            .get(&(campaign.clone(), field))
            .cloned();
        match fault {
            None => Ok(()),
            Some(Fault::Fail(err)) => Err(err),
            Some(Fault::Hang) => std::future::pending().await,
        }
    }

    async fn read<T>(
        &self,
        campaign: &Address,
        field: &'static str,
        f: impl FnOnce(&CampaignRecord) -> T,
    ) -> Result<T, GatewayError> {
        self.check_fault(campaign, field).await?;
        let state = self.state.lock().await;
        state
            .campaigns
            .get(campaign)
            .map(f)
            .ok_or(GatewayError::NotFound)
    }
}

impl LedgerState {
    fn deploy(
        &mut self,
        owner: &Address,
        name: &str,
        description: &str,
        goal: Amount,
        deadline: u64,
        creation_time: u64,
    ) -> Address {
        self.next_campaign += 1;
        let address = Address::new(format!("0xcampaign{:04}", self.next_campaign));
        self.campaigns.insert(
            address.clone(),
            CampaignRecord {
                owner: owner.clone(),
                name: name.to_string(),
                description: description.to_string(),
                goal,
                deadline,
                balance: 0,
                state: 0,
                creation_time,
                tiers: Vec::new(),
            },
        );
        self.deployment_order.push(address.clone());
        address
    }

    fn summaries(&self, owner: Option<&Address>) -> Vec<CampaignSummary> {
        self.deployment_order
            .iter()
            .filter_map(|address| self.campaigns.get(address).map(|r| (address, r)))
            .filter(|(_, r)| owner.map_or(true, |o| &r.owner == o))
            .map(|(address, r)| CampaignSummary {
                address: address.clone(),
                owner: r.owner.clone(),
                name: r.name.clone(),
                creation_time: r.creation_time,
            })
            .collect()
    }

    fn owned_campaign(
        &mut self,
        caller: &Address,
        campaign: &Address,
    ) -> Result<&mut CampaignRecord, GatewayError> {
        let record = self
            .campaigns
            .get_mut(campaign)
            .ok_or(GatewayError::NotFound)?;
        if &record.owner != caller {
            return Err(GatewayError::Unauthorized("caller is not the owner".into()));
        }
        Ok(record)
    }

    fn execute(&mut self, tx: &TxId) -> Result<Receipt, GatewayError> {
        let (caller, call) = self
            .queued
            .remove(tx)
            .ok_or_else(|| GatewayError::Unavailable(format!("unknown transaction {tx}")))?;
        let mut deployed = None;

        match call {
            WriteCall::DeployCampaign {
                name,
                description,
                goal,
                duration_days,
                ..
            } => {
                let now = self.now;
                let deadline = now.saturating_add(duration_days.saturating_mul(SECONDS_PER_DAY));
                deployed = Some(self.deploy(&caller, &name, &description, goal, deadline, now));
            }
            WriteCall::AddTier {
                campaign,
                name,
                amount,
            } => {
                let record = self.owned_campaign(&caller, &campaign)?;
                if amount == 0 {
                    return Err(GatewayError::Reverted("amount must be greater than 0".into()));
                }
                record.tiers.push(Tier {
                    name,
                    amount,
                    backers: 0,
                });
            }
            WriteCall::RemoveTier { campaign, index } => {
                let record = self.owned_campaign(&caller, &campaign)?;
                if index >= record.tiers.len() {
                    return Err(GatewayError::Reverted("tier does not exist".into()));
                }
                record.tiers.remove(index);
            }
            WriteCall::Fund {
                campaign,
                tier_index,
                value,
            } => {
                let record = self
                    .campaigns
                    .get_mut(&campaign)
                    .ok_or(GatewayError::NotFound)?;
                if record.state != 0 {
                    return Err(GatewayError::Reverted("campaign is not active".into()));
                }
                let tier = record
                    .tiers
                    .get_mut(tier_index)
                    .ok_or_else(|| GatewayError::Reverted("invalid tier".into()))?;
                if value != tier.amount {
                    return Err(GatewayError::Reverted("incorrect amount".into()));
                }
                tier.backers += 1;
                record.balance += value;
            }
        }

        self.confirmed.insert(tx.clone());
        Ok(Receipt {
            tx: tx.clone(),
            deployed,
        })
    }
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn name(&self, campaign: &Address) -> Result<String, GatewayError> {
        self.read(campaign, "name", |r| r.name.clone()).await
    }

    async fn description(&self, campaign: &Address) -> Result<String, GatewayError> {
        self.read(campaign, "description", |r| r.description.clone())
            .await
    }

    async fn deadline(&self, campaign: &Address) -> Result<u64, GatewayError> {
        self.read(campaign, "deadline", |r| r.deadline).await
    }

    async fn goal(&self, campaign: &Address) -> Result<Amount, GatewayError> {
        self.read(campaign, "goal", |r| r.goal).await
    }

    async fn balance(&self, campaign: &Address) -> Result<Amount, GatewayError> {
        self.read(campaign, "balance", |r| r.balance).await
    }

    async fn tiers(&self, campaign: &Address) -> Result<Vec<Tier>, GatewayError> {
        self.read(campaign, "tiers", |r| r.tiers.clone()).await
    }

    async fn owner(&self, campaign: &Address) -> Result<Address, GatewayError> {
        self.read(campaign, "owner", |r| r.owner.clone()).await
    }

    async fn state(&self, campaign: &Address) -> Result<u8, GatewayError> {
        self.read(campaign, "state", |r| r.state).await
    }

    async fn all_campaigns(&self, factory: &Address) -> Result<Vec<CampaignSummary>, GatewayError> {
        self.check_fault(factory, "getAllCampaigns").await?;
        Ok(self.state.lock().await.summaries(None))
    }

    async fn user_campaigns(
        &self,
        factory: &Address,
        owner: &Address,
    ) -> Result<Vec<CampaignSummary>, GatewayError> {
        self.check_fault(factory, "getUserCampaigns").await?;
        Ok(self.state.lock().await.summaries(Some(owner)))
    }

    async fn submit(&self, caller: &Address, call: WriteCall) -> Result<TxId, GatewayError> {
        let mut state = self.state.lock().await;
        if let Some(err) = state.submit_fault.clone() {
            return Err(err);
        }
        state.next_tx += 1;
        let tx = TxId(format!("0xtx{:06}", state.next_tx));
        state.queued.insert(tx.clone(), (caller.clone(), call));
        state.submissions += 1;
        Ok(tx)
    }

    async fn confirmation(&self, tx: &TxId) -> Result<Receipt, GatewayError> {
        let stalled = self.state.lock().await.stall_confirmations;
        if stalled {
            return std::future::pending().await;
        }
        let mut state = self.state.lock().await;
        if state.confirmed.contains(tx) {
            return Ok(Receipt {
                tx: tx.clone(),
                deployed: None,
            });
        }
        state.execute(tx)
    }
}
