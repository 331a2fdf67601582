// backend/campaign-view/src/cache.rs
//
// View cache shared by the reader, the directory and the mutation service.
//
// Each slot carries a generation drawn from one counter per cache, so a
// ticket can never match a slot that was evicted and recreated:
//   - `begin`       bumps the generation and hands the fetch a ticket
//   - `commit`      installs a result only if its ticket is still current
//   - `invalidate`  bumps the generation and marks the last view stale
//
// A read that is superseded (by a newer read or by an invalidation) is
// dropped on commit without touching the slot. Views are replaced whole,
// never patched.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::field::Listing;
use crate::reader::CampaignView;
use crate::types::{Address, CampaignSummary};

/// What a caller sees for a cached resource.
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "view", rename_all = "snake_case")]
pub enum Snapshot<T> {
    /// Never loaded.
    Pending,
    /// Loaded and not invalidated since.
    Fresh(Arc<T>),
    /// Loaded, then invalidated by a confirmed mutation; a refetch is due.
    Stale(Arc<T>),
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Pending => Self::Pending,
            Self::Fresh(v) => Self::Fresh(Arc::clone(v)),
            Self::Stale(v) => Self::Stale(Arc::clone(v)),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn view(&self) -> Option<&Arc<T>> {
        match self {
            Self::Pending => None,
            Self::Fresh(v) | Self::Stale(v) => Some(v),
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

/// Proof that a fetch was started at a given generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

struct Slot<T> {
    generation: u64,
    view: Option<Arc<T>>,
    stale: bool,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            generation: 0,
            view: None,
            stale: false,
        }
    }
}

/// Generation-guarded slots keyed by `K`.
pub struct Slots<K, T> {
    inner: RwLock<HashMap<K, Slot<T>>>,
    generations: AtomicU64,
}

impl<K, T> Default for Slots<K, T> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }
}

impl<K: Eq + Hash + Clone, T> Slots<K, T> {
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub async fn snapshot(&self, key: &K) -> Snapshot<T> {
        let slots = self.inner.read().await;
        match slots.get(key) {
            Some(Slot {
                view: Some(view),
                stale,
                ..
            }) => {
                if *stale {
                    Snapshot::Stale(Arc::clone(view))
                } else {
                    Snapshot::Fresh(Arc::clone(view))
                }
            }
            _ => Snapshot::Pending,
        }
    }

    pub async fn begin(&self, key: &K) -> Ticket {
        let mut slots = self.inner.write().await;
        let generation = self.next_generation();
        slots.entry(key.clone()).or_default().generation = generation;
        Ticket(generation)
    }

    /// Install `view` if `ticket` is still current. Returns whether it was.
    pub async fn commit(&self, key: &K, ticket: Ticket, view: Arc<T>) -> bool {
        let mut slots = self.inner.write().await;
        match slots.get_mut(key) {
            Some(slot) if slot.generation == ticket.0 => {
                slot.view = Some(view);
                slot.stale = false;
                true
            }
            _ => false,
        }
    }

    /// No-op for a key that was never read or has been evicted.
    pub async fn invalidate(&self, key: &K) {
        let mut slots = self.inner.write().await;
        if let Some(slot) = slots.get_mut(key) {
            slot.generation = self.next_generation();
            slot.stale = slot.view.is_some();
        }
    }

    pub async fn invalidate_all(&self) {
        let mut slots = self.inner.write().await;
        for slot in slots.values_mut() {
            slot.generation = self.next_generation();
            slot.stale = slot.view.is_some();
        }
    }

    /// Forget a resource entirely, e.g. when the user navigates away.
    pub async fn evict(&self, key: &K) {
        self.inner.write().await.remove(key);
    }
}

/// Which factory listing a directory entry caches.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DirectoryKey {
    All,
    Owner(Address),
}

/// Cache of campaign views and directory listings.
#[derive(Default)]
pub struct ViewCache {
    pub(crate) campaigns: Slots<Address, CampaignView>,
    pub(crate) directory: Slots<DirectoryKey, Listing<CampaignSummary>>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn campaign(&self, address: &Address) -> Snapshot<CampaignView> {
        self.campaigns.snapshot(address).await
    }

    pub async fn listing(&self, key: &DirectoryKey) -> Snapshot<Listing<CampaignSummary>> {
        self.directory.snapshot(key).await
    }

    pub async fn invalidate_campaign(&self, address: &Address) {
        tracing::debug!(campaign = %address, "invalidating campaign view");
        self.campaigns.invalidate(address).await;
    }

    pub async fn invalidate_directory(&self) {
        tracing::debug!("invalidating directory listings");
        self.directory.invalidate_all().await;
    }

    pub async fn evict_campaign(&self, address: &Address) {
        self.campaigns.evict(address).await;
    }
}
