use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Mutex as StdMutex, MutexGuard, PoisonError};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use super::types::{Decision, DenyReason, QuotaUsage};
use crate::error::Result;
use crate::ledger::{Ledger, LedgerStore};

type InFlight = HashMap<(String, NaiveDate), u32>;

/// Owner of the ledger and single path for every mutation.
///
/// Reserve, commit and prune each run while holding the ledger lock, so
/// none of them can interleave with another.
#[derive(Debug)]
pub struct QuotaEngine {
    store: LedgerStore,
    daily_limit: u32,
    ledger: Mutex<Ledger>,
    /// Slots handed out but not yet committed. Never persisted.
    in_flight: StdMutex<InFlight>,
}

impl QuotaEngine {
    /// Build an engine around an already loaded ledger
    pub fn new(store: LedgerStore, ledger: Ledger, daily_limit: u32) -> Self {
        QuotaEngine {
            store,
            daily_limit,
            ledger: Mutex::new(ledger),
            in_flight: StdMutex::new(HashMap::new()),
        }
    }

    /// Load the ledger from `store` and build an engine around it
    pub async fn open(store: LedgerStore, daily_limit: u32) -> Result<Self> {
        let ledger = store.load().await?;
        info!(
            "Loaded {} ledger entries from {}",
            ledger.len(),
            store.path().display()
        );
        Ok(Self::new(store, ledger, daily_limit))
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, InFlight> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide whether `identity` may receive funds on `today`.
    ///
    /// Nothing is persisted. An allowed decision holds a slot so concurrent
    /// callers cannot be approved beyond the daily limit.
    pub async fn try_reserve(&self, identity: &str, today: NaiveDate) -> Decision<'_> {
        let ledger = self.ledger.lock().await;
        let mut in_flight = self.lock_in_flight();

        let key = (identity.to_string(), today);
        let pending = in_flight.get(&key).copied().unwrap_or(0);
        let used = ledger.count_on(identity, today);

        if used.saturating_add(pending) >= self.daily_limit {
            debug!(
                "Quota exhausted for {} on {} ({} used, {} in flight)",
                identity, today, used, pending
            );
            return Decision::Denied(DenyReason::QuotaExceeded);
        }

        *in_flight.entry(key).or_insert(0) += 1;
        Decision::Allowed(Reservation {
            engine: self,
            identity: identity.to_string(),
            day: today,
            settled: false,
        })
    }

    /// Record one successful disbursement for `identity` and persist.
    ///
    /// The in-memory ledger keeps the increment even if the save fails.
    pub async fn commit(&self, identity: &str, today: NaiveDate) -> Result<u32> {
        self.commit_inner(identity, today, false).await
    }

    async fn commit_inner(&self, identity: &str, today: NaiveDate, release: bool) -> Result<u32> {
        let mut ledger = self.ledger.lock().await;
        let count = ledger.record(identity, today);

        if release {
            Self::release_slot(&mut self.lock_in_flight(), identity, today);
        }

        if let Err(e) = self.store.save(&ledger).await {
            error!("Failed to persist usage for {}: {}", identity, e);
            return Err(e);
        }

        debug!("Committed request {} of {} for {}", count, self.daily_limit, identity);
        Ok(count)
    }

    fn release_slot(in_flight: &mut InFlight, identity: &str, day: NaiveDate) {
        let key = (identity.to_string(), day);
        if let Some(pending) = in_flight.get_mut(&key) {
            *pending = pending.saturating_sub(1);
            if *pending == 0 {
                in_flight.remove(&key);
            }
        }
    }

    /// Committed usage of `identity` on `today`
    pub async fn usage(&self, identity: &str, today: NaiveDate) -> QuotaUsage {
        let used = self.ledger.lock().await.count_on(identity, today);
        QuotaUsage {
            identity: identity.to_string(),
            day: today,
            used,
            remaining: self.daily_limit.saturating_sub(used),
            limit: self.daily_limit,
        }
    }

    /// Remove entries not dated `today` and persist the result
    pub async fn prune(&self, today: NaiveDate) -> Result<usize> {
        let mut ledger = self.ledger.lock().await;
        let removed = ledger.prune(today);
        self.store.save(&ledger).await?;
        Ok(removed)
    }

    /// Copy of the current ledger
    pub async fn snapshot(&self) -> Ledger {
        self.ledger.lock().await.clone()
    }

    /// Slots currently held by uncommitted reservations
    pub fn in_flight(&self) -> u32 {
        self.lock_in_flight().values().sum()
    }
}

/// A held quota slot.
///
/// Commit it after a successful disbursement. Dropping it uncommitted gives
/// the slot back.
#[derive(Debug)]
pub struct Reservation<'a> {
    engine: &'a QuotaEngine,
    identity: String,
    day: NaiveDate,
    settled: bool,
}

impl Reservation<'_> {
    /// Record the usage this reservation was held for
    pub async fn commit(mut self) -> Result<u32> {
        self.settled = true;
        self.engine
            .commit_inner(&self.identity, self.day, true)
            .await
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.settled {
            QuotaEngine::release_slot(
                &mut self.engine.lock_in_flight(),
                &self.identity,
                self.day,
            );
        }
    }
}
