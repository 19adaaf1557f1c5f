//! Per-role statement cache with randomized expiry.
//!
//! Every role gets its own slot. A slot carries two locks: the entry lock,
//! only ever held for a read or a swap, and the fetch lock, held while the
//! role is loaded from the store. Concurrent misses for the same role queue
//! on the fetch lock and share a single load. Nothing that walks the cache
//! (`len`, `purge_expired`) ever waits on a fetch lock, so a slow role never
//! holds up hits, misses or maintenance for other roles.
//!
//! Slots for roles nobody asks about any more are dropped by a sweep that
//! runs at most once per minimum TTL, piggybacked on `get`.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{
    Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError,
};
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::error::{PolicyError, StoreError};
use crate::metrics::{CacheLoadStats, MetricsSink, noop_sink};
use crate::pattern::MatchOptions;
use crate::store::StatementStore;
use crate::types::RolePolicy;

/// Source of the current time for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time via [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CachedPolicy {
    policy: Arc<RolePolicy>,
    expires_at: Instant,
}

#[derive(Default)]
struct Slot {
    entry: RwLock<Option<CachedPolicy>>,
    fetch: Mutex<()>,
}

// The entry is only ever replaced whole, after a successful load, so a panic
// in the store cannot leave it half-written and poison is safe to ignore.
impl Slot {
    fn read(&self) -> RwLockReadGuard<'_, Option<CachedPolicy>> {
        self.entry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<CachedPolicy>> {
        self.entry.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn live(&self, now: Instant) -> Option<Arc<RolePolicy>> {
        self.read()
            .as_ref()
            .filter(|cached| cached.expires_at > now)
            .map(|cached| Arc::clone(&cached.policy))
    }

    /// Like `live`, but never waits: a slot whose entry is being swapped
    /// counts as live.
    fn is_live_now(&self, now: Instant) -> bool {
        let check = |entry: &Option<CachedPolicy>| {
            entry.as_ref().is_some_and(|cached| cached.expires_at > now)
        };
        match self.entry.try_read() {
            Ok(entry) => check(&entry),
            Err(TryLockError::Poisoned(poisoned)) => check(&poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => true,
        }
    }
}

pub struct StatementCache {
    store: Arc<dyn StatementStore>,
    slots: RwLock<HashMap<String, Arc<Slot>>>,
    config: CacheConfig,
    options: MatchOptions,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsSink>,
    // Sweep schedule, in milliseconds since `epoch` on `clock`.
    epoch: Instant,
    next_sweep_ms: AtomicU64,
}

impl Debug for StatementCache {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("StatementCache")
            .field("config", &self.config)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl StatementCache {
    pub fn new(
        store: Arc<dyn StatementStore>,
        config: CacheConfig,
        options: MatchOptions,
    ) -> Result<Self, PolicyError> {
        config.validate()?;
        Ok(StatementCache {
            store,
            slots: RwLock::new(HashMap::new()),
            next_sweep_ms: AtomicU64::new(duration_ms(config.ttl_min())),
            config,
            options,
            clock: Arc::new(SystemClock),
            metrics: noop_sink(),
            epoch: Instant::now(),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.epoch = clock.now();
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get the compiled policy for `role`, loading it from the store on a
    /// miss or after expiry.
    ///
    /// A role without statements, or with a malformed payload, yields an
    /// empty policy. Only an unavailable store is an error, and it is never
    /// cached: the next caller retries.
    pub fn get(&self, role: &str) -> Result<Arc<RolePolicy>, PolicyError> {
        self.sweep_if_due()?;

        let slot = self.slot(role)?;
        if let Some(policy) = slot.live(self.clock.now()) {
            self.metrics.on_cache_hit(role);
            return Ok(policy);
        }

        let _fetching = slot.fetch.lock().unwrap_or_else(PoisonError::into_inner);
        // Whoever held the fetch lock before us may have loaded it already.
        if let Some(policy) = slot.live(self.clock.now()) {
            self.metrics.on_cache_hit(role);
            return Ok(policy);
        }
        debug!(event = "Cache", phase = "Miss", role = role);

        let (policy, ttl) = self.load(role)?;
        *slot.write() = Some(CachedPolicy {
            policy: Arc::clone(&policy),
            expires_at: self.clock.now() + ttl,
        });
        Ok(policy)
    }

    /// Drop the cached entry for `role`; the next `get` reloads it.
    ///
    /// A fetch already in flight for `role` still answers its own callers,
    /// but its result is not kept.
    pub fn invalidate(&self, role: &str) -> Result<(), PolicyError> {
        self.slots.write()?.remove(role);
        debug!(event = "Cache", phase = "Invalidate", role = role);
        Ok(())
    }

    pub fn clear(&self) -> Result<(), PolicyError> {
        self.slots.write()?.clear();
        debug!(event = "Cache", phase = "Clear");
        Ok(())
    }

    /// Number of roles with a live (unexpired) entry.
    pub fn len(&self) -> Result<usize, PolicyError> {
        let now = self.clock.now();
        let slots: Vec<Arc<Slot>> = self.slots.read()?.values().cloned().collect();
        Ok(slots.iter().filter(|slot| slot.live(now).is_some()).count())
    }

    pub fn is_empty(&self) -> Result<bool, PolicyError> {
        Ok(self.len()? == 0)
    }

    /// Drop every slot that holds no live entry and that no caller is
    /// using, returning how many were dropped.
    ///
    /// `get` runs this on its own at most once per minimum TTL.
    pub fn purge_expired(&self) -> Result<usize, PolicyError> {
        let now = self.clock.now();
        let mut slots = self.slots.write()?;
        let before = slots.len();
        // With the map write-locked, a count of one means no caller holds
        // the slot, so nobody is fetching into it.
        slots.retain(|_, slot| Arc::strong_count(slot) > 1 || slot.is_live_now(now));
        let removed = before - slots.len();
        debug!(
            event = "Cache",
            phase = "Sweep",
            removed = removed,
            remaining = slots.len()
        );
        Ok(removed)
    }

    fn sweep_if_due(&self) -> Result<(), PolicyError> {
        let elapsed = duration_ms(self.clock.now().saturating_duration_since(self.epoch));
        let due = self.next_sweep_ms.load(Ordering::Acquire);
        if elapsed < due {
            return Ok(());
        }
        let next = elapsed.saturating_add(duration_ms(self.config.ttl_min()));
        // Only the caller that wins the exchange sweeps.
        if self
            .next_sweep_ms
            .compare_exchange(due, next, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.purge_expired()?;
        }
        Ok(())
    }

    fn slot(&self, role: &str) -> Result<Arc<Slot>, PolicyError> {
        if let Some(slot) = self.slots.read()?.get(role) {
            return Ok(Arc::clone(slot));
        }
        let mut slots = self.slots.write()?;
        Ok(Arc::clone(slots.entry(role.to_string()).or_default()))
    }

    fn ttl(&self) -> Duration {
        rand::thread_rng().gen_range(self.config.ttl_min()..self.config.ttl_max())
    }


    fn load(&self, role: &str) -> Result<(Arc<RolePolicy>, Duration), PolicyError> {
        let start = Instant::now();

        let (policy, malformed) = match self.store.lookup(role) {
            Ok(statements) => match RolePolicy::compile(role, &statements, self.options) {
                Ok(policy) => (policy, false),
                Err(e) => {
                    warn!(
                        event = "Cache",
                        phase = "Compile",
                        role = role,
                        error = %e,
                        "role has malformed statements, treating it as empty"
                    );
                    (RolePolicy::empty(role), true)
                }
            },
            Err(StoreError::Malformed(reason)) => {
                warn!(
                    event = "Cache",
                    phase = "Fetch",
                    role = role,
                    error = reason.as_str(),
                    "role has malformed statements, treating it as empty"
                );
                (RolePolicy::empty(role), true)
            }
            Err(StoreError::Unavailable(reason)) => {
                error!(
                    event = "Cache",
                    phase = "Fetch",
                    role = role,
                    error = reason.as_str(),
                    "statement store unavailable"
                );
                return Err(PolicyError::StoreUnavailable {
                    role: role.to_string(),
                    reason,
                });
            }
        };

        let ttl = self.ttl();
        info!(
            event = "Cache",
            phase = "Load",
            role = role,
            statements = policy.len(),
            malformed = malformed,
            ttl_secs = ttl.as_secs_f64()
        );
        self.metrics.on_cache_load(&CacheLoadStats {
            role: role.to_string(),
            statements: policy.len(),
            malformed,
            duration: start.elapsed(),
            ttl,
        });

        Ok((Arc::new(policy), ttl))
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
