//! Vendor-agnostic metrics collection via a pluggable sink.
//!
//! The engine reports every enforcement and every cache load to a
//! [`MetricsSink`]. Nothing here depends on a metrics backend; implement the
//! trait to forward to Prometheus, OpenTelemetry or whatever you run.
//!
//! ```ignore
//! use rolegate_core::metrics::{MetricsSink, EnforceStats};
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct Counter(AtomicU64);
//!
//! impl MetricsSink for Counter {
//!     fn on_enforce(&self, _stats: &EnforceStats) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//! ```
//!
//! Sinks are installed per engine through
//! `EnforcementEngineBuilder::metrics_sink`. Without one, a no-op sink is used.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// How an enforcement call ended.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub enum EnforceOutcome {
    Allowed,
    Denied,
    /// The subject carried no roles.
    NoRoles,
    /// The query's policy effect was not "allow" or "deny".
    InvalidPolicyEffect,
    /// A role's statements could not be fetched.
    Failed,
}

/// Snapshot of one enforcement call, passed to [`MetricsSink::on_enforce`].
#[derive(Debug, Clone, Serialize)]
pub struct EnforceStats {
    /// Total time spent in `enforce`
    pub duration: Duration,
    /// Whether the call returned `true`
    pub allowed: bool,
    /// Number of roles presented, duplicates included
    pub roles: usize,
    /// The queried action
    pub action: String,
    pub outcome: EnforceOutcome,
}

/// Enforcement time broken down by phase, in milliseconds.
#[derive(Debug, Clone, Serialize)]
pub struct EnforcePhases {
    /// Time spent getting role policies from the cache or the store
    pub fetch_ms: f64,
    /// Time spent matching statements and folding decisions
    pub evaluate_ms: f64,
    pub total_ms: f64,
}

impl EnforcePhases {
    /// Time not accounted for in measured phases.
    pub fn overhead_ms(&self) -> f64 {
        self.total_ms - (self.fetch_ms + self.evaluate_ms)
    }
}

/// Snapshot of a cache fill from the statement store.
#[derive(Debug, Clone, Serialize)]
pub struct CacheLoadStats {
    pub role: String,
    /// Number of usable statements cached for the role
    pub statements: usize,
    /// The stored payload was malformed and the role was cached empty
    pub malformed: bool,
    pub duration: Duration,
    /// TTL chosen for the new entry
    pub ttl: Duration,
}

/// Trait for consuming enforcement and cache metrics.
///
/// Implementations must be thread-safe and should not block; they are called
/// on the enforcement path.
pub trait MetricsSink: Send + Sync {
    /// Called once per `enforce` call, whatever the outcome.
    fn on_enforce(&self, _stats: &EnforceStats) {}

    /// Called with phase timings for calls that reached role evaluation.
    fn on_enforce_phases(&self, _stats: &EnforceStats, _phases: &EnforcePhases) {}

    /// Called after a role's statements were loaded from the store.
    fn on_cache_load(&self, _stats: &CacheLoadStats) {}

    /// Called when a role was served from a live cache entry.
    fn on_cache_hit(&self, _role: &str) {}
}

/// No-op sink; metrics are silently dropped.
struct NoOpSink;

impl MetricsSink for NoOpSink {}

static NOOP_SINK: Lazy<Arc<dyn MetricsSink>> = Lazy::new(|| Arc::new(NoOpSink));

/// The sink used when none is configured.
pub fn noop_sink() -> Arc<dyn MetricsSink> {
    Arc::clone(&NOOP_SINK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingSink {
        enforcements: AtomicU64,
        loads: AtomicU64,
    }

    impl MetricsSink for CountingSink {
        fn on_enforce(&self, _stats: &EnforceStats) {
            self.enforcements.fetch_add(1, Ordering::SeqCst);
        }

        fn on_cache_load(&self, _stats: &CacheLoadStats) {
            self.loads.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn stats(outcome: EnforceOutcome) -> EnforceStats {
        EnforceStats {
            duration: Duration::from_micros(250),
            allowed: outcome == EnforceOutcome::Allowed,
            roles: 2,
            action: "read".to_string(),
            outcome,
        }
    }

    #[test]
    fn test_noop_sink_accepts_everything() {
        let sink = noop_sink();
        let s = stats(EnforceOutcome::Denied);
        sink.on_enforce(&s);
        sink.on_enforce_phases(
            &s,
            &EnforcePhases {
                fetch_ms: 0.1,
                evaluate_ms: 0.1,
                total_ms: 0.3,
            },
        );
        sink.on_cache_hit("R1");
    }

    #[test]
    fn test_default_methods_only_call_overrides() {
        let sink = CountingSink {
            enforcements: AtomicU64::new(0),
            loads: AtomicU64::new(0),
        };
        sink.on_enforce(&stats(EnforceOutcome::Allowed));
        sink.on_cache_hit("R1");
        sink.on_cache_load(&CacheLoadStats {
            role: "R1".to_string(),
            statements: 3,
            malformed: false,
            duration: Duration::from_millis(2),
            ttl: Duration::from_secs(90),
        });
        assert_eq!(sink.enforcements.load(Ordering::SeqCst), 1);
        assert_eq!(sink.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_phases_overhead() {
        let phases = EnforcePhases {
            fetch_ms: 1.5,
            evaluate_ms: 0.5,
            total_ms: 2.25,
        };
        assert!((phases.overhead_ms() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_enforce_stats_serialization() {
        let json = serde_json::to_value(stats(EnforceOutcome::InvalidPolicyEffect)).unwrap();
        assert_eq!(json["outcome"], "InvalidPolicyEffect");
        assert_eq!(json["allowed"], false);
        assert_eq!(json["roles"], 2);
    }
}
