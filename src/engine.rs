use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::cache::{Clock, StatementCache, SystemClock};
use crate::config::EngineConfig;
use crate::error::PolicyError;
use crate::evaluator::evaluate_role;
use crate::metrics::{EnforceOutcome, EnforcePhases, EnforceStats, MetricsSink, noop_sink};
use crate::store::StatementStore;
use crate::timers::{PhaseTimer, as_millis_f64};
use crate::types::{Decision, EnforceQuery, PolicyEffect, RoleDecision, RolePolicy};

/// The main engine handle. Cloneable and thread-safe; clones share one
/// statement cache.
#[derive(Clone)]
pub struct EnforcementEngine {
    cache: Arc<StatementCache>,
    metrics: Arc<dyn MetricsSink>,
}

/// Builder for [`EnforcementEngine`].
pub struct EnforcementEngineBuilder {
    store: Arc<dyn StatementStore>,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsSink>,
}

impl EnforcementEngineBuilder {
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = sink;
        self
    }

    pub fn build(self) -> Result<EnforcementEngine, PolicyError> {
        self.config.validate()?;
        let cache = StatementCache::new(self.store, self.config.cache, self.config.matching)?
            .with_clock(self.clock)
            .with_metrics(Arc::clone(&self.metrics));

        info!(
            event = "Engine",
            phase = "Build",
            ttl_min_secs = self.config.cache.ttl_min_secs,
            ttl_max_secs = self.config.cache.ttl_max_secs,
            case_insensitive = self.config.matching.case_insensitive
        );

        Ok(EnforcementEngine {
            cache: Arc::new(cache),
            metrics: self.metrics,
        })
    }
}

/// Tracks whether any role upheld or contradicted the query.
#[derive(Debug, Default)]
struct Aggregate {
    contain_allow: bool,
    contain_deny: bool,
}

impl Aggregate {
    fn record(&mut self, decision: Decision, target: Decision) {
        if decision == target {
            self.contain_allow = true;
        } else if !decision.is_abstain() {
            self.contain_deny = true;
        }
    }

    fn allowed(&self) -> bool {
        self.contain_allow && !self.contain_deny
    }
}

impl EnforcementEngine {
    /// An engine with the default configuration.
    pub fn new(store: Arc<dyn StatementStore>) -> Result<Self, PolicyError> {
        Self::builder(store).build()
    }

    pub fn builder(store: Arc<dyn StatementStore>) -> EnforcementEngineBuilder {
        EnforcementEngineBuilder {
            store,
            config: EngineConfig::default(),
            clock: Arc::new(SystemClock),
            metrics: noop_sink(),
        }
    }

    /// Decide whether a subject holding `roles` may perform the query.
    ///
    /// Every role is evaluated independently (duplicates included) and the
    /// results are combined with deny-override: the query holds iff at least
    /// one role upholds it and no role contradicts it. For allow and default
    /// queries "upholds" means the role decided `Allow`; for deny queries it
    /// means the role decided `Deny`.
    ///
    /// An empty role set, or a policy effect other than a case-insensitive
    /// "allow"/"deny", yields `Ok(false)`. An `Err` means a role's statements
    /// could not be fetched and no decision was reached.
    pub fn enforce<S: AsRef<str>>(
        &self,
        roles: &[S],
        query: &EnforceQuery,
    ) -> Result<bool, PolicyError> {
        let started = Instant::now();

        debug!(
            event = "Enforce",
            phase = "Request",
            roles = roles.len(),
            action = query.action.as_str(),
            resource = query.resource.as_str(),
            policy_effect = ?query.policy_effect
        );

        if roles.is_empty() {
            debug!(event = "Enforce", phase = "Result", allowed = false, reason = "no roles");
            self.record(started, roles.len(), query, EnforceOutcome::NoRoles);
            return Ok(false);
        }

        let mode = match PolicyEffect::from_query(query.policy_effect.as_deref()) {
            Ok(mode) => mode,
            Err(e) => {
                warn!(
                    event = "Enforce",
                    phase = "Validate",
                    action = query.action.as_str(),
                    resource = query.resource.as_str(),
                    error = %e,
                    "rejecting query"
                );
                self.record(started, roles.len(), query, EnforceOutcome::InvalidPolicyEffect);
                return Ok(false);
            }
        };

        let target = mode.target();
        let mut aggregate = Aggregate::default();
        let mut fetch = Duration::ZERO;
        let mut evaluate = Duration::ZERO;

        for role in roles {
            let role = role.as_ref();

            let policy = {
                let _timer = PhaseTimer::new(&mut fetch);
                self.cache.get(role)
            };
            let policy = match policy {
                Ok(policy) => policy,
                Err(e) => {
                    self.record(started, roles.len(), query, EnforceOutcome::Failed);
                    return Err(e);
                }
            };

            let decision = {
                let _timer = PhaseTimer::new(&mut evaluate);
                evaluate_role(&policy, mode, &query.action, &query.resource)
            };
            debug!(event = "Enforce", phase = "Role", role = role, decision = %decision);

            aggregate.record(decision, target);
            if aggregate.contain_deny {
                break;
            }
        }

        let allowed = aggregate.allowed();
        debug!(event = "Enforce", phase = "Result", mode = %mode, allowed = allowed);

        let outcome = if allowed {
            EnforceOutcome::Allowed
        } else {
            EnforceOutcome::Denied
        };
        let stats = self.record(started, roles.len(), query, outcome);
        self.metrics.on_enforce_phases(
            &stats,
            &EnforcePhases {
                fetch_ms: as_millis_f64(fetch),
                evaluate_ms: as_millis_f64(evaluate),
                total_ms: as_millis_f64(stats.duration),
            },
        );

        Ok(allowed)
    }

    /// The decision each role reached for the query, in role order.
    ///
    /// This is a diagnostic view; [`enforce`](Self::enforce) is the
    /// authoritative answer. Unlike `enforce`, an invalid policy effect is
    /// returned as an error.
    pub fn decisions<S: AsRef<str>>(
        &self,
        roles: &[S],
        query: &EnforceQuery,
    ) -> Result<Vec<RoleDecision>, PolicyError> {
        let mode = PolicyEffect::from_query(query.policy_effect.as_deref())?;

        roles
            .iter()
            .map(|role| {
                let role = role.as_ref();
                let policy = self.cache.get(role)?;
                Ok(RoleDecision {
                    role: role.to_string(),
                    decision: evaluate_role(&policy, mode, &query.action, &query.resource),
                })
            })
            .collect()
    }

    /// The compiled policy currently used for `role`.
    pub fn role_policy(&self, role: &str) -> Result<Arc<RolePolicy>, PolicyError> {
        self.cache.get(role)
    }

    /// Forget the cached statements for `role`. Call this when the role's
    /// statements change so the next query sees them.
    pub fn invalidate_role(&self, role: &str) -> Result<(), PolicyError> {
        self.cache.invalidate(role)
    }

    pub fn clear_cache(&self) -> Result<(), PolicyError> {
        self.cache.clear()
    }

    pub fn cache(&self) -> &StatementCache {
        &self.cache
    }

    fn record(
        &self,
        started: Instant,
        roles: usize,
        query: &EnforceQuery,
        outcome: EnforceOutcome,
    ) -> EnforceStats {
        let stats = EnforceStats {
            duration: started.elapsed(),
            allowed: outcome == EnforceOutcome::Allowed,
            roles,
            action: query.action.clone(),
            outcome,
        };
        self.metrics.on_enforce(&stats);
        stats
    }
}

#[cfg(test)]
mod tests;
