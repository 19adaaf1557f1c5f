use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::error::StoreError;
use crate::metrics::CacheLoadStats;
use crate::pattern::MatchOptions;
use crate::store::MemoryStatementStore;
use crate::types::Statement;
use yare::parameterized;


#[derive(Clone)]
struct SharedLogBuffer(Arc<Mutex<Vec<u8>>>);

struct SharedLogWriter(Arc<Mutex<Vec<u8>>>);

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedLogBuffer {
    type Writer = SharedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SharedLogWriter(Arc::clone(&self.0))
    }
}

impl std::io::Write for SharedLogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber that captures formatted log lines.
fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = SharedLogBuffer(Arc::new(Mutex::new(Vec::new())));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    (result, logs)
}

/// Records every enforcement and cache load.
#[derive(Default)]
struct RecordingSink {
    enforcements: Mutex<Vec<EnforceStats>>,
    phases: AtomicUsize,
    loads: Mutex<Vec<CacheLoadStats>>,
    hits: AtomicUsize,
}

impl RecordingSink {
    fn outcomes(&self) -> Vec<EnforceOutcome> {
        self.enforcements
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.outcome)
            .collect()
    }
}

impl MetricsSink for RecordingSink {
    fn on_enforce(&self, stats: &EnforceStats) {
        self.enforcements.lock().unwrap().push(stats.clone());
    }

    fn on_enforce_phases(&self, _stats: &EnforceStats, _phases: &EnforcePhases) {
        self.phases.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cache_load(&self, stats: &CacheLoadStats) {
        self.loads.lock().unwrap().push(stats.clone());
    }

    fn on_cache_hit(&self, _role: &str) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

fn store_with(roles: &[(&str, Vec<Statement>)]) -> Arc<MemoryStatementStore> {
    let store = MemoryStatementStore::new();
    for (role, statements) in roles {
        store.set_statements(role, statements).unwrap();
    }
    Arc::new(store)
}

fn engine_with(roles: &[(&str, Vec<Statement>)]) -> EnforcementEngine {
    EnforcementEngine::new(store_with(roles)).expect("engine should build")
}

/// R1 allows read on doc1, R2 denies read on doc1, R3 denies write on doc1,
/// R4 has no statements, R5 allows everything under docs/.
fn standard_engine() -> EnforcementEngine {
    engine_with(&[
        ("R1", vec![Statement::allow(["read"], ["doc1"])]),
        ("R2", vec![Statement::deny(["read"], ["doc1"])]),
        ("R3", vec![Statement::deny(["write"], ["doc1"])]),
        ("R4", vec![]),
        ("R5", vec![Statement::allow(["*"], ["docs/*"])]),
    ])
}

fn query(action: &str, resource: &str, effect: Option<&str>) -> EnforceQuery {
    let q = EnforceQuery::new(action, resource);
    match effect {
        Some(e) => q.with_policy_effect(e),
        None => q,
    }
}

include!("enforce.rs");
include!("scenarios.rs");
