//! Role-statement authorization enforcement.
//!
//! A subject holds a set of roles; each role carries a list of statements
//! (`Allow`/`Deny` over action and resource patterns) fetched through a
//! [`StatementStore`] and cached per role. [`EnforcementEngine::enforce`]
//! evaluates every role and combines them with deny-override.
//!
//! ```rust
//! use std::sync::Arc;
//! use rolegate_core::{EnforceQuery, EnforcementEngine, MemoryStatementStore, Statement};
//!
//! let store = MemoryStatementStore::new();
//! store.set_statements("editor", &[Statement::allow(["read", "write"], ["doc*"])]).unwrap();
//! store.set_statements("suspended", &[Statement::deny(["*"], ["*"])]).unwrap();
//!
//! let engine = EnforcementEngine::new(Arc::new(store)).unwrap();
//! let query = EnforceQuery::new("write", "doc1");
//! assert!(engine.enforce(&["editor"], &query).unwrap());
//! assert!(!engine.enforce(&["editor", "suspended"], &query).unwrap());
//! ```

pub use cache::{Clock, StatementCache, SystemClock};
pub use config::{CacheConfig, EngineConfig};
pub use engine::{EnforcementEngine, EnforcementEngineBuilder};
pub use error::{PolicyError, StoreError};
pub use evaluator::evaluate_role;
pub use loader::parse_statements;
pub use pattern::{MatchOptions, Pattern};
pub use policy_match::match_statement;
pub use store::{MemoryStatementStore, StatementStore};
pub use types::{
    CompiledStatement, Decision, Effect, EnforceQuery, PolicyEffect, RoleDecision, RolePolicy,
    Statement,
};

mod cache;
mod config;
mod engine;
mod error;
mod evaluator;
mod loader;
pub mod metrics;
mod pattern;
mod policy_match;
mod store;
mod timers;
mod types;
