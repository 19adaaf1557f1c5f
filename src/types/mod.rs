//! Data model types for statements, queries and decisions.
//!
//! Wire forms:
//! - Statement: `{"effect": "Allow", "actions": ["read"], "resources": ["doc1"]}`
//! - Query: `{"action": "read", "resource": "doc1", "policyEffect": "allow"}`

mod decision;
mod effect;
mod request;
mod role_policy;
mod statement;

pub use decision::{Decision, RoleDecision};
pub use effect::{Effect, PolicyEffect};
pub use request::EnforceQuery;
pub use role_policy::{CompiledStatement, RolePolicy};
pub use statement::Statement;
