//! Enforcement query type.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The API-level enforcement query.
///
/// `policy_effect` is kept as the caller sent it; the engine normalises it
/// and treats anything but a case-insensitive "allow" or "deny" as an input
/// error. An absent value selects the default combination mode.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct EnforceQuery {
    pub action: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_effect: Option<String>,
}

impl EnforceQuery {
    /// A query in the default combination mode.
    pub fn new<A: Into<String>, R: Into<String>>(action: A, resource: R) -> Self {
        EnforceQuery {
            action: action.into(),
            resource: resource.into(),
            policy_effect: None,
        }
    }

    pub fn with_policy_effect<E: Into<String>>(mut self, effect: E) -> Self {
        self.policy_effect = Some(effect.into());
        self
    }
}
