//! Statement effects and the query-side combination mode.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumString};
use utoipa::ToSchema;

use crate::error::PolicyError;

use super::decision::Decision;

/// The polarity a statement asserts when it matches.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash, AsRefStr, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Effect {
    Allow,
    Deny,
}

impl Display for Effect {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_ref())
    }
}

/// Selects which family of statements is authoritative when a role is evaluated.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq, Eq, Hash, Default)]
pub enum PolicyEffect {
    /// A single matching allow statement is enough; deny statements are ignored.
    Allow,
    /// A single matching deny statement is enough; allow statements are ignored.
    Deny,
    /// Allow only if some matched statement allows and none denies.
    #[default]
    Default,
}

impl PolicyEffect {
    /// Parse the optional policy effect carried by a query.
    ///
    /// `None` selects [`PolicyEffect::Default`]. Any present value must be a
    /// case-insensitive "allow" or "deny"; everything else, including the empty
    /// string, is rejected.
    pub fn from_query(raw: Option<&str>) -> Result<Self, PolicyError> {
        let Some(raw) = raw else {
            return Ok(PolicyEffect::Default);
        };

        match raw.parse::<Effect>() {
            Ok(Effect::Allow) => Ok(PolicyEffect::Allow),
            Ok(Effect::Deny) => Ok(PolicyEffect::Deny),
            Err(_) => Err(PolicyError::InvalidPolicyEffect(raw.to_string())),
        }
    }

    /// The per-role decision that upholds a query in this mode.
    ///
    /// Allow and default queries ask "is this allowed?", deny queries ask
    /// "is this explicitly denied?".
    pub fn target(&self) -> Decision {
        match self {
            PolicyEffect::Allow | PolicyEffect::Default => Decision::Allow,
            PolicyEffect::Deny => Decision::Deny,
        }
    }
}

impl Display for PolicyEffect {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            PolicyEffect::Allow => write!(f, "allow"),
            PolicyEffect::Deny => write!(f, "deny"),
            PolicyEffect::Default => write!(f, "default"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        lower_allow = { "allow", PolicyEffect::Allow },
        upper_allow = { "ALLOW", PolicyEffect::Allow },
        mixed_allow = { "Allow", PolicyEffect::Allow },
        lower_deny = { "deny", PolicyEffect::Deny },
        mixed_deny = { "dEnY", PolicyEffect::Deny },
    )]
    fn test_from_query_accepts(raw: &str, expected: PolicyEffect) {
        assert_eq!(PolicyEffect::from_query(Some(raw)).unwrap(), expected);
    }

    #[parameterized(
        garbage = { "maybe" },
        empty = { "" },
        padded = { " allow" },
        plural = { "allows" },
    )]
    fn test_from_query_rejects(raw: &str) {
        let err = PolicyEffect::from_query(Some(raw)).unwrap_err();
        assert_eq!(err, PolicyError::InvalidPolicyEffect(raw.to_string()));
    }

    #[test]
    fn test_from_query_none_is_default() {
        assert_eq!(
            PolicyEffect::from_query(None).unwrap(),
            PolicyEffect::Default
        );
    }

    #[test]
    fn test_target() {
        assert_eq!(PolicyEffect::Allow.target(), Decision::Allow);
        assert_eq!(PolicyEffect::Default.target(), Decision::Allow);
        assert_eq!(PolicyEffect::Deny.target(), Decision::Deny);
    }

    #[test]
    fn test_effect_wire_tags() {
        assert_eq!(serde_json::to_string(&Effect::Allow).unwrap(), r#""Allow""#);
        assert_eq!(serde_json::to_string(&Effect::Deny).unwrap(), r#""Deny""#);
        assert_eq!(Effect::Deny.to_string(), "Deny");
    }
}
