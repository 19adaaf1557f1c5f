//! Tri-state decisions for statements and roles.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::effect::Effect;

/// Outcome of matching one statement or evaluating one role.
///
/// `Abstain` carries no polarity: the statement or role had nothing to say
/// about the queried action and resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum Decision {
    Allow,
    Deny,
    Abstain,
}

impl Decision {
    pub fn is_abstain(&self) -> bool {
        matches!(self, Decision::Abstain)
    }
}

impl From<Effect> for Decision {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Allow => Decision::Allow,
            Effect::Deny => Decision::Deny,
        }
    }
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Decision::Allow => write!(f, "Allow"),
            Decision::Deny => write!(f, "Deny"),
            Decision::Abstain => write!(f, "Abstain"),
        }
    }
}

/// The decision a single role reached for a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub struct RoleDecision {
    pub role: String,
    pub decision: Decision,
}

impl Display for RoleDecision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {}", self.role, self.decision)
    }
}
