//! Raw policy statements as stored per role.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::effect::Effect;

/// One authorization rule: an effect plus the action and resource patterns it covers.
///
/// Statements are produced by the role-management side and are read-only
/// here. Field names also accept the capitalised `Effect`/`Action`/`Resource`
/// spelling on input.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash)]
pub struct Statement {
    #[serde(alias = "Effect")]
    pub effect: Effect,
    #[serde(alias = "Action")]
    pub actions: Vec<String>,
    #[serde(alias = "Resource")]
    pub resources: Vec<String>,
}

impl Statement {
    pub fn new<A, R>(effect: Effect, actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Statement {
            effect,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Statement::new(Effect::Allow, actions, resources)
    }

    pub fn deny<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Statement::new(Effect::Deny, actions, resources)
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} [{}] on [{}]",
            self.effect,
            self.actions.join(", "),
            self.resources.join(", ")
        )
    }
}
