//! Compiled statement lists, one per role.

use itertools::Itertools;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::PolicyError;
use crate::pattern::{MatchOptions, Pattern, compile_all};

use super::effect::Effect;
use super::statement::Statement;

/// A statement whose patterns have been compiled for matching.
#[derive(Debug, Clone)]
pub struct CompiledStatement {
    effect: Effect,
    actions: Vec<Pattern>,
    resources: Vec<Pattern>,
}

impl CompiledStatement {
    pub fn compile(statement: &Statement, options: MatchOptions) -> Result<Self, PolicyError> {
        Ok(CompiledStatement {
            effect: statement.effect,
            actions: compile_all(&statement.actions, options, "action")?,
            resources: compile_all(&statement.resources, options, "resource")?,
        })
    }

    pub fn effect(&self) -> Effect {
        self.effect
    }

    pub fn actions(&self) -> &[Pattern] {
        &self.actions
    }

    pub fn resources(&self) -> &[Pattern] {
        &self.resources
    }
}

/// The ordered, compiled statements attached to one role.
///
/// A role without statements is still a valid `RolePolicy`; it simply
/// abstains from every query.
#[derive(Debug, Clone)]
pub struct RolePolicy {
    role: String,
    statements: Vec<CompiledStatement>,
}

impl RolePolicy {
    pub fn compile(
        role: &str,
        statements: &[Statement],
        options: MatchOptions,
    ) -> Result<Self, PolicyError> {
        let statements = statements
            .iter()
            .map(|s| CompiledStatement::compile(s, options))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PolicyError::MalformedPolicy {
                role: role.to_string(),
                reason: e.to_string(),
            })?;

        Ok(RolePolicy {
            role: role.to_string(),
            statements,
        })
    }

    pub fn empty(role: &str) -> Self {
        RolePolicy {
            role: role.to_string(),
            statements: Vec::new(),
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn statements(&self) -> &[CompiledStatement] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Action patterns mentioned by this role, sorted and deduplicated.
    pub fn actions_by_name(&self) -> Vec<String> {
        self.statements
            .iter()
            .flat_map(|s| s.actions.iter().map(|p| p.as_str().to_string()))
            .sorted()
            .dedup()
            .collect()
    }

    /// Resource patterns mentioned by this role, sorted and deduplicated.
    pub fn resources_by_name(&self) -> Vec<String> {
        self.statements
            .iter()
            .flat_map(|s| s.resources.iter().map(|p| p.as_str().to_string()))
            .sorted()
            .dedup()
            .collect()
    }
}

impl Serialize for RolePolicy {
    fn serialize<S>(&self, ser: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let statements: Vec<Statement> = self
            .statements
            .iter()
            .map(|s| {
                Statement::new(
                    s.effect,
                    s.actions.iter().map(|p| p.as_str()),
                    s.resources.iter().map(|p| p.as_str()),
                )
            })
            .collect();

        let mut s = ser.serialize_struct("RolePolicy", 2)?;
        s.serialize_field("role", &self.role)?;
        s.serialize_field("statements", &statements)?;
        s.end()
    }
}
