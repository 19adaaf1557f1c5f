use crate::pattern::Pattern;
use crate::types::{CompiledStatement, Decision};

fn any_matches(patterns: &[Pattern], value: &str) -> bool {
    patterns.iter().any(|p| p.matches(value))
}

/// Match one statement against an action and resource.
///
/// Returns the statement's effect when both an action pattern and a
/// resource pattern match, otherwise `Abstain`.
pub fn match_statement(statement: &CompiledStatement, action: &str, resource: &str) -> Decision {
    if any_matches(statement.actions(), action) && any_matches(statement.resources(), resource) {
        Decision::from(statement.effect())
    } else {
        Decision::Abstain
    }
}
