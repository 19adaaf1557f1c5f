use crate::policy_match::match_statement;
use crate::types::{Decision, PolicyEffect, RolePolicy};

/// Fold a role's statements into a single decision for the query.
///
/// A role with no statements, or whose statements all abstain, abstains.
/// Otherwise the mode decides which statement family is authoritative:
/// - `Allow`: allow iff any matched statement allows
/// - `Deny`: deny iff any matched statement denies
/// - `Default`: allow iff some matched statement allows and none denies
pub fn evaluate_role(
    policy: &RolePolicy,
    mode: PolicyEffect,
    action: &str,
    resource: &str,
) -> Decision {
    if policy.is_empty() {
        return Decision::Abstain;
    }

    let mut any_allow = false;
    let mut any_deny = false;
    let mut abstained = 0usize;

    for statement in policy.statements() {
        match match_statement(statement, action, resource) {
            Decision::Allow => any_allow = true,
            Decision::Deny => any_deny = true,
            Decision::Abstain => abstained += 1,
        }
    }

    if abstained == policy.len() {
        return Decision::Abstain;
    }

    let allowed = match mode {
        PolicyEffect::Allow => any_allow,
        PolicyEffect::Deny => !any_deny,
        PolicyEffect::Default => any_allow && !any_deny,
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Deny
    }
}
