use crate::error::PolicyError;
use crate::types::Statement;

/// Parse a JSON statement list into `Statement`s.
///
/// An empty document (or whitespace) is an empty list, not an error.
///
/// Example:
/// ```rust
/// use rolegate_core::parse_statements;
/// let text = r#"[
///     {"effect": "Allow", "actions": ["read"], "resources": ["doc1"]},
///     {"effect": "Deny", "actions": ["*"], "resources": ["secret*"]}
/// ]"#;
/// let statements = parse_statements(text).unwrap();
/// assert_eq!(statements.len(), 2);
/// ```
pub fn parse_statements(text: &str) -> Result<Vec<Statement>, PolicyError> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(text)?)
}
