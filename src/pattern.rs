//! Action and resource patterns.
//!
//! Supported syntax:
//! - `*` on its own matches any value
//! - `*` inside a pattern matches any run of characters, including none
//!   (e.g. `doc*`, `reports/*/summary`, `*:read`)
//! - anything else is matched literally
//!
//! Segments carry no meaning: `*` happily crosses `/` and `:`. Matching is
//! case-sensitive unless [`MatchOptions::case_insensitive`] is set.

use std::fmt::{Display, Formatter, Result as FmtResult};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::PolicyError;

const WILDCARD: char = '*';

/// Options applied when compiling patterns.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(default)]
pub struct MatchOptions {
    pub case_insensitive: bool,
}

#[derive(Debug, Clone)]
enum PatternKind {
    Any,
    Literal(String),
    Glob(Regex),
}

/// A compiled action or resource pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    kind: PatternKind,
}

impl Pattern {
    pub fn compile(raw: &str, options: MatchOptions) -> Result<Self, PolicyError> {
        if raw.is_empty() {
            return Err(PolicyError::InvalidPattern("empty pattern".to_string()));
        }

        let kind = if raw.chars().all(|c| c == WILDCARD) {
            PatternKind::Any
        } else if !raw.contains(WILDCARD) && !options.case_insensitive {
            PatternKind::Literal(raw.to_string())
        } else {
            let body = raw
                .split(WILDCARD)
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            let re = RegexBuilder::new(&format!("^(?s:{body})$"))
                .case_insensitive(options.case_insensitive)
                .build()?;
            PatternKind::Glob(re)
        };

        Ok(Pattern {
            raw: raw.to_string(),
            kind,
        })
    }

    pub fn matches(&self, value: &str) -> bool {
        match &self.kind {
            PatternKind::Any => true,
            PatternKind::Literal(lit) => lit == value,
            PatternKind::Glob(re) => re.is_match(value),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.raw)
    }
}

/// Compile a non-empty list of patterns.
pub(crate) fn compile_all(
    raw: &[String],
    options: MatchOptions,
    what: &str,
) -> Result<Vec<Pattern>, PolicyError> {
    if raw.is_empty() {
        return Err(PolicyError::InvalidPattern(format!("empty {what} list")));
    }
    raw.iter().map(|p| Pattern::compile(p, options)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    fn sensitive(raw: &str) -> Pattern {
        Pattern::compile(raw, MatchOptions::default()).unwrap()
    }

    fn insensitive(raw: &str) -> Pattern {
        Pattern::compile(
            raw,
            MatchOptions {
                case_insensitive: true,
            },
        )
        .unwrap()
    }

    #[parameterized(
        exact = { "doc1", "doc1", true },
        exact_mismatch = { "doc1", "doc2", false },
        exact_prefix_only = { "doc", "doc1", false },
        star_any = { "*", "anything/at/all", true },
        star_empty_value = { "*", "", true },
        double_star_any = { "**", "x", true },
        trailing = { "doc*", "doc42", true },
        trailing_empty_run = { "doc*", "doc", true },
        trailing_mismatch = { "doc*", "file1", false },
        leading = { "*:read", "billing:read", true },
        leading_mismatch = { "*:read", "billing:write", false },
        embedded = { "reports/*/summary", "reports/2024/q1/summary", true },
        embedded_mismatch = { "reports/*/summary", "reports/2024/detail", false },
        several = { "a*b*c", "a-x-b-y-c", true },
        several_order = { "a*b*c", "a-c-b", false },
        regex_meta_literal = { "doc.1", "docX1", false },
        regex_meta_glob = { "doc.*", "doc.pdf", true },
        case_sensitive = { "Doc1", "doc1", false },
    )]
    fn test_pattern_matches(raw: &str, value: &str, expected: bool) {
        assert_eq!(sensitive(raw).matches(value), expected);
    }

    #[parameterized(
        literal = { "Doc1", "dOC1" },
        glob = { "Reports/*", "reports/q1" },
    )]
    fn test_case_insensitive_matches(raw: &str, value: &str) {
        assert!(insensitive(raw).matches(value));
        assert!(!sensitive(raw).matches(value));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let err = Pattern::compile("", MatchOptions::default()).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidPattern(_)));
    }

    #[test]
    fn test_compile_all_rejects_empty_list() {
        let err = compile_all(&[], MatchOptions::default(), "action").unwrap_err();
        assert_eq!(
            err,
            PolicyError::InvalidPattern("empty action list".to_string())
        );
    }

    #[test]
    fn test_pattern_keeps_raw_text() {
        let p = sensitive("doc*");
        assert_eq!(p.as_str(), "doc*");
        assert_eq!(p.to_string(), "doc*");
    }
}
