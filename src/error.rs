use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("failed to parse statements: {0}")]
    ParseError(String),

    #[error("invalid policy effect {0:?}, expected \"allow\" or \"deny\"")]
    InvalidPolicyEffect(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("malformed policy for role {role}: {reason}")]
    MalformedPolicy { role: String, reason: String },

    #[error("statement store unavailable while loading role {role}: {reason}")]
    StoreUnavailable { role: String, reason: String },

    #[error("Poisoned lock error: {0}")]
    PoisonedLockError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

/// Failure reported by a [`crate::StatementStore`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The stored payload for the role does not decode into statements.
    #[error("malformed statements: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::ParseError(err.to_string())
    }
}

impl From<regex::Error> for PolicyError {
    fn from(err: regex::Error) -> Self {
        PolicyError::InvalidPattern(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PolicyError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        PolicyError::PoisonedLockError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_policy_effect_message() {
        let err = PolicyError::InvalidPolicyEffect("maybe".to_string());
        assert_eq!(
            err.to_string(),
            r#"invalid policy effect "maybe", expected "allow" or "deny""#
        );
    }

    #[test]
    fn test_store_unavailable_message_names_role() {
        let err = PolicyError::StoreUnavailable {
            role: "R1".to_string(),
            reason: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("R1"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let err: PolicyError = serde_json::from_str::<Vec<u8>>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, PolicyError::ParseError(_)));
    }

    #[test]
    fn test_error_serialization() {
        let err = PolicyError::MalformedPolicy {
            role: "R1".to_string(),
            reason: "empty action list".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        let back: PolicyError = serde_json::from_value(json).unwrap();
        assert_eq!(err, back);
    }

    #[test]
    fn test_lock_failures_map_to_poisoned_lock_error() {
        let lock = std::sync::Arc::new(std::sync::RwLock::new(0_u8));
        let held = std::sync::Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = held.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        let err: PolicyError = lock.read().unwrap_err().into();
        assert!(matches!(err, PolicyError::PoisonedLockError(_)));
    }
}
