//! The statement store seam.
//!
//! The engine never talks to persistence directly. Whatever holds role
//! statements (a database, a config service, a file) implements
//! [`StatementStore`]; plain closures work too.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreError;
use crate::loader::parse_statements;
use crate::types::Statement;

/// Looks up the raw statements for a role.
pub trait StatementStore: Send + Sync {
    /// Return the statements attached to `role`.
    ///
    /// An unknown role, or one without statements, is `Ok(vec![])`. Use
    /// [`StoreError::Unavailable`] when the backing store cannot answer and
    /// [`StoreError::Malformed`] when the stored payload does not decode.
    fn lookup(&self, role: &str) -> Result<Vec<Statement>, StoreError>;
}

impl<F> StatementStore for F
where
    F: Fn(&str) -> Result<Vec<Statement>, StoreError> + Send + Sync,
{
    fn lookup(&self, role: &str) -> Result<Vec<Statement>, StoreError> {
        self(role)
    }
}

/// In-memory store holding one JSON statement document per role.
///
/// Documents are decoded on every lookup, so a bad document surfaces as
/// [`StoreError::Malformed`] the same way a persisted one would.
#[derive(Debug, Default)]
pub struct MemoryStatementStore {
    documents: RwLock<HashMap<String, String>>,
}

impl MemoryStatementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `statements` for `role`, replacing what was there.
    pub fn set_statements(&self, role: &str, statements: &[Statement]) -> Result<(), StoreError> {
        let text = serde_json::to_string(statements)
            .map_err(|e| StoreError::Malformed(e.to_string()))?;
        self.set_document(role, text)
    }

    /// Store a raw JSON document for `role` without validating it.
    pub fn set_document(&self, role: &str, text: impl Into<String>) -> Result<(), StoreError> {
        let mut docs = self
            .documents
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        docs.insert(role.to_string(), text.into());
        Ok(())
    }

    pub fn remove(&self, role: &str) -> Result<(), StoreError> {
        let mut docs = self
            .documents
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        docs.remove(role);
        Ok(())
    }
}

impl StatementStore for MemoryStatementStore {
    fn lookup(&self, role: &str) -> Result<Vec<Statement>, StoreError> {
        let docs = self
            .documents
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        match docs.get(role) {
            Some(text) => parse_statements(text).map_err(|e| StoreError::Malformed(e.to_string())),
            None => Ok(Vec::new()),
        }
    }
}
