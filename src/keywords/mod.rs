//! Shared taxonomy of dangerous SQL operations.
//!
//! One canonical keyword table consumed by every guard: the AST path maps
//! statement nodes onto it, the lexical and allow-list paths build their
//! keyword regex from it. Guards must never carry their own keyword lists.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Broad category of a dangerous operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationCategory {
    /// INSERT, UPDATE, DELETE, MERGE, REPLACE, TRUNCATE
    DataModification,
    /// CREATE, ALTER, DROP, RENAME
    SchemaChange,
    /// GRANT, REVOKE
    AccessControl,
    /// COMMIT, ROLLBACK, SAVEPOINT
    TransactionControl,
    /// CALL, EXECUTE, COPY, LOAD, PRAGMA, SET, ...
    Administrative,
}

impl OperationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DataModification => "data modification",
            Self::SchemaChange => "schema change",
            Self::AccessControl => "access control",
            Self::TransactionControl => "transaction control",
            Self::Administrative => "administrative",
        }
    }
}

/// Closed enumeration of SQL operations the gate refuses to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DangerousOperation {
    Insert,
    Update,
    Delete,
    Merge,
    Replace,
    Truncate,
    Create,
    Alter,
    Drop,
    Rename,
    Grant,
    Revoke,
    Commit,
    Rollback,
    Savepoint,
    Call,
    Execute,
    Exec,
    Copy,
    Load,
    Install,
    Attach,
    Detach,
    Pragma,
    Set,
    Checkpoint,
    Vacuum,
    Analyze,
    Export,
    Import,
}

/// Whole-word, case-insensitive scan pattern built from [`DangerousOperation::ALL`].
static KEYWORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let keywords = DangerousOperation::ALL
        .iter()
        .map(|op| op.keyword())
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{keywords})\b"))
        .expect("Invalid regex: dangerous keyword pattern")
});

impl DangerousOperation {
    /// Every dangerous operation, in taxonomy order.
    pub const ALL: [Self; 30] = [
        Self::Insert,
        Self::Update,
        Self::Delete,
        Self::Merge,
        Self::Replace,
        Self::Truncate,
        Self::Create,
        Self::Alter,
        Self::Drop,
        Self::Rename,
        Self::Grant,
        Self::Revoke,
        Self::Commit,
        Self::Rollback,
        Self::Savepoint,
        Self::Call,
        Self::Execute,
        Self::Exec,
        Self::Copy,
        Self::Load,
        Self::Install,
        Self::Attach,
        Self::Detach,
        Self::Pragma,
        Self::Set,
        Self::Checkpoint,
        Self::Vacuum,
        Self::Analyze,
        Self::Export,
        Self::Import,
    ];

    /// The SQL keyword for this operation, upper-cased.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Merge => "MERGE",
            Self::Replace => "REPLACE",
            Self::Truncate => "TRUNCATE",
            Self::Create => "CREATE",
            Self::Alter => "ALTER",
            Self::Drop => "DROP",
            Self::Rename => "RENAME",
            Self::Grant => "GRANT",
            Self::Revoke => "REVOKE",
            Self::Commit => "COMMIT",
            Self::Rollback => "ROLLBACK",
            Self::Savepoint => "SAVEPOINT",
            Self::Call => "CALL",
            Self::Execute => "EXECUTE",
            Self::Exec => "EXEC",
            Self::Copy => "COPY",
            Self::Load => "LOAD",
            Self::Install => "INSTALL",
            Self::Attach => "ATTACH",
            Self::Detach => "DETACH",
            Self::Pragma => "PRAGMA",
            Self::Set => "SET",
            Self::Checkpoint => "CHECKPOINT",
            Self::Vacuum => "VACUUM",
            Self::Analyze => "ANALYZE",
            Self::Export => "EXPORT",
            Self::Import => "IMPORT",
        }
    }

    pub fn category(&self) -> OperationCategory {
        match self {
            Self::Insert
            | Self::Update
            | Self::Delete
            | Self::Merge
            | Self::Replace
            | Self::Truncate => OperationCategory::DataModification,
            Self::Create | Self::Alter | Self::Drop | Self::Rename => {
                OperationCategory::SchemaChange
            }
            Self::Grant | Self::Revoke => OperationCategory::AccessControl,
            Self::Commit | Self::Rollback | Self::Savepoint => {
                OperationCategory::TransactionControl
            }
            Self::Call
            | Self::Execute
            | Self::Exec
            | Self::Copy
            | Self::Load
            | Self::Install
            | Self::Attach
            | Self::Detach
            | Self::Pragma
            | Self::Set
            | Self::Checkpoint
            | Self::Vacuum
            | Self::Analyze
            | Self::Export
            | Self::Import => OperationCategory::Administrative,
        }
    }

    /// Case-insensitive keyword lookup.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.keyword().eq_ignore_ascii_case(word))
    }

    /// Finds the first dangerous keyword in `text` (whole word, case-insensitive).
    pub fn find_in(text: &str) -> Option<Self> {
        KEYWORD_PATTERN
            .find(text)
            .and_then(|m| Self::from_keyword(m.as_str()))
    }
}

impl fmt::Display for DangerousOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
