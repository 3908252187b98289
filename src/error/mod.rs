//! Error types for query validation and safe execution.
//!
//! Uses `thiserror` for ergonomic error definitions. Every rejection carries
//! a stable category slug and renders to the JSON body callers put on the
//! wire, so messages are written to be user-facing.

use crate::keywords::DangerousOperation;
use serde::Serialize;
use thiserror::Error;

/// Stable machine-readable code attached to every rejection.
pub const VALIDATION_FAILED_CODE: &str = "QUERY_VALIDATION_FAILED";

/// A query rejection. Rejections are terminal for the call: the validator
/// never retries and a rejected query is never executed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Empty query provided")]
    EmptyQuery,

    #[error("Query parsing failed: {0}. Please check your SQL syntax.")]
    ParseError(String),

    #[error(
        "Only SELECT queries are allowed. Found: {found} statement. \
         Please modify your query to only retrieve data."
    )]
    NotASelect { found: String },

    #[error(
        "Dangerous operation detected: {0}. Only SELECT queries are permitted. \
         Please remove any data modification statements."
    )]
    DangerousOperation(DangerousOperation),

    #[error("Dangerous function call detected: {name}(). This function is not allowed in queries.")]
    DangerousFunctionCall { name: String },

    #[error(
        "Multiple SQL statements detected (semicolon found). \
         Only single SELECT queries are allowed."
    )]
    MultiStatement,

    #[error("Query contains forbidden comment syntax")]
    ForbiddenComment,

    #[error(
        "Query references forbidden table: {table}. Allowed tables: {}",
        .allowed.join(", ")
    )]
    ForbiddenTable { table: String, allowed: Vec<String> },

    #[error("Query exceeds maximum length of {max} characters")]
    QueryTooLong { max: usize },

    #[error("Row limit must be between 1 and {max}")]
    InvalidRowLimit { max: u32 },
}

impl ValidationError {
    /// Stable category slug, suitable for pattern-matching in caller test
    /// suites and error bodies. These strings are part of the public contract.
    pub fn category(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "empty-query",
            Self::ParseError(_) => "parse-error",
            Self::NotASelect { .. } => "not-a-select",
            Self::DangerousOperation(_) => "dangerous-operation",
            Self::DangerousFunctionCall { .. } => "dangerous-function-call",
            Self::MultiStatement => "multi-statement",
            Self::ForbiddenComment => "forbidden-comment",
            Self::ForbiddenTable { .. } => "forbidden-table",
            Self::QueryTooLong { .. } => "query-too-long",
            Self::InvalidRowLimit { .. } => "invalid-row-limit",
        }
    }

    /// Renders the rejection as the JSON error body callers return verbatim.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            code: VALIDATION_FAILED_CODE,
            category: self.category(),
        }
    }
}

/// Wire shape of a rejected query:
/// `{"error": "...", "code": "QUERY_VALIDATION_FAILED", "category": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    pub category: &'static str,
}

/// Errors from the safe execution seam.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Query execution failed: {0}")]
    ExecutionFailed(String),
}

/// Result type alias for ValidationError.
pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// Result type alias for ExecutorError.
pub type ExecutorResult<T> = std::result::Result<T, ExecutorError>;
