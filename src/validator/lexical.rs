//! Regex-based validation path.
//!
//! Used when no parser is available, and as the fallback for the AST path
//! when strict mode is off. Strictly weaker than AST classification: it
//! cannot tell a dangerous keyword used as an identifier from a real
//! statement, so any ambiguity rejects. False positives are acceptable,
//! false negatives are not.

use crate::error::{ValidationError, ValidationResult};
use crate::keywords::DangerousOperation;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Regex for stripping line comments (--).
static LINE_COMMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--[^\n]*").expect("Invalid regex: line comment pattern"));

/// Regex for stripping block comments (/* */), spanning newlines.
static BLOCK_COMMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("Invalid regex: block comment pattern"));

/// A semicolon followed by more content indicates statement chaining.
static MULTI_STATEMENT_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r";\s*\w").expect("Invalid regex: multi-statement pattern"));

/// First word-token of a query.
static FIRST_TOKEN_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\w+)").expect("Invalid regex: first token pattern"));

/// Removes SQL comments so dangerous keywords inside them neither trigger
/// rejection nor hide a statement boundary.
pub(crate) fn strip_comments(query: &str) -> String {
    let stripped = LINE_COMMENT_REGEX.replace_all(query, "");
    BLOCK_COMMENT_REGEX.replace_all(&stripped, "").into_owned()
}

/// True if a semicolon is followed by another word character. A single
/// trailing semicolon is tolerated.
pub(crate) fn has_multiple_statements(stripped: &str) -> bool {
    MULTI_STATEMENT_REGEX.is_match(stripped)
}

fn first_token(stripped: &str) -> Option<&str> {
    FIRST_TOKEN_REGEX
        .captures(stripped)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Lexical SELECT-only guard.
#[derive(Debug, Clone, Copy)]
pub struct LexicalGuard {
    max_query_length: usize,
}

impl Default for LexicalGuard {
    fn default() -> Self {
        Self {
            max_query_length: 10_000,
        }
    }
}

impl LexicalGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_query_length(mut self, length: usize) -> Self {
        self.max_query_length = length;
        self
    }

    /// Validate a query using comment stripping and keyword scanning.
    ///
    /// # Errors
    ///
    /// Returns the first failed check: [`ValidationError::EmptyQuery`],
    /// [`ValidationError::QueryTooLong`], [`ValidationError::MultiStatement`],
    /// [`ValidationError::DangerousOperation`], or
    /// [`ValidationError::NotASelect`].
    pub fn validate(&self, query: &str) -> ValidationResult<()> {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }

        if query.len() > self.max_query_length {
            return Err(ValidationError::QueryTooLong {
                max: self.max_query_length,
            });
        }

        // Comments go first: a keyword inside one must not reject, and a
        // comment must not hide the boundary between statements.
        let stripped = strip_comments(query);

        if has_multiple_statements(&stripped) {
            warn!("multiple statements detected");
            return Err(ValidationError::MultiStatement);
        }

        // Scan the whole text, not just the start: dangerous keywords can
        // appear mid-query, e.g. inside a CTE body.
        if let Some(operation) = DangerousOperation::find_in(&stripped) {
            warn!(keyword = %operation, "dangerous keyword in query");
            return Err(ValidationError::DangerousOperation(operation));
        }

        match first_token(&stripped) {
            Some(token) if token.eq_ignore_ascii_case("SELECT") => {}
            Some(token) => {
                warn!(found = token, "query does not start with SELECT");
                return Err(ValidationError::NotASelect {
                    found: token.to_uppercase(),
                });
            }
            None => {
                return Err(ValidationError::NotASelect {
                    found: "unknown".into(),
                });
            }
        }

        debug!("lexical validation passed");
        Ok(())
    }
}
