//! Query validation guards.
//!
//! Three variations of one classification problem: the AST-backed
//! [`StatementClassifier`], the regex-based [`LexicalGuard`], and the
//! table-allowlist [`AllowlistGuard`] for the analytics surface.

pub mod allowlist;
pub mod classifier;
pub mod lexical;

pub use allowlist::{AllowlistGuard, QueryRequest};
pub use classifier::StatementClassifier;
pub use lexical::LexicalGuard;

use crate::config::ValidatorOptions;
use crate::error::ValidationResult;

/// Single entry point over the two general-purpose validation paths.
///
/// Whether a parser is available is a construction-time decision, made once
/// by the process startup path; the instance is immutable and shared by
/// reference afterwards. There is no runtime switching between variants —
/// the only documented fallback is the strict-mode-off parse failure inside
/// [`StatementClassifier::validate`].
#[derive(Debug, Clone)]
pub enum QueryValidator {
    /// AST-backed classification (parser available).
    Ast(StatementClassifier),
    /// Lexical-only classification (no parser).
    Lexical(LexicalGuard),
}

impl QueryValidator {
    /// AST-backed validator with the given options.
    pub fn with_options(options: ValidatorOptions) -> Self {
        Self::Ast(StatementClassifier::from_options(options))
    }

    /// Lexical-only validator.
    pub fn lexical_only() -> Self {
        Self::Lexical(LexicalGuard::new())
    }

    /// Validate that `query` is a single, side-effect-free SELECT.
    pub fn validate(&self, query: &str) -> ValidationResult<()> {
        match self {
            Self::Ast(classifier) => classifier.validate(query),
            Self::Lexical(guard) => guard.validate(query),
        }
    }
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self::Ast(StatementClassifier::default())
    }
}

impl From<StatementClassifier> for QueryValidator {
    fn from(classifier: StatementClassifier) -> Self {
        Self::Ast(classifier)
    }
}

impl From<LexicalGuard> for QueryValidator {
    fn from(guard: LexicalGuard) -> Self {
        Self::Lexical(guard)
    }
}
