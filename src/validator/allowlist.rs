//! Table allow-list guard for the admin analytics surface.
//!
//! Stricter than the lexical path in two ways: comment syntax is rejected
//! outright instead of stripped, and every FROM/JOIN target must appear in
//! a fixed table allow-list. Accepted queries are rewritten with a LIMIT
//! backstop before execution.

use crate::error::{ValidationError, ValidationResult};
use crate::keywords::DangerousOperation;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum query length accepted by the analytics request schema.
pub const MAX_ANALYTICS_QUERY_LENGTH: usize = 5_000;

/// Row limit applied when the request does not specify one.
pub const DEFAULT_ROW_LIMIT: u32 = 100;

/// Upper bound on the requestable row limit.
pub const MAX_ROW_LIMIT: u32 = 1_000;

/// Table identifiers following FROM or JOIN. A coarse heuristic by design:
/// it may reject unusual clause positions, never admit an unlisted table.
static TABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:FROM|JOIN)\s+([A-Za-z_][A-Za-z0-9_]*)")
        .expect("Invalid regex: table extraction pattern")
});

/// Keyword-blacklist plus table-allowlist guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowlistGuard {
    allowed_tables: Vec<String>,
}

impl Default for AllowlistGuard {
    fn default() -> Self {
        Self {
            allowed_tables: vec![
                "users".into(),
                "accesses".into(),
                "user_accesses".into(),
            ],
        }
    }
}

impl AllowlistGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the table allow-list. Names are compared case-insensitively.
    pub fn allowed_tables<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tables = tables
            .into_iter()
            .map(|t| t.into().to_lowercase())
            .collect();
        self
    }

    /// Validate an analytics query against the keyword blacklist, comment
    /// ban, single-statement rule, and table allow-list.
    ///
    /// The SELECT-prefix check happens at the request-schema level
    /// ([`QueryRequest::validate`]) before this guard runs.
    pub fn validate(&self, query: &str) -> ValidationResult<()> {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }

        // No comment stripping here: on this surface comment syntax is
        // itself suspicious, and wins over whatever the comment contains.
        if query.contains("--") || query.contains("/*") || query.contains("*/") {
            warn!("comment syntax in analytics query");
            return Err(ValidationError::ForbiddenComment);
        }

        if let Some(operation) = DangerousOperation::find_in(query) {
            warn!(keyword = %operation, "dangerous keyword in analytics query");
            return Err(ValidationError::DangerousOperation(operation));
        }

        let semicolons = query.matches(';').count();
        if semicolons > 1 || (semicolons == 1 && !query.trim_end().ends_with(';')) {
            warn!("multiple statements in analytics query");
            return Err(ValidationError::MultiStatement);
        }

        for captures in TABLE_REGEX.captures_iter(query) {
            let table = captures[1].to_lowercase();
            if !self.allowed_tables.contains(&table) {
                warn!(table = %table, "analytics query references forbidden table");
                return Err(ValidationError::ForbiddenTable {
                    table,
                    allowed: self.allowed_tables.clone(),
                });
            }
        }

        debug!("analytics query accepted");
        Ok(())
    }

    /// Rewrites an accepted query for execution: strips a trailing
    /// semicolon and appends `LIMIT <n>` unless the query already carries
    /// a LIMIT clause. Never overrides an explicit LIMIT.
    pub fn prepare_for_execution(&self, query: &str, limit: u32) -> String {
        let mut prepared = query.trim().to_string();
        if prepared.ends_with(';') {
            prepared.pop();
        }
        let prepared = prepared.trim_end();

        if prepared.to_uppercase().contains("LIMIT") {
            prepared.to_string()
        } else {
            format!("{prepared} LIMIT {limit}")
        }
    }
}

/// Analytics query request, validated before the guard runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default = "default_row_limit")]
    pub limit: u32,
}

fn default_row_limit() -> u32 {
    DEFAULT_ROW_LIMIT
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: DEFAULT_ROW_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Coarse schema-level checks: length bounds, limit bounds, and the
    /// SELECT prefix.
    pub fn validate(&self) -> ValidationResult<()> {
        let trimmed = self.query.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }

        if self.query.len() > MAX_ANALYTICS_QUERY_LENGTH {
            return Err(ValidationError::QueryTooLong {
                max: MAX_ANALYTICS_QUERY_LENGTH,
            });
        }

        if self.limit == 0 || self.limit > MAX_ROW_LIMIT {
            return Err(ValidationError::InvalidRowLimit { max: MAX_ROW_LIMIT });
        }

        if !trimmed.to_uppercase().starts_with("SELECT") {
            let found = trimmed
                .split_whitespace()
                .next()
                .unwrap_or("unknown")
                .to_uppercase();
            return Err(ValidationError::NotASelect { found });
        }

        Ok(())
    }
}
