//! AST-based validation path.
//!
//! Parses the query under a configured dialect and classifies the parse
//! tree: the root must be a single SELECT (including CTEs), and no node
//! anywhere in the tree may be a dangerous statement or a call to a
//! function named after one. The traversal is exhaustive — a clean subtree
//! never short-circuits acceptance while siblings remain unvisited.

use crate::config::{SqlDialect, ValidatorOptions};
use crate::error::{ValidationError, ValidationResult};
use crate::keywords::DangerousOperation;
use crate::validator::lexical::{self, LexicalGuard};
use sqlparser::ast::{Expr, Query, SetExpr, Statement, Visit, Visitor};
use sqlparser::parser::Parser;
use std::ops::ControlFlow;
use tracing::{debug, warn};

/// AST-backed SELECT-only classifier.
#[derive(Debug, Clone)]
pub struct StatementClassifier {
    dialect: SqlDialect,
    strict_mode: bool,
    max_query_length: usize,
    fallback: LexicalGuard,
}

impl Default for StatementClassifier {
    fn default() -> Self {
        Self::from_options(ValidatorOptions::default())
    }
}

impl From<ValidatorOptions> for StatementClassifier {
    fn from(options: ValidatorOptions) -> Self {
        Self::from_options(options)
    }
}

impl StatementClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: ValidatorOptions) -> Self {
        Self {
            dialect: options.dialect,
            strict_mode: options.strict_mode,
            max_query_length: options.max_query_length,
            fallback: LexicalGuard::new().max_query_length(options.max_query_length),
        }
    }

    pub fn dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    pub fn max_query_length(mut self, length: usize) -> Self {
        self.max_query_length = length;
        self.fallback = LexicalGuard::new().max_query_length(length);
        self
    }

    /// Validate that `query` is a single, side-effect-free SELECT.
    ///
    /// Parse failures reject in strict mode and fall back to the lexical
    /// guard otherwise.
    ///
    /// # Errors
    ///
    /// Any [`ValidationError`] except the allow-list-only variants.
    pub fn validate(&self, query: &str) -> ValidationResult<()> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyQuery);
        }

        if query.len() > self.max_query_length {
            return Err(ValidationError::QueryTooLong {
                max: self.max_query_length,
            });
        }

        // Always-on statement-chaining check, shared with the lexical path.
        if lexical::has_multiple_statements(&lexical::strip_comments(query)) {
            warn!("multiple statements detected");
            return Err(ValidationError::MultiStatement);
        }

        let statements = match Parser::parse_sql(&*self.dialect.parser_dialect(), trimmed) {
            Ok(statements) => statements,
            Err(parse_err) if self.strict_mode => {
                warn!(error = %parse_err, "query failed to parse");
                return Err(ValidationError::ParseError(parse_err.to_string()));
            }
            Err(parse_err) => {
                debug!(error = %parse_err, "parse failed, falling back to lexical validation");
                return self.fallback.validate(query);
            }
        };

        let statement = match statements.as_slice() {
            [] => return Err(ValidationError::EmptyQuery),
            [statement] => statement,
            _ => return Err(ValidationError::MultiStatement),
        };

        // Primary gate: the root of the parse tree must be a SELECT.
        match statement {
            Statement::Query(root) => ensure_select_body(root)?,
            other => {
                let rejection = reject_non_select(other);
                warn!(category = rejection.category(), "root statement is not a SELECT");
                return Err(rejection);
            }
        }

        if let ControlFlow::Break(rejection) = statement.visit(&mut DangerScan) {
            warn!(category = rejection.category(), "dangerous node in query tree");
            return Err(rejection);
        }

        debug!("query accepted");
        Ok(())
    }
}

/// Visitor over every node of the accepted tree. Statement nodes nested in
/// CTE bodies, subqueries, and set-expression arms are classified exactly
/// like a root statement would be; function calls are checked against the
/// keyword taxonomy.
struct DangerScan;

impl Visitor for DangerScan {
    type Break = ValidationError;

    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<Self::Break> {
        if let Some(operation) = classify_dangerous(statement) {
            return ControlFlow::Break(ValidationError::DangerousOperation(operation));
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        if let Expr::Function(function) = expr {
            // Only unqualified names: `schema.fn()` is resolved by the
            // engine, a bare `copy()`/`exec()` is an attempt to reach an
            // administrative builtin.
            if function.name.0.len() == 1 {
                if let Some(ident) = function.name.0.first() {
                    if DangerousOperation::from_keyword(&ident.value).is_some() {
                        return ControlFlow::Break(ValidationError::DangerousFunctionCall {
                            name: ident.value.to_uppercase(),
                        });
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }
}

/// Maps a statement node onto the danger taxonomy, if it belongs there.
///
/// Statement kinds without an explicit arm are looked up by their leading
/// keyword, so taxonomy entries the parser renders as less common node
/// kinds (SET variants, COMMIT, VACUUM, ...) still classify correctly.
fn classify_dangerous(statement: &Statement) -> Option<DangerousOperation> {
    match statement {
        Statement::Query(_) => None,

        Statement::Insert(_) => Some(DangerousOperation::Insert),
        Statement::Update { .. } => Some(DangerousOperation::Update),
        Statement::Delete(_) => Some(DangerousOperation::Delete),
        Statement::Merge { .. } => Some(DangerousOperation::Merge),
        Statement::Truncate { .. } => Some(DangerousOperation::Truncate),

        Statement::CreateTable(_)
        | Statement::CreateView { .. }
        | Statement::CreateIndex(_)
        | Statement::CreateSchema { .. }
        | Statement::CreateDatabase { .. } => Some(DangerousOperation::Create),
        Statement::AlterTable { .. }
        | Statement::AlterView { .. }
        | Statement::AlterIndex { .. }
        | Statement::AlterRole { .. } => Some(DangerousOperation::Alter),
        Statement::Drop { .. } | Statement::DropFunction { .. } => Some(DangerousOperation::Drop),

        Statement::Grant { .. } => Some(DangerousOperation::Grant),
        Statement::Revoke { .. } => Some(DangerousOperation::Revoke),

        Statement::Call(_) => Some(DangerousOperation::Call),
        Statement::Execute { .. } => Some(DangerousOperation::Execute),
        Statement::Copy { .. } => Some(DangerousOperation::Copy),
        Statement::Load { .. } => Some(DangerousOperation::Load),
        Statement::Install { .. } => Some(DangerousOperation::Install),
        Statement::AttachDatabase { .. } | Statement::AttachDuckDBDatabase { .. } => {
            Some(DangerousOperation::Attach)
        }
        Statement::DetachDuckDBDatabase { .. } => Some(DangerousOperation::Detach),
        Statement::Pragma { .. } => Some(DangerousOperation::Pragma),
        Statement::Analyze { .. } => Some(DangerousOperation::Analyze),

        other => DangerousOperation::from_keyword(&leading_keyword(other)),
    }
}

/// Root-level rejection for a statement the classifier did not map to the
/// taxonomy: report the statement kind actually found.
fn reject_non_select(statement: &Statement) -> ValidationError {
    match classify_dangerous(statement) {
        Some(operation) => ValidationError::DangerousOperation(operation),
        None => ValidationError::NotASelect {
            found: leading_keyword(statement),
        },
    }
}

/// A bare VALUES or TABLE body is a read, but not a SELECT.
fn ensure_select_body(query: &Query) -> ValidationResult<()> {
    match query.body.as_ref() {
        SetExpr::Values(_) => Err(ValidationError::NotASelect {
            found: "VALUES".into(),
        }),
        SetExpr::Table(_) => Err(ValidationError::NotASelect {
            found: "TABLE".into(),
        }),
        _ => Ok(()),
    }
}

fn leading_keyword(statement: &Statement) -> String {
    statement
        .to_string()
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> StatementClassifier {
        StatementClassifier::new()
    }

    fn lenient() -> StatementClassifier {
        StatementClassifier::new().strict_mode(false)
    }

    #[test]
    fn test_basic_select() {
        let classifier = strict();
        assert!(classifier.validate("SELECT * FROM users").is_ok());
        assert!(classifier.validate("SELECT id, name FROM users").is_ok());
        assert!(classifier.validate("select * from users").is_ok());
    }

    #[test]
    fn test_select_with_where_and_joins() {
        let classifier = strict();
        assert!(
            classifier
                .validate("SELECT * FROM users WHERE active = true")
                .is_ok()
        );
        assert!(
            classifier
                .validate(
                    "SELECT u.name, l.ts FROM users u \
                     JOIN logs l ON u.id = l.user_id \
                     LEFT JOIN orders o ON u.id = o.user_id"
                )
                .is_ok()
        );
    }

    #[test]
    fn test_select_with_aggregation() {
        let classifier = strict();
        assert!(classifier.validate("SELECT COUNT(*) FROM users").is_ok());
        assert!(
            classifier
                .validate(
                    "SELECT category, COUNT(*), AVG(price) FROM products \
                     GROUP BY category HAVING COUNT(*) > 10"
                )
                .is_ok()
        );
    }

    #[test]
    fn test_select_with_cte() {
        let classifier = strict();
        assert!(
            classifier
                .validate(
                    "WITH recent AS (SELECT * FROM users WHERE created_at > '2024-01-01') \
                     SELECT * FROM recent"
                )
                .is_ok()
        );
        assert!(
            classifier
                .validate(
                    "WITH a AS (SELECT 1 AS x), b AS (SELECT 2 AS y) \
                     SELECT * FROM a JOIN b ON a.x = b.y"
                )
                .is_ok()
        );
    }

    #[test]
    fn test_select_with_subqueries() {
        let classifier = strict();
        assert!(
            classifier
                .validate(
                    "SELECT * FROM users WHERE id IN \
                     (SELECT user_id FROM orders WHERE total > 1000)"
                )
                .is_ok()
        );
        assert!(
            classifier
                .validate(
                    "SELECT u.name, (SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id) \
                     FROM users u"
                )
                .is_ok()
        );
    }

    #[test]
    fn test_union_is_a_read() {
        let classifier = strict();
        assert!(
            classifier
                .validate("SELECT a FROM t1 UNION ALL SELECT b FROM t2")
                .is_ok()
        );
    }

    #[test]
    fn test_empty_query() {
        let classifier = strict();
        assert_eq!(classifier.validate(""), Err(ValidationError::EmptyQuery));
        assert_eq!(classifier.validate("  \n "), Err(ValidationError::EmptyQuery));
    }

    #[test]
    fn test_dml_rejected_with_operation() {
        let classifier = strict();
        assert_eq!(
            classifier.validate("DELETE FROM users WHERE id = 1"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Delete
            ))
        );
        assert_eq!(
            classifier.validate("INSERT INTO users (name) VALUES ('x')"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Insert
            ))
        );
        assert_eq!(
            classifier.validate("UPDATE users SET active = false"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Update
            ))
        );
    }

    #[test]
    fn test_ddl_rejected() {
        let classifier = strict();
        assert_eq!(
            classifier.validate("DROP TABLE users"),
            Err(ValidationError::DangerousOperation(DangerousOperation::Drop))
        );
        assert_eq!(
            classifier.validate("CREATE TABLE hackers (id INT)"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Create
            ))
        );
        assert_eq!(
            classifier.validate("ALTER TABLE users ADD COLUMN hacked BOOLEAN"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Alter
            ))
        );
        assert_eq!(
            classifier.validate("TRUNCATE TABLE users"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Truncate
            ))
        );
    }

    #[test]
    fn test_access_control_rejected() {
        let classifier = strict();
        assert_eq!(
            classifier.validate("GRANT SELECT ON users TO intern"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Grant
            ))
        );
    }

    #[test]
    fn test_transaction_control_rejected_via_keyword_lookup() {
        // COMMIT has no explicit match arm; the leading-keyword fallback
        // must still map it onto the taxonomy.
        let classifier = strict();
        assert_eq!(
            classifier.validate("COMMIT"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Commit
            ))
        );
    }

    #[test]
    fn test_insert_select_rejected() {
        let classifier = strict();
        assert_eq!(
            classifier.validate("INSERT INTO archive SELECT * FROM users"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Insert
            ))
        );
    }

    #[test]
    fn test_explain_is_not_a_select() {
        let classifier = strict();
        assert!(matches!(
            classifier.validate("EXPLAIN SELECT * FROM users"),
            Err(ValidationError::NotASelect { .. })
        ));
    }

    #[test]
    fn test_values_root_is_not_a_select() {
        let classifier = strict();
        assert_eq!(
            classifier.validate("VALUES (1, 2)"),
            Err(ValidationError::NotASelect {
                found: "VALUES".into()
            })
        );
    }

    #[test]
    fn test_multi_statement_rejected() {
        let classifier = strict();
        assert_eq!(
            classifier.validate("SELECT * FROM users; DROP TABLE users;"),
            Err(ValidationError::MultiStatement)
        );
        assert_eq!(
            classifier.validate("SELECT 1; SELECT 2"),
            Err(ValidationError::MultiStatement)
        );
    }

    #[test]
    fn test_trailing_semicolon_tolerated() {
        let classifier = strict();
        assert!(classifier.validate("SELECT * FROM users;").is_ok());
    }

    #[test]
    fn test_nested_danger_in_cte() {
        // Whether the dialect parses a data-modifying CTE or refuses it,
        // the lenient path must land on the DELETE either via traversal or
        // via the lexical fallback.
        let classifier = lenient();
        assert_eq!(
            classifier
                .validate("WITH evil AS (DELETE FROM users RETURNING *) SELECT * FROM evil"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Delete
            ))
        );
    }

    #[test]
    fn test_nested_danger_in_cte_strict_still_rejects() {
        let classifier = strict();
        assert!(
            classifier
                .validate("WITH evil AS (DELETE FROM users RETURNING *) SELECT * FROM evil")
                .is_err()
        );
    }

    #[test]
    fn test_dangerous_function_call() {
        let classifier = strict();
        assert_eq!(
            classifier.validate("SELECT exec('whoami')"),
            Err(ValidationError::DangerousFunctionCall {
                name: "EXEC".into()
            })
        );
    }

    #[test]
    fn test_dangerous_function_call_in_subquery() {
        let classifier = strict();
        assert!(matches!(
            classifier.validate("SELECT * FROM users WHERE id IN (SELECT exec('x'))"),
            Err(ValidationError::DangerousFunctionCall { .. })
        ));
    }

    #[test]
    fn test_ordinary_functions_accepted() {
        let classifier = strict();
        assert!(classifier.validate("SELECT UPPER(name) FROM users").is_ok());
        assert!(
            classifier
                .validate("SELECT COALESCE(email, 'none') FROM users")
                .is_ok()
        );
    }

    #[test]
    fn test_strict_mode_rejects_unparseable() {
        let classifier = strict();
        assert!(matches!(
            classifier.validate("SELEC * FORM users"),
            Err(ValidationError::ParseError(_))
        ));
    }

    #[test]
    fn test_lenient_mode_falls_back_to_lexical() {
        let classifier = lenient();
        // Unparseable but lexically clean: the fallback accepts it.
        assert!(classifier.validate("SELECT * FROM users WHERE (").is_ok());
        // Unparseable and dangerous: the fallback rejects on the keyword.
        assert_eq!(
            classifier.validate("DELETE FORM users WHERE"),
            Err(ValidationError::DangerousOperation(
                DangerousOperation::Delete
            ))
        );
    }

    #[test]
    fn test_strict_mode_is_construction_time_policy() {
        let query = "SELECT * FROM users WHERE (";
        assert!(matches!(
            strict().validate(query),
            Err(ValidationError::ParseError(_))
        ));
        assert!(lenient().validate(query).is_ok());
    }

    #[test]
    fn test_deep_nesting_accepted() {
        let classifier = strict();
        let query = "WITH a AS (SELECT * FROM users), \
                     b AS (SELECT * FROM a WHERE id IN (SELECT id FROM a)), \
                     c AS (SELECT * FROM b) \
                     SELECT *, ROW_NUMBER() OVER (ORDER BY id) FROM c";
        assert!(classifier.validate(query).is_ok());
    }

    #[test]
    fn test_idempotent() {
        let classifier = strict();
        let query = "SELECT * FROM users WHERE active = true";
        assert_eq!(classifier.validate(query), classifier.validate(query));
        let bad = "DROP TABLE users";
        assert_eq!(classifier.validate(bad), classifier.validate(bad));
    }

    #[test]
    fn test_query_too_long() {
        let classifier = strict().max_query_length(32);
        let long = "SELECT * FROM users WHERE name = 'long enough to trip the limit'";
        assert_eq!(
            classifier.validate(long),
            Err(ValidationError::QueryTooLong { max: 32 })
        );
    }

    #[test]
    fn test_comment_before_select_accepted() {
        // The parser handles comments itself; only the chaining check strips
        // them beforehand.
        let classifier = strict();
        assert!(classifier.validate("-- report\nSELECT * FROM users").is_ok());
    }
}
