//! Read-only SQL query gate.
//!
//! Inspects an untrusted SQL string and admits it for execution only if it
//! is a single, side-effect-free SELECT (CTEs and subqueries included).
//! Anything capable of mutating data, schema, or server state is rejected
//! before it can reach a database.
//!
//! Two validation paths share one keyword taxonomy: an AST-backed
//! classifier that parses the query and walks every node of the tree, and a
//! lexical fallback for when no parser is available. A third, stricter
//! allow-list guard fronts the admin analytics surface with a table
//! whitelist and an automatic LIMIT backstop.
//!
//! # Example
//!
//! ```
//! use sqlgate::QueryValidator;
//!
//! let validator = QueryValidator::default();
//!
//! assert!(validator.validate("SELECT * FROM users WHERE active = true").is_ok());
//!
//! let rejection = validator.validate("DELETE FROM users").unwrap_err();
//! assert_eq!(rejection.category(), "dangerous-operation");
//!
//! // Nested danger is caught too.
//! assert!(
//!     validator
//!         .validate("WITH evil AS (DELETE FROM users RETURNING *) SELECT * FROM evil")
//!         .is_err()
//! );
//! ```
//!
//! Validation is synchronous, stateless across calls, and free of blocking
//! I/O; a constructed validator can be shared by reference across threads.

pub mod config;
pub mod error;
pub mod executor;
pub mod keywords;
pub mod validator;

pub use config::{SqlDialect, ValidatorOptions};
pub use error::{
    ErrorBody, ExecutorError, ExecutorResult, ValidationError, ValidationResult,
    VALIDATION_FAILED_CODE,
};
pub use executor::{AllowlistExecutor, QueryExecutor, QueryResult, SafeQueryExecutor};
pub use keywords::{DangerousOperation, OperationCategory};
pub use validator::{
    AllowlistGuard, LexicalGuard, QueryRequest, QueryValidator, StatementClassifier,
};
