//! Configuration types for the validators.

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{
    Dialect, DuckDbDialect, GenericDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect,
    SQLiteDialect,
};

/// SQL dialect used by the AST validation path.
///
/// The dialect affects which syntax parses, not the danger taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    #[default]
    DuckDb,
    Postgres,
    MySql,
    Sqlite,
    Mssql,
    Generic,
}

impl SqlDialect {
    /// Parse a dialect name from a string.
    ///
    /// Accepts various common aliases for each dialect.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "duckdb" => Some(Self::DuckDb),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "mysql" | "mariadb" => Some(Self::MySql),
            "sqlite" | "sqlite3" => Some(Self::Sqlite),
            "mssql" | "sqlserver" | "sql_server" => Some(Self::Mssql),
            "generic" | "ansi" => Some(Self::Generic),
            _ => None,
        }
    }

    pub(crate) fn parser_dialect(&self) -> Box<dyn Dialect> {
        match self {
            Self::DuckDb => Box::new(DuckDbDialect {}),
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::MySql => Box::new(MySqlDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
            Self::Mssql => Box::new(MsSqlDialect {}),
            Self::Generic => Box::new(GenericDialect {}),
        }
    }
}

impl TryFrom<&str> for SqlDialect {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s).ok_or_else(|| {
            format!(
                "Unknown SQL dialect: '{s}'. Valid dialects: duckdb, postgres, mysql, \
                 sqlite, mssql, generic"
            )
        })
    }
}

/// Options for the AST validation path.
///
/// `strict_mode` is a caller-level policy: when on, unparseable queries are
/// rejected outright; when off, they fall back to the lexical path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorOptions {
    pub dialect: SqlDialect,
    pub strict_mode: bool,
    pub max_query_length: usize,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::default(),
            strict_mode: true,
            max_query_length: 10_000,
        }
    }
}

impl ValidatorOptions {
    pub fn new() -> Self {
        Self::default()
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
        self
    }
}
