//! SQL 텍스트 → sqlparser AST
//!
//! Only read-only queries reach the planner; DML, DDL and multi-statement
//! scripts are rejected here so the planner only ever sees `Query`.

use crate::error::{MinirelError, MinirelResult};
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// SQL 파서 — sqlparser-rs
pub struct SqlParser {
    dialect: GenericDialect,
}

impl SqlParser {
    pub fn new() -> Self {
        Self {
            dialect: GenericDialect {},
        }
    }

    /// Every statement in `sql`, unfiltered.
    pub fn parse(&self, sql: &str) -> MinirelResult<Vec<Statement>> {
        Parser::parse_sql(&self.dialect, sql).map_err(|e| MinirelError::SqlParse {
            message: e.to_string(),
            sql: sql.to_string(),
        })
    }

    /// Parse text holding exactly one SELECT query.
    pub fn parse_one(&self, sql: &str) -> MinirelResult<Statement> {
        let mut statements = self.parse(sql)?;
        let statement = match statements.len() {
            1 => statements.remove(0),
            n => {
                return Err(MinirelError::SqlParse {
                    message: format!("expected one statement, found {}", n),
                    sql: sql.to_string(),
                });
            }
        };
        if matches!(statement, Statement::Query(_)) {
            return Ok(statement);
        }
        Err(MinirelError::SqlNotSupported {
            feature: statement_kind(&statement).to_string(),
            hint: "only SELECT queries are executed".to_string(),
        })
    }
}

fn statement_kind(statement: &Statement) -> &'static str {
    match statement {
        Statement::Insert(_) => "INSERT",
        Statement::Update { .. } => "UPDATE",
        Statement::Delete(_) => "DELETE",
        Statement::CreateTable(_) => "CREATE TABLE",
        Statement::Drop { .. } => "DROP",
        _ => "non-query statement",
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}
