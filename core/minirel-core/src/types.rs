//! Core row types — Tuple, Header, ColumnRef
//!
//! A `Tuple` is a fixed-width row of `i32` values. A `Header` describes an
//! operator's output schema as two parallel sequences (table alias, column
//! name) and resolves column references to positions.

use crate::error::{MinirelError, MinirelResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 고정 폭 정수 튜플
///
/// Ordering is lexicographic over the fields, which is the order external
/// sort falls back to when every column is part of the key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tuple {
    values: Vec<i32>,
}

impl Tuple {
    pub fn new(values: Vec<i32>) -> Self {
        Self { values }
    }

    /// Number of fields.
    pub fn width(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, index: usize) -> i32 {
        self.values[index]
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    pub fn into_values(self) -> Vec<i32> {
        self.values
    }

    /// Concatenate `self` (left fields) with `right` (right fields).
    pub fn join(&self, right: &Tuple) -> Tuple {
        let mut values = Vec::with_capacity(self.values.len() + right.values.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&right.values);
        Tuple { values }
    }

    /// Keep only the listed positions, in the listed order.
    pub fn project(&self, indices: &[usize]) -> Tuple {
        Tuple {
            values: indices.iter().map(|&i| self.values[i]).collect(),
        }
    }
}

impl From<Vec<i32>> for Tuple {
    fn from(values: Vec<i32>) -> Self {
        Tuple::new(values)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for value in &self.values {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{}", value)?;
            first = false;
        }
        Ok(())
    }
}

/// A possibly-qualified column reference, e.g. `S.A` or `A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// 연산자 출력 스키마 — (테이블 별칭, 컬럼 이름) 병렬 시퀀스
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    tables: Vec<String>,
    columns: Vec<String>,
}

impl Header {
    /// Build a header from parallel sequences.
    pub fn new(tables: Vec<String>, columns: Vec<String>) -> MinirelResult<Self> {
        if tables.len() != columns.len() {
            return Err(MinirelError::Schema(format!(
                "header has {} table ids but {} column names",
                tables.len(),
                columns.len()
            )));
        }
        Ok(Self { tables, columns })
    }

    /// Header for a base relation: every column qualified by `alias`.
    pub fn for_table<S: AsRef<str>>(alias: &str, columns: &[S]) -> Self {
        Self {
            tables: vec![alias.to_string(); columns.len()],
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn table(&self, index: usize) -> &str {
        &self.tables[index]
    }

    pub fn column(&self, index: usize) -> &str {
        &self.columns[index]
    }

    pub fn column_ref(&self, index: usize) -> ColumnRef {
        let table = &self.tables[index];
        ColumnRef {
            table: if table.is_empty() {
                None
            } else {
                Some(table.clone())
            },
            name: self.columns[index].clone(),
        }
    }

    /// Distinct table identifiers in first-appearance order.
    pub fn table_ids(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for table in &self.tables {
            if !table.is_empty() && !seen.contains(&table.as_str()) {
                seen.push(table);
            }
        }
        seen
    }

    /// First index whose name matches and whose table matches (if one is
    /// required). Returns `None` when nothing matches.
    pub fn find(&self, table: Option<&str>, name: &str) -> Option<usize> {
        (0..self.columns.len()).find(|&i| {
            self.columns[i] == name
                && match table {
                    Some(t) if !t.is_empty() => self.tables[i] == t,
                    _ => true,
                }
        })
    }

    /// Resolve a column reference; an unresolved reference is a schema error.
    pub fn resolve(&self, column: &ColumnRef) -> MinirelResult<usize> {
        self.find(column.table.as_deref(), &column.name)
            .ok_or_else(|| MinirelError::ColumnNotFound {
                column: column.to_string(),
                schema: self.to_string(),
            })
    }

    /// Resolve each reference in order.
    pub fn resolve_all(&self, columns: &[ColumnRef]) -> MinirelResult<Vec<usize>> {
        columns.iter().map(|c| self.resolve(c)).collect()
    }

    /// Header of a join output: left columns then right columns.
    pub fn join(&self, right: &Header) -> Header {
        let mut tables = self.tables.clone();
        tables.extend(right.tables.iter().cloned());
        let mut columns = self.columns.clone();
        columns.extend(right.columns.iter().cloned());
        Header { tables, columns }
    }

    /// Header restricted to the given positions.
    pub fn project(&self, indices: &[usize]) -> Header {
        Header {
            tables: indices.iter().map(|&i| self.tables[i].clone()).collect(),
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.columns.len() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if self.tables[i].is_empty() {
                f.write_str(&self.columns[i])?;
            } else {
                write!(f, "{}.{}", self.tables[i], self.columns[i])?;
            }
        }
        Ok(())
    }
}
