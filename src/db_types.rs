// =====================================================
// COMMON DATABASE TYPES AND STRUCTURES
// =====================================================

use crate::error::StoreError;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// A single nullable cell, rendered as text.
pub type CellValue = Option<String>;

// --- Bound Statement Arguments ---
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlArg {
    Text(String),
    Int(u64),
}

impl fmt::Display for SqlArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlArg::Text(value) => write!(f, "{:?}", value),
            SqlArg::Int(value) => write!(f, "{}", value),
        }
    }
}

// --- Parameterized Statement ---
/// SQL text plus its ordered placeholder arguments. Row values only ever
/// travel through `args`; `sql` holds quoted identifiers and placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<SqlArg>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: Vec<SqlArg>) -> Self {
        Self {
            sql: sql.into(),
            args,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args = self
            .args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "{} -- args=[{}]", self.sql, args)
    }
}

// --- Fetched Batch ---
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedBatch {
    /// Decoded rows, cells in SELECT column order.
    pub rows: Vec<Vec<CellValue>>,
    /// Rows the server returned but that could not be decoded.
    pub skipped: usize,
    /// Undecodable rows after the last decoded one. Keyset paging reads them
    /// again on the next page because they sit past the cursor.
    pub trailing_skipped: usize,
}

impl FetchedBatch {
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn push_row(&mut self, row: Vec<CellValue>) {
        self.rows.push(row);
        self.trailing_skipped = 0;
    }

    pub fn push_skipped(&mut self) {
        self.skipped += 1;
        self.trailing_skipped += 1;
    }

    /// Number of rows the server returned, decodable or not.
    pub fn returned(&self) -> usize {
        self.rows.len() + self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.returned() == 0
    }
}

// --- Row Store ---
/// The relational boundary the table scan engine talks to.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn fetch(&self, statement: &Statement) -> Result<FetchedBatch, StoreError>;

    /// Runs a write statement, returning the affected row count.
    async fn execute(&self, statement: &Statement, timeout: Duration) -> Result<u64, StoreError>;

    /// Column names of `table` in ordinal order.
    async fn table_columns(&self, table: &str) -> Result<Vec<String>, StoreError>;

    async fn count_rows(&self, table: &str) -> Result<u64, StoreError>;
}

#[cfg(test)]
mod tests;
