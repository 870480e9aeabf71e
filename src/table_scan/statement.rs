// =====================================================
// STATEMENT BUILDERS
// Pure (table, columns, predicate kind) -> Statement functions.
// Identifiers are quoted; row values are always bound.
// =====================================================

use crate::db_types::{CellValue, SqlArg, Statement};
use crate::sql_utils::{placeholders, qualified_table_name, quote_all, quote_identifier_mysql};
use crate::table_scan::transform::ChangedSet;

/// How an UPDATE locates the row it rewrites.
#[derive(Debug, Clone, Copy)]
pub enum UpdateTarget<'a> {
    /// Primary or composite key values, in key column order.
    Key {
        columns: &'a [String],
        values: &'a [CellValue],
    },
    /// Configured identify-by columns of a table without a usable key.
    IdentifyBy {
        columns: &'a [String],
        values: &'a [CellValue],
    },
    /// Every column of the row; the UPDATE is capped with `LIMIT 1`.
    WholeRow {
        columns: &'a [String],
        values: &'a [CellValue],
    },
}

impl UpdateTarget<'_> {
    fn parts(&self) -> (&[String], &[CellValue]) {
        match self {
            UpdateTarget::Key { columns, values }
            | UpdateTarget::IdentifyBy { columns, values }
            | UpdateTarget::WholeRow { columns, values } => (*columns, *values),
        }
    }

    fn single_row_cap(&self) -> bool {
        matches!(self, UpdateTarget::WholeRow { .. })
    }
}

/// `SELECT keys..., columns... FROM t [WHERE (keys) > (?,..)] ORDER BY keys LIMIT ?`
///
/// `cursor` is `None` on the first page; the WHERE clause is then omitted.
pub fn build_keyset_select(
    table: &str,
    key_columns: &[String],
    columns: &[String],
    cursor: Option<&[String]>,
    limit: usize,
) -> Statement {
    let quoted_keys = quote_all(key_columns).join(",");
    let selected = quote_all(&[key_columns, columns].concat()).join(",");

    let mut sql = format!("SELECT {} FROM {}", selected, qualified_table_name(table));
    let mut args = Vec::with_capacity(key_columns.len() + 1);

    if let Some(values) = cursor.filter(|values| !values.is_empty()) {
        sql.push_str(&format!(
            " WHERE ({}) > ({})",
            quoted_keys,
            placeholders(values.len())
        ));
        args.extend(values.iter().cloned().map(SqlArg::Text));
    }

    sql.push_str(&format!(" ORDER BY {} LIMIT ?", quoted_keys));
    args.push(SqlArg::Int(limit as u64));

    Statement::new(sql, args)
}

/// `SELECT all_columns FROM t LIMIT ? OFFSET ?`
pub fn build_offset_select(table: &str, all_columns: &[String], limit: usize, offset: u64) -> Statement {
    Statement::new(
        format!(
            "SELECT {} FROM {} LIMIT ? OFFSET ?",
            quote_all(all_columns).join(","),
            qualified_table_name(table)
        ),
        vec![SqlArg::Int(limit as u64), SqlArg::Int(offset)],
    )
}

pub fn build_count(table: &str) -> Statement {
    Statement::new(
        format!("SELECT COUNT(*) FROM {}", qualified_table_name(table)),
        Vec::new(),
    )
}

/// Builds the UPDATE for one row, or `None` when nothing changed.
///
/// A NULL addressing value becomes `col IS NULL` with no bound argument.
pub fn build_update(table: &str, changed: &ChangedSet, target: UpdateTarget<'_>) -> Option<Statement> {
    if changed.is_empty() {
        return None;
    }

    let mut args = Vec::with_capacity(changed.len() + 4);
    let set_clause = changed
        .iter()
        .map(|(column, value)| {
            args.push(SqlArg::Text(value.to_string()));
            format!("{} = ?", quote_identifier_mysql(column))
        })
        .collect::<Vec<String>>()
        .join(", ");

    let (columns, values) = target.parts();
    let where_clause = columns
        .iter()
        .zip(values)
        .map(|(column, value)| match value {
            Some(value) => {
                args.push(SqlArg::Text(value.clone()));
                format!("{} = ?", quote_identifier_mysql(column))
            }
            None => format!("{} IS NULL", quote_identifier_mysql(column)),
        })
        .collect::<Vec<String>>()
        .join(" AND ");

    let mut sql = format!(
        "UPDATE {} SET {} WHERE {}",
        qualified_table_name(table),
        set_clause,
        where_clause
    );
    if target.single_row_cap() {
        sql.push_str(" LIMIT 1");
    }

    Some(Statement::new(sql, args))
}
