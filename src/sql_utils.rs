// =====================================================
// SQL UTILITIES MODULE
// Identifier quoting and small SQL text helpers
// =====================================================

pub fn quote_identifier_mysql(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quotes a table reference. `db.table` is quoted part by part; any further
/// dots belong to the table name.
pub fn qualified_table_name(table: &str) -> String {
    match table.split_once('.') {
        Some((database, name)) if !database.is_empty() && !name.is_empty() => format!(
            "{}.{}",
            quote_identifier_mysql(database),
            quote_identifier_mysql(name)
        ),
        _ => quote_identifier_mysql(table),
    }
}

pub fn quote_all(columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .map(|column| quote_identifier_mysql(column))
        .collect()
}

pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

/// Splits a comma separated list, trimming blanks away.
pub fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn position_ignore_case(columns: &[String], name: &str) -> Option<usize> {
    let target = name.trim();
    columns
        .iter()
        .position(|column| column.trim().eq_ignore_ascii_case(target))
}
