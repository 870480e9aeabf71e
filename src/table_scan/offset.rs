use super::statement::{build_offset_select, UpdateTarget};
use super::TableScan;
use crate::db_types::CellValue;
use crate::sql_utils::position_ignore_case;

/// Scans `all_columns` with LIMIT/OFFSET paging. Rows are addressed by
/// `identify_by` when given, otherwise by whole-row equality.
pub(super) async fn run(scan: &mut TableScan<'_>, all_columns: &[String], identify_by: &[String]) {
    let config = scan.config;

    let transform_indices = config
        .columns
        .iter()
        .map(|column| (column.as_str(), position_ignore_case(all_columns, column)))
        .collect::<Vec<_>>();
    let identify_indices = identify_by
        .iter()
        .filter_map(|column| position_ignore_case(all_columns, column))
        .collect::<Vec<usize>>();
    let identify_columns = identify_indices
        .iter()
        .map(|&index| all_columns[index].clone())
        .collect::<Vec<String>>();

    let mut offset = 0u64;
    loop {
        let statement = build_offset_select(&config.table, all_columns, config.batch_size, offset);
        // Pages never overlap here, so nothing is carried between them.
        let batch = scan.fetch_page(&statement, 0).await;
        if batch.is_empty() {
            return;
        }

        for row in &batch.rows {
            let cells = transform_indices.iter().map(|(column, index)| {
                let value = index.and_then(|index| row.get(index)).and_then(|value| value.as_deref());
                (*column, value)
            });

            let identity_values: Vec<CellValue>;
            let target = if identify_columns.is_empty() {
                UpdateTarget::WholeRow {
                    columns: all_columns,
                    values: row,
                }
            } else {
                identity_values = identify_indices
                    .iter()
                    .map(|&index| row.get(index).cloned().flatten())
                    .collect();
                UpdateTarget::IdentifyBy {
                    columns: &identify_columns,
                    values: &identity_values,
                }
            };

            scan.process_row(cells, target).await;
        }

        // Advance by what the server actually returned so a short final
        // page stays correct.
        offset += batch.returned() as u64;
    }
}
