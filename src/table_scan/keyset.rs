use super::statement::{build_keyset_select, UpdateTarget};
use super::TableScan;
use crate::db_types::CellValue;
use std::fmt;

/// Key tuple of the last row handed out. `None` means "from the beginning".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeysetCursor {
    last: Option<Vec<String>>,
}

/// Why keyset paging cannot continue safely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorStall {
    /// A key component of the last row is NULL; the tuple comparison would
    /// be engine-defined.
    NullComponent { column: String },
    /// The last key equals the previous cursor, so the next page would repeat.
    NotAdvanced,
    /// The server returned rows but none of them could be decoded.
    NoDecodableRows,
}

impl fmt::Display for CursorStall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorStall::NullComponent { column } => {
                write!(f, "key column `{}` is NULL in the last row of a batch", column)
            }
            CursorStall::NotAdvanced => f.write_str("key cursor did not advance"),
            CursorStall::NoDecodableRows => f.write_str("no row of the batch could be decoded"),
        }
    }
}

impl KeysetCursor {
    pub fn values(&self) -> Option<&[String]> {
        self.last.as_deref()
    }

    pub fn is_unset(&self) -> bool {
        self.last.is_none()
    }

    /// Moves the cursor to `key`, the key tuple of a batch's last row.
    pub fn advance(&mut self, key_columns: &[String], key: &[CellValue]) -> Result<(), CursorStall> {
        let mut next = Vec::with_capacity(key_columns.len());
        for (column, value) in key_columns.iter().zip(key) {
            match value {
                Some(value) => next.push(value.clone()),
                None => {
                    return Err(CursorStall::NullComponent {
                        column: column.clone(),
                    })
                }
            }
        }
        if self.last.as_ref() == Some(&next) {
            return Err(CursorStall::NotAdvanced);
        }
        self.last = Some(next);
        Ok(())
    }
}

pub(super) enum KeysetOutcome {
    Exhausted,
    Unreliable(CursorStall),
}

pub(super) async fn run(scan: &mut TableScan<'_>) -> KeysetOutcome {
    let config = scan.config;
    let key_count = config.key_columns.len();
    let mut cursor = KeysetCursor::default();
    let mut carried_skipped = 0;

    loop {
        let statement = build_keyset_select(
            &config.table,
            &config.key_columns,
            &config.columns,
            cursor.values(),
            config.batch_size,
        );
        let batch = scan.fetch_page(&statement, carried_skipped).await;
        if batch.is_empty() {
            return KeysetOutcome::Exhausted;
        }
        carried_skipped = batch.trailing_skipped;

        for row in &batch.rows {
            let (key, data) = row.split_at(key_count.min(row.len()));
            let cells = config
                .columns
                .iter()
                .zip(data)
                .map(|(column, value)| (column.as_str(), value.as_deref()));
            let target = UpdateTarget::Key {
                columns: &config.key_columns,
                values: key,
            };
            scan.process_row(cells, target).await;
        }

        // Advancement follows scan position, not update outcome.
        let Some(last) = batch.rows.last() else {
            return KeysetOutcome::Unreliable(CursorStall::NoDecodableRows);
        };
        let last_key = &last[..key_count.min(last.len())];
        if let Err(stall) = cursor.advance(&config.key_columns, last_key) {
            return KeysetOutcome::Unreliable(stall);
        }
        log::debug!("[{}] cursor -> {:?}", config.table, cursor.values());
    }
}
