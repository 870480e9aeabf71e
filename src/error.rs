// =====================================================
// ERROR TYPES
// Setup-phase failures surface as errors; steady-state
// scan failures are logged by the engine and never reach here.
// =====================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradifyError {
    #[error("invalid scan config for table `{table}`: {reason}")]
    InvalidScanConfig { table: String, reason: String },

    #[error("invalid dsn: {0}")]
    InvalidDsn(String),

    #[error("failed to open database: {0}")]
    Connect(String),

    #[error("database ping failed: {0}")]
    Ping(String),

    #[error("failed to read columns of table `{table}`: {source}")]
    Introspection {
        table: String,
        #[source]
        source: StoreError,
    },

    #[error("table `{0}` has no columns")]
    NoColumns(String),

    #[error("column `{column}` does not exist in table `{table}`")]
    UnknownColumn { table: String, column: String },

    #[error("table {table}: {source}")]
    Table {
        table: String,
        #[source]
        source: Box<TradifyError>,
    },

    #[error("table task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failures raised by a [`crate::db_types::RowStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query error: {0}")]
    Query(String),

    #[error("statement timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("row decode error: {0}")]
    Decode(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Decode(error.to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}
