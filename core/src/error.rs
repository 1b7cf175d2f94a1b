use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Spreadsheet read error: {0}")]
    SpreadsheetRead(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    SpreadsheetWrite(String),

    #[error("Unrecognized input file '{file_name}'; expected one of {expected:?}")]
    UnknownInputFile {
        file_name: String,
        expected: Vec<String>,
    },

    #[error("Input '{table}' has not been loaded for run '{run_id}'")]
    MissingInput { run_id: String, table: &'static str },

    #[error("Column '{column}' not found in {file}")]
    MissingColumn { file: String, column: String },

    #[error("Invalid value {value:?} in column '{column}' at row {row}")]
    InvalidCell {
        column: String,
        row: usize,
        value: String,
    },

    #[error("No qualifying transactions for {metric}")]
    EmptyCohort { metric: &'static str },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type MetricsResult<T> = Result<T, MetricsError>;
