use thiserror::Error;

/// Every failure the crate surfaces. Lenient parsers in [`crate::conv`] never
/// produce these; they log and fall back to zero instead.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("settings error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[cfg(feature = "xlsx")]
    #[error("XLSX error: {0}")]
    Xlsx(#[from] xlsxwriter::XlsxError),

    #[error("cannot parse [{text}] to {target}: {reason}")]
    Conv {
        text: String,
        target: &'static str,
        reason: String,
    },

    #[error("unknown type name `{0}`")]
    Type(String),

    #[error("{table}: row length {actual} < {expected}")]
    RowLength {
        table: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate `{column}` value [{value}] in data rows {first} and {row}")]
    Duplicate {
        column: String,
        value: String,
        first: usize,
        row: usize,
    },

    #[error("missing column `{0}`")]
    MissingColumn(String),

    #[error("no data found for `{0}`")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl TableError {
    pub(crate) fn conv(text: &str, target: &'static str, reason: impl ToString) -> Self {
        Self::Conv {
            text: text.to_string(),
            target,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TableError>;
