use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::SourceKind;

#[derive(Debug, Error, Diagnostic)]
pub enum KiraError {
    #[error("invalid source location: {0}")]
    InvalidSource(String),

    #[error("invalid delimiter {0:?}: expected a single ASCII character")]
    InvalidDelimiter(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("{dataset} request failed: {message}")]
    SourceHttp {
        dataset: SourceKind,
        message: String,
    },

    #[error("{dataset} returned status {status}: {message}")]
    SourceStatus {
        dataset: SourceKind,
        status: u16,
        message: String,
    },

    #[error("failed to decode UniProt XML: {0}")]
    UniprotXml(String),

    #[error("failed to decode STRING links: {0}")]
    StringTsv(String),

    #[error("failed to decode OpenTargets targets: {0}")]
    TargetsJson(String),

    #[error("failed to decode OpenTargets parquet: {0}")]
    TargetsParquet(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("invalid row in table {table}: {message}")]
    InvalidRow { table: &'static str, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl KiraError {
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            KiraError::SourceHttp { .. } | KiraError::SourceStatus { .. }
        )
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            KiraError::InvalidSource(_)
                | KiraError::InvalidDelimiter(_)
                | KiraError::ConfigRead(_)
                | KiraError::ConfigParse(_)
        )
    }
}

pub(crate) fn db_err(err: rusqlite::Error) -> KiraError {
    KiraError::Database(err.to_string())
}
