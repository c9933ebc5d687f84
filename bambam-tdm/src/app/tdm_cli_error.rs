use crate::model::TdmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TdmCliError {
    #[error("failure reading run configuration: {0}")]
    ConfigurationError(String),
    #[error(transparent)]
    TdmError {
        #[from]
        source: TdmError,
    },
    #[error("failure reading or writing file: {source}")]
    StdIoError {
        #[from]
        source: std::io::Error,
    },
    #[error("failure reading or writing CSV: {source}")]
    CsvError {
        #[from]
        source: csv::Error,
    },
    #[error("failure encoding or decoding JSON: {source}")]
    SerdeJsonError {
        #[from]
        source: serde_json::Error,
    },
}
