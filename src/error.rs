use std::path::PathBuf;

use polars::prelude::PolarsError;
use smartcore::error::Failed;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported dataset format {path:?}")]
    UnsupportedFormat { path: PathBuf },
    #[error("dataset is missing required column {column:?}")]
    MissingColumn { column: String },
    #[error("unknown column {column:?}")]
    UnknownColumn { column: String },
    #[error("feature schema mismatch: {message}")]
    SchemaMismatch { message: String },
    #[error("artifact {path:?} was trained for {found:?}, expected {expected:?}")]
    TargetMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
    #[error("artifact {path:?} decodes {target} predictions as class names, expected 0/1 indicators")]
    LabelMismatch { path: PathBuf, target: String },
    #[error("column {column:?} holds values that are not {dtype}")]
    ColumnType { column: String, dtype: String },
    #[error("value {value:?} is not in the encoder vocabulary of {field:?}")]
    UnknownCategory { field: String, value: String },
    #[error("model returned class code {code} outside its label vocabulary")]
    UnknownClass { code: i32 },
    #[error("model returned no prediction")]
    EmptyPrediction,
    #[error("{value:?} is not a valid choice for {field:?}")]
    InvalidSelection { field: String, value: String },
    #[error("{field:?} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
    #[error("model failure: {0}")]
    Model(#[from] Failed),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl AppError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        AppError::SchemaMismatch {
            message: message.into(),
        }
    }
}
