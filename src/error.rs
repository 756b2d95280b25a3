use std::path::PathBuf;

use polars::prelude::PolarsError;
use smartcore::error::Failed;
use thiserror::Error;

/// Failure to load the scoring artifact at startup.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("cannot open model artifact {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed model artifact {path:?}: {source}")]
    Format {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("expected a binary classifier, found {0} coefficient rows")]
    NotBinary(usize),
    #[error("model expects {expected} features but the preprocessor yields {actual}")]
    FeatureCount { expected: usize, actual: usize },
    #[error(transparent)]
    Schema(#[from] ScoringError),
}

/// Failure while scoring a single record.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("unknown input column {0:?}")]
    Schema(String),
    #[error("classifier returned unexpected label {0}")]
    Label(i32),
    #[error("classifier failure: {0}")]
    Classifier(#[from] Failed),
}

/// Failure while appending to the prediction log.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("cannot write prediction log {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot encode log row: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure on the log read/export path.
#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("no prediction log at {path:?}")]
    MissingLog { path: PathBuf },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Log(#[from] LogError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("cannot write output: {0}")]
    Output(#[from] std::io::Error),
}
