pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod logger;
pub mod pipeline;
pub mod records;
pub mod scoring;
pub mod validation;

pub use app::{Presenter, Session, SubmitOutcome, TerminalPresenter};
pub use error::AppError;
pub use logger::PredictionLogger;
pub use pipeline::PipelineModel;
pub use records::{LogEntry, PatientRecord};
pub use scoring::{Assessment, FeatureImportance, RiskClass, Scorer};
pub use validation::validate;
