use std::path::PathBuf;

use env_logger::{Builder, Env};
use log::LevelFilter;

use crate::cli::{Cli, Command};
use crate::history::RECENT_ROWS;

pub const DEFAULT_MODEL_PATH: &str = "model_pipeline.json";
pub const DEFAULT_LOG_PATH: &str = "predictions_log.csv";

/// Environment variable holding an `env_logger` filter that overrides `-v`.
pub const LOG_FILTER_ENV: &str = "HEART_RISK_LOG";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub log_path: PathBuf,
    /// Rows shown by `history`.
    pub history_rows: usize,
    pub verbosity: u8,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            history_rows: RECENT_ROWS,
            verbosity: 0,
        }
    }
}

impl From<&Cli> for AppConfig {
    fn from(cli: &Cli) -> Self {
        AppConfig {
            model_path: cli.model.clone(),
            log_path: cli.log_file.clone(),
            history_rows: match cli.command {
                Command::History { rows: Some(rows) } => rows,
                _ => RECENT_ROWS,
            },
            verbosity: cli.verbose,
        }
    }
}

impl AppConfig {
    pub fn level_filter(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

pub fn init_logging(config: &AppConfig) {
    let env = Env::new().filter(LOG_FILTER_ENV);
    Builder::new()
        .filter(Some("heart_risk"), config.level_filter())
        .parse_env(env)
        .init();
}
