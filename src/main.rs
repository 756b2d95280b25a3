use std::io;
use std::time::Instant;

use clap::Parser;
use log::debug;
use sysinfo::{get_current_pid, ProcessExt, System, SystemExt};

use heart_risk::cli::{Cli, Command};
use heart_risk::config::{init_logging, AppConfig};
use heart_risk::history::{export_log, recent_predictions};
use heart_risk::scoring::{top_importances, TOP_FEATURES};
use heart_risk::{AppError, PipelineModel, Presenter, PredictionLogger, Scorer, Session, TerminalPresenter};

/// Resident memory of this process in bytes, or 0 when it cannot be read.
fn monitor_memory() -> u64 {
    let mut system = System::new();
    match get_current_pid() {
        Ok(pid) => {
            system.refresh_process(pid);
            system.process(pid).map(|p| p.memory()).unwrap_or(0)
        }
        Err(_) => 0,
    }
}

async fn run(command: Command, config: &AppConfig) -> Result<(), AppError> {
    let mut presenter = TerminalPresenter::new(io::stdout());

    match command {
        Command::Predict(form) => {
            let model = PipelineModel::load(&config.model_path)?;
            presenter.model_summary(model.test_accuracy())?;
            let session = Session::new(model, PredictionLogger::new(&config.log_path));
            let outcome = session.submit(&form.record(), &mut presenter)?;
            debug!("{:?} (log {:?})", outcome, session.logger().path());
        }
        Command::History { .. } => {
            let recent = recent_predictions(&config.log_path, config.history_rows).await?;
            presenter.recent(recent)?;
        }
        Command::Export { output, format } => {
            let dest = export_log(&config.log_path, output, format).await?;
            presenter.exported(&dest)?;
        }
        Command::Model => {
            let model = PipelineModel::load(&config.model_path)?;
            presenter.model_summary(model.test_accuracy())?;
            match model.feature_importances() {
                Some(importances) => {
                    presenter.importances(&top_importances(importances, TOP_FEATURES))?
                }
                None => presenter.no_importances()?,
            }
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    let start_time = Instant::now();
    let start_memory = monitor_memory();

    let cli = Cli::parse();
    let config = AppConfig::from(&cli);
    init_logging(&config);

    debug!("Arguments {:#?}", cli);

    run(cli.command, &config).await?;

    let end_memory = monitor_memory();
    debug!(
        "finished in {:?}, memory delta {} bytes",
        start_time.elapsed(),
        end_memory.saturating_sub(start_memory)
    );

    Ok(())
}
