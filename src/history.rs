use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::ValueEnum;
use log::{debug, info};
use polars::frame::DataFrame;
use polars::prelude::{CsvReader, PolarsResult, SerReader};
use polars_io::parquet::ParquetWriter;

use crate::error::HistoryError;
use crate::records::LogEntry;

/// Rows shown in the recent predictions panel.
pub const RECENT_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Parquet,
}

fn read_log(path: &Path) -> PolarsResult<DataFrame> {
    let file = File::open(path)?;

    CsvReader::new(file)
        .has_header(true)
        .with_dtypes(Option::from(Arc::new(LogEntry::raw_schema())))
        .finish()
}

/// Last `rows` logged predictions, or `None` when nothing has been logged yet.
pub async fn recent_predictions<P: AsRef<Path>>(
    path: P,
    rows: usize,
) -> Result<Option<DataFrame>, HistoryError> {
    let path = path.as_ref();
    if !tokio::fs::try_exists(path).await? {
        debug!("no prediction log at {:?}", path);
        return Ok(None);
    }

    let df = read_log(path)?;
    Ok(Some(df.tail(Some(rows))))
}

/// Writes the full log to `dest`. CSV exports are a byte copy of the log.
pub async fn export_log<P: AsRef<Path>>(
    path: P,
    dest: PathBuf,
    format: ExportFormat,
) -> Result<PathBuf, HistoryError> {
    let path = path.as_ref();
    if !tokio::fs::try_exists(path).await? {
        return Err(HistoryError::MissingLog {
            path: path.to_path_buf(),
        });
    }

    match format {
        ExportFormat::Csv => {
            let bytes = tokio::fs::copy(path, &dest).await?;
            info!("exported {} bytes of prediction log to {:?}", bytes, dest);
        }
        ExportFormat::Parquet => {
            let mut df = read_log(path)?;
            let mut file = File::create(&dest)?;
            ParquetWriter::new(&mut file).finish(&mut df)?;
            info!("exported {} log rows to {:?}", df.height(), dest);
        }
    }

    Ok(dest)
}
