use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use log::debug;

use crate::error::LogError;
use crate::records::{LogEntry, PatientRecord};

/// Append-only CSV log of scored records.
///
/// The first write creates the file together with its header; later writes
/// append data rows only. Writes through one logger are serialized, but
/// nothing coordinates separate processes sharing the same file.
#[derive(Debug)]
pub struct PredictionLogger {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl PredictionLogger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PredictionLogger {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry stamped with the current UTC time.
    pub fn log(
        &self,
        record: &PatientRecord,
        prediction: u8,
        probability: f64,
    ) -> Result<(), LogError> {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.log_at(record, prediction, probability, timestamp)
    }

    pub fn log_at(
        &self,
        record: &PatientRecord,
        prediction: u8,
        probability: f64,
        timestamp: String,
    ) -> Result<(), LogError> {
        let entry = LogEntry::new(record, prediction, probability, timestamp);
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let fresh = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| LogError::Io {
                path: self.path.clone(),
                source,
            })?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(fresh)
            .from_writer(file);
        writer.serialize(&entry)?;
        writer.flush().map_err(|source| LogError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(
            "appended prediction {} (p={:.4}) to {:?}{}",
            prediction,
            probability,
            self.path,
            if fresh { " with header" } else { "" }
        );
        Ok(())
    }
}
