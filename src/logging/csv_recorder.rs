//! CSV Signal Recorder
//!
//! Appends trade actions to a CSV file (`signals.csv` by default).

use super::recorder::{RecordError, SignalRecord, SignalRecorder};
use async_trait::async_trait;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Append-only CSV recorder
///
/// Uses `spawn_blocking` to avoid blocking the async runtime during file I/O.
pub struct CsvRecorder {
    file_path: Arc<PathBuf>,
    /// Mutex to serialize writes and track header state
    state: Arc<Mutex<CsvState>>,
}

struct CsvState {
    header_written: bool,
}

impl CsvRecorder {
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path: Arc::new(file_path),
            state: Arc::new(Mutex::new(CsvState {
                header_written: false,
            })),
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.file_path
    }
}

#[async_trait]
impl SignalRecorder for CsvRecorder {
    async fn record(&self, record: &SignalRecord) -> Result<(), RecordError> {
        let file_path = Arc::clone(&self.file_path);
        let state = Arc::clone(&self.state);
        let record = record.clone();

        tokio::task::spawn_blocking(move || {
            let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());

            if !guard.header_written {
                let needs_header = std::fs::metadata(&*file_path)
                    .map(|m| m.len() == 0)
                    .unwrap_or(true);
                if !needs_header {
                    guard.header_written = true;
                }
            }

            if let Some(parent) = file_path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&*file_path)?;
            let mut writer = csv::WriterBuilder::new()
                .has_headers(!guard.header_written)
                .from_writer(file);
            writer.serialize(&record)?;
            writer.flush()?;
            guard.header_written = true;

            Ok::<(), RecordError>(())
        })
        .await
        .map_err(|e| RecordError::Io(std::io::Error::other(e)))??;

        Ok(())
    }
}
