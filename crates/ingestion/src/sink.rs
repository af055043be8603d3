//! Append-only per-bank record files

use crate::errors::IngestionError;
use reviewforge_common::records::ReviewRecord;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Durably adds records for a bank; prior records are never rewritten
pub trait RecordSink: Send {
    fn append(&mut self, source_id: &str, records: &[ReviewRecord]) -> Result<(), IngestionError>;
}

/// Writes `<out_dir>/<source_id>_reviews.csv`
#[derive(Debug, Clone)]
pub struct CsvAppendSink {
    out_dir: PathBuf,
}

impl CsvAppendSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn path_for(&self, source_id: &str) -> PathBuf {
        source_file(&self.out_dir, source_id)
    }
}

/// Per-bank CSV location, shared with the merger
pub fn source_file(out_dir: &Path, source_id: &str) -> PathBuf {
    out_dir.join(format!("{}_reviews.csv", source_id))
}

impl RecordSink for CsvAppendSink {
    fn append(&mut self, source_id: &str, records: &[ReviewRecord]) -> Result<(), IngestionError> {
        if records.is_empty() {
            return Ok(());
        }

        fs::create_dir_all(&self.out_dir)?;
        let path = self.path_for(source_id);

        // Header only goes into a brand-new (or zero-length) file.
        let needs_header = discard_partial_row(&path)? == 0;

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);

        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Cut an interrupted trailing row so new rows start on a record boundary
///
/// Returns the file length afterwards; a missing file is length 0.
fn discard_partial_row(path: &Path) -> io::Result<u64> {
    let mut file = match OpenOptions::new().read(true).write(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(0);
    }

    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    if last[0] == b'\n' {
        return Ok(len);
    }

    let mut bytes = Vec::with_capacity(len as usize);
    file.seek(SeekFrom::Start(0))?;
    file.read_to_end(&mut bytes)?;
    let keep = bytes
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |i| i as u64 + 1);

    file.set_len(keep)?;
    file.sync_all()?;
    warn!(
        path = %path.display(),
        dropped_bytes = len - keep,
        "Discarded partial row left by an interrupted write"
    );

    Ok(keep)
}
