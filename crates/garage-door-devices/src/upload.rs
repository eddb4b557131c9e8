// crates/garage-door-devices/src/upload.rs
// ============================================================================
// Module: Photo Uploaders
// Description: Folder-copy and log-only upload adapters.
// Purpose: Deliver each transition's photo batch somewhere a human can browse.
// Dependencies: garage-door-core, serde_json, std, tracing
// ============================================================================

//! ## Overview
//! [`DirectoryUploader`] copies every file into
//! `<destination>/<source parent dir name>/<file name>`, which keeps the
//! date partitioning of the capture directory. [`LogUploader`] writes one JSON
//! line per batch and does not move any bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use garage_door_core::UploadError;
use garage_door_core::Uploader;
use serde_json::json;
use tracing::info;

// ============================================================================
// SECTION: Directory Uploader
// ============================================================================

/// Uploader copying photos into a destination directory tree.
#[derive(Debug, Clone)]
pub struct DirectoryUploader {
    /// Destination root.
    destination: PathBuf,
}

impl DirectoryUploader {
    /// Creates an uploader rooted at `destination`.
    #[must_use]
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    /// Returns the destination path for `file`.
    fn target_for(&self, file: &Path) -> Result<PathBuf, UploadError> {
        let name = file
            .file_name()
            .ok_or_else(|| UploadError::Source(format!("{} has no file name", file.display())))?;
        let partition = file.parent().and_then(Path::file_name);
        Ok(match partition {
            Some(partition) => self.destination.join(partition).join(name),
            None => self.destination.join(name),
        })
    }
}

impl Uploader for DirectoryUploader {
    fn upload(&self, files: &[PathBuf]) -> Result<(), UploadError> {
        for file in files {
            if !file.is_file() {
                return Err(UploadError::Source(format!("{} is not a file", file.display())));
            }
            let target = self.target_for(file)?;
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    UploadError::UploadFailed(format!("{}: {err}", parent.display()))
                })?;
            }
            std::fs::copy(file, &target).map_err(|err| {
                UploadError::UploadFailed(format!("{} -> {}: {err}", file.display(), target.display()))
            })?;
        }
        info!(count = files.len(), destination = %self.destination.display(), "uploaded photos");
        Ok(())
    }
}

// ============================================================================
// SECTION: Log Uploader
// ============================================================================

/// Uploader that records batches as JSON lines.
pub struct LogUploader<W: Write + Send> {
    /// Output writer for batch records.
    writer: Mutex<W>,
}

impl<W: Write + Send> LogUploader<W> {
    /// Creates a log uploader writing to `writer`.
    pub const fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the uploader and returns its writer.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::UploadFailed`] when the writer mutex is poisoned.
    pub fn into_inner(self) -> Result<W, UploadError> {
        self.writer
            .into_inner()
            .map_err(|_| UploadError::UploadFailed("log writer mutex poisoned".to_string()))
    }
}

impl<W: Write + Send> Uploader for LogUploader<W> {
    fn upload(&self, files: &[PathBuf]) -> Result<(), UploadError> {
        let paths: Vec<String> = files.iter().map(|file| file.display().to_string()).collect();
        let record = json!({
            "event": "photo_batch",
            "count": paths.len(),
            "files": paths,
        });
        let mut guard = self
            .writer
            .lock()
            .map_err(|_| UploadError::UploadFailed("log writer mutex poisoned".to_string()))?;
        serde_json::to_writer(&mut *guard, &record)
            .map_err(|err| UploadError::UploadFailed(err.to_string()))?;
        guard.write_all(b"\n").map_err(|err| UploadError::UploadFailed(err.to_string()))?;
        guard.flush().map_err(|err| UploadError::UploadFailed(err.to_string()))?;
        drop(guard);
        info!(count = files.len(), "recorded photo batch");
        Ok(())
    }
}
