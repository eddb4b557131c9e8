// crates/garage-door-devices/src/camera.rs
// ============================================================================
// Module: Command Camera
// Description: Camera adapter that shells out to a still-capture program.
// Purpose: Produce labelled, timestamped photo files for door transitions.
// Dependencies: garage-door-core, std, tracing
// ============================================================================

//! ## Overview
//! `CommandCamera` builds `<directory>/<label>_<YYYYMMDD_HHMMSS_ffffff>.<ext>`,
//! substitutes it for every `{output}` in the configured arguments, and runs
//! the program. A capture only counts once the program exits successfully and
//! the output file exists.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::Stdio;
use std::sync::Arc;

use garage_door_core::CAMERA_OUTPUT_PLACEHOLDER;
use garage_door_core::Camera;
use garage_door_core::CaptureError;
use garage_door_core::Clock;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Attempts at finding an unused file name within one timestamp.
const MAX_NAME_ATTEMPTS: u32 = 100;

// ============================================================================
// SECTION: Camera
// ============================================================================

/// Camera driven by an external capture command.
#[derive(Clone)]
pub struct CommandCamera {
    /// Capture program.
    program: String,
    /// Arguments with `{output}` placeholders.
    args: Vec<String>,
    /// Photo file extension without the dot.
    extension: String,
    /// Clock used for file name stamps.
    clock: Arc<dyn Clock>,
}

impl CommandCamera {
    /// Creates a camera running `program` with `args`.
    #[must_use]
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        extension: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            extension: extension.into(),
            clock,
        }
    }

    /// Returns an unused output path for `label` in `directory`.
    fn output_path(&self, directory: &Path, label: &str) -> Result<PathBuf, CaptureError> {
        let stem = format!("{label}_{}", self.clock.now().file_stamp());
        let first = directory.join(format!("{stem}.{}", self.extension));
        if !first.exists() {
            return Ok(first);
        }
        (1 .. MAX_NAME_ATTEMPTS)
            .map(|attempt| directory.join(format!("{stem}_{attempt}.{}", self.extension)))
            .find(|candidate| !candidate.exists())
            .ok_or_else(|| CaptureError::CaptureFailed(format!("no free file name for {stem}")))
    }
}

impl Camera for CommandCamera {
    fn take_picture(&self, directory: &Path, label: &str) -> Result<PathBuf, CaptureError> {
        std::fs::create_dir_all(directory).map_err(|err| {
            CaptureError::Directory(format!("{}: {err}", directory.display()))
        })?;
        let output = self.output_path(directory, label)?;
        let output_text = output.to_string_lossy();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|arg| arg.replace(CAMERA_OUTPUT_PLACEHOLDER, &output_text))
            .collect();

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|err| CaptureError::CaptureFailed(format!("{}: {err}", self.program)))?;
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(CaptureError::CaptureFailed(format!(
                "{} exited with {}: {}",
                self.program,
                result.status,
                stderr.trim()
            )));
        }
        if !output.is_file() {
            return Err(CaptureError::CaptureFailed(format!(
                "{} did not write {}",
                self.program,
                output.display()
            )));
        }
        debug!(path = %output.display(), "captured photo");
        Ok(output)
    }
}
