//! Field validation tests for garage-door-config.
// crates/garage-door-config/tests/field_validation.rs
// =============================================================================
// Module: Config Field Validation Tests
// Description: Validate defaults and per-section bounds.
// Purpose: Ensure out-of-range settings fail closed at startup.
// =============================================================================

use garage_door_config::GarageDoorConfig;
use garage_door_config::UploadConfig;
use garage_door_core::CAMERA_OUTPUT_PLACEHOLDER;

type TestResult = Result<(), String>;

fn assert_rejected(toml: &str, needle: &str) -> TestResult {
    match GarageDoorConfig::from_toml(toml) {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err(format!("expected rejection for {toml}")),
    }
}

#[test]
fn empty_file_uses_defaults() -> TestResult {
    let config = GarageDoorConfig::from_toml("").map_err(|err| err.to_string())?;
    let monitor = config.monitor_config();
    if monitor.poll_interval.as_secs() != 2
        || monitor.photo_interval.as_secs() != 2
        || monitor.photos_on_open != 5
        || monitor.photos_on_close != 1
    {
        return Err("unexpected monitor defaults".to_string());
    }
    if config.challenge.validity().as_secs() != 15 * 60 || config.challenge.code_length != 4 {
        return Err("unexpected challenge defaults".to_string());
    }
    if config.logging.file_name != "door-state-change.log" || config.logging.file_path().is_some() {
        return Err("unexpected logging defaults".to_string());
    }
    if config.upload != UploadConfig::Log {
        return Err("upload should default to log".to_string());
    }
    Ok(())
}

#[test]
fn rejects_zero_poll_interval() -> TestResult {
    assert_rejected("[monitor]\npoll_interval_ms = 0", "monitor.poll_interval_ms")
}

#[test]
fn rejects_excessive_photo_count() -> TestResult {
    assert_rejected("[monitor]\nphotos_on_open = 500", "monitor.photos_on_open")
}

#[test]
fn zero_photos_on_close_is_allowed() -> TestResult {
    GarageDoorConfig::from_toml("[monitor]\nphotos_on_close = 0")
        .map(|_| ())
        .map_err(|err| err.to_string())
}

#[test]
fn rejects_zero_validity() -> TestResult {
    assert_rejected("[challenge]\nvalidity_minutes = 0", "challenge.validity_minutes")
}

#[test]
fn rejects_code_length_out_of_range() -> TestResult {
    assert_rejected("[challenge]\ncode_length = 0", "challenge.code_length")?;
    assert_rejected("[challenge]\ncode_length = 40", "challenge.code_length")
}

#[test]
fn rejects_empty_database_path() -> TestResult {
    assert_rejected("[database]\npath = \"\"", "database.path")
}

#[test]
fn rejects_unknown_journal_mode() -> TestResult {
    assert_rejected("[database]\njournal_mode = \"memory\"", "config parse error")
}

#[test]
fn rejects_log_file_name_with_separator() -> TestResult {
    assert_rejected("[logging]\nfile_name = \"logs/door.log\"", "logging.file_name")
}

#[test]
fn rejects_camera_args_without_placeholder() -> TestResult {
    assert_rejected("[camera]\nargs = [\"-o\", \"photo.jpg\"]", "{output}")
}

#[test]
fn default_camera_args_use_shared_placeholder() -> TestResult {
    let config = GarageDoorConfig::from_toml("").map_err(|err| err.to_string())?;
    if config.camera.args.iter().any(|arg| arg == CAMERA_OUTPUT_PLACEHOLDER) {
        Ok(())
    } else {
        Err(format!("default args {} lack {CAMERA_OUTPUT_PLACEHOLDER}", config.camera.args.join(" ")))
    }
}

#[test]
fn rejects_camera_extension_with_dot() -> TestResult {
    assert_rejected("[camera]\nextension = \".jpg\"", "camera.extension")
}

#[test]
fn rejects_empty_closed_value() -> TestResult {
    assert_rejected("[sensor]\nclosed_value = \" \"", "sensor.closed_value")
}

#[test]
fn directory_upload_requires_destination() -> TestResult {
    assert_rejected("[upload]\ntype = \"directory\"", "config parse error")?;
    assert_rejected("[upload]\ntype = \"directory\"\ndestination = \"\"", "upload.destination")
}

#[test]
fn rejects_unknown_upload_type() -> TestResult {
    assert_rejected("[upload]\ntype = \"dropbox\"", "config parse error")
}
