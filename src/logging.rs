use std::path::PathBuf;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::Settings;
use crate::eval::ValidationVerdict;

/// Install a file logger appending to `settings.log_file`.
/// Best-effort: failures are silently ignored (logging must never block a verdict).
pub fn init(settings: &Settings) {
    let Some(path) = log_path(&settings.log_file) else {
        return;
    };
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return;
    };

    let level = settings
        .log_level
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::Info);
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let _ = WriteLogger::init(level, config, file);
}

fn log_path(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let expanded = shellexpand::full(raw).ok()?;
    Some(PathBuf::from(expanded.into_owned()))
}

/// Emit one tab-separated decision record: verdict, command, reason.
pub fn log_verdict(command: &str, verdict: &ValidationVerdict) {
    log::info!(target: "devgate::decision", "{}", decision_record(command, verdict));
}

fn decision_record(command: &str, verdict: &ValidationVerdict) -> String {
    // Compact single-line fields for the log
    let cmd_truncated: String = command.chars().take(200).collect::<String>().replace('\n', "; ");
    let reason_oneline = verdict
        .reason
        .as_deref()
        .unwrap_or("-")
        .replace('\n', "; ");
    format!(
        "{decision}\t{cmd}\t{reason}",
        decision = verdict.as_str(),
        cmd = cmd_truncated,
        reason = reason_oneline,
    )
}
