//! Log setup: console output plus an append-only log file.
//!
//! File lines look like `19-10-2026 14:03:11 :: WARNING: message key=value`.

use anyhow::Context;
use chrono::Local;
use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        self, FmtContext, FormatEvent, FormatFields,
        format::{DefaultFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

/// Timestamp layout of the file log
const TIMESTAMP_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Event format of the file log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLineFormat;

fn level_label(level: &Level) -> &'static str {
    if *level == Level::WARN {
        "WARNING"
    } else {
        level.as_str()
    }
}

impl<S, N> FormatEvent<S, N> for LogLineFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        write!(
            writer,
            "{} :: {}: ",
            Local::now().format(TIMESTAMP_FORMAT),
            level_label(event.metadata().level())
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Layer writing [`LogLineFormat`] lines to `file`
pub fn file_layer<S>(file: File) -> fmt::Layer<S, DefaultFields, LogLineFormat, Mutex<File>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_ansi(false)
        .event_format(LogLineFormat)
        .with_writer(Mutex::new(file))
}

/// Open `path` for appending, creating parent directories
pub fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_logging(log_file: &Path, debug: bool) -> anyhow::Result<()> {
    let log_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("storage_api={},tower_http={}", log_level, log_level).into());

    let file = open_log_file(log_file)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer(file))
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::Registry;

    #[test]
    fn test_level_labels() {
        assert_eq!(level_label(&Level::WARN), "WARNING");
        assert_eq!(level_label(&Level::INFO), "INFO");
        assert_eq!(level_label(&Level::ERROR), "ERROR");
    }

    #[test]
    fn test_file_lines_are_formatted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("app.log");
        let file = open_log_file(&path).unwrap();

        let subscriber = Registry::default().with(file_layer(file));
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(key = "docs/a.txt", "Upload rejected");
            tracing::info!("Second line");
        });

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let (timestamp, rest) = lines[0].split_once(" :: ").unwrap();
        assert!(chrono::NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).is_ok());
        assert!(rest.starts_with("WARNING: Upload rejected"));
        assert!(rest.contains("key=\"docs/a.txt\""));
        assert!(lines[1].ends_with(":: INFO: Second line"));
    }

    #[test]
    fn test_log_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "existing\n").unwrap();

        let file = open_log_file(&path).unwrap();
        let subscriber = Registry::default().with(file_layer(file));
        tracing::subscriber::with_default(subscriber, || tracing::error!("boom"));

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("existing\n"));
        assert!(contents.trim_end().ends_with("ERROR: boom"));
    }
}
