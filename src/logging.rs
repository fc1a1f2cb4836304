use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::errors::ConfigError;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} [{t}] {m}{n}";

/// Builds and installs the process-wide `log4rs` logger: a file appender always, plus
/// a console appender when `log_to_stdout` is set. Axum/tower-http's internal
/// `tracing` events are bridged into the same `log` facade via `tracing_log::LogTracer`,
/// so a single `[general]` section governs both.
///
/// # Arguments
///
/// * 'log_path' - path to the log file
/// * 'log_level' - minimum level to record
/// * 'log_to_stdout' - whether to also echo log lines to stdout
pub fn setup_logger(log_path: &str, log_level: LevelFilter, log_to_stdout: bool) -> Result<(), ConfigError> {
    tracing_log::LogTracer::init().map_err(|e| ConfigError(e.to_string()))?;

    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(log_path)?;

    let mut builder = Config::builder().appender(Appender::builder().build("file", Box::new(file)));
    let mut root_appenders = vec!["file".to_string()];

    if log_to_stdout {
        let stdout = ConsoleAppender::builder().encoder(Box::new(PatternEncoder::new(PATTERN))).build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root_appenders.push("stdout".to_string());
    }

    let config = builder
        .logger(Logger::builder().build("tower_http", log_level))
        .build(Root::builder().appenders(root_appenders).build(log_level))?;

    log4rs::init_config(config)?;

    Ok(())
}
