//! Console and file logging.
//!
//! Warnings and errors go to stderr (everything from `info` up with
//! `--verbose`, only errors with `--quiet`). The log file receives every
//! record at the configured level and is only ever appended to.

use anyhow::{Context, Result};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use std::fs::OpenOptions;
use std::path::Path;

use crate::Verbosity;

/// Parse a level name from the config file.
pub fn parse_level(name: &str) -> Result<LevelFilter> {
    name.parse::<LevelFilter>()
        .map_err(|_| anyhow::anyhow!("Unknown log level '{name}' (expected error, warn, info, debug, trace or off)"))
}

const fn terminal_level(verbosity: Verbosity) -> LevelFilter {
    match verbosity {
        Verbosity::Quiet => LevelFilter::Error,
        Verbosity::Normal => LevelFilter::Warn,
        Verbosity::Verbose => LevelFilter::Debug,
    }
}

/// Install the global logger. Call once, before any work.
pub fn init(verbosity: Verbosity, file: Option<&Path>, file_level: LevelFilter) -> Result<()> {
    let config = ConfigBuilder::new()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        terminal_level(verbosity),
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = file {
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        loggers.push(WriteLogger::new(file_level, config, log_file));
    }

    CombinedLogger::init(loggers).context("Logger already initialised")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("info").unwrap(), LevelFilter::Info);
        assert_eq!(parse_level("WARN").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::Off);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_terminal_level_follows_verbosity() {
        assert_eq!(terminal_level(Verbosity::Quiet), LevelFilter::Error);
        assert_eq!(terminal_level(Verbosity::Normal), LevelFilter::Warn);
        assert_eq!(terminal_level(Verbosity::Verbose), LevelFilter::Debug);
    }
}
