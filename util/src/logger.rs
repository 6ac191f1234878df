//! Generic logger utility functions
//!
//! Records are written both to the console and to the session's log file.
//! The two outputs have independent levels so that a run can keep a detailed
//! file log while the console stays readable. Targets which log every control
//! cycle can be kept off the console entirely at trace level.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern::Dispatch;
use log::{self, info};
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Logger configuration for one execution.
#[derive(Debug, Clone, Copy)]
pub struct LogConfig<'a> {
    /// Most verbose level printed to the console
    pub console_level: LevelFilter,

    /// Most verbose level written to the session log file, must be at least as
    /// verbose as `console_level`
    pub file_level: LevelFilter,

    /// Targets (module paths) which emit per-cycle trace records. These never
    /// reach the console at trace level, only the log file.
    pub cycle_targets: &'a [&'a str],
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("The log file level ({0}) must be at least as verbose as the console level ({1})")]
    FileLevelBelowConsole(log::LevelFilter, log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<'a> LogConfig<'a> {
    /// Check the levels are usable.
    ///
    /// Both levels must be at least `Info`, tuning changes and warnings must
    /// always be recorded.
    pub fn validate(&self) -> Result<(), LoggerInitError> {
        for &level in &[self.console_level, self.file_level] {
            if level < log::Level::Info {
                return Err(LoggerInitError::InvalidMinLogLevel(level));
            }
        }

        if self.file_level < self.console_level {
            return Err(LoggerInitError::FileLevelBelowConsole(
                self.file_level,
                self.console_level,
            ));
        }

        Ok(())
    }

    /// The console level used for the per-cycle targets.
    fn cycle_console_level(&self) -> LevelFilter {
        self.console_level.min(LevelFilter::Debug)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// Console records carry coloured level tags and only include their target at
/// debug and trace. File records carry plain tags and always include their
/// target, so per-cycle records can be filtered by module afterwards.
///
/// This function must only be called once, subsequent calls return
/// `FernInitError`.
pub fn logger_init(config: LogConfig, session: &session::Session) -> Result<(), LoggerInitError> {
    config.validate()?;

    let log_file =
        fern::log_file(&session.log_file_path).map_err(LoggerInitError::LogFileInitError)?;

    let mut console = Dispatch::new()
        .format(|out, message, record| {
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}: {}",
                    session::get_elapsed_seconds(),
                    level_to_colored(record.level()),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::get_elapsed_seconds(),
                    level_to_colored(record.level()),
                    message
                ))
            }
        })
        .level(config.console_level);

    for target in config.cycle_targets {
        console = console.level_for(target.to_string(), config.cycle_console_level());
    }

    let file = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}: {}",
                session::get_elapsed_seconds(),
                level_tag(record.level()),
                record.target(),
                message
            ))
        })
        .level(config.file_level)
        .chain(log_file);

    Dispatch::new()
        .chain(console.chain(std::io::stdout()))
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Some(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Console level: {:?}", config.console_level);
    info!("    File level: {:?}", config.file_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the plain tag of a log level
fn level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Trace => "TRC",
        log::Level::Debug => "DBG",
        log::Level::Info => "INF",
        log::Level::Warn => "WRN",
        log::Level::Error => "ERR",
    }
}

/// Get the coloured tag of a log level for the console
fn level_to_colored(level: log::Level) -> ColoredString {
    let tag = level_tag(level);

    match level {
        log::Level::Trace => tag.dimmed().italic(),
        log::Level::Debug => tag.dimmed(),
        log::Level::Info => tag.normal(),
        log::Level::Warn => tag.yellow(),
        log::Level::Error => tag.red().bold(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn config(console_level: LevelFilter, file_level: LevelFilter) -> LogConfig<'static> {
        LogConfig {
            console_level,
            file_level,
            cycle_targets: &["lat_lib::pi_ctrl"],
        }
    }

    #[test]
    fn test_validate() {
        assert!(config(LevelFilter::Info, LevelFilter::Trace).validate().is_ok());
        assert!(config(LevelFilter::Debug, LevelFilter::Debug).validate().is_ok());

        assert!(matches!(
            config(LevelFilter::Warn, LevelFilter::Trace).validate(),
            Err(LoggerInitError::InvalidMinLogLevel(LevelFilter::Warn))
        ));
        assert!(matches!(
            config(LevelFilter::Debug, LevelFilter::Info).validate(),
            Err(LoggerInitError::FileLevelBelowConsole(
                LevelFilter::Info,
                LevelFilter::Debug
            ))
        ));
    }

    #[test]
    fn test_cycle_targets_kept_off_console_trace() {
        assert_eq!(
            config(LevelFilter::Trace, LevelFilter::Trace).cycle_console_level(),
            LevelFilter::Debug
        );
        assert_eq!(
            config(LevelFilter::Info, LevelFilter::Trace).cycle_console_level(),
            LevelFilter::Info
        );
    }

    #[test]
    fn test_level_tags() {
        assert_eq!(level_tag(log::Level::Warn), "WRN");
        assert_eq!(level_tag(log::Level::Trace), "TRC");
    }
}
