//! Diagnostic logging to stderr through `tracing`.
//!
//! Logging is disabled unless a level other than `off` is requested, so the
//! interactive terminal stays clean by default.

use anyhow::{Result, anyhow};
use tracing_subscriber::filter::LevelFilter;

/// Environment variable consulted when no level is given on the command line.
pub const LOG_ENV: &str = "TABSH_LOG";

/// Pick the log level: the command-line value wins over the environment, and
/// logging is off when neither is set.
///
/// # Errors
///
/// Returns an error for a value that is not a known level name.
pub fn resolve_level(flag: Option<&str>, env: Option<&str>) -> Result<LevelFilter> {
    match flag.or(env).map(str::trim).filter(|s| !s.is_empty()) {
        Some(level) => level
            .parse()
            .map_err(|_| anyhow!("invalid log level {level:?}; expected off, error, warn, info, debug or trace")),
        None => Ok(LevelFilter::OFF),
    }
}

/// Install the global subscriber writing plain-text events to stderr.
///
/// # Errors
///
/// Fails if a global subscriber has already been installed.
pub fn init(level: LevelFilter) -> Result<()> {
    if level == LevelFilter::OFF {
        return Ok(());
    }
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_environment() {
        assert_eq!(resolve_level(Some("debug"), Some("warn")).unwrap(), LevelFilter::DEBUG);
        assert_eq!(resolve_level(None, Some("warn")).unwrap(), LevelFilter::WARN);
        assert_eq!(resolve_level(None, None).unwrap(), LevelFilter::OFF);
        assert_eq!(resolve_level(None, Some("  ")).unwrap(), LevelFilter::OFF);
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(resolve_level(Some("chatty"), None).is_err());
    }

    #[test]
    fn off_installs_nothing() {
        assert!(init(LevelFilter::OFF).is_ok());
    }
}
