//! Structured logging and tracing for embody.
//!
//! Console output with uptime timestamps and module paths, plus JSON file
//! logging in debug builds. The configured `debug.log_level` is the default
//! filter; `RUST_LOG` overrides it.

use embody_config::Config;
use std::fs::File;
use std::path::Path;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "embody.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables the file layer
/// * `config` - supplies the default log level
///
/// # Examples
///
/// ```no_run
/// use embody_config::Config;
/// use embody_log::init_logging;
///
/// let config = Config::default();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| config_filter(config));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build && let Some(log_file) = log_dir.and_then(open_log_file) {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Resolve the filter directive from the config, falling back to [`DEFAULT_FILTER`].
pub fn filter_string(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.clone()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Build the filter from the config level. A level that does not parse
/// falls back to [`DEFAULT_FILTER`].
pub fn config_filter(config: Option<&Config>) -> EnvFilter {
    EnvFilter::try_new(filter_string(config)).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Create `log_dir` if needed and truncate the JSON log file inside it.
fn open_log_file(log_dir: &Path) -> Option<File> {
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_dir.join(LOG_FILE_NAME)).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_filter_without_config_is_info() {
        let filter = format!("{}", config_filter(None));
        assert!(filter.contains("info"), "{filter}");
    }

    #[test]
    fn test_filter_string_uses_config_level() {
        let mut config = Config::default();
        config.debug.log_level = "debug,embody_physics=trace".to_string();
        assert_eq!(filter_string(Some(&config)), "debug,embody_physics=trace");
    }

    #[test]
    fn test_filter_string_falls_back_on_blank_level() {
        let mut config = Config::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_string(Some(&config)), DEFAULT_FILTER);
        assert_eq!(filter_string(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_config_filter_keeps_subsystem_directives() {
        let mut config = Config::default();
        config.debug.log_level = "warn,embody_player=debug".to_string();
        let filter = format!("{}", config_filter(Some(&config)));
        assert!(filter.contains("embody_player=debug"), "{filter}");
        assert!(filter.contains("warn"), "{filter}");
    }

    #[test]
    fn test_config_filter_falls_back_on_bad_level() {
        let mut config = Config::default();
        config.debug.log_level = "embody_player=loud".to_string();
        let filter = format!("{}", config_filter(Some(&config)));
        assert!(filter.contains(DEFAULT_FILTER), "{filter}");
        assert!(!filter.contains("embody_player"), "{filter}");
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_dir = temp_dir.path().join("embody").join("logs");

        assert!(open_log_file(&log_dir).is_some());
        assert!(log_dir.join(LOG_FILE_NAME).is_file());
    }
}
