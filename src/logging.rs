use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::EngineConfig;

const LOG_FILE_PREFIX: &str = "adaptive-games.log";
const FALLBACK_DIRECTIVE: &str = "info";

/// Keeps the background file writer alive; drop it on shutdown to flush.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Installs the global subscriber from `config`: stdout always, plus a daily
/// rolling file under `config.log_dir` when set. A second call is a no-op for
/// the subscriber, so hosts and tests can both call it.
pub fn init_tracing(config: &EngineConfig) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|err| {
        eprintln!("invalid log directive {:?}: {err}", config.log_level);
        EnvFilter::new(FALLBACK_DIRECTIVE)
    });

    let (file_writer, guard) = match config.log_dir.as_deref().map(daily_appender) {
        Some(Ok(appender)) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        Some(Err(err)) => {
            eprintln!("file logging disabled: {err}");
            (None, None)
        }
        None => (None, None),
    };
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init();

    guard.map(|guard| FileLogGuard { _guard: guard })
}

fn daily_appender(dir: &Path) -> Result<RollingFileAppender, String> {
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("cannot create log directory {}: {err}", dir.display()))?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir)
        .map_err(|err| format!("cannot open log file in {}: {err}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stdout_only_without_log_dir() {
        let config = EngineConfig {
            log_level: "not a directive [".to_string(),
            log_dir: None,
            ..Default::default()
        };
        assert!(init_tracing(&config).is_none());
        assert!(init_tracing(&config).is_none());
    }

    #[test]
    fn test_log_dir_enables_file_writer() {
        let dir = std::env::temp_dir().join(format!("adaptive-games-logs-{}", std::process::id()));
        let config = EngineConfig {
            log_level: "debug".to_string(),
            log_dir: Some(dir.clone()),
            ..Default::default()
        };
        let guard = init_tracing(&config);
        assert!(guard.is_some());
        assert!(dir.is_dir());
        drop(guard);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
