use std::path::PathBuf;
use std::time::Duration;

use crate::bandit::difficulty::DEFAULT_HISTORY_WINDOW;
use crate::bandit::question_count::QuestionCountPolicy;
use crate::bandit::types::Arm;

const DEFAULT_STORE_TIMEOUT_MS: u64 = 2000;
const DEFAULT_LOG_DIR: &str = "./logs";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// `EnvFilter` directive handed to [`crate::logging::init_tracing`].
    pub log_level: String,
    /// Directory for the daily log file; `None` logs to stdout only.
    pub log_dir: Option<PathBuf>,
    pub history_window: usize,
    pub store_timeout: Duration,
    /// Base seed for per-call generators. `None` seeds from OS entropy.
    pub rng_seed: Option<u64>,
    /// Arms every learner is planned over, whether or not they have data yet.
    pub arms: Vec<Arm>,
    pub question_counts: QuestionCountPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
            history_window: DEFAULT_HISTORY_WINDOW,
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            rng_seed: None,
            arms: Arm::well_known(),
            question_counts: QuestionCountPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Loads `.env` if present, then reads the environment.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_env()
    }

    /// Reads `RUST_LOG` and the `ADAPTIVE_*` variables over the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = level;
        }

        if std::env::var("ENABLE_FILE_LOGS").is_ok_and(|v| is_enabled(&v)) {
            let dir = std::env::var("LOG_DIR").unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
            config.log_dir = Some(PathBuf::from(dir));
        }

        if let Some(window) = std::env::var("ADAPTIVE_HISTORY_WINDOW")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
        {
            config.history_window = window.max(1);
        }

        if let Some(ms) = std::env::var("ADAPTIVE_STORE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.store_timeout = Duration::from_millis(ms);
        }

        config.rng_seed = std::env::var("ADAPTIVE_RNG_SEED")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());

        if let Ok(raw) = std::env::var("ADAPTIVE_ARMS") {
            let arms = parse_arms(&raw);
            if arms.is_empty() {
                tracing::warn!(value = %raw, "ADAPTIVE_ARMS has no entries, keeping defaults");
            } else {
                config.arms = arms;
            }
        }

        if let Ok(raw) = std::env::var("ADAPTIVE_QUESTION_COUNTS") {
            match QuestionCountPolicy::from_json(&raw) {
                Ok(policy) => config.question_counts = policy,
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring ADAPTIVE_QUESTION_COUNTS");
                }
            }
        }

        config
    }
}

fn is_enabled(raw: &str) -> bool {
    matches!(raw.trim(), "true" | "1")
}

fn parse_arms(raw: &str) -> Vec<Arm> {
    let mut arms: Vec<Arm> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Arm::new)
        .collect();
    arms.sort();
    arms.dedup();
    arms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history_window, 5);
        assert_eq!(config.store_timeout, Duration::from_millis(2000));
        assert_eq!(config.arms.len(), 3);
        assert!(config.rng_seed.is_none());
        assert_eq!(config.log_level, "info");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_file_log_flag_values() {
        assert!(is_enabled("true"));
        assert!(is_enabled(" 1 "));
        assert!(!is_enabled("yes"));
        assert!(!is_enabled(""));
    }

    #[test]
    fn test_parse_arms_trims_and_dedups() {
        let arms = parse_arms(" spelling, balloon_math,,spelling ");
        let names: Vec<_> = arms.iter().map(Arm::as_str).collect();
        assert_eq!(names, vec!["balloon_math", "spelling"]);
        assert!(parse_arms(" , ").is_empty());
    }
}
