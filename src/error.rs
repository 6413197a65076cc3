use thiserror::Error;

/// Failures reported by a belief, history or stats collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend unavailable: {0}")]
    Backend(String),
    #[error("store call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid question count table: {0}")]
    QuestionTable(#[from] serde_json::Error),
    #[error("question count must be positive: {difficulty}/{arm}")]
    ZeroQuestionCount { difficulty: String, arm: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// A score or live performance value fell outside [0, 1].
    #[error("invalid score {value}: expected a value in [0, 1]")]
    InvalidScore { value: f64 },

    #[error("invalid belief: alpha={alpha}, beta={beta} (both must be finite and >= 1)")]
    InvalidBelief { alpha: f64, beta: f64 },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Rejects NaN and anything outside the closed unit interval.
pub(crate) fn check_unit_score(value: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(EngineError::InvalidScore { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_score_bounds_are_inclusive() {
        assert!(check_unit_score(0.0).is_ok());
        assert!(check_unit_score(1.0).is_ok());
        assert!(check_unit_score(-0.01).is_err());
        assert!(check_unit_score(1.01).is_err());
        assert!(check_unit_score(f64::NAN).is_err());
    }

    #[test]
    fn store_error_converts_to_unavailable() {
        let err: EngineError = StoreError::Backend("connection reset".into()).into();
        assert!(matches!(err, EngineError::StoreUnavailable(_)));
        assert!(err.to_string().contains("connection reset"));
    }
}
