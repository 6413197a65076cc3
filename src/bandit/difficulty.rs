use serde::{Deserialize, Serialize};

use crate::bandit::types::{Difficulty, SessionRecord};

pub const DEFAULT_HISTORY_WINDOW: usize = 5;
const HARD_THRESHOLD: f64 = 0.8;
const MEDIUM_THRESHOLD: f64 = 0.5;

/// Baseline difficulty from the learner's most recent sessions of one game.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(from = "RawEstimator")]
pub struct DifficultyEstimator {
    window: usize,
}

#[derive(Deserialize)]
struct RawEstimator {
    window: usize,
}

impl From<RawEstimator> for DifficultyEstimator {
    fn from(raw: RawEstimator) -> Self {
        Self::new(raw.window)
    }
}

impl Default for DifficultyEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl DifficultyEstimator {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// `history` must be ordered most-recent-first. Empty history is medium.
    pub fn baseline_difficulty(&self, history: &[SessionRecord]) -> Difficulty {
        match average_accuracy(history, self.window) {
            Some(avg) => classify_accuracy(avg),
            None => Difficulty::Medium,
        }
    }
}

pub fn average_accuracy(history: &[SessionRecord], window: usize) -> Option<f64> {
    let recent = &history[..history.len().min(window)];
    if recent.is_empty() {
        return None;
    }
    let total: f64 = recent.iter().map(SessionRecord::accuracy_rate).sum();
    Some(total / recent.len() as f64)
}

/// Lower bounds are inclusive: 0.8 is hard, 0.5 is medium.
pub fn classify_accuracy(avg_accuracy: f64) -> Difficulty {
    if avg_accuracy >= HARD_THRESHOLD {
        Difficulty::Hard
    } else if avg_accuracy >= MEDIUM_THRESHOLD {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}
