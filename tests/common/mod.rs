#![allow(dead_code)]

use adaptive_games::analytics::SessionAnalytics;
use adaptive_games::bandit::{Arm, BeliefMap, BeliefState, SessionRecord};
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

static SESSION_SEQ: AtomicU64 = AtomicU64::new(0);

pub fn fresh_beliefs() -> BeliefMap {
    Arm::well_known()
        .into_iter()
        .map(|arm| (arm, BeliefState::default()))
        .collect()
}

/// Records ordered newest first, one minute apart.
pub fn history(accuracies: &[f64]) -> Vec<SessionRecord> {
    let now = Utc::now();
    accuracies
        .iter()
        .enumerate()
        .map(|(i, &acc)| SessionRecord::new(acc, true, now - Duration::minutes(i as i64)).unwrap())
        .collect()
}

pub fn session(learner: &str, arm: &str, accuracy: f64, completed: bool) -> SessionAnalytics {
    SessionAnalytics {
        learner: learner.to_string(),
        arm: Arm::new(arm),
        session_id: format!("{learner}-{arm}-{}", SESSION_SEQ.fetch_add(1, Ordering::Relaxed)),
        correct_answers: (accuracy * 10.0).round() as u32,
        total_questions: 10,
        accuracy_rate: accuracy,
        time_spent_seconds: 90.0,
        completed,
        rage_quit: false,
        help_hint_count: 0,
    }
}
