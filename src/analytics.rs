use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bandit::types::{Arm, Outcome, SessionRecord};
use crate::error::{check_unit_score, Result};

const ACCURACY_WEIGHT: f64 = 0.5;
const COMPLETION_WEIGHT: f64 = 0.3;
const NO_RAGE_QUIT_WEIGHT: f64 = 0.2;
const SUCCESS_ACCURACY: f64 = 0.5;

const SCORE_ACCURACY_WEIGHT: f64 = 0.4;
const SCORE_COMPLETION_WEIGHT: f64 = 0.3;
const SCORE_ENGAGEMENT_WEIGHT: f64 = 0.3;

/// Metrics reported by the client at the end of one game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnalytics {
    pub learner: String,
    pub arm: Arm,
    pub session_id: String,
    pub correct_answers: u32,
    pub total_questions: u32,
    pub accuracy_rate: f64,
    pub time_spent_seconds: f64,
    pub completed: bool,
    pub rage_quit: bool,
    #[serde(default)]
    pub help_hint_count: u32,
}

impl SessionAnalytics {
    pub fn validate(&self) -> Result<()> {
        check_unit_score(self.accuracy_rate)?;
        Ok(())
    }

    /// `0.5 * accuracy + 0.3 * completed + 0.2 * (no rage quit)`.
    pub fn performance_score(&self) -> f64 {
        let completion = if self.completed { 1.0 } else { 0.0 };
        let stayed = if self.rage_quit { 0.0 } else { 1.0 };
        ACCURACY_WEIGHT * self.accuracy_rate
            + COMPLETION_WEIGHT * completion
            + NO_RAGE_QUIT_WEIGHT * stayed
    }

    /// A session counts as a success when finished with at least half right.
    pub fn outcome(&self) -> Outcome {
        Outcome::new(
            self.completed && self.accuracy_rate >= SUCCESS_ACCURACY,
            self.performance_score(),
        )
    }

    pub fn to_record(&self, at: DateTime<Utc>) -> Result<SessionRecord> {
        Ok(SessionRecord::new(self.accuracy_rate, self.completed, at)?.with_session_id(&self.session_id))
    }
}

/// Running totals for one learner x game type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStats {
    pub total_sessions: u64,
    pub total_questions: u64,
    pub total_correct: u64,
    pub total_time_seconds: f64,
    pub total_completions: u64,
    pub total_rage_quits: u64,
    pub total_help_usage: u64,
    pub last_played: Option<DateTime<Utc>>,
    /// Most recently folded session, so a retried write is not counted twice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_id: Option<String>,
}

impl AggregateStats {
    /// Folds `session` in. Returns `false` when it was already the last one
    /// recorded.
    pub fn record(&mut self, session: &SessionAnalytics, at: DateTime<Utc>) -> bool {
        if self.last_session_id.as_deref() == Some(session.session_id.as_str()) {
            return false;
        }
        self.total_sessions += 1;
        self.total_questions += u64::from(session.total_questions);
        self.total_correct += u64::from(session.correct_answers);
        self.total_time_seconds += session.time_spent_seconds.max(0.0);
        self.total_completions += u64::from(session.completed);
        self.total_rage_quits += u64::from(session.rage_quit);
        self.total_help_usage += u64::from(session.help_hint_count);
        self.last_played = Some(at);
        self.last_session_id = Some(session.session_id.clone());
        true
    }

    pub fn average_accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.total_correct as f64 / self.total_questions as f64
    }

    pub fn average_time_per_session(&self) -> f64 {
        if self.total_sessions == 0 {
            return 0.0;
        }
        self.total_time_seconds / self.total_sessions as f64
    }

    /// `0.4 * accuracy + 0.3 * completion rate + 0.3 * (1 - rage quit rate)`,
    /// rounded to three decimals.
    pub fn composite_score(&self) -> f64 {
        let (completion_rate, engagement) = if self.total_sessions == 0 {
            (0.0, 1.0)
        } else {
            let sessions = self.total_sessions as f64;
            (
                self.total_completions as f64 / sessions,
                1.0 - self.total_rage_quits as f64 / sessions,
            )
        };
        let score = SCORE_ACCURACY_WEIGHT * self.average_accuracy()
            + SCORE_COMPLETION_WEIGHT * completion_rate
            + SCORE_ENGAGEMENT_WEIGHT * engagement;
        (score * 1000.0).round() / 1000.0
    }
}
