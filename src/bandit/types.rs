use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{check_unit_score, EngineError, Result};

/// Unit prior shared by every arm before any evidence arrives.
pub const PRIOR_ALPHA: f64 = 1.0;
pub const PRIOR_BETA: f64 = 1.0;

/// One selectable game type. The set is open: any identifier is an arm.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arm(String);

impl Arm {
    pub const BALLOON_MATH: &'static str = "balloon_math";
    pub const GENERAL_KNOWLEDGE: &'static str = "general_knowledge";
    pub const SPELLING: &'static str = "spelling";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The three game types shipped with the learning app.
    pub fn well_known() -> Vec<Arm> {
        vec![
            Arm::new(Self::BALLOON_MATH),
            Arm::new(Self::GENERAL_KNOWLEDGE),
            Arm::new(Self::SPELLING),
        ]
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Arm {
    fn from(value: &str) -> Self {
        Arm::new(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Beta(alpha, beta) belief that an arm works for one learner.
///
/// Both parameters start at 1 and only ever grow. The only way in is
/// [`BeliefState::new`] (serde routes through it too), so a constructed value
/// always describes a proper distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawBelief", rename_all = "camelCase")]
pub struct BeliefState {
    alpha: f64,
    beta: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_updated: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBelief {
    alpha: f64,
    beta: f64,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

impl TryFrom<RawBelief> for BeliefState {
    type Error = EngineError;

    fn try_from(raw: RawBelief) -> Result<Self> {
        let mut state = BeliefState::new(raw.alpha, raw.beta)?;
        state.last_updated = raw.last_updated;
        Ok(state)
    }
}

impl BeliefState {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        if !alpha.is_finite() || !beta.is_finite() || alpha < PRIOR_ALPHA || beta < PRIOR_BETA {
            return Err(EngineError::InvalidBelief { alpha, beta });
        }
        Ok(Self {
            alpha,
            beta,
            last_updated: None,
        })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn with_timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated = Some(at);
        self
    }

    pub fn total(&self) -> f64 {
        self.alpha + self.beta
    }

    /// Posterior mean, `alpha / (alpha + beta)`.
    pub fn mean(&self) -> f64 {
        self.alpha / self.total()
    }

    /// Pseudo-observations beyond the unit prior. Approximate: increments are
    /// performance-weighted, so this is not an exact play count.
    pub fn total_observations(&self) -> u64 {
        (self.total() - PRIOR_ALPHA - PRIOR_BETA).floor().max(0.0) as u64
    }

    /// Inverse coefficient of variation, in [0, 1]. Zero while the belief is
    /// still the bare unit prior.
    pub fn confidence(&self) -> f64 {
        let total = self.total();
        if total <= PRIOR_ALPHA + PRIOR_BETA {
            return 0.0;
        }
        let mean = self.alpha / total;
        let variance = (self.alpha * self.beta) / (total.powi(2) * (total + 1.0));
        let cv = variance.sqrt() / mean;
        (1.0 / (1.0 + cv)).clamp(0.0, 1.0)
    }

    // Fields are private so growth only happens through the updater.
    pub(crate) fn add_alpha(&mut self, amount: f64) {
        self.alpha += amount;
    }

    pub(crate) fn add_beta(&mut self, amount: f64) {
        self.beta += amount;
    }
}

impl Default for BeliefState {
    fn default() -> Self {
        Self {
            alpha: PRIOR_ALPHA,
            beta: PRIOR_BETA,
            last_updated: None,
        }
    }
}

/// One finished session of a game, as seen by the difficulty estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    accuracy_rate: f64,
    completed: bool,
    timestamp: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(accuracy_rate: f64, completed: bool, timestamp: DateTime<Utc>) -> Result<Self> {
        check_unit_score(accuracy_rate)?;
        Ok(Self {
            session_id: None,
            accuracy_rate,
            completed,
            timestamp,
        })
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn accuracy_rate(&self) -> f64 {
        self.accuracy_rate
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub success: bool,
    pub performance_score: f64,
}

impl Outcome {
    pub fn new(success: bool, performance_score: f64) -> Self {
        Self {
            success,
            performance_score,
        }
    }
}

/// One ranked slot of a personalized game plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceEntry {
    pub arm: Arm,
    pub rank: usize,
    pub sampled_value: f64,
    pub confidence: f64,
    pub mean_success_rate: f64,
    pub total_observations: u64,
    pub difficulty: Difficulty,
    pub question_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adjustment {
    Increase,
    Decrease,
    Maintain,
}

impl Adjustment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Maintain => "maintain",
        }
    }
}
