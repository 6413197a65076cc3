use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bandit::types::{Arm, Difficulty};
use crate::error::ConfigError;

/// Count used for any (difficulty, arm) pair missing from the table.
pub const DEFAULT_QUESTION_COUNT: u32 = 5;

pub type QuestionTable = BTreeMap<Difficulty, BTreeMap<Arm, u32>>;

/// Static (difficulty, arm) -> question count lookup.
///
/// For spelling the count is the target word length rather than a number of
/// questions. Deserialization goes through [`QuestionCountPolicy::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QuestionTable", into = "QuestionTable")]
pub struct QuestionCountPolicy {
    table: QuestionTable,
}

impl TryFrom<QuestionTable> for QuestionCountPolicy {
    type Error = ConfigError;

    fn try_from(table: QuestionTable) -> Result<Self, ConfigError> {
        Self::new(table)
    }
}

impl From<QuestionCountPolicy> for QuestionTable {
    fn from(policy: QuestionCountPolicy) -> Self {
        policy.table
    }
}

impl Default for QuestionCountPolicy {
    fn default() -> Self {
        let row = |math: u32, knowledge: u32, spelling: u32| {
            BTreeMap::from([
                (Arm::new(Arm::BALLOON_MATH), math),
                (Arm::new(Arm::GENERAL_KNOWLEDGE), knowledge),
                (Arm::new(Arm::SPELLING), spelling),
            ])
        };
        Self {
            table: BTreeMap::from([
                (Difficulty::Easy, row(3, 3, 4)),
                (Difficulty::Medium, row(5, 5, 6)),
                (Difficulty::Hard, row(8, 8, 8)),
            ]),
        }
    }
}

impl QuestionCountPolicy {
    pub fn new(table: QuestionTable) -> Result<Self, ConfigError> {
        for (difficulty, row) in &table {
            if let Some((arm, _)) = row.iter().find(|(_, count)| **count == 0) {
                return Err(ConfigError::ZeroQuestionCount {
                    difficulty: difficulty.to_string(),
                    arm: arm.to_string(),
                });
            }
        }
        Ok(Self { table })
    }

    /// Parses `{"easy": {"spelling": 4, ...}, ...}`.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let table: QuestionTable = serde_json::from_str(raw)?;
        Self::new(table)
    }

    pub fn count(&self, difficulty: Difficulty, arm: &Arm) -> u32 {
        self.table
            .get(&difficulty)
            .and_then(|row| row.get(arm))
            .copied()
            .unwrap_or(DEFAULT_QUESTION_COUNT)
    }
}
