use serde::{Deserialize, Serialize};

use crate::bandit::types::{Adjustment, Difficulty};
use crate::error::{check_unit_score, Result};

const INCREASE_THRESHOLD: f64 = 0.85;
const DECREASE_THRESHOLD: f64 = 0.30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentDecision {
    pub adjustment: Adjustment,
    pub new_difficulty: Difficulty,
    /// Display text only.
    pub reasoning: String,
}

/// Mid-session override of the baseline difficulty.
///
/// Threshold breaches jump straight to the ceiling or floor; there is no
/// stepping through medium.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealtimeAdjuster;

impl RealtimeAdjuster {
    pub fn adjust(&self, baseline: Difficulty, live_performance: f64) -> Result<AdjustmentDecision> {
        let performance = check_unit_score(live_performance)?;

        let (adjustment, new_difficulty) = if performance >= INCREASE_THRESHOLD {
            (Adjustment::Increase, Difficulty::Hard)
        } else if performance <= DECREASE_THRESHOLD {
            (Adjustment::Decrease, Difficulty::Easy)
        } else {
            (Adjustment::Maintain, baseline)
        };

        Ok(AdjustmentDecision {
            adjustment,
            new_difficulty,
            reasoning: reasoning(performance, adjustment),
        })
    }
}

fn reasoning(performance: f64, adjustment: Adjustment) -> String {
    let pct = (performance * 100.0).round();
    match adjustment {
        Adjustment::Increase => {
            format!("Student is excelling ({pct:.0}% accuracy) - increasing challenge")
        }
        Adjustment::Decrease => format!("Student struggling ({pct:.0}% accuracy) - providing support"),
        Adjustment::Maintain => {
            format!("Student performing well ({pct:.0}% accuracy) - maintaining level")
        }
    }
}
