use crate::bandit::types::{BeliefState, Outcome};
use crate::error::{check_unit_score, Result};

/// Folds one session outcome into an arm's belief.
///
/// Implementations must be pure: persisting the returned state is the
/// caller's job, and applying the same outcome twice counts it twice.
pub trait ParameterUpdater: Send + Sync {
    fn update(&self, state: &BeliefState, outcome: &Outcome) -> Result<BeliefState>;

    /// Same as [`update`](Self::update) for an arm that has no stored belief yet.
    fn update_or_init(&self, state: Option<&BeliefState>, outcome: &Outcome) -> Result<BeliefState> {
        match state {
            Some(existing) => self.update(existing, outcome),
            None => self.update(&BeliefState::default(), outcome),
        }
    }
}

/// Performance-weighted Beta update.
///
/// - success: `alpha += score`
/// - failure: `beta += 1 - score`
#[derive(Debug, Clone, Copy, Default)]
pub struct BetaUpdater;

impl ParameterUpdater for BetaUpdater {
    fn update(&self, state: &BeliefState, outcome: &Outcome) -> Result<BeliefState> {
        let score = check_unit_score(outcome.performance_score)?;
        let mut next = state.clone();
        if outcome.success {
            next.add_alpha(score);
        } else {
            next.add_beta(1.0 - score);
        }
        Ok(next)
    }
}
