use std::cmp::Ordering;
use std::collections::BTreeMap;

use rand::Rng;

use crate::bandit::difficulty::DifficultyEstimator;
use crate::bandit::question_count::QuestionCountPolicy;
use crate::bandit::sampler::PosteriorSampler;
use crate::bandit::types::{Arm, BeliefState, Difficulty, SequenceEntry, SessionRecord};

/// Order used when there is nothing to rank.
pub const FALLBACK_ORDER: [&str; 3] = [Arm::SPELLING, Arm::BALLOON_MATH, Arm::GENERAL_KNOWLEDGE];
const FALLBACK_SAMPLE: f64 = 0.5;

pub type BeliefMap = BTreeMap<Arm, BeliefState>;
pub type HistoryMap = BTreeMap<Arm, Vec<SessionRecord>>;

struct Draw<'a> {
    arm: &'a Arm,
    state: &'a BeliefState,
    sample: f64,
    mean: f64,
}

/// Thompson-sampling ranking of game types for one learner.
#[derive(Debug, Clone, Default)]
pub struct SequencePlanner {
    sampler: PosteriorSampler,
    estimator: DifficultyEstimator,
    policy: QuestionCountPolicy,
}

impl SequencePlanner {
    pub fn new(estimator: DifficultyEstimator, policy: QuestionCountPolicy) -> Self {
        Self {
            sampler: PosteriorSampler,
            estimator,
            policy,
        }
    }

    pub fn estimator(&self) -> &DifficultyEstimator {
        &self.estimator
    }

    pub fn policy(&self) -> &QuestionCountPolicy {
        &self.policy
    }

    /// Ranks every arm in `beliefs` by a fresh posterior draw.
    ///
    /// Draws are taken in arm order, so the same beliefs, histories and seed
    /// always give the same plan. Ties fall back to posterior mean, then arm
    /// id. An empty belief map yields [`fallback_plan`](Self::fallback_plan).
    pub fn plan<R: Rng + ?Sized>(
        &self,
        beliefs: &BeliefMap,
        histories: &HistoryMap,
        rng: &mut R,
    ) -> Vec<SequenceEntry> {
        if beliefs.is_empty() {
            return self.fallback_plan();
        }

        let mut draws: Vec<Draw<'_>> = beliefs
            .iter()
            .map(|(arm, state)| Draw {
                arm,
                state,
                sample: self.sampler.sample(state, rng),
                mean: state.mean(),
            })
            .collect();

        draws.sort_by(rank_order);

        draws
            .into_iter()
            .enumerate()
            .map(|(idx, draw)| {
                let history = histories.get(draw.arm).map(Vec::as_slice).unwrap_or(&[]);
                let difficulty = self.estimator.baseline_difficulty(history);
                SequenceEntry {
                    arm: draw.arm.clone(),
                    rank: idx + 1,
                    sampled_value: draw.sample,
                    confidence: draw.state.confidence(),
                    mean_success_rate: draw.mean,
                    total_observations: draw.state.total_observations(),
                    difficulty,
                    question_count: self.policy.count(difficulty, draw.arm),
                }
            })
            .collect()
    }

    /// Fixed plan served when beliefs are missing or the store is down.
    pub fn fallback_plan(&self) -> Vec<SequenceEntry> {
        FALLBACK_ORDER
            .iter()
            .enumerate()
            .map(|(idx, id)| {
                let arm = Arm::new(*id);
                let question_count = self.policy.count(Difficulty::Medium, &arm);
                SequenceEntry {
                    arm,
                    rank: idx + 1,
                    sampled_value: FALLBACK_SAMPLE,
                    confidence: 0.0,
                    mean_success_rate: FALLBACK_SAMPLE,
                    total_observations: 0,
                    difficulty: Difficulty::Medium,
                    question_count,
                }
            })
            .collect()
    }
}

fn rank_order(a: &Draw<'_>, b: &Draw<'_>) -> Ordering {
    b.sample
        .total_cmp(&a.sample)
        .then_with(|| b.mean.total_cmp(&a.mean))
        .then_with(|| a.arm.cmp(b.arm))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn uniform_beliefs() -> BeliefMap {
        Arm::well_known()
            .into_iter()
            .map(|arm| (arm, BeliefState::default()))
            .collect()
    }

    #[test]
    fn test_fresh_learner_plan_shape() {
        let planner = SequencePlanner::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let plan = planner.plan(&uniform_beliefs(), &HistoryMap::new(), &mut rng);

        assert_eq!(plan.len(), 3);
        for (idx, entry) in plan.iter().enumerate() {
            assert_eq!(entry.rank, idx + 1);
            assert_eq!(entry.confidence, 0.0);
            assert_eq!(entry.total_observations, 0);
            assert_eq!(entry.difficulty, Difficulty::Medium);
            assert_eq!(
                entry.question_count,
                planner.policy().count(Difficulty::Medium, &entry.arm)
            );
        }
        assert!(plan.windows(2).all(|w| w[0].sampled_value >= w[1].sampled_value));
    }

    #[test]
    fn test_same_seed_same_plan() {
        let planner = SequencePlanner::default();
        let mut beliefs = uniform_beliefs();
        beliefs.insert(Arm::new(Arm::SPELLING), BeliefState::new(4.3, 2.1).unwrap());

        let a = planner.plan(&beliefs, &HistoryMap::new(), &mut ChaCha8Rng::seed_from_u64(11));
        let b = planner.plan(&beliefs, &HistoryMap::new(), &mut ChaCha8Rng::seed_from_u64(11));
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn test_ties_break_on_mean_then_arm() {
        let strong = BeliefState::new(5.0, 1.0).unwrap();
        let weak = BeliefState::new(1.0, 5.0).unwrap();
        let alpha = Arm::new("alpha");
        let beta = Arm::new("beta");
        let gamma = Arm::new("gamma");

        let mut draws = vec![
            Draw { arm: &gamma, state: &weak, sample: 0.4, mean: weak.mean() },
            Draw { arm: &beta, state: &weak, sample: 0.4, mean: weak.mean() },
            Draw { arm: &alpha, state: &strong, sample: 0.4, mean: strong.mean() },
        ];
        draws.sort_by(rank_order);
        let order: Vec<_> = draws.iter().map(|d| d.arm.as_str()).collect();
        assert_eq!(order, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_history_drives_difficulty_and_count() {
        let planner = SequencePlanner::default();
        let math = Arm::new(Arm::BALLOON_MATH);
        let now = chrono::Utc::now();
        let mut histories = HistoryMap::new();
        histories.insert(
            math.clone(),
            vec![SessionRecord::new(0.95, true, now).unwrap(); 5],
        );

        let plan = planner.plan(&uniform_beliefs(), &histories, &mut ChaCha8Rng::seed_from_u64(5));
        let entry = plan.iter().find(|e| e.arm == math).unwrap();
        assert_eq!(entry.difficulty, Difficulty::Hard);
        assert_eq!(entry.question_count, 8);
    }

    #[test]
    fn test_empty_beliefs_fall_back() {
        let planner = SequencePlanner::default();
        let plan = planner.plan(&BeliefMap::new(), &HistoryMap::new(), &mut ChaCha8Rng::seed_from_u64(0));
        let arms: Vec<_> = plan.iter().map(|e| e.arm.as_str()).collect();
        assert_eq!(arms, vec!["spelling", "balloon_math", "general_knowledge"]);
        let counts: Vec<_> = plan.iter().map(|e| e.question_count).collect();
        assert_eq!(counts, vec![6, 5, 5]);
        assert!(plan.iter().all(|e| e.difficulty == Difficulty::Medium && e.confidence == 0.0));
    }

    #[test]
    fn test_entry_statistics_follow_belief() {
        let planner = SequencePlanner::default();
        let mut beliefs = BeliefMap::new();
        beliefs.insert(Arm::new(Arm::SPELLING), BeliefState::new(3.5, 2.0).unwrap());
        let plan = planner.plan(&beliefs, &HistoryMap::new(), &mut ChaCha8Rng::seed_from_u64(2));
        let entry = &plan[0];
        assert!((entry.mean_success_rate - 3.5 / 5.5).abs() < 1e-12);
        assert_eq!(entry.total_observations, 3);
        assert!(entry.confidence > 0.0 && entry.confidence <= 1.0);
        assert!((0.0..=1.0).contains(&entry.sampled_value));
    }
}
