//! Property-based tests for belief updates and difficulty decisions.
//!
//! - Monotonicity: alpha and beta never decrease under valid outcomes
//! - Validation: out-of-range scores are rejected without changing state
//! - Planning: every plan is a permutation of the arms with in-range fields

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use adaptive_games::bandit::{
    Arm, BeliefMap, BeliefState, BetaUpdater, Difficulty, HistoryMap, Outcome, ParameterUpdater,
    RealtimeAdjuster, SequencePlanner,
};

fn arb_unit() -> impl Strategy<Value = f64> {
    (0u64..=1000u64).prop_map(|v| v as f64 / 1000.0)
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
    (any::<bool>(), arb_unit()).prop_map(|(success, score)| Outcome::new(success, score))
}

fn arb_out_of_range() -> impl Strategy<Value = f64> {
    prop_oneof![(-100.0f64..-1e-6), (1.0f64 + 1e-6..100.0)]
}

fn arb_belief() -> impl Strategy<Value = BeliefState> {
    (1.0f64..50.0, 1.0f64..50.0).prop_map(|(a, b)| BeliefState::new(a, b).unwrap())
}

fn arb_difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Medium),
        Just(Difficulty::Hard),
    ]
}

proptest! {
    #[test]
    fn prop_updates_are_monotone(outcomes in prop::collection::vec(arb_outcome(), 1..40)) {
        let mut state = BeliefState::default();
        for outcome in &outcomes {
            let next = BetaUpdater.update(&state, outcome).unwrap();
            prop_assert!(next.alpha() >= state.alpha());
            prop_assert!(next.beta() >= state.beta());
            // exactly one side moves (or neither when the increment is zero)
            prop_assert!(next.alpha() == state.alpha() || next.beta() == state.beta());
            state = next;
        }
    }

    #[test]
    fn prop_invalid_scores_rejected(state in arb_belief(), success in any::<bool>(), score in arb_out_of_range()) {
        let before = state.clone();
        prop_assert!(BetaUpdater.update(&state, &Outcome::new(success, score)).is_err());
        prop_assert_eq!(state, before);
        prop_assert!(RealtimeAdjuster.adjust(Difficulty::Medium, score).is_err());
    }

    #[test]
    fn prop_confidence_and_mean_in_unit_range(state in arb_belief()) {
        prop_assert!((0.0..=1.0).contains(&state.confidence()));
        prop_assert!((0.0..=1.0).contains(&state.mean()));
    }

    #[test]
    fn prop_maintain_band_keeps_baseline(baseline in arb_difficulty(), live in 0.3001f64..0.8499) {
        let decision = RealtimeAdjuster.adjust(baseline, live).unwrap();
        prop_assert_eq!(decision.new_difficulty, baseline);
    }

    #[test]
    fn prop_plan_is_ranked_permutation(
        beliefs in prop::collection::vec(arb_belief(), 1..6),
        seed in any::<u64>(),
    ) {
        let map: BeliefMap = beliefs
            .into_iter()
            .enumerate()
            .map(|(i, b)| (Arm::new(format!("game_{i}")), b))
            .collect();
        let plan = SequencePlanner::default().plan(&map, &HistoryMap::new(), &mut ChaCha8Rng::seed_from_u64(seed));

        prop_assert_eq!(plan.len(), map.len());
        for (idx, entry) in plan.iter().enumerate() {
            prop_assert_eq!(entry.rank, idx + 1);
            prop_assert!(map.contains_key(&entry.arm));
            prop_assert!((0.0..=1.0).contains(&entry.sampled_value));
            prop_assert!(entry.question_count > 0);
        }
        prop_assert!(plan.windows(2).all(|w| w[0].sampled_value >= w[1].sampled_value));
    }
}
