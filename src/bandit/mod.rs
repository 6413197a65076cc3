//! Adaptive decision core: Beta beliefs per learner x game type, posterior
//! sampling, rolling-window and real-time difficulty. Everything here is pure
//! and does no I/O.

pub mod difficulty;
pub mod planner;
pub mod question_count;
pub mod realtime;
pub mod sampler;
pub mod types;
pub mod updater;

pub use difficulty::DifficultyEstimator;
pub use planner::{BeliefMap, HistoryMap, SequencePlanner};
pub use question_count::QuestionCountPolicy;
pub use realtime::{AdjustmentDecision, RealtimeAdjuster};
pub use sampler::PosteriorSampler;
pub use types::*;
pub use updater::{BetaUpdater, ParameterUpdater};
