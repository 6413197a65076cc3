//! # adaptive-games
//!
//! Per-learner game sequencing and difficulty for an educational game app.
//!
//! - [`bandit`] - Beta beliefs per learner x game type, Thompson-sampling
//!   ranking, rolling-window and real-time difficulty, question counts
//! - [`analytics`] - session metrics to outcomes, aggregate stats
//! - [`store`] - belief/history/stats collaborator traits, in-memory backend
//! - [`service`] - store-facing boundary with timeouts, per-key update
//!   serialization and fallbacks
//!
//! ```rust
//! use adaptive_games::bandit::{Arm, BeliefMap, HistoryMap, SequencePlanner};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let beliefs: BeliefMap = Arm::well_known()
//!     .into_iter()
//!     .map(|arm| (arm, Default::default()))
//!     .collect();
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let plan = SequencePlanner::default().plan(&beliefs, &HistoryMap::new(), &mut rng);
//! assert_eq!(plan.len(), 3);
//! ```

pub mod analytics;
pub mod bandit;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod store;

pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use service::{AdaptiveService, EngineContext};
