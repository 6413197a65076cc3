//! Collaborator interfaces for learner data, plus an in-memory backend.

pub mod memory;

use async_trait::async_trait;

use crate::analytics::AggregateStats;
use crate::bandit::planner::BeliefMap;
use crate::bandit::types::{Arm, BeliefState, SessionRecord};
use crate::error::StoreError;

pub use memory::InMemoryStore;

/// Key-value store of per learner x arm beliefs.
#[async_trait]
pub trait BeliefStore: Send + Sync {
    /// `None` means no belief has been written yet.
    async fn get(&self, learner: &str, arm: &Arm) -> Result<Option<BeliefState>, StoreError>;

    async fn get_all(&self, learner: &str) -> Result<BeliefMap, StoreError>;

    async fn put(&self, learner: &str, arm: &Arm, state: BeliefState) -> Result<(), StoreError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// At most `limit` records, most recent first.
    async fn recent(
        &self,
        learner: &str,
        arm: &Arm,
        limit: usize,
    ) -> Result<Vec<SessionRecord>, StoreError>;

    /// At most `limit` records across every arm, most recent first.
    async fn recent_all(&self, learner: &str, limit: usize) -> Result<Vec<(Arm, SessionRecord)>, StoreError>;

    async fn append(&self, learner: &str, arm: &Arm, record: SessionRecord) -> Result<(), StoreError>;

    /// Whether a record tagged with `session_id` is already stored.
    async fn contains_session(&self, learner: &str, arm: &Arm, session_id: &str) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn stats(&self, learner: &str, arm: &Arm) -> Result<Option<AggregateStats>, StoreError>;

    async fn all_stats(&self, learner: &str) -> Result<Vec<(Arm, AggregateStats)>, StoreError>;

    async fn put_stats(&self, learner: &str, arm: &Arm, stats: AggregateStats) -> Result<(), StoreError>;
}
