use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::analytics::AggregateStats;
use crate::bandit::planner::BeliefMap;
use crate::bandit::types::{Arm, BeliefState, SessionRecord};
use crate::error::StoreError;
use crate::store::{BeliefStore, HistoryStore, StatsStore};

type HistoryKey = (String, Arm);

/// Process-local store. The availability and latency switches let callers
/// exercise the degraded paths without a real backend.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    beliefs: RwLock<HashMap<String, BeliefMap>>,
    histories: RwLock<HashMap<HistoryKey, Vec<SessionRecord>>>,
    stats: RwLock<HashMap<String, BTreeMap<Arm, AggregateStats>>>,
    offline: AtomicBool,
    delay_ms: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms
            .store(delay.as_millis().min(u128::from(u64::MAX)) as u64, Ordering::Relaxed);
    }

    async fn gate(&self) -> Result<(), StoreError> {
        let delay = Duration::from_millis(self.delay_ms.load(Ordering::Relaxed));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.offline.load(Ordering::Relaxed) {
            return Err(StoreError::Backend("in-memory store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BeliefStore for InMemoryStore {
    async fn get(&self, learner: &str, arm: &Arm) -> Result<Option<BeliefState>, StoreError> {
        self.gate().await?;
        Ok(self
            .beliefs
            .read()
            .get(learner)
            .and_then(|arms| arms.get(arm))
            .cloned())
    }

    async fn get_all(&self, learner: &str) -> Result<BeliefMap, StoreError> {
        self.gate().await?;
        Ok(self.beliefs.read().get(learner).cloned().unwrap_or_default())
    }

    async fn put(&self, learner: &str, arm: &Arm, state: BeliefState) -> Result<(), StoreError> {
        self.gate().await?;
        self.beliefs
            .write()
            .entry(learner.to_string())
            .or_default()
            .insert(arm.clone(), state);
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for InMemoryStore {
    async fn recent(
        &self,
        learner: &str,
        arm: &Arm,
        limit: usize,
    ) -> Result<Vec<SessionRecord>, StoreError> {
        self.gate().await?;
        let key = (learner.to_string(), arm.clone());
        Ok(self
            .histories
            .read()
            .get(&key)
            .map(|records| records.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn recent_all(&self, learner: &str, limit: usize) -> Result<Vec<(Arm, SessionRecord)>, StoreError> {
        self.gate().await?;
        let mut records: Vec<(Arm, SessionRecord)> = self
            .histories
            .read()
            .iter()
            .filter(|((owner, _), _)| owner == learner)
            .flat_map(|((_, arm), records)| records.iter().map(move |r| (arm.clone(), r.clone())))
            .collect();
        records.sort_by(|a, b| b.1.timestamp().cmp(&a.1.timestamp()).then_with(|| a.0.cmp(&b.0)));
        records.truncate(limit);
        Ok(records)
    }

    async fn append(&self, learner: &str, arm: &Arm, record: SessionRecord) -> Result<(), StoreError> {
        self.gate().await?;
        let mut histories = self.histories.write();
        let records = histories.entry((learner.to_string(), arm.clone())).or_default();
        // Newest first; equal timestamps keep arrival order newest-first too.
        let pos = records
            .iter()
            .position(|r| r.timestamp() <= record.timestamp())
            .unwrap_or(records.len());
        records.insert(pos, record);
        Ok(())
    }

    async fn contains_session(&self, learner: &str, arm: &Arm, session_id: &str) -> Result<bool, StoreError> {
        self.gate().await?;
        let key = (learner.to_string(), arm.clone());
        Ok(self
            .histories
            .read()
            .get(&key)
            .is_some_and(|records| records.iter().any(|r| r.session_id() == Some(session_id))))
    }
}

#[async_trait]
impl StatsStore for InMemoryStore {
    async fn stats(&self, learner: &str, arm: &Arm) -> Result<Option<AggregateStats>, StoreError> {
        self.gate().await?;
        Ok(self
            .stats
            .read()
            .get(learner)
            .and_then(|arms| arms.get(arm))
            .cloned())
    }

    async fn all_stats(&self, learner: &str) -> Result<Vec<(Arm, AggregateStats)>, StoreError> {
        self.gate().await?;
        Ok(self
            .stats
            .read()
            .get(learner)
            .map(|arms| arms.iter().map(|(a, s)| (a.clone(), s.clone())).collect())
            .unwrap_or_default())
    }

    async fn put_stats(&self, learner: &str, arm: &Arm, stats: AggregateStats) -> Result<(), StoreError> {
        self.gate().await?;
        self.stats
            .write()
            .entry(learner.to_string())
            .or_default()
            .insert(arm.clone(), stats);
        Ok(())
    }
}
