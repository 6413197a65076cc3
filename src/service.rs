//! Store-facing boundary around the pure bandit core.
//!
//! Infrastructure failures are handled here and only here: planning and
//! difficulty reads degrade to documented defaults, while writes surface
//! [`EngineError::StoreUnavailable`] so the caller can retry.

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::analytics::{AggregateStats, SessionAnalytics};
use crate::bandit::planner::{BeliefMap, HistoryMap};
use crate::bandit::{
    Adjustment, Arm, BeliefState, BetaUpdater, Difficulty, DifficultyEstimator, Outcome,
    ParameterUpdater, RealtimeAdjuster, SequenceEntry, SequencePlanner, SessionRecord,
};
use crate::config::EngineConfig;
use crate::error::{check_unit_score, Result, StoreError};
use crate::store::{BeliefStore, HistoryStore, InMemoryStore, StatsStore};

const MAX_KEY_LOCKS: usize = 1000;

/// Everything the service needs, built once per process and passed in.
#[derive(Clone)]
pub struct EngineContext {
    pub config: EngineConfig,
    pub beliefs: Arc<dyn BeliefStore>,
    pub history: Arc<dyn HistoryStore>,
    pub stats: Arc<dyn StatsStore>,
    pub updater: Arc<dyn ParameterUpdater>,
}

impl EngineContext {
    pub fn new(
        config: EngineConfig,
        beliefs: Arc<dyn BeliefStore>,
        history: Arc<dyn HistoryStore>,
        stats: Arc<dyn StatsStore>,
    ) -> Self {
        Self {
            config,
            beliefs,
            history,
            stats,
            updater: Arc::new(BetaUpdater),
        }
    }

    /// Context backed by a single [`InMemoryStore`], returned alongside so
    /// callers can inspect or fault it.
    pub fn in_memory(config: EngineConfig) -> (Self, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let ctx = Self::new(config, store.clone(), store.clone(), store.clone());
        (ctx, store)
    }

    pub fn with_updater(mut self, updater: Arc<dyn ParameterUpdater>) -> Self {
        self.updater = updater;
        self
    }
}

/// Result of a mid-session difficulty check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeAdjustment {
    pub baseline_difficulty: Difficulty,
    pub live_performance: f64,
    pub adjustment: Adjustment,
    pub new_difficulty: Difficulty,
    pub question_count: u32,
    pub reasoning: String,
}

/// One stored session and the game type it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentSession {
    pub arm: Arm,
    #[serde(flatten)]
    pub record: SessionRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyRecommendation {
    pub arm: Arm,
    pub difficulty: Difficulty,
    pub question_count: u32,
}

pub struct AdaptiveService {
    ctx: EngineContext,
    planner: SequencePlanner,
    adjuster: RealtimeAdjuster,
    key_locks: Mutex<HashMap<(String, Arm), Arc<tokio::sync::Mutex<()>>>>,
    seed_counter: AtomicU64,
}

impl AdaptiveService {
    pub fn new(ctx: EngineContext) -> Self {
        let planner = SequencePlanner::new(
            DifficultyEstimator::new(ctx.config.history_window),
            ctx.config.question_counts.clone(),
        );
        Self {
            ctx,
            planner,
            adjuster: RealtimeAdjuster,
            key_locks: Mutex::new(HashMap::new()),
            seed_counter: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    pub fn question_count(&self, difficulty: Difficulty, arm: &Arm) -> u32 {
        self.planner.policy().count(difficulty, arm)
    }

    /// Personalized game order for `learner`. Never fails: store trouble
    /// yields the fallback plan, which has the same shape.
    pub async fn plan_sequence(&self, learner: &str) -> Vec<SequenceEntry> {
        let mut rng = self.next_rng();
        self.plan_sequence_with_rng(learner, &mut rng).await
    }

    pub async fn plan_sequence_with_rng<R: Rng + ?Sized>(
        &self,
        learner: &str,
        rng: &mut R,
    ) -> Vec<SequenceEntry> {
        let inputs = self.bounded(self.load_plan_inputs(learner)).await;
        let plan = match inputs {
            Ok((beliefs, histories)) => self.planner.plan(&beliefs, &histories, rng),
            Err(err) => {
                tracing::warn!(learner = %learner, error = %err, "plan inputs unavailable, serving fallback plan");
                self.planner.fallback_plan()
            }
        };

        tracing::debug!(
            learner = %learner,
            order = ?plan.iter().map(|e| e.arm.as_str()).collect::<Vec<_>>(),
            "game sequence planned"
        );
        plan
    }

    /// Applies one real session outcome to the learner's belief for `arm`.
    pub async fn record_outcome(&self, learner: &str, arm: &Arm, outcome: Outcome) -> Result<BeliefState> {
        check_unit_score(outcome.performance_score)?;
        let lock = self.key_lock(learner, arm);
        let _guard = lock.lock().await;
        self.apply_outcome_locked(learner, arm, &outcome).await
    }

    /// Stores a finished session and learns from it.
    ///
    /// The belief is computed before anything is written, then committed in
    /// the order belief, history, stats. A failed belief write leaves nothing
    /// behind. Once the history record (tagged with the session id) exists, a
    /// retry only finishes the stats fold and never re-applies the outcome.
    pub async fn record_session(&self, session: &SessionAnalytics) -> Result<BeliefState> {
        session.validate()?;
        let now = Utc::now();
        let record = session.to_record(now)?;
        let outcome = session.outcome();
        let (learner, arm) = (session.learner.as_str(), &session.arm);

        let lock = self.key_lock(learner, arm);
        let _guard = lock.lock().await;

        let prior = self.bounded(self.ctx.beliefs.get(learner, arm)).await?;
        let already_recorded = self
            .bounded(self.ctx.history.contains_session(learner, arm, &session.session_id))
            .await?;
        if already_recorded {
            self.fold_stats(session, now).await?;
            tracing::info!(
                learner = %learner,
                arm = %arm,
                session_id = %session.session_id,
                "session already recorded, belief left as is"
            );
            return Ok(prior.unwrap_or_default());
        }

        let next = self
            .ctx
            .updater
            .update_or_init(prior.as_ref(), &outcome)?
            .with_timestamp(now);
        self.bounded(self.ctx.beliefs.put(learner, arm, next.clone())).await?;
        self.bounded(self.ctx.history.append(learner, arm, record)).await?;
        self.fold_stats(session, now).await?;

        tracing::info!(
            learner = %learner,
            arm = %arm,
            session_id = %session.session_id,
            score = outcome.performance_score,
            success = outcome.success,
            alpha = next.alpha(),
            beta = next.beta(),
            "session recorded"
        );
        Ok(next)
    }

    /// Baseline difficulty from recent history; medium when history is
    /// unreachable.
    pub async fn baseline_difficulty(&self, learner: &str, arm: &Arm) -> Difficulty {
        let estimator = self.planner.estimator();
        match self
            .bounded(self.ctx.history.recent(learner, arm, estimator.window()))
            .await
        {
            Ok(history) => estimator.baseline_difficulty(&history),
            Err(err) => {
                tracing::warn!(learner = %learner, arm = %arm, error = %err, "history unavailable, defaulting to medium");
                Difficulty::Medium
            }
        }
    }

    /// Difficulty and question count for the next game. An explicit override
    /// skips the history lookup.
    pub async fn recommend_difficulty(
        &self,
        learner: &str,
        arm: &Arm,
        override_difficulty: Option<Difficulty>,
    ) -> DifficultyRecommendation {
        let difficulty = match override_difficulty {
            Some(d) => d,
            None => self.baseline_difficulty(learner, arm).await,
        };
        DifficultyRecommendation {
            arm: arm.clone(),
            difficulty,
            question_count: self.question_count(difficulty, arm),
        }
    }

    pub async fn realtime_adjustment(
        &self,
        learner: &str,
        arm: &Arm,
        live_performance: f64,
    ) -> Result<RealtimeAdjustment> {
        check_unit_score(live_performance)?;
        let baseline = self.baseline_difficulty(learner, arm).await;
        let decision = self.adjuster.adjust(baseline, live_performance)?;

        if decision.adjustment != Adjustment::Maintain {
            tracing::info!(
                learner = %learner,
                arm = %arm,
                adjustment = decision.adjustment.as_str(),
                from = %baseline,
                to = %decision.new_difficulty,
                "difficulty adjusted mid-session"
            );
        }

        Ok(RealtimeAdjustment {
            baseline_difficulty: baseline,
            live_performance,
            adjustment: decision.adjustment,
            new_difficulty: decision.new_difficulty,
            question_count: self.question_count(decision.new_difficulty, arm),
            reasoning: decision.reasoning,
        })
    }

    pub async fn learner_stats(&self, learner: &str, arm: &Arm) -> Result<Option<AggregateStats>> {
        Ok(self.bounded(self.ctx.stats.stats(learner, arm)).await?)
    }

    /// Stats for every game type the learner has played.
    pub async fn all_learner_stats(&self, learner: &str) -> Result<BTreeMap<Arm, AggregateStats>> {
        let all = self.bounded(self.ctx.stats.all_stats(learner)).await?;
        Ok(all.into_iter().collect())
    }

    /// Composite per-arm score (accuracy, completion, engagement).
    pub async fn performance_scores(&self, learner: &str) -> Result<BTreeMap<Arm, f64>> {
        let all = self.all_learner_stats(learner).await?;
        Ok(all
            .into_iter()
            .map(|(arm, stats)| {
                let score = stats.composite_score();
                (arm, score)
            })
            .collect())
    }

    /// Up to `limit` recorded sessions, newest first, for one game type or
    /// across all of them.
    pub async fn recent_sessions(
        &self,
        learner: &str,
        arm: Option<&Arm>,
        limit: usize,
    ) -> Result<Vec<RecentSession>> {
        let records: Vec<(Arm, SessionRecord)> = match arm {
            Some(arm) => self
                .bounded(self.ctx.history.recent(learner, arm, limit))
                .await?
                .into_iter()
                .map(|record| (arm.clone(), record))
                .collect(),
            None => self.bounded(self.ctx.history.recent_all(learner, limit)).await?,
        };
        Ok(records
            .into_iter()
            .map(|(arm, record)| RecentSession { arm, record })
            .collect())
    }

    async fn fold_stats(&self, session: &SessionAnalytics, at: DateTime<Utc>) -> Result<()> {
        let (learner, arm) = (session.learner.as_str(), &session.arm);
        let mut stats = self
            .bounded(self.ctx.stats.stats(learner, arm))
            .await?
            .unwrap_or_default();
        if stats.record(session, at) {
            self.bounded(self.ctx.stats.put_stats(learner, arm, stats)).await?;
        }
        Ok(())
    }

    async fn apply_outcome_locked(&self, learner: &str, arm: &Arm, outcome: &Outcome) -> Result<BeliefState> {
        let prior = self.bounded(self.ctx.beliefs.get(learner, arm)).await?;
        let next = self
            .ctx
            .updater
            .update_or_init(prior.as_ref(), outcome)?
            .with_timestamp(Utc::now());
        self.bounded(self.ctx.beliefs.put(learner, arm, next.clone())).await?;

        tracing::info!(
            learner = %learner,
            arm = %arm,
            alpha = next.alpha(),
            beta = next.beta(),
            "belief updated"
        );
        Ok(next)
    }

    async fn load_plan_inputs(&self, learner: &str) -> std::result::Result<(BeliefMap, HistoryMap), StoreError> {
        let mut beliefs = self.ctx.beliefs.get_all(learner).await?;
        for arm in &self.ctx.config.arms {
            beliefs.entry(arm.clone()).or_default();
        }

        let window = self.planner.estimator().window();
        let mut histories = HistoryMap::new();
        for arm in beliefs.keys() {
            let records = self.ctx.history.recent(learner, arm, window).await?;
            histories.insert(arm.clone(), records);
        }
        Ok((beliefs, histories))
    }

    async fn bounded<T, F>(&self, fut: F) -> std::result::Result<T, StoreError>
    where
        F: Future<Output = std::result::Result<T, StoreError>>,
    {
        let limit = self.ctx.config.store_timeout;
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(limit)),
        }
    }

    fn key_lock(&self, learner: &str, arm: &Arm) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.key_locks.lock();
        if locks.len() > MAX_KEY_LOCKS {
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        }
        locks
            .entry((learner.to_string(), arm.clone()))
            .or_default()
            .clone()
    }

    fn next_rng(&self) -> ChaCha8Rng {
        match self.ctx.config.rng_seed {
            Some(base) => {
                let offset = self.seed_counter.fetch_add(1, Ordering::Relaxed);
                ChaCha8Rng::seed_from_u64(base.wrapping_add(offset))
            }
            None => ChaCha8Rng::from_entropy(),
        }
    }
}
