use async_trait::async_trait;
use chrono::NaiveDate;
use quiz_core::model::{
    Badge, GlobalStats, HistoryEntry, ProgressEntry, QuizId, QuizKey, StreakDay, ThemeId,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Payload for one save, applied all-or-nothing.
///
/// Mirrors the five sub-steps of a save: upsert the entry, append a history
/// line, add the counter deltas, mark the quiz completed (set semantics) and
/// persist badges earned by this save. The streak day is bumped alongside.
/// Repositories must commit every field or none of them.
#[derive(Debug, Clone)]
pub struct AttemptWrite {
    pub entry: ProgressEntry,
    pub history: HistoryEntry,
    pub questions_delta: u64,
    pub correct_delta: u64,
    pub time_delta: u64,
    /// Present iff the attempt was completed; insertion is idempotent.
    pub completed: Option<QuizKey>,
    pub new_badges: Vec<Badge>,
    pub streak_day: NaiveDate,
}

impl AttemptWrite {
    /// Build the write for an entry whose latest result is the attempt being
    /// saved. Deltas are taken from that result, so the counters stay in
    /// lock-step with `GlobalStats::record`.
    #[must_use]
    pub fn for_entry(entry: ProgressEntry, recorded_at: chrono::DateTime<chrono::Utc>) -> Self {
        let result = entry.result();
        let history = HistoryEntry::of(result, recorded_at);
        let completed = result.completed().then(|| result.key());
        let questions_delta = u64::from(result.total());
        let correct_delta = u64::from(result.score());
        let time_delta = result.total_time_seconds();
        Self {
            entry,
            history,
            questions_delta,
            correct_delta,
            time_delta,
            completed,
            new_badges: Vec::new(),
            streak_day: recorded_at.date_naive(),
        }
    }

    #[must_use]
    pub fn with_badges(mut self, badges: Vec<Badge>) -> Self {
        self.new_badges = badges;
        self
    }
}

/// Repository contract for the progress-entries partition plus the save
/// transaction that spans all partitions.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Commit one save as a single transaction.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the transaction aborts; no partial state is
    /// visible afterwards.
    async fn save_attempt(&self, write: &AttemptWrite) -> Result<(), StorageError>;

    /// Fetch the latest entry for a (theme, quiz) pair.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure; a missing entry is `Ok(None)`.
    async fn get_entry(
        &self,
        theme_id: ThemeId,
        quiz_id: QuizId,
    ) -> Result<Option<ProgressEntry>, StorageError>;

    /// All entries, sorted by key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn list_entries(&self) -> Result<Vec<(QuizKey, ProgressEntry)>, StorageError>;
}

/// Read access to the global-stats partition.
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Assemble the full aggregate: counters, completed set and history
    /// (newest first).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn global_stats(&self) -> Result<GlobalStats, StorageError>;
}

#[async_trait]
pub trait BadgeRepository: Send + Sync {
    /// All earned badges, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn list_badges(&self) -> Result<Vec<Badge>, StorageError>;
}

#[async_trait]
pub trait StreakRepository: Send + Sync {
    /// Per-day activity counts, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on storage failure.
    async fn list_days(&self) -> Result<Vec<StreakDay>, StorageError>;
}

/// Whole-store maintenance.
#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Wipe every partition back to first-run state in one atomic operation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the wipe cannot be committed.
    async fn reset_all(&self) -> Result<(), StorageError>;
}

/// In-memory repository for testing and prototyping.
///
/// One mutex guards every partition, so `save_attempt` and `reset_all` are
/// trivially atomic. `fail_next_write` lets tests simulate a storage abort
/// before any mutation happens.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
    fail_next_write: Arc<AtomicBool>,
}

#[derive(Default)]
struct InMemoryState {
    entries: BTreeMap<QuizKey, ProgressEntry>,
    stats: GlobalStats,
    badges: Vec<Badge>,
    streaks: BTreeMap<NaiveDate, u32>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next mutating call fail with `StorageError::Connection`
    /// without touching any partition.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    fn take_injected_failure(&self) -> Result<(), StorageError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(StorageError::Connection("injected write failure".into()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn save_attempt(&self, write: &AttemptWrite) -> Result<(), StorageError> {
        self.take_injected_failure()?;
        let mut guard = self.lock()?;

        let key = write.entry.result().key();
        guard.entries.insert(key, write.entry.clone());
        guard.stats.history.insert(0, write.history.clone());
        guard.stats.total_questions_answered = guard
            .stats
            .total_questions_answered
            .saturating_add(write.questions_delta);
        guard.stats.total_correct_answers = guard
            .stats
            .total_correct_answers
            .saturating_add(write.correct_delta);
        guard.stats.total_time_played_seconds = guard
            .stats
            .total_time_played_seconds
            .saturating_add(write.time_delta);
        if let Some(completed) = write.completed {
            guard.stats.completed_quizzes.insert(completed);
        }
        for badge in &write.new_badges {
            if !guard.badges.iter().any(|b| b.id == badge.id) {
                guard.badges.push(badge.clone());
            }
        }
        *guard.streaks.entry(write.streak_day).or_insert(0) += 1;

        Ok(())
    }

    async fn get_entry(
        &self,
        theme_id: ThemeId,
        quiz_id: QuizId,
    ) -> Result<Option<ProgressEntry>, StorageError> {
        let guard = self.lock()?;
        Ok(guard.entries.get(&QuizKey::new(theme_id, quiz_id)).cloned())
    }

    async fn list_entries(&self) -> Result<Vec<(QuizKey, ProgressEntry)>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .entries
            .iter()
            .map(|(k, v)| (*k, v.clone()))
            .collect())
    }
}

#[async_trait]
impl StatsRepository for InMemoryRepository {
    async fn global_stats(&self) -> Result<GlobalStats, StorageError> {
        let guard = self.lock()?;
        Ok(guard.stats.clone())
    }
}

#[async_trait]
impl BadgeRepository for InMemoryRepository {
    async fn list_badges(&self) -> Result<Vec<Badge>, StorageError> {
        let guard = self.lock()?;
        let mut badges = guard.badges.clone();
        badges.sort_by(|a, b| b.earned_at.cmp(&a.earned_at).then(a.id.cmp(&b.id)));
        Ok(badges)
    }
}

#[async_trait]
impl StreakRepository for InMemoryRepository {
    async fn list_days(&self) -> Result<Vec<StreakDay>, StorageError> {
        let guard = self.lock()?;
        Ok(guard
            .streaks
            .iter()
            .map(|(day, quizzes_played)| StreakDay {
                day: *day,
                quizzes_played: *quizzes_played,
            })
            .collect())
    }
}

#[async_trait]
impl MaintenanceRepository for InMemoryRepository {
    async fn reset_all(&self) -> Result<(), StorageError> {
        self.take_injected_failure()?;
        let mut guard = self.lock()?;
        *guard = InMemoryState::default();
        Ok(())
    }
}

/// Aggregates the partition repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
    pub stats: Arc<dyn StatsRepository>,
    pub badges: Arc<dyn BadgeRepository>,
    pub streaks: Arc<dyn StreakRepository>,
    pub maintenance: Arc<dyn MaintenanceRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_in_memory(repo: InMemoryRepository) -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo.clone());
        let stats: Arc<dyn StatsRepository> = Arc::new(repo.clone());
        let badges: Arc<dyn BadgeRepository> = Arc::new(repo.clone());
        let streaks: Arc<dyn StreakRepository> = Arc::new(repo.clone());
        let maintenance: Arc<dyn MaintenanceRepository> = Arc::new(repo);
        Self {
            progress,
            stats,
            badges,
            streaks,
            maintenance,
        }
    }
}
