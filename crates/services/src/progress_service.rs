//! Save and read orchestration over the storage partitions.
//!
//! `save_result` is the single write path: it validates the attempt, folds it
//! into the prior entry, recomputes the post-save aggregate in memory,
//! evaluates badge rules against it and hands the whole thing to storage as
//! one transaction. Reads never mutate.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use quiz_core::Clock;
use quiz_core::model::{
    Badge, GlobalStats, ProgressEntry, QuestionOutcome, QuizId, QuizKey, QuizResult, QuizSummary,
    StreakDay, ThemeId,
};
use storage::repository::{AttemptWrite, Storage};

use crate::badges::{BadgeContext, BadgeRule, default_rules, evaluate};
use crate::error::ProgressServiceError;
use crate::notify::{BadgeNotifier, NullNotifier};

/// What one save produced, beyond the side effects.
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub entry: ProgressEntry,
    /// Badges earned by this save, also delivered through the notifier.
    pub new_badges: Vec<Badge>,
}

/// Per-theme slice of the progress overview.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeProgress {
    pub quizzes: BTreeMap<QuizId, QuizSummary>,
}

/// Every saved quiz, grouped by theme, in id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressOverview {
    pub themes: BTreeMap<ThemeId, ThemeProgress>,
}

impl ProgressOverview {
    #[must_use]
    pub fn quiz(&self, theme_id: ThemeId, quiz_id: QuizId) -> Option<&QuizSummary> {
        self.themes.get(&theme_id)?.quizzes.get(&quiz_id)
    }
}

/// Application service for quiz progress, statistics and badges.
pub struct ProgressService {
    storage: Storage,
    clock: Clock,
    rules: Vec<BadgeRule>,
    notifier: Arc<dyn BadgeNotifier>,
}

impl ProgressService {
    #[must_use]
    pub fn new(storage: Storage, clock: Clock) -> Self {
        Self {
            storage,
            clock,
            rules: default_rules(),
            notifier: Arc::new(NullNotifier),
        }
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn BadgeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: Vec<BadgeRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Record one quiz attempt.
    ///
    /// The attempt is validated and timestamped, merged with any prior entry
    /// for the same (theme, quiz) pair, and committed together with its
    /// history line, counter deltas, completion mark, streak bump and any
    /// newly-earned badges. On error nothing was persisted.
    ///
    /// # Errors
    ///
    /// `ProgressServiceError::Result` if the attempt is invalid,
    /// `ProgressServiceError::Storage` if the transaction aborts.
    pub async fn save_result(
        &self,
        theme_id: ThemeId,
        quiz_id: QuizId,
        quiz_name: impl Into<String>,
        questions: Vec<QuestionOutcome>,
    ) -> Result<SaveOutcome, ProgressServiceError> {
        let now = self.clock.now();
        let result = QuizResult::new(theme_id, quiz_id, quiz_name, questions, now)?;
        let key = result.key();
        debug!(%key, score = result.score(), total = result.total(), "saving quiz result");

        let entry = match self.storage.progress.get_entry(theme_id, quiz_id).await? {
            Some(prior) => prior.absorb(result),
            None => ProgressEntry::new(result),
        };

        // Post-save view, built in memory so badge rules see the aggregate
        // this transaction is about to commit.
        let mut stats = self.storage.stats.global_stats().await?;
        stats.record(entry.result(), now);
        let entries = self.entries_with(&key, &entry).await?;
        let existing: HashSet<String> = self
            .storage
            .badges
            .list_badges()
            .await?
            .into_iter()
            .map(|b| b.id)
            .collect();
        let ctx = BadgeContext {
            stats: &stats,
            entries: &entries,
        };
        let new_badges = evaluate(&self.rules, &ctx, &existing, now);

        let write =
            AttemptWrite::for_entry(entry.clone(), now).with_badges(new_badges.clone());
        self.storage.progress.save_attempt(&write).await?;

        if !new_badges.is_empty() {
            let ids: Vec<&str> = new_badges.iter().map(|b| b.id.as_str()).collect();
            info!(%key, badges = ?ids, "badges earned");
            self.notifier.badges_earned(&new_badges);
        }

        Ok(SaveOutcome { entry, new_badges })
    }

    /// Latest entry for a (theme, quiz) pair, `None` if never attempted.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on storage failure.
    pub async fn get_result(
        &self,
        theme_id: ThemeId,
        quiz_id: QuizId,
    ) -> Result<Option<ProgressEntry>, ProgressServiceError> {
        Ok(self.storage.progress.get_entry(theme_id, quiz_id).await?)
    }

    /// All saved quizzes grouped by theme.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on storage failure.
    pub async fn get_progress(&self) -> Result<ProgressOverview, ProgressServiceError> {
        let mut overview = ProgressOverview::default();
        for (key, entry) in self.storage.progress.list_entries().await? {
            overview
                .themes
                .entry(key.theme_id)
                .or_default()
                .quizzes
                .insert(key.quiz_id, entry.summary());
        }
        Ok(overview)
    }

    /// The raw entry list, sorted by key. Feeds the statistics aggregator.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on storage failure.
    pub async fn list_entries(
        &self,
    ) -> Result<Vec<(QuizKey, ProgressEntry)>, ProgressServiceError> {
        Ok(self.storage.progress.list_entries().await?)
    }

    /// The persisted global aggregate.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on storage failure.
    pub async fn global_stats(&self) -> Result<GlobalStats, ProgressServiceError> {
        Ok(self.storage.stats.global_stats().await?)
    }

    /// All earned badges, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on storage failure.
    pub async fn badges(&self) -> Result<Vec<Badge>, ProgressServiceError> {
        Ok(self.storage.badges.list_badges().await?)
    }

    /// Per-day activity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` on storage failure.
    pub async fn streak_days(&self) -> Result<Vec<StreakDay>, ProgressServiceError> {
        Ok(self.storage.streaks.list_days().await?)
    }

    /// Wipe every partition back to first-run state.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if the wipe cannot commit.
    pub async fn reset_all(&self) -> Result<(), ProgressServiceError> {
        self.storage.maintenance.reset_all().await?;
        info!("all progress reset");
        Ok(())
    }

    /// Current entries with `entry` substituted in at `key`, preserving the
    /// key-sorted order `list_entries` guarantees.
    async fn entries_with(
        &self,
        key: &QuizKey,
        entry: &ProgressEntry,
    ) -> Result<Vec<(QuizKey, ProgressEntry)>, ProgressServiceError> {
        let mut entries = self.storage.progress.list_entries().await?;
        match entries.binary_search_by(|(k, _)| k.cmp(key)) {
            Ok(i) => entries[i].1 = entry.clone(),
            Err(i) => entries.insert(i, (*key, entry.clone())),
        }
        Ok(entries)
    }
}
