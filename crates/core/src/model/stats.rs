use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::model::{QuizId, QuizKey, QuizResult, ThemeId};

/// One line of the append-only quiz history, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub theme_id: ThemeId,
    pub quiz_id: QuizId,
    pub quiz_name: String,
    pub score: u32,
    pub total: u32,
    pub accuracy: u8,
    pub recorded_at: DateTime<Utc>,
    pub time_seconds: u64,
}

impl HistoryEntry {
    /// Snapshot of one attempt as it enters the history log.
    #[must_use]
    pub fn of(result: &QuizResult, recorded_at: DateTime<Utc>) -> Self {
        Self {
            theme_id: result.theme_id(),
            quiz_id: result.quiz_id(),
            quiz_name: result.quiz_name().to_owned(),
            score: result.score(),
            total: result.total(),
            accuracy: result.accuracy(),
            recorded_at,
            time_seconds: result.total_time_seconds(),
        }
    }
}

/// Singleton aggregate over every saved attempt.
///
/// The three counters are running sums: a retaken quiz contributes once per
/// attempt, and they are never recomputed from the completed set or the
/// history. `completed_quizzes` has set semantics and is keyed by
/// `QuizKey`; a `BTreeSet` keeps iteration order deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalStats {
    pub completed_quizzes: BTreeSet<QuizKey>,
    pub total_questions_answered: u64,
    pub total_correct_answers: u64,
    pub total_time_played_seconds: u64,
    /// Newest first, append-only, unbounded. Display truncation is a UI
    /// concern.
    pub history: Vec<HistoryEntry>,
}

impl GlobalStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one saved attempt to the aggregate.
    ///
    /// This is the single definition of the save-time mutation: counters
    /// accumulate, the completed set gains the key iff the attempt was
    /// completed, and a history line is prepended.
    pub fn record(&mut self, result: &QuizResult, recorded_at: DateTime<Utc>) {
        self.total_questions_answered = self
            .total_questions_answered
            .saturating_add(u64::from(result.total()));
        self.total_correct_answers = self
            .total_correct_answers
            .saturating_add(u64::from(result.score()));
        self.total_time_played_seconds = self
            .total_time_played_seconds
            .saturating_add(result.total_time_seconds());
        if result.completed() {
            self.completed_quizzes.insert(result.key());
        }
        self.history.insert(0, HistoryEntry::of(result, recorded_at));
    }

    /// True once at least one quiz has a completed attempt.
    #[must_use]
    pub fn any_completed(&self) -> bool {
        !self.completed_quizzes.is_empty()
    }
}
