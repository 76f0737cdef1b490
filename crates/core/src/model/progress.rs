use chrono::{DateTime, Utc};

use crate::model::QuizResult;

/// Latest attempt for one (theme, quiz) pair plus the best score ever seen.
///
/// Overwritten on retake; `best_score` only moves up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    result: QuizResult,
    best_score: u32,
}

impl ProgressEntry {
    /// First attempt for a pair.
    #[must_use]
    pub fn new(result: QuizResult) -> Self {
        let best_score = result.score();
        Self { result, best_score }
    }

    /// Rehydrate an entry from storage.
    #[must_use]
    pub fn from_persisted(result: QuizResult, best_score: u32) -> Self {
        let best_score = best_score.max(result.score());
        Self { result, best_score }
    }

    /// Replace the latest result with a retake, keeping the best score.
    #[must_use]
    pub fn absorb(self, result: QuizResult) -> Self {
        let best_score = self.best_score.max(result.score());
        Self { result, best_score }
    }

    #[must_use]
    pub fn result(&self) -> &QuizResult {
        &self.result
    }

    #[must_use]
    pub fn into_result(self) -> QuizResult {
        self.result
    }

    #[must_use]
    pub fn best_score(&self) -> u32 {
        self.best_score
    }

    /// Flat read-model row for navigation screens.
    #[must_use]
    pub fn summary(&self) -> QuizSummary {
        QuizSummary {
            score: self.result.score(),
            total: self.result.total(),
            accuracy: self.result.accuracy(),
            completed: self.result.completed(),
            best_score: self.best_score,
            date_completed: self.result.date_completed(),
        }
    }
}

/// "Has this quiz been completed, with what score" row used by the
/// navigation UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSummary {
    pub score: u32,
    pub total: u32,
    pub accuracy: u8,
    pub completed: bool,
    pub best_score: u32,
    pub date_completed: DateTime<Utc>,
}
