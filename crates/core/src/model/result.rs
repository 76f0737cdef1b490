use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{QuizId, QuizKey, ThemeId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizResultError {
    #[error("too many questions for a single quiz: {len}")]
    TooManyQuestions { len: usize },

    #[error("stored score ({stored}) does not match correct answers ({derived})")]
    ScoreMismatch { stored: u32, derived: u32 },
}

/// Outcome of one answered (or skipped) question.
///
/// `status == None` means the question was never answered; its time is not
/// counted towards the attempt total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub selected_answer: Option<String>,
    pub status: Option<QuestionStatus>,
    pub time_seconds: u32,
}

impl QuestionOutcome {
    #[must_use]
    pub fn unanswered() -> Self {
        Self {
            selected_answer: None,
            status: None,
            time_seconds: 0,
        }
    }

    #[must_use]
    pub fn answered(selected: impl Into<String>, correct: bool, time_seconds: u32) -> Self {
        Self {
            selected_answer: Some(selected.into()),
            status: Some(if correct {
                QuestionStatus::Correct
            } else {
                QuestionStatus::Incorrect
            }),
            time_seconds,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Correct,
    Incorrect,
}

impl QuestionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionStatus::Correct => "correct",
            QuestionStatus::Incorrect => "incorrect",
        }
    }
}

/// Finalized outcome of one quiz attempt.
///
/// Score, total, accuracy and completion are all derived from the ordered
/// per-question outcomes; none of them can be set independently, so a
/// structurally valid `QuizResult` cannot carry an inconsistent score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    theme_id: ThemeId,
    quiz_id: QuizId,
    quiz_name: String,
    questions: Vec<QuestionOutcome>,
    score: u32,
    date_completed: DateTime<Utc>,
}

impl QuizResult {
    /// Build a result from the finalized per-question outcomes.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError::TooManyQuestions` if the question count does
    /// not fit in `u32`.
    pub fn new(
        theme_id: ThemeId,
        quiz_id: QuizId,
        quiz_name: impl Into<String>,
        questions: Vec<QuestionOutcome>,
        date_completed: DateTime<Utc>,
    ) -> Result<Self, QuizResultError> {
        if u32::try_from(questions.len()).is_err() {
            return Err(QuizResultError::TooManyQuestions {
                len: questions.len(),
            });
        }
        let score = derived_score(&questions);
        Ok(Self {
            theme_id,
            quiz_id,
            quiz_name: quiz_name.into(),
            questions,
            score,
            date_completed,
        })
    }

    /// Rehydrate a result from persisted storage, re-checking the score
    /// invariant against the stored outcomes.
    ///
    /// # Errors
    ///
    /// Returns `QuizResultError::ScoreMismatch` if the stored score disagrees
    /// with the number of correct outcomes.
    pub fn from_persisted(
        theme_id: ThemeId,
        quiz_id: QuizId,
        quiz_name: String,
        questions: Vec<QuestionOutcome>,
        score: u32,
        date_completed: DateTime<Utc>,
    ) -> Result<Self, QuizResultError> {
        if u32::try_from(questions.len()).is_err() {
            return Err(QuizResultError::TooManyQuestions {
                len: questions.len(),
            });
        }
        let derived = derived_score(&questions);
        if derived != score {
            return Err(QuizResultError::ScoreMismatch {
                stored: score,
                derived,
            });
        }
        Ok(Self {
            theme_id,
            quiz_id,
            quiz_name,
            questions,
            score,
            date_completed,
        })
    }

    #[must_use]
    pub fn theme_id(&self) -> ThemeId {
        self.theme_id
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn key(&self) -> QuizKey {
        QuizKey::new(self.theme_id, self.quiz_id)
    }

    #[must_use]
    pub fn quiz_name(&self) -> &str {
        &self.quiz_name
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionOutcome] {
        &self.questions
    }

    /// Number of correctly answered questions.
    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Number of questions in the attempt.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn total(&self) -> u32 {
        // Length checked against u32 at construction.
        self.questions.len() as u32
    }

    /// Percentage of correct answers, rounded to the nearest integer.
    ///
    /// 0 when the quiz has no questions.
    #[must_use]
    pub fn accuracy(&self) -> u8 {
        percent(u64::from(self.score), u64::from(self.total()))
    }

    /// True iff every question carries a status.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.questions.iter().all(|q| q.status.is_some())
    }

    #[must_use]
    pub fn date_completed(&self) -> DateTime<Utc> {
        self.date_completed
    }

    /// Sum of per-question times over answered questions, in seconds.
    #[must_use]
    pub fn total_time_seconds(&self) -> u64 {
        self.questions
            .iter()
            .filter(|q| q.status.is_some())
            .map(|q| u64::from(q.time_seconds))
            .sum()
    }
}

fn derived_score(questions: &[QuestionOutcome]) -> u32 {
    let correct = questions
        .iter()
        .filter(|q| q.status == Some(QuestionStatus::Correct))
        .count();
    u32::try_from(correct).unwrap_or(u32::MAX)
}

/// Integer percentage `round(100 * n / d)`, 0 when `d` is 0.
///
/// Pure integer arithmetic keeps the result deterministic and clamped to
/// 0..=100 for any `n <= d`.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn percent(n: u64, d: u64) -> u8 {
    if d == 0 {
        return 0;
    }
    let rounded = (n.saturating_mul(200).saturating_add(d)) / (2 * d);
    rounded.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn outcomes(correct: usize, incorrect: usize) -> Vec<QuestionOutcome> {
        let mut out = Vec::new();
        for i in 0..correct {
            out.push(QuestionOutcome::answered(format!("opt {i}"), true, 10));
        }
        for i in 0..incorrect {
            out.push(QuestionOutcome::answered(format!("opt {i}"), false, 10));
        }
        out
    }

    fn build_result(correct: usize, incorrect: usize) -> QuizResult {
        QuizResult::new(
            ThemeId::new(1),
            QuizId::new(101),
            "Greetings",
            outcomes(correct, incorrect),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn score_is_derived_from_statuses() {
        let result = build_result(8, 2);
        assert_eq!(result.score(), 8);
        assert_eq!(result.total(), 10);
        assert_eq!(result.accuracy(), 80);
        assert!(result.completed());
        assert_eq!(result.total_time_seconds(), 100);
    }

    #[test]
    fn unanswered_questions_mark_incomplete_and_do_not_count_time() {
        let mut questions = outcomes(2, 1);
        questions.push(QuestionOutcome::unanswered());
        let result = QuizResult::new(
            ThemeId::new(1),
            QuizId::new(101),
            "Greetings",
            questions,
            fixed_now(),
        )
        .unwrap();
        assert!(!result.completed());
        assert_eq!(result.score(), 2);
        assert_eq!(result.total(), 4);
        assert_eq!(result.total_time_seconds(), 30);
    }

    #[test]
    fn empty_quiz_has_zero_accuracy() {
        let result = QuizResult::new(
            ThemeId::new(1),
            QuizId::new(101),
            "Empty",
            Vec::new(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(result.accuracy(), 0);
        // Vacuously complete: no question lacks a status.
        assert!(result.completed());
    }

    #[test]
    fn accuracy_stays_within_bounds_and_rounds() {
        for (correct, incorrect, expected) in
            [(0, 3, 0), (1, 2, 33), (2, 1, 67), (3, 0, 100), (1, 5, 17)]
        {
            let result = build_result(correct, incorrect);
            assert_eq!(result.accuracy(), expected);
            assert!(result.accuracy() <= 100);
        }
    }

    #[test]
    fn from_persisted_rejects_score_mismatch() {
        let err = QuizResult::from_persisted(
            ThemeId::new(1),
            QuizId::new(101),
            "Greetings".into(),
            outcomes(3, 1),
            9,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            QuizResultError::ScoreMismatch {
                stored: 9,
                derived: 3
            }
        );
    }

    #[test]
    fn from_persisted_accepts_consistent_record() {
        let rehydrated = QuizResult::from_persisted(
            ThemeId::new(1),
            QuizId::new(101),
            "Greetings".into(),
            outcomes(3, 1),
            3,
            fixed_now(),
        )
        .unwrap();
        assert_eq!(rehydrated.score(), 3);
    }

    #[test]
    fn percent_handles_zero_denominator() {
        assert_eq!(percent(5, 0), 0);
        assert_eq!(percent(0, 10), 0);
        assert_eq!(percent(1, 50), 2);
        assert_eq!(percent(10, 10), 100);
    }
}
