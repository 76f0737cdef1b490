use quiz_core::model::{GlobalStats, QuizKey};
use sqlx::Row;

use super::mapping::{map_history_row, quiz_id_from_i64, ser, theme_id_from_i64, u64_from_i64};
use super::SqliteRepository;
use crate::repository::{StatsRepository, StorageError};

#[async_trait::async_trait]
impl StatsRepository for SqliteRepository {
    async fn global_stats(&self) -> Result<GlobalStats, StorageError> {
        let mut stats = GlobalStats::new();

        // Missing singleton row reads as a first-run store.
        let counters = sqlx::query(
            r"
            SELECT questions_answered, correct_answers, time_played_seconds
            FROM global_counters
            WHERE id = 1
            ",
        )
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if let Some(row) = counters {
            stats.total_questions_answered = u64_from_i64(
                "questions_answered",
                row.try_get::<i64, _>("questions_answered").map_err(ser)?,
            )?;
            stats.total_correct_answers = u64_from_i64(
                "correct_answers",
                row.try_get::<i64, _>("correct_answers").map_err(ser)?,
            )?;
            stats.total_time_played_seconds = u64_from_i64(
                "time_played_seconds",
                row.try_get::<i64, _>("time_played_seconds").map_err(ser)?,
            )?;
        }

        let completed = sqlx::query(
            r"
            SELECT theme_id, quiz_id
            FROM completed_quizzes
            ORDER BY theme_id ASC, quiz_id ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        for row in completed {
            let theme_id = theme_id_from_i64(row.try_get::<i64, _>("theme_id").map_err(ser)?)?;
            let quiz_id = quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?;
            stats.completed_quizzes.insert(QuizKey::new(theme_id, quiz_id));
        }

        let history = sqlx::query(
            r"
            SELECT theme_id, quiz_id, quiz_name, score, total, accuracy,
                   recorded_at, time_seconds
            FROM quiz_history
            ORDER BY recorded_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        stats.history.reserve(history.len());
        for row in history {
            stats.history.push(map_history_row(&row)?);
        }

        Ok(stats)
    }
}
