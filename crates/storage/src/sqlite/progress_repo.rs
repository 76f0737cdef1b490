use quiz_core::model::{ProgressEntry, QuizId, QuizKey, ThemeId};

use super::mapping::{id_i64, map_entry_row, ser};
use super::SqliteRepository;
use crate::repository::{AttemptWrite, ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn save_attempt(&self, write: &AttemptWrite) -> Result<(), StorageError> {
        let result = write.entry.result();
        let theme_id = id_i64("theme_id", result.theme_id().value())?;
        let quiz_id = id_i64("quiz_id", result.quiz_id().value())?;
        let questions_json = serde_json::to_string(result.questions()).map_err(ser)?;

        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO progress_entries (
                theme_id, quiz_id, quiz_name, score, best_score,
                date_completed, questions
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(theme_id, quiz_id) DO UPDATE SET
                quiz_name = excluded.quiz_name,
                score = excluded.score,
                best_score = MAX(best_score, excluded.best_score),
                date_completed = excluded.date_completed,
                questions = excluded.questions
            ",
        )
        .bind(theme_id)
        .bind(quiz_id)
        .bind(result.quiz_name())
        .bind(i64::from(result.score()))
        .bind(i64::from(write.entry.best_score()))
        .bind(result.date_completed())
        .bind(questions_json)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(
            r"
            INSERT INTO quiz_history (
                theme_id, quiz_id, quiz_name, score, total, accuracy,
                recorded_at, time_seconds
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(theme_id)
        .bind(quiz_id)
        .bind(&write.history.quiz_name)
        .bind(i64::from(write.history.score))
        .bind(i64::from(write.history.total))
        .bind(i64::from(write.history.accuracy))
        .bind(write.history.recorded_at)
        .bind(id_i64("time_seconds", write.history.time_seconds)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        // Additive update against the singleton row: interleaved saves can
        // only ever grow the counters.
        sqlx::query(
            r"
            UPDATE global_counters SET
                questions_answered = questions_answered + ?1,
                correct_answers = correct_answers + ?2,
                time_played_seconds = time_played_seconds + ?3
            WHERE id = 1
            ",
        )
        .bind(id_i64("questions_delta", write.questions_delta)?)
        .bind(id_i64("correct_delta", write.correct_delta)?)
        .bind(id_i64("time_delta", write.time_delta)?)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if let Some(completed) = write.completed {
            sqlx::query(
                r"
                INSERT INTO completed_quizzes (theme_id, quiz_id)
                VALUES (?1, ?2)
                ON CONFLICT(theme_id, quiz_id) DO NOTHING
                ",
            )
            .bind(id_i64("theme_id", completed.theme_id.value())?)
            .bind(id_i64("quiz_id", completed.quiz_id.value())?)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        for badge in &write.new_badges {
            sqlx::query(
                r"
                INSERT INTO badges (id, name, description, icon, earned_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO NOTHING
                ",
            )
            .bind(&badge.id)
            .bind(&badge.name)
            .bind(&badge.description)
            .bind(&badge.icon)
            .bind(badge.earned_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        sqlx::query(
            r"
            INSERT INTO streak_days (day, quizzes_played)
            VALUES (?1, 1)
            ON CONFLICT(day) DO UPDATE SET quizzes_played = quizzes_played + 1
            ",
        )
        .bind(write.streak_day)
        .execute(&mut *tx)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_entry(
        &self,
        theme_id: ThemeId,
        quiz_id: QuizId,
    ) -> Result<Option<ProgressEntry>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT
                theme_id, quiz_id, quiz_name, score, best_score,
                date_completed, questions
            FROM progress_entries
            WHERE theme_id = ?1 AND quiz_id = ?2
            ",
        )
        .bind(id_i64("theme_id", theme_id.value())?)
        .bind(id_i64("quiz_id", quiz_id.value())?)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.map(|r| map_entry_row(&r).map(|(_, entry)| entry))
            .transpose()
    }

    async fn list_entries(&self) -> Result<Vec<(QuizKey, ProgressEntry)>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT
                theme_id, quiz_id, quiz_name, score, best_score,
                date_completed, questions
            FROM progress_entries
            ORDER BY theme_id ASC, quiz_id ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_entry_row(&row)?);
        }
        Ok(out)
    }
}
