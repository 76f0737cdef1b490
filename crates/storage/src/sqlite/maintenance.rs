use super::SqliteRepository;
use crate::repository::{MaintenanceRepository, StorageError};

#[async_trait::async_trait]
impl MaintenanceRepository for SqliteRepository {
    async fn reset_all(&self) -> Result<(), StorageError> {
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        for stmt in [
            "DELETE FROM progress_entries",
            "DELETE FROM quiz_history",
            "DELETE FROM completed_quizzes",
            "DELETE FROM badges",
            "DELETE FROM streak_days",
            // Keep the singleton row so counter updates stay additive.
            "UPDATE global_counters SET
                questions_answered = 0,
                correct_answers = 0,
                time_played_seconds = 0
             WHERE id = 1",
        ] {
            sqlx::query(stmt)
                .execute(&mut *tx)
                .await
                .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
