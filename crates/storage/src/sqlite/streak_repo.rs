use quiz_core::model::StreakDay;

use super::mapping::map_streak_row;
use super::SqliteRepository;
use crate::repository::{StorageError, StreakRepository};

#[async_trait::async_trait]
impl StreakRepository for SqliteRepository {
    async fn list_days(&self) -> Result<Vec<StreakDay>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT day, quizzes_played
            FROM streak_days
            ORDER BY day ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_streak_row(&row)?);
        }
        Ok(out)
    }
}
