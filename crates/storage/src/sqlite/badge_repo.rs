use quiz_core::model::Badge;

use super::mapping::map_badge_row;
use super::SqliteRepository;
use crate::repository::{BadgeRepository, StorageError};

#[async_trait::async_trait]
impl BadgeRepository for SqliteRepository {
    async fn list_badges(&self) -> Result<Vec<Badge>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, icon, earned_at
            FROM badges
            ORDER BY earned_at DESC, id ASC
            ",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_badge_row(&row)?);
        }
        Ok(out)
    }
}
