use quiz_core::model::{
    Badge, HistoryEntry, ProgressEntry, QuestionOutcome, QuizId, QuizKey, QuizResult, StreakDay,
    ThemeId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(super) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(super) fn id_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(super) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(super) fn u64_from_i64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(super) fn u8_from_i64(field: &'static str, v: i64) -> Result<u8, StorageError> {
    u8::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(super) fn theme_id_from_i64(v: i64) -> Result<ThemeId, StorageError> {
    u64::try_from(v)
        .map(ThemeId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid theme_id: {v}")))
}

pub(super) fn quiz_id_from_i64(v: i64) -> Result<QuizId, StorageError> {
    u64::try_from(v)
        .map(QuizId::new)
        .map_err(|_| StorageError::Serialization(format!("invalid quiz_id: {v}")))
}

pub(super) fn map_entry_row(row: &SqliteRow) -> Result<(QuizKey, ProgressEntry), StorageError> {
    let theme_id = theme_id_from_i64(row.try_get::<i64, _>("theme_id").map_err(ser)?)?;
    let quiz_id = quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?;
    let quiz_name: String = row.try_get("quiz_name").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let best_score = u32_from_i64(
        "best_score",
        row.try_get::<i64, _>("best_score").map_err(ser)?,
    )?;
    let date_completed = row.try_get("date_completed").map_err(ser)?;
    let questions_json: String = row.try_get("questions").map_err(ser)?;
    let questions: Vec<QuestionOutcome> = serde_json::from_str(&questions_json).map_err(ser)?;

    let result = QuizResult::from_persisted(
        theme_id,
        quiz_id,
        quiz_name,
        questions,
        score,
        date_completed,
    )
    .map_err(ser)?;
    let key = result.key();
    Ok((key, ProgressEntry::from_persisted(result, best_score)))
}

pub(super) fn map_history_row(row: &SqliteRow) -> Result<HistoryEntry, StorageError> {
    Ok(HistoryEntry {
        theme_id: theme_id_from_i64(row.try_get::<i64, _>("theme_id").map_err(ser)?)?,
        quiz_id: quiz_id_from_i64(row.try_get::<i64, _>("quiz_id").map_err(ser)?)?,
        quiz_name: row.try_get("quiz_name").map_err(ser)?,
        score: u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        total: u32_from_i64("total", row.try_get::<i64, _>("total").map_err(ser)?)?,
        accuracy: u8_from_i64("accuracy", row.try_get::<i64, _>("accuracy").map_err(ser)?)?,
        recorded_at: row.try_get("recorded_at").map_err(ser)?,
        time_seconds: u64_from_i64(
            "time_seconds",
            row.try_get::<i64, _>("time_seconds").map_err(ser)?,
        )?,
    })
}

pub(super) fn map_badge_row(row: &SqliteRow) -> Result<Badge, StorageError> {
    Ok(Badge {
        id: row.try_get("id").map_err(ser)?,
        name: row.try_get("name").map_err(ser)?,
        description: row.try_get("description").map_err(ser)?,
        icon: row.try_get("icon").map_err(ser)?,
        earned_at: row.try_get("earned_at").map_err(ser)?,
    })
}

pub(super) fn map_streak_row(row: &SqliteRow) -> Result<StreakDay, StorageError> {
    Ok(StreakDay {
        day: row.try_get("day").map_err(ser)?,
        quizzes_played: u32_from_i64(
            "quizzes_played",
            row.try_get::<i64, _>("quizzes_played").map_err(ser)?,
        )?,
    })
}
