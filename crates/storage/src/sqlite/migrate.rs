use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs a single, consolidated migration for the current schema.
///
/// Creates the four logical partitions: progress entries, global stats
/// (counters + completed set + history), badges and streak days, plus the
/// indexes the read paths use.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: full schema.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS progress_entries (
                    theme_id INTEGER NOT NULL,
                    quiz_id INTEGER NOT NULL,
                    quiz_name TEXT NOT NULL,
                    score INTEGER NOT NULL CHECK (score >= 0),
                    best_score INTEGER NOT NULL CHECK (best_score >= 0),
                    date_completed TEXT NOT NULL,
                    questions TEXT NOT NULL,
                    PRIMARY KEY (theme_id, quiz_id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS global_counters (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    questions_answered INTEGER NOT NULL CHECK (questions_answered >= 0),
                    correct_answers INTEGER NOT NULL CHECK (correct_answers >= 0),
                    time_played_seconds INTEGER NOT NULL CHECK (time_played_seconds >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        // Singleton row; counter updates are additive against it.
        sqlx::query(
            r"
                INSERT INTO global_counters (id, questions_answered, correct_answers, time_played_seconds)
                VALUES (1, 0, 0, 0)
                ON CONFLICT(id) DO NOTHING;
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS completed_quizzes (
                    theme_id INTEGER NOT NULL,
                    quiz_id INTEGER NOT NULL,
                    PRIMARY KEY (theme_id, quiz_id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS quiz_history (
                    id INTEGER PRIMARY KEY,
                    theme_id INTEGER NOT NULL,
                    quiz_id INTEGER NOT NULL,
                    quiz_name TEXT NOT NULL,
                    score INTEGER NOT NULL CHECK (score >= 0),
                    total INTEGER NOT NULL CHECK (total >= 0),
                    accuracy INTEGER NOT NULL CHECK (accuracy BETWEEN 0 AND 100),
                    recorded_at TEXT NOT NULL,
                    time_seconds INTEGER NOT NULL CHECK (time_seconds >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS badges (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL,
                    icon TEXT NOT NULL,
                    earned_at TEXT NOT NULL
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS streak_days (
                    day TEXT PRIMARY KEY,
                    quizzes_played INTEGER NOT NULL CHECK (quizzes_played >= 0)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                CREATE INDEX IF NOT EXISTS idx_quiz_history_recorded
                    ON quiz_history (recorded_at DESC, id DESC);
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version, applied_at)
                VALUES (?1, ?2)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
    }

    Ok(())
}
