//! Statistics aggregator.
//!
//! Pure functions over a store snapshot, recomputed on every call rather
//! than incrementally cached: the history only grows to a few hundred
//! entries, and recomputation cannot drift from its source. For a fixed
//! snapshot every function returns identical output on every call; all
//! iteration happens over explicitly ordered data.

use std::collections::BTreeMap;

use quiz_core::model::{
    GlobalStats, HistoryEntry, ProgressEntry, QuizKey, ThemeCatalog, ThemeId, percent,
};

/// Aggregation knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsConfig {
    /// Completion-rate denominator used when no theme catalog is available.
    pub fallback_total_quizzes: u32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            fallback_total_quizzes: 50,
        }
    }
}

/// Percentage of known quizzes with at least one completed attempt.
#[must_use]
pub fn completion_rate(stats: &GlobalStats, total_possible: u32) -> u8 {
    percent(
        stats.completed_quizzes.len() as u64,
        u64::from(total_possible),
    )
}

/// Lifetime percentage of correct answers, 0 before any answer.
#[must_use]
pub fn global_accuracy(stats: &GlobalStats) -> u8 {
    percent(stats.total_correct_answers, stats.total_questions_answered)
}

/// Rollup for one theme, derived from its progress entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeStat {
    pub theme_id: ThemeId,
    pub name: String,
    /// Attempts with at least one question; mean of their accuracies.
    pub avg_accuracy: u8,
    pub attempts: u32,
    pub completed_quizzes: u32,
    /// Quiz count from the catalog; `None` when metadata is unavailable.
    pub total_quizzes: Option<u32>,
}

/// Everything the statistics screen renders, in one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualizationData {
    /// Sorted by average accuracy descending, theme id ascending on ties.
    pub theme_stats: Vec<ThemeStat>,
    pub best_theme: Option<ThemeStat>,
    pub worst_theme: Option<ThemeStat>,
    pub history: Vec<HistoryEntry>,
    pub global_completion: u8,
    pub global_accuracy: u8,
    pub completed_quizzes: u32,
    pub total_quizzes: u32,
    pub correct_answers: u64,
    pub total_questions: u64,
    /// `None` renders as "N/A": nothing has been answered yet.
    pub avg_time_per_question: Option<u64>,
}

/// Compute the full statistics read model from a store snapshot.
///
/// `catalog` supplies theme names and quiz counts; without it the completion
/// denominator falls back to `config.fallback_total_quizzes` and themes are
/// labeled by id.
#[must_use]
pub fn visualization_data(
    stats: &GlobalStats,
    entries: &[(QuizKey, ProgressEntry)],
    catalog: Option<&ThemeCatalog>,
    config: StatsConfig,
) -> VisualizationData {
    // Group entries per theme; BTreeMap gives first-encountered == id order.
    let mut per_theme: BTreeMap<ThemeId, Vec<&ProgressEntry>> = BTreeMap::new();
    for (key, entry) in entries {
        per_theme.entry(key.theme_id).or_default().push(entry);
    }

    let mut theme_stats = Vec::with_capacity(per_theme.len());
    for (theme_id, theme_entries) in &per_theme {
        // Entries with no questions would distort the mean towards zero.
        let accuracies: Vec<u64> = theme_entries
            .iter()
            .filter(|e| e.result().total() > 0)
            .map(|e| u64::from(e.result().accuracy()))
            .collect();
        let avg_accuracy = mean_percent(&accuracies);
        let completed = theme_entries
            .iter()
            .filter(|e| e.result().completed())
            .count();
        let name = catalog
            .and_then(|c| c.theme(*theme_id))
            .map_or_else(|| format!("Theme {theme_id}"), |t| t.name.clone());

        theme_stats.push(ThemeStat {
            theme_id: *theme_id,
            name,
            avg_accuracy,
            attempts: u32::try_from(theme_entries.len()).unwrap_or(u32::MAX),
            completed_quizzes: u32::try_from(completed).unwrap_or(u32::MAX),
            total_quizzes: catalog.and_then(|c| c.theme_quiz_count(*theme_id)),
        });
    }

    // Best/worst before re-sorting: strict comparisons keep the earliest
    // theme (lowest id) on ties.
    let mut best: Option<&ThemeStat> = None;
    let mut worst: Option<&ThemeStat> = None;
    for stat in &theme_stats {
        if best.is_none_or(|b| stat.avg_accuracy > b.avg_accuracy) {
            best = Some(stat);
        }
        if worst.is_none_or(|w| stat.avg_accuracy < w.avg_accuracy) {
            worst = Some(stat);
        }
    }
    let best_theme = best.cloned();
    let worst_theme = worst.cloned();

    theme_stats.sort_by(|a, b| {
        b.avg_accuracy
            .cmp(&a.avg_accuracy)
            .then(a.theme_id.cmp(&b.theme_id))
    });

    let total_quizzes = catalog.map_or(config.fallback_total_quizzes, ThemeCatalog::total_quizzes);
    let completed_quizzes = u32::try_from(stats.completed_quizzes.len()).unwrap_or(u32::MAX);
    let avg_time_per_question = if stats.total_questions_answered == 0 {
        None
    } else {
        Some(div_round(
            stats.total_time_played_seconds,
            stats.total_questions_answered,
        ))
    };

    VisualizationData {
        theme_stats,
        best_theme,
        worst_theme,
        history: stats.history.clone(),
        global_completion: completion_rate(stats, total_quizzes),
        global_accuracy: global_accuracy(stats),
        completed_quizzes,
        total_quizzes,
        correct_answers: stats.total_correct_answers,
        total_questions: stats.total_questions_answered,
        avg_time_per_question,
    }
}

/// Rounded arithmetic mean of percentage values, 0 for an empty slice.
#[allow(clippy::cast_possible_truncation)]
fn mean_percent(values: &[u64]) -> u8 {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().sum();
    let count = values.len() as u64;
    (div_round(sum, count).min(100)) as u8
}

/// `round(n / d)` in integers; caller guarantees `d > 0`.
fn div_round(n: u64, d: u64) -> u64 {
    (n.saturating_mul(2).saturating_add(d)) / (2 * d)
}
