use chrono::NaiveDate;

/// One day of quiz activity. Streak computation itself lives with the UI;
/// the core only persists the raw per-day counts so a full reset can clear
/// them with everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakDay {
    pub day: NaiveDate,
    pub quizzes_played: u32,
}
