mod badge;
mod catalog;
mod ids;
mod progress;
mod result;
mod stats;
mod streak;

pub use badge::Badge;
pub use catalog::{QuizInfo, ThemeCatalog, ThemeInfo};
pub use ids::{ParseIdError, QuizId, QuizKey, ThemeId};
pub use progress::{ProgressEntry, QuizSummary};
pub use result::{QuestionOutcome, QuestionStatus, QuizResult, QuizResultError, percent};
pub use stats::{GlobalStats, HistoryEntry};
pub use streak::StreakDay;
