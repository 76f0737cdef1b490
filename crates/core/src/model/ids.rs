use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a Theme
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThemeId(u64);

impl ThemeId {
    /// Creates a new `ThemeId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a Quiz within a theme
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuizId(u64);

impl QuizId {
    /// Creates a new `QuizId`
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying u64 value
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Composite key addressing one (theme, quiz) pair.
///
/// The canonical string form is `"<theme>_<quiz>"`, e.g. `"1_101"`. It is
/// used for the completed-quizzes set and anywhere a flat key is persisted.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuizKey {
    pub theme_id: ThemeId,
    pub quiz_id: QuizId,
}

impl QuizKey {
    #[must_use]
    pub fn new(theme_id: ThemeId, quiz_id: QuizId) -> Self {
        Self { theme_id, quiz_id }
    }
}

impl fmt::Debug for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ThemeId({})", self.0)
    }
}

impl fmt::Debug for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuizId({})", self.0)
    }
}

impl fmt::Debug for QuizKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuizKey({}_{})", self.theme_id, self.quiz_id)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuizId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuizKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.theme_id, self.quiz_id)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing an ID or key from a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from string", self.kind)
    }
}

impl std::error::Error for ParseIdError {}

impl FromStr for ThemeId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>()
            .map(ThemeId::new)
            .map_err(|_| ParseIdError {
                kind: "ThemeId".to_string(),
            })
    }
}

impl FromStr for QuizId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(QuizId::new).map_err(|_| ParseIdError {
            kind: "QuizId".to_string(),
        })
    }
}

impl FromStr for QuizKey {
    type Err = ParseIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseIdError {
            kind: "QuizKey".to_string(),
        };
        let (theme, quiz) = s.split_once('_').ok_or_else(err)?;
        let theme_id = theme.parse::<ThemeId>().map_err(|_| err())?;
        let quiz_id = quiz.parse::<QuizId>().map_err(|_| err())?;
        Ok(QuizKey::new(theme_id, quiz_id))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
