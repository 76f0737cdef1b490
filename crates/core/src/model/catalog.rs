use serde::Deserialize;

use crate::model::{QuizId, ThemeId};

/// Metadata for all themes, as supplied by the external metadata provider.
///
/// Mirrors the provider's JSON layout: a nested mapping of themes to their
/// quizzes. Loaded once per session and cached by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThemeCatalog {
    pub themes: Vec<ThemeInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ThemeInfo {
    pub id: ThemeId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    pub quizzes: Vec<QuizInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QuizInfo {
    pub id: QuizId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ThemeCatalog {
    /// Total number of quizzes known across all themes; the completion-rate
    /// denominator.
    #[must_use]
    pub fn total_quizzes(&self) -> u32 {
        self.themes
            .iter()
            .map(|t| u32::try_from(t.quizzes.len()).unwrap_or(u32::MAX))
            .fold(0_u32, u32::saturating_add)
    }

    #[must_use]
    pub fn theme(&self, id: ThemeId) -> Option<&ThemeInfo> {
        self.themes.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn theme_quiz_count(&self, id: ThemeId) -> Option<u32> {
        self.theme(id)
            .map(|t| u32::try_from(t.quizzes.len()).unwrap_or(u32::MAX))
    }
}
