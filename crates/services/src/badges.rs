//! Badge rule engine.
//!
//! A fixed set of independent predicates over the post-save aggregate.
//! Evaluation is idempotent: a rule whose id is already stored never fires
//! again, and every rule that holds in one pass fires together.

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use quiz_core::model::{Badge, GlobalStats, ProgressEntry, QuizKey};

/// Snapshot a rule predicate sees: the global aggregate after the save plus
/// the current progress entries (latest result per quiz).
pub struct BadgeContext<'a> {
    pub stats: &'a GlobalStats,
    pub entries: &'a [(QuizKey, ProgressEntry)],
}

/// One badge-awarding rule. `predicate` must be a pure function of the
/// context so repeated evaluation stays deterministic.
pub struct BadgeRule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    predicate: fn(&BadgeContext<'_>) -> bool,
}

impl BadgeRule {
    #[must_use]
    pub fn applies(&self, ctx: &BadgeContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

/// The built-in rule set.
#[must_use]
pub fn default_rules() -> Vec<BadgeRule> {
    vec![
        BadgeRule {
            id: "first_completed",
            name: "Premier Pas",
            description: "Complete your first quiz",
            icon: "🎯",
            predicate: |ctx| ctx.stats.any_completed(),
        },
        BadgeRule {
            id: "perfect_quiz",
            name: "Sans Faute",
            description: "Finish a quiz with every answer correct",
            icon: "🌟",
            predicate: |ctx| {
                ctx.entries.iter().any(|(_, entry)| {
                    let r = entry.result();
                    r.completed() && r.total() > 0 && r.accuracy() == 100
                })
            },
        },
        BadgeRule {
            id: "five_completed",
            name: "En Route",
            description: "Complete five different quizzes",
            icon: "🚀",
            predicate: |ctx| ctx.stats.completed_quizzes.len() >= 5,
        },
        BadgeRule {
            id: "ten_completed",
            name: "Polyglotte en Herbe",
            description: "Complete ten different quizzes",
            icon: "🏆",
            predicate: |ctx| ctx.stats.completed_quizzes.len() >= 10,
        },
        BadgeRule {
            id: "hundred_questions",
            name: "Centurion",
            description: "Answer one hundred questions",
            icon: "💯",
            predicate: |ctx| ctx.stats.total_questions_answered >= 100,
        },
        BadgeRule {
            id: "marathon",
            name: "Marathonien",
            description: "Spend a full hour playing quizzes",
            icon: "⏱️",
            predicate: |ctx| ctx.stats.total_time_played_seconds >= 3600,
        },
    ]
}

/// Returns the badges newly earned by this pass: rules whose id is not in
/// `existing` and whose predicate holds.
#[must_use]
pub fn evaluate(
    rules: &[BadgeRule],
    ctx: &BadgeContext<'_>,
    existing: &HashSet<String>,
    now: DateTime<Utc>,
) -> Vec<Badge> {
    rules
        .iter()
        .filter(|rule| !existing.contains(rule.id) && rule.applies(ctx))
        .map(|rule| Badge::new(rule.id, rule.name, rule.description, rule.icon, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuestionOutcome, QuizId, QuizResult, ThemeId};
    use quiz_core::time::fixed_now;

    fn completed_result(theme: u64, quiz: u64, correct: usize, incorrect: usize) -> QuizResult {
        let mut questions = Vec::new();
        for _ in 0..correct {
            questions.push(QuestionOutcome::answered("a", true, 5));
        }
        for _ in 0..incorrect {
            questions.push(QuestionOutcome::answered("b", false, 5));
        }
        QuizResult::new(
            ThemeId::new(theme),
            QuizId::new(quiz),
            format!("Quiz {quiz}"),
            questions,
            fixed_now(),
        )
        .unwrap()
    }

    fn context_for(results: Vec<QuizResult>) -> (GlobalStats, Vec<(QuizKey, ProgressEntry)>) {
        let mut stats = GlobalStats::new();
        let mut entries = Vec::new();
        for result in results {
            stats.record(&result, fixed_now());
            entries.push((result.key(), ProgressEntry::new(result)));
        }
        (stats, entries)
    }

    #[test]
    fn first_completed_fires_on_first_completed_quiz() {
        let (stats, entries) = context_for(vec![completed_result(1, 101, 8, 2)]);
        let ctx = BadgeContext {
            stats: &stats,
            entries: &entries,
        };

        let earned = evaluate(&default_rules(), &ctx, &HashSet::new(), fixed_now());
        let ids: Vec<_> = earned.iter().map(|b| b.id.as_str()).collect();
        assert!(ids.contains(&"first_completed"));
        assert!(!ids.contains(&"perfect_quiz"));
    }

    #[test]
    fn evaluation_is_idempotent() {
        let (stats, entries) = context_for(vec![completed_result(1, 101, 10, 0)]);
        let ctx = BadgeContext {
            stats: &stats,
            entries: &entries,
        };
        let rules = default_rules();

        let first_pass = evaluate(&rules, &ctx, &HashSet::new(), fixed_now());
        assert!(!first_pass.is_empty());

        let existing: HashSet<String> = first_pass.iter().map(|b| b.id.clone()).collect();
        let second_pass = evaluate(&rules, &ctx, &existing, fixed_now());
        assert!(second_pass.is_empty());
    }

    #[test]
    fn all_holding_rules_fire_in_one_pass() {
        let results: Vec<_> = (0..5)
            .map(|i| completed_result(1, 100 + i, 10, 10))
            .collect();
        let (stats, entries) = context_for(results);
        assert_eq!(stats.total_questions_answered, 100);
        let ctx = BadgeContext {
            stats: &stats,
            entries: &entries,
        };

        let earned = evaluate(&default_rules(), &ctx, &HashSet::new(), fixed_now());
        let ids: HashSet<_> = earned.iter().map(|b| b.id.as_str()).collect();
        assert!(ids.contains("first_completed"));
        assert!(ids.contains("five_completed"));
        assert!(ids.contains("hundred_questions"));
        assert!(!ids.contains("ten_completed"));
    }

    #[test]
    fn perfect_quiz_requires_a_completed_nonempty_quiz() {
        let empty = QuizResult::new(
            ThemeId::new(1),
            QuizId::new(101),
            "Empty",
            Vec::new(),
            fixed_now(),
        )
        .unwrap();
        let (stats, entries) = context_for(vec![empty]);
        let ctx = BadgeContext {
            stats: &stats,
            entries: &entries,
        };

        let earned = evaluate(&default_rules(), &ctx, &HashSet::new(), fixed_now());
        assert!(!earned.iter().any(|b| b.id == "perfect_quiz"));
    }
}
