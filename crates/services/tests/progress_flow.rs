//! End-to-end flow over the in-memory backend: one attempt rippling through
//! every partition, retakes, atomicity under a failing write, and reset.

use services::{ProgressService, StatsConfig, visualization_data};

use quiz_core::model::{QuestionOutcome, QuizId, ThemeId};
use quiz_core::time::fixed_clock;
use storage::repository::{InMemoryRepository, Storage};

fn answers(correct: usize, incorrect: usize, secs_each: u32) -> Vec<QuestionOutcome> {
    let mut questions = Vec::new();
    for _ in 0..correct {
        questions.push(QuestionOutcome::answered("Option 0", true, secs_each));
    }
    for _ in 0..incorrect {
        questions.push(QuestionOutcome::answered("Option 1", false, secs_each));
    }
    questions
}

#[tokio::test]
async fn single_attempt_updates_every_partition() {
    let service = ProgressService::new(Storage::in_memory(), fixed_clock());

    // Theme 1, quiz 101: 8/10 in 300 seconds.
    let outcome = service
        .save_result(
            ThemeId::new(1),
            QuizId::new(101),
            "Les Salutations",
            answers(8, 2, 30),
        )
        .await
        .unwrap();

    assert_eq!(outcome.entry.result().score(), 8);
    assert_eq!(outcome.entry.result().accuracy(), 80);
    assert!(outcome.new_badges.iter().any(|b| b.id == "first_completed"));
    assert!(
        outcome
            .new_badges
            .iter()
            .any(|b| b.name == "Premier Pas")
    );

    let stats = service.global_stats().await.unwrap();
    assert_eq!(stats.completed_quizzes.len(), 1);
    assert_eq!(stats.total_questions_answered, 10);
    assert_eq!(stats.total_correct_answers, 8);
    assert_eq!(stats.total_time_played_seconds, 300);
    assert_eq!(stats.history.len(), 1);
    assert_eq!(stats.history[0].quiz_name, "Les Salutations");

    let entries = service.list_entries().await.unwrap();
    let data = visualization_data(&stats, &entries, None, StatsConfig::default());
    // 1 of 50 quizzes completed rounds to 2 percent.
    assert_eq!(data.global_completion, 2);
    assert_eq!(data.global_accuracy, 80);
    assert_eq!(data.avg_time_per_question, Some(30));

    let days = service.streak_days().await.unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].quizzes_played, 1);
}

#[tokio::test]
async fn retake_replaces_entry_but_history_and_counters_accumulate() {
    let service = ProgressService::new(Storage::in_memory(), fixed_clock());
    service
        .save_result(
            ThemeId::new(1),
            QuizId::new(101),
            "Les Salutations",
            answers(8, 2, 30),
        )
        .await
        .unwrap();
    service
        .save_result(
            ThemeId::new(1),
            QuizId::new(101),
            "Les Salutations",
            answers(5, 5, 30),
        )
        .await
        .unwrap();

    let entry = service
        .get_result(ThemeId::new(1), QuizId::new(101))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.result().score(), 5);
    assert_eq!(entry.best_score(), 8);

    let stats = service.global_stats().await.unwrap();
    assert_eq!(stats.history.len(), 2);
    assert_eq!(stats.total_questions_answered, 20);
    assert_eq!(stats.total_correct_answers, 13);
    // A retake of the same quiz does not grow the completed set.
    assert_eq!(stats.completed_quizzes.len(), 1);

    let days = service.streak_days().await.unwrap();
    assert_eq!(days[0].quizzes_played, 2);
}

#[tokio::test]
async fn failed_save_leaves_no_partial_state() {
    let repo = InMemoryRepository::new();
    let service = ProgressService::new(Storage::from_in_memory(repo.clone()), fixed_clock());

    service
        .save_result(
            ThemeId::new(1),
            QuizId::new(101),
            "Les Salutations",
            answers(8, 2, 30),
        )
        .await
        .unwrap();

    repo.fail_next_write();
    let err = service
        .save_result(
            ThemeId::new(2),
            QuizId::new(201),
            "La Nourriture",
            answers(10, 0, 20),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        services::ProgressServiceError::Storage(_)
    ));

    // The aborted save touched nothing: no entry, no history line, no
    // counters, no perfect-quiz badge.
    assert!(
        service
            .get_result(ThemeId::new(2), QuizId::new(201))
            .await
            .unwrap()
            .is_none()
    );
    let stats = service.global_stats().await.unwrap();
    assert_eq!(stats.history.len(), 1);
    assert_eq!(stats.total_questions_answered, 10);
    assert!(
        !service
            .badges()
            .await
            .unwrap()
            .iter()
            .any(|b| b.id == "perfect_quiz")
    );

    // Retrying the same attempt succeeds and awards the badge.
    let outcome = service
        .save_result(
            ThemeId::new(2),
            QuizId::new(201),
            "La Nourriture",
            answers(10, 0, 20),
        )
        .await
        .unwrap();
    assert!(outcome.new_badges.iter().any(|b| b.id == "perfect_quiz"));
}

#[tokio::test]
async fn badges_accumulate_across_distinct_quizzes() {
    let service = ProgressService::new(Storage::in_memory(), fixed_clock());

    let mut earned = Vec::new();
    for quiz in 0..5u64 {
        let outcome = service
            .save_result(
                ThemeId::new(1),
                QuizId::new(100 + quiz),
                format!("Quiz {quiz}"),
                answers(10, 10, 9),
            )
            .await
            .unwrap();
        earned.extend(outcome.new_badges);
    }

    let ids: Vec<_> = earned.iter().map(|b| b.id.as_str()).collect();
    assert!(ids.contains(&"first_completed"));
    assert!(ids.contains(&"five_completed"));
    assert!(ids.contains(&"hundred_questions"));
    // 5 quizzes x 20 questions x 9 seconds = 900 seconds, no marathon yet.
    assert!(!ids.contains(&"marathon"));

    // Each id was earned exactly once across the run.
    let badges = service.badges().await.unwrap();
    assert_eq!(badges.len(), ids.len());
}

#[tokio::test]
async fn reset_then_reuse() {
    let service = ProgressService::new(Storage::in_memory(), fixed_clock());
    service
        .save_result(
            ThemeId::new(1),
            QuizId::new(101),
            "Les Salutations",
            answers(8, 2, 30),
        )
        .await
        .unwrap();
    service.reset_all().await.unwrap();

    let stats = service.global_stats().await.unwrap();
    assert_eq!(stats.total_questions_answered, 0);
    assert!(stats.history.is_empty());
    assert!(service.list_entries().await.unwrap().is_empty());
    assert!(service.badges().await.unwrap().is_empty());

    // The store is immediately usable again and first-run badges re-fire.
    let outcome = service
        .save_result(
            ThemeId::new(1),
            QuizId::new(101),
            "Les Salutations",
            answers(8, 2, 30),
        )
        .await
        .unwrap();
    assert!(outcome.new_badges.iter().any(|b| b.id == "first_completed"));
}
