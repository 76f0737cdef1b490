use quiz_core::model::{
    Badge, ProgressEntry, QuestionOutcome, QuizId, QuizKey, QuizResult, ThemeId,
};
use quiz_core::time::fixed_now;
use storage::repository::{
    AttemptWrite, BadgeRepository, MaintenanceRepository, ProgressRepository, StatsRepository,
    StreakRepository,
};
use storage::sqlite::SqliteRepository;

fn build_result(theme: u64, quiz: u64, correct: usize, incorrect: usize) -> QuizResult {
    let mut questions = Vec::new();
    for i in 0..correct {
        questions.push(QuestionOutcome::answered(format!("Option {i}"), true, 30));
    }
    for i in 0..incorrect {
        questions.push(QuestionOutcome::answered(format!("Option {i}"), false, 30));
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

#[tokio::test]
async fn sqlite_roundtrip_persists_entry_and_stats() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let result = build_result(1, 101, 8, 2);
    let write = AttemptWrite::for_entry(ProgressEntry::new(result), fixed_now());
    repo.save_attempt(&write).await.unwrap();

    let entry = repo
        .get_entry(ThemeId::new(1), QuizId::new(101))
        .await
        .expect("fetch")
        .expect("entry exists");
    assert_eq!(entry.result().score(), 8);
    assert_eq!(entry.result().total(), 10);
    assert_eq!(entry.result().accuracy(), 80);
    assert!(entry.result().completed());
    assert_eq!(entry.best_score(), 8);
    assert_eq!(entry.result().questions().len(), 10);
    assert_eq!(
        entry.result().questions()[0].selected_answer.as_deref(),
        Some("Option 0")
    );

    let stats = repo.global_stats().await.unwrap();
    assert_eq!(stats.total_questions_answered, 10);
    assert_eq!(stats.total_correct_answers, 8);
    assert_eq!(stats.total_time_played_seconds, 300);
    assert_eq!(stats.history.len(), 1);
    assert!(
        stats
            .completed_quizzes
            .contains(&QuizKey::new(ThemeId::new(1), QuizId::new(101)))
    );

    let days = repo.list_days().await.unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].quizzes_played, 1);
}

#[tokio::test]
async fn sqlite_retake_replaces_entry_but_accumulates_counters() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_retake?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let first = AttemptWrite::for_entry(ProgressEntry::new(build_result(1, 101, 8, 2)), fixed_now());
    repo.save_attempt(&first).await.unwrap();

    let prior = repo
        .get_entry(ThemeId::new(1), QuizId::new(101))
        .await
        .unwrap()
        .unwrap();
    let second = AttemptWrite::for_entry(prior.absorb(build_result(1, 101, 5, 5)), fixed_now());
    repo.save_attempt(&second).await.unwrap();

    let entry = repo
        .get_entry(ThemeId::new(1), QuizId::new(101))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.result().score(), 5);
    assert_eq!(entry.best_score(), 8);

    let stats = repo.global_stats().await.unwrap();
    assert_eq!(stats.total_questions_answered, 20);
    assert_eq!(stats.total_correct_answers, 13);
    assert_eq!(stats.history.len(), 2);
    assert_eq!(stats.completed_quizzes.len(), 1);

    let entries = repo.list_entries().await.unwrap();
    assert_eq!(entries.len(), 1);

    let days = repo.list_days().await.unwrap();
    assert_eq!(days[0].quizzes_played, 2);
}

#[tokio::test]
async fn sqlite_persists_badges_once() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_badges?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let badge = Badge::new(
        "first_completed",
        "Premier Pas",
        "Complete your first quiz",
        "🎯",
        fixed_now(),
    );
    let write = AttemptWrite::for_entry(ProgressEntry::new(build_result(1, 101, 8, 2)), fixed_now())
        .with_badges(vec![badge.clone()]);
    repo.save_attempt(&write).await.unwrap();

    // A second save carrying the same badge id must not duplicate it.
    let retake =
        AttemptWrite::for_entry(ProgressEntry::new(build_result(1, 102, 6, 4)), fixed_now())
            .with_badges(vec![badge]);
    repo.save_attempt(&retake).await.unwrap();

    let badges = repo.list_badges().await.unwrap();
    assert_eq!(badges.len(), 1);
    assert_eq!(badges[0].id, "first_completed");
    assert_eq!(badges[0].name, "Premier Pas");
}

#[tokio::test]
async fn sqlite_reset_all_clears_every_partition() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_reset?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let write = AttemptWrite::for_entry(ProgressEntry::new(build_result(1, 101, 8, 2)), fixed_now())
        .with_badges(vec![Badge::new(
            "first_completed",
            "Premier Pas",
            "Complete your first quiz",
            "🎯",
            fixed_now(),
        )]);
    repo.save_attempt(&write).await.unwrap();

    repo.reset_all().await.unwrap();

    assert!(repo.list_entries().await.unwrap().is_empty());
    assert!(repo.list_badges().await.unwrap().is_empty());
    assert!(repo.list_days().await.unwrap().is_empty());

    let stats = repo.global_stats().await.unwrap();
    assert_eq!(stats.total_questions_answered, 0);
    assert_eq!(stats.total_correct_answers, 0);
    assert_eq!(stats.total_time_played_seconds, 0);
    assert!(stats.completed_quizzes.is_empty());
    assert!(stats.history.is_empty());

    // The store is usable again after a reset.
    let write = AttemptWrite::for_entry(ProgressEntry::new(build_result(2, 201, 3, 7)), fixed_now());
    repo.save_attempt(&write).await.unwrap();
    assert_eq!(
        repo.global_stats().await.unwrap().total_questions_answered,
        10
    );
}

#[tokio::test]
async fn sqlite_reset_between_saves_leaves_exactly_post_reset_deltas() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_interleave?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let first = AttemptWrite::for_entry(ProgressEntry::new(build_result(1, 101, 8, 2)), fixed_now());
    repo.save_attempt(&first).await.unwrap();
    repo.reset_all().await.unwrap();

    let second =
        AttemptWrite::for_entry(ProgressEntry::new(build_result(2, 201, 3, 7)), fixed_now());
    repo.save_attempt(&second).await.unwrap();

    // The additive counter updates start from the zeroed singleton row, so
    // only the post-reset attempt is reflected and nothing can underflow.
    let stats = repo.global_stats().await.unwrap();
    assert_eq!(stats.total_questions_answered, 10);
    assert_eq!(stats.total_correct_answers, 3);
    assert_eq!(stats.total_time_played_seconds, 300);
    assert_eq!(stats.history.len(), 1);
    assert_eq!(stats.completed_quizzes.len(), 1);
    assert!(
        stats
            .completed_quizzes
            .contains(&QuizKey::new(ThemeId::new(2), QuizId::new(201)))
    );

    // A reset with nothing pending lands back at all-zero counters.
    repo.reset_all().await.unwrap();
    let stats = repo.global_stats().await.unwrap();
    assert_eq!(stats.total_questions_answered, 0);
    assert_eq!(stats.total_correct_answers, 0);
    assert_eq!(stats.total_time_played_seconds, 0);
}

#[tokio::test]
async fn sqlite_incomplete_attempt_does_not_mark_completed() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_incomplete?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let mut questions = vec![QuestionOutcome::answered("Option A", true, 20)];
    questions.push(QuestionOutcome::unanswered());
    let result = QuizResult::new(
        ThemeId::new(1),
        QuizId::new(101),
        "Partial",
        questions,
        fixed_now(),
    )
    .unwrap();
    let write = AttemptWrite::for_entry(ProgressEntry::new(result), fixed_now());
    repo.save_attempt(&write).await.unwrap();

    let stats = repo.global_stats().await.unwrap();
    assert!(stats.completed_quizzes.is_empty());
    assert_eq!(stats.total_questions_answered, 2);

    let entry = repo
        .get_entry(ThemeId::new(1), QuizId::new(101))
        .await
        .unwrap()
        .unwrap();
    assert!(!entry.result().completed());
    assert!(entry.result().questions()[1].status.is_none());
}
