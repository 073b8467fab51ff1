//! Quiz lifecycle scenarios against the mock remote.
//!
//! Each scenario drives a `QuizManager` through a sequence of operations and
//! checks both the in-memory snapshot and the record the remote ends up with.

use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use studysync_client::{MemoryLocalStore, MockRemoteStore, SyncClient, SyncConfig};
use studysync_core::{is_contiguous, MAX_FIELD_BYTES};
use studysync_quiz::{QuizManager, QuizPatch};
use studysync_types::{DataType, Question, Quiz, QuizStatus, SliceKey, UserId};

type Manager = QuizManager<MockRemoteStore, MemoryLocalStore>;

fn quiz_key() -> SliceKey {
    SliceKey::new(UserId::new("learner").unwrap(), DataType::Quizzes)
}

fn manager_with(config: SyncConfig) -> (Manager, MockRemoteStore) {
    let remote = MockRemoteStore::new();
    let client = SyncClient::new(
        DataType::Quizzes,
        remote.clone(),
        MemoryLocalStore::new(),
        config,
    );
    client.sign_in(UserId::new("learner").unwrap());
    (QuizManager::new(Arc::new(client)), remote)
}

fn manager() -> (Manager, MockRemoteStore) {
    manager_with(SyncConfig::default())
}

fn remote_quizzes(remote: &MockRemoteStore) -> Vec<Quiz> {
    let value = remote.record(&quiz_key()).unwrap_or(Value::Array(vec![]));
    serde_json::from_value(value).unwrap()
}

fn numbers(quizzes: &[Quiz]) -> Vec<u32> {
    quizzes.iter().map(|q| q.quiz_number).collect()
}

async fn add_quizzes(manager: &Manager, count: usize) -> Vec<Quiz> {
    let mut added = Vec::new();
    for _ in 0..count {
        let quiz = manager.create_new(vec![Question::new("1", "stem")], Utc::now());
        added.push(manager.add(quiz).await.unwrap());
    }
    added
}

// ============================================================================
// Numbering
// ============================================================================

/// Deleting #2 of [1, 2, 3] leaves [1, 2] locally and remotely.
#[tokio::test]
async fn delete_middle_quiz_renumbers() {
    let (manager, remote) = manager();
    let quizzes = add_quizzes(&manager, 3).await;

    manager.delete(quizzes[1].id.as_str()).unwrap();
    assert_eq!(numbers(&manager.all()), vec![1, 2]);

    manager.flush().await;
    let persisted = remote_quizzes(&remote);
    assert_eq!(numbers(&persisted), vec![1, 2]);
    assert_eq!(persisted[1].id, quizzes[2].id);
}

/// Any interleaving of creates and deletes keeps numbers contiguous.
#[tokio::test]
async fn numbering_stays_contiguous() {
    let (manager, remote) = manager();
    let quizzes = add_quizzes(&manager, 5).await;

    manager.delete(quizzes[0].id.as_str()).unwrap();
    manager.delete(quizzes[3].id.as_str()).unwrap();
    assert!(is_contiguous(&manager.all()));

    let planned = manager.create_planned(vec![], Utc::now());
    assert_eq!(planned.quiz_number, 4);
    manager.add(planned).await.unwrap();
    manager.delete(quizzes[4].id.as_str()).unwrap();

    manager.flush().await;
    assert!(is_contiguous(&manager.all()));
    assert_eq!(manager.len(), 3);
    assert!(is_contiguous(&remote_quizzes(&remote)));
}

/// Shells built before either is added still end up with distinct numbers.
#[tokio::test]
async fn shells_built_together_get_distinct_numbers() {
    let (manager, remote) = manager();
    let a = manager.create_new(vec![], Utc::now());
    let b = manager.create_new(vec![], Utc::now());
    assert_eq!(a.quiz_number, b.quiz_number);

    manager.add(a).await.unwrap();
    let added = manager.add(b.clone()).await.unwrap();

    assert_eq!(added.id, b.id);
    assert_eq!(added.quiz_number, 2);
    assert_eq!(numbers(&remote_quizzes(&remote)), vec![1, 2]);
    assert!(is_contiguous(&manager.all()));
}

// ============================================================================
// Finish
// ============================================================================

/// Finishing twice with the same inputs yields the same record.
#[tokio::test]
async fn finish_is_idempotent() {
    let (manager, _) = manager();
    let mut q1 = Question::new("1", "stem");
    q1.correct_answer = Some("A".into());
    let mut q2 = Question::new("2", "stem");
    q2.correct_answer = Some("B".into());
    let quiz = manager.add(manager.create_new(vec![q1, q2], Utc::now())).await.unwrap();
    let answers = BTreeMap::from([("1".to_string(), "A".to_string())]);

    let first = manager
        .finish(&quiz, vec![], answers.clone(), vec![], 30)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = manager
        .finish(&quiz, vec![], answers, vec![], 30)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.quiz_number, second.quiz_number);
    assert_eq!(first.score, Some(50));
    assert_eq!(first.score, second.score);
    assert_eq!(first.end_time, second.end_time);
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.completed().len(), 1);
}

fn longest_string(value: &Value) -> usize {
    match value {
        Value::String(s) => s.len(),
        Value::Array(items) => items.iter().map(longest_string).max().unwrap_or(0),
        Value::Object(map) => map.values().map(longest_string).max().unwrap_or(0),
        _ => 0,
    }
}

/// Persisted completed quizzes carry no oversized inline payloads.
#[tokio::test]
async fn finish_strips_heavy_media() {
    let (manager, remote) = manager();
    let mut heavy = Question::new("1", "stem");
    heavy.passage_image = Some(format!(
        "data:image/png;base64,{}",
        "A".repeat(MAX_FIELD_BYTES + 1)
    ));
    heavy.explanation_image = Some("https://cdn.example.com/diagram.png".into());
    heavy
        .extra
        .insert("imageData".into(), Value::from("small but binary"));
    heavy
        .extra
        .insert("notes".into(), Value::from("x".repeat(MAX_FIELD_BYTES * 2)));
    let quiz = manager.add(manager.create_new(vec![heavy], Utc::now())).await.unwrap();

    manager
        .finish(&quiz, vec![], BTreeMap::new(), vec![], 10)
        .await
        .unwrap();

    let record = remote.record(&quiz_key()).unwrap();
    assert!(longest_string(&record) <= MAX_FIELD_BYTES);

    let persisted = remote_quizzes(&remote);
    let question = &persisted[0].questions[0];
    assert!(question.passage_image.is_none());
    assert_eq!(
        question.explanation_image.as_deref(),
        Some("https://cdn.example.com/diagram.png")
    );
    assert!(!question.extra.contains_key("imageData"));
    assert!(!question.extra.contains_key("notes"));
}

fn oversized_question() -> Question {
    let mut question = Question::new("1", "stem");
    question.explanation = Some("e".repeat(MAX_FIELD_BYTES + 1));
    question
}

/// Completing with caller-supplied questions strips oversized fields.
#[tokio::test]
async fn complete_strips_oversized_fields() {
    let (manager, remote) = manager();
    let quiz = manager.add(manager.create_new(vec![], Utc::now())).await.unwrap();

    let done = manager
        .complete(
            quiz.id.as_str(),
            QuizPatch {
                questions: Some(vec![oversized_question()]),
                ..QuizPatch::default()
            },
        )
        .await
        .unwrap();

    assert!(done.questions[0].explanation.is_none());
    let persisted = remote_quizzes(&remote);
    assert_eq!(persisted[0].status, QuizStatus::Completed);
    assert!(persisted[0].questions[0].explanation.is_none());
    assert!(longest_string(&remote.record(&quiz_key()).unwrap()) <= MAX_FIELD_BYTES);
}

/// Saving a completed quiz strips oversized fields; in-progress quizzes keep theirs.
#[tokio::test]
async fn save_strips_oversized_fields_of_completed_quizzes() {
    let (manager, remote) = manager();
    let mut quiz = manager.create_new(vec![oversized_question()], Utc::now());
    manager.save(quiz.clone()).await.unwrap();
    assert!(remote_quizzes(&remote)[0].questions[0].explanation.is_some());

    quiz.status = QuizStatus::Completed;
    let saved = manager.save(quiz).await.unwrap();

    assert!(saved.questions[0].explanation.is_none());
    assert!(longest_string(&remote.record(&quiz_key()).unwrap()) <= MAX_FIELD_BYTES);
}

/// Patching a completed quiz's questions in the background strips oversized fields.
#[tokio::test]
async fn update_strips_oversized_fields_of_completed_quizzes() {
    let (manager, remote) = manager();
    let quiz = manager.add(manager.create_new(vec![], Utc::now())).await.unwrap();
    let done = manager
        .finish(&quiz, vec![], BTreeMap::new(), vec![], 5)
        .await
        .unwrap();

    let patched = manager
        .update(
            done.id.as_str(),
            QuizPatch {
                questions: Some(vec![oversized_question()]),
                ..QuizPatch::default()
            },
        )
        .unwrap();
    manager.flush().await;

    assert!(patched.questions[0].explanation.is_none());
    assert!(longest_string(&remote.record(&quiz_key()).unwrap()) <= MAX_FIELD_BYTES);
    assert!(manager.pending_failures().is_empty());
}

/// A completed quiz cannot be saved back to in-progress.
#[tokio::test]
async fn completed_is_terminal() {
    let (manager, _) = manager();
    let quiz = manager.add(manager.create_new(vec![], Utc::now())).await.unwrap();
    let done = manager
        .finish(&quiz, vec![], BTreeMap::new(), vec![], 1)
        .await
        .unwrap();

    let mut reopened = done.clone();
    reopened.status = QuizStatus::InProgress;
    assert!(manager.save(reopened).await.is_err());

    let patched = manager
        .update(
            done.id.as_str(),
            QuizPatch {
                status: Some(QuizStatus::Planned),
                ..QuizPatch::default()
            },
        )
        .unwrap();
    assert_eq!(patched.status, QuizStatus::Completed);
    manager.flush().await;
}

// ============================================================================
// Background persistence
// ============================================================================

/// A failed background write is listed until a reconcile succeeds.
#[tokio::test]
async fn background_failure_is_visible_and_reconciled() {
    let (manager, remote) = manager();
    let quiz = manager.add(manager.create_new(vec![], Utc::now())).await.unwrap();

    remote.fail_all_writes(true);
    manager
        .update(quiz.id.as_str(), QuizPatch::answer(&quiz, "1", "C"))
        .unwrap();
    manager.flush().await;

    let failures = manager.pending_failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].operation, "update");
    assert!(remote_quizzes(&remote)[0].user_answers.is_empty());

    // Still failing: reconcile reports it and keeps the list
    assert!(manager.reconcile().await.is_err());
    assert_eq!(manager.pending_failures().len(), 1);

    remote.fail_all_writes(false);
    manager.reconcile().await.unwrap();

    assert!(manager.pending_failures().is_empty());
    assert_eq!(remote_quizzes(&remote)[0].user_answers["1"], "C");
}

/// Rapid autosaves coalesce; the final state still reaches the remote.
#[tokio::test]
async fn autosave_burst_converges() {
    let (manager, remote) = manager();
    let quiz = manager.add(manager.create_new(vec![], Utc::now())).await.unwrap();
    remote.set_write_delay(Some(Duration::from_millis(20)));
    let writes_before = remote.write_calls();

    for index in 1..=10 {
        manager
            .update(
                quiz.id.as_str(),
                QuizPatch {
                    current_question_index: Some(index),
                    ..QuizPatch::default()
                },
            )
            .unwrap();
    }
    manager.flush().await;

    assert!(remote.write_calls() - writes_before < 10);
    assert_eq!(remote_quizzes(&remote)[0].current_question_index, 10);
    assert!(manager.pending_failures().is_empty());
}

// ============================================================================
// Connectivity
// ============================================================================

/// A transient fetch failure is retried and the snapshot still loads.
#[tokio::test(start_paused = true)]
async fn load_recovers_from_transient_failure() {
    let (manager, remote) = manager();
    let stored = vec![Quiz::new(1, QuizStatus::Planned)];
    remote.set_record(&quiz_key(), serde_json::to_value(&stored).unwrap());
    remote.fail_next_fetch("connection reset");

    let loaded = manager.load().await;

    assert_eq!(loaded.len(), 1);
    assert_eq!(manager.planned().len(), 1);
    assert_eq!(remote.fetch_calls(), 2);
}

/// With the breaker open, awaited writes stay in memory and are reported.
#[tokio::test]
async fn open_breaker_keeps_changes_in_memory() {
    let (manager, remote) = manager_with(SyncConfig::default().with_failure_threshold(1));
    remote.fail_all_writes(true);

    assert!(manager.add(manager.create_new(vec![], Utc::now())).await.is_err());
    let calls = remote.write_calls();

    manager
        .add(manager.create_new(vec![], Utc::now()))
        .await
        .unwrap();

    assert_eq!(remote.write_calls(), calls);
    assert_eq!(manager.len(), 2);
    assert_eq!(manager.pending_failures().len(), 1);
}
