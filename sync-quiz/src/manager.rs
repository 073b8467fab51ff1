//! QuizManager - quiz lifecycle over the quiz slice.
//!
//! The manager owns no storage. It keeps a snapshot of the user's quizzes
//! for synchronous reads and persists the whole array through a
//! [`SyncClient`] after every change.
//!
//! Persistence comes in two flavours:
//! - awaited: `add`, `save`, `finish`, `complete`, `delete_all`,
//!   `update_all` return once the write settles, and refresh the snapshot
//!   from the remote when the write went through
//! - background: `update` and `delete` change the snapshot and return at
//!   once; the write runs in a tracked task (see `flush`, `reconcile`)

use crate::background::{BackgroundTasks, PersistFailure};
use crate::error::ManagerError;
use crate::patch::QuizPatch;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use studysync_client::{ClientError, LocalStore, RemoteStore, SaveOutcome, SyncClient};
use studysync_core::{
    category_summary, compact_numbers, next_number, renumber_after_delete, sanitize_questions,
    score_percent,
};
use studysync_types::{normalize_id, Question, Quiz, QuizList, QuizStatus};
use tracing::{debug, info, warn};

/// Sync client for the quiz slice.
pub type QuizClient<R, L> = SyncClient<QuizList, R, L>;

/// Quiz lifecycle manager for one user.
pub struct QuizManager<R, L> {
    client: Arc<QuizClient<R, L>>,
    snapshot: Arc<RwLock<QuizList>>,
    background: BackgroundTasks,
}

impl<R, L> QuizManager<R, L>
where
    R: RemoteStore + 'static,
    L: LocalStore + 'static,
{
    /// Create a manager over a quiz-slice client. The snapshot starts empty;
    /// call [`load`](Self::load) to populate it.
    pub fn new(client: Arc<QuizClient<R, L>>) -> Self {
        Self {
            client,
            snapshot: Arc::new(RwLock::new(Vec::new())),
            background: BackgroundTasks::default(),
        }
    }

    /// The underlying client.
    pub fn client(&self) -> &Arc<QuizClient<R, L>> {
        &self.client
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Quizzes with the given status, in snapshot order.
    pub fn by_status(&self, status: QuizStatus) -> Vec<Quiz> {
        self.snapshot
            .read()
            .iter()
            .filter(|q| q.status == status)
            .cloned()
            .collect()
    }

    /// Quizzes being taken.
    pub fn in_progress(&self) -> Vec<Quiz> {
        self.by_status(QuizStatus::InProgress)
    }

    /// Finished quizzes.
    pub fn completed(&self) -> Vec<Quiz> {
        self.by_status(QuizStatus::Completed)
    }

    /// Scheduled quizzes.
    pub fn planned(&self) -> Vec<Quiz> {
        self.by_status(QuizStatus::Planned)
    }

    /// Find by id. Numeric and string forms of the same id match.
    pub fn find_by_id(&self, id: &str) -> Option<Quiz> {
        self.snapshot
            .read()
            .iter()
            .find(|q| q.id.matches(id))
            .cloned()
    }

    /// Find by display number.
    pub fn find_by_number(&self, number: u32) -> Option<Quiz> {
        self.snapshot
            .read()
            .iter()
            .find(|q| q.quiz_number == number)
            .cloned()
    }

    /// Every quiz, in snapshot order.
    pub fn all(&self) -> Vec<Quiz> {
        self.snapshot.read().clone()
    }

    /// Number of quizzes.
    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    /// Whether there are no quizzes.
    pub fn is_empty(&self) -> bool {
        self.snapshot.read().is_empty()
    }

    /// Number the next created quiz will get.
    pub fn next_number(&self) -> u32 {
        next_number(self.snapshot.read().iter())
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Build an in-progress quiz shell. Not persisted until [`add`](Self::add).
    pub fn create_new(&self, questions: Vec<Question>, start_time: DateTime<Utc>) -> Quiz {
        let mut quiz = self.shell(questions, QuizStatus::InProgress);
        quiz.start_time = Some(start_time);
        quiz
    }

    /// Build a planned quiz shell. Not persisted until [`add`](Self::add).
    pub fn create_planned(&self, questions: Vec<Question>, planned_date: DateTime<Utc>) -> Quiz {
        let mut quiz = self.shell(questions, QuizStatus::Planned);
        quiz.planned_date = Some(planned_date);
        quiz
    }

    fn shell(&self, questions: Vec<Question>, status: QuizStatus) -> Quiz {
        let mut quiz = Quiz::new(self.next_number(), status);
        quiz.categories = category_summary(&questions);
        quiz.questions = questions;
        quiz
    }

    // =========================================================================
    // Awaited persistence
    // =========================================================================

    /// Populate the snapshot from the client.
    pub async fn load(&self) -> QuizList {
        let quizzes = self.client.load().await;
        *self.snapshot.write() = quizzes.clone();
        debug!(count = quizzes.len(), "quiz snapshot loaded");
        quizzes
    }

    /// Add a quiz, persist, and refresh.
    ///
    /// A quiz whose number is already taken (two shells built before either
    /// was added) gets the next free number.
    pub async fn add(&self, mut quiz: Quiz) -> Result<Quiz, ManagerError> {
        seal_completed(&mut quiz);
        {
            let mut snapshot = self.snapshot.write();
            claim_free_number(&snapshot, &mut quiz);
            snapshot.push(quiz.clone());
        }
        info!(quiz = %quiz.id, number = quiz.quiz_number, status = %quiz.status, "quiz added");
        self.persist_and_refresh("add").await?;
        Ok(quiz)
    }

    /// Replace-or-append by id and persist.
    ///
    /// Rejects moving an existing quiz backward in its lifecycle.
    pub async fn save(&self, mut quiz: Quiz) -> Result<Quiz, ManagerError> {
        quiz.last_updated = Utc::now();
        seal_completed(&mut quiz);
        {
            let mut snapshot = self.snapshot.write();
            match snapshot.iter_mut().find(|q| q.id.matches(quiz.id.as_str())) {
                Some(existing) => {
                    if !existing.status.can_advance_to(quiz.status) {
                        return Err(ManagerError::InvalidTransition {
                            id: quiz.id.to_string(),
                            from: existing.status,
                            to: quiz.status,
                        });
                    }
                    *existing = quiz.clone();
                }
                None => {
                    claim_free_number(&snapshot, &mut quiz);
                    snapshot.push(quiz.clone());
                }
            }
        }
        self.persist_now("save").await?;
        Ok(quiz)
    }

    /// Finish a quiz: score it, strip heavy media, mark it completed,
    /// persist, and refresh.
    ///
    /// `synced_questions` replaces the quiz's questions when non-empty.
    /// Finishing an already completed quiz keeps its id, number and end time.
    pub async fn finish(
        &self,
        quiz: &Quiz,
        synced_questions: Vec<Question>,
        answers: BTreeMap<String, String>,
        flagged: Vec<String>,
        elapsed_seconds: u64,
    ) -> Result<Quiz, ManagerError> {
        let existing = self.find_by_id(quiz.id.as_str());
        let base = existing.clone().unwrap_or_else(|| quiz.clone());
        let now = Utc::now();

        let mut questions = if synced_questions.is_empty() {
            quiz.questions.clone()
        } else {
            synced_questions
        };
        let correct = grade(&mut questions, &answers);
        let total = questions.len() as u32;
        let dropped = sanitize_questions(&mut questions);
        if dropped > 0 {
            debug!(quiz = %base.id, dropped, "stripped heavy fields before persisting");
        }

        let mut completed = base.clone();
        completed.questions = questions;
        completed.user_answers = answers;
        completed.flagged_questions = flagged;
        completed.time_spent = elapsed_seconds;
        completed.score = Some(score_percent(correct, total));
        completed.correct_answers = Some(correct);
        completed.total_questions = Some(total);
        completed.last_updated = now;
        if completed.categories.is_empty() {
            completed.categories = category_summary(&completed.questions);
        }

        if base.is_completed() {
            debug!(quiz = %base.id, "quiz already completed, keeping completion time");
        } else {
            if base.status == QuizStatus::Planned || completed.start_time.is_none() {
                // Implicit start
                let elapsed = i64::try_from(elapsed_seconds).unwrap_or(i64::MAX);
                completed.start_time = Some(
                    now.checked_sub_signed(ChronoDuration::seconds(elapsed))
                        .unwrap_or(now),
                );
            }
            completed.status = QuizStatus::Completed;
            completed.end_time = Some(now);
            completed.date = Some(now);
        }

        if existing.is_none() && self.find_by_number(completed.quiz_number).is_some() {
            completed.quiz_number = self.next_number();
        }

        self.replace_or_append(completed.clone());
        info!(
            quiz = %completed.id,
            number = completed.quiz_number,
            score = ?completed.score,
            "quiz finished"
        );
        self.persist_and_refresh("finish").await?;
        Ok(completed)
    }

    /// Complete a quiz with caller-supplied final fields.
    pub async fn complete(&self, id: &str, final_data: QuizPatch) -> Result<Quiz, ManagerError> {
        let completed = {
            let mut snapshot = self.snapshot.write();
            let quiz = snapshot
                .iter_mut()
                .find(|q| q.id.matches(id))
                .ok_or_else(|| ManagerError::NotFound(id.to_string()))?;

            let patch = QuizPatch {
                status: None,
                ..final_data
            };
            patch.apply(quiz);
            if !quiz.is_completed() {
                let now = Utc::now();
                quiz.status = QuizStatus::Completed;
                quiz.end_time = Some(now);
                quiz.date = Some(now);
            }
            seal_completed(quiz);
            quiz.clone()
        };
        info!(quiz = %completed.id, "quiz completed");
        self.persist_and_refresh("complete").await?;
        Ok(completed)
    }

    /// Remove every quiz, persist the empty list, and refresh.
    pub async fn delete_all(&self) -> Result<(), ManagerError> {
        let removed = std::mem::take(&mut *self.snapshot.write()).len();
        info!(removed, "deleting all quizzes");
        self.persist_and_refresh("delete_all").await
    }

    /// Replace the whole snapshot, persist, and refresh.
    pub async fn update_all(&self, mut quizzes: QuizList) -> Result<(), ManagerError> {
        quizzes.iter_mut().for_each(seal_completed);
        *self.snapshot.write() = quizzes;
        self.persist_and_refresh("update_all").await
    }

    /// Drop later copies of the same id and renumber `1..N` in order.
    ///
    /// Returns how many quizzes were removed.
    pub async fn remove_duplicates(&self) -> Result<usize, ManagerError> {
        let mut seen = HashSet::new();
        let mut quizzes = self.all();
        let before = quizzes.len();
        quizzes.retain(|q| seen.insert(q.id.normalized()));
        compact_numbers(&mut quizzes);
        let removed = before - quizzes.len();

        if removed > 0 {
            warn!(removed, "removed duplicate quizzes");
        }
        self.update_all(quizzes).await?;
        Ok(removed)
    }

    // =========================================================================
    // Background persistence
    // =========================================================================

    /// Apply a patch to a quiz and persist in the background.
    pub fn update(&self, id: &str, patch: QuizPatch) -> Result<Quiz, ManagerError> {
        let updated = {
            let mut snapshot = self.snapshot.write();
            let quiz = snapshot
                .iter_mut()
                .find(|q| q.id.matches(id))
                .ok_or_else(|| ManagerError::NotFound(id.to_string()))?;
            patch.apply(quiz);
            seal_completed(quiz);
            quiz.clone()
        };
        self.persist_in_background("update");
        Ok(updated)
    }

    /// Remove a quiz, close the numbering gap, and persist in the background.
    pub fn delete(&self, id: &str) -> Result<Quiz, ManagerError> {
        let removed = {
            let mut snapshot = self.snapshot.write();
            let index = snapshot
                .iter()
                .position(|q| q.id.matches(id))
                .ok_or_else(|| ManagerError::NotFound(id.to_string()))?;
            let removed = snapshot.remove(index);
            let renumbered = renumber_after_delete(&mut snapshot, removed.quiz_number);
            info!(quiz = %removed.id, number = removed.quiz_number, renumbered, "quiz deleted");
            removed
        };
        self.persist_in_background("delete");
        Ok(removed)
    }

    /// Background writes that failed since the last successful reconcile.
    pub fn pending_failures(&self) -> Vec<PersistFailure> {
        self.background.failures()
    }

    /// Background writes still running.
    pub fn pending_writes(&self) -> usize {
        self.background.pending()
    }

    /// Wait for every background write.
    pub async fn flush(&self) {
        self.background.flush().await;
    }

    /// Wait for background writes, then persist the snapshot again.
    ///
    /// Clears the failure list once the snapshot is confirmed written.
    pub async fn reconcile(&self) -> Result<(), ManagerError> {
        self.flush().await;
        let quizzes = self.all();
        match self.client.save(quizzes).await? {
            SaveOutcome::ShortCircuited => Err(ClientError::CircuitOpen.into()),
            outcome => {
                debug!(?outcome, "snapshot reconciled");
                self.background.clear_failures();
                Ok(())
            }
        }
    }

    fn persist_in_background(&self, operation: &'static str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.background.record(operation, "no async runtime to persist on");
            return;
        };
        let client = Arc::clone(&self.client);
        let snapshot = Arc::clone(&self.snapshot);
        let tasks = self.background.clone();

        let handle = runtime.spawn(async move {
            // Read at run time so a late task never writes an older snapshot.
            let quizzes = snapshot.read().clone();
            match client.save(quizzes).await {
                Ok(SaveOutcome::ShortCircuited) => {
                    tasks.record(operation, "circuit open, kept in memory only")
                }
                Ok(outcome) => debug!(operation, ?outcome, "background persist settled"),
                Err(e) => tasks.record(operation, e.to_string()),
            }
        });
        self.background.track(handle);
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn replace_or_append(&self, quiz: Quiz) {
        let mut snapshot = self.snapshot.write();
        match snapshot.iter_mut().find(|q| q.id.matches(quiz.id.as_str())) {
            Some(existing) => *existing = quiz,
            None => snapshot.push(quiz),
        }
    }

    async fn persist_now(&self, operation: &'static str) -> Result<SaveOutcome, ManagerError> {
        let quizzes = self.all();
        let outcome = self.client.save(quizzes).await?;
        if outcome == SaveOutcome::ShortCircuited {
            self.background
                .record(operation, "circuit open, kept in memory only");
        }
        Ok(outcome)
    }

    async fn persist_and_refresh(&self, operation: &'static str) -> Result<(), ManagerError> {
        let outcome = self.persist_now(operation).await?;
        // Only a confirmed write makes the remote authoritative again.
        if outcome != SaveOutcome::Written {
            return Ok(());
        }
        match self.client.refresh().await {
            Ok(quizzes) => {
                *self.snapshot.write() = quizzes;
                Ok(())
            }
            Err(ClientError::LoadInFlight) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Strip heavy fields from a completed quiz's questions.
fn seal_completed(quiz: &mut Quiz) {
    if !quiz.is_completed() {
        return;
    }
    let dropped = sanitize_questions(&mut quiz.questions);
    if dropped > 0 {
        debug!(quiz = %quiz.id, dropped, "stripped heavy fields from completed quiz");
    }
}

/// Give `quiz` the next free number when its number is already in use.
fn claim_free_number(quizzes: &[Quiz], quiz: &mut Quiz) {
    if quiz.quiz_number != 0 && quizzes.iter().all(|q| q.quiz_number != quiz.quiz_number) {
        return;
    }
    let number = next_number(quizzes);
    debug!(quiz = %quiz.id, from = quiz.quiz_number, to = number, "quiz number taken, renumbering");
    quiz.quiz_number = number;
}

/// Fill `user_answer`/`is_correct` from `answers`; returns the correct count.
fn grade(questions: &mut [Question], answers: &BTreeMap<String, String>) -> u32 {
    let mut correct = 0;
    for question in questions.iter_mut() {
        let answer = answers
            .get(&question.id)
            .or_else(|| answers.get(&normalize_id(&question.id)))
            .cloned();
        question.is_correct = match (&answer, &question.correct_answer) {
            (Some(given), Some(expected)) => Some(given.trim() == expected.trim()),
            (Some(_), None) => None,
            (None, _) => Some(false),
        };
        if answer.is_some() {
            question.user_answer = answer;
        }
        if question.is_correct == Some(true) {
            correct += 1;
        }
    }
    correct
}

#[cfg(test)]
mod tests {
    use super::*;
    use studysync_client::{MemoryLocalStore, MockRemoteStore, SyncConfig};
    use studysync_types::{DataType, SliceKey, UserId};

    type Manager = QuizManager<MockRemoteStore, MemoryLocalStore>;

    fn manager() -> (Manager, MockRemoteStore) {
        let remote = MockRemoteStore::new();
        let client = SyncClient::new(
            DataType::Quizzes,
            remote.clone(),
            MemoryLocalStore::new(),
            SyncConfig::default(),
        );
        client.sign_in(UserId::new("student").unwrap());
        (QuizManager::new(Arc::new(client)), remote)
    }

    fn quiz_key() -> SliceKey {
        SliceKey::new(UserId::new("student").unwrap(), DataType::Quizzes)
    }

    fn question(id: &str, category: &str, correct: &str) -> Question {
        let mut q = Question::new(id, format!("question {id}"));
        q.category = Some(category.into());
        q.correct_answer = Some(correct.into());
        q
    }

    fn numbers(manager: &Manager) -> Vec<u32> {
        manager.all().iter().map(|q| q.quiz_number).collect()
    }

    // ===========================================
    // Creation Tests
    // ===========================================

    #[tokio::test]
    async fn shells_get_next_number_and_category() {
        let (manager, remote) = manager();
        let now = Utc::now();

        let first = manager.create_new(vec![question("1", "Biology", "A")], now);
        assert_eq!(first.quiz_number, 1);
        assert_eq!(first.status, QuizStatus::InProgress);
        assert_eq!(first.categories, "Biology");
        assert_eq!(first.start_time, Some(now));
        // Shells are not persisted
        assert_eq!(remote.write_calls(), 0);

        manager.add(first).await.unwrap();
        let planned = manager.create_planned(
            vec![question("2", "Biology", "A"), question("3", "Physics", "B")],
            now,
        );
        assert_eq!(planned.quiz_number, 2);
        assert_eq!(planned.status, QuizStatus::Planned);
        assert_eq!(planned.categories, "Mixed");
        assert_ne!(planned.id, manager.all()[0].id);
    }

    #[tokio::test]
    async fn add_persists_and_refreshes() {
        let (manager, remote) = manager();
        let quiz = manager.create_new(vec![], Utc::now());

        manager.add(quiz.clone()).await.unwrap();

        assert_eq!(remote.write_calls(), 1);
        assert_eq!(remote.fetch_calls(), 1);
        assert_eq!(manager.find_by_id(quiz.id.as_str()).unwrap().id, quiz.id);
        assert_eq!(manager.in_progress().len(), 1);
    }

    #[tokio::test]
    async fn add_propagates_write_errors() {
        let (manager, remote) = manager();
        remote.fail_all_writes(true);

        let result = manager.add(manager.create_new(vec![], Utc::now())).await;

        assert!(matches!(result, Err(ManagerError::Client(_))));
        // Snapshot keeps the optimistic add
        assert_eq!(manager.len(), 1);
    }

    // ===========================================
    // Lookup Tests
    // ===========================================

    #[tokio::test]
    async fn numeric_ids_match_their_string_form() {
        let (manager, remote) = manager();
        remote.set_record(
            &quiz_key(),
            serde_json::json!([{"id": 42, "quiz_number": 1, "status": "completed"}]),
        );

        manager.load().await;

        assert!(manager.find_by_id("42").is_some());
        assert!(manager.find_by_id(" 42.0 ").is_some());
        assert!(manager.find_by_number(1).is_some());
        assert!(manager.find_by_number(2).is_none());
        assert_eq!(manager.completed().len(), 1);
    }

    // ===========================================
    // Save Tests
    // ===========================================

    #[tokio::test]
    async fn save_rejects_backward_status() {
        let (manager, _) = manager();
        let mut quiz = manager.create_new(vec![], Utc::now());
        quiz.status = QuizStatus::Completed;
        manager.save(quiz.clone()).await.unwrap();

        quiz.status = QuizStatus::InProgress;
        let result = manager.save(quiz.clone()).await;

        assert!(matches!(
            result,
            Err(ManagerError::InvalidTransition {
                from: QuizStatus::Completed,
                to: QuizStatus::InProgress,
                ..
            })
        ));
        assert_eq!(manager.completed().len(), 1);
    }

    #[tokio::test]
    async fn save_replaces_matching_quiz() {
        let (manager, remote) = manager();
        let mut quiz = manager.create_new(vec![], Utc::now());
        manager.save(quiz.clone()).await.unwrap();

        quiz.current_question_index = 4;
        manager.save(quiz).await.unwrap();

        assert_eq!(manager.len(), 1);
        assert_eq!(manager.all()[0].current_question_index, 4);
        assert_eq!(remote.write_calls(), 2);
    }

    // ===========================================
    // Finish Tests
    // ===========================================

    #[tokio::test]
    async fn finish_scores_and_completes() {
        let (manager, _) = manager();
        let questions = vec![
            question("1", "Biology", "A"),
            question("2", "Biology", "B"),
            question("3", "Biology", "C"),
        ];
        let quiz = manager.create_new(questions, Utc::now());
        manager.add(quiz.clone()).await.unwrap();

        let answers = BTreeMap::from([
            ("1".to_string(), "A".to_string()),
            ("2".to_string(), "B".to_string()),
            ("3".to_string(), "D".to_string()),
        ]);
        let done = manager
            .finish(&quiz, vec![], answers, vec!["3".into()], 120)
            .await
            .unwrap();

        assert_eq!(done.status, QuizStatus::Completed);
        assert_eq!(done.score, Some(67));
        assert_eq!(done.correct_answers, Some(2));
        assert_eq!(done.total_questions, Some(3));
        assert_eq!(done.time_spent, 120);
        assert!(done.end_time.is_some());
        assert_eq!(done.questions[2].is_correct, Some(false));
        assert_eq!(done.questions[2].user_answer.as_deref(), Some("D"));
        assert_eq!(manager.completed().len(), 1);
        assert!(manager.in_progress().is_empty());
    }

    #[tokio::test]
    async fn finish_with_no_questions_scores_zero() {
        let (manager, _) = manager();
        let quiz = manager.create_new(vec![], Utc::now());

        let done = manager
            .finish(&quiz, vec![], BTreeMap::new(), vec![], 5)
            .await
            .unwrap();

        assert_eq!(done.score, Some(0));
        assert_eq!(done.quiz_number, 1);
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn finishing_planned_quiz_is_implicit_start() {
        let (manager, _) = manager();
        let planned = manager.create_planned(vec![question("1", "Math", "A")], Utc::now());
        manager.add(planned.clone()).await.unwrap();

        let done = manager
            .finish(&planned, vec![], BTreeMap::new(), vec![], 60)
            .await
            .unwrap();

        assert_eq!(done.status, QuizStatus::Completed);
        let start = done.start_time.unwrap();
        assert_eq!(done.end_time.unwrap() - start, ChronoDuration::seconds(60));
    }

    // ===========================================
    // Update & Delete Tests
    // ===========================================

    #[tokio::test]
    async fn update_is_synchronous_and_persisted_in_background() {
        let (manager, remote) = manager();
        let quiz = manager.create_new(vec![], Utc::now());
        manager.add(quiz.clone()).await.unwrap();

        let updated = manager
            .update(quiz.id.as_str(), QuizPatch::answer(&quiz, "1", "B"))
            .unwrap();
        assert_eq!(updated.user_answers["1"], "B");
        assert_eq!(manager.all()[0].user_answers["1"], "B");

        manager.flush().await;
        assert_eq!(remote.write_calls(), 2);
        assert!(manager.pending_failures().is_empty());
    }

    #[tokio::test]
    async fn update_unknown_quiz_is_not_found() {
        let (manager, _) = manager();
        assert!(matches!(
            manager.update("missing", QuizPatch::default()),
            Err(ManagerError::NotFound(_))
        ));
        assert!(matches!(
            manager.delete("missing"),
            Err(ManagerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_renumbers_survivors() {
        let (manager, _) = manager();
        for _ in 0..3 {
            let quiz = manager.create_new(vec![], Utc::now());
            manager.add(quiz).await.unwrap();
        }
        assert_eq!(numbers(&manager), vec![1, 2, 3]);

        let second = manager.find_by_number(2).unwrap();
        manager.delete(second.id.as_str()).unwrap();

        assert_eq!(numbers(&manager), vec![1, 2]);
        assert_eq!(manager.next_number(), 3);
        manager.flush().await;
    }

    #[tokio::test]
    async fn complete_merges_final_fields() {
        let (manager, _) = manager();
        let quiz = manager.create_new(vec![], Utc::now());
        manager.add(quiz.clone()).await.unwrap();

        let done = manager
            .complete(
                quiz.id.as_str(),
                QuizPatch {
                    score: Some(80),
                    status: Some(QuizStatus::Planned),
                    ..QuizPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(done.status, QuizStatus::Completed);
        assert_eq!(done.score, Some(80));
        assert!(done.end_time.is_some());
    }

    #[tokio::test]
    async fn delete_all_persists_empty_list() {
        let (manager, remote) = manager();
        manager
            .add(manager.create_new(vec![], Utc::now()))
            .await
            .unwrap();

        manager.delete_all().await.unwrap();

        assert!(manager.is_empty());
        assert_eq!(
            remote.record(&quiz_key()),
            Some(serde_json::json!([]))
        );
    }

    #[tokio::test]
    async fn remove_duplicates_keeps_first_and_compacts() {
        let (manager, _) = manager();
        let a = Quiz::new(1, QuizStatus::Completed);
        let mut a_copy = a.clone();
        a_copy.quiz_number = 2;
        let b = Quiz::new(3, QuizStatus::InProgress);
        manager
            .update_all(vec![a.clone(), a_copy, b.clone()])
            .await
            .unwrap();

        let removed = manager.remove_duplicates().await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(numbers(&manager), vec![1, 2]);
        assert_eq!(manager.find_by_number(2).unwrap().id, b.id);
    }

    #[test]
    fn grading_marks_unanswered_as_incorrect() {
        let mut questions = vec![question("1", "x", "A"), question("2", "x", "B")];
        let answers = BTreeMap::from([("1".to_string(), " A ".to_string())]);

        assert_eq!(grade(&mut questions, &answers), 1);
        assert_eq!(questions[0].is_correct, Some(true));
        assert_eq!(questions[1].is_correct, Some(false));
        assert_eq!(questions[1].user_answer, None);
    }
}
