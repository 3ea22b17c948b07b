//! Session registry: owns the live session map.

use std::{collections::HashMap, sync::Arc};

use codelive_core::{
    CatalogError, ExerciseCatalog, MatchOutcome, ParticipantId, Role,
};
use tokio::sync::{Mutex, RwLock};

use crate::session::Session;

/// Registry error.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Unknown exercise: {0}")]
    UnknownExercise(String),
    #[error("Mentor view is read-only")]
    MentorReadOnly,
    #[error("Catalog error: {0}")]
    Catalog(String),
}

impl From<CatalogError> for RegistryError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => Self::UnknownExercise(id),
            other => Self::Catalog(other.to_string()),
        }
    }
}

/// Result of a successful join: what the client needs for initial
/// rendering.
#[derive(Debug, Clone)]
pub struct Joined {
    /// Role assigned by first-claim.
    pub role: Role,
    /// Snapshot of the session's current buffer.
    pub buffer: String,
}

/// Result of a leave. Unknown sessions and non-members are reported,
/// not errored, so disconnect races stay harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Left {
    /// The participant was removed.
    Departed {
        was_mentor: bool,
        /// The session's participant set emptied and it was destroyed.
        destroyed: bool,
    },
    /// The participant was not a member; no-op.
    NotAMember,
    /// No live session for that exercise id; no-op.
    NoSuchSession,
}

/// Everyone who must hear about an accepted edit.
#[derive(Debug, Clone)]
pub struct BroadcastSet {
    /// The buffer text after the edit.
    pub text: String,
    /// Every member except the editor, in join order.
    pub recipients: Vec<ParticipantId>,
    /// Every member including the editor, for match notifications.
    pub members: Vec<ParticipantId>,
    /// Match evaluation for the updated buffer.
    pub match_outcome: MatchOutcome,
}

/// Result of an accepted (non-erroring) edit submission.
#[derive(Debug, Clone)]
pub enum EditApplied {
    /// Buffer replaced; fan the update out.
    Broadcast(BroadcastSet),
    /// Editor is not tracked in the session (late message after a
    /// disconnect); nothing changed.
    Stale,
}

/// Owns every live session, keyed by exercise id.
///
/// One session is processed as a strictly ordered stream of events: the
/// per-session mutex serializes joins, leaves, and edits, and the edit
/// plus its match evaluation execute under one lock hold. Different
/// sessions share nothing and proceed concurrently.
pub struct SessionRegistry<C>
where
    C: ExerciseCatalog,
{
    catalog: C,
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl<C> SessionRegistry<C>
where
    C: ExerciseCatalog,
{
    /// Create a registry over the given catalog.
    #[must_use]
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Attach a participant to the session for `exercise_id`, creating
    /// the session on first join (buffer seeded from the exercise's
    /// starter code).
    ///
    /// The map write lock is held across create-and-add so two
    /// simultaneous first-joiners resolve to exactly one session and
    /// one mentor.
    ///
    /// # Errors
    /// `UnknownExercise` if the catalog has no such id; no session is
    /// created in that case.
    pub async fn join(
        &self,
        exercise_id: &str,
        participant_id: ParticipantId,
    ) -> Result<Joined, RegistryError> {
        let mut sessions = self.sessions.write().await;

        let entry = if let Some(existing) = sessions.get(exercise_id) {
            Arc::clone(existing)
        } else {
            let exercise = self.catalog.get(exercise_id).await?;
            let created = Arc::new(Mutex::new(Session::new(&exercise)));
            sessions.insert(exercise_id.to_string(), Arc::clone(&created));
            tracing::info!(exercise_id, "session created");
            created
        };

        let mut session = entry.lock().await;
        let role = session.add(participant_id);
        tracing::debug!(exercise_id, %participant_id, ?role, "participant joined");

        Ok(Joined {
            role,
            buffer: session.buffer().to_string(),
        })
    }

    /// Detach a participant. Departing mentors leave the seat vacant
    /// (no promotion); an emptied session is destroyed. Idempotent:
    /// unknown sessions and non-members are no-ops.
    pub async fn leave(&self, exercise_id: &str, participant_id: ParticipantId) -> Left {
        let mut sessions = self.sessions.write().await;

        let Some(entry) = sessions.get(exercise_id).map(Arc::clone) else {
            return Left::NoSuchSession;
        };

        let mut session = entry.lock().await;
        let Some(role) = session.remove(participant_id) else {
            return Left::NotAMember;
        };

        let destroyed = session.is_empty();
        drop(session);
        if destroyed {
            sessions.remove(exercise_id);
            tracing::info!(exercise_id, "session destroyed");
        }

        Left::Departed {
            was_mentor: role == Role::Mentor,
            destroyed,
        }
    }

    /// Replace the session buffer with `new_text` (last-write-wins) and
    /// evaluate the solution match, as one serialized unit.
    ///
    /// A no-op edit (text unchanged) still broadcasts and still
    /// evaluates; an empty string is a valid buffer.
    ///
    /// # Errors
    /// `MentorReadOnly` if the submitter holds the mentor role; the
    /// buffer is untouched and nothing is broadcast. `UnknownExercise`
    /// if no live session exists for the id.
    pub async fn apply_edit(
        &self,
        exercise_id: &str,
        participant_id: ParticipantId,
        new_text: String,
    ) -> Result<EditApplied, RegistryError> {
        let entry = {
            let sessions = self.sessions.read().await;
            sessions
                .get(exercise_id)
                .map(Arc::clone)
                .ok_or_else(|| RegistryError::UnknownExercise(exercise_id.to_string()))?
        };

        let mut session = entry.lock().await;

        let Some(role) = session.role_of(participant_id) else {
            // Late message after a disconnect; keep the race harmless.
            tracing::debug!(exercise_id, %participant_id, "edit from untracked participant");
            return Ok(EditApplied::Stale);
        };

        if !role.can_edit() {
            return Err(RegistryError::MentorReadOnly);
        }

        let match_outcome = session.replace_buffer(new_text);
        if match_outcome.is_entry() {
            tracing::info!(exercise_id, "buffer matched the solution");
        }

        Ok(EditApplied::Broadcast(BroadcastSet {
            text: session.buffer().to_string(),
            recipients: session.others(participant_id),
            members: session.members(),
            match_outcome,
        }))
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Run `f` against the session for `exercise_id`, if one is live.
    pub async fn inspect<T>(
        &self,
        exercise_id: &str,
        f: impl FnOnce(&Session) -> T,
    ) -> Option<T> {
        let entry = {
            let sessions = self.sessions.read().await;
            sessions.get(exercise_id).map(Arc::clone)
        }?;
        let session = entry.lock().await;
        Some(f(&session))
    }
}

#[cfg(test)]
mod tests {
    use codelive_core::Exercise;
    use uuid::Uuid;

    use super::*;
    use crate::catalog::MemoryCatalog;

    fn registry() -> SessionRegistry<MemoryCatalog> {
        let catalog = MemoryCatalog::new(vec![
            Exercise::new("e1", "Return one", "return 0;", "return 1;"),
            Exercise::new("e2", "Empty it", "x", ""),
        ])
        .unwrap();
        SessionRegistry::new(catalog)
    }

    #[tokio::test]
    async fn first_joiner_is_mentor_then_students() {
        let reg = registry();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(reg.join("e1", a).await.unwrap().role, Role::Mentor);
        assert_eq!(reg.join("e1", b).await.unwrap().role, Role::Student);
        assert_eq!(reg.join("e1", c).await.unwrap().role, Role::Student);

        let mentors = reg
            .inspect("e1", |s| {
                s.members()
                    .iter()
                    .filter(|&&id| s.role_of(id) == Some(Role::Mentor))
                    .count()
            })
            .await
            .unwrap();
        assert_eq!(mentors, 1);
        assert_eq!(reg.inspect("e1", |s| s.mentor()).await.unwrap(), Some(a));
    }

    #[tokio::test]
    async fn each_exercise_gets_its_own_mentor() {
        let reg = registry();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        assert_eq!(reg.join("e1", a).await.unwrap().role, Role::Mentor);
        assert_eq!(reg.join("e2", b).await.unwrap().role, Role::Mentor);
    }

    #[tokio::test]
    async fn join_returns_starter_code_snapshot() {
        let reg = registry();
        let joined = reg.join("e1", Uuid::new_v4()).await.unwrap();
        assert_eq!(joined.buffer, "return 0;");
    }

    #[tokio::test]
    async fn unknown_exercise_creates_no_session() {
        let reg = registry();
        let err = reg.join("does-not-exist", Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RegistryError::UnknownExercise(_)));
        assert_eq!(reg.session_count().await, 0);
    }

    #[tokio::test]
    async fn student_edit_broadcasts_to_everyone_else() {
        let reg = registry();
        let (mentor, s1, s2) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        reg.join("e1", mentor).await.unwrap();
        reg.join("e1", s1).await.unwrap();
        reg.join("e1", s2).await.unwrap();

        let applied = reg.apply_edit("e1", s1, "let x = 2;".into()).await.unwrap();
        let EditApplied::Broadcast(set) = applied else {
            panic!("expected broadcast");
        };
        assert_eq!(set.text, "let x = 2;");
        assert_eq!(set.recipients, vec![mentor, s2]);
        assert_eq!(set.members, vec![mentor, s1, s2]);
        assert_eq!(set.match_outcome, MatchOutcome::NoMatch);
    }

    #[tokio::test]
    async fn mentor_edit_is_rejected_without_state_change() {
        let reg = registry();
        let mentor = Uuid::new_v4();
        reg.join("e1", mentor).await.unwrap();
        reg.join("e1", Uuid::new_v4()).await.unwrap();

        let err = reg.apply_edit("e1", mentor, "x".into()).await.unwrap_err();
        assert!(matches!(err, RegistryError::MentorReadOnly));

        let buffer = reg.inspect("e1", |s| s.buffer().to_string()).await.unwrap();
        assert_eq!(buffer, "return 0;");
    }

    #[tokio::test]
    async fn repeated_identical_edit_still_broadcasts() {
        let reg = registry();
        reg.join("e1", Uuid::new_v4()).await.unwrap();
        let student = Uuid::new_v4();
        reg.join("e1", student).await.unwrap();

        for _ in 0..2 {
            let applied = reg
                .apply_edit("e1", student, "same text".into())
                .await
                .unwrap();
            assert!(matches!(applied, EditApplied::Broadcast(_)));
        }
        let buffer = reg.inspect("e1", |s| s.buffer().to_string()).await.unwrap();
        assert_eq!(buffer, "same text");
    }

    #[tokio::test]
    async fn match_is_edge_triggered_and_rearms() {
        let reg = registry();
        reg.join("e1", Uuid::new_v4()).await.unwrap();
        let student = Uuid::new_v4();
        reg.join("e1", student).await.unwrap();

        let outcome = |applied: EditApplied| match applied {
            EditApplied::Broadcast(set) => set.match_outcome,
            EditApplied::Stale => panic!("expected broadcast"),
        };

        let first = reg.apply_edit("e1", student, "return 1;".into()).await.unwrap();
        assert_eq!(outcome(first), MatchOutcome::Matched);

        let repeat = reg.apply_edit("e1", student, "return 1;".into()).await.unwrap();
        assert_eq!(outcome(repeat), MatchOutcome::AlreadyMatched);

        let away = reg.apply_edit("e1", student, "return 1; ".into()).await.unwrap();
        assert_eq!(outcome(away), MatchOutcome::NoMatch);

        let back = reg.apply_edit("e1", student, "return 1;".into()).await.unwrap();
        assert_eq!(outcome(back), MatchOutcome::Matched);
    }

    #[tokio::test]
    async fn empty_string_is_a_valid_buffer() {
        let reg = registry();
        let student2 = Uuid::new_v4();
        reg.join("e2", Uuid::new_v4()).await.unwrap();
        reg.join("e2", student2).await.unwrap();

        let applied = reg.apply_edit("e2", student2, String::new()).await.unwrap();
        let EditApplied::Broadcast(set) = applied else {
            panic!("expected broadcast");
        };
        assert_eq!(set.text, "");
        assert_eq!(set.match_outcome, MatchOutcome::Matched);
    }

    #[tokio::test]
    async fn stale_edit_is_a_noop() {
        let reg = registry();
        reg.join("e1", Uuid::new_v4()).await.unwrap();

        let stranger = Uuid::new_v4();
        let applied = reg.apply_edit("e1", stranger, "x".into()).await.unwrap();
        assert!(matches!(applied, EditApplied::Stale));

        let buffer = reg.inspect("e1", |s| s.buffer().to_string()).await.unwrap();
        assert_eq!(buffer, "return 0;");
    }

    #[tokio::test]
    async fn leave_is_idempotent() {
        let reg = registry();
        let a = Uuid::new_v4();
        reg.join("e1", a).await.unwrap();
        reg.join("e1", Uuid::new_v4()).await.unwrap();

        assert_eq!(
            reg.leave("e1", a).await,
            Left::Departed {
                was_mentor: true,
                destroyed: false
            }
        );
        assert_eq!(reg.leave("e1", a).await, Left::NotAMember);
        assert_eq!(reg.leave("nope", a).await, Left::NoSuchSession);
    }

    #[tokio::test]
    async fn empty_session_is_destroyed_and_rejoins_fresh() {
        let reg = registry();
        let a = Uuid::new_v4();
        reg.join("e1", a).await.unwrap();
        let applied = reg.apply_edit("e1", a, "edited".into()).await;
        // Sole participant is the mentor; edit rejected, buffer stays.
        assert!(applied.is_err());

        let b = Uuid::new_v4();
        reg.join("e1", b).await.unwrap();
        reg.apply_edit("e1", b, "edited".into()).await.unwrap();
        reg.leave("e1", b).await;
        assert_eq!(
            reg.leave("e1", a).await,
            Left::Departed {
                was_mentor: true,
                destroyed: true
            }
        );
        assert_eq!(reg.session_count().await, 0);

        // Fresh session: starter code again, mentor seat open.
        let c = Uuid::new_v4();
        let joined = reg.join("e1", c).await.unwrap();
        assert_eq!(joined.role, Role::Mentor);
        assert_eq!(joined.buffer, "return 0;");
    }

    #[tokio::test]
    async fn mentor_leave_does_not_promote_students() {
        let reg = registry();
        let (mentor, student) = (Uuid::new_v4(), Uuid::new_v4());
        reg.join("e1", mentor).await.unwrap();
        reg.join("e1", student).await.unwrap();

        reg.leave("e1", mentor).await;
        assert_eq!(reg.inspect("e1", |s| s.mentor()).await.unwrap(), None);
        assert_eq!(
            reg.inspect("e1", |s| s.role_of(student)).await.unwrap(),
            Some(Role::Student)
        );
    }

    #[tokio::test]
    async fn next_joiner_claims_vacant_mentor_seat() {
        let reg = registry();
        let (mentor, student) = (Uuid::new_v4(), Uuid::new_v4());
        reg.join("e1", mentor).await.unwrap();
        reg.join("e1", student).await.unwrap();
        reg.leave("e1", mentor).await;

        let late = Uuid::new_v4();
        assert_eq!(reg.join("e1", late).await.unwrap().role, Role::Mentor);
        assert_eq!(reg.inspect("e1", |s| s.mentor()).await.unwrap(), Some(late));
    }

    #[tokio::test]
    async fn concurrent_first_joins_yield_one_mentor() {
        let reg = Arc::new(registry());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let reg = Arc::clone(&reg);
            handles.push(tokio::spawn(async move {
                reg.join("e1", Uuid::new_v4()).await.unwrap().role
            }));
        }

        let mut mentors = 0;
        for handle in handles {
            if handle.await.unwrap() == Role::Mentor {
                mentors += 1;
            }
        }
        assert_eq!(mentors, 1);
        assert_eq!(reg.session_count().await, 1);
        assert_eq!(reg.inspect("e1", Session::len).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn rejoining_member_keeps_role() {
        let reg = registry();
        let a = Uuid::new_v4();
        assert_eq!(reg.join("e1", a).await.unwrap().role, Role::Mentor);
        assert_eq!(reg.join("e1", a).await.unwrap().role, Role::Mentor);
        assert_eq!(reg.inspect("e1", Session::len).await.unwrap(), 1);
    }
}
