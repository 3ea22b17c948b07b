//! Live session state for one exercise.

use codelive_core::{Exercise, ExerciseId, Participant, ParticipantId, Role};

use crate::roles;

/// Live collaboration state for one exercise id.
///
/// Holds the shared buffer and the participant set, in join order. All
/// mutation goes through the `SessionRegistry`, which serializes access
/// per session; nothing here is synchronized on its own.
#[derive(Debug)]
pub struct Session {
    exercise_id: ExerciseId,
    /// Solution text, copied from the exercise at creation so edits
    /// never re-hit the catalog.
    solution: String,
    buffer: String,
    participants: Vec<Participant>,
    solved: bool,
}

impl Session {
    /// Create a fresh session seeded with the exercise's starter code.
    #[must_use]
    pub fn new(exercise: &Exercise) -> Self {
        Self {
            exercise_id: exercise.id.clone(),
            solution: exercise.solution.clone(),
            buffer: exercise.starter_code.clone(),
            participants: Vec::new(),
            solved: false,
        }
    }

    /// Add a participant, assigning its role by first-claim. Adding an
    /// id that is already a member returns the existing role unchanged.
    pub fn add(&mut self, id: ParticipantId) -> Role {
        if let Some(existing) = self.participants.iter().find(|p| p.id == id) {
            return existing.role;
        }
        let role = roles::assign(self);
        self.participants.push(Participant::new(id, role));
        role
    }

    /// Remove a participant, returning its role, or `None` if the id
    /// was not a member.
    pub fn remove(&mut self, id: ParticipantId) -> Option<Role> {
        let idx = self.participants.iter().position(|p| p.id == id)?;
        Some(self.participants.remove(idx).role)
    }

    /// Look up a member's role.
    #[must_use]
    pub fn role_of(&self, id: ParticipantId) -> Option<Role> {
        self.participants.iter().find(|p| p.id == id).map(|p| p.role)
    }

    /// The current mentor, if the seat is claimed.
    #[must_use]
    pub fn mentor(&self) -> Option<ParticipantId> {
        self.participants
            .iter()
            .find(|p| p.role == Role::Mentor)
            .map(|p| p.id)
    }

    /// Replace the buffer text (last-write-wins) and re-evaluate the
    /// solution match as one unit. Returns the match outcome.
    pub fn replace_buffer(&mut self, new_text: String) -> codelive_core::MatchOutcome {
        self.buffer = new_text;
        codelive_core::evaluate(&self.buffer, &self.solution, &mut self.solved)
    }

    /// All member ids except `id`, in join order.
    #[must_use]
    pub fn others(&self, id: ParticipantId) -> Vec<ParticipantId> {
        self.participants
            .iter()
            .filter(|p| p.id != id)
            .map(|p| p.id)
            .collect()
    }

    /// All member ids, in join order.
    #[must_use]
    pub fn members(&self) -> Vec<ParticipantId> {
        self.participants.iter().map(|p| p.id).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    #[must_use]
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    #[must_use]
    pub fn exercise_id(&self) -> &str {
        &self.exercise_id
    }
}
