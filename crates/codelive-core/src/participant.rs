//! Session participants and their roles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Participant identifier (opaque, transport-assigned).
pub type ParticipantId = Uuid;

/// What a participant may do in a session.
///
/// The first participant to claim a session becomes its mentor; everyone
/// after that is a student. Mentors observe only; edit permission is
/// enforced against this variant, not by client-side UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only observer. At most one per session.
    Mentor,
    /// May submit buffer edits.
    Student,
}

impl Role {
    /// Whether this role may submit edits.
    #[must_use]
    pub const fn can_edit(self) -> bool {
        matches!(self, Self::Student)
    }
}

/// A connected member of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant {
    /// Transport-assigned identifier.
    pub id: ParticipantId,
    /// Assigned role, fixed for the participant's lifetime.
    pub role: Role,
}

impl Participant {
    #[must_use]
    pub const fn new(id: ParticipantId, role: Role) -> Self {
        Self { id, role }
    }
}
