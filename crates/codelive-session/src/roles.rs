//! Role assignment policy.

use codelive_core::Role;

use crate::session::Session;

/// First-claim per session: if the session has no mentor, the joiner
/// takes the seat; otherwise they join as a student.
///
/// The claim is scoped to one session, never process-wide: each
/// exercise independently gets its own mentor. Deterministic given
/// session state; no negotiation.
#[must_use]
pub fn assign(session: &Session) -> Role {
    if session.mentor().is_some() {
        Role::Student
    } else {
        Role::Mentor
    }
}
