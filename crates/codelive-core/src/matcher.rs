//! Solution-match evaluation.
//!
//! "Matched" is a level-triggered property of the current buffer text;
//! the notification is edge-triggered on entry. The caller keeps one
//! solved flag per session and threads it through `evaluate`.

use serde::{Deserialize, Serialize};

/// Result of comparing a buffer against an exercise solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// The buffer just became equal to the solution. Notify once.
    Matched,
    /// Still equal to the solution; already notified for this episode.
    AlreadyMatched,
    /// Not equal to the solution.
    NoMatch,
}

impl MatchOutcome {
    /// Whether this outcome is a match-entry transition.
    #[must_use]
    pub const fn is_entry(self) -> bool {
        matches!(self, Self::Matched)
    }
}

/// Compare `buffer` to `solution` by exact string equality (whitespace-
/// and case-sensitive, no normalization) and update the solved flag.
///
/// Returns `Matched` only on the transition into equality. Editing away
/// from the solution clears the flag so a later re-match notifies again.
pub fn evaluate(buffer: &str, solution: &str, solved: &mut bool) -> MatchOutcome {
    if buffer == solution {
        if *solved {
            MatchOutcome::AlreadyMatched
        } else {
            *solved = true;
            MatchOutcome::Matched
        }
    } else {
        *solved = false;
        MatchOutcome::NoMatch
    }
}
