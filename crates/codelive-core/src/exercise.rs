//! Exercise definitions served by the catalog.

use serde::{Deserialize, Serialize};

/// Exercise identifier (catalog-assigned, unique key).
pub type ExerciseId = String;

/// An immutable code exercise.
///
/// Loaded once at startup from the catalog and never mutated by the
/// session layer. The starter code seeds a fresh session's buffer; the
/// solution is what buffers are matched against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique exercise identifier.
    pub id: ExerciseId,
    /// Human-readable title shown in the lobby.
    pub title: String,
    /// Initial buffer contents for a new session.
    pub starter_code: String,
    /// Target solution, compared by exact string equality.
    pub solution: String,
}

impl Exercise {
    /// Create a new exercise definition.
    #[must_use]
    pub fn new(
        id: impl Into<ExerciseId>,
        title: impl Into<String>,
        starter_code: impl Into<String>,
        solution: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            starter_code: starter_code.into(),
            solution: solution.into(),
        }
    }

    /// Summary view for listings. Omits the solution so the lobby
    /// endpoint never ships answers to clients.
    #[must_use]
    pub fn summary(&self) -> ExerciseSummary {
        ExerciseSummary {
            id: self.id.clone(),
            title: self.title.clone(),
        }
    }
}

/// Listing view of an exercise: id and title only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSummary {
    pub id: ExerciseId,
    pub title: String,
}
