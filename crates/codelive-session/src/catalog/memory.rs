//! In-memory exercise catalog.

use async_trait::async_trait;
use codelive_core::{CatalogError, Exercise, ExerciseCatalog};

/// In-memory catalog.
///
/// Useful for tests and single-process deployments with a fixed
/// exercise set. Listing preserves insertion order.
pub struct MemoryCatalog {
    exercises: Vec<Exercise>,
}

impl MemoryCatalog {
    /// Build a catalog from a set of exercises.
    ///
    /// # Errors
    /// `DuplicateId` if two exercises share an id.
    pub fn new(exercises: Vec<Exercise>) -> Result<Self, CatalogError> {
        for (i, exercise) in exercises.iter().enumerate() {
            if exercises[..i].iter().any(|e| e.id == exercise.id) {
                return Err(CatalogError::DuplicateId(exercise.id.clone()));
            }
        }
        Ok(Self { exercises })
    }
}

#[async_trait]
impl ExerciseCatalog for MemoryCatalog {
    async fn get(&self, id: &str) -> Result<Exercise, CatalogError> {
        self.exercises
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Exercise>, CatalogError> {
        Ok(self.exercises.clone())
    }
}
