//! Catalog trait for read-only exercise stores.

use async_trait::async_trait;
use thiserror::Error;

use crate::exercise::{Exercise, ExerciseId};

/// Catalog error.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Exercise not found: {0}")]
    NotFound(ExerciseId),
    #[error("Duplicate exercise id: {0}")]
    DuplicateId(ExerciseId),
    #[error("Catalog error: {0}")]
    Internal(String),
}

/// Trait for exercise catalog backends.
///
/// Catalogs are read-only at runtime: the session layer consumes them
/// (one `get` per session creation) but never mutates them.
#[async_trait]
pub trait ExerciseCatalog: Send + Sync {
    /// Get an exercise by id.
    async fn get(&self, id: &str) -> Result<Exercise, CatalogError>;

    /// List all exercises, in stable catalog order.
    async fn list(&self) -> Result<Vec<Exercise>, CatalogError>;
}

#[async_trait]
impl<C> ExerciseCatalog for std::sync::Arc<C>
where
    C: ExerciseCatalog + ?Sized,
{
    async fn get(&self, id: &str) -> Result<Exercise, CatalogError> {
        (**self).get(id).await
    }

    async fn list(&self) -> Result<Vec<Exercise>, CatalogError> {
        (**self).list().await
    }
}
