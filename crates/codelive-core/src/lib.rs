//! Core abstractions for live code-mentoring sessions.
//!
//! This crate provides the fundamental building blocks:
//! - `Exercise` - Immutable exercise definition (starter code + solution)
//! - `Participant` / `Role` - Who is in a session and what they may do
//! - `evaluate` - Solution-match evaluation with edge-triggered notification
//! - `ExerciseCatalog` trait - Read-only exercise store

pub mod exercise;
pub mod matcher;
pub mod participant;
pub mod traits;

pub use exercise::{Exercise, ExerciseId, ExerciseSummary};
pub use matcher::{MatchOutcome, evaluate};
pub use participant::{Participant, ParticipantId, Role};
pub use traits::{CatalogError, ExerciseCatalog};
