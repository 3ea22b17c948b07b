//! Session coordination for codelive.
//!
//! Provides:
//! - `SessionRegistry` - Owns the live session map; join/leave/edit
//! - `Session` - Per-exercise shared buffer and participant set
//! - Catalog implementations (memory, JSON file)

pub mod catalog;
pub mod registry;
pub mod roles;
pub mod session;

pub use registry::{BroadcastSet, EditApplied, Joined, Left, RegistryError, SessionRegistry};
pub use session::Session;
