//! Wire protocol for client-server communication.

use codelive_core::Role;
use serde::{Deserialize, Serialize};

/// Message from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Attach to an exercise's session. Joining while attached
    /// elsewhere implicitly leaves the previous session first.
    Join { exercise_id: String },
    /// Full replacement of the shared buffer.
    Edit { text: String },
    /// Detach from the current session.
    Leave,
    /// Ping for keepalive.
    Ping,
}

/// Message from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join accepted: assigned role and buffer snapshot.
    Joined { role: Role, buffer: String },
    /// Another participant changed the shared buffer.
    BufferUpdated { text: String },
    /// The buffer just became equal to the solution.
    SolutionMatched,
    /// Request-scoped failure (unknown exercise, mentor edit, bad
    /// message). The connection stays open.
    Error { message: String },
    /// Pong response.
    Pong,
}
