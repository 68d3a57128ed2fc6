use serde::{Deserialize, Serialize};

/// Dexopt session lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Package snapshot captured
    Prepared { total_packages: usize },

    /// Session state dropped
    CleanedUp,

    /// Last package consumed
    Exhausted { total_packages: usize },

    /// Generation left the command queue present but empty; the session was reset
    InvariantViolated { package: String },
}
