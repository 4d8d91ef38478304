//! Status enums shared by the dashboard components.

use serde::{Deserialize, Serialize};

/// Lifecycle of the most recently settled cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CartStatus {
    /// Nothing has been requested since the store was created or reset.
    #[default]
    Idle,
    /// An operation has been issued and has not settled yet.
    Loading,
    /// The last operation to settle succeeded.
    Succeeded,
    /// The last operation to settle failed.
    Failed,
}

impl CartStatus {
    /// The lowercase label used in logs and UI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CartStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
