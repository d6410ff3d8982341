//! Report run lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one report execution.
///
/// Transitions only along `Running → Completed` or `Running → Failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Execution in progress.
    #[default]
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl RunStatus {
    /// Parses a status from its stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns true when `self → to` is a valid transition.
    #[must_use]
    pub const fn can_transition(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Running, Self::Completed | Self::Failed)
        )
    }

    /// Returns true when the run has finished, either way.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_only_moves_forward() {
        assert!(RunStatus::Running.can_transition(RunStatus::Completed));
        assert!(RunStatus::Running.can_transition(RunStatus::Failed));
        assert!(!RunStatus::Completed.can_transition(RunStatus::Running));
        assert!(!RunStatus::Failed.can_transition(RunStatus::Completed));
        assert!(!RunStatus::Completed.can_transition(RunStatus::Failed));
    }
}
