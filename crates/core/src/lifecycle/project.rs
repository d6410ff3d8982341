//! Project lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Project status.
///
/// Valid transitions:
/// - Open → InProgress, OnHold
/// - InProgress → Resolved, OnHold
/// - OnHold → Open, InProgress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    /// Approved but not started.
    #[default]
    Open,
    /// In delivery.
    InProgress,
    /// Delivered and closed.
    Resolved,
    /// Parked.
    OnHold,
}

impl ProjectStatus {
    /// Parses a status from its stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Open" => Some(Self::Open),
            "InProgress" => Some(Self::InProgress),
            "Resolved" => Some(Self::Resolved),
            "OnHold" => Some(Self::OnHold),
            _ => None,
        }
    }

    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "InProgress",
            Self::Resolved => "Resolved",
            Self::OnHold => "OnHold",
        }
    }

    /// Returns true when `self → to` is a valid transition.
    #[must_use]
    pub const fn can_transition(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Open, Self::InProgress | Self::OnHold)
                | (Self::InProgress, Self::Resolved | Self::OnHold)
                | (Self::OnHold, Self::Open | Self::InProgress)
        )
    }

    /// Returns true when the project has been delivered.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_transitions() {
        assert!(ProjectStatus::Open.can_transition(ProjectStatus::InProgress));
        assert!(ProjectStatus::InProgress.can_transition(ProjectStatus::Resolved));
        assert!(!ProjectStatus::Resolved.can_transition(ProjectStatus::Open));
    }
}
