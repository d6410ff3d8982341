//! Problem lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Problem status.
///
/// Valid transitions:
/// - Open → InProgress, Submitted, OnHold
/// - InProgress → Submitted, Resolved, OnHold
/// - Submitted → Approved, InProgress
/// - Approved → Resolved
/// - OnHold → Open, InProgress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemStatus {
    /// Newly reported.
    #[default]
    Open,
    /// Under analysis.
    InProgress,
    /// Submitted for elaboration into a business case.
    Submitted,
    /// Elaboration approved.
    Approved,
    /// Addressed and closed.
    Resolved,
    /// Parked.
    OnHold,
}

impl ProblemStatus {
    /// Parses a status from its stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Open" => Some(Self::Open),
            "InProgress" => Some(Self::InProgress),
            "Submitted" => Some(Self::Submitted),
            "Approved" => Some(Self::Approved),
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
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
            Self::Resolved => "Resolved",
            Self::OnHold => "OnHold",
        }
    }

    /// Returns true when `self → to` is a valid transition.
    #[must_use]
    pub const fn can_transition(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Open, Self::InProgress | Self::Submitted | Self::OnHold)
                | (Self::InProgress, Self::Submitted | Self::Resolved | Self::OnHold)
                | (Self::Submitted, Self::Approved | Self::InProgress)
                | (Self::Approved, Self::Resolved)
                | (Self::OnHold, Self::Open | Self::InProgress)
        )
    }

    /// Returns true when the problem is closed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved)
    }
}

impl fmt::Display for ProblemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        assert!(ProblemStatus::Open.can_transition(ProblemStatus::InProgress));
        assert!(ProblemStatus::Submitted.can_transition(ProblemStatus::Approved));
        assert!(ProblemStatus::OnHold.can_transition(ProblemStatus::Open));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!ProblemStatus::Resolved.can_transition(ProblemStatus::Open));
        assert!(!ProblemStatus::Open.can_transition(ProblemStatus::Approved));
        assert!(!ProblemStatus::Approved.can_transition(ProblemStatus::OnHold));
    }

    #[test]
    fn test_resolved_is_terminal() {
        assert!(ProblemStatus::Resolved.is_terminal());
        assert!(!ProblemStatus::Open.is_terminal());
    }
}
