//! Epic review workflow.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Epic workflow status.
///
/// Valid transitions:
/// - Draft → Submitted
/// - Submitted → Approved, Rejected, ChangesRequested
/// - ChangesRequested → Submitted
/// - Rejected → Draft
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpicStatus {
    /// Being drafted by the BA.
    #[default]
    Draft,
    /// Submitted for review.
    Submitted,
    /// Review passed.
    Approved,
    /// Review failed.
    Rejected,
    /// Reviewer requested changes.
    ChangesRequested,
}

impl EpicStatus {
    /// Parses a status from its stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Draft" => Some(Self::Draft),
            "Submitted" => Some(Self::Submitted),
            "Approved" => Some(Self::Approved),
            "Rejected" => Some(Self::Rejected),
            "ChangesRequested" => Some(Self::ChangesRequested),
            _ => None,
        }
    }

    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::ChangesRequested => "ChangesRequested",
        }
    }

    /// Returns true when `self → to` is a valid transition.
    #[must_use]
    pub const fn can_transition(&self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Submitted)
                | (
                    Self::Submitted,
                    Self::Approved | Self::Rejected | Self::ChangesRequested
                )
                | (Self::ChangesRequested, Self::Submitted)
                | (Self::Rejected, Self::Draft)
        )
    }

    /// Returns true when the epic may still be edited.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::ChangesRequested | Self::Rejected)
    }
}

impl fmt::Display for EpicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epic_transitions() {
        assert!(EpicStatus::Draft.can_transition(EpicStatus::Submitted));
        assert!(EpicStatus::Submitted.can_transition(EpicStatus::ChangesRequested));
        assert!(EpicStatus::ChangesRequested.can_transition(EpicStatus::Submitted));
        assert!(!EpicStatus::Approved.can_transition(EpicStatus::Draft));
    }

    #[test]
    fn test_editability() {
        assert!(EpicStatus::Draft.is_editable());
        assert!(!EpicStatus::Submitted.is_editable());
        assert!(!EpicStatus::Approved.is_editable());
    }
}
