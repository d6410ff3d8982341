//! Entity lifecycles and status machines.
//!
//! Problems, business cases, and projects each carry their own status type.
//! The value sets overlap but the reachable transitions differ per entity,
//! so they are deliberately not a shared enum.

mod case;
mod epic;
mod milestone;
mod problem;
mod project;
mod report_run;

pub use case::{roi_percent, CaseDepth, CaseStatus, CaseType, DepthRuleViolation};
pub use epic::EpicStatus;
pub use milestone::{validate_completion, MilestoneError};
pub use problem::ProblemStatus;
pub use project::ProjectStatus;
pub use report_run::RunStatus;

use serde::{Deserialize, Serialize};

/// Priority shared by problems, stories, and projects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl Priority {
    /// Parses a priority from its stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }

    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(Priority::parse("High"), Some(Priority::High));
        assert_eq!(Priority::parse("urgent"), None);
    }
}
