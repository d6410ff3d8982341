//! Business case lifecycle and depth rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Business case status.
///
/// Valid transitions:
/// - Open → InProgress, Submitted, OnHold
/// - InProgress → Submitted, OnHold
/// - Submitted → Approved, InProgress
/// - Approved → Resolved
/// - OnHold → Open, InProgress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    /// Drafting.
    #[default]
    Open,
    /// Under elaboration by the assigned BA.
    InProgress,
    /// Submitted for approval.
    Submitted,
    /// Approved; eligible for conversion into a project.
    Approved,
    /// Delivered and closed.
    Resolved,
    /// Parked.
    OnHold,
}

impl CaseStatus {
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
                | (Self::InProgress, Self::Submitted | Self::OnHold)
                | (Self::Submitted, Self::Approved | Self::InProgress)
                | (Self::Approved, Self::Resolved)
                | (Self::OnHold, Self::Open | Self::InProgress)
        )
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether the case reacts to a problem or proposes an initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseType {
    /// Elaborates an existing problem.
    Reactive,
    /// Proposes a new initiative.
    Proactive,
    /// Both at once; only valid when the tenant opts in.
    Hybrid,
}

impl CaseType {
    /// Parses a case type from its stored name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Reactive" => Some(Self::Reactive),
            "Proactive" => Some(Self::Proactive),
            "Hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }

    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Reactive => "Reactive",
            Self::Proactive => "Proactive",
            Self::Hybrid => "Hybrid",
        }
    }
}

/// Elaboration depth of a business case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseDepth {
    /// Summary only.
    #[default]
    Light,
    /// Full ROI and detailed elaboration.
    Full,
}

impl CaseDepth {
    /// Parses a depth from its stored name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Light" => Some(Self::Light),
            "Full" => Some(Self::Full),
            _ => None,
        }
    }

    /// Returns the stored name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Full => "Full",
        }
    }
}

/// Violation of the cost/depth invariant.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("cost estimate {cost} exceeds the full-case threshold {threshold}; depth must be Full")]
pub struct DepthRuleViolation {
    /// The offending cost estimate.
    pub cost: Decimal,
    /// The organization's configured threshold.
    pub threshold: Decimal,
}

impl CaseDepth {
    /// Enforces the invariant: cost above the organization's threshold
    /// requires Full depth.
    ///
    /// # Errors
    ///
    /// Returns `DepthRuleViolation` when a Light case exceeds the threshold.
    pub fn validate_against(
        self,
        cost_estimate: Decimal,
        threshold: Decimal,
    ) -> Result<(), DepthRuleViolation> {
        if self == Self::Light && cost_estimate > threshold {
            return Err(DepthRuleViolation {
                cost: cost_estimate,
                threshold,
            });
        }
        Ok(())
    }
}

/// Computes return on investment as a percentage, `None` when cost is zero.
#[must_use]
pub fn roi_percent(cost_estimate: Decimal, benefit_estimate: Decimal) -> Option<Decimal> {
    if cost_estimate.is_zero() {
        return None;
    }
    Some((benefit_estimate - cost_estimate) / cost_estimate * Decimal::new(100, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_case_transitions() {
        assert!(CaseStatus::Submitted.can_transition(CaseStatus::Approved));
        assert!(CaseStatus::Approved.can_transition(CaseStatus::Resolved));
        assert!(!CaseStatus::Approved.can_transition(CaseStatus::Open));
        assert!(!CaseStatus::Resolved.can_transition(CaseStatus::InProgress));
    }

    #[test]
    fn test_depth_rule() {
        let threshold = dec!(25_000);
        assert!(CaseDepth::Light
            .validate_against(dec!(10_000), threshold)
            .is_ok());
        assert!(CaseDepth::Full
            .validate_against(dec!(100_000), threshold)
            .is_ok());

        let err = CaseDepth::Light
            .validate_against(dec!(100_000), threshold)
            .unwrap_err();
        assert_eq!(err.threshold, threshold);
    }

    #[test]
    fn test_depth_rule_boundary_is_exclusive() {
        // Exactly at the threshold still allows Light.
        assert!(CaseDepth::Light
            .validate_against(dec!(25_000), dec!(25_000))
            .is_ok());
    }

    #[test]
    fn test_roi() {
        assert_eq!(roi_percent(dec!(100_000), dec!(200_000)), Some(dec!(100)));
        assert_eq!(roi_percent(dec!(0), dec!(200_000)), None);
    }
}
