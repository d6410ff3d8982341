//! Domain event names.
//!
//! Every fact a domain mutation can raise. Workflow template triggers and
//! notification settings are keyed by these names.

/// A problem was reported.
pub const PROBLEM_CREATED: &str = "problem_created";
/// A problem received an impact assessment.
pub const PROBLEM_ANALYZED: &str = "problem_analyzed";
/// A business case was submitted for approval.
pub const CASE_SUBMITTED: &str = "case_submitted";
/// A business case was approved.
pub const CASE_APPROVED: &str = "case_approved";
/// A business case review is due.
pub const CASE_REVIEW_DUE: &str = "case_review_due";
/// A project was created.
pub const PROJECT_CREATED: &str = "project_created";
/// A project changed status.
pub const PROJECT_STATUS_CHANGE: &str = "project_status_change";
/// A project was completed.
pub const PROJECT_COMPLETED: &str = "project_completed";
/// A milestone is due within the sweep window.
pub const MILESTONE_DUE_SOON: &str = "milestone_due_soon";
/// A milestone is past its due date.
pub const MILESTONE_OVERDUE: &str = "milestone_overdue";
/// A milestone was completed.
pub const MILESTONE_COMPLETED: &str = "milestone_completed";

/// Daily review tick.
pub const DAILY_REVIEW: &str = "daily_review";
/// Weekly review tick.
pub const WEEKLY_REVIEW: &str = "weekly_review";
/// Monthly review tick.
pub const MONTHLY_REVIEW: &str = "monthly_review";
/// Quarterly review tick.
pub const QUARTERLY_REVIEW: &str = "quarterly_review";

/// HR onboarding fact.
pub const HR_ONBOARDING: &str = "hr_onboarding";
/// HR offboarding fact.
pub const HR_OFFBOARDING: &str = "hr_offboarding";
/// IT incident fact.
pub const IT_INCIDENT: &str = "it_incident";
/// IT change-request fact.
pub const IT_CHANGE_REQUEST: &str = "it_change_request";
/// Finance budget-exceeded fact.
pub const FINANCE_BUDGET_EXCEEDED: &str = "finance_budget_exceeded";
/// Finance invoice-overdue fact.
pub const FINANCE_INVOICE_OVERDUE: &str = "finance_invoice_overdue";

/// All recognized event names.
pub const ALL: &[&str] = &[
    PROBLEM_CREATED,
    PROBLEM_ANALYZED,
    CASE_SUBMITTED,
    CASE_APPROVED,
    CASE_REVIEW_DUE,
    PROJECT_CREATED,
    PROJECT_STATUS_CHANGE,
    PROJECT_COMPLETED,
    MILESTONE_DUE_SOON,
    MILESTONE_OVERDUE,
    MILESTONE_COMPLETED,
    DAILY_REVIEW,
    WEEKLY_REVIEW,
    MONTHLY_REVIEW,
    QUARTERLY_REVIEW,
    HR_ONBOARDING,
    HR_OFFBOARDING,
    IT_INCIDENT,
    IT_CHANGE_REQUEST,
    FINANCE_BUDGET_EXCEEDED,
    FINANCE_INVOICE_OVERDUE,
];

/// Returns true when `name` is a recognized domain event.
#[must_use]
pub fn is_known(name: &str) -> bool {
    ALL.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_events() {
        assert!(is_known(PROBLEM_CREATED));
        assert!(is_known(QUARTERLY_REVIEW));
        assert!(!is_known("problem_deleted"));
    }

    #[test]
    fn test_no_duplicate_names() {
        let mut names: Vec<_> = ALL.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
    }
}
