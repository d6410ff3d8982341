//! Project milestone completion rules.

use chrono::NaiveDate;
use thiserror::Error;

/// Milestone completion violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MilestoneError {
    /// Completed milestones must carry a completion date.
    #[error("completed milestone requires a completion date")]
    MissingCompletionDate,
}

/// Validates the completion invariant: `completed = true` requires a
/// completion date.
///
/// # Errors
///
/// Returns `MilestoneError::MissingCompletionDate` when violated.
pub fn validate_completion(
    completed: bool,
    completion_date: Option<NaiveDate>,
) -> Result<(), MilestoneError> {
    if completed && completion_date.is_none() {
        return Err(MilestoneError::MissingCompletionDate);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_requires_date() {
        assert_eq!(
            validate_completion(true, None),
            Err(MilestoneError::MissingCompletionDate)
        );
        let date = NaiveDate::from_ymd_opt(2026, 5, 1);
        assert_eq!(validate_completion(true, date), Ok(()));
        assert_eq!(validate_completion(false, None), Ok(()));
    }
}
