//! Department hierarchy rules.
//!
//! Departments form a tree at most five levels deep. A department's `level`
//! equals its parent's level plus one (1 for roots), and the parent graph
//! must stay acyclic.

use thiserror::Error;

/// Maximum depth of the department hierarchy.
pub const MAX_DEPTH: i32 = 5;

/// Department hierarchy violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// Attaching here would exceed the five-level limit.
    #[error("department hierarchy cannot exceed {MAX_DEPTH} levels (parent is at level {0})")]
    TooDeep(i32),

    /// The proposed parent chain contains the department itself.
    #[error("department {0} cannot be its own ancestor")]
    Cycle(i32),
}

/// Computes the level for a department given its parent's level.
///
/// # Errors
///
/// Returns `HierarchyError::TooDeep` when the parent already sits at the
/// maximum depth.
pub fn child_level(parent_level: Option<i32>) -> Result<i32, HierarchyError> {
    match parent_level {
        None => Ok(1),
        Some(level) if level >= MAX_DEPTH => Err(HierarchyError::TooDeep(level)),
        Some(level) => Ok(level + 1),
    }
}

/// Validates that re-parenting `department_id` under a parent whose ancestor
/// chain is `parent_chain` (nearest first) introduces no cycle.
///
/// # Errors
///
/// Returns `HierarchyError::Cycle` when the department appears in the chain.
pub fn check_acyclic(department_id: i32, parent_chain: &[i32]) -> Result<(), HierarchyError> {
    if parent_chain.contains(&department_id) {
        return Err(HierarchyError::Cycle(department_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_level_is_one() {
        assert_eq!(child_level(None), Ok(1));
    }

    #[test]
    fn test_child_level_increments() {
        assert_eq!(child_level(Some(1)), Ok(2));
        assert_eq!(child_level(Some(4)), Ok(5));
    }

    #[test]
    fn test_depth_limit() {
        assert_eq!(child_level(Some(5)), Err(HierarchyError::TooDeep(5)));
    }

    #[test]
    fn test_cycle_detection() {
        assert_eq!(check_acyclic(3, &[7, 2, 1]), Ok(()));
        assert_eq!(check_acyclic(3, &[7, 3, 1]), Err(HierarchyError::Cycle(3)));
    }
}
