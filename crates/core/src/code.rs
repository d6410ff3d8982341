//! Entity code generation.
//!
//! Problems, business cases, and projects carry human-readable codes derived
//! from their numeric ids on persistence (`P0042`, `BC0007`, `PRJ0013`).

/// Entity kinds that carry a generated code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodedEntity {
    /// Problem (`Pnnnn`).
    Problem,
    /// Business case (`BCnnnn`).
    BusinessCase,
    /// Project (`PRJnnnn`).
    Project,
}

impl CodedEntity {
    /// Returns the code prefix for this entity kind.
    #[must_use]
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Problem => "P",
            Self::BusinessCase => "BC",
            Self::Project => "PRJ",
        }
    }

    /// Builds the code for a persisted entity from its numeric id.
    #[must_use]
    pub fn code(&self, id: i32) -> String {
        format!("{}{:04}", self.prefix(), id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CodedEntity::Problem, 7, "P0007")]
    #[case(CodedEntity::BusinessCase, 42, "BC0042")]
    #[case(CodedEntity::Project, 13, "PRJ0013")]
    #[case(CodedEntity::Project, 12345, "PRJ12345")]
    fn test_code_format(#[case] entity: CodedEntity, #[case] id: i32, #[case] expected: &str) {
        assert_eq!(entity.code(id), expected);
    }
}
