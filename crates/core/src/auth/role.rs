//! User roles within an organization.

use serde::{Deserialize, Serialize};

/// User roles within an organization.
///
/// The first user registered for an organization is promoted to `Admin`
/// with unrestricted scope; later registrants default to `Staff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Regular employee; can report problems.
    Staff,
    /// Department manager; receives departmental notifications.
    Manager,
    /// Business analyst; owns epics and stories.
    #[serde(rename = "BA")]
    Ba,
    /// Director; can administer reports.
    Director,
    /// Chief executive; can administer reports.
    #[serde(rename = "CEO")]
    Ceo,
    /// Project manager.
    #[serde(rename = "PM")]
    Pm,
    /// Organization administrator; unrestricted scope.
    Admin,
}

impl Role {
    /// Parses a role from its stored name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Staff" => Some(Self::Staff),
            "Manager" => Some(Self::Manager),
            "BA" => Some(Self::Ba),
            "Director" => Some(Self::Director),
            "CEO" => Some(Self::Ceo),
            "PM" => Some(Self::Pm),
            "Admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Returns the stored name of the role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Staff => "Staff",
            Self::Manager => "Manager",
            Self::Ba => "BA",
            Self::Director => "Director",
            Self::Ceo => "CEO",
            Self::Pm => "PM",
            Self::Admin => "Admin",
        }
    }

    /// Returns true if this role may edit epics and stories.
    #[must_use]
    pub const fn can_edit_epics(&self) -> bool {
        matches!(self, Self::Ba | Self::Admin)
    }

    /// Returns true if this role may manage workflow and report templates.
    #[must_use]
    pub const fn can_manage_templates(&self) -> bool {
        matches!(self, Self::Admin | Self::Director | Self::Ceo)
    }

    /// Returns true if this role may approve business cases.
    #[must_use]
    pub const fn can_approve_cases(&self) -> bool {
        matches!(self, Self::Manager | Self::Director | Self::Ceo | Self::Admin)
    }

    /// Returns true if this role may administer users and settings.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(Role::Ba.can_edit_epics());
        assert!(Role::Admin.can_edit_epics());
        assert!(!Role::Staff.can_edit_epics());
        assert!(!Role::Pm.can_edit_epics());

        assert!(Role::Admin.can_manage_templates());
        assert!(Role::Director.can_manage_templates());
        assert!(Role::Ceo.can_manage_templates());
        assert!(!Role::Manager.can_manage_templates());

        assert!(Role::Manager.can_approve_cases());
        assert!(!Role::Staff.can_approve_cases());
    }

    #[test]
    fn test_parse_round_trip() {
        for role in [
            Role::Staff,
            Role::Manager,
            Role::Ba,
            Role::Director,
            Role::Ceo,
            Role::Pm,
            Role::Admin,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("Intern"), None);
    }
}
