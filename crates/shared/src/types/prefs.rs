//! Organization and user preference types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date display format for an organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    /// MM/DD/YYYY
    #[serde(rename = "US", alias = "us")]
    Us,
    /// DD/MM/YYYY
    #[serde(rename = "EU", alias = "eu")]
    Eu,
    /// YYYY-MM-DD
    #[default]
    #[serde(rename = "ISO", alias = "iso")]
    Iso,
    /// Month DD, YYYY
    #[serde(rename = "Long", alias = "long")]
    Long,
}

impl DateFormat {
    /// Parses a format tag from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "US" => Some(Self::Us),
            "EU" => Some(Self::Eu),
            "ISO" => Some(Self::Iso),
            "LONG" => Some(Self::Long),
            _ => None,
        }
    }

    /// Formats a date according to this preference.
    #[must_use]
    pub fn format(&self, date: NaiveDate) -> String {
        match self {
            Self::Us => date.format("%m/%d/%Y").to_string(),
            Self::Eu => date.format("%d/%m/%Y").to_string(),
            Self::Iso => date.format("%Y-%m-%d").to_string(),
            Self::Long => date.format("%B %-d, %Y").to_string(),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Self::Us => "US",
            Self::Eu => "EU",
            Self::Iso => "ISO",
            Self::Long => "Long",
        };
        write!(f, "{tag}")
    }
}

/// UI theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme.
    #[default]
    Light,
    /// Dark theme.
    Dark,
}

impl Theme {
    /// Parses the stored form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    /// The stored form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(DateFormat::Us, "03/09/2026")]
    #[case(DateFormat::Eu, "09/03/2026")]
    #[case(DateFormat::Iso, "2026-03-09")]
    #[case(DateFormat::Long, "March 9, 2026")]
    fn test_date_format(#[case] format: DateFormat, #[case] expected: &str) {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        assert_eq!(format.format(date), expected);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(DateFormat::parse("iso"), Some(DateFormat::Iso));
        assert_eq!(DateFormat::parse("LONG"), Some(DateFormat::Long));
        assert_eq!(DateFormat::parse("other"), None);
    }
}
