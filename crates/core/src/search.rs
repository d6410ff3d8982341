//! Search query preparation.
//!
//! The index itself lives in Postgres (tsvector columns maintained by
//! triggers); this module owns the pure parts: scope parsing, query
//! sanitization, and the per-type cap split used in `all` mode.

use serde::{Deserialize, Serialize};

/// Hard ceiling on results per request.
pub const MAX_RESULTS: u64 = 100;

/// Which entity types a search covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Problems only.
    Problems,
    /// Business cases only.
    Cases,
    /// Projects only.
    Projects,
    /// All three, merged by rank.
    #[default]
    All,
}

impl SearchScope {
    /// Parses the request form; anything unrecognized searches everything.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "problems" => Self::Problems,
            "cases" => Self::Cases,
            "projects" => Self::Projects,
            _ => Self::All,
        }
    }

    /// Per-type cap: `all` splits the cap three ways.
    #[must_use]
    pub const fn per_type_limit(&self, cap: u64) -> u64 {
        match self {
            Self::All => cap / 3,
            _ => cap,
        }
    }
}

/// Clamps a requested result cap to `0..=MAX_RESULTS`.
///
/// A cap of zero is honored as-is: the caller gets an empty list, not one
/// result.
#[must_use]
pub fn clamp_limit(requested: Option<u64>) -> u64 {
    requested.unwrap_or(20).min(MAX_RESULTS)
}

/// Prepares raw user input for `to_tsquery`.
///
/// Strips punctuation, collapses whitespace, and joins the surviving terms
/// with OR so partial matches still rank. Returns `None` when nothing
/// searchable remains; callers short-circuit to an empty result set.
#[must_use]
pub fn prepare_query(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let terms: Vec<&str> = cleaned.split_whitespace().collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("checkout latency", Some("checkout | latency"))]
    #[case("  spaced   out  ", Some("spaced | out"))]
    #[case("budget: $50,000!", Some("budget | 50 | 000"))]
    #[case("single", Some("single"))]
    #[case("", None)]
    #[case("?!...", None)]
    fn test_prepare_query(#[case] raw: &str, #[case] expected: Option<&str>) {
        assert_eq!(prepare_query(raw).as_deref(), expected);
    }

    #[test]
    fn test_scope_parse_defaults_to_all() {
        assert_eq!(SearchScope::parse("cases"), SearchScope::Cases);
        assert_eq!(SearchScope::parse("everything"), SearchScope::All);
    }

    #[test]
    fn test_per_type_limit_splits_all_mode() {
        assert_eq!(SearchScope::All.per_type_limit(20), 6);
        assert_eq!(SearchScope::Problems.per_type_limit(20), 20);
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 20);
        assert_eq!(clamp_limit(Some(7)), 7);
        assert_eq!(clamp_limit(Some(500)), MAX_RESULTS);
    }

    #[test]
    fn test_cap_of_zero_stays_zero() {
        assert_eq!(clamp_limit(Some(0)), 0);
    }
}
