//! Shared value types.

mod prefs;

pub use prefs::{DateFormat, Theme};
