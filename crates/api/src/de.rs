//! Request deserialization helpers.

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field from an explicit `null`.
///
/// Use with `#[serde(default, deserialize_with = "de::double_option")]` on
/// an `Option<Option<T>>` field: absent stays `None`, `null` becomes
/// `Some(None)` (clear the column), and a value becomes `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "double_option")]
        value: Option<Option<i32>>,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let absent: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.value, None);

        let cleared: Probe = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(cleared.value, Some(None));

        let set: Probe = serde_json::from_str(r#"{"value": 7}"#).unwrap();
        assert_eq!(set.value, Some(Some(7)));
    }
}
