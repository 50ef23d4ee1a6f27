use serde::{Deserialize, Deserializer};

/// Marks a key that was present in a partial update, so `Option<Option<T>>` tells an absent
/// key (`None`) apart from an explicit `null` (`Some(None)`). Pair with `#[serde(default)]`.
pub fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Deserialize, Debug, Default)]
    struct Patch {
        #[serde(default, deserialize_with = "present")]
        ends_at: Option<Option<String>>,
    }

    #[test]
    fn test_absent_null_and_value_are_distinct() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.ends_at, None);
        let cleared: Patch = serde_json::from_str(r#"{"ends_at": null}"#).unwrap();
        assert_eq!(cleared.ends_at, Some(None));
        let set: Patch = serde_json::from_str(r#"{"ends_at": "2030-01-01T00:00:00Z"}"#).unwrap();
        assert_eq!(set.ends_at, Some(Some("2030-01-01T00:00:00Z".to_string())));
    }
}
