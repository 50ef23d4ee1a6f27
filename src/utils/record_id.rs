use rand::{Rng, distr::Alphanumeric};
use serde::Serializer;
use surrealdb::RecordId;

use crate::consts::limits::RECORD_KEY_LEN;

/// Fresh record id with an alphanumeric key that always starts with a letter, so the
/// textual form `table:key` never needs escaping.
pub fn new_record_id(table: &str) -> RecordId {
    let mut rng = rand::rng();
    let head = char::from(rng.random_range(b'a'..=b'z'));
    let tail: String = (&mut rng)
        .sample_iter(&Alphanumeric)
        .take(RECORD_KEY_LEN - 1)
        .map(char::from)
        .collect();
    RecordId::from_table_key(table, format!("{head}{tail}"))
}

/// Resolves a public key (as it appears in URLs and JSON) to a record id of `table`.
/// A full `table:key` form is accepted as long as the table matches.
pub fn record_id(table: &str, key: &str) -> RecordId {
    let key = key.trim();
    let key = match key.split_once(':') {
        Some((prefix, rest)) if prefix == table => rest,
        _ => key,
    };
    RecordId::from_table_key(table, key)
}

/// Public key part of a record id.
pub fn record_key(id: &RecordId) -> String {
    let full = id.to_string();
    match full.split_once(':') {
        Some((_, key)) => key.to_string(),
        None => full,
    }
}

pub fn serialize_key<S: Serializer>(id: &RecordId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&record_key(id))
}

pub fn serialize_opt_key<S: Serializer>(
    id: &Option<RecordId>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match id {
        Some(id) => serializer.serialize_some(&record_key(id)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_id_round_trips_through_key() {
        let id = new_record_id("events");
        let key = record_key(&id);
        assert_eq!(key.len(), RECORD_KEY_LEN);
        assert!(key.chars().next().unwrap().is_ascii_lowercase());
        assert_eq!(record_id("events", &key), id);
    }

    #[test]
    fn test_record_id_accepts_prefixed_form() {
        assert_eq!(
            record_id("polls", "polls:abc123"),
            RecordId::from_table_key("polls", "abc123")
        );
    }
}
