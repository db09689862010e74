//! Identifier and payload shape checks. None of these ever fail; they answer yes/no.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
        .expect("uuid pattern compiles")
});

/// True iff `s` is in canonical 8-4-4-4-12 hex form. Version and variant bits are not checked.
pub fn is_valid_identifier(s: &str) -> bool {
    UUID_RE.is_match(s)
}

/// Shape required to create a user: an object with a non-blank `name`,
/// plus well-formed `email`/`age`/`hobbies` when present.
pub fn is_valid_user_payload(value: &Value) -> bool {
    match value.as_object() {
        Some(obj) => obj.contains_key("name") && known_fields_well_formed(obj),
        None => false,
    }
}

/// Shape accepted for an update: an object whose known fields, if present, are well-formed.
pub fn is_valid_user_patch(value: &Value) -> bool {
    value.as_object().is_some_and(known_fields_well_formed)
}

fn known_fields_well_formed(obj: &Map<String, Value>) -> bool {
    let name_ok = obj
        .get("name")
        .map_or(true, |v| v.as_str().is_some_and(|s| !s.trim().is_empty()));
    let email_ok = obj
        .get("email")
        .map_or(true, |v| v.as_str().is_some_and(|s| s.contains('@')));
    let age_ok = obj.get("age").map_or(true, |v| v.as_u64().is_some());
    let hobbies_ok = obj.get("hobbies").map_or(true, |v| {
        v.as_array()
            .is_some_and(|items| items.iter().all(Value::is_string))
    });

    name_ok && email_ok && age_ok && hobbies_ok
}
