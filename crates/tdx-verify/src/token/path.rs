//! Presence-checked access into an untyped JSON tree.
//!
//! Token payloads vary between attestation service versions, so fields are
//! looked up by key path and an absent key is a value, not a panic.

use serde_json::Value;
use std::fmt;

/// Result of walking a key path.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<'a> {
    Found(&'a Value),
    Missing(MissingField),
}

impl<'a> Lookup<'a> {
    pub fn found(self) -> Option<&'a Value> {
        match self {
            Self::Found(value) => Some(value),
            Self::Missing(_) => None,
        }
    }

    pub fn into_result(self) -> Result<&'a Value, MissingField> {
        match self {
            Self::Found(value) => Ok(value),
            Self::Missing(missing) => Err(missing),
        }
    }
}

/// A key path that could not be followed to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingField {
    /// The full path that was requested.
    pub path: Vec<String>,
    /// The first key that was not present.
    pub key: String,
    /// Set when the key exists but holds the wrong kind of value.
    pub expected: Option<&'static str>,
}

impl MissingField {
    fn absent(path: &[&str], key: &str) -> Self {
        Self {
            path: path.iter().map(|k| k.to_string()).collect(),
            key: key.to_string(),
            expected: None,
        }
    }

    fn wrong_type(path: &[&str], expected: &'static str) -> Self {
        Self {
            path: path.iter().map(|k| k.to_string()).collect(),
            key: path.last().map(|k| k.to_string()).unwrap_or_default(),
            expected: Some(expected),
        }
    }

    /// The requested path in `/a/b/c` form.
    pub fn pointer(&self) -> String {
        self.path.iter().fold(String::new(), |mut acc, key| {
            acc.push('/');
            acc.push_str(key);
            acc
        })
    }
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.expected {
            None => write!(f, "missing field '{}' ({})", self.key, self.pointer()),
            Some(expected) => write!(
                f,
                "field '{}' is not {} ({})",
                self.key,
                expected,
                self.pointer()
            ),
        }
    }
}

impl std::error::Error for MissingField {}

/// Follows `path` through nested objects starting at `root`.
pub fn lookup<'a>(root: &'a Value, path: &[&str]) -> Lookup<'a> {
    let mut current = root;
    for key in path {
        match current.get(*key) {
            Some(next) => current = next,
            None => return Lookup::Missing(MissingField::absent(path, key)),
        }
    }
    Lookup::Found(current)
}

/// Like [`lookup`], but the value must be an object.
pub fn lookup_object<'a>(
    root: &'a Value,
    path: &[&str],
) -> Result<&'a serde_json::Map<String, Value>, MissingField> {
    lookup(root, path)
        .into_result()?
        .as_object()
        .ok_or_else(|| MissingField::wrong_type(path, "an object"))
}

/// Like [`lookup`], but the value must be an array.
pub fn lookup_array<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Vec<Value>, MissingField> {
    lookup(root, path)
        .into_result()?
        .as_array()
        .ok_or_else(|| MissingField::wrong_type(path, "an array"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_found() {
        let payload = json!({ "submods": { "cpu0": { "ear.status": "affirming" } } });
        let found = lookup(&payload, &["submods", "cpu0", "ear.status"]);
        assert_eq!(found, Lookup::Found(&json!("affirming")));
    }

    #[test]
    fn test_lookup_reports_first_missing_key() {
        let payload = json!({ "submods": { "cpu1": {} } });
        let missing = lookup(&payload, &["submods", "cpu0", "ear.status"])
            .into_result()
            .unwrap_err();
        assert_eq!(missing.key, "cpu0");
        assert_eq!(missing.pointer(), "/submods/cpu0/ear.status");
        assert_eq!(
            missing.to_string(),
            "missing field 'cpu0' (/submods/cpu0/ear.status)"
        );
    }

    #[test]
    fn test_lookup_through_scalar_is_missing() {
        let payload = json!({ "submods": "cpu0" });
        let missing = lookup(&payload, &["submods", "cpu0"]).found();
        assert!(missing.is_none());
    }

    #[test]
    fn test_typed_lookups() {
        let payload = json!({ "tdx": { "uefi_event_logs": {}, "quote": { "body": {} } } });

        let err = lookup_array(&payload, &["tdx", "uefi_event_logs"]).unwrap_err();
        assert_eq!(err.expected, Some("an array"));
        assert_eq!(
            err.to_string(),
            "field 'uefi_event_logs' is not an array (/tdx/uefi_event_logs)"
        );

        assert!(lookup_object(&payload, &["tdx", "quote", "body"]).unwrap().is_empty());
        let err = lookup_object(&payload, &["tdx", "quote", "header"]).unwrap_err();
        assert_eq!(err.expected, None);
    }

    #[test]
    fn test_empty_path_is_root() {
        let payload = json!([1, 2]);
        assert_eq!(lookup(&payload, &[]).found(), Some(&payload));
    }
}
