//! Ordered, case-insensitive header table.
//!
//! # Design
//! Entries live in a `Vec` in insertion order and are matched by
//! ASCII-case-folded name. There is at most one entry per folded name:
//! setting an existing name replaces its value in place and adopts the
//! caller's latest spelling of the name for output. Header tables are small,
//! so a linear scan beats hashing here.

use std::fmt;

/// A header value: either one string or an ordered list of strings that is
/// comma-joined when written to the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Single(String),
    List(Vec<String>),
}

impl HeaderValue {
    /// The value as it appears on the wire.
    pub fn joined(&self) -> String {
        match self {
            HeaderValue::Single(value) => value.clone(),
            HeaderValue::List(values) => values.join(", "),
        }
    }

    /// First (or only) value.
    pub fn first(&self) -> Option<&str> {
        match self {
            HeaderValue::Single(value) => Some(value),
            HeaderValue::List(values) => values.first().map(String::as_str),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            HeaderValue::Single(existing) => {
                let existing = std::mem::take(existing);
                *self = HeaderValue::List(vec![existing, value]);
            }
            HeaderValue::List(values) => values.push(value),
        }
    }
}

impl fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        HeaderValue::Single(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        HeaderValue::Single(value)
    }
}

impl From<Vec<String>> for HeaderValue {
    fn from(values: Vec<String>) -> Self {
        HeaderValue::List(values)
    }
}

impl From<Vec<&str>> for HeaderValue {
    fn from(values: Vec<&str>) -> Self {
        HeaderValue::List(values.into_iter().map(str::to_string).collect())
    }
}

impl PartialEq<str> for HeaderValue {
    fn eq(&self, other: &str) -> bool {
        self.joined() == other
    }
}

impl PartialEq<&str> for HeaderValue {
    fn eq(&self, other: &&str) -> bool {
        self.joined() == *other
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    name: String,
    value: HeaderValue,
}

/// Insertion-ordered header map with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderTable {
    entries: Vec<Entry>,
}

impl HeaderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert `name` when `value` is `Some`, remove it when `None`.
    pub fn set(&mut self, name: &str, value: Option<HeaderValue>) {
        match value {
            Some(value) => self.insert(name, value),
            None => {
                self.remove(name);
            }
        }
    }

    /// Upsert `name`, keeping the entry's position if it already exists.
    pub fn insert(&mut self, name: &str, value: impl Into<HeaderValue>) {
        let value = value.into();
        match self.position(name) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.name = name.to_string();
                entry.value = value;
            }
            None => self.entries.push(Entry {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Add `value` under `name`, turning an existing entry into a list.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        match self.position(name) {
            Some(idx) => self.entries[idx].value.push(value.into()),
            None => self.entries.push(Entry {
                name: name.to_string(),
                value: HeaderValue::Single(value.into()),
            }),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.position(name)
            .map(|idx| self.entries.remove(idx).value)
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.position(name).map(|idx| &self.entries[idx].value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order, with the caller's spelling of each name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.value))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut table = HeaderTable::new();
        table.insert("X-Foo", "1");
        assert_eq!(table.get("x-foo").unwrap(), "1");
        assert_eq!(table.get("X-FOO").unwrap(), "1");
        assert!(table.get("x-bar").is_none());
    }

    #[test]
    fn set_replaces_in_place_with_latest_spelling() {
        let mut table = HeaderTable::new();
        table.insert("Accept", "text/html");
        table.insert("X-Trace", "a");
        table.insert("ACCEPT", "text/turtle");

        assert_eq!(table.len(), 2);
        let entries: Vec<_> = table.iter().map(|(n, v)| (n, v.joined())).collect();
        assert_eq!(
            entries,
            vec![
                ("ACCEPT", "text/turtle".to_string()),
                ("X-Trace", "a".to_string())
            ]
        );
    }

    #[test]
    fn set_none_removes_entry() {
        let mut table = HeaderTable::new();
        table.set("Host", Some("example.com".into()));
        assert!(table.contains("host"));
        table.set("HOST", None);
        assert!(!table.contains("host"));
        assert!(table.is_empty());

        // removing an absent header is a no-op
        table.set("Host", None);
        assert!(table.is_empty());
    }

    #[test]
    fn list_values_join_with_comma() {
        let value = HeaderValue::from(vec!["text/turtle", "application/rdf+xml"]);
        assert_eq!(value.joined(), "text/turtle, application/rdf+xml");
        assert_eq!(value.first(), Some("text/turtle"));
        assert_eq!(value.to_string(), "text/turtle, application/rdf+xml");
    }

    #[test]
    fn append_collects_repeated_names() {
        let mut table = HeaderTable::new();
        table.append("Set-Cookie", "a=1");
        table.append("set-cookie", "b=2");
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get("SET-COOKIE"),
            Some(&HeaderValue::List(vec!["a=1".into(), "b=2".into()]))
        );
    }
}
