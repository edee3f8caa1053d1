//! Case-insensitive, multi-valued header map.
//!
//! Names are normalised to lowercase on insertion, so `Content-Type` and
//! `content-type` address the same entry. A name may carry several values
//! (`set-cookie` is the usual example); they keep their insertion order, and
//! names keep the order in which they were first seen.

use serde::ser::{Serialize, SerializeMap, Serializer};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HttpHeaders {
    entries: Vec<(String, Vec<String>)>,
}

impl HttpHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every value of `name` with `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.position(name) {
            Some(i) => self.entries[i].1 = vec![value],
            None => self.entries.push((name.to_ascii_lowercase(), vec![value])),
        }
        self
    }

    /// Appends `value` after any existing values of `name`.
    pub fn add(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.position(name) {
            Some(i) => self.entries[i].1.push(value),
            None => self.entries.push((name.to_ascii_lowercase(), vec![value])),
        }
        self
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// All values of `name`, in insertion order. Empty when absent.
    pub fn get_all(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(i) => &self.entries[i].1,
            None => &[],
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Vec<String> {
        match self.position(name) {
            Some(i) => self.entries.remove(i).1,
            None => Vec::new(),
        }
    }

    /// Appends every value of `other`. Existing values are kept, never overwritten.
    pub fn merge(&mut self, other: &HttpHeaders) {
        for (name, values) in &other.entries {
            for value in values {
                self.add(name, value.clone());
            }
        }
    }

    /// Lowercased names, in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Every `(name, value)` pair; a repeated name yields one pair per value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Total number of values across all names.
    pub fn len(&self) -> usize {
        self.entries.iter().map(|(_, vs)| vs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HttpHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (k, v) in iter {
            headers.add(k.as_ref(), v);
        }
        headers
    }
}

impl<K: AsRef<str>, V: Into<String>, const N: usize> From<[(K, V); N]> for HttpHeaders {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

/// Serialises as `{"name": ["value", ...]}`.
impl Serialize for HttpHeaders {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, vs) in &self.entries {
            map.serialize_entry(k, vs)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut h = HttpHeaders::new();
        h.set("Content-Type", "application/json");
        assert_eq!(h.get("content-type"), Some("application/json"));
        assert_eq!(h.get("CONTENT-TYPE"), Some("application/json"));
        assert!(h.contains("Content-type"));
    }

    #[test]
    fn repeated_names_keep_order() {
        let mut h = HttpHeaders::new();
        h.add("Set-Cookie", "a=1").add("set-cookie", "b=2");
        assert_eq!(h.get_all("SET-COOKIE"), ["a=1", "b=2"]);
        assert_eq!(h.len(), 2);
        assert_eq!(h.names().collect::<Vec<_>>(), ["set-cookie"]);
    }

    #[test]
    fn set_replaces_all_values() {
        let mut h = HttpHeaders::new();
        h.add("x-a", "1").add("x-a", "2").set("X-A", "3");
        assert_eq!(h.get_all("x-a"), ["3"]);
    }

    #[test]
    fn merge_appends_without_overwriting() {
        let mut h = HttpHeaders::from([("X-Foo", "custom stuff"), ("Vary", "origin")]);
        let defaults = HttpHeaders::from([("Access-Control-Allow-Origin", "*"), ("vary", "accept")]);
        h.merge(&defaults);

        assert_eq!(h.get("x-foo"), Some("custom stuff"));
        assert_eq!(h.get("access-control-allow-origin"), Some("*"));
        assert_eq!(h.get_all("vary"), ["origin", "accept"]);
    }

    #[test]
    fn serialises_as_map_of_lists() {
        let h = HttpHeaders::from([("X-A", "1"), ("x-a", "2")]);
        assert_eq!(serde_json::to_value(&h).unwrap(), serde_json::json!({"x-a": ["1", "2"]}));
    }
}
