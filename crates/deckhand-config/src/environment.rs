//! Snapshot of the process environment.
//!
//! Resolution never reads `std::env` after the snapshot is taken and never
//! writes back to it. Tests build an `Environment` from pairs instead of
//! mutating the real process environment.

use crate::parsers::parse_bool;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the current process environment. Non UTF-8 entries are skipped.
    pub fn from_process() -> Self {
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    /// Look up a variable.
    ///
    /// `None` means unset, which is distinct from a variable explicitly set to
    /// the empty string.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Look up a variable, treating the empty string as unset.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|value| !value.is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Read a boolean flag. Unset or unparseable values count as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .and_then(|value| parse_bool(value).ok())
            .unwrap_or(false)
    }

    pub fn path(&self, key: &str) -> Option<PathBuf> {
        self.get_non_empty(key).map(PathBuf::from)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.vars.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.vars.remove(key)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.remove(key);
        self
    }

    /// Add variables that are not set yet. Returns how many were added.
    pub fn merge_missing<I, K, V>(&mut self, vars: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut added = 0;
        for (key, value) in vars {
            let key = key.into();
            if !self.vars.contains_key(&key) {
                self.vars.insert(key, value.into());
                added += 1;
            }
        }
        added
    }

    /// All variables whose name starts with `prefix`, with the prefix stripped.
    pub fn with_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(prefix)
                    .filter(|rest| !rest.is_empty())
                    .map(|rest| (rest.to_string(), value.clone()))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_distinct_from_empty() {
        let env = Environment::from_iter([("EMPTY", "")]);
        assert_eq!(env.get("EMPTY"), Some(""));
        assert_eq!(env.get("MISSING"), None);
        assert_eq!(env.get_non_empty("EMPTY"), None);
    }

    #[test]
    fn test_merge_missing_keeps_existing_values() {
        let mut env = Environment::from_iter([("A", "process")]);
        let added = env.merge_missing([("A", "file"), ("B", "file")]);

        assert_eq!(added, 1);
        assert_eq!(env.get("A"), Some("process"));
        assert_eq!(env.get("B"), Some("file"));
    }

    #[test]
    fn test_flag() {
        let env = Environment::from_iter([("ON", "true"), ("OFF", "0"), ("JUNK", "maybe")]);
        assert!(env.flag("ON"));
        assert!(!env.flag("OFF"));
        assert!(!env.flag("JUNK"));
        assert!(!env.flag("MISSING"));
    }

    #[test]
    fn test_with_prefix() {
        let env = Environment::from_iter([
            ("K8S_SECRET_TOKEN", "abc"),
            ("K8S_SECRET_", "ignored"),
            ("OTHER", "x"),
        ]);
        let secrets = env.with_prefix("K8S_SECRET_");
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets.get("TOKEN").map(String::as_str), Some("abc"));
    }
}
