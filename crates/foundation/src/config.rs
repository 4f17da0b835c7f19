//! Key=value configuration files
//!
//! The controller and scenario configs share one format: one `key = value`
//! per line, `#` starts a comment line, blank lines are ignored. Parsers
//! reject keys they do not know so a typo fails loudly instead of silently
//! falling back to a default.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};

/// A parsed key=value file.
#[derive(Debug, Clone, Default)]
pub struct KeyValueFile {
    entries: IndexMap<String, String>,
}

impl KeyValueFile {
    /// Read and parse a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    /// Parse file contents.
    pub fn parse(text: &str) -> Self {
        let mut entries = IndexMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                entries.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { entries }
    }

    /// Fold another file's entries into this one; later entries win.
    pub fn merge(&mut self, other: KeyValueFile) {
        self.entries.extend(other.entries);
    }

    pub fn has(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Error on any key outside the `known` list.
    pub fn reject_unknown(&self, known: &[&str]) -> Result<()> {
        for key in self.entries.keys() {
            if !known.contains(&key.as_str()) {
                return Err(Error::UnknownKey(key.clone()));
            }
        }
        Ok(())
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn require_str(&self, key: &str) -> Result<&str> {
        self.get_str(key)
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    pub fn get_f64(&self, key: &str) -> Result<Option<f64>> {
        self.entries
            .get(key)
            .map(|v| {
                v.parse().map_err(|_| Error::MalformedValue {
                    key: key.to_string(),
                    value: v.clone(),
                })
            })
            .transpose()
    }

    pub fn require_f64(&self, key: &str) -> Result<f64> {
        self.get_f64(key)?
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    pub fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        self.entries
            .get(key)
            .map(|v| {
                v.parse().map_err(|_| Error::MalformedValue {
                    key: key.to_string(),
                    value: v.clone(),
                })
            })
            .transpose()
    }

    pub fn require_i64(&self, key: &str) -> Result<i64> {
        self.get_i64(key)?
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    pub fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        self.entries
            .get(key)
            .map(|v| {
                v.parse().map_err(|_| Error::MalformedValue {
                    key: key.to_string(),
                    value: v.clone(),
                })
            })
            .transpose()
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        self.entries
            .get(key)
            .map(|v| {
                v.parse().map_err(|_| Error::MalformedValue {
                    key: key.to_string(),
                    value: v.clone(),
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let kv = KeyValueFile::parse("# a comment\n\nalpha = 0.5\n beta=2 \n");
        assert_eq!(kv.get_str("alpha"), Some("0.5"));
        assert_eq!(kv.require_f64("beta").unwrap(), 2.0);
        assert!(!kv.has("gamma"));
    }

    #[test]
    fn test_value_may_contain_spaces() {
        let kv = KeyValueFile::parse("path = some file.txt\n");
        assert_eq!(kv.get_str("path"), Some("some file.txt"));
    }

    #[test]
    fn test_missing_and_malformed() {
        let kv = KeyValueFile::parse("rate = fast\n");
        assert!(matches!(kv.require_f64("absent"), Err(Error::MissingKey(_))));
        assert!(matches!(
            kv.require_f64("rate"),
            Err(Error::MalformedValue { .. })
        ));
    }

    #[test]
    fn test_reject_unknown() {
        let kv = KeyValueFile::parse("alpha = 1\nbogus = 2\n");
        assert!(kv.reject_unknown(&["alpha", "beta"]).is_err());
        assert!(kv.reject_unknown(&["alpha", "bogus"]).is_ok());
    }

    #[test]
    fn test_merge_later_wins() {
        let mut kv = KeyValueFile::parse("alpha = 1\n");
        kv.merge(KeyValueFile::parse("alpha = 2\nbeta = 3\n"));
        assert_eq!(kv.require_f64("alpha").unwrap(), 2.0);
        assert_eq!(kv.require_f64("beta").unwrap(), 3.0);
    }
}
