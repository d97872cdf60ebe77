//! The operator profile.
//!
//! A small key→value map (email, phone, name, ...) consulted by smart
//! fill and by `ProfileRef` resolution at macro playback time.  Keys are
//! normalized to lowercase.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Operator profile data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    fields: HashMap<String, String>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a profile value.  The key is lowercased.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into().to_lowercase(), value.into());
    }

    /// Look up a profile value, case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over `(key, value)` pairs in arbitrary order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Sorted keys, for stable display.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
