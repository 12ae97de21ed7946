//! # Config Sections
//!
//! Effect options arrive as one TOML table per effect. The getters here are
//! deliberately lenient in the same way the host config API is: a float
//! key accepts an integer, a string-list key accepts a lone string, and a
//! missing or mistyped key falls back to the caller's default.

use serde::de::DeserializeOwned;

use crate::error::{EffectError, EffectResult};

/// One effect's configuration table.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigSection {
    table: toml::Table,
}

impl ConfigSection {
    /// Wraps an already-parsed table.
    #[must_use]
    pub fn new(table: toml::Table) -> Self {
        Self { table }
    }

    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::InvalidConfig`] if the text is not valid TOML.
    pub fn from_toml_str(text: &str) -> EffectResult<Self> {
        text.parse::<toml::Table>()
            .map(Self::new)
            .map_err(|e| EffectError::InvalidConfig(e.to_string()))
    }

    /// The underlying table.
    #[must_use]
    pub fn table(&self) -> &toml::Table {
        &self.table
    }

    /// Is the key present?
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.table.contains_key(key)
    }

    /// Raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.table.get(key)
    }

    /// Nested table as its own section.
    #[must_use]
    pub fn section(&self, key: &str) -> Option<Self> {
        self.table
            .get(key)
            .and_then(toml::Value::as_table)
            .map(|t| Self::new(t.clone()))
    }

    /// Float value (integers widen).
    #[must_use]
    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        match self.table.get(key) {
            Some(toml::Value::Float(f)) => *f,
            Some(toml::Value::Integer(i)) => *i as f64,
            _ => default,
        }
    }

    /// Integer value.
    #[must_use]
    pub fn get_i64(&self, key: &str, default: i64) -> i64 {
        self.table
            .get(key)
            .and_then(toml::Value::as_integer)
            .unwrap_or(default)
    }

    /// Non-negative integer (tick counts, amounts). Negatives clamp to 0.
    #[must_use]
    pub fn get_u32(&self, key: &str, default: u32) -> u32 {
        match self.table.get(key).and_then(toml::Value::as_integer) {
            Some(i) => u32::try_from(i.max(0)).unwrap_or(u32::MAX),
            None => default,
        }
    }

    /// Boolean value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.table
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// String value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.table.get(key).and_then(toml::Value::as_str)
    }

    /// String value with a default.
    #[must_use]
    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get_str(key).unwrap_or(default).to_string()
    }

    /// List of strings. A lone string is a one-element list; non-string
    /// entries are skipped.
    #[must_use]
    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        match self.table.get(key) {
            Some(toml::Value::String(s)) => vec![s.clone()],
            Some(toml::Value::Array(items)) => items
                .iter()
                .filter_map(toml::Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Deserializes the whole section into `T`. Unknown keys are ignored
    /// unless `T` says otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::InvalidConfig`] when a known key has the wrong type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> EffectResult<T> {
        toml::Value::Table(self.table.clone())
            .try_into()
            .map_err(|e: toml::de::Error| EffectError::InvalidConfig(e.to_string()))
    }
}

impl From<toml::Table> for ConfigSection {
    fn from(table: toml::Table) -> Self {
        Self::new(table)
    }
}
