//! Flat `key -> string` parameter store consumed by governors.
//!
//! Keys are dotted paths such as `align.range.radius.value.value`. A governor
//! layers the user registry over its built-in default table, so every lookup
//! checks the user entries first and the defaults second.
//!
//! On disk a registry is a RON map:
//! ```ron
//! {
//!     "align.weight.value.value": "0.4",
//!     "align.range.check": "strictOff",
//! }
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use bevy::prelude::*;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse parameter registry: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to read parameter registry from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unknown check kind '{value}' for key '{key}'")]
    UnknownCheck { key: String, value: String },
    #[error("unknown value type '{value}' for key '{key}'")]
    UnknownValueType { key: String, value: String },
    #[error("key '{key}' expects a number, got '{value}'")]
    InvalidNumber { key: String, value: String },
    #[error("key '{key}' expects true/false, got '{value}'")]
    InvalidBool { key: String, value: String },
}

#[derive(Resource, Clone, Debug, Default, PartialEq)]
pub struct ParamRegistry {
    values: FxHashMap<String, String>,
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        let values: FxHashMap<String, String> = ron::from_str(contents)?;
        Ok(Self { values })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_ron_str(&contents)?;
        info!(
            "Loaded {} fleet parameters from {}",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// A copy of `self` with every key of `defaults` that `self` lacks filled in.
    pub fn layered_over(&self, defaults: &[(&str, &str)]) -> Self {
        let mut merged = self.clone();
        for (key, value) in defaults {
            merged
                .values
                .entry((*key).to_string())
                .or_insert_with(|| (*value).to_string());
        }
        merged
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parse `key` as `T`; `Ok(None)` when absent.
    fn parse_num<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get_str(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|_| ConfigError::InvalidNumber {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    pub fn get_f32(&self, key: &str) -> Result<Option<f32>, ConfigError> {
        self.parse_num(key)
    }

    pub fn f32_or(&self, key: &str, default: f32) -> Result<f32, ConfigError> {
        Ok(self.get_f32(key)?.unwrap_or(default))
    }

    pub fn u64_or(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        Ok(self.parse_num(key)?.unwrap_or(default))
    }

    pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get_str(key).map(str::trim) {
            None => Ok(default),
            Some("true") | Some("1") => Ok(true),
            Some("false") | Some("0") => Ok(false),
            Some(raw) => Err(ConfigError::InvalidBool {
                key: key.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}
