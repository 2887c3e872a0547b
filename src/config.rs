//! Parser configuration and the process-wide config store
//!
//! The store is init-once: install a config at startup, read it afterwards.
//! Parsers take the config by reference and never touch the store themselves.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

static GLOBAL_CONFIG: OnceCell<ParserConfig> = OnceCell::new();
static DEFAULT_CONFIG: Lazy<ParserConfig> = Lazy::new(ParserConfig::default);

/// Stream names that are dropped before decoding
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamBlacklist(HashSet<String>);

impl StreamBlacklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, stream_name: &str) -> bool {
        self.0.contains(stream_name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for StreamBlacklist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for StreamBlacklist {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// Configuration read by the timeslice parser
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default)]
    pub stream_blacklist: StreamBlacklist,
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blacklist<I, S>(mut self, streams: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stream_blacklist.extend(streams);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}

/// Install the process-wide config. Only the first call succeeds.
pub fn install(config: ParserConfig) -> Result<(), ConfigError> {
    let count = config.stream_blacklist.len();
    GLOBAL_CONFIG
        .set(config)
        .map_err(|_| ConfigError::AlreadyInstalled)?;
    log::debug!("parser config installed ({} blacklisted streams)", count);
    Ok(())
}

/// The installed config, or an empty default when none was installed
pub fn global() -> &'static ParserConfig {
    GLOBAL_CONFIG.get().unwrap_or(&*DEFAULT_CONFIG)
}
