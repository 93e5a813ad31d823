//! INI file configuration adapter.
//!
//! Values can be overridden from the environment: `FVG_SQLITE_PATH` replaces
//! `[sqlite] path`, `FVG_ENGINE_FAST_PERIOD` replaces `[engine] fast_period`.
//! The first `_`-separated segment after the prefix names the section.

use crate::domain::error::FvgError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::collections::HashMap;
use std::path::Path;

pub const ENV_PREFIX: &str = "FVG_";

pub struct FileConfigAdapter {
    config: Ini,
    origin: String,
    overrides: HashMap<(String, String), String>,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FvgError> {
        let origin = path.as_ref().display().to_string();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| FvgError::ConfigParse {
            file: origin.clone(),
            reason,
        })?;
        Ok(Self {
            config,
            origin,
            overrides: HashMap::new(),
        })
    }

    pub fn from_string(content: &str) -> Result<Self, FvgError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| FvgError::ConfigParse {
                file: "<inline>".to_string(),
                reason,
            })?;
        Ok(Self {
            config,
            origin: "<inline>".to_string(),
            overrides: HashMap::new(),
        })
    }

    /// Where the INI content came from, for log lines.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(std::env::vars())
    }

    /// Applies `FVG_<SECTION>_<KEY>` pairs; other names are ignored.
    pub fn with_overrides<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, value) in vars {
            let Some(rest) = name.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let Some((section, key)) = rest.split_once('_') else {
                continue;
            };
            if section.is_empty() || key.is_empty() {
                continue;
            }
            tracing::debug!(section, key, "config value overridden from environment");
            self.overrides
                .insert((section.to_lowercase(), key.to_lowercase()), value);
        }
        self
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.overrides
            .get(&(section.to_lowercase(), key.to_lowercase()))
            .cloned()
            .or_else(|| self.config.get(section, key))
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.get_string(section, key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.get_string(section, key)
            .as_deref()
            .and_then(Self::parse_bool)
            .unwrap_or(default)
    }
}
