use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use ron::extensions::Extensions;
use serde::Deserialize;
use tracing::{debug, info};

use crate::filter::RefreshInterval;
use crate::{targets, Error};

pub const ENV_API: &str = "STATUSBOARD_API";
pub const ENV_NAME: &str = "STATUSBOARD_NAME";
pub const ENV_CONFIG: &str = "STATUSBOARD_CONFIG";

pub const DEFAULT_CONFIG_PATH: &str = "statusboard.ron";
pub const DEFAULT_DISPLAY_NAME: &str = "Status Board";
pub const DEFAULT_REFRESH_MS: u64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_base: String,
    pub display_name: String,
    /// Initial poll interval; the operator can change it at runtime.
    pub refresh_ms: u64,
    /// Per-probe timeout. `None` lets a hung probe keep its item Connecting.
    pub probe_timeout_ms: Option<u64>,
}

/// Values read from the optional RON file. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub api_base: Option<String>,
    pub display_name: Option<String>,
    pub refresh_ms: Option<u64>,
    pub probe_timeout_ms: Option<u64>,
}

impl ConfigFile {
    pub fn parse(contents: &str, path: Option<&Path>) -> Result<Self, Error> {
        ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(contents)
            .map_err(|source| Error::ConfigRon {
                path: path.map(|value| value.display().to_string()),
                source,
            })
    }

    /// Reads `path`. A missing file is only tolerated when `required` is false.
    pub fn read(path: &Path, required: bool) -> Result<Option<Self>, Error> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents, Some(path)).map(Some),
            Err(error) if !required && error.kind() == io::ErrorKind::NotFound => {
                debug!(target: targets::CONFIG, path = %path.display(), "no config file");
                Ok(None)
            }
            Err(source) => Err(Error::ConfigIo {
                path: Some(path.display().to_string()),
                source,
            }),
        }
    }
}

impl Config {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            display_name: DEFAULT_DISPLAY_NAME.to_string(),
            refresh_ms: DEFAULT_REFRESH_MS,
            probe_timeout_ms: None,
        }
    }

    /// Process environment plus the optional config file.
    pub fn from_env() -> Result<Self, Error> {
        let lookup = |key: &str| std::env::var(key).ok();
        let (path, required) = match lookup(ENV_CONFIG).filter(|value| !value.is_empty()) {
            Some(path) => (path, true),
            None => (DEFAULT_CONFIG_PATH.to_string(), false),
        };
        let file = ConfigFile::read(Path::new(&path), required)?.unwrap_or_default();
        let config = Self::resolve(file, lookup)?;

        info!(
            target: targets::CONFIG,
            api = %config.api_base,
            name = %config.display_name,
            refresh_ms = config.refresh_ms,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Environment values win over file values. Only presence is checked.
    pub fn resolve(
        file: ConfigFile,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let present = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let api_base = present(ENV_API)
            .or(file.api_base)
            .ok_or_else(|| Error::MissingConfig {
                key: ENV_API.to_string(),
            })?;
        let display_name = present(ENV_NAME)
            .or(file.display_name)
            .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string());

        Ok(Self {
            api_base,
            display_name,
            refresh_ms: file.refresh_ms.unwrap_or(DEFAULT_REFRESH_MS),
            probe_timeout_ms: file.probe_timeout_ms,
        })
    }

    pub fn refresh_interval(&self) -> RefreshInterval {
        RefreshInterval::from_millis(self.refresh_ms)
    }

    pub fn probe_timeout(&self) -> Option<Duration> {
        self.probe_timeout_ms.map(Duration::from_millis)
    }
}
