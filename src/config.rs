//! Pipeline configuration.
//!
//! Uses `figment` for layered configuration: built-in defaults -> optional TOML file ->
//! `RENTAL_ETL_*` environment variables -> CLI overrides applied by the caller.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::EtlResult;
use crate::ingestion::Severity;
use crate::logging::LogConfig;

/// Prefix of environment variables read by [`EtlConfig::load`].
pub const ENV_PREFIX: &str = "RENTAL_ETL_";

const DEFAULT_CHUNK_SIZE: NonZeroUsize = NonZeroUsize::new(1000).unwrap();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// Directory scanned for source files.
    pub input_dir: PathBuf,
    /// Directory of the durable store.
    pub output_dir: PathBuf,
    /// Destination of files that completed their row loop.
    pub processed_dir: PathBuf,
    /// Destination of failed files and of error reports.
    pub errors_dir: PathBuf,
    /// Rows per create batch handed to the store. Zero is rejected when loading.
    pub chunk_size: NonZeroUsize,
    /// A processed file with more row errors than this raises a warning alert.
    pub max_errors: usize,
    /// Sheet to read from spreadsheets; the first sheet when unset.
    pub sheet: Option<String>,
    /// File-level failures at or above this severity raise an alert.
    pub alert_at_or_above: Severity,
    pub log: LogConfig,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/input"),
            output_dir: PathBuf::from("data/output"),
            processed_dir: PathBuf::from("data/processed"),
            errors_dir: PathBuf::from("data/errors"),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_errors: 100,
            sheet: None,
            alert_at_or_above: Severity::Critical,
            log: LogConfig::default(),
        }
    }
}

impl EtlConfig {
    /// Load configuration.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (`RENTAL_ETL_CHUNK_SIZE`, `RENTAL_ETL_LOG__LEVEL`, ...)
    /// 2. The TOML file at `path`, when given
    /// 3. Built-in defaults
    pub fn load(path: Option<&Path>) -> EtlResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Ok(figment.extract::<Self>().map_err(Box::new)?)
    }

    /// Parse configuration from TOML text layered over the defaults. Environment is not read.
    pub fn from_toml_str(toml: &str) -> EtlResult<Self> {
        Ok(Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml))
            .extract::<Self>()
            .map_err(Box::new)?)
    }

    /// Create the input, output, processed and errors directories.
    pub fn ensure_directories(&self) -> EtlResult<()> {
        for dir in [&self.input_dir, &self.output_dir, &self.processed_dir, &self.errors_dir] {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Point every directory under `root`, keeping the default layout.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            input_dir: root.join("input"),
            output_dir: root.join("output"),
            processed_dir: root.join("processed"),
            errors_dir: root.join("errors"),
            ..Self::default()
        }
    }
}
