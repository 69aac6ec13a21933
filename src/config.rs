//! Run settings assembled from defaults, `deebee.toml`, the environment and
//! command-line flags, in that order of increasing precedence.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::metadata::{ClientSettings, DEFAULT_BASE_URL, RetryPolicy};
use crate::pipeline::PipelineSettings;
use crate::rename_engine::{ExecutionMode, FormatCatalog, MediaMode, RenameFormat};
use crate::scanner::{DEFAULT_EXTENSIONS, FolderScanner};

pub const DEFAULT_CONFIG_FILE: &str = "deebee.toml";
pub const DEFAULT_LIMIT: usize = 10;

/// Layout of `deebee.toml`. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub limit: Option<usize>,
    pub mode: Option<MediaMode>,
    pub format: Option<String>,
    pub recursive: Option<bool>,
    pub extensions: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub retry: RetryConfig,
    pub formats: BTreeMap<String, FormatConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
}

/// A user-defined rename format.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FormatConfig {
    pub label: Option<String>,
    pub template: String,
    /// Empty means usable in both modes.
    #[serde(default)]
    pub modes: Vec<MediaMode>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// An explicit path must exist; otherwise `./deebee.toml` is used when
    /// present.
    pub fn discover(explicit: Option<&Path>) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(None);
                }
                fallback
            }
        };
        let config = Self::load(&path)?;
        debug!(path = %path.display(), "loaded config file");
        Ok(Some((path, config)))
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub directory: PathBuf,
    pub api_key: Option<String>,
    pub base_url: String,
    pub limit: usize,
    pub mode: MediaMode,
    pub format: RenameFormat,
    pub catalog: FormatCatalog,
    pub execution: ExecutionMode,
    pub recursive: bool,
    pub extensions: Vec<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl AppConfig {
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: self.timeout,
            retry: self.retry,
        }
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            limit: self.limit,
            mode: self.mode,
            execution: self.execution,
            scanner: FolderScanner::new(&self.extensions, self.recursive),
        }
    }
}

/// Layers are applied in call order; later calls win.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    directory: PathBuf,
    api_key: Option<String>,
    base_url: Option<String>,
    limit: usize,
    mode: MediaMode,
    format: Option<String>,
    execution: ExecutionMode,
    recursive: bool,
    extensions: Vec<String>,
    timeout: Duration,
    retry: RetryPolicy,
    custom_formats: BTreeMap<String, FormatConfig>,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    pub fn new() -> Self {
        let client = ClientSettings::default();
        Self {
            directory: PathBuf::from("."),
            api_key: None,
            base_url: None,
            limit: DEFAULT_LIMIT,
            mode: MediaMode::default(),
            format: None,
            execution: ExecutionMode::DryRun,
            recursive: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            timeout: client.timeout,
            retry: client.retry,
            custom_formats: BTreeMap::new(),
        }
    }

    pub fn file(mut self, file: FileConfig) -> Self {
        self = self
            .api_key(file.api_key)
            .base_url(file.base_url)
            .limit(file.limit)
            .mode(file.mode)
            .format(file.format);
        if let Some(recursive) = file.recursive {
            self.recursive = recursive;
        }
        if let Some(extensions) = file.extensions {
            self.extensions = extensions;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = file.retry.attempts {
            self.retry.max_attempts = attempts;
        }
        if let Some(ms) = file.retry.base_delay_ms {
            self.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = file.retry.max_delay_ms {
            self.retry.max_delay = Duration::from_millis(ms);
        }
        self.custom_formats.extend(file.formats);
        self
    }

    /// `DEEBEE_API_KEY` (falling back to `IMDB_API_KEY`) and `DEEBEE_BASE_URL`.
    pub fn environment<F>(self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        let api_key = non_empty("DEEBEE_API_KEY").or_else(|| non_empty("IMDB_API_KEY"));
        let base_url = non_empty("DEEBEE_BASE_URL");
        self.api_key(api_key).base_url(base_url)
    }

    pub fn directory<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.directory = dir.as_ref().to_path_buf();
        self
    }

    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        if api_key.is_some() {
            self.api_key = api_key;
        }
        self
    }

    pub fn base_url(mut self, base_url: Option<String>) -> Self {
        if base_url.is_some() {
            self.base_url = base_url;
        }
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.limit = limit;
        }
        self
    }

    pub fn mode(mut self, mode: Option<MediaMode>) -> Self {
        if let Some(mode) = mode {
            self.mode = mode;
        }
        self
    }

    pub fn format(mut self, key: Option<String>) -> Self {
        if key.is_some() {
            self.format = key;
        }
        self
    }

    pub fn execute(mut self, execute: bool) -> Self {
        if execute {
            self.execution = ExecutionMode::Execute;
        }
        self
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        if recursive {
            self.recursive = true;
        }
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Built-in formats plus the ones from the config file.
    pub fn catalog(&self) -> Result<FormatCatalog, ConfigError> {
        let mut catalog = FormatCatalog::builtin()?;
        for (key, custom) in &self.custom_formats {
            let modes = if custom.modes.is_empty() {
                vec![MediaMode::Movie, MediaMode::Tv]
            } else {
                custom.modes.clone()
            };
            let label = custom.label.clone().unwrap_or_else(|| key.clone());
            let format = RenameFormat::new(key.clone(), label, &custom.template, &modes)
                .map_err(|source| ConfigError::Template {
                    key: key.clone(),
                    source,
                })?;
            catalog.insert(format);
        }
        Ok(catalog)
    }

    pub fn build(self) -> Result<AppConfig, ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::InvalidLimit);
        }

        let catalog = self.catalog()?;
        let format = catalog.resolve(self.format.as_deref(), self.mode)?;

        Ok(AppConfig {
            directory: self.directory,
            api_key: self.api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()),
            base_url: self.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            limit: self.limit,
            mode: self.mode,
            format,
            catalog,
            execution: self.execution,
            recursive: self.recursive,
            extensions: self.extensions,
            timeout: self.timeout,
            retry: self.retry,
        })
    }
}
