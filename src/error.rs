use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to the metadata API.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no API key configured (set DEEBEE_API_KEY or api_key in the config file)")]
    MissingApiKey,

    #[error("the metadata API rejected the credentials ({status})")]
    Auth { status: u16 },

    #[error("request failed after {attempts} attempt(s): {message}")]
    Network { attempts: u32, message: String },

    #[error("the metadata API answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("could not build HTTP client: {0}")]
    Client(String),
}

impl LookupError {
    /// Authentication problems end the whole run; everything else only
    /// costs the current file its matches.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LookupError::MissingApiKey | LookupError::Auth { .. } | LookupError::Client(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("result limit must be at least 1")]
    InvalidLimit,

    #[error("unknown rename format '{key}'. Available: {available}")]
    UnknownFormat { key: String, available: String },

    #[error("rename format '{key}' is not valid for {mode} mode")]
    FormatModeMismatch { key: String, mode: String },

    #[error("invalid template for format '{key}': {source}")]
    Template {
        key: String,
        source: TemplateError,
    },

    #[error("unknown media mode '{0}' (expected 'movie' or 'tv')")]
    UnknownMode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}'")]
    UnknownField(String),

    #[error("unclosed '{0}'")]
    Unclosed(char),

    #[error("unexpected '{0}'")]
    Unexpected(char),

    #[error("bad width in '{{{0}}}'")]
    BadWidth(String),
}

/// Why a single rename could not be applied.
#[derive(Debug, Error)]
pub enum RenameFailure {
    #[error("source file no longer exists: {0}")]
    SourceMissing(PathBuf),

    #[error("target already exists: {0}")]
    TargetExists(PathBuf),

    #[error("permission denied: {0}")]
    PermissionDenied(io::Error),

    #[error("cannot move across filesystems: {0}")]
    CrossDevice(io::Error),

    #[error("{0}")]
    Io(io::Error),
}

impl From<io::Error> for RenameFailure {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => RenameFailure::PermissionDenied(err),
            io::ErrorKind::CrossesDevices => RenameFailure::CrossDevice(err),
            _ => RenameFailure::Io(err),
        }
    }
}

/// Errors that stop a batch before every file was visited.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("could not scan {path}: {source}")]
    Scan { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("presenter failed: {0}")]
    Presenter(#[source] io::Error),

    #[error("could not compile filename patterns: {0}")]
    Patterns(#[from] regex::Error),
}
