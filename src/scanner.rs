//! Listing media files in a folder.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::PipelineError;

pub const DEFAULT_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi"];

#[derive(Debug, Clone)]
pub struct FolderScanner {
    /// Lowercase, without the leading dot.
    extensions: Vec<String>,
    recursive: bool,
}

impl Default for FolderScanner {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSIONS.iter().copied(), false)
    }
}

impl FolderScanner {
    pub fn new<I, S>(extensions: I, recursive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self {
            extensions,
            recursive,
        }
    }

    pub fn accepts(&self, path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'));
        if hidden {
            return false;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Supported files under `dir`, sorted by path. An unreadable `dir` is
    /// an error; unreadable subdirectories are logged and skipped.
    pub fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        let scan_error = |source: io::Error| PipelineError::Scan {
            path: dir.to_path_buf(),
            source,
        };

        let metadata = fs::metadata(dir).map_err(scan_error)?;
        if !metadata.is_dir() {
            return Err(scan_error(io::Error::other("not a directory")));
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(scan_error(io::Error::from(err))),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if entry.file_type().is_file() && self.accepts(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();
        debug!(dir = %dir.display(), count = files.len(), "scan finished");
        Ok(files)
    }
}
