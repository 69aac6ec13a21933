use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::format::{NameContext, RenameFormat};
use super::sanitize_filename;
use crate::error::RenameFailure;
use crate::metadata::MatchResult;
use crate::ranker::Choice;
use crate::title_extractor::ScanCandidate;

/// Where a file should end up. `source == target` means leave it alone.
#[derive(Debug, Clone, PartialEq)]
pub struct RenamePlan {
    pub source: PathBuf,
    pub target: PathBuf,
    pub selection: Option<MatchResult>,
    /// The target was suffixed to dodge an existing file.
    pub adjusted: bool,
}

impl RenamePlan {
    pub fn skip(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        Self {
            target: source.clone(),
            source,
            selection: None,
            adjusted: false,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.source == self.target
    }

    pub fn is_skip(&self) -> bool {
        self.selection.is_none()
    }

    /// Checks done right before touching the disk; the planner's view of the
    /// directory may be stale by then.
    pub fn check(&self) -> Result<(), RenameFailure> {
        if !self.source.exists() {
            return Err(RenameFailure::SourceMissing(self.source.clone()));
        }
        if self.target.exists() && !same_file(&self.source, &self.target) {
            return Err(RenameFailure::TargetExists(self.target.clone()));
        }
        Ok(())
    }
}

/// Builds plans for one run, remembering every target handed out so two
/// files never get the same name even before anything is renamed.
#[derive(Debug)]
pub struct RenamePlanner {
    format: RenameFormat,
    reserved: HashSet<PathBuf>,
}

impl RenamePlanner {
    pub fn new(format: RenameFormat) -> Self {
        Self {
            format,
            reserved: HashSet::new(),
        }
    }

    pub fn plan(&mut self, candidate: &ScanCandidate, choice: Choice<'_>) -> RenamePlan {
        let selected = match choice {
            Choice::Skip => return RenamePlan::skip(&candidate.path),
            Choice::Match(selected) => selected,
        };

        let context = name_context(candidate, selected);
        let file_name = self.format.file_name(&context);
        let proposed = candidate.path.with_file_name(&file_name);

        if proposed == candidate.path {
            debug!(path = %candidate.path.display(), "already named correctly");
            return RenamePlan {
                source: candidate.path.clone(),
                target: proposed,
                selection: Some(selected.clone()),
                adjusted: false,
            };
        }

        let stem = file_name
            .strip_suffix(candidate.extension.as_str())
            .unwrap_or(&file_name)
            .to_string();
        let mut target = proposed;
        let mut suffix = 0u32;
        while self.is_taken(&candidate.path, &target) {
            suffix += 1;
            target = candidate
                .path
                .with_file_name(format!("{stem} ({suffix}){}", candidate.extension));
        }

        if suffix > 0 {
            debug!(target = %target.display(), "target name taken, suffixed");
        }
        self.reserved.insert(target.clone());

        RenamePlan {
            source: candidate.path.clone(),
            target,
            selection: Some(selected.clone()),
            adjusted: suffix > 0,
        }
    }

    fn is_taken(&self, source: &Path, target: &Path) -> bool {
        if target == source {
            return false;
        }
        self.reserved.contains(target) || (target.exists() && !same_file(source, target))
    }
}

fn name_context(candidate: &ScanCandidate, selected: &MatchResult) -> NameContext {
    let mut title = sanitize_filename(&selected.title);
    if title.is_empty() {
        title = sanitize_filename(&candidate.title);
    }
    NameContext {
        title,
        year: selected.year.or(candidate.year),
        episode_title: selected
            .episode_title
            .as_deref()
            .map(sanitize_filename)
            .filter(|t| !t.is_empty()),
        season: candidate.episode.map(|e| e.season),
        episode: candidate.episode.map(|e| e.episode),
        extension: candidate.extension.clone(),
    }
}

/// Whether two paths name the same file, e.g. a case-only rename on a
/// case-insensitive filesystem.
fn same_file(a: &Path, b: &Path) -> bool {
    let (Ok(meta_a), Ok(meta_b)) = (fs::metadata(a), fs::metadata(b)) else {
        return false;
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino()
    }
    #[cfg(not(unix))]
    {
        let _ = (meta_a, meta_b);
        matches!((fs::canonicalize(a), fs::canonicalize(b)), (Ok(x), Ok(y)) if x == y)
    }
}
