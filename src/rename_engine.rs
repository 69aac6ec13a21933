//! Turning a confirmed match into a new file name and applying it.

mod executor;
mod format;
mod planner;

pub use executor::{ExecutionMode, ExecutionResult, ExecutionStatus, Executor};
pub use format::{
    DEFAULT_MOVIE_FORMAT, DEFAULT_TV_FORMAT, FormatCatalog, MediaMode, NameContext, RenameFormat,
    Template,
};
pub use planner::{RenamePlan, RenamePlanner};

const FORBIDDEN: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Drop characters that are not allowed in file names on common
/// filesystems, then collapse whitespace runs.
pub fn sanitize_filename(filename: &str) -> String {
    let kept: String = filename
        .chars()
        .filter(|c| !FORBIDDEN.contains(c) && !c.is_control())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
