//! Drives one file at a time from scan to rename.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, error, info, warn};

use crate::error::{LookupError, PipelineError};
use crate::metadata::{MatchResult, MetadataSource};
use crate::presenter::Presenter;
use crate::ranker::{Choice, ChoiceList, rank};
use crate::rename_engine::{
    ExecutionMode, ExecutionResult, ExecutionStatus, Executor, MediaMode, RenameFormat,
    RenamePlanner,
};
use crate::scanner::FolderScanner;
use crate::title_extractor::{ScanCandidate, TitleExtractor};

/// Shared stop flag. Checked between files and after every prompt.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub limit: usize,
    pub mode: MediaMode,
    pub execution: ExecutionMode,
    pub scanner: FolderScanner,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            limit: 10,
            mode: MediaMode::Movie,
            execution: ExecutionMode::DryRun,
            scanner: FolderScanner::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub applied: usize,
    pub dry_run: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Everything that happened in one run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Files found by the scan.
    pub total: usize,
    pub results: Vec<ExecutionResult>,
    pub cancelled: bool,
    /// Fatal error that ended the run after `results` were recorded.
    pub aborted: Option<PipelineError>,
}

impl BatchReport {
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for result in &self.results {
            match result.status {
                ExecutionStatus::Applied => summary.applied += 1,
                ExecutionStatus::DryRunReported => summary.dry_run += 1,
                ExecutionStatus::Skipped => summary.skipped += 1,
                ExecutionStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.results
            .iter()
            .any(|r| r.status == ExecutionStatus::Failed)
    }

    /// 0 when every file went through, 1 when any rename failed, 2 when a
    /// fatal error stopped the run.
    pub fn exit_code(&self) -> u8 {
        if self.aborted.is_some() {
            2
        } else {
            u8::from(self.has_failures())
        }
    }
}

pub struct Pipeline<S, P> {
    source: S,
    presenter: P,
    extractor: TitleExtractor,
    planner: RenamePlanner,
    executor: Executor,
    settings: PipelineSettings,
    cancel: CancelToken,
}

impl<S: MetadataSource, P: Presenter> Pipeline<S, P> {
    pub fn new(
        source: S,
        presenter: P,
        format: RenameFormat,
        settings: PipelineSettings,
        cancel: CancelToken,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            source,
            presenter,
            extractor: TitleExtractor::new()?,
            planner: RenamePlanner::new(format),
            executor: Executor::new(settings.execution),
            settings,
            cancel,
        })
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Process every supported file in `dir`.
    ///
    /// A failed scan is returned as an error. A fatal lookup error or a
    /// broken presenter stops the run but keeps what was already done in the
    /// report's `aborted` field. Per-file rename failures are recorded and the
    /// batch goes on.
    pub fn run(&mut self, dir: &Path) -> Result<BatchReport, PipelineError> {
        let files = self.settings.scanner.scan(dir)?;
        info!(dir = %dir.display(), count = files.len(), mode = %self.settings.mode, "starting batch");

        let mut report = BatchReport {
            total: files.len(),
            ..BatchReport::default()
        };

        for path in &files {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match self.process(path) {
                Ok(Some(result)) => {
                    self.presenter.report(&result);
                    report.results.push(result);
                }
                Ok(None) => {
                    report.cancelled = true;
                    break;
                }
                Err(err) => {
                    error!(file = %path.display(), error = %err, "stopping batch");
                    report.aborted = Some(err);
                    break;
                }
            }
        }

        if report.cancelled {
            info!(processed = report.results.len(), total = report.total, "batch cancelled");
        }
        Ok(report)
    }

    /// `None` when the user stopped the batch at this file's prompt.
    fn process(&mut self, path: &Path) -> Result<Option<ExecutionResult>, PipelineError> {
        let candidate = self.extractor.extract(path);
        let results = self.lookup(&candidate)?;
        let choices = ChoiceList::new(rank(&candidate, results, self.settings.limit));

        let index = if choices.is_empty() {
            debug!(file = %candidate.file_name(), "no matches, skipping");
            ChoiceList::SKIP
        } else {
            self.presenter
                .select(&candidate, &choices)
                .map_err(PipelineError::Presenter)?
        };

        if self.cancel.is_cancelled() {
            return Ok(None);
        }

        let choice = choices.resolve(index).unwrap_or_else(|| {
            warn!(index, available = choices.len(), "selection out of range, skipping file");
            Choice::Skip
        });
        let plan = self.planner.plan(&candidate, choice);
        Ok(Some(self.executor.execute(plan)))
    }

    fn lookup(&self, candidate: &ScanCandidate) -> Result<Vec<MatchResult>, LookupError> {
        let query = candidate.search_query();
        let limit = self.settings.limit;
        let outcome = match (self.settings.mode, candidate.episode) {
            (MediaMode::Tv, Some(marker)) => {
                self.source
                    .lookup_episode(query, marker.season, marker.episode, limit)
            }
            _ => self.source.lookup(query, limit),
        };

        match outcome {
            Ok(results) => {
                debug!(query, count = results.len(), "lookup finished");
                Ok(results)
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(query, error = %err, "lookup failed, treating as no matches");
                Ok(Vec::new())
            }
        }
    }
}
