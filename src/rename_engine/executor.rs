use std::fs;

use tracing::{info, warn};

use super::planner::RenamePlan;
use crate::error::RenameFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Report what would happen without touching the filesystem.
    #[default]
    DryRun,
    Execute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    DryRunReported,
    Applied,
    Skipped,
    Failed,
}

#[derive(Debug)]
pub struct ExecutionResult {
    pub plan: RenamePlan,
    pub status: ExecutionStatus,
    pub error: Option<RenameFailure>,
}

impl ExecutionResult {
    fn new(plan: RenamePlan, status: ExecutionStatus) -> Self {
        Self {
            plan,
            status,
            error: None,
        }
    }

    fn failed(plan: RenamePlan, error: RenameFailure) -> Self {
        Self {
            plan,
            status: ExecutionStatus::Failed,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Executor {
    mode: ExecutionMode,
}

impl Executor {
    pub fn new(mode: ExecutionMode) -> Self {
        Self { mode }
    }

    pub fn execute(&self, plan: RenamePlan) -> ExecutionResult {
        if plan.is_noop() {
            return ExecutionResult::new(plan, ExecutionStatus::Skipped);
        }
        if self.mode == ExecutionMode::DryRun {
            return ExecutionResult::new(plan, ExecutionStatus::DryRunReported);
        }

        if let Err(err) = plan.check() {
            warn!(source = %plan.source.display(), error = %err, "rename refused");
            return ExecutionResult::failed(plan, err);
        }

        match fs::rename(&plan.source, &plan.target) {
            Ok(()) => {
                info!(
                    source = %plan.source.display(),
                    target = %plan.target.display(),
                    "renamed"
                );
                ExecutionResult::new(plan, ExecutionStatus::Applied)
            }
            Err(err) => {
                let failure = RenameFailure::from(err);
                warn!(source = %plan.source.display(), error = %failure, "rename failed");
                ExecutionResult::failed(plan, failure)
            }
        }
    }
}
