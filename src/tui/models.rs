use crossterm::event::KeyCode;
use ratatui::widgets::ListState;

use crate::ranker::ChoiceList;
use crate::rename_engine::{ExecutionResult, ExecutionStatus};

/// Cursor over the rows of one `ChoiceList`.
#[derive(Debug, Clone)]
pub struct SelectionState {
    pub list_state: ListState,
    /// Choice number for each visible row, in display order.
    rows: Vec<usize>,
}

impl SelectionState {
    pub fn new(choices: &ChoiceList) -> Self {
        let rows: Vec<usize> = choices.rows().map(|(number, _)| number).collect();
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self { list_state, rows }
    }

    pub fn selected_choice(&self) -> usize {
        self.list_state
            .selected()
            .and_then(|i| self.rows.get(i).copied())
            .unwrap_or(ChoiceList::SKIP)
    }

    pub fn next(&mut self) {
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < self.rows.len() => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let i = match self.list_state.selected() {
            Some(0) | None => self.rows.len().saturating_sub(1),
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn jump_to(&mut self, number: usize) {
        if let Some(row) = self.rows.iter().position(|&n| n == number) {
            self.list_state.select(Some(row));
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Select(usize),
    Cancel,
}

pub fn handle_key(state: &mut SelectionState, code: KeyCode) -> KeyOutcome {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => KeyOutcome::Cancel,
        KeyCode::Down | KeyCode::Char('j') => {
            state.next();
            KeyOutcome::Continue
        }
        KeyCode::Up | KeyCode::Char('k') => {
            state.previous();
            KeyOutcome::Continue
        }
        KeyCode::Enter => KeyOutcome::Select(state.selected_choice()),
        KeyCode::Char('s') | KeyCode::Char('0') => KeyOutcome::Select(ChoiceList::SKIP),
        KeyCode::Char(c) => {
            if let Some(digit) = c.to_digit(10) {
                state.jump_to(digit as usize);
            }
            KeyOutcome::Continue
        }
        _ => KeyOutcome::Continue,
    }
}

/// A finished file, as listed in the history panel.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub line: String,
    pub status: ExecutionStatus,
}

impl HistoryEntry {
    pub fn from_result(result: &ExecutionResult) -> Self {
        Self {
            line: crate::presenter::status_line(result),
            status: result.status,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub processed: usize,
    pub renamed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ProcessingStats {
    pub fn record(&mut self, status: ExecutionStatus) {
        self.processed += 1;
        match status {
            ExecutionStatus::Applied | ExecutionStatus::DryRunReported => self.renamed += 1,
            ExecutionStatus::Skipped => self.skipped += 1,
            ExecutionStatus::Failed => self.failed += 1,
        }
    }
}
