//! Full-screen presenter built on ratatui and crossterm.

mod models;
mod rendering;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

pub use models::{HistoryEntry, KeyOutcome, ProcessingStats, SelectionState, handle_key};
pub use rendering::{Screen, ui};

use crate::pipeline::CancelToken;
use crate::presenter::Presenter;
use crate::ranker::ChoiceList;
use crate::rename_engine::{ExecutionMode, ExecutionResult};
use crate::title_extractor::ScanCandidate;

pub struct TuiPresenter {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    history: Vec<HistoryEntry>,
    stats: ProcessingStats,
    dry_run: bool,
    cancel: CancelToken,
    restored: bool,
}

impl TuiPresenter {
    /// Switch the terminal to raw mode and the alternate screen. The
    /// terminal is put back when the presenter is dropped.
    pub fn new(mode: ExecutionMode, cancel: CancelToken) -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        Ok(Self {
            terminal,
            history: Vec::new(),
            stats: ProcessingStats::default(),
            dry_run: mode == ExecutionMode::DryRun,
            cancel,
            restored: false,
        })
    }

    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()
    }
}

impl Presenter for TuiPresenter {
    fn select(&mut self, candidate: &ScanCandidate, choices: &ChoiceList) -> io::Result<usize> {
        let mut selection = SelectionState::new(choices);

        loop {
            let screen = Screen {
                candidate,
                choices,
                selection: &selection,
                history: &self.history,
                stats: self.stats,
                dry_run: self.dry_run,
            };
            self.terminal.draw(|f| ui(f, &screen))?;

            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match handle_key(&mut selection, key.code) {
                KeyOutcome::Continue => {}
                KeyOutcome::Select(index) => return Ok(index),
                KeyOutcome::Cancel => {
                    self.cancel.cancel();
                    return Ok(ChoiceList::SKIP);
                }
            }
        }
    }

    fn report(&mut self, result: &ExecutionResult) {
        self.stats.record(result.status);
        self.history.push(HistoryEntry::from_result(result));
    }
}

impl Drop for TuiPresenter {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
