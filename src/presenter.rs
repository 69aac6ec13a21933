//! The interactive side of a batch: showing choices and reading answers.

use std::io::{self, BufRead, Write};

use dialoguer::Select;
use dialoguer::console::Term;

use crate::pipeline::CancelToken;
use crate::ranker::{Choice, ChoiceList};
use crate::rename_engine::{ExecutionResult, ExecutionStatus};
use crate::title_extractor::ScanCandidate;

/// Asks the user to confirm a match for each file.
pub trait Presenter {
    /// Return the chosen row number. `ChoiceList::SKIP` leaves the file
    /// alone; cancelling the batch is done through the shared `CancelToken`.
    fn select(&mut self, candidate: &ScanCandidate, choices: &ChoiceList) -> io::Result<usize>;

    /// Called once per processed file.
    fn report(&mut self, _result: &ExecutionResult) {}
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn select(&mut self, candidate: &ScanCandidate, choices: &ChoiceList) -> io::Result<usize> {
        (**self).select(candidate, choices)
    }

    fn report(&mut self, result: &ExecutionResult) {
        (**self).report(result)
    }
}

/// Arrow-key menu on the terminal. Row 0 is the skip entry, so the picked
/// item index is the answer itself. Esc or `q` cancels the batch.
pub struct ConsolePresenter {
    term: Term,
    cancel: CancelToken,
}

impl ConsolePresenter {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            term: Term::stdout(),
            cancel,
        }
    }
}

impl Presenter for ConsolePresenter {
    fn select(&mut self, candidate: &ScanCandidate, choices: &ChoiceList) -> io::Result<usize> {
        self.term.write_line("")?;
        for line in header_lines(candidate) {
            self.term.write_line(&line)?;
        }

        let answer = Select::new()
            .with_prompt("Pick a match (Esc or q stops)")
            .items(&menu_items(choices))
            .default(default_item(choices))
            .interact_on_opt(&self.term)
            .map_err(io::Error::other)?;

        match answer {
            Some(index) => Ok(index),
            None => {
                self.cancel.cancel();
                Ok(ChoiceList::SKIP)
            }
        }
    }

    fn report(&mut self, result: &ExecutionResult) {
        let _ = self.term.write_line(&status_line(result));
    }
}

/// Menu labels indexed by row number: the skip entry first, then matches.
pub fn menu_items(choices: &ChoiceList) -> Vec<String> {
    let mut items = vec![String::new(); choices.len() + 1];
    for (number, choice) in choices.rows() {
        items[number] = choice_label(choice);
    }
    items
}

/// The best match is highlighted when there is one.
pub fn default_item(choices: &ChoiceList) -> usize {
    if choices.is_empty() { ChoiceList::SKIP } else { 1 }
}

fn header_lines(candidate: &ScanCandidate) -> [String; 2] {
    let guess = match candidate.year {
        Some(year) => format!("Looks like: {} ({year})", candidate.title),
        None => format!("Looks like: {}", candidate.title),
    };
    [format!("File: {}", candidate.file_name()), guess]
}

fn choice_label(choice: Choice<'_>) -> String {
    match choice {
        Choice::Match(found) => {
            let extra = found
                .episode_title
                .as_deref()
                .map(|t| format!(" - {t}"))
                .unwrap_or_default();
            format!("{}{extra}  [{}, {}]", found.display_text(), found.kind, found.id)
        }
        Choice::Skip => "Skip this file".to_string(),
    }
}

/// Numbered table on a writer, answers read line by line. Used when stdin
/// is not a terminal.
///
/// `q` or end of input cancels the batch. Anything that is not a listed
/// number is asked again.
pub struct LinePresenter<R, W> {
    input: R,
    output: W,
    cancel: CancelToken,
}

impl LinePresenter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio(cancel: CancelToken) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), cancel)
    }
}

impl<R: BufRead, W: Write> LinePresenter<R, W> {
    pub fn new(input: R, output: W, cancel: CancelToken) -> Self {
        Self {
            input,
            output,
            cancel,
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn print_table(&mut self, candidate: &ScanCandidate, choices: &ChoiceList) -> io::Result<()> {
        writeln!(self.output)?;
        for line in header_lines(candidate) {
            writeln!(self.output, "{line}")?;
        }
        for (number, choice) in choices.rows() {
            writeln!(self.output, "  {number:>2}) {}", choice_label(choice))?;
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> Presenter for LinePresenter<R, W> {
    fn select(&mut self, candidate: &ScanCandidate, choices: &ChoiceList) -> io::Result<usize> {
        self.print_table(candidate, choices)?;

        loop {
            write!(self.output, "Select [0-{}, q to quit]: ", choices.len())?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                self.cancel.cancel();
                return Ok(ChoiceList::SKIP);
            }

            let answer = line.trim();
            if answer.eq_ignore_ascii_case("q") {
                self.cancel.cancel();
                return Ok(ChoiceList::SKIP);
            }
            match answer.parse::<usize>() {
                Ok(index) if choices.resolve(index).is_some() => return Ok(index),
                _ => writeln!(self.output, "✗ '{answer}' is not one of the listed numbers")?,
            }
        }
    }

    fn report(&mut self, result: &ExecutionResult) {
        let _ = writeln!(self.output, "{}", status_line(result));
    }
}

/// One-line outcome used by the presenters and the final summary.
pub fn status_line(result: &ExecutionResult) -> String {
    let plan = &result.plan;
    let from = file_name(&plan.source);
    let to = file_name(&plan.target);
    let note = if plan.adjusted { " (name was taken, suffixed)" } else { "" };
    match result.status {
        ExecutionStatus::Applied => format!("✓ {from} -> {to}{note}"),
        ExecutionStatus::DryRunReported => format!("→ {from} -> {to}{note} (dry run)"),
        ExecutionStatus::Skipped if plan.is_skip() => format!("ℹ Skipped {from}"),
        ExecutionStatus::Skipped => format!("ℹ No changes needed for {from}"),
        ExecutionStatus::Failed => match &result.error {
            Some(err) => format!("✗ {from}: {err}"),
            None => format!("✗ {from}"),
        },
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
