use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use super::models::{HistoryEntry, ProcessingStats, SelectionState};
use crate::ranker::{Choice, ChoiceList};
use crate::rename_engine::ExecutionStatus;
use crate::title_extractor::ScanCandidate;

/// Everything drawn for one prompt.
pub struct Screen<'a> {
    pub candidate: &'a ScanCandidate,
    pub choices: &'a ChoiceList,
    pub selection: &'a SelectionState,
    pub history: &'a [HistoryEntry],
    pub stats: ProcessingStats,
    pub dry_run: bool,
}

pub fn ui(f: &mut Frame, screen: &Screen<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(6),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, chunks[0], screen);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    render_choices(f, body[0], screen);
    render_history(f, body[1], screen);

    render_status_bar(f, chunks[2], screen);
}

fn render_header(f: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let mode = if screen.dry_run { "dry run" } else { "execute" };
    let guess = match screen.candidate.year {
        Some(year) => format!("{} ({year})", screen.candidate.title),
        None => screen.candidate.title.clone(),
    };

    let header = Paragraph::new(Text::from(vec![
        Line::from(Span::styled(
            screen.candidate.file_name(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Looks like: ", Style::default().fg(Color::Gray)),
            Span::raw(guess),
        ]),
    ]))
    .block(
        Block::default()
            .title(format!("DeeBee - {mode}"))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

fn render_choices(f: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let items: Vec<ListItem> = screen
        .choices
        .rows()
        .map(|(number, choice)| {
            let line = match choice {
                Choice::Match(found) => {
                    let mut spans = vec![
                        Span::styled(format!("{number:>2}) "), Style::default().fg(Color::Yellow)),
                        Span::styled(found.display_text(), Style::default().fg(Color::White)),
                    ];
                    if let Some(episode) = &found.episode_title {
                        spans.push(Span::raw(format!(" - {episode}")));
                    }
                    spans.push(Span::styled(
                        format!("  {} {}", found.kind, found.id),
                        Style::default().fg(Color::DarkGray),
                    ));
                    Line::from(spans)
                }
                Choice::Skip => Line::from(vec![
                    Span::styled(format!("{number:>2}) "), Style::default().fg(Color::Yellow)),
                    Span::styled("Skip this file", Style::default().fg(Color::Gray)),
                ]),
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title("Matches")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("► ");

    f.render_stateful_widget(list, area, &mut screen.selection.list_state.clone());
}

fn render_history(f: &mut Frame, area: Rect, screen: &Screen<'_>) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = screen.history.len().saturating_sub(visible);
    let lines: Vec<Line> = screen.history[skip..]
        .iter()
        .map(|entry| {
            let color = match entry.status {
                ExecutionStatus::Applied => Color::Green,
                ExecutionStatus::DryRunReported => Color::Yellow,
                ExecutionStatus::Skipped => Color::Gray,
                ExecutionStatus::Failed => Color::Red,
            };
            Line::from(Span::styled(entry.line.clone(), Style::default().fg(color)))
        })
        .collect();

    let stats = screen.stats;
    let history = Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .title(format!(
                    "Done {} | renamed {} | skipped {} | failed {}",
                    stats.processed, stats.renamed, stats.skipped, stats.failed
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(history, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, _screen: &Screen<'_>) {
    let controls = Paragraph::new("↑/↓ j/k move | Enter select | 1-9 jump | s/0 skip | q stop")
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    f.render_widget(controls, area);
}
