use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

/// Sidebar width when only icons are shown (borders included).
pub const COLLAPSED_WIDTH: u16 = 5;
pub const EXPANDED_WIDTH: u16 = 24;

pub struct NavEntry {
    pub icon: &'static str,
    pub label: &'static str,
    /// Table whose row count is shown for this entry.
    pub table: &'static str,
}

pub static NAV_ENTRIES: [NavEntry; 4] = [
    NavEntry { icon: "J", label: "Scraped jobs", table: "scraped_jobs" },
    NavEntry { icon: "S", label: "Saved jobs", table: "saved_jobs" },
    NavEntry { icon: "L", label: "Cover letters", table: "generated_cover_letters" },
    NavEntry { icon: "I", label: "Interviews", table: "interview_sessions" },
];

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SidebarState {
    pub collapsed: bool,
    pub selected: usize,
}

impl SidebarState {
    pub fn toggle(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn width(&self) -> u16 {
        if self.collapsed {
            COLLAPSED_WIDTH
        } else {
            EXPANDED_WIDTH
        }
    }

    /// Glyph of the header trigger: points the way the sidebar will move.
    pub fn trigger(&self) -> &'static str {
        if self.collapsed { "»" } else { "«" }
    }

    fn next(&mut self) {
        if self.selected < NAV_ENTRIES.len() - 1 {
            self.selected += 1;
        }
    }

    fn prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn current(&self) -> &'static NavEntry {
        &NAV_ENTRIES[self.selected.min(NAV_ENTRIES.len() - 1)]
    }
}

struct AppState {
    sidebar: SidebarState,
    counts: Vec<(&'static str, i64)>,
}

impl AppState {
    fn new(counts: Vec<(&'static str, i64)>) -> Self {
        Self {
            sidebar: SidebarState::default(),
            counts,
        }
    }

    fn count_for(&self, table: &str) -> Option<i64> {
        self.counts.iter().find(|(t, _)| *t == table).map(|(_, n)| *n)
    }

    /// Applies a key press; returns false when the shell should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('b') | KeyCode::Tab => self.sidebar.toggle(),
            KeyCode::Down | KeyCode::Char('j') => self.sidebar.next(),
            KeyCode::Up | KeyCode::Char('k') => self.sidebar.prev(),
            _ => {}
        }
        true
    }
}

/// Opens the sidebar shell. `counts` are per-table row counts shown in the
/// main panel; the shell itself never touches the database.
pub fn run_shell(counts: Vec<(&'static str, i64)>) -> Result<()> {
    let mut state = AppState::new(counts);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !state.handle_key(key.code) {
                break;
            }
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(state.sidebar.width()), Constraint::Min(0)])
        .split(rows[0]);

    draw_sidebar(frame, &state.sidebar, chunks[0]);

    // Main panel
    let entry = state.sidebar.current();
    let detail = build_detail(entry, state.count_for(entry.table));
    let panel = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", entry.label)))
        .wrap(Wrap { trim: false });
    frame.render_widget(panel, chunks[1]);

    // Footer help
    let help = Paragraph::new(" b/Tab:toggle sidebar  j/k:navigate  q:quit")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[1]);
}

fn draw_sidebar(frame: &mut Frame, sidebar: &SidebarState, area: Rect) {
    let block = Block::default().borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(inner);

    // Header: trigger plus an empty title slot
    let header = Line::from(vec![
        Span::styled(sidebar.trigger(), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::raw(""),
    ]);
    frame.render_widget(Paragraph::new(header), parts[0]);

    let items: Vec<ListItem> = NAV_ENTRIES
        .iter()
        .map(|entry| {
            if sidebar.collapsed {
                ListItem::new(format!(" {}", entry.icon))
            } else {
                ListItem::new(format!(" {}  {}", entry.icon, entry.label))
            }
        })
        .collect();

    let list = List::new(items)
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let mut list_state = ListState::default();
    list_state.select(Some(sidebar.selected));
    frame.render_stateful_widget(list, parts[1], &mut list_state);
}

fn build_detail(entry: &NavEntry, count: Option<i64>) -> Text<'static> {
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(Span::styled(
        entry.label,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(""));

    match count {
        Some(n) => lines.push(Line::from(format!("{} rows in {}", n, entry.table))),
        None => lines.push(Line::from(Span::styled(
            format!("({} not available)", entry.table),
            Style::default().fg(Color::DarkGray),
        ))),
    }

    Text::from(lines)
}
