//! TUI module - Terminal dashboard with ratatui

use std::io::{stdout, Stdout};
use std::path::PathBuf;

use anyhow::Result;
use chrono::DateTime;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::error;

use crate::client::{ApiClient, FetchError, UploadError, UploadOutcome};
use crate::config::DashboardConfig;
use crate::controller::{DashboardController, LoadState};
use crate::dataset::ExerciseDataset;
use crate::render::{ChartSnapshot, RetainedCharts};
use crate::selection::ControlGroup;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Fetch result tagged with the session it belongs to
type FetchMessage = (u64, Result<ExerciseDataset, FetchError>);
type UploadMessage = (String, Result<UploadOutcome, UploadError>);

const SERIES_COLORS: &[Color] = &[
    Color::Cyan,
    Color::Yellow,
    Color::Magenta,
    Color::Green,
    Color::Red,
    Color::Blue,
    Color::LightCyan,
    Color::LightYellow,
];

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UploadField {
    User,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    Upload {
        field: UploadField,
        user: String,
        file: String,
    },
}

/// App state for TUI
pub struct App {
    dashboard: DashboardController<RetainedCharts>,
    client: ApiClient,
    mode: Mode,
    status: Option<String>,
    session: u64,
    fetch_tx: UnboundedSender<FetchMessage>,
    fetch_rx: UnboundedReceiver<FetchMessage>,
    upload_tx: UnboundedSender<UploadMessage>,
    upload_rx: UnboundedReceiver<UploadMessage>,
    should_quit: bool,
}

impl App {
    pub fn new(config: DashboardConfig) -> Self {
        let client = ApiClient::new(&config);
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let (upload_tx, upload_rx) = mpsc::unbounded_channel();
        Self {
            dashboard: DashboardController::new(config, RetainedCharts::new()),
            client,
            mode: Mode::Browse,
            status: None,
            session: 0,
            fetch_tx,
            fetch_rx,
            upload_tx,
            upload_rx,
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;
        self.reload();

        let result = self.event_loop(&mut terminal);
        restore_after(result, restore_terminal)
    }

    fn event_loop(&mut self, terminal: &mut Tui) -> Result<()> {
        while !self.should_quit {
            self.drain_messages();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    /// New session: drop the dataset and fetch it again
    fn reload(&mut self) {
        self.session += 1;
        self.dashboard.begin_load();

        let session = self.session;
        let client = self.client.clone();
        let tx = self.fetch_tx.clone();
        tokio::spawn(async move {
            let result = client.fetch_dataset().await;
            let _ = tx.send((session, result));
        });
    }

    fn start_upload(&mut self, user: String, file: String) {
        self.status = Some(format!("Uploading {} for {}...", file, user));

        let client = self.client.clone();
        let tx = self.upload_tx.clone();
        tokio::spawn(async move {
            let result = client.upload(&user, &PathBuf::from(file)).await;
            let _ = tx.send((user, result));
        });
    }

    fn drain_messages(&mut self) {
        while let Ok((session, result)) = self.fetch_rx.try_recv() {
            // A later reload superseded this fetch
            if session == self.session {
                self.dashboard.finish_load(result);
            }
        }

        while let Ok((user, result)) = self.upload_rx.try_recv() {
            self.status = Some(upload_status(&user, &result));
        }
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(10),
                Constraint::Length(4),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.render_body(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let selection = self.dashboard.selection();
        let mut lines = vec![control_line("Metric  ", selection.metric_group())];
        if let Some(grouping) = selection.grouping_group() {
            lines.push(control_line("Grouping", grouping));
        }

        let header = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" liftboard ", Style::default().fg(Color::Cyan).bold())),
        );
        frame.render_widget(header, area);
    }

    fn render_body(&self, frame: &mut Frame, area: Rect) {
        match self.dashboard.load_state() {
            LoadState::Loading => {
                let placeholder = Paragraph::new("Loading dataset...")
                    .style(Style::default().fg(Color::DarkGray))
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(placeholder, area);
            }
            LoadState::Failed(message) => {
                let text = format!("Could not load dataset: {}\n\nr: retry", message);
                let failed = Paragraph::new(text)
                    .style(Style::default().fg(Color::Red))
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::ALL));
                frame.render_widget(failed, area);
            }
            LoadState::Loaded(_) => {
                let charts: Vec<_> = self.dashboard.charts().live().collect();
                for (snapshot, cell) in charts.iter().zip(chart_grid(area, charts.len())) {
                    render_chart(frame, cell, snapshot);
                }
            }
        }
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let prompt = match &self.mode {
            Mode::Browse => {
                Line::from("q: quit | m/M: metric | g/G: grouping | r: reload | u: upload")
            }
            Mode::Upload { field, user, file } => {
                let style = |f: UploadField| {
                    if *field == f {
                        Style::default().fg(Color::Yellow).bold()
                    } else {
                        Style::default()
                    }
                };
                Line::from(vec![
                    Span::styled("user: ", style(UploadField::User)),
                    Span::raw(format!("{}  ", user)),
                    Span::styled("file: ", style(UploadField::File)),
                    Span::raw(format!("{}  ", file)),
                    Span::styled(
                        "(tab: switch, enter: send, esc: cancel)",
                        Style::default().fg(Color::DarkGray),
                    ),
                ])
            }
        };

        let status = Line::from(Span::styled(
            self.status.clone().unwrap_or_default(),
            Style::default().fg(Color::DarkGray),
        ));

        let footer =
            Paragraph::new(vec![prompt, status]).block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, area);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match &mut self.mode {
            Mode::Browse => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
                KeyCode::Char('m') | KeyCode::Right => {
                    self.dashboard.cycle_metric(true);
                }
                KeyCode::Char('M') | KeyCode::Left => {
                    self.dashboard.cycle_metric(false);
                }
                KeyCode::Char('g') | KeyCode::Down => {
                    self.dashboard.cycle_grouping(true);
                }
                KeyCode::Char('G') | KeyCode::Up => {
                    self.dashboard.cycle_grouping(false);
                }
                KeyCode::Char('r') => self.reload(),
                KeyCode::Char('u') => {
                    self.mode = Mode::Upload {
                        field: UploadField::User,
                        user: String::new(),
                        file: String::new(),
                    };
                }
                _ => {}
            },
            Mode::Upload { field, user, file } => {
                let focused = match *field {
                    UploadField::User => &mut *user,
                    UploadField::File => &mut *file,
                };
                match key.code {
                    KeyCode::Esc => self.mode = Mode::Browse,
                    KeyCode::Tab => {
                        *field = match *field {
                            UploadField::User => UploadField::File,
                            UploadField::File => UploadField::User,
                        };
                    }
                    KeyCode::Enter if *field == UploadField::User => *field = UploadField::File,
                    KeyCode::Enter => {
                        let (user, file) = (user.clone(), file.clone());
                        self.mode = Mode::Browse;
                        self.start_upload(user, file);
                    }
                    KeyCode::Backspace => {
                        focused.pop();
                    }
                    KeyCode::Char(c) => focused.push(c),
                    _ => {}
                }
            }
        }
    }
}

fn upload_status(user: &str, result: &Result<UploadOutcome, UploadError>) -> String {
    match result {
        Ok(outcome) => format!(
            "Upload for {}: {} {}",
            user,
            outcome.status,
            outcome.verdict.describe()
        ),
        Err(e) => {
            error!("Upload for {} failed: {}", user, e);
            format!("Upload for {} failed: {}", user, e)
        }
    }
}

/// One line of selectable controls, the active one highlighted
fn control_line<'a>(label: &'a str, group: &'a ControlGroup) -> Line<'a> {
    let mut spans = vec![Span::styled(
        format!(" {} ", label),
        Style::default().fg(Color::DarkGray),
    )];
    for (i, control) in group.controls().iter().enumerate() {
        let style = if group.is_active(i) {
            Style::default().fg(Color::Black).bg(Color::Cyan).bold()
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(format!(" {} ", control.label), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Two-column grid with one cell per chart
fn chart_grid(area: Rect, count: usize) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let rows = count.div_ceil(2);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);

    let mut cells = Vec::with_capacity(count);
    for (row, row_area) in row_areas.iter().enumerate() {
        let columns = (count - row * 2).min(2);
        let column_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);
        cells.extend(column_areas.iter().copied());
    }
    cells
}

fn date_label(epoch_secs: f64) -> String {
    DateTime::from_timestamp(epoch_secs as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Bounds that never collapse to a single value
fn padded_bounds(snapshot: &ChartSnapshot) -> Option<(f64, f64, f64, f64)> {
    let (mut x0, mut x1, mut y0, mut y1) = snapshot.bounds()?;
    if x1 - x0 < 1.0 {
        x0 -= SECONDS_PER_DAY;
        x1 += SECONDS_PER_DAY;
    }
    let pad = ((y1 - y0) * 0.05).max(1.0);
    y0 = (y0 - pad).max(0.0);
    y1 += pad;
    Some((x0, x1, y0, y1))
}

fn render_chart(frame: &mut Frame, area: Rect, snapshot: &ChartSnapshot) {
    let title = format!(" {} ", snapshot.axis.title);
    let block = Block::default().borders(Borders::ALL).title(title);

    let Some((x0, x1, y0, y1)) = padded_bounds(snapshot) else {
        let placeholder = Paragraph::new("No data")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    };

    let plot = snapshot.plot_data();
    let datasets: Vec<Dataset> = plot
        .iter()
        .enumerate()
        .map(|(i, (label, points))| {
            Dataset::default()
                .name(label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(SERIES_COLORS[i % SERIES_COLORS.len()]))
                .data(points)
        })
        .collect();

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::DarkGray))
        .bounds([x0, x1])
        .labels(vec![
            Span::from(date_label(x0)),
            Span::from(date_label((x0 + x1) / 2.0)),
            Span::from(date_label(x1)),
        ]);
    let y_axis = Axis::default()
        .title(Span::styled(snapshot.axis.y_key.clone(), Style::default().fg(Color::DarkGray)))
        .style(Style::default().fg(Color::DarkGray))
        .bounds([y0, y1])
        .labels(vec![
            Span::from(format!("{:.0}", y0)),
            Span::from(format!("{:.0}", (y0 + y1) / 2.0)),
            Span::from(format!("{:.0}", y1)),
        ]);

    let mut chart = Chart::new(datasets).block(block).x_axis(x_axis).y_axis(y_axis);
    if snapshot.axis.legend {
        chart = chart
            .legend_position(Some(ratatui::widgets::LegendPosition::TopLeft))
            .hidden_legend_constraints((Constraint::Ratio(1, 1), Constraint::Ratio(1, 1)));
    } else {
        chart = chart.legend_position(None);
    }
    frame.render_widget(chart, area);
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run `restore` whatever `result` holds. An error in `result` wins over one
/// from `restore`.
fn restore_after<T>(result: Result<T>, restore: impl FnOnce() -> Result<()>) -> Result<T> {
    let restored = restore();
    let value = result?;
    restored?;
    Ok(value)
}
