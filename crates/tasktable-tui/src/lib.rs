// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use log::{debug, info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tasktable_app::{
    AppCommand, AppEvent, AppState, DetailEditor, FieldEdit, StatusFilter, TaskColumn, TaskRow,
};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
pub const DEFAULT_DOUBLE_CLICK: Duration = Duration::from_millis(400);

/// Storage seam for the event loop. `None` means every row.
pub trait AppRuntime {
    fn load_rows(&mut self, filter: Option<StatusFilter>) -> Result<Vec<TaskRow>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuiOptions {
    /// Longest gap between two clicks on the same row that still counts as a
    /// double-click.
    pub double_click: Duration,
    /// Filter applied to the first query. `None` shows every row.
    pub initial_filter: Option<StatusFilter>,
}

impl Default for TuiOptions {
    fn default() -> Self {
        Self {
            double_click: DEFAULT_DOUBLE_CLICK,
            initial_filter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClickRecord {
    row: usize,
    at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
struct ViewData {
    selected_row: usize,
    scroll_offset: usize,
    last_click: Option<ClickRecord>,
    double_click: Duration,
    status_token: u64,
    screen: Rect,
    rows_loaded: bool,
}

impl ViewData {
    fn new(options: TuiOptions) -> Self {
        Self {
            selected_row: 0,
            scroll_offset: 0,
            last_click: None,
            double_click: options.double_click,
            status_token: 0,
            screen: Rect::default(),
            rows_loaded: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenLayout {
    buttons: [Rect; 3],
    table: Rect,
    status: Rect,
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: TuiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(error) = execute!(stdout, terminal::EnterAlternateScreen, EnableMouseCapture) {
        let _ = disable_raw_mode();
        return Err(error).context("enter alternate screen");
    }

    let result = event_loop(state, runtime, options, stdout);
    let restored = restore_terminal();
    result.and(restored)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(
        io::stdout(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )
    .context("leave alternate screen")
}

fn event_loop<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: TuiOptions,
    stdout: io::Stdout,
) -> Result<()> {
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    refresh_rows(
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        options.initial_filter,
    );

    loop {
        process_internal_events(state, &mut view_data, &internal_rx);

        terminal
            .draw(|frame| {
                view_data.screen = frame.area();
                sync_selection(state, &mut view_data);
                render(frame, state, &view_data);
            })
            .context("draw frame")?;

        if !event::poll(POLL_INTERVAL).context("poll event")? {
            continue;
        }
        let quit = match event::read().context("read event")? {
            Event::Key(key) => handle_key_event(state, runtime, &mut view_data, &internal_tx, key),
            Event::Mouse(mouse) => {
                handle_mouse_event(
                    state,
                    runtime,
                    &mut view_data,
                    &internal_tx,
                    mouse,
                    Instant::now(),
                );
                false
            }
            _ => false,
        };
        if quit {
            info!("quit requested");
            return Ok(());
        }
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &mut ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if state.editor.is_open() {
        handle_editor_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    let page = body_capacity(view_data.screen).max(1) as isize;
    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                AppCommand::ToggleStatusColumn,
                internal_tx,
            );
        }
        (KeyCode::Enter, _) => {
            let row = view_data.selected_row;
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                AppCommand::ActivateRow(row),
                internal_tx,
            );
        }
        (KeyCode::Down | KeyCode::Char('j'), KeyModifiers::NONE) => {
            move_selection(state, view_data, 1);
        }
        (KeyCode::Up | KeyCode::Char('k'), KeyModifiers::NONE) => {
            move_selection(state, view_data, -1);
        }
        (KeyCode::PageDown, _) => move_selection(state, view_data, page),
        (KeyCode::PageUp, _) => move_selection(state, view_data, -page),
        (KeyCode::Home | KeyCode::Char('g'), KeyModifiers::NONE) => {
            move_selection(state, view_data, isize::MIN);
        }
        (KeyCode::End, _) | (KeyCode::Char('G'), _) => {
            move_selection(state, view_data, isize::MAX);
        }
        (KeyCode::Char(ch), KeyModifiers::NONE) => {
            if let Some(filter) = StatusFilter::from_shortcut(ch) {
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    AppCommand::Filter(filter),
                    internal_tx,
                );
            }
        }
        _ => {}
    }
    false
}

// The editor is modal: nothing reaches the main window while it is open.
fn handle_editor_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let command = match (key.code, key.modifiers) {
        (KeyCode::Esc, _) => AppCommand::DismissEdit,
        (KeyCode::Enter, _) => AppCommand::ConfirmEdit,
        (KeyCode::Tab | KeyCode::Down, _) => AppCommand::EditField(FieldEdit::NextField),
        (KeyCode::BackTab | KeyCode::Up, _) => AppCommand::EditField(FieldEdit::PrevField),
        (KeyCode::Char('u'), KeyModifiers::CONTROL) => AppCommand::EditField(FieldEdit::Clear),
        (KeyCode::Backspace, _) => AppCommand::EditField(FieldEdit::Backspace),
        (KeyCode::Delete, _) => AppCommand::EditField(FieldEdit::Delete),
        (KeyCode::Left, _) => AppCommand::EditField(FieldEdit::CursorLeft),
        (KeyCode::Right, _) => AppCommand::EditField(FieldEdit::CursorRight),
        (KeyCode::Home, _) => AppCommand::EditField(FieldEdit::CursorHome),
        (KeyCode::End, _) => AppCommand::EditField(FieldEdit::CursorEnd),
        (KeyCode::Char(ch), modifiers)
            if !modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            AppCommand::EditField(FieldEdit::Insert(ch))
        }
        _ => return,
    };
    dispatch_and_refresh(state, runtime, view_data, command, internal_tx);
}

fn handle_mouse_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    mouse: MouseEvent,
    now: Instant,
) {
    if state.editor.is_open() {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => move_selection(state, view_data, 1),
        MouseEventKind::ScrollUp => move_selection(state, view_data, -1),
        MouseEventKind::Down(MouseButton::Left) => {
            let layout = screen_layout(view_data.screen);
            let position = Position::new(mouse.column, mouse.row);

            if let Some(filter) = button_at(&layout, position) {
                view_data.last_click = None;
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    AppCommand::Filter(filter),
                    internal_tx,
                );
                return;
            }

            let Some(row) = row_at(layout.table, view_data.scroll_offset, position)
                .filter(|row| *row < state.grid.row_count())
            else {
                view_data.last_click = None;
                return;
            };

            view_data.selected_row = row;
            let double = view_data.last_click.is_some_and(|click| {
                click.row == row && now.saturating_duration_since(click.at) <= view_data.double_click
            });
            if double {
                debug!("double-click on row {row}");
                view_data.last_click = None;
                dispatch_and_refresh(
                    state,
                    runtime,
                    view_data,
                    AppCommand::ActivateRow(row),
                    internal_tx,
                );
            } else {
                view_data.last_click = Some(ClickRecord { row, at: now });
            }
        }
        _ => {}
    }
}

fn move_selection(state: &AppState, view_data: &mut ViewData, delta: isize) {
    let count = state.grid.row_count();
    view_data.selected_row = view_data
        .selected_row
        .saturating_add_signed(delta)
        .min(count.saturating_sub(1));
    sync_selection(state, view_data);
}

/// Clamps the cursor to the rendered rows and scrolls it into view.
fn sync_selection(state: &AppState, view_data: &mut ViewData) {
    let count = state.grid.row_count();
    view_data.selected_row = view_data.selected_row.min(count.saturating_sub(1));

    let capacity = body_capacity(view_data.screen).max(1);
    if view_data.selected_row < view_data.scroll_offset {
        view_data.scroll_offset = view_data.selected_row;
    } else if view_data.selected_row >= view_data.scroll_offset + capacity {
        view_data.scroll_offset = view_data.selected_row + 1 - capacity;
    }
}

fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    command: AppCommand,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(command);
    for event in &events {
        match event {
            AppEvent::FilterRequested(filter) => {
                refresh_rows(state, runtime, view_data, internal_tx, Some(*filter));
            }
            AppEvent::RowsRendered { .. } => {
                view_data.rows_loaded = true;
                view_data.selected_row = 0;
                view_data.scroll_offset = 0;
                view_data.last_click = None;
            }
            _ => {}
        }
    }
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(internal_tx, view_data.status_token);
    }
}

// A failed query leaves the previous rows, if any, on screen.
fn refresh_rows<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    filter: Option<StatusFilter>,
) {
    match runtime.load_rows(filter) {
        Ok(rows) => {
            info!(
                "showing {} rows for filter {}",
                rows.len(),
                filter.map_or("all", StatusFilter::as_str)
            );
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                AppCommand::ShowRows { filter, rows },
                internal_tx,
            );
        }
        Err(error) => {
            warn!("loading rows failed: {error:#}");
            let message = if view_data.rows_loaded {
                format!("load failed: {error}; showing previous rows")
            } else {
                format!("load failed: {error}; no rows loaded")
            };
            emit_status(state, view_data, internal_tx, message);
        }
    }
}

fn screen_layout(area: Rect) -> ScreenLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(area);
    let buttons = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(rows[0]);

    ScreenLayout {
        buttons: [buttons[0], buttons[1], buttons[2]],
        table: rows[1],
        status: rows[2],
    }
}

// Inside the border, below the header row.
fn table_body(table: Rect) -> Rect {
    Rect {
        x: table.x.saturating_add(1),
        y: table.y.saturating_add(2),
        width: table.width.saturating_sub(2),
        height: table.height.saturating_sub(3),
    }
}

fn body_capacity(screen: Rect) -> usize {
    usize::from(table_body(screen_layout(screen).table).height)
}

fn button_at(layout: &ScreenLayout, position: Position) -> Option<StatusFilter> {
    StatusFilter::ALL
        .into_iter()
        .zip(layout.buttons)
        .find(|(_, area)| area.contains(position))
        .map(|(filter, _)| filter)
}

fn row_at(table: Rect, scroll_offset: usize, position: Position) -> Option<usize> {
    let body = table_body(table);
    if !body.contains(position) {
        return None;
    }
    Some(scroll_offset + usize::from(position.y - body.y))
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = screen_layout(frame.area());

    for (filter, area) in StatusFilter::ALL.into_iter().zip(layout.buttons) {
        let style = if state.active_filter == Some(filter) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let button = Paragraph::new(button_label(filter))
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(button, area);
    }

    render_table(frame, layout.table, state, view_data);

    let status_widget = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout.status);

    if state.editor.is_open() {
        let area = centered_rect(70, 60, frame.area());
        frame.render_widget(Clear, area);
        let title = state
            .editor
            .row_id()
            .map_or_else(|| "edit task".to_owned(), |id| format!("edit task {id}"));
        let editor = Paragraph::new(editor_text(&state.editor)).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(editor, area);
        if let Some(position) = editor_cursor(&state.editor, area) {
            frame.set_cursor_position(position);
        }
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &AppState,
    view_data: &ViewData,
) {
    let visible_columns = state.grid.visible_columns();
    let widths = vec![Constraint::Min(8); visible_columns.len().max(1)];

    let header_cells = visible_columns.iter().map(|index| {
        let label = TaskColumn::ALL
            .get(*index)
            .map_or("", |column| column.label());
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells);

    let capacity = usize::from(table_body(area).height);
    let rows = (view_data.scroll_offset..state.grid.row_count())
        .take(capacity)
        .map(|row_index| {
            let style = if row_index == view_data.selected_row {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(state.grid.visible_cells(row_index)).style(style)
        });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(state))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn button_label(filter: StatusFilter) -> String {
    format!("[{}] {}", filter.shortcut(), filter.as_str())
}

fn table_title(state: &AppState) -> String {
    let label = state.active_filter.map_or("all", StatusFilter::as_str);
    format!("tasks: {label} ({})", state.grid.row_count())
}

fn status_text(state: &AppState) -> String {
    match &state.status_line {
        Some(message) => message.clone(),
        None => "1/2/3 filter  enter/double-click edit  s status column  q quit".to_owned(),
    }
}

const EDITOR_HINT: &str = "enter apply  esc cancel  tab next field  ctrl+u clear";

fn editor_label_width(editor: &DetailEditor) -> usize {
    editor
        .inputs()
        .iter()
        .map(|input| input.label.chars().count())
        .max()
        .unwrap_or(0)
}

fn editor_text(editor: &DetailEditor) -> String {
    let width = editor_label_width(editor);
    let mut lines = editor
        .inputs()
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let marker = if index == editor.focus() { '>' } else { ' ' };
            format!("{marker} {:<width$}  {}", input.label, input.text)
        })
        .collect::<Vec<_>>();
    lines.push(String::new());
    lines.push(EDITOR_HINT.to_owned());
    lines.join("\n")
}

fn editor_cursor(editor: &DetailEditor, area: Rect) -> Option<Position> {
    let input = editor.focused_input()?;
    // marker, space, padded label, two spaces
    let offset = 2 + editor_label_width(editor) + 2 + input.cursor;
    let x = area.x.checked_add(1)?.checked_add(u16::try_from(offset).ok()?)?;
    let y = area
        .y
        .checked_add(1)?
        .checked_add(u16::try_from(editor.focus()).ok()?)?;
    if x >= area.right().saturating_sub(1) || y >= area.bottom().saturating_sub(1) {
        return None;
    }
    Some(Position::new(x, y))
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
