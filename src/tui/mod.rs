//! Terminal UI for roomplan using ratatui
//!
//! Shows one floor at a time on a braille canvas, with the legend and
//! status line below. Room polygons are drawn and edited with the mouse.

use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Context, Line as CanvasLine, Points, Rectangle},
        Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs, Wrap,
    },
    Frame, Terminal,
};
use std::io;
use tracing::debug;

use crate::app::{App, ClickOutcome};
use crate::editor::{Field, RoomForm};
use crate::models::{floor_name, StatusColors, FLOOR_COUNT};
use crate::scene::{polygon_contains, Background, Point, Rgba, RoomId};
use crate::session::HANDLE_SIZE;
use crate::viewport::{Viewport, WHEEL_STEP, ZOOM_IN, ZOOM_OUT};

/// Terminal cells are about twice as tall as wide
const CELL_ASPECT: f64 = 2.0;
/// Braille dot pitch in view units
const FILL_STEP: f64 = 0.5;
/// Arrow key pan step in view units
const PAN_STEP: f64 = 4.0;

pub const INSTRUCTIONS: &str = "\
Floors: keys 0-5 switch between the basement and floors 1-5.
View: + / - zoom in and out, mouse wheel zooms (not while drawing), f fits the plan, arrows pan.
Plan: u loads a PNG, JPG or BMP floor plan for the current floor.

Adding a room: press a, then left click to place each corner.
Every left click adds a corner, even on top of a marker. Drag a corner marker to move it.
Tab selects the next corner; Backspace or Delete removes the selected corner.
Right click (or Enter) finishes, at least 3 corners are needed. Esc cancels.

Editing a shape: right click a room, then adjust its corners the same way.
Room details: left click a room to edit its number, tenant, dates and status.
Statuses: s opens the status list, where colors can be added, changed or removed.
Report: r shows occupancy for every floor. q quits.";

/// Main TUI application state
pub struct TuiApp {
    app: App,
    viewport: Viewport,
    /// Inner canvas area from the last draw, for mouse mapping
    canvas_area: Rect,
    needs_fit: bool,
    popup: Popup,
    should_quit: bool,
}

enum Popup {
    None,
    Room(RoomDialog),
    Palette(PaletteDialog),
    Report(u16),
    Help,
    Upload(String),
}

struct RoomDialog {
    id: RoomId,
    form: RoomForm,
    field: usize,
    /// Ctrl+X pressed, waiting for y/n
    confirm_clear: bool,
}

impl RoomDialog {
    fn field(&self) -> Field {
        Field::ALL[self.field]
    }
}

struct PaletteDialog {
    list_state: ListState,
    edit: Option<StatusInput>,
}

/// Add/edit form inside the palette popup
struct StatusInput {
    /// Status being edited; `None` when adding
    original: Option<String>,
    values: [String; 3],
    field: usize,
}

const STATUS_INPUT_LABELS: [&str; 3] = ["Name", "Background (#AARRGGBB)", "Text (#RRGGBB)"];

impl StatusInput {
    fn colors(&self) -> StatusColors {
        StatusColors::new(self.values[1].trim(), self.values[2].trim())
    }
}

impl TuiApp {
    pub fn new(app: App) -> Self {
        Self {
            app,
            viewport: Viewport::new(0.0, 0.0),
            canvas_area: Rect::default(),
            needs_fit: true,
            popup: Popup::None,
            should_quit: false,
        }
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        install_restore_hook(|| {
            let _ = restore_terminal();
        });

        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_app(&mut terminal);

        // Restore terminal
        restore_terminal()?;
        terminal.show_cursor()?;

        res
    }

    fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| self.ui(f))?;

            if event::poll(std::time::Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }

            if self.should_quit {
                break;
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }
        match self.popup {
            Popup::None => self.handle_main_key(key),
            Popup::Room(_) => self.handle_room_key(key),
            Popup::Palette(_) => self.handle_palette_key(key),
            Popup::Upload(_) => self.handle_upload_key(key),
            Popup::Report(_) | Popup::Help => self.handle_text_key(key),
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(c @ '0'..='9') => {
                let index = c as usize - '0' as usize;
                if index < FLOOR_COUNT {
                    self.app.load_floor(index);
                    self.needs_fit = true;
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.viewport.zoom(ZOOM_IN),
            KeyCode::Char('-') => self.viewport.zoom(ZOOM_OUT),
            KeyCode::Char('f') => self.needs_fit = true,
            KeyCode::Left => self.viewport.pan(PAN_STEP, 0.0),
            KeyCode::Right => self.viewport.pan(-PAN_STEP, 0.0),
            KeyCode::Up => self.viewport.pan(0.0, PAN_STEP),
            KeyCode::Down => self.viewport.pan(0.0, -PAN_STEP),
            KeyCode::Char('a') => {
                self.app.guard("starting a room", |app| app.start_add_room());
            }
            KeyCode::Char('u') => self.popup = Popup::Upload(String::new()),
            KeyCode::Char('s') => {
                let mut list_state = ListState::default();
                if !self.app.data().statuses.is_empty() {
                    list_state.select(Some(0));
                }
                self.popup = Popup::Palette(PaletteDialog { list_state, edit: None });
            }
            KeyCode::Char('h') => self.popup = Popup::Help,
            KeyCode::Char('r') => self.popup = Popup::Report(0),
            KeyCode::Tab if self.app.session().is_drawing() => {
                self.app.guard("selecting a point", |app| app.select_next_vertex());
            }
            KeyCode::Backspace | KeyCode::Delete if self.app.session().is_drawing() => {
                self.app.guard("deleting a point", |app| app.delete_selected_vertex());
            }
            KeyCode::Enter if self.app.session().is_drawing() => {
                self.app.guard("finishing the polygon", |app| app.finish_drawing());
            }
            KeyCode::Esc => self.app.abort_drawing(),
            _ => {}
        }
    }

    fn handle_room_key(&mut self, key: KeyEvent) {
        let Popup::Room(dialog) = &mut self.popup else {
            return;
        };
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let mut close = false;
        if dialog.confirm_clear {
            dialog.confirm_clear = false;
            if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y')) {
                let id = dialog.id;
                close = self.app.guard("clearing the room", |app| app.clear_room(id)).is_some();
            } else {
                self.app.set_status("Clearing cancelled.");
            }
            if close {
                self.popup = Popup::None;
            }
            return;
        }
        match key.code {
            KeyCode::Esc => close = true,
            KeyCode::Char('x') if ctrl => {
                dialog.confirm_clear = true;
                self.app.set_status(format!(
                    "Вы уверены, что хотите очистить данные кабинета {}? (y/n)",
                    dialog.form.number
                ));
            }
            KeyCode::Char('d') if ctrl => {
                let id = dialog.id;
                close = self.app.guard("deleting the room", |app| app.delete_room(id)).is_some();
            }
            KeyCode::Enter => {
                let id = dialog.id;
                let form = dialog.form.clone();
                close = self.app.guard("saving the room", |app| app.save_room(id, &form)).is_some();
            }
            KeyCode::Down | KeyCode::Tab => dialog.field = (dialog.field + 1) % Field::ALL.len(),
            KeyCode::Up | KeyCode::BackTab => {
                dialog.field = (dialog.field + Field::ALL.len() - 1) % Field::ALL.len()
            }
            KeyCode::Left | KeyCode::Right => {
                let field = dialog.field();
                dialog.form.cycle(field, &self.app.data().statuses, key.code == KeyCode::Right);
            }
            KeyCode::Backspace => {
                let field = dialog.field();
                dialog.form.pop_char(field);
            }
            KeyCode::Char(c) => {
                let field = dialog.field();
                dialog.form.push_char(field, c);
            }
            _ => {}
        }
        if close {
            self.popup = Popup::None;
        }
    }

    fn handle_palette_key(&mut self, key: KeyEvent) {
        let Popup::Palette(dialog) = &mut self.popup else {
            return;
        };
        let names: Vec<String> = self.app.data().statuses.names().map(str::to_string).collect();

        if let Some(input) = &mut dialog.edit {
            match key.code {
                KeyCode::Esc => dialog.edit = None,
                KeyCode::Tab | KeyCode::Down => input.field = (input.field + 1) % input.values.len(),
                KeyCode::BackTab | KeyCode::Up => {
                    input.field = (input.field + input.values.len() - 1) % input.values.len()
                }
                KeyCode::Backspace => {
                    input.values[input.field].pop();
                }
                KeyCode::Char(c) => input.values[input.field].push(c),
                KeyCode::Enter => {
                    let name = input.values[0].clone();
                    let colors = input.colors();
                    let done = match &input.original {
                        None => self.app.guard("adding a status", |app| app.add_status(&name, colors)),
                        Some(old) => {
                            let old = old.clone();
                            self.app.guard("changing a status", |app| app.rename_status(&old, &name, colors))
                        }
                    };
                    if done.is_some() {
                        dialog.edit = None;
                        dialog.list_state.select(Some(0));
                    }
                }
                _ => {}
            }
            return;
        }

        let selected = dialog.list_state.selected().and_then(|i| names.get(i).cloned());
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.popup = Popup::None,
            KeyCode::Down | KeyCode::Char('j') => select_step(&mut dialog.list_state, names.len(), true),
            KeyCode::Up | KeyCode::Char('k') => select_step(&mut dialog.list_state, names.len(), false),
            KeyCode::Char('a') => {
                dialog.edit = Some(StatusInput {
                    original: None,
                    values: [String::new(), "#B3".to_string(), "#000000".to_string()],
                    field: 0,
                });
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(name) = selected {
                    let colors = self.app.data().statuses.resolve(&name);
                    dialog.edit = Some(StatusInput {
                        original: Some(name.clone()),
                        values: [name, colors.bg, colors.text],
                        field: 0,
                    });
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(name) = selected {
                    if self.app.guard("removing a status", |app| app.remove_status(&name)).is_some() {
                        let len = names.len().saturating_sub(1);
                        dialog.list_state.select(if len == 0 { None } else { Some(0) });
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_upload_key(&mut self, key: KeyEvent) {
        let Popup::Upload(input) = &mut self.popup else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.popup = Popup::None,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => input.push(c),
            KeyCode::Enter => {
                let path = input.clone();
                if self.app.guard("loading the plan", |app| app.upload_plan(&path)).is_some() {
                    self.popup = Popup::None;
                    self.needs_fit = true;
                }
            }
            _ => {}
        }
    }

    fn handle_text_key(&mut self, key: KeyEvent) {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('h') | KeyCode::Char('r')
        ) {
            self.popup = Popup::None;
            return;
        }
        if let Popup::Report(scroll) = &mut self.popup {
            match key.code {
                KeyCode::Down | KeyCode::Char('j') => *scroll = scroll.saturating_add(1),
                KeyCode::Up | KeyCode::Char('k') => *scroll = scroll.saturating_sub(1),
                _ => {}
            }
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if !matches!(self.popup, Popup::None) {
            return;
        }
        let Some((vx, vy)) = self.view_point(mouse.column, mouse.row) else {
            return;
        };
        let p = self.viewport.view_to_scene(vx, vy);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(ClickOutcome::OpenRoom(id)) = self.app.guard("handling a click", |app| app.left_click(p)) {
                    self.open_room(id);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.app.guard("moving a point", |app| app.drag(p));
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.app.guard("moving a point", |app| app.release(p));
            }
            MouseEventKind::Down(MouseButton::Right) => {
                self.app.guard("handling a click", |app| app.right_click(p));
            }
            MouseEventKind::ScrollUp if self.app.session().is_idle() => self.viewport.zoom_at(WHEEL_STEP, (vx, vy)),
            MouseEventKind::ScrollDown if self.app.session().is_idle() => {
                self.viewport.zoom_at(1.0 / WHEEL_STEP, (vx, vy))
            }
            _ => {}
        }
    }

    fn open_room(&mut self, id: RoomId) {
        if let Some(form) = self.app.guard("opening the room", |app| app.room_form(id)) {
            debug!("Opening editor for room {}", id);
            self.popup = Popup::Room(RoomDialog {
                id,
                form,
                field: 0,
                confirm_clear: false,
            });
        }
    }

    /// Terminal cell → view coordinates, if inside the canvas
    fn view_point(&self, column: u16, row: u16) -> Option<(f64, f64)> {
        let area = self.canvas_area;
        if column < area.x || row < area.y || column >= area.x + area.width || row >= area.y + area.height {
            return None;
        }
        Some((
            (column - area.x) as f64 + 0.5,
            ((row - area.y) as f64 + 0.5) * CELL_ASPECT,
        ))
    }

    /// Draw the UI
    fn ui(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Floor tabs
                Constraint::Min(0),    // Canvas
                Constraint::Length(3), // Legend
                Constraint::Length(3), // Status line
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_canvas(f, chunks[1]);
        self.render_legend(f, chunks[2]);
        self.render_footer(f, chunks[3]);

        match &self.popup {
            Popup::None => {}
            Popup::Room(dialog) => self.render_room_popup(f, dialog),
            Popup::Palette(dialog) => self.render_palette_popup(f, dialog),
            Popup::Report(scroll) => {
                let text = self.app.report().render();
                render_text_popup(f, "Room report", &text, *scroll)
            }
            Popup::Help => render_text_popup(f, "Instructions", INSTRUCTIONS, 0),
            Popup::Upload(input) => self.render_upload_popup(f, input),
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let titles: Vec<Line> = (0..FLOOR_COUNT)
            .map(|i| Line::from(format!("{} {}", i, floor_name(&i.to_string()))))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Roomplan"))
            .select(self.app.current_floor())
            .style(Style::default().fg(Color::White))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        f.render_widget(tabs, area);
    }

    fn render_canvas(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(canvas_title(&self.app.scene().background, self.app.session().is_drawing()));
        let inner = block.inner(area);
        self.canvas_area = inner;
        self.viewport.resize(inner.width as f64, inner.height as f64 * CELL_ASPECT);
        if self.needs_fit && self.viewport.is_valid() {
            self.viewport.fit(self.app.scene().background.bounds());
            self.needs_fit = false;
        }

        let view = self.viewport;
        let scene = self.app.scene();
        let session = self.app.session();
        let canvas = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([0.0, view.width])
            .y_bounds([0.0, view.height])
            .paint(move |ctx| {
                draw_background(ctx, &view, &scene.background);
                ctx.layer();

                for (_, room) in scene.rooms() {
                    if !room.polygon.visible {
                        continue;
                    }
                    let fill = fill_coords(&view, &room.polygon.points);
                    ctx.draw(&Points {
                        coords: &fill,
                        color: to_color(room.polygon.fill),
                    });
                    draw_outline(ctx, &view, &room.polygon.points, to_color(room.number_label.color));
                }
                ctx.layer();

                for (_, room) in scene.rooms() {
                    for label in [&room.number_label, &room.renter_label] {
                        if !label.visible || label.text.is_empty() {
                            continue;
                        }
                        let (x, y) = to_canvas(&view, label.pos);
                        if (0.0..view.width).contains(&x) && (0.0..view.height).contains(&y) {
                            ctx.print(
                                x,
                                y,
                                Span::styled(
                                    label.text.clone(),
                                    Style::default()
                                        .fg(to_color(label.color))
                                        .bg(to_color(room.polygon.fill)),
                                ),
                            );
                        }
                    }
                }

                if let Some(overlay) = session.overlay() {
                    ctx.layer();
                    draw_outline(ctx, &view, &overlay.outline, Color::Blue);
                    for handle in &overlay.handles {
                        let half = HANDLE_SIZE / 2.0;
                        let (x, y) = to_canvas(&view, Point::new(handle.center.x - half, handle.center.y + half));
                        ctx.draw(&Rectangle {
                            x,
                            y,
                            width: HANDLE_SIZE * view.scale,
                            height: HANDLE_SIZE * view.scale,
                            color: if handle.selected { Color::Yellow } else { Color::Red },
                        });
                    }
                }
            });
        f.render_widget(canvas, area);
    }

    fn render_legend(&self, f: &mut Frame, area: Rect) {
        let mut spans = Vec::new();
        for entry in self.app.legend() {
            let bg = to_color(Rgba::parse_or_black(&entry.colors.bg));
            let fg = to_color(Rgba::parse_or_black(&entry.colors.text));
            spans.push(Span::styled(
                format!(" {}: {} ", entry.status, entry.count),
                Style::default().fg(fg).bg(bg),
            ));
            spans.push(Span::raw(" "));
        }
        let legend = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title("Legend"));
        f.render_widget(legend, area);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect) {
        let hints = if self.app.session().is_drawing() {
            "Left: add point  Drag: move  Bksp: delete point  Right/Enter: finish  Esc: cancel"
        } else {
            "0-5: Floor  +/-: Zoom  f: Fit  a: Add room  u: Plan  s: Statuses  r: Report  h: Help  q: Quit"
        };
        let footer = Paragraph::new(Line::from(vec![
            Span::styled(self.app.status_message().to_string(), Style::default().fg(Color::Green)),
            Span::raw("  │  "),
            Span::raw(hints),
        ]))
        .style(Style::default().fg(Color::White).bg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(footer, area);
    }

    fn render_room_popup(&self, f: &mut Frame, dialog: &RoomDialog) {
        let area = centered_rect(70, 70, f.area());
        f.render_widget(Clear, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(4)])
            .split(area);

        let title = Paragraph::new(dialog.form.title())
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        f.render_widget(title, chunks[0]);

        let mut items = vec![ListItem::new(format!("Этаж: {}", dialog.form.floor_label))
            .style(Style::default().fg(Color::DarkGray))];
        items.extend(Field::ALL.iter().enumerate().map(|(i, field)| {
            let value = dialog.form.get(*field);
            let text = if field.is_choice() {
                format!("{}: < {} >", field.label(), value)
            } else {
                format!("{}: {}", field.label(), value)
            };
            let style = if i == dialog.field {
                Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(text).style(style)
        }));
        let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Room"));
        f.render_widget(list, chunks[1]);

        let keys = if dialog.confirm_clear {
            "y: Clear tenant data  any other key: Keep"
        } else {
            "↑/↓: Field  ←/→: Choose  Enter: Save  Ctrl+X: Clear  Ctrl+D: Delete  Esc: Cancel"
        };
        let help = Paragraph::new(vec![
            Line::from(keys),
            Line::from(Span::styled(
                self.app.status_message().to_string(),
                Style::default().fg(Color::Yellow),
            )),
        ])
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(help, chunks[2]);
    }

    fn render_palette_popup(&self, f: &mut Frame, dialog: &PaletteDialog) {
        let area = centered_rect(60, 60, f.area());
        f.render_widget(Clear, area);

        let input_height = if dialog.edit.is_some() { 5 } else { 0 };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(input_height),
                Constraint::Length(3),
            ])
            .split(area);

        let items: Vec<ListItem> = self
            .app
            .data()
            .statuses
            .iter()
            .map(|(name, colors)| {
                let bg = to_color(Rgba::parse_or_black(&colors.bg));
                let fg = to_color(Rgba::parse_or_black(&colors.text));
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {} ", name), Style::default().fg(fg).bg(bg)),
                    Span::raw(format!("  {} / {}", colors.bg, colors.text)),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Room statuses"))
            .highlight_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = dialog.list_state.clone();
        f.render_stateful_widget(list, chunks[0], &mut state);

        if let Some(input) = &dialog.edit {
            let lines: Vec<Line> = STATUS_INPUT_LABELS
                .iter()
                .zip(input.values.iter())
                .enumerate()
                .map(|(i, (label, value))| {
                    let style = if i == input.field {
                        Style::default().bg(Color::Blue)
                    } else {
                        Style::default()
                    };
                    Line::from(Span::styled(format!("{}: {}", label, value), style))
                })
                .collect();
            let title = if input.original.is_some() { "Edit status" } else { "New status" };
            let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(form, chunks[1]);
        }

        let help = if dialog.edit.is_some() {
            "Tab: Field  Enter: Apply  Esc: Back"
        } else {
            "↑/↓: Select  a: Add  e: Edit  d: Delete  Esc: Close"
        };
        let footer = Paragraph::new(Line::from(vec![
            Span::raw(help),
            Span::raw("  "),
            Span::styled(self.app.status_message().to_string(), Style::default().fg(Color::Yellow)),
        ]))
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(footer, chunks[2]);
    }

    fn render_upload_popup(&self, f: &mut Frame, input: &str) {
        let area = centered_rect(60, 20, f.area());
        f.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(format!("Path: {}", input)),
            Line::from(""),
            Line::from(Span::styled(
                self.app.status_message().to_string(),
                Style::default().fg(Color::Yellow),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Load floor plan (PNG, JPG, BMP) · Enter: Load  Esc: Cancel"),
        )
        .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }
}

/// Leave raw mode and the alternate screen
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)
}

/// Run `restore` before the previous panic hook, so the panic message and
/// the shell prompt land on a usable terminal
fn install_restore_hook(restore: impl Fn() + Send + Sync + 'static) {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}

fn render_text_popup(f: &mut Frame, title: &str, text: &str, scroll: u16) {
    let area = centered_rect(70, 70, f.area());
    f.render_widget(Clear, area);
    let paragraph = Paragraph::new(text.to_string())
        .block(Block::default().borders(Borders::ALL).title(format!("{} · Esc: Close", title)))
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

fn canvas_title(background: &Background, drawing: bool) -> String {
    let plan = match background {
        Background::Image { path, .. } => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        Background::Placeholder { .. } => "no plan".to_string(),
    };
    if drawing {
        format!("{} · drawing", plan)
    } else {
        plan
    }
}

fn select_step(state: &mut ListState, len: usize, forward: bool) {
    if len == 0 {
        state.select(None);
        return;
    }
    let next = match (state.selected(), forward) {
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
        (None, _) => 0,
    };
    state.select(Some(next));
}

/// Scene point → canvas coordinates (canvas y grows upwards)
fn to_canvas(view: &Viewport, p: Point) -> (f64, f64) {
    let (x, y) = view.scene_to_view(p);
    (x, view.height - y)
}

fn to_color(c: Rgba) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

fn draw_background(ctx: &mut Context, view: &Viewport, background: &Background) {
    let bounds = background.bounds();
    let (x, y) = to_canvas(view, Point::new(bounds.x, bounds.y + bounds.height));
    let color = match background {
        Background::Image { .. } => Color::White,
        Background::Placeholder { color, .. } => to_color(*color),
    };
    ctx.draw(&Rectangle {
        x,
        y,
        width: bounds.width * view.scale,
        height: bounds.height * view.scale,
        color,
    });
}

fn draw_outline(ctx: &mut Context, view: &Viewport, points: &[Point], color: Color) {
    if points.len() < 2 {
        return;
    }
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        let (x1, y1) = to_canvas(view, *a);
        let (x2, y2) = to_canvas(view, b);
        ctx.draw(&CanvasLine::new(x1, y1, x2, y2, color));
    }
}

/// Braille dot positions inside `polygon`, clipped to the view
fn fill_coords(view: &Viewport, polygon: &[Point]) -> Vec<(f64, f64)> {
    let Some(bbox) = crate::scene::Rect::bounding(polygon) else {
        return Vec::new();
    };
    let (x0, y0) = view.scene_to_view(Point::new(bbox.x, bbox.y));
    let (x1, y1) = view.scene_to_view(Point::new(bbox.x + bbox.width, bbox.y + bbox.height));
    let (x0, x1) = (x0.max(0.0), x1.min(view.width));
    let (y0, y1) = (y0.max(0.0), y1.min(view.height));

    let mut coords = Vec::new();
    let mut vy = y0;
    while vy <= y1 {
        let mut vx = x0;
        while vx <= x1 {
            if polygon_contains(polygon, view.view_to_scene(vx, vy)) {
                coords.push((vx, view.height - vy));
            }
            vx += FILL_STEP;
        }
        vy += FILL_STEP;
    }
    coords
}

/// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
