//! Application controller
//!
//! Owns the store, the current floor's scene and the drawing session, and
//! implements every user action independently of the front end. Each
//! action that mutates the document saves it immediately.

use std::path::Path;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::editor::{self, EditorError, RoomForm};
use crate::models::{floor_name, BuildingData, FloorRecord, RoomRecord, StatusColors, FLOOR_COUNT};
use crate::palette::{self, PaletteError};
use crate::report::{self, LegendEntry, Report};
use crate::scene::{FloorScene, ImageProbe, Point, RoomId};
use crate::session::{DrawingSession, Finished, SessionError, HANDLE_SIZE};
use crate::store::{Store, StoreError};

/// Plan image extensions accepted by upload
pub const PLAN_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Palette(#[from] PaletteError),

    #[error("Failed to save: {0}")]
    Store(#[from] StoreError),

    #[error("Room {0} not found on this floor")]
    UnknownRoom(RoomId),

    #[error("Unsupported plan file {0}: use PNG, JPG or BMP")]
    UnsupportedPlan(String),

    #[error("Plan file not found: {0}")]
    MissingPlan(String),

    #[error("Floor index {0} is out of range")]
    UnknownFloor(usize),
}

impl AppError {
    /// Rejections of user input, as opposed to failures
    pub fn is_validation(&self) -> bool {
        !matches!(self, AppError::Store(_))
    }
}

/// What a canvas click led to, for the front end to follow up on
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Nothing,
    PointAdded,
    OpenRoom(RoomId),
    EditStarted(RoomId),
    Finished,
}

/// A left press that landed on a vertex handle
///
/// The press already added its point. If the mouse moves before release,
/// that point is taken back and the press drags the handle instead.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HandlePress {
    index: usize,
    at: Point,
    dragging: bool,
}

pub struct App {
    store: Store,
    probe: Box<dyn ImageProbe>,
    current_floor: usize,
    scene: FloorScene,
    session: DrawingSession,
    press: Option<HandlePress>,
    status_message: String,
}

impl App {
    pub fn new(store: Store, probe: Box<dyn ImageProbe>) -> Self {
        let scene = FloorScene::build("0", store.data().floor("0"), &store.data().statuses, probe.as_ref());
        Self {
            store,
            probe,
            current_floor: 0,
            scene,
            session: DrawingSession::Idle,
            press: None,
            status_message: format!("Selected: {}", floor_name("0")),
        }
    }

    pub fn data(&self) -> &BuildingData {
        self.store.data()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn scene(&self) -> &FloorScene {
        &self.scene
    }

    pub fn session(&self) -> &DrawingSession {
        &self.session
    }

    pub fn current_floor(&self) -> usize {
        self.current_floor
    }

    pub fn floor_key(&self) -> String {
        self.current_floor.to_string()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    /// Error boundary for UI callbacks: log, show, carry on
    pub fn guard<T>(&mut self, action: &str, f: impl FnOnce(&mut Self) -> Result<T, AppError>) -> Option<T> {
        match f(self) {
            Ok(value) => Some(value),
            Err(e) => {
                if e.is_validation() {
                    info!("{} rejected: {}", action, e);
                    self.set_status(e.to_string());
                } else {
                    error!("{} failed: {:?}", action, anyhow::Error::from(e));
                    self.set_status(format!("Error while {}: see log", action));
                }
                None
            }
        }
    }

    fn floor(&self) -> Option<&FloorRecord> {
        self.store.data().floor(&self.floor_key())
    }

    fn room(&self, id: RoomId) -> Result<&RoomRecord, AppError> {
        self.floor()
            .and_then(|f| f.rooms.get(id.0))
            .ok_or(AppError::UnknownRoom(id))
    }

    /// Switch floors: abort any drawing and rebuild the scene
    pub fn load_floor(&mut self, index: usize) {
        if index >= FLOOR_COUNT {
            warn!("Ignoring unknown floor {}", index);
            return;
        }
        debug!("Loading floor {}", index);
        self.reset_drawing();
        self.current_floor = index;
        self.rebuild_scene();
        self.set_status(format!("Selected: {}", floor_name(&self.floor_key())));
    }

    fn rebuild_scene(&mut self) {
        let key = self.floor_key();
        let data = self.store.data();
        self.scene = FloorScene::build(&key, data.floor(&key), &data.statuses, self.probe.as_ref());
    }

    fn reset_drawing(&mut self) {
        self.session.abort();
        self.press = None;
    }

    /// "Add room": start collecting vertices
    pub fn start_add_room(&mut self) -> Result<(), AppError> {
        self.session.start_new()?;
        self.set_status("Left click adds polygon points. Right click finishes.");
        Ok(())
    }

    /// Start reshaping a stored room; its visuals are hidden meanwhile
    pub fn start_edit_room(&mut self, id: RoomId) -> Result<(), AppError> {
        let points: Vec<Point> = self.room(id)?.points.iter().copied().map(Point::from).collect();
        self.session.start_edit(id, points)?;
        self.scene.set_room_visible(id, false);
        self.set_status("Reshape the polygon. Backspace deletes a point. Right click finishes.");
        Ok(())
    }

    /// Left press: while drawing it always adds a point at `p`
    ///
    /// A press on a handle also selects it and may become a drag.
    pub fn left_click(&mut self, p: Point) -> Result<ClickOutcome, AppError> {
        if self.session.is_drawing() {
            self.press = None;
            let handle = self.session.handle_at(p, HANDLE_SIZE / 2.0);
            self.session.add_point(p)?;
            if let Some(index) = handle {
                self.session.select_handle(Some(index))?;
                self.press = Some(HandlePress {
                    index,
                    at: p,
                    dragging: false,
                });
            }
            return Ok(ClickOutcome::PointAdded);
        }
        Ok(match self.scene.room_at(p) {
            Some(id) => ClickOutcome::OpenRoom(id),
            None => ClickOutcome::Nothing,
        })
    }

    /// Mouse moved with the button held
    pub fn drag(&mut self, p: Point) -> Result<(), AppError> {
        let Some(press) = self.press else {
            return Ok(());
        };
        if !press.dragging {
            if p == press.at {
                return Ok(());
            }
            self.session.pop_point()?;
            self.press = Some(HandlePress {
                dragging: true,
                ..press
            });
        }
        if self.session.points().get(press.index) != Some(&p) {
            self.session.move_vertex(press.index, p)?;
        }
        Ok(())
    }

    /// Mouse release; a release away from the press point ends a drag there
    pub fn release(&mut self, p: Point) -> Result<(), AppError> {
        let result = self.drag(p);
        self.press = None;
        result
    }

    /// Tab: move the selection to the next vertex
    pub fn select_next_vertex(&mut self) -> Result<(), AppError> {
        let count = self.session.points().len();
        if count == 0 {
            return Err(SessionError::NoSelection.into());
        }
        let next = self.session.selected().map_or(0, |i| (i + 1) % count);
        self.session.select_handle(Some(next))?;
        Ok(())
    }

    pub fn right_click(&mut self, p: Point) -> Result<ClickOutcome, AppError> {
        if self.session.is_drawing() {
            self.finish_drawing()?;
            return Ok(ClickOutcome::Finished);
        }
        match self.scene.room_at(p) {
            Some(id) => {
                self.start_edit_room(id)?;
                Ok(ClickOutcome::EditStarted(id))
            }
            None => Ok(ClickOutcome::Nothing),
        }
    }

    pub fn delete_selected_vertex(&mut self) -> Result<(), AppError> {
        self.session.delete_selected()?;
        self.set_status("Point deleted. Right click saves.");
        Ok(())
    }

    /// Esc: drop the session, restore hidden visuals
    pub fn abort_drawing(&mut self) {
        if self.session.is_drawing() {
            self.reset_drawing();
            self.rebuild_scene();
            self.set_status("Drawing cancelled.");
        }
    }

    /// Finalize the session into the document, save and redraw
    pub fn finish_drawing(&mut self) -> Result<(), AppError> {
        let finished = self.session.finish()?;
        self.press = None;
        let key = self.floor_key();

        let saved = match finished {
            Finished::NewRoom(points) => {
                let points: Vec<[f64; 2]> = points.into_iter().map(<[f64; 2]>::from).collect();
                self.store.mutate(|data| {
                    let floor = data.floor_mut(&key);
                    let number = floor.next_room_number().to_string();
                    info!("Creating room {} on floor {}", number, key);
                    floor.rooms.push(RoomRecord::new(number, key.clone(), points));
                })
            }
            Finished::EditedRoom { room, points } => {
                let points: Vec<[f64; 2]> = points.into_iter().map(<[f64; 2]>::from).collect();
                self.store.mutate(|data| match data.floor_mut(&key).rooms.get_mut(room.0) {
                    Some(record) => {
                        record.points = points;
                        true
                    }
                    None => false,
                })
                .map(|found| {
                    if !found {
                        warn!("Edited room {} vanished before saving", room);
                    }
                })
            }
        };

        self.rebuild_scene();
        saved?;
        self.set_status("Done. You can keep drawing.");
        Ok(())
    }

    /// Form for the room editor
    pub fn room_form(&self, id: RoomId) -> Result<RoomForm, AppError> {
        Ok(RoomForm::from_room(self.room(id)?, today()))
    }

    /// Form seeded from the stored values, for edits without a dialog
    pub fn stored_room_form(&self, id: RoomId) -> Result<RoomForm, AppError> {
        Ok(RoomForm::from_room_raw(self.room(id)?, today()))
    }

    /// Validate and merge the editor form; the dialog stays open on error
    pub fn save_room(&mut self, id: RoomId, form: &RoomForm) -> Result<(), AppError> {
        form.validate()?;
        self.room(id)?;
        let key = self.floor_key();
        self.store.mutate(|data| {
            if let Some(room) = data.floor_mut(&key).rooms.get_mut(id.0) {
                form.apply_to(room);
            }
        })?;
        self.refresh_room(id);
        self.set_status(format!("Room {} saved.", form.number));
        Ok(())
    }

    /// Reset tenant fields, keep shape and number
    pub fn clear_room(&mut self, id: RoomId) -> Result<(), AppError> {
        self.room(id)?;
        let key = self.floor_key();
        let today = today();
        let number = self.store.mutate(|data| {
            let room = &mut data.floor_mut(&key).rooms[id.0];
            editor::clear_room(room, today);
            room.number.clone()
        })?;
        self.refresh_room(id);
        self.set_status(format!("Room {} cleared.", number));
        Ok(())
    }

    /// Remove the room record and its visuals, then redraw the floor
    pub fn delete_room(&mut self, id: RoomId) -> Result<(), AppError> {
        self.room(id)?;
        let key = self.floor_key();
        let removed = self.store.mutate(|data| data.floor_mut(&key).rooms.remove(id.0))?;
        self.scene.remove_room(id);
        self.reset_drawing();
        self.rebuild_scene();
        self.set_status(format!("Room {} deleted.", removed.number));
        Ok(())
    }

    fn refresh_room(&mut self, id: RoomId) {
        let key = self.floor_key();
        let data = self.store.data();
        if let Some(room) = data.floor(&key).and_then(|f| f.rooms.get(id.0)) {
            self.scene.refresh_room(id, room, &data.statuses);
        }
    }

    /// Refresh every room on the current floor after palette edits
    fn refresh_statuses(&mut self) {
        let key = self.floor_key();
        let data = self.store.data();
        if let Some(floor) = data.floor(&key) {
            self.scene.refresh_all(floor, &data.statuses);
        }
    }

    /// Use `path` as the current floor's plan
    pub fn upload_plan(&mut self, path: &str) -> Result<(), AppError> {
        let path = path.trim();
        let ext_ok = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| PLAN_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !ext_ok {
            return Err(AppError::UnsupportedPlan(path.to_string()));
        }
        if !Path::new(path).exists() {
            return Err(AppError::MissingPlan(path.to_string()));
        }
        debug!("Selected plan file: {}", path);
        let key = self.floor_key();
        self.store.mutate(|data| data.floor_mut(&key).plan_path = Some(path.to_string()))?;
        self.load_floor(self.current_floor);
        Ok(())
    }

    pub fn add_status(&mut self, name: &str, colors: StatusColors) -> Result<(), AppError> {
        let mut statuses = self.store.data().statuses.clone();
        palette::add_status(&mut statuses, name, colors)?;
        self.commit_statuses(statuses)
    }

    pub fn rename_status(&mut self, old: &str, new: &str, colors: StatusColors) -> Result<(), AppError> {
        let mut statuses = self.store.data().statuses.clone();
        palette::rename_status(&mut statuses, old, new, colors)?;
        self.commit_statuses(statuses)
    }

    pub fn remove_status(&mut self, name: &str) -> Result<(), AppError> {
        let mut statuses = self.store.data().statuses.clone();
        palette::remove_status(&mut statuses, name)?;
        self.commit_statuses(statuses)
    }

    fn commit_statuses(&mut self, statuses: crate::models::StatusMap) -> Result<(), AppError> {
        self.store.mutate(|data| data.statuses = statuses)?;
        self.refresh_statuses();
        self.set_status("Room statuses updated.");
        Ok(())
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        report::legend(self.store.data())
    }

    pub fn report(&self) -> Report {
        Report::build(self.store.data())
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
