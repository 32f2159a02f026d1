//! Floor scene model
//!
//! A toolkit-independent description of what the canvas shows for one
//! floor: the background (plan image or gray placeholder), one filled
//! polygon per room and two text labels per room. Front ends draw this
//! model; the controller updates it in place for status/tenant edits and
//! rebuilds it on floor switches and shape changes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::models::{FloorRecord, RoomRecord, StatusColors, StatusMap};

/// Placeholder canvas size when a floor has no readable plan
pub const PLACEHOLDER_SIZE: (u32, u32) = (1000, 800);

/// Offset of the number label from the polygon's bounding box top-left
pub const LABEL_OFFSET: f64 = 30.0;
/// Gap between the number label and the renter label
pub const LABEL_SPACING: f64 = 10.0;
/// Line height of the 30pt number label
pub const NUMBER_LABEL_HEIGHT: f64 = 46.0;
pub const NUMBER_FONT_PT: u32 = 30;
pub const RENTER_FONT_PT: u32 = 24;

const RENTER_MAX_CHARS: usize = 20;
const RENTER_KEEP_CHARS: usize = 17;
/// Renter label of a record without a `renter_name` key
const NO_RENTER: &str = "Нет арендатора";

/// Scene coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

/// Axis-aligned rectangle in scene coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bounding(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }
}

/// Stable identifier of a room within one built scene
///
/// It is the room's index in its floor's room list, so it is only valid
/// until the next full rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoomId(pub usize);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// ARGB color parsed from `#RRGGBB` or `#AARRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgba {
    pub const LIGHT_GRAY: Rgba = Rgba {
        a: 255,
        r: 192,
        g: 192,
        b: 192,
    };

    pub fn parse(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        match digits.len() {
            6 => Some(Self {
                a: 255,
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
            }),
            8 => Some(Self {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => None,
        }
    }

    /// Parse, falling back to opaque black for malformed strings
    pub fn parse_or_black(hex: &str) -> Self {
        Self::parse(hex).unwrap_or(Self {
            a: 255,
            r: 0,
            g: 0,
            b: 0,
        })
    }
}

/// What sits behind the room polygons
#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Image {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    Placeholder {
        width: u32,
        height: u32,
        color: Rgba,
    },
}

impl Background {
    pub fn placeholder() -> Self {
        Background::Placeholder {
            width: PLACEHOLDER_SIZE.0,
            height: PLACEHOLDER_SIZE.1,
            color: Rgba::LIGHT_GRAY,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        match self {
            Background::Image { width, height, .. } | Background::Placeholder { width, height, .. } => {
                (*width, *height)
            }
        }
    }

    pub fn bounds(&self) -> Rect {
        let (w, h) = self.size();
        Rect {
            x: 0.0,
            y: 0.0,
            width: w as f64,
            height: h as f64,
        }
    }
}

/// Reads plan image dimensions
pub trait ImageProbe {
    fn dimensions(&self, path: &Path) -> anyhow::Result<(u32, u32)>;
}

/// Probe backed by the `image` crate (reads only the header)
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImageProbe;

impl ImageProbe for FileImageProbe {
    fn dimensions(&self, path: &Path) -> anyhow::Result<(u32, u32)> {
        Ok(image::image_dimensions(path)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonItem {
    pub points: Vec<Point>,
    pub fill: Rgba,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub color: Rgba,
    pub pos: Point,
    pub font_pt: u32,
    pub visible: bool,
}

/// The three rendered elements of one room
#[derive(Debug, Clone, PartialEq)]
pub struct RoomVisuals {
    pub polygon: PolygonItem,
    pub number_label: TextItem,
    pub renter_label: TextItem,
}

impl RoomVisuals {
    fn build(room: &RoomRecord, statuses: &StatusMap) -> Self {
        let points: Vec<Point> = room.points.iter().copied().map(Point::from).collect();
        let mut visuals = Self {
            polygon: PolygonItem {
                points,
                fill: Rgba::LIGHT_GRAY,
                visible: true,
            },
            number_label: TextItem {
                text: String::new(),
                color: Rgba::LIGHT_GRAY,
                pos: Point::new(0.0, 0.0),
                font_pt: NUMBER_FONT_PT,
                visible: true,
            },
            renter_label: TextItem {
                text: String::new(),
                color: Rgba::LIGHT_GRAY,
                pos: Point::new(0.0, 0.0),
                font_pt: RENTER_FONT_PT,
                visible: true,
            },
        };
        visuals.apply(room, statuses);
        visuals
    }

    /// Recompute colors, texts and label positions from the record
    fn apply(&mut self, room: &RoomRecord, statuses: &StatusMap) {
        let colors: StatusColors = statuses.resolve(&room.status);
        let text_color = Rgba::parse_or_black(&colors.text);
        self.polygon.fill = Rgba::parse_or_black(&colors.bg);

        self.number_label.text = number_label(&room.number);
        self.number_label.color = text_color;
        self.renter_label.text = truncate_renter(room.renter_name.as_deref().unwrap_or(NO_RENTER));
        self.renter_label.color = text_color;

        if let Some(bbox) = Rect::bounding(&self.polygon.points) {
            let x = bbox.x + LABEL_OFFSET;
            let y = bbox.y + LABEL_OFFSET;
            self.number_label.pos = Point::new(x, y);
            self.renter_label.pos = Point::new(x, y + NUMBER_LABEL_HEIGHT + LABEL_SPACING);
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.polygon.visible = visible;
        self.number_label.visible = visible;
        self.renter_label.visible = visible;
    }
}

/// Text of the room number label
pub fn number_label(number: &str) -> String {
    if number.is_empty() {
        "Каб. № N/A".to_string()
    } else {
        format!("Каб. № {}", number)
    }
}

/// Renter names longer than 20 chars are cut to 17 plus "..."
pub fn truncate_renter(name: &str) -> String {
    if name.chars().count() > RENTER_MAX_CHARS {
        let kept: String = name.chars().take(RENTER_KEEP_CHARS).collect();
        format!("{}...", kept)
    } else {
        name.to_string()
    }
}

/// Ray-casting containment test
pub fn polygon_contains(polygon: &[Point], p: Point) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Everything drawn for one floor
#[derive(Debug, Clone, PartialEq)]
pub struct FloorScene {
    pub floor: String,
    pub background: Background,
    rooms: BTreeMap<RoomId, RoomVisuals>,
}

impl FloorScene {
    /// Full rebuild from a floor record
    pub fn build(
        floor_key: &str,
        floor: Option<&FloorRecord>,
        statuses: &StatusMap,
        probe: &dyn ImageProbe,
    ) -> Self {
        let background = floor
            .and_then(|f| f.plan_path.as_deref())
            .map(|path| load_background(Path::new(path), probe))
            .unwrap_or_else(|| {
                debug!("Floor {} has no plan, using placeholder", floor_key);
                Background::placeholder()
            });

        let mut rooms = BTreeMap::new();
        for (idx, room) in floor.map(|f| f.rooms.as_slice()).unwrap_or(&[]).iter().enumerate() {
            if room.points.is_empty() {
                debug!("Skipping room {:?} without polygon data", room.number);
                continue;
            }
            debug!("Building polygon for room {}", room.number);
            rooms.insert(RoomId(idx), RoomVisuals::build(room, statuses));
        }

        Self {
            floor: floor_key.to_string(),
            background,
            rooms,
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room(&self, id: RoomId) -> Option<&RoomVisuals> {
        self.rooms.get(&id)
    }

    /// Rooms in drawing order (later ones on top)
    pub fn rooms(&self) -> impl Iterator<Item = (RoomId, &RoomVisuals)> {
        self.rooms.iter().map(|(id, v)| (*id, v))
    }

    /// Update one room's colors and texts in place; false if it isn't drawn
    pub fn refresh_room(&mut self, id: RoomId, room: &RoomRecord, statuses: &StatusMap) -> bool {
        match self.rooms.get_mut(&id) {
            Some(visuals) => {
                visuals.apply(room, statuses);
                true
            }
            None => {
                debug!("No visuals for room {} in the scene", id);
                false
            }
        }
    }

    /// Refresh every drawn room from the floor record
    pub fn refresh_all(&mut self, floor: &FloorRecord, statuses: &StatusMap) {
        for (id, visuals) in self.rooms.iter_mut() {
            if let Some(room) = floor.rooms.get(id.0) {
                visuals.apply(room, statuses);
            }
        }
    }

    pub fn set_room_visible(&mut self, id: RoomId, visible: bool) {
        if let Some(visuals) = self.rooms.get_mut(&id) {
            visuals.set_visible(visible);
        }
    }

    pub fn remove_room(&mut self, id: RoomId) -> Option<RoomVisuals> {
        self.rooms.remove(&id)
    }

    /// Topmost visible room whose polygon contains `p`
    pub fn room_at(&self, p: Point) -> Option<RoomId> {
        self.rooms
            .iter()
            .rev()
            .find(|(_, v)| v.polygon.visible && polygon_contains(&v.polygon.points, p))
            .map(|(id, _)| *id)
    }
}

fn load_background(path: &Path, probe: &dyn ImageProbe) -> Background {
    if !path.exists() {
        debug!("Plan {} not found, using placeholder", path.display());
        return Background::placeholder();
    }
    match probe.dimensions(path) {
        Ok((width, height)) if width > 0 && height > 0 => {
            debug!("Plan found: {} ({}x{})", path.display(), width, height);
            Background::Image {
                path: path.to_path_buf(),
                width,
                height,
            }
        }
        Ok(_) => {
            warn!("Plan {} is empty, using placeholder", path.display());
            Background::placeholder()
        }
        Err(e) => {
            warn!("Failed to read plan {}: {}", path.display(), e);
            Background::placeholder()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::default_statuses;

    struct FixedProbe(u32, u32);

    impl ImageProbe for FixedProbe {
        fn dimensions(&self, _path: &Path) -> anyhow::Result<(u32, u32)> {
            Ok((self.0, self.1))
        }
    }

    fn square_room(number: &str, status: &str, x: f64) -> RoomRecord {
        let mut room = RoomRecord::new(
            number.to_string(),
            "1".to_string(),
            vec![[x, 0.0], [x + 100.0, 0.0], [x + 100.0, 100.0], [x, 100.0]],
        );
        room.status = status.to_string();
        room
    }

    #[test]
    fn test_floor_without_plan_uses_placeholder() {
        let floor = FloorRecord::default();
        let scene = FloorScene::build("0", Some(&floor), &default_statuses(), &FixedProbe(1, 1));
        assert_eq!(scene.background, Background::placeholder());
        assert_eq!(scene.background.size(), (1000, 800));
        assert_eq!(scene.room_count(), 0);
    }

    #[test]
    fn test_missing_plan_file_uses_placeholder() {
        let floor = FloorRecord {
            plan_path: Some("/definitely/not/here.png".to_string()),
            rooms: vec![],
        };
        let scene = FloorScene::build("0", Some(&floor), &default_statuses(), &FixedProbe(10, 10));
        assert_eq!(scene.background.size(), PLACEHOLDER_SIZE);
    }

    #[test]
    fn test_existing_plan_uses_image_size() {
        let dir = tempfile::tempdir().unwrap();
        let plan = dir.path().join("plan.png");
        std::fs::write(&plan, b"stub").unwrap();
        let floor = FloorRecord {
            plan_path: Some(plan.to_string_lossy().into_owned()),
            rooms: vec![],
        };
        let scene = FloorScene::build("2", Some(&floor), &default_statuses(), &FixedProbe(640, 480));
        assert!(matches!(scene.background, Background::Image { width: 640, height: 480, .. }));
    }

    #[test]
    fn test_unreadable_plan_uses_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let plan = dir.path().join("plan.png");
        std::fs::write(&plan, b"not an image").unwrap();
        let floor = FloorRecord {
            plan_path: Some(plan.to_string_lossy().into_owned()),
            rooms: vec![],
        };
        let scene = FloorScene::build("2", Some(&floor), &default_statuses(), &FileImageProbe);
        assert_eq!(scene.background, Background::placeholder());
    }

    #[test]
    fn test_labels_and_colors() {
        let mut room = square_room("12", "занят", 50.0);
        room.renter_name = Some("ООО Очень Длинное Название".to_string());
        let floor = FloorRecord {
            plan_path: None,
            rooms: vec![room],
        };
        let scene = FloorScene::build("1", Some(&floor), &default_statuses(), &FixedProbe(1, 1));
        let visuals = scene.room(RoomId(0)).unwrap();

        assert_eq!(visuals.polygon.fill, Rgba { a: 0xB3, r: 0xff, g: 0xff, b: 0x00 });
        assert_eq!(visuals.number_label.text, "Каб. № 12");
        assert_eq!(visuals.number_label.pos, Point::new(80.0, 30.0));
        assert_eq!(visuals.renter_label.text, "ООО Очень Длинное...");
        assert_eq!(visuals.renter_label.pos, Point::new(80.0, 30.0 + NUMBER_LABEL_HEIGHT + LABEL_SPACING));
    }

    #[test]
    fn test_dangling_status_renders_fallback() {
        let floor = FloorRecord {
            plan_path: None,
            rooms: vec![square_room("1", "удалённый", 0.0)],
        };
        let scene = FloorScene::build("1", Some(&floor), &default_statuses(), &FixedProbe(1, 1));
        let visuals = scene.room(RoomId(0)).unwrap();
        assert_eq!(visuals.polygon.fill, Rgba::parse("#B3808080").unwrap());
        assert_eq!(visuals.number_label.color, Rgba::parse("#000000").unwrap());
    }

    #[test]
    fn test_missing_renter_key_shows_placeholder_label() {
        let mut room = square_room("3", "свободный", 0.0);
        room.renter_name = None;
        let floor = FloorRecord {
            plan_path: None,
            rooms: vec![room, square_room("4", "свободный", 200.0)],
        };
        let scene = FloorScene::build("1", Some(&floor), &default_statuses(), &FixedProbe(1, 1));
        assert_eq!(scene.room(RoomId(0)).unwrap().renter_label.text, "Нет арендатора");
        assert_eq!(scene.room(RoomId(1)).unwrap().renter_label.text, "");
    }

    #[test]
    fn test_rooms_without_points_are_skipped() {
        let floor = FloorRecord {
            plan_path: None,
            rooms: vec![RoomRecord::new("1".into(), "1".into(), vec![]), square_room("2", "занят", 0.0)],
        };
        let scene = FloorScene::build("1", Some(&floor), &default_statuses(), &FixedProbe(1, 1));
        assert_eq!(scene.room_count(), 1);
        assert!(scene.room(RoomId(1)).is_some());
    }

    #[test]
    fn test_refresh_room_in_place() {
        let mut floor = FloorRecord {
            plan_path: None,
            rooms: vec![square_room("1", "свободный", 0.0)],
        };
        let statuses = default_statuses();
        let mut scene = FloorScene::build("1", Some(&floor), &statuses, &FixedProbe(1, 1));

        floor.rooms[0].status = "в ремонте".to_string();
        floor.rooms[0].renter_name = Some("Ромашка".to_string());
        assert!(scene.refresh_room(RoomId(0), &floor.rooms[0], &statuses));
        let visuals = scene.room(RoomId(0)).unwrap();
        assert_eq!(visuals.renter_label.text, "Ромашка");
        assert_eq!(visuals.renter_label.color, Rgba::parse("#ffffff").unwrap());
        assert!(!scene.refresh_room(RoomId(7), &floor.rooms[0], &statuses));
    }

    #[test]
    fn test_room_at_picks_topmost_visible() {
        let floor = FloorRecord {
            plan_path: None,
            rooms: vec![square_room("1", "занят", 0.0), square_room("2", "занят", 50.0)],
        };
        let mut scene = FloorScene::build("1", Some(&floor), &default_statuses(), &FixedProbe(1, 1));
        assert_eq!(scene.room_at(Point::new(75.0, 50.0)), Some(RoomId(1)));
        assert_eq!(scene.room_at(Point::new(25.0, 50.0)), Some(RoomId(0)));
        assert_eq!(scene.room_at(Point::new(500.0, 50.0)), None);

        scene.set_room_visible(RoomId(1), false);
        assert_eq!(scene.room_at(Point::new(75.0, 50.0)), Some(RoomId(0)));
    }

    #[test]
    fn test_rgba_parse() {
        assert_eq!(Rgba::parse("#ff0000"), Some(Rgba { a: 255, r: 255, g: 0, b: 0 }));
        assert_eq!(Rgba::parse("#80ffa500"), Some(Rgba { a: 0x80, r: 0xff, g: 0xa5, b: 0 }));
        assert_eq!(Rgba::parse("ff0000"), None);
        assert_eq!(Rgba::parse("#ggg000"), None);
        assert_eq!(Rgba::parse("#fff"), None);
    }

    #[test]
    fn test_truncate_renter_counts_chars() {
        assert_eq!(truncate_renter("Короткое"), "Короткое");
        assert_eq!(truncate_renter(&"я".repeat(20)), "я".repeat(20));
        assert_eq!(truncate_renter(&"я".repeat(21)), format!("{}...", "я".repeat(17)));
    }
}
