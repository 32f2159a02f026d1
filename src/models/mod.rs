//! Data models for the building document
//!
//! These mirror the JSON structure of `building_data.json` one to one:
//! `floors` maps a floor index string to its record, `statuses` maps a
//! status name to its color pair.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Status given to freshly drawn and cleared rooms
pub const DEFAULT_STATUS: &str = "свободный";

/// Payment type given to freshly cleared rooms
pub const DEFAULT_PAYMENT_TYPE: &str = "Наличные";

/// Payment types offered by the room editor
pub const PAYMENT_TYPES: [&str; 2] = ["Наличные", "Безналичные"];

/// Number of floor selectors (basement plus five floors)
pub const FLOOR_COUNT: usize = 6;

const FALLBACK_BG: &str = "#B3808080";
const FALLBACK_TEXT: &str = "#000000";

/// Human-readable floor name for a floor key
pub fn floor_name(key: &str) -> String {
    match key {
        "0" => "Цокольный этаж".to_string(),
        other => format!("{} этаж", other),
    }
}

/// Background and text colors of a status, as hex strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusColors {
    /// `#RRGGBB` or `#AARRGGBB`
    pub bg: String,
    pub text: String,
}

impl StatusColors {
    pub fn new(bg: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            bg: bg.into(),
            text: text.into(),
        }
    }

    /// The gray pair used when a room references an unknown status
    pub fn fallback() -> Self {
        Self::new(FALLBACK_BG, FALLBACK_TEXT)
    }
}

/// The four built-in statuses, in legend order
pub fn default_statuses() -> StatusMap {
    let mut map = StatusMap::new();
    map.insert("свободный", StatusColors::new("#B300ff00", "#000000"));
    map.insert("занят", StatusColors::new("#B3ffff00", "#000000"));
    map.insert("скоро освободится", StatusColors::new("#B3ffa500", "#000000"));
    map.insert("в ремонте", StatusColors::new("#B3ff0000", "#ffffff"));
    map
}

/// Insertion-ordered status name → colors mapping
///
/// Serialized as a plain JSON object. Order matters because the legend and
/// the editor list statuses in the order they were defined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusMap(IndexMap<String, StatusColors>);

impl StatusMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&StatusColors> {
        self.0.get(name)
    }

    /// Insert or replace; a replaced entry keeps its position
    pub fn insert(&mut self, name: impl Into<String>, colors: StatusColors) {
        self.0.insert(name.into(), colors);
    }

    /// Remove `name`, shifting later entries up so the order is kept
    pub fn remove(&mut self, name: &str) -> Option<StatusColors> {
        self.0.shift_remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StatusColors)> {
        self.0.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Colors for `status`, or the fallback pair for a dangling reference
    pub fn resolve(&self, status: &str) -> StatusColors {
        self.get(status).cloned().unwrap_or_else(StatusColors::fallback)
    }
}

/// One office/room on a floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRecord {
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub floor: String,
    #[serde(default = "default_status")]
    pub status: String,
    /// Polygon vertices in scene coordinates
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
    /// Legal name of the renter; `None` when the file has no such key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renter_name: Option<String>,
    /// Tax ID
    #[serde(default)]
    pub inn: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub payment_type: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub entry_date: String,
    /// `YYYY-MM-DD`
    #[serde(default)]
    pub exit_date: String,
}

fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}

impl RoomRecord {
    /// A freshly drawn room: default status, empty tenant fields
    pub fn new(number: String, floor: String, points: Vec<[f64; 2]>) -> Self {
        Self {
            number,
            floor,
            status: default_status(),
            points,
            renter_name: Some(String::new()),
            inn: String::new(),
            client_name: String::new(),
            payment_type: String::new(),
            entry_date: String::new(),
            exit_date: String::new(),
        }
    }

    /// Renter name, empty when unset
    pub fn renter(&self) -> &str {
        self.renter_name.as_deref().unwrap_or("")
    }
}

/// Plan image reference plus the rooms of one building level
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloorRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_path: Option<String>,
    #[serde(default)]
    pub rooms: Vec<RoomRecord>,
}

impl FloorRecord {
    /// Next free integer room number: max numeric number + 1, or 1
    ///
    /// Numbers too long for `u128` are skipped; the maximum saturates.
    pub fn next_room_number(&self) -> u128 {
        self.rooms
            .iter()
            .filter(|r| !r.number.is_empty() && r.number.chars().all(|c| c.is_ascii_digit()))
            .filter_map(|r| r.number.parse::<u128>().ok())
            .max()
            .map(|n| n.saturating_add(1))
            .unwrap_or(1)
    }
}

/// The whole persisted document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingData {
    #[serde(default)]
    pub floors: BTreeMap<String, FloorRecord>,
    #[serde(default = "default_statuses")]
    pub statuses: StatusMap,
}

impl Default for BuildingData {
    fn default() -> Self {
        Self {
            floors: BTreeMap::new(),
            statuses: default_statuses(),
        }
    }
}

impl BuildingData {
    /// Re-add any built-in status missing from a loaded file
    pub fn ensure_default_statuses(&mut self) {
        for (name, colors) in default_statuses().iter() {
            if !self.statuses.contains(name) {
                self.statuses.insert(name, colors.clone());
            }
        }
    }

    pub fn floor(&self, key: &str) -> Option<&FloorRecord> {
        self.floors.get(key)
    }

    /// Floor record for `key`, created empty when missing
    pub fn floor_mut(&mut self, key: &str) -> &mut FloorRecord {
        self.floors.entry(key.to_string()).or_default()
    }

    pub fn room_count(&self) -> usize {
        self.floors.values().map(|f| f.rooms.len()).sum()
    }

    pub fn rooms(&self) -> impl Iterator<Item = &RoomRecord> {
        self.floors.values().flat_map(|f| f.rooms.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(number: &str) -> RoomRecord {
        RoomRecord::new(number.to_string(), "0".to_string(), vec![])
    }

    #[test]
    fn test_next_room_number_ignores_non_numeric() {
        let floor = FloorRecord {
            plan_path: None,
            rooms: vec![room("3"), room("12"), room("12a"), room("Новый"), room("")],
        };
        assert_eq!(floor.next_room_number(), 13);
    }

    #[test]
    fn test_next_room_number_empty_floor() {
        assert_eq!(FloorRecord::default().next_room_number(), 1);
    }

    #[test]
    fn test_status_map_keeps_insertion_order() {
        let json = r##"{"b": {"bg": "#000000", "text": "#ffffff"}, "a": {"bg": "#111111", "text": "#000000"}}"##;
        let map: StatusMap = serde_json::from_str(json).unwrap();
        assert_eq!(map.names().collect::<Vec<_>>(), vec!["b", "a"]);

        let back = serde_json::to_string(&map).unwrap();
        assert!(back.find("\"b\"").unwrap() < back.find("\"a\"").unwrap());
    }

    #[test]
    fn test_resolve_falls_back_for_unknown_status() {
        let statuses = default_statuses();
        assert_eq!(statuses.resolve("занят").bg, "#B3ffff00");
        assert_eq!(statuses.resolve("снесён"), StatusColors::fallback());
    }

    #[test]
    fn test_ensure_default_statuses_keeps_custom_ones() {
        let mut doc: BuildingData =
            serde_json::from_str(r##"{"floors": {}, "statuses": {"аренда": {"bg": "#ff0000", "text": "#000000"}}}"##)
                .unwrap();
        doc.ensure_default_statuses();
        assert_eq!(doc.statuses.len(), 5);
        assert_eq!(doc.statuses.names().next(), Some("аренда"));
    }

    #[test]
    fn test_room_without_fields_loads_with_defaults() {
        let room: RoomRecord = serde_json::from_str(r#"{"number": "7"}"#).unwrap();
        assert_eq!(room.status, DEFAULT_STATUS);
        assert!(room.points.is_empty());
        assert_eq!(room.renter_name, None);
        assert_eq!(room.renter(), "");
    }

    #[test]
    fn test_missing_renter_stays_missing_on_save() {
        let room: RoomRecord = serde_json::from_str(r#"{"number": "7"}"#).unwrap();
        let json = serde_json::to_string(&room).unwrap();
        assert!(!json.contains("renter_name"));

        let drawn = RoomRecord::new("8".into(), "0".into(), vec![]);
        assert!(serde_json::to_string(&drawn).unwrap().contains("\"renter_name\":\"\""));
    }

    #[test]
    fn test_next_room_number_past_u64() {
        let floor = FloorRecord {
            plan_path: None,
            rooms: vec![room("18446744073709551615")],
        };
        assert_eq!(floor.next_room_number(), 18446744073709551616);

        let huge = FloorRecord {
            plan_path: None,
            rooms: vec![room(&u128::MAX.to_string()), room("4"), room(&"9".repeat(60))],
        };
        assert_eq!(huge.next_room_number(), u128::MAX);
    }

    #[test]
    fn test_removing_status_keeps_order() {
        let mut statuses = default_statuses();
        statuses.remove("занят");
        assert_eq!(
            statuses.names().collect::<Vec<_>>(),
            vec!["свободный", "скоро освободится", "в ремонте"]
        );
    }

    #[test]
    fn test_floor_names() {
        assert_eq!(floor_name("0"), "Цокольный этаж");
        assert_eq!(floor_name("3"), "3 этаж");
        assert_eq!(floor_name("5"), "5 этаж");
        assert_eq!(floor_name("9"), "9 этаж");
    }
}
