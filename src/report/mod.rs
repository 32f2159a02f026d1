//! Status legend and occupancy report
//!
//! Both are recomputed from the whole document on every call.

use std::fmt::Write as _;

use serde::Serialize;

use crate::models::{floor_name, BuildingData, StatusColors};

/// One legend swatch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub status: String,
    pub colors: StatusColors,
    /// Rooms across all floors holding this status
    pub count: usize,
}

/// Legend entries for every known status, in palette order
pub fn legend(data: &BuildingData) -> Vec<LegendEntry> {
    data.statuses
        .iter()
        .map(|(status, colors)| LegendEntry {
            status: status.to_string(),
            colors: colors.clone(),
            count: data.rooms().filter(|r| r.status == status).count(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusShare {
    pub status: String,
    pub count: usize,
    /// 0..=100
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FloorSummary {
    pub key: String,
    pub name: String,
    pub total: usize,
    /// Only statuses with at least one room
    pub statuses: Vec<(String, usize)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub total: usize,
    pub by_status: Vec<StatusShare>,
    pub floors: Vec<FloorSummary>,
}

impl Report {
    pub fn build(data: &BuildingData) -> Self {
        let total = data.room_count();
        let counts = count_statuses(data, data.rooms().map(|r| r.status.as_str()));

        let by_status = counts
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(status, count)| StatusShare {
                percent: count as f64 / total as f64 * 100.0,
                status,
                count,
            })
            .collect();

        let mut keys: Vec<&String> = data.floors.keys().collect();
        keys.sort_by_key(|k| (k.parse::<i64>().map_err(|_| ()), k.to_string()));
        let floors = keys
            .into_iter()
            .map(|key| {
                let floor = &data.floors[key];
                let statuses = count_statuses(data, floor.rooms.iter().map(|r| r.status.as_str()))
                    .into_iter()
                    .filter(|(_, count)| *count > 0)
                    .collect();
                FloorSummary {
                    key: key.clone(),
                    name: floor_name(key),
                    total: floor.rooms.len(),
                    statuses,
                }
            })
            .collect();

        Self {
            total,
            by_status,
            floors,
        }
    }

    /// Plain-text rendering
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Сводка по всем кабинетам");
        let _ = writeln!(out, "Всего кабинетов: {}", self.total);

        if self.total > 0 {
            let _ = writeln!(out);
            let _ = writeln!(out, "Загрузка:");
            for share in &self.by_status {
                let _ = writeln!(out, "  • {}: {} ({:.1}%)", share.status, share.count, share.percent);
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Разбивка по этажам:");
        for floor in &self.floors {
            let _ = writeln!(out, "{} (Всего кабинетов: {})", floor.name, floor.total);
            for (status, count) in &floor.statuses {
                let _ = writeln!(out, "  • {}: {}", status, count);
            }
        }
        out
    }
}

/// Counts per status: known statuses first in palette order, then
/// dangling ones in first-seen order
fn count_statuses<'a>(data: &BuildingData, statuses: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = data.statuses.names().map(|n| (n.to_string(), 0)).collect();
    for status in statuses {
        match counts.iter_mut().find(|(n, _)| n == status) {
            Some(entry) => entry.1 += 1,
            None => counts.push((status.to_string(), 1)),
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomRecord;

    fn doc() -> BuildingData {
        let mut data = BuildingData::default();
        let room = |n: &str, floor: &str, status: &str| {
            let mut r = RoomRecord::new(n.into(), floor.into(), vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
            r.status = status.into();
            r
        };
        data.floor_mut("0").rooms.push(room("1", "0", "занят"));
        data.floor_mut("0").rooms.push(room("2", "0", "свободный"));
        data.floor_mut("10").rooms.push(room("1", "10", "занят"));
        data.floor_mut("2").rooms.push(room("1", "2", "архив"));
        data
    }

    #[test]
    fn test_legend_counts_all_floors() {
        let entries = legend(&doc());
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].status, "свободный");
        assert_eq!(entries[0].count, 1);
        assert_eq!(entries[1].count, 2);
        assert_eq!(entries[3].count, 0);
    }

    #[test]
    fn test_report_percentages_and_floor_order() {
        let report = Report::build(&doc());
        assert_eq!(report.total, 4);
        let occupied = report.by_status.iter().find(|s| s.status == "занят").unwrap();
        assert_eq!(occupied.count, 2);
        assert!((occupied.percent - 50.0).abs() < 1e-9);
        assert_eq!(report.by_status.last().unwrap().status, "архив");

        let keys: Vec<&str> = report.floors.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, vec!["0", "2", "10"]);
        assert_eq!(report.floors[0].name, "Цокольный этаж");
        assert_eq!(report.floors[0].statuses.len(), 2);
    }

    #[test]
    fn test_render_empty_document() {
        let text = Report::build(&BuildingData::default()).render();
        assert!(text.contains("Всего кабинетов: 0"));
        assert!(!text.contains("Загрузка"));
    }

    #[test]
    fn test_render_lists_shares() {
        let text = Report::build(&doc()).render();
        assert!(text.contains("занят: 2 (50.0%)"));
        assert!(text.contains("архив: 1 (25.0%)"));
        assert!(text.contains("10 этаж (Всего кабинетов: 1)"));
    }
}
