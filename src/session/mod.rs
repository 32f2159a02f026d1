//! Drawing session for room polygons
//!
//! Three states:
//! - idle: nothing in progress
//! - drawing-new: collecting vertices for a room that doesn't exist yet
//! - editing-existing: reshaping the polygon of a stored room
//!
//! Left clicks append vertices, handles can be dragged, selected and deleted, and a
//! finish (right click) hands back the ordered vertex list once at least
//! three vertices exist. The session never touches the document; the
//! controller applies the [`Finished`] outcome.

use tracing::debug;

use crate::scene::{Point, RoomId};

/// Minimum vertex count of a room polygon
pub const MIN_VERTICES: usize = 3;

/// Side length of a vertex handle marker, in scene units
pub const HANDLE_SIZE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Not enough points for a polygon ({0}), at least 3 are needed")]
    NotEnoughPoints(usize),

    #[error("Cannot delete this point: a polygon must keep at least 3 vertices")]
    TooFewVertices,

    #[error("No point selected")]
    NoSelection,

    #[error("Finish the current action before starting a new one")]
    Busy,

    #[error("No drawing in progress")]
    NotDrawing,
}

/// A draggable vertex marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub index: usize,
    pub center: Point,
    pub selected: bool,
}

impl Handle {
    pub fn contains(&self, p: Point, radius: f64) -> bool {
        (p.x - self.center.x).abs() <= radius && (p.y - self.center.y).abs() <= radius
    }
}

/// Transient visuals of the session, rebuilt by the operations below
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    /// Closed outline through all vertices
    pub outline: Vec<Point>,
    pub handles: Vec<Handle>,
}

/// What a finished session produced
#[derive(Debug, Clone, PartialEq)]
pub enum Finished {
    NewRoom(Vec<Point>),
    EditedRoom { room: RoomId, points: Vec<Point> },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DrawingSession {
    #[default]
    Idle,
    DrawingNew {
        points: Vec<Point>,
        selected: Option<usize>,
        overlay: Overlay,
    },
    EditingExisting {
        room: RoomId,
        points: Vec<Point>,
        selected: Option<usize>,
        overlay: Overlay,
    },
}

impl DrawingSession {
    pub fn is_idle(&self) -> bool {
        matches!(self, DrawingSession::Idle)
    }

    pub fn is_drawing(&self) -> bool {
        !self.is_idle()
    }

    /// Room being reshaped, if any
    pub fn editing_room(&self) -> Option<RoomId> {
        match self {
            DrawingSession::EditingExisting { room, .. } => Some(*room),
            _ => None,
        }
    }

    pub fn points(&self) -> &[Point] {
        match self {
            DrawingSession::Idle => &[],
            DrawingSession::DrawingNew { points, .. }
            | DrawingSession::EditingExisting { points, .. } => points,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        match self {
            DrawingSession::Idle => None,
            DrawingSession::DrawingNew { selected, .. }
            | DrawingSession::EditingExisting { selected, .. } => *selected,
        }
    }

    pub fn overlay(&self) -> Option<&Overlay> {
        match self {
            DrawingSession::Idle => None,
            DrawingSession::DrawingNew { overlay, .. }
            | DrawingSession::EditingExisting { overlay, .. } => Some(overlay),
        }
    }

    /// idle → drawing-new
    pub fn start_new(&mut self) -> Result<(), SessionError> {
        if self.is_drawing() {
            return Err(SessionError::Busy);
        }
        *self = DrawingSession::DrawingNew {
            points: Vec::new(),
            selected: None,
            overlay: Overlay::default(),
        };
        debug!("Drawing session started for a new room");
        Ok(())
    }

    /// idle → editing-existing, seeded with the room's stored vertices
    pub fn start_edit(&mut self, room: RoomId, points: Vec<Point>) -> Result<(), SessionError> {
        if self.is_drawing() {
            return Err(SessionError::Busy);
        }
        *self = DrawingSession::EditingExisting {
            room,
            points,
            selected: None,
            overlay: Overlay::default(),
        };
        self.redraw_all();
        debug!("Drawing session started for room {:?}", room);
        Ok(())
    }

    /// Left click: append a vertex (already in scene coordinates)
    pub fn add_point(&mut self, p: Point) -> Result<(), SessionError> {
        let (points, _) = self.parts_mut().ok_or(SessionError::NotDrawing)?;
        points.push(p);
        debug!("Point added: ({}, {})", p.x, p.y);
        self.redraw_all();
        Ok(())
    }

    /// Take back the most recently added vertex
    pub fn pop_point(&mut self) -> Result<Option<Point>, SessionError> {
        let (points, selected) = self.parts_mut().ok_or(SessionError::NotDrawing)?;
        let popped = points.pop();
        if selected.is_some_and(|i| i >= points.len()) {
            *selected = None;
        }
        self.redraw_all();
        Ok(popped)
    }

    /// Handle drag release: move vertex `index`; only the outline is redrawn
    pub fn move_vertex(&mut self, index: usize, p: Point) -> Result<(), SessionError> {
        let (points, _) = self.parts_mut().ok_or(SessionError::NotDrawing)?;
        if let Some(vertex) = points.get_mut(index) {
            *vertex = p;
        }
        self.redraw_outline();
        Ok(())
    }

    /// Topmost handle around `p`
    pub fn handle_at(&self, p: Point, radius: f64) -> Option<usize> {
        self.overlay()?
            .handles
            .iter()
            .rev()
            .find(|h| h.contains(p, radius))
            .map(|h| h.index)
    }

    pub fn select_handle(&mut self, index: Option<usize>) -> Result<(), SessionError> {
        let len = self.points().len();
        let selected = match self {
            DrawingSession::Idle => return Err(SessionError::NotDrawing),
            DrawingSession::DrawingNew { selected, .. }
            | DrawingSession::EditingExisting { selected, .. } => selected,
        };
        *selected = index.filter(|i| *i < len);
        self.redraw_handles();
        Ok(())
    }

    /// Delete key: remove the selected vertex, keeping at least three
    pub fn delete_selected(&mut self) -> Result<(), SessionError> {
        let (points, selected) = self.parts_mut().ok_or(SessionError::NotDrawing)?;
        let index = selected.ok_or(SessionError::NoSelection)?;
        if points.len() <= MIN_VERTICES {
            return Err(SessionError::TooFewVertices);
        }
        if index < points.len() {
            points.remove(index);
        }
        *selected = None;
        self.redraw_all();
        Ok(())
    }

    /// Right click: finish with at least three vertices and return to idle
    ///
    /// With fewer vertices the session stays as it is.
    pub fn finish(&mut self) -> Result<Finished, SessionError> {
        let count = self.points().len();
        if self.is_idle() {
            return Err(SessionError::NotDrawing);
        }
        if count < MIN_VERTICES {
            return Err(SessionError::NotEnoughPoints(count));
        }
        let finished = match std::mem::take(self) {
            DrawingSession::DrawingNew { points, .. } => Finished::NewRoom(points),
            DrawingSession::EditingExisting { room, points, .. } => {
                Finished::EditedRoom { room, points }
            }
            DrawingSession::Idle => return Err(SessionError::NotDrawing),
        };
        debug!("Drawing session finished with {} point(s)", count);
        Ok(finished)
    }

    /// Discard everything and return to idle
    pub fn abort(&mut self) {
        if self.is_drawing() {
            debug!("Drawing session aborted");
        }
        *self = DrawingSession::Idle;
    }

    fn parts_mut(&mut self) -> Option<(&mut Vec<Point>, &mut Option<usize>)> {
        match self {
            DrawingSession::Idle => None,
            DrawingSession::DrawingNew {
                points, selected, ..
            }
            | DrawingSession::EditingExisting {
                points, selected, ..
            } => Some((points, selected)),
        }
    }

    fn redraw_all(&mut self) {
        self.redraw_outline();
        self.redraw_handles();
    }

    fn redraw_outline(&mut self) {
        if let DrawingSession::DrawingNew {
            points, overlay, ..
        }
        | DrawingSession::EditingExisting {
            points, overlay, ..
        } = self
        {
            overlay.outline = closed_outline(points);
        }
    }

    fn redraw_handles(&mut self) {
        if let DrawingSession::DrawingNew {
            points,
            selected,
            overlay,
        }
        | DrawingSession::EditingExisting {
            points,
            selected,
            overlay,
            ..
        } = self
        {
            overlay.handles = points
                .iter()
                .enumerate()
                .map(|(index, p)| Handle {
                    index,
                    center: *p,
                    selected: *selected == Some(index),
                })
                .collect();
        }
    }
}

/// Path through all vertices, closed back to the first once there are two
pub fn closed_outline(points: &[Point]) -> Vec<Point> {
    let mut path = points.to_vec();
    if points.len() > 1 {
        path.push(points[0]);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn drawing(points: &[(f64, f64)]) -> DrawingSession {
        let mut session = DrawingSession::default();
        session.start_new().unwrap();
        for (x, y) in points {
            session.add_point(p(*x, *y)).unwrap();
        }
        session
    }

    #[test]
    fn test_finish_returns_clicked_points_in_order() {
        let mut session = drawing(&[(10.0, 10.0), (100.0, 10.0), (100.0, 100.0), (5.0, 50.0)]);
        let finished = session.finish().unwrap();
        assert_eq!(
            finished,
            Finished::NewRoom(vec![p(10.0, 10.0), p(100.0, 10.0), p(100.0, 100.0), p(5.0, 50.0)])
        );
        assert!(session.is_idle());
        assert!(session.overlay().is_none());
    }

    #[test]
    fn test_finish_with_two_points_stays_drawing() {
        let mut session = drawing(&[(0.0, 0.0), (1.0, 1.0)]);
        assert_eq!(session.finish(), Err(SessionError::NotEnoughPoints(2)));
        assert!(matches!(session, DrawingSession::DrawingNew { .. }));
        assert_eq!(session.points().len(), 2);
    }

    #[test]
    fn test_delete_rejected_at_three_vertices() {
        let mut session = drawing(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        session.select_handle(Some(1)).unwrap();
        assert_eq!(session.delete_selected(), Err(SessionError::TooFewVertices));
        assert_eq!(session.points().len(), 3);
    }

    #[test]
    fn test_delete_selected_vertex() {
        let mut session = drawing(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert_eq!(session.delete_selected(), Err(SessionError::NoSelection));
        session.select_handle(Some(1)).unwrap();
        session.delete_selected().unwrap();
        assert_eq!(session.points(), &[p(0.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)]);
        let overlay = session.overlay().unwrap();
        assert_eq!(overlay.handles.len(), 3);
        assert_eq!(overlay.outline.len(), 4);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn test_move_vertex_redraws_outline_only() {
        let mut session = drawing(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        session.move_vertex(2, p(20.0, 20.0)).unwrap();
        let overlay = session.overlay().unwrap();
        assert_eq!(overlay.outline[2], p(20.0, 20.0));
        // handles keep the position they were dragged from until the next full redraw
        assert_eq!(overlay.handles[2].center, p(10.0, 10.0));
        assert_eq!(session.points()[2], p(20.0, 20.0));
    }

    #[test]
    fn test_edit_session_carries_room_and_points() {
        let mut session = DrawingSession::default();
        let seed = vec![p(1.0, 1.0), p(5.0, 1.0), p(5.0, 5.0)];
        session.start_edit(RoomId(4), seed.clone()).unwrap();
        assert_eq!(session.editing_room(), Some(RoomId(4)));
        assert_eq!(session.overlay().unwrap().handles.len(), 3);

        session.add_point(p(1.0, 5.0)).unwrap();
        match session.finish().unwrap() {
            Finished::EditedRoom { room, points } => {
                assert_eq!(room, RoomId(4));
                assert_eq!(points.len(), 4);
                assert_eq!(&points[..3], seed.as_slice());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_cannot_start_while_drawing() {
        let mut session = drawing(&[(0.0, 0.0)]);
        assert_eq!(session.start_new(), Err(SessionError::Busy));
        assert_eq!(session.start_edit(RoomId(0), vec![]), Err(SessionError::Busy));
        session.abort();
        assert!(session.is_idle());
        assert!(session.start_new().is_ok());
    }

    #[test]
    fn test_idle_rejects_edits() {
        let mut session = DrawingSession::Idle;
        assert_eq!(session.add_point(p(0.0, 0.0)), Err(SessionError::NotDrawing));
        assert_eq!(session.finish(), Err(SessionError::NotDrawing));
    }

    #[test]
    fn test_handle_hit_testing() {
        let session = drawing(&[(0.0, 0.0), (50.0, 0.0), (50.0, 50.0)]);
        assert_eq!(session.handle_at(p(52.0, 48.0), HANDLE_SIZE / 2.0), Some(2));
        assert_eq!(session.handle_at(p(25.0, 25.0), HANDLE_SIZE / 2.0), None);
    }

    #[test]
    fn test_closed_outline() {
        assert!(closed_outline(&[]).is_empty());
        assert_eq!(closed_outline(&[p(1.0, 1.0)]).len(), 1);
        let path = closed_outline(&[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)]);
        assert_eq!(path.len(), 4);
        assert_eq!(path[3], p(0.0, 0.0));
    }
}
