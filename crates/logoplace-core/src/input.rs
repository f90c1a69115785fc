//! Pointer input and live rendering measurements.

use crate::handles::HandleKind;
use crate::placement::PlacementId;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    /// Pointer pressed over a placement's body or one of its handles.
    Down {
        position: Point,
        target: HandleKind,
        placement: PlacementId,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
    },
    /// Pointer capture revoked without an up event (window blur, touch cancel).
    CaptureLost,
}

impl PointerEvent {
    /// Screen position carried by the event, if any.
    pub fn position(&self) -> Option<Point> {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Up { position } => Some(*position),
            PointerEvent::CaptureLost => None,
        }
    }
}

/// Measurements of what the host actually rendered.
pub trait RenderedGeometry {
    /// Unzoomed pixel size of the container showing a product view.
    /// `None` (or a zero size) when the view has not been laid out yet.
    fn container_size(&self, view_index: usize) -> Option<Size>;

    /// Screen-space center of a placement's rendered bounding box.
    fn screen_center(&self, placement: PlacementId) -> Option<Point>;
}

/// Fixed measurements, for replays and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticGeometry {
    #[serde(default)]
    pub containers: HashMap<usize, Size>,
    #[serde(default)]
    pub centers: HashMap<PlacementId, Point>,
}

impl StaticGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_container(mut self, view_index: usize, size: Size) -> Self {
        self.containers.insert(view_index, size);
        self
    }

    pub fn set_center(&mut self, placement: PlacementId, center: Point) {
        self.centers.insert(placement, center);
    }
}

impl RenderedGeometry for StaticGeometry {
    fn container_size(&self, view_index: usize) -> Option<Size> {
        self.containers.get(&view_index).copied()
    }

    fn screen_center(&self, placement: PlacementId) -> Option<Point> {
        self.centers.get(&placement).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_event_json_shape() {
        let id = Uuid::new_v4();
        let event = PointerEvent::Down {
            position: Point::new(1.0, 2.0),
            target: HandleKind::Rotate,
            placement: id,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "down");
        assert_eq!(json["target"], "Rotate");

        let lost: PointerEvent = serde_json::from_str(r#"{ "type": "capture_lost" }"#).unwrap();
        assert_eq!(lost, PointerEvent::CaptureLost);
        assert_eq!(lost.position(), None);
    }

    #[test]
    fn test_static_geometry() {
        let id = Uuid::new_v4();
        let mut geometry = StaticGeometry::new().with_container(0, Size::new(400.0, 300.0));
        geometry.set_center(id, Point::new(10.0, 20.0));
        assert_eq!(geometry.container_size(0), Some(Size::new(400.0, 300.0)));
        assert_eq!(geometry.container_size(1), None);
        assert_eq!(geometry.screen_center(id), Some(Point::new(10.0, 20.0)));
    }
}
