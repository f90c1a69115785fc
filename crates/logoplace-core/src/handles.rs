//! Manipulation handles and screen-space hit testing.

use crate::asset::AssetStore;
use crate::gesture::GestureKind;
use crate::placement::PlacementId;
use crate::session::Session;
use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// What part of a placement the pointer grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// The placement's body (moves it).
    Body,
    /// Bottom-right corner (scales it).
    Resize,
    /// Top-right corner (rotates it).
    Rotate,
}

impl HandleKind {
    /// The gesture started by grabbing this handle.
    pub fn gesture(self) -> GestureKind {
        match self {
            HandleKind::Body => GestureKind::Drag,
            HandleKind::Resize => GestureKind::Resize,
            HandleKind::Rotate => GestureKind::Rotate,
        }
    }
}

/// A handle with its on-screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    pub kind: HandleKind,
    /// Position in screen coordinates.
    pub position: Point,
}

impl Handle {
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self { kind, position }
    }

    /// Check if a screen point lies within `radius` of this handle.
    pub fn hit_test(&self, point: Point, radius: f64) -> bool {
        (point - self.position).hypot2() <= radius * radius
    }
}

fn rotate_about(center: Point, offset: Vec2, rotation_deg: f64) -> Point {
    let (sin_r, cos_r) = rotation_deg.to_radians().sin_cos();
    Point::new(
        center.x + offset.x * cos_r - offset.y * sin_r,
        center.y + offset.x * sin_r + offset.y * cos_r,
    )
}

/// Corner handles for a placement drawn at `screen_rect` (unrotated) and
/// rotated by `rotation_deg` about its center.
pub fn placement_handles(screen_rect: Rect, rotation_deg: f64) -> [Handle; 2] {
    let center = screen_rect.center();
    let half_w = screen_rect.width() / 2.0;
    let half_h = screen_rect.height() / 2.0;
    [
        Handle::new(
            HandleKind::Resize,
            rotate_about(center, Vec2::new(half_w, half_h), rotation_deg),
        ),
        Handle::new(
            HandleKind::Rotate,
            rotate_about(center, Vec2::new(half_w, -half_h), rotation_deg),
        ),
    ]
}

/// Find what a screen point grabs on a placement.
///
/// Handles win over the body. `radius` is in screen pixels, so handles keep
/// the same grab area at every zoom level.
pub fn hit_test(screen_rect: Rect, rotation_deg: f64, point: Point, radius: f64) -> Option<HandleKind> {
    for handle in placement_handles(screen_rect, rotation_deg) {
        if handle.hit_test(point, radius) {
            return Some(handle.kind);
        }
    }

    // Undo the rotation and test against the axis-aligned box.
    let center = screen_rect.center();
    let local = rotate_about(center, point - center, -rotation_deg);
    screen_rect.contains(local).then_some(HandleKind::Body)
}

/// Find the topmost placement on the active view under a screen point, and
/// what part of it the point grabs.
///
/// `container` is the unzoomed size of the active view's container and
/// `origin` its top-left corner on screen.
pub fn pick<S: AssetStore>(
    session: &Session<S>,
    container: Size,
    origin: Point,
    point: Point,
) -> Option<(PlacementId, HandleKind)> {
    let settings = session.settings();
    let viewport = session.viewport();
    let placements: Vec<_> = session.snapshot().placements_on_view(session.active_view()).collect();
    // Later placements are drawn on top.
    placements.into_iter().rev().find_map(|p| {
        let rect = viewport.rect_to_screen(origin, p.container_rect(container, settings.base_size));
        hit_test(rect, p.rotation, point, settings.handle_hit_radius).map(|kind| (p.id(), kind))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::png_bytes;
    use crate::session::ProductData;
    use crate::settings::Settings;

    fn rect() -> Rect {
        Rect::new(100.0, 100.0, 200.0, 200.0)
    }

    #[test]
    fn test_unrotated_handle_positions() {
        let [resize, rotate] = placement_handles(rect(), 0.0);
        assert_eq!(resize.kind, HandleKind::Resize);
        assert!((resize.position - Point::new(200.0, 200.0)).hypot() < 1e-9);
        assert_eq!(rotate.kind, HandleKind::Rotate);
        assert!((rotate.position - Point::new(200.0, 100.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_rotated_handle_positions() {
        // A quarter turn moves the bottom-right corner to the bottom-left.
        let [resize, _] = placement_handles(rect(), 90.0);
        assert!((resize.position - Point::new(100.0, 200.0)).hypot() < 1e-9);
    }

    #[test]
    fn test_hit_test_prefers_handles() {
        assert_eq!(hit_test(rect(), 0.0, Point::new(198.0, 198.0), 12.0), Some(HandleKind::Resize));
        assert_eq!(hit_test(rect(), 0.0, Point::new(205.0, 95.0), 12.0), Some(HandleKind::Rotate));
        assert_eq!(hit_test(rect(), 0.0, Point::new(150.0, 150.0), 12.0), Some(HandleKind::Body));
        assert_eq!(hit_test(rect(), 0.0, Point::new(300.0, 300.0), 12.0), None);
    }

    #[test]
    fn test_body_hit_respects_rotation() {
        // Corner region of the unrotated box is empty after a 45 degree turn.
        assert_eq!(hit_test(rect(), 45.0, Point::new(104.0, 104.0), 0.0), None);
        // The rotated box pokes out past the original top edge.
        assert_eq!(hit_test(rect(), 45.0, Point::new(150.0, 85.0), 0.0), Some(HandleKind::Body));
    }

    #[test]
    fn test_pick() {
        let mut session = Session::new(Settings::default());
        session.set_product(ProductData {
            images: vec!["front.png".into()],
            ..ProductData::default()
        });
        let a = session.add_placement(png_bytes()).unwrap();
        let container = Size::new(400.0, 300.0);

        // Placed at 40%/30% with side 150: (160, 90) to (310, 240).
        assert_eq!(pick(&session, container, Point::ZERO, Point::new(200.0, 150.0)), Some((a, HandleKind::Body)));
        assert_eq!(pick(&session, container, Point::ZERO, Point::new(310.0, 240.0)), Some((a, HandleKind::Resize)));
        assert_eq!(pick(&session, container, Point::ZERO, Point::new(312.0, 88.0)), Some((a, HandleKind::Rotate)));
        assert_eq!(pick(&session, container, Point::ZERO, Point::new(10.0, 10.0)), None);

        // Zoom and container offset move the box on screen.
        session.viewport_mut().set_zoom(2.0);
        let origin = Point::new(50.0, 50.0);
        assert_eq!(pick(&session, container, origin, Point::new(200.0, 150.0)), None);
        assert_eq!(pick(&session, container, origin, Point::new(500.0, 400.0)), Some((a, HandleKind::Body)));

        // The most recently added placement is on top.
        let b = session.add_placement(png_bytes()).unwrap();
        assert_eq!(pick(&session, container, origin, Point::new(500.0, 400.0)), Some((b, HandleKind::Body)));
    }

    #[test]
    fn test_handle_maps_to_gesture() {
        assert_eq!(HandleKind::Body.gesture(), GestureKind::Drag);
        assert_eq!(HandleKind::Resize.gesture(), GestureKind::Resize);
        assert_eq!(HandleKind::Rotate.gesture(), GestureKind::Rotate);
    }
}
