//! Coordinate model: screen pixels, container pixels and percentages.
//!
//! Placements store their position as a percentage of the product container,
//! so they stay put when the container is resized or the canvas is zoomed.
//! Pointer input arrives in screen pixels, already scaled by the canvas zoom.

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Zoom level that corresponds to "100%" in the UI.
pub const DEFAULT_ZOOM: f64 = 1.0;

/// Geometry errors. Recovered locally by aborting the gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    #[error("container has not been measured yet")]
    NotReady,
    #[error("invalid zoom factor: {0}")]
    InvalidZoom(f64),
    #[error("geometry produced a non-finite value")]
    NonFinite,
}

/// Result type for coordinate conversions.
pub type GeometryResult<T> = Result<T, GeometryError>;

/// Check that a container has been measured (non-zero, finite dimensions).
pub fn ensure_measured(container: Size) -> GeometryResult<Size> {
    let measured = container.width.is_finite()
        && container.height.is_finite()
        && container.width > 0.0
        && container.height > 0.0;
    if measured {
        Ok(container)
    } else {
        Err(GeometryError::NotReady)
    }
}

fn ensure_zoom(zoom: f64) -> GeometryResult<f64> {
    if zoom.is_finite() && zoom > 0.0 {
        Ok(zoom)
    } else {
        Err(GeometryError::InvalidZoom(zoom))
    }
}

fn finite(v: Vec2) -> GeometryResult<Vec2> {
    if v.x.is_finite() && v.y.is_finite() {
        Ok(v)
    } else {
        Err(GeometryError::NonFinite)
    }
}

/// Remove the canvas zoom from a screen-space delta.
pub fn unzoom(delta: Vec2, zoom: f64) -> GeometryResult<Vec2> {
    let zoom = ensure_zoom(zoom)?;
    finite(delta / zoom)
}

/// Convert a screen-space pointer delta into a percentage delta of the container.
///
/// `container` is the unzoomed container size, measured once at gesture start.
pub fn screen_delta_to_percent(delta: Vec2, zoom: f64, container: Size) -> GeometryResult<Vec2> {
    let container = ensure_measured(container)?;
    let d = unzoom(delta, zoom)?;
    finite(Vec2::new(
        d.x / container.width * 100.0,
        d.y / container.height * 100.0,
    ))
}

/// Convert a percentage position into container pixels.
pub fn percent_to_container(x: f64, y: f64, container: Size) -> Point {
    Point::new(x / 100.0 * container.width, y / 100.0 * container.height)
}

/// Scale factor for fixed-size affordances (handles) drawn inside the zoomed canvas.
pub fn handle_scale(zoom: f64) -> GeometryResult<f64> {
    Ok(1.0 / ensure_zoom(zoom)?)
}

/// Canvas zoom state.
///
/// Zoom is a view concern: it never enters the configuration history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Current zoom factor (1.0 = 100%).
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Increment applied by `zoom_in`/`zoom_out`.
    pub step: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            min_zoom: 0.5,
            max_zoom: 3.0,
            step: 0.25,
        }
    }
}

impl Viewport {
    /// Create a viewport with the given bounds and step.
    ///
    /// Bounds that are not positive, finite and ordered fall back to the
    /// default range.
    pub fn new(min_zoom: f64, max_zoom: f64, step: f64) -> Self {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        let defaults = Self::default();
        let (min_zoom, max_zoom) = if valid(min_zoom) && valid(max_zoom) && min_zoom <= max_zoom {
            (min_zoom, max_zoom)
        } else {
            log::warn!("Invalid zoom bounds {min_zoom}..{max_zoom}, using defaults");
            (defaults.min_zoom, defaults.max_zoom)
        };
        Self {
            zoom: DEFAULT_ZOOM.max(min_zoom).min(max_zoom),
            min_zoom,
            max_zoom,
            step,
        }
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + self.step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - self.step);
    }

    /// Set the zoom, clamped to the allowed range. Non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.max(self.min_zoom).min(self.max_zoom);
        }
    }

    /// Reset zoom to 100%.
    pub fn reset(&mut self) {
        self.set_zoom(DEFAULT_ZOOM);
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom < self.max_zoom
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom > self.min_zoom
    }

    /// Scale for handles so they keep a constant on-screen size.
    pub fn handle_scale(&self) -> f64 {
        1.0 / self.zoom
    }

    /// Map a point in container pixels to the screen, given the container's on-screen origin.
    pub fn container_to_screen(&self, origin: Point, point: Point) -> Point {
        origin + point.to_vec2() * self.zoom
    }

    /// Map a rectangle in container pixels to the screen.
    pub fn rect_to_screen(&self, origin: Point, rect: Rect) -> Rect {
        let p0 = self.container_to_screen(origin, Point::new(rect.x0, rect.y0));
        let p1 = self.container_to_screen(origin, Point::new(rect.x1, rect.y1));
        Rect::from_points(p0, p1)
    }
}
