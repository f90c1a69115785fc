//! Pointer-driven drag, resize and rotate gestures.
//!
//! A gesture captures the placement's committed values when it starts and
//! derives a preview from them on every move. Nothing reaches the session
//! until the pointer is released (or capture is lost), so each gesture
//! produces at most one history entry.

use crate::asset::AssetStore;
use crate::coords::{GeometryError, ensure_measured, screen_delta_to_percent, unzoom};
use crate::handles::HandleKind;
use crate::input::{PointerEvent, RenderedGeometry};
use crate::placement::{MAX_PERCENT, MIN_SCALE, PlacementId, Transform};
use crate::session::{ConfigError, Session};
use kurbo::{Point, Size};
use thiserror::Error;

/// The manipulation a gesture performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Drag,
    Resize,
    Rotate,
}

/// Gesture errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Values captured when a gesture starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    pub placement: PlacementId,
    /// Screen position of the pointer-down.
    pub start_pointer: Point,
    /// Committed values at pointer-down.
    pub start: Transform,
    /// Latest coherent values.
    pub current: Transform,
    /// Canvas zoom at pointer-down.
    pub zoom: f64,
    /// Container size at pointer-down (drag and resize).
    container: Size,
    sensitivity: f64,
    /// Screen center used for the previous rotate update.
    center: Point,
    /// Pointer angle (degrees) at the previous rotate update.
    last_angle: Option<f64>,
    /// Pointer position that produced `last_angle`.
    last_pointer: Point,
    /// Unwrapped rotation since pointer-down, in degrees.
    swept: f64,
}

/// Manipulation state of the (single) active placement.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    Dragging(Gesture),
    Resizing(Gesture),
    Rotating(Gesture),
}

impl GestureState {
    pub fn kind(&self) -> Option<GestureKind> {
        match self {
            GestureState::Idle => None,
            GestureState::Dragging(_) => Some(GestureKind::Drag),
            GestureState::Resizing(_) => Some(GestureKind::Resize),
            GestureState::Rotating(_) => Some(GestureKind::Rotate),
        }
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        match self {
            GestureState::Idle => None,
            GestureState::Dragging(g) | GestureState::Resizing(g) | GestureState::Rotating(g) => Some(g),
        }
    }

    fn gesture_mut(&mut self) -> Option<&mut Gesture> {
        match self {
            GestureState::Idle => None,
            GestureState::Dragging(g) | GestureState::Resizing(g) | GestureState::Rotating(g) => Some(g),
        }
    }
}

/// What handling an event did.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    Started(GestureKind),
    /// Preview values after a move.
    Updated(Transform),
    /// Gesture ended. `recorded` is false when the values did not change.
    Committed { placement: PlacementId, transform: Transform, recorded: bool },
    /// Event arrived while idle.
    Ignored,
}

/// Angle from `center` to `point` in degrees, or `None` when they coincide.
fn pointer_angle(center: Point, point: Point) -> Option<f64> {
    let v = point - center;
    if v.x == 0.0 && v.y == 0.0 {
        return None;
    }
    Some(v.y.atan2(v.x).to_degrees())
}

/// Wrap an angle difference into `(-180, 180]`.
fn wrap_degrees(delta: f64) -> f64 {
    let d = delta.rem_euclid(360.0);
    if d > 180.0 { d - 360.0 } else { d }
}

impl Gesture {
    fn drag(&self, pointer: Point) -> Result<Transform, GeometryError> {
        let d = screen_delta_to_percent(pointer - self.start_pointer, self.zoom, self.container)?;
        Ok(Transform {
            x: (self.start.x + d.x).clamp(0.0, MAX_PERCENT),
            y: (self.start.y + d.y).clamp(0.0, MAX_PERCENT),
            ..self.start
        })
    }

    fn resize(&self, pointer: Point) -> Result<Transform, GeometryError> {
        let d = unzoom(pointer - self.start_pointer, self.zoom)?;
        Ok(Transform {
            scale: (self.start.scale + (d.x + d.y) * self.sensitivity).max(MIN_SCALE),
            ..self.start
        })
    }

    /// Accumulate the angle swept around the live center since the last move.
    fn rotate(&mut self, pointer: Point, center: Option<Point>) -> Transform {
        if let Some(center) = center.filter(|c| *c != self.center) {
            // Measure the previous pointer against the moved center so only
            // this move's sweep is added.
            self.center = center;
            self.last_angle = pointer_angle(center, self.last_pointer);
        }
        if let Some(angle) = pointer_angle(self.center, pointer) {
            if let Some(last) = self.last_angle {
                self.swept += wrap_degrees(angle - last);
            }
            self.last_angle = Some(angle);
            self.last_pointer = pointer;
        }
        Transform {
            rotation: self.start.rotation + self.swept,
            ..self.start
        }
    }
}

/// Drives gestures for one canvas and commits them to a [`Session`].
#[derive(Debug, Clone, Default)]
pub struct Manipulator {
    state: GestureState,
}

impl Manipulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    /// Values to render for the manipulated placement while a gesture runs.
    pub fn preview(&self) -> Option<(PlacementId, Transform)> {
        self.state.gesture().map(|g| (g.placement, g.current))
    }

    /// Start a gesture on a placement.
    ///
    /// A gesture still running on another placement is committed. Fails with
    /// [`GeometryError::NotReady`] when the container (drag, resize) or the
    /// rendered center (rotate) is unknown; a failed start leaves the
    /// selection unchanged. On success the placement becomes selected.
    pub fn begin<S, G>(
        &mut self,
        session: &mut Session<S>,
        geometry: &G,
        placement: PlacementId,
        handle: HandleKind,
        pointer: Point,
    ) -> Result<GestureKind, GestureError>
    where
        S: AssetStore,
        G: RenderedGeometry + ?Sized,
    {
        if !self.is_idle() {
            self.finish(session)?;
        }
        if !(pointer.x.is_finite() && pointer.y.is_finite()) {
            return Err(GeometryError::NonFinite.into());
        }
        let Some(committed) = session.placement(placement) else {
            return Err(ConfigError::UnknownPlacement(placement).into());
        };
        let start = committed.transform();
        let zoom = session.viewport().zoom;
        let kind = handle.gesture();

        let container = match kind {
            GestureKind::Drag | GestureKind::Resize => {
                let size = geometry.container_size(committed.view_index()).unwrap_or(Size::ZERO);
                ensure_measured(size)?
            }
            GestureKind::Rotate => Size::ZERO,
        };
        let center = match kind {
            GestureKind::Rotate => geometry.screen_center(placement).ok_or(GeometryError::NotReady)?,
            _ => Point::ZERO,
        };

        let gesture = Gesture {
            placement,
            start_pointer: pointer,
            start,
            current: start,
            zoom,
            container,
            sensitivity: session.settings().resize_sensitivity,
            center,
            last_angle: pointer_angle(center, pointer),
            last_pointer: pointer,
            swept: 0.0,
        };
        session.select(Some(placement))?;
        self.state = match kind {
            GestureKind::Drag => GestureState::Dragging(gesture),
            GestureKind::Resize => GestureState::Resizing(gesture),
            GestureKind::Rotate => GestureState::Rotating(gesture),
        };
        log::debug!("Begin {kind:?} on {placement}");
        Ok(kind)
    }

    /// Update the preview from a pointer move.
    ///
    /// A non-finite result aborts the gesture; the placement keeps its
    /// committed values.
    pub fn update<G>(&mut self, geometry: &G, pointer: Point) -> Result<Option<Transform>, GestureError>
    where
        G: RenderedGeometry + ?Sized,
    {
        let kind = self.state.kind();
        let Some(gesture) = self.state.gesture_mut() else {
            return Ok(None);
        };
        let result = if !(pointer.x.is_finite() && pointer.y.is_finite()) {
            Err(GeometryError::NonFinite)
        } else {
            match kind {
                Some(GestureKind::Drag) => gesture.drag(pointer),
                Some(GestureKind::Resize) => gesture.resize(pointer),
                Some(GestureKind::Rotate) => {
                    let center = geometry.screen_center(gesture.placement);
                    Ok(gesture.rotate(pointer, center))
                }
                None => return Ok(None),
            }
        };

        match result {
            Ok(transform) if transform.is_finite() => {
                gesture.current = transform;
                Ok(Some(transform))
            }
            Ok(_) => {
                self.abort();
                Err(GeometryError::NonFinite.into())
            }
            Err(e) => {
                self.abort();
                Err(e.into())
            }
        }
    }

    /// End the gesture and commit its latest values as one recorded action.
    pub fn finish<S: AssetStore>(&mut self, session: &mut Session<S>) -> Result<GestureOutcome, GestureError> {
        let state = std::mem::take(&mut self.state);
        let Some(gesture) = state.gesture() else {
            return Ok(GestureOutcome::Ignored);
        };
        let recorded = session.commit_transform(gesture.placement, gesture.current)?;
        log::debug!("Commit {:?} on {} (changed: {recorded})", state.kind(), gesture.placement);
        Ok(GestureOutcome::Committed {
            placement: gesture.placement,
            transform: gesture.current,
            recorded,
        })
    }

    /// Pointer released at `pointer`: apply the final move, then commit.
    pub fn pointer_up<S, G>(
        &mut self,
        session: &mut Session<S>,
        geometry: &G,
        pointer: Point,
    ) -> Result<GestureOutcome, GestureError>
    where
        S: AssetStore,
        G: RenderedGeometry + ?Sized,
    {
        if self.is_idle() {
            return Ok(GestureOutcome::Ignored);
        }
        self.update(geometry, pointer)?;
        self.finish(session)
    }

    /// Pointer capture revoked: commit the last coherent values.
    pub fn capture_lost<S: AssetStore>(&mut self, session: &mut Session<S>) -> Result<GestureOutcome, GestureError> {
        if let Some(g) = self.state.gesture() {
            log::debug!("Capture lost on {}", g.placement);
        }
        self.finish(session)
    }

    /// Drop the gesture without committing. Returns the placement it was on.
    pub fn abort(&mut self) -> Option<PlacementId> {
        let state = std::mem::take(&mut self.state);
        let placement = state.gesture().map(|g| g.placement);
        if let Some(id) = placement {
            log::warn!("Aborted {:?} on {id}", state.kind());
        }
        placement
    }

    /// Dispatch a pointer event.
    pub fn handle_event<S, G>(
        &mut self,
        session: &mut Session<S>,
        geometry: &G,
        event: &PointerEvent,
    ) -> Result<GestureOutcome, GestureError>
    where
        S: AssetStore,
        G: RenderedGeometry + ?Sized,
    {
        match *event {
            PointerEvent::Down { position, target, placement } => self
                .begin(session, geometry, placement, target, position)
                .map(GestureOutcome::Started),
            PointerEvent::Move { position } => Ok(match self.update(geometry, position)? {
                Some(transform) => GestureOutcome::Updated(transform),
                None => GestureOutcome::Ignored,
            }),
            PointerEvent::Up { position } => self.pointer_up(session, geometry, position),
            PointerEvent::CaptureLost => self.capture_lost(session),
        }
    }
}
