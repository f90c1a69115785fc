//! Logo placements on product views.

use crate::asset::AssetRef;
use crate::money::Money;
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a placement.
pub type PlacementId = Uuid;

/// Smallest allowed scale multiplier.
pub const MIN_SCALE: f64 = 0.2;

/// Upper bound of the percentage coordinate space.
pub const MAX_PERCENT: f64 = 100.0;

/// Finishing technique applied to a logo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RefinementKind {
    Embroidery,
    #[default]
    Print,
}

impl RefinementKind {
    /// Per-unit surcharge for this refinement.
    pub const fn surcharge(self) -> Money {
        match self {
            RefinementKind::Embroidery => Money::from_cents(500),
            RefinementKind::Print => Money::from_cents(300),
        }
    }

    /// Whether this refinement is subject to the minimum order quantity.
    pub const fn requires_moq(self) -> bool {
        matches!(self, RefinementKind::Embroidery)
    }

    pub fn label(self) -> &'static str {
        match self {
            RefinementKind::Embroidery => "Embroidery",
            RefinementKind::Print => "Print",
        }
    }
}

/// The manipulable fields of a placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Left edge in percent of the container width.
    pub x: f64,
    /// Top edge in percent of the container height.
    pub y: f64,
    /// Multiplier of the base size.
    pub scale: f64,
    /// Accumulated rotation in degrees.
    pub rotation: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

impl Transform {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.scale.is_finite() && self.rotation.is_finite()
    }

    /// Clamp position into the container and scale to its floor.
    pub fn clamped(self) -> Self {
        Self {
            x: self.x.clamp(0.0, MAX_PERCENT),
            y: self.y.clamp(0.0, MAX_PERCENT),
            scale: self.scale.max(MIN_SCALE),
            rotation: self.rotation,
        }
    }

    /// Rotation reduced to `[0, 360)`.
    pub fn normalized_rotation(&self) -> f64 {
        self.rotation.rem_euclid(360.0)
    }
}

/// One logo overlay bound to a product view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogoPlacement {
    id: PlacementId,
    asset: AssetRef,
    view_index: usize,
    /// Left edge in percent (0-100).
    pub x: f64,
    /// Top edge in percent (0-100).
    pub y: f64,
    /// Multiplier of the base size, never below [`MIN_SCALE`].
    pub scale: f64,
    /// Degrees, accumulated (not wrapped).
    pub rotation: f64,
    pub refinement: RefinementKind,
    /// Advisory note from the refinement advisor.
    pub ai_suggestion: Option<String>,
}

impl LogoPlacement {
    /// Create a placement at the given percentage position with scale 1 and no rotation.
    pub(crate) fn new(asset: AssetRef, view_index: usize, position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            asset,
            view_index,
            x: position.x.clamp(0.0, MAX_PERCENT),
            y: position.y.clamp(0.0, MAX_PERCENT),
            scale: 1.0,
            rotation: 0.0,
            refinement: RefinementKind::default(),
            ai_suggestion: None,
        }
    }

    pub fn id(&self) -> PlacementId {
        self.id
    }

    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    /// Index of the product view this placement belongs to. Fixed at creation.
    pub fn view_index(&self) -> usize {
        self.view_index
    }

    pub fn transform(&self) -> Transform {
        Transform {
            x: self.x,
            y: self.y,
            scale: self.scale,
            rotation: self.rotation,
        }
    }

    pub(crate) fn set_transform(&mut self, transform: Transform) {
        let t = transform.clamped();
        self.x = t.x;
        self.y = t.y;
        self.scale = t.scale;
        self.rotation = t.rotation;
    }

    /// Side length of the (square) bounding box in base-size units.
    pub fn size(&self, base_size: f64) -> f64 {
        base_size * self.scale
    }

    /// Unrotated bounding box in container pixels.
    pub fn container_rect(&self, container: Size, base_size: f64) -> Rect {
        let origin = crate::coords::percent_to_container(self.x, self.y, container);
        let side = self.size(base_size);
        Rect::from_origin_size(origin, Size::new(side, side))
    }
}
