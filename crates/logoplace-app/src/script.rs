//! Replay script format.
//!
//! Placement ids are random, so steps refer to logos by the order in which
//! they were added (`0` is the first `add_logo`).

use kurbo::{Point, Size};
use logoplace_core::{HandleKind, ProductData, RefinementKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A scripted configuration session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    pub product: ProductData,
    #[serde(default)]
    pub geometry: ScriptGeometry,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Host measurements for the replay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptGeometry {
    /// Rendered container size per view.
    #[serde(default)]
    pub containers: HashMap<usize, Size>,
    /// Natural image size per view, for the print layout.
    #[serde(default)]
    pub natural: HashMap<usize, Size>,
    /// Screen center per logo (by add order).
    #[serde(default)]
    pub centers: HashMap<usize, Point>,
    /// Screen position of each view's container top-left corner.
    #[serde(default)]
    pub origins: HashMap<usize, Point>,
}

/// Where a logo's image bytes come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoSource {
    /// Base64-encoded bytes.
    Base64(String),
    /// File path, relative to the script's directory.
    Path(PathBuf),
}

/// Pointer event addressed by logo index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptPointer {
    Down {
        position: Point,
        target: HandleKind,
        logo: usize,
    },
    Move {
        position: Point,
    },
    Up {
        position: Point,
    },
    CaptureLost,
}

/// Outcome of a scripted blueprint service call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlueprintResponse {
    Views(Vec<String>),
    Error(String),
}

/// One scripted user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    SetActiveView { index: usize },
    AddLogo { logo: LogoSource },
    DeleteLogo { logo: usize },
    SetRefinement { logo: usize, kind: RefinementKind },
    SetQuantity { size: String, quantity: i64 },
    SetUnsure { unsure: bool },
    SetEstimatedTotal { total: i64 },
    Select { logo: Option<usize> },
    Pointer { event: ScriptPointer },
    /// Pointer pressed at a screen point; the target is found by hit testing.
    Press { position: Point },
    SetContainer { view: usize, size: Size },
    SetCenter { logo: usize, center: Point },
    SetZoom { zoom: f64 },
    ZoomIn,
    ZoomOut,
    ZoomReset,
    Undo,
    Redo,
    Blueprints { response: BlueprintResponse },
    Suggest { logo: usize, kind: RefinementKind, reasoning: String },
}
