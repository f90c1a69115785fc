//! Contracts for the external image services.
//!
//! Both services are black boxes to the engine. Their failures are never
//! fatal: blueprint errors fall back to the original images, advisor errors
//! leave the placement without a suggestion.

use crate::asset::Asset;
use crate::placement::RefinementKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque reference to a product image (URL, data URL or handle).
pub type ImageRef = String;

/// Number of views a blueprint service must return.
pub const BLUEPRINT_VIEW_COUNT: usize = 4;

/// Generated views, in the order the service returns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlueprintView {
    Front,
    Left,
    Right,
    Back,
}

impl BlueprintView {
    pub const ALL: [BlueprintView; BLUEPRINT_VIEW_COUNT] = [
        BlueprintView::Front,
        BlueprintView::Left,
        BlueprintView::Right,
        BlueprintView::Back,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BlueprintView::Front => "front",
            BlueprintView::Left => "left",
            BlueprintView::Right => "right",
            BlueprintView::Back => "back",
        }
    }
}

/// Blueprint generation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlueprintError {
    #[error("blueprint service failed: {0}")]
    Service(String),
    #[error("blueprint service returned {actual} views, expected {expected}")]
    WrongViewCount { expected: usize, actual: usize },
    #[error("no product image to generate blueprints from")]
    NoReferenceImage,
}

/// Status of the most recent blueprint generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlueprintStatus {
    #[default]
    Idle,
    Loading,
    Done,
    Failed,
}

/// Generates alternate product views from one reference image.
pub trait BlueprintService {
    /// Return exactly [`BLUEPRINT_VIEW_COUNT`] images ordered as [`BlueprintView::ALL`].
    fn generate(&self, reference: &str) -> Result<Vec<ImageRef>, BlueprintError>;
}

/// Check a service result against the expected view count.
pub fn validate_views(views: Vec<ImageRef>) -> Result<Vec<ImageRef>, BlueprintError> {
    if views.len() == BLUEPRINT_VIEW_COUNT {
        Ok(views)
    } else {
        Err(BlueprintError::WrongViewCount {
            expected: BLUEPRINT_VIEW_COUNT,
            actual: views.len(),
        })
    }
}

/// Advisory refinement recommendation for a logo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: RefinementKind,
    pub reasoning: String,
}

/// Refinement advisor errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("refinement advisor failed: {0}")]
pub struct AdvisorError(pub String);

/// Recommends a refinement technique for a logo image.
pub trait RefinementAdvisor {
    fn suggest(&self, asset: &Asset) -> Result<Suggestion, AdvisorError>;
}
