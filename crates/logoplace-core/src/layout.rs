//! Print/export layout: percentage placements translated into document units.

use crate::config::ConfigurationSnapshot;
use crate::placement::{PlacementId, RefinementKind};
use crate::services::ImageRef;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Natural image size assumed for views that were never measured.
pub const DEFAULT_NATURAL_SIZE: Size = Size::new(1000.0, 1000.0);

/// Externally measured sizes for one product view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewMetrics {
    /// Rendered container size while editing.
    #[serde(default)]
    pub container: Option<Size>,
    /// Natural pixel size of the product image.
    #[serde(default)]
    pub natural: Option<Size>,
}

/// One logo on a printed view. All lengths are percentages of the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintItem {
    pub placement: PlacementId,
    pub left_percent: f64,
    pub top_percent: f64,
    /// Width (and height, logos are square) relative to the view width.
    pub width_percent: f64,
    pub rotation: f64,
    pub refinement: RefinementKind,
    pub label: String,
}

/// One product view on the printed quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintView {
    pub view_index: usize,
    pub image: Option<ImageRef>,
    /// Width over height of the natural image.
    pub aspect_ratio: f64,
    pub items: Vec<PrintItem>,
}

/// Views to print, in view order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintLayout {
    pub views: Vec<PrintView>,
}

fn usable(size: Option<Size>) -> Option<Size> {
    size.filter(|s| s.width > 0.0 && s.height > 0.0 && s.width.is_finite() && s.height.is_finite())
}

/// Lay out every view holding placements, or the active view when there are none.
pub fn print_layout(
    snapshot: &ConfigurationSnapshot,
    images: &[ImageRef],
    active_view: usize,
    metrics: &HashMap<usize, ViewMetrics>,
    base_size: f64,
) -> PrintLayout {
    let mut indices: BTreeSet<usize> = snapshot.placements.iter().map(|p| p.view_index()).collect();
    if indices.is_empty() {
        indices.insert(active_view);
    }

    let views = indices
        .into_iter()
        .map(|view_index| {
            let m = metrics.get(&view_index).copied().unwrap_or_default();
            let natural = usable(m.natural).unwrap_or(DEFAULT_NATURAL_SIZE);
            let container = usable(m.container).unwrap_or(natural);

            let items = snapshot
                .placements_on_view(view_index)
                .map(|p| PrintItem {
                    placement: p.id(),
                    left_percent: p.x,
                    top_percent: p.y,
                    width_percent: p.size(base_size) / container.width * 100.0,
                    rotation: p.rotation,
                    refinement: p.refinement,
                    label: p.refinement.label().to_string(),
                })
                .collect();

            PrintView {
                view_index,
                image: images.get(view_index).cloned(),
                aspect_ratio: natural.width / natural.height,
                items,
            }
        })
        .collect();

    PrintLayout { views }
}
