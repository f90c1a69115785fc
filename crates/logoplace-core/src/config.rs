//! Configuration snapshot: the undoable part of a session.

use crate::asset::AssetId;
use crate::money::Money;
use crate::placement::{LogoPlacement, PlacementId};
use crate::pricing::{Quote, compute_quote};
use serde::{Deserialize, Serialize};

/// Garment sizes offered when the product does not specify any.
pub const DEFAULT_SIZES: [&str; 9] = ["XS", "S", "M", "L", "XL", "2XL", "3XL", "4XL", "5XL"];

/// Ordered quantity for one size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeQuantity {
    pub size: String,
    pub quantity: u32,
}

/// Per-size quantities, in the order the sizes are offered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeQuantities(Vec<SizeQuantity>);

impl SizeQuantities {
    /// Zero quantities for the given sizes. Duplicate sizes are ignored.
    pub fn with_sizes<I, S>(sizes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut lines: Vec<SizeQuantity> = Vec::new();
        for size in sizes {
            let size = size.into();
            if !lines.iter().any(|l| l.size == size) {
                lines.push(SizeQuantity { size, quantity: 0 });
            }
        }
        Self(lines)
    }

    /// Quantity for a size, if the size is offered.
    pub fn get(&self, size: &str) -> Option<u32> {
        self.0.iter().find(|l| l.size == size).map(|l| l.quantity)
    }

    /// Set the quantity for an offered size. Returns false if the size is unknown.
    pub(crate) fn set(&mut self, size: &str, quantity: u32) -> bool {
        match self.0.iter_mut().find(|l| l.size == size) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Sum of all quantities.
    pub fn total(&self) -> u32 {
        self.0.iter().fold(0u32, |acc, l| acc.saturating_add(l.quantity))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SizeQuantity> {
        self.0.iter()
    }

    pub fn sizes(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|l| l.size.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything the user edits that undo/redo should restore.
///
/// Selection, blueprint status and zoom are deliberately absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSnapshot {
    /// Placements in insertion (and stacking) order.
    pub placements: Vec<LogoPlacement>,
    pub quantities: SizeQuantities,
    /// When set, `estimated_total` replaces the per-size sum.
    pub unsure_about_sizes: bool,
    pub estimated_total: u32,
    pub base_price: Option<Money>,
}

impl Default for ConfigurationSnapshot {
    fn default() -> Self {
        Self::new(SizeQuantities::with_sizes(DEFAULT_SIZES), None)
    }
}

impl ConfigurationSnapshot {
    /// Create an empty configuration.
    pub fn new(quantities: SizeQuantities, base_price: Option<Money>) -> Self {
        Self {
            placements: Vec::new(),
            quantities,
            unsure_about_sizes: false,
            estimated_total: 0,
            base_price,
        }
    }

    pub fn placement(&self, id: PlacementId) -> Option<&LogoPlacement> {
        self.placements.iter().find(|p| p.id() == id)
    }

    pub(crate) fn placement_mut(&mut self, id: PlacementId) -> Option<&mut LogoPlacement> {
        self.placements.iter_mut().find(|p| p.id() == id)
    }

    pub fn contains(&self, id: PlacementId) -> bool {
        self.placement(id).is_some()
    }

    pub(crate) fn add_placement(&mut self, placement: LogoPlacement) {
        self.placements.push(placement);
    }

    pub(crate) fn remove_placement(&mut self, id: PlacementId) -> Option<LogoPlacement> {
        let index = self.placements.iter().position(|p| p.id() == id)?;
        Some(self.placements.remove(index))
    }

    /// Placements bound to one product view.
    pub fn placements_on_view(&self, view_index: usize) -> impl Iterator<Item = &LogoPlacement> {
        self.placements.iter().filter(move |p| p.view_index() == view_index)
    }

    /// Assets referenced by this snapshot.
    pub fn asset_ids(&self) -> impl Iterator<Item = AssetId> + '_ {
        self.placements.iter().map(|p| p.asset().id())
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Price and MOQ summary for this configuration.
    pub fn quote(&self) -> Quote {
        compute_quote(
            &self.placements,
            &self.quantities,
            self.unsure_about_sizes,
            self.estimated_total,
            self.base_price,
        )
    }

    /// Serialize the snapshot to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetRef, ImageFormat};
    use kurbo::Point;

    fn placement(view: usize) -> LogoPlacement {
        LogoPlacement::new(AssetRef::new(ImageFormat::Png), view, Point::new(40.0, 30.0))
    }

    #[test]
    fn test_default_sizes() {
        let snapshot = ConfigurationSnapshot::default();
        let sizes: Vec<&str> = snapshot.quantities.sizes().collect();
        assert_eq!(sizes, DEFAULT_SIZES.to_vec());
        assert_eq!(snapshot.quantities.total(), 0);
    }

    #[test]
    fn test_quantities() {
        let mut q = SizeQuantities::with_sizes(["S", "M", "M", "L"]);
        assert_eq!(q.len(), 3);
        assert!(q.set("M", 4));
        assert!(q.set("L", 6));
        assert!(!q.set("XXL", 1));
        assert_eq!(q.get("M"), Some(4));
        assert_eq!(q.get("XXL"), None);
        assert_eq!(q.total(), 10);
    }

    #[test]
    fn test_add_remove_placement() {
        let mut snapshot = ConfigurationSnapshot::default();
        let p = placement(0);
        let id = p.id();
        snapshot.add_placement(p);
        assert!(snapshot.contains(id));
        assert_eq!(snapshot.len(), 1);

        let removed = snapshot.remove_placement(id);
        assert!(removed.is_some());
        assert!(snapshot.is_empty());
        assert!(snapshot.remove_placement(id).is_none());
    }

    #[test]
    fn test_placements_on_view() {
        let mut snapshot = ConfigurationSnapshot::default();
        snapshot.add_placement(placement(0));
        snapshot.add_placement(placement(1));
        snapshot.add_placement(placement(1));
        assert_eq!(snapshot.placements_on_view(1).count(), 2);
        assert_eq!(snapshot.placements_on_view(2).count(), 0);
        assert_eq!(snapshot.asset_ids().count(), 3);
    }

    #[test]
    fn test_snapshot_json_roundtrip() {
        let mut snapshot = ConfigurationSnapshot::default();
        snapshot.add_placement(placement(0));
        snapshot.base_price = Some(Money::from_cents(2000));
        let json = snapshot.to_json().unwrap();
        let back: ConfigurationSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
