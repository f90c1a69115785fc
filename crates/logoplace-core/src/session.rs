//! Configuration session: the explicit store every action goes through.
//!
//! The session owns the active [`ConfigurationSnapshot`], its undo history,
//! the asset store and the transient UI state (selection, active view, zoom,
//! blueprint status). Every recorded action snapshots the configuration
//! before mutating it.

use crate::asset::{Asset, AssetError, AssetId, AssetStore, MemoryAssets};
use crate::config::{ConfigurationSnapshot, DEFAULT_SIZES, SizeQuantities};
use crate::coords::{GeometryError, Viewport};
use crate::history::History;
use crate::money::Money;
use crate::placement::{LogoPlacement, PlacementId, RefinementKind, Transform};
use crate::pricing::Quote;
use crate::services::{
    BlueprintError, BlueprintService, BlueprintStatus, ImageRef, RefinementAdvisor, Suggestion,
    validate_views,
};
use crate::settings::Settings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Incoming product data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductData {
    /// Ordered product views.
    pub images: Vec<ImageRef>,
    /// Offered sizes; [`DEFAULT_SIZES`] when absent or empty.
    #[serde(default)]
    pub sizes: Option<Vec<String>>,
    #[serde(default)]
    pub base_price: Option<Money>,
    /// Shop reference, informational only.
    #[serde(default)]
    pub product_ref: Option<String>,
}

/// Rejected session actions. A rejected action leaves the session untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("placement limit of {max} reached")]
    CapacityExceeded { max: usize },
    #[error("unknown placement {0}")]
    UnknownPlacement(PlacementId),
    #[error("view index {index} out of range ({count} views)")]
    InvalidView { index: usize, count: usize },
    #[error("unknown size `{0}`")]
    UnknownSize(String),
    #[error("placement {0} appears more than once")]
    DuplicatePlacement(PlacementId),
    #[error("image {0} is not in the asset store")]
    MissingAsset(AssetId),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Session state that never enters history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransientState {
    pub selected: Option<PlacementId>,
    pub active_view: usize,
    pub zoom: f64,
    pub blueprint_status: BlueprintStatus,
    pub blueprint_error: Option<String>,
}

/// A configuration session.
pub struct Session<S: AssetStore = MemoryAssets> {
    settings: Settings,
    snapshot: ConfigurationSnapshot,
    history: History<ConfigurationSnapshot>,
    assets: S,
    images: Vec<ImageRef>,
    /// Images as supplied with the product, before any blueprint replacement.
    original_images: Vec<ImageRef>,
    product_ref: Option<String>,
    active_view: usize,
    selected: Option<PlacementId>,
    viewport: Viewport,
    blueprint_status: BlueprintStatus,
    blueprint_error: Option<String>,
}

impl Session<MemoryAssets> {
    /// Create a session with in-memory asset storage.
    pub fn new(settings: Settings) -> Self {
        Self::with_store(settings, MemoryAssets::new())
    }
}

impl Default for Session<MemoryAssets> {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl<S: AssetStore> Session<S> {
    /// Create a session backed by the given asset store.
    ///
    /// Settings that fail [`Settings::validate`] are replaced by the defaults.
    pub fn with_store(settings: Settings, assets: S) -> Self {
        let settings = match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                log::warn!("{e}, using default settings");
                Settings::default()
            }
        };
        log::info!(
            "Starting configuration session (max {} logos, history {})",
            settings.max_placements,
            settings.history_limit
        );
        Self {
            history: History::new(settings.history_limit),
            viewport: settings.viewport(),
            settings,
            snapshot: ConfigurationSnapshot::default(),
            assets,
            images: Vec::new(),
            original_images: Vec::new(),
            product_ref: None,
            active_view: 0,
            selected: None,
            blueprint_status: BlueprintStatus::Idle,
            blueprint_error: None,
        }
    }

    // --- Accessors ---

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The active configuration.
    pub fn snapshot(&self) -> &ConfigurationSnapshot {
        &self.snapshot
    }

    pub fn placements(&self) -> &[LogoPlacement] {
        &self.snapshot.placements
    }

    pub fn placement(&self, id: PlacementId) -> Option<&LogoPlacement> {
        self.snapshot.placement(id)
    }

    pub fn images(&self) -> &[ImageRef] {
        &self.images
    }

    pub fn original_images(&self) -> &[ImageRef] {
        &self.original_images
    }

    pub fn product_ref(&self) -> Option<&str> {
        self.product_ref.as_deref()
    }

    pub fn active_view(&self) -> usize {
        self.active_view
    }

    pub fn selected(&self) -> Option<PlacementId> {
        self.selected
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Zoom controls. Zoom is never recorded.
    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn blueprint_status(&self) -> BlueprintStatus {
        self.blueprint_status
    }

    pub fn blueprint_error(&self) -> Option<&str> {
        self.blueprint_error.as_deref()
    }

    pub fn assets(&self) -> &S {
        &self.assets
    }

    /// Stored bytes for a placement's logo.
    pub fn asset_for(&self, id: PlacementId) -> Option<&Asset> {
        let placement = self.placement(id)?;
        self.assets.get(placement.asset().id())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Number of recorded undo states.
    pub fn undo_depth(&self) -> usize {
        self.history.past_len()
    }

    /// Current quote, derived on read.
    pub fn quote(&self) -> Quote {
        self.snapshot.quote()
    }

    // --- Persistence boundary ---

    /// The persisted part of the session: a copy of the active configuration.
    pub fn partialize(&self) -> ConfigurationSnapshot {
        self.snapshot.clone()
    }

    /// The part of the session excluded from snapshots.
    pub fn transient(&self) -> TransientState {
        TransientState {
            selected: self.selected,
            active_view: self.active_view,
            zoom: self.viewport.zoom,
            blueprint_status: self.blueprint_status,
            blueprint_error: self.blueprint_error.clone(),
        }
    }

    /// Replace the active configuration with a previously partialized one.
    ///
    /// Recorded like any other action. Every placement must refer to an
    /// existing view and a stored image, carry a unique id and finite values.
    /// Positions and scales are clamped into range.
    pub fn restore(&mut self, mut snapshot: ConfigurationSnapshot) -> Result<(), ConfigError> {
        let count = self.images.len();
        let mut seen = HashSet::new();
        for p in &snapshot.placements {
            if p.view_index() >= count {
                return Err(ConfigError::InvalidView { index: p.view_index(), count });
            }
            if !seen.insert(p.id()) {
                return Err(ConfigError::DuplicatePlacement(p.id()));
            }
            if !p.transform().is_finite() {
                return Err(GeometryError::NonFinite.into());
            }
            if self.assets.get(p.asset().id()).is_none() {
                return Err(ConfigError::MissingAsset(p.asset().id()));
            }
        }
        if snapshot.len() > self.settings.max_placements {
            return Err(ConfigError::CapacityExceeded { max: self.settings.max_placements });
        }
        for p in &mut snapshot.placements {
            let t = p.transform();
            p.set_transform(t);
        }
        if snapshot == self.snapshot {
            return Ok(());
        }
        self.apply("restore", |current| *current = snapshot);
        self.reconcile_selection();
        Ok(())
    }

    // --- Product ---

    /// Load a product. Resets the configuration and clears history.
    pub fn set_product(&mut self, product: ProductData) {
        let sizes = match product.sizes {
            Some(sizes) if !sizes.is_empty() => SizeQuantities::with_sizes(sizes),
            _ => SizeQuantities::with_sizes(DEFAULT_SIZES),
        };
        log::info!(
            "Loaded product {} with {} views and {} sizes",
            product.product_ref.as_deref().unwrap_or("<unnamed>"),
            product.images.len(),
            sizes.len()
        );

        self.snapshot = ConfigurationSnapshot::new(sizes, product.base_price);
        self.history.clear();
        self.original_images = product.images.clone();
        self.images = product.images;
        self.product_ref = product.product_ref;
        self.active_view = 0;
        self.selected = None;
        self.blueprint_status = BlueprintStatus::Idle;
        self.blueprint_error = None;
        self.release_unreferenced_assets();
    }

    /// Switch the product view being edited. Clears the selection.
    pub fn set_active_view(&mut self, index: usize) -> Result<(), ConfigError> {
        self.check_view(index)?;
        if self.active_view != index {
            self.active_view = index;
            self.selected = None;
        }
        Ok(())
    }

    // --- Placements ---

    /// Add a logo from raw image bytes to the active view and select it.
    pub fn add_placement(&mut self, bytes: Vec<u8>) -> Result<PlacementId, ConfigError> {
        let max = self.settings.max_placements;
        if self.snapshot.len() >= max {
            log::warn!("Rejected new logo: limit of {max} reached");
            return Err(ConfigError::CapacityExceeded { max });
        }
        self.check_view(self.active_view)?;

        let asset = self.assets.insert(bytes)?;
        let placement = LogoPlacement::new(asset, self.active_view, self.settings.default_position);
        let id = placement.id();
        self.apply("add placement", |s| s.add_placement(placement));
        self.selected = Some(id);
        log::debug!("Added placement {id} on view {}", self.active_view);
        Ok(id)
    }

    /// Remove a placement. Its asset is released once no history state refers to it.
    pub fn delete_placement(&mut self, id: PlacementId) -> Result<(), ConfigError> {
        self.require(id)?;
        self.apply("delete placement", |s| {
            s.remove_placement(id);
        });
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(())
    }

    /// Change a placement's refinement. Returns false if it already had that refinement.
    pub fn set_refinement(&mut self, id: PlacementId, kind: RefinementKind) -> Result<bool, ConfigError> {
        if self.require(id)?.refinement == kind {
            return Ok(false);
        }
        self.apply("set refinement", |s| {
            if let Some(p) = s.placement_mut(id) {
                p.refinement = kind;
            }
        });
        Ok(true)
    }

    /// Commit the result of a gesture. Returns false if nothing changed.
    ///
    /// Position is clamped to the container and scale to its floor.
    pub fn commit_transform(&mut self, id: PlacementId, transform: Transform) -> Result<bool, ConfigError> {
        if !transform.is_finite() {
            return Err(GeometryError::NonFinite.into());
        }
        let transform = transform.clamped();
        if self.require(id)?.transform() == transform {
            return Ok(false);
        }
        self.apply("commit transform", |s| {
            if let Some(p) = s.placement_mut(id) {
                p.set_transform(transform);
            }
        });
        Ok(true)
    }

    /// Attach (or clear) the advisor's note. Advisory only, not recorded.
    pub fn set_ai_suggestion(&mut self, id: PlacementId, suggestion: Option<String>) -> Result<(), ConfigError> {
        let placement = self
            .snapshot
            .placement_mut(id)
            .ok_or(ConfigError::UnknownPlacement(id))?;
        placement.ai_suggestion = suggestion;
        Ok(())
    }

    /// Ask an advisor for a refinement recommendation and store its reasoning.
    ///
    /// Advisor failures are logged and leave the placement unchanged.
    pub fn request_suggestion<A: RefinementAdvisor + ?Sized>(
        &mut self,
        id: PlacementId,
        advisor: &A,
    ) -> Result<Option<Suggestion>, ConfigError> {
        let asset_id = self.require(id)?.asset().id();
        let Some(asset) = self.assets.get(asset_id) else {
            log::warn!("No stored image for placement {id}");
            return Ok(None);
        };
        match advisor.suggest(asset) {
            Ok(suggestion) => {
                log::debug!("Advisor suggests {} for {id}", suggestion.kind.label());
                self.set_ai_suggestion(id, Some(suggestion.reasoning.clone()))?;
                Ok(Some(suggestion))
            }
            Err(e) => {
                log::warn!("{e}");
                Ok(None)
            }
        }
    }

    /// Select a placement, or clear the selection. Transient.
    pub fn select(&mut self, id: Option<PlacementId>) -> Result<(), ConfigError> {
        if let Some(id) = id {
            self.require(id)?;
        }
        self.selected = id;
        Ok(())
    }

    // --- Quantities ---

    /// Set the quantity for one size. Negative values clamp to zero.
    pub fn set_quantity(&mut self, size: &str, quantity: i64) -> Result<bool, ConfigError> {
        let quantity = clamp_quantity(quantity);
        let current = self
            .snapshot
            .quantities
            .get(size)
            .ok_or_else(|| ConfigError::UnknownSize(size.to_string()))?;
        if current == quantity {
            return Ok(false);
        }
        self.apply("set quantity", |s| {
            s.quantities.set(size, quantity);
        });
        Ok(true)
    }

    /// Toggle whether the estimated total replaces the per-size quantities.
    pub fn set_unsure_about_sizes(&mut self, unsure: bool) -> bool {
        if self.snapshot.unsure_about_sizes == unsure {
            return false;
        }
        self.apply("set unsure about sizes", |s| s.unsure_about_sizes = unsure);
        true
    }

    /// Set the estimated total quantity. Negative values clamp to zero.
    pub fn set_estimated_total(&mut self, total: i64) -> bool {
        let total = clamp_quantity(total);
        if self.snapshot.estimated_total == total {
            return false;
        }
        self.apply("set estimated total", |s| s.estimated_total = total);
        true
    }

    // --- History ---

    /// Step back one recorded action. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.snapshot) {
            return false;
        }
        log::debug!("Undo ({} left)", self.history.past_len());
        self.reconcile_selection();
        true
    }

    /// Re-apply the most recently undone action.
    pub fn redo(&mut self) -> bool {
        if !self.history.redo(&mut self.snapshot) {
            return false;
        }
        log::debug!("Redo ({} left)", self.history.future_len());
        self.reconcile_selection();
        true
    }

    // --- Blueprints ---

    /// Mark blueprint generation as started and return the reference image
    /// (the product's first original view).
    pub fn begin_blueprint(&mut self) -> Result<ImageRef, BlueprintError> {
        let reference = self
            .original_images
            .first()
            .cloned()
            .ok_or(BlueprintError::NoReferenceImage)?;
        self.blueprint_status = BlueprintStatus::Loading;
        self.blueprint_error = None;
        Ok(reference)
    }

    /// Apply a blueprint result. On failure the original images come back.
    pub fn finish_blueprint(&mut self, result: Result<Vec<ImageRef>, BlueprintError>) -> Result<(), BlueprintError> {
        match result.and_then(validate_views) {
            Ok(views) => {
                log::info!("Blueprint generation produced {} views", views.len());
                self.replace_images(views);
                self.blueprint_status = BlueprintStatus::Done;
                Ok(())
            }
            Err(e) => {
                log::warn!("{e}; falling back to original images");
                let originals = self.original_images.clone();
                self.replace_images(originals);
                self.blueprint_status = BlueprintStatus::Failed;
                self.blueprint_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Run a blueprint service against the first product image.
    ///
    /// Errors are non-fatal: the session has already fallen back when one is returned.
    pub fn generate_blueprints<B: BlueprintService + ?Sized>(&mut self, service: &B) -> Result<(), BlueprintError> {
        let reference = self.begin_blueprint()?;
        let result = service.generate(&reference);
        self.finish_blueprint(result)
    }

    // --- Internals ---

    /// Record the current configuration, mutate it, then release orphaned assets.
    fn apply<F: FnOnce(&mut ConfigurationSnapshot)>(&mut self, action: &str, mutate: F) {
        self.history.record(&self.snapshot);
        mutate(&mut self.snapshot);
        log::debug!("Recorded {action} ({} undo states)", self.history.past_len());
        self.release_unreferenced_assets();
    }

    fn require(&self, id: PlacementId) -> Result<&LogoPlacement, ConfigError> {
        self.snapshot.placement(id).ok_or_else(|| {
            log::warn!("Unknown placement {id}");
            ConfigError::UnknownPlacement(id)
        })
    }

    fn check_view(&self, index: usize) -> Result<(), ConfigError> {
        let count = self.images.len();
        if index < count {
            Ok(())
        } else {
            Err(ConfigError::InvalidView { index, count })
        }
    }

    fn reconcile_selection(&mut self) {
        if self.selected.is_some_and(|id| !self.snapshot.contains(id)) {
            self.selected = None;
        }
    }

    /// Swap in a new image sequence. A changed sequence resets the active
    /// view, drops placements whose view vanished and clears history.
    fn replace_images(&mut self, images: Vec<ImageRef>) {
        if images == self.images {
            return;
        }
        let count = images.len();
        self.images = images;
        self.active_view = 0;
        self.selected = None;
        self.snapshot.placements.retain(|p| {
            let keep = p.view_index() < count;
            if !keep {
                log::warn!("Dropping placement {} on vanished view {}", p.id(), p.view_index());
            }
            keep
        });
        self.history.clear();
        self.release_unreferenced_assets();
    }

    /// Release every stored asset no snapshot (active, undo or redo) refers to.
    fn release_unreferenced_assets(&mut self) {
        let referenced: HashSet<AssetId> = self
            .snapshot
            .asset_ids()
            .chain(self.history.iter().flat_map(|s| s.asset_ids()))
            .collect();
        for id in self.assets.ids() {
            if !referenced.contains(&id) && self.assets.release(id) {
                log::debug!("Released asset {id}");
            }
        }
    }
}

fn clamp_quantity(quantity: i64) -> u32 {
    u32::try_from(quantity.max(0)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::tests::png_bytes;
    use crate::pricing::MIN_EMBROIDERY_QTY;

    fn product(views: usize) -> ProductData {
        ProductData {
            images: (0..views).map(|i| format!("view-{i}.png")).collect(),
            sizes: None,
            base_price: Some(Money::from_cents(2000)),
            product_ref: Some("TSHIRT-01".into()),
        }
    }

    fn session() -> Session {
        let mut session = Session::default();
        session.set_product(product(2));
        session
    }

    struct FixedService(Result<Vec<ImageRef>, BlueprintError>);

    impl BlueprintService for FixedService {
        fn generate(&self, _reference: &str) -> Result<Vec<ImageRef>, BlueprintError> {
            self.0.clone()
        }
    }

    #[test]
    fn test_add_selects_and_records() {
        let mut s = session();
        let id = s.add_placement(png_bytes()).unwrap();
        assert_eq!(s.selected(), Some(id));
        assert!(s.can_undo());
        let p = s.placement(id).unwrap();
        assert!((p.x - 40.0).abs() < f64::EPSILON);
        assert!((p.y - 30.0).abs() < f64::EPSILON);
        assert_eq!(p.refinement, RefinementKind::Print);
        assert!(s.asset_for(id).is_some());
    }

    #[test]
    fn test_capacity_rejected_without_change() {
        let mut s = session();
        for _ in 0..5 {
            s.add_placement(png_bytes()).unwrap();
        }
        let before = s.partialize();
        let depth = s.undo_depth();
        let err = s.add_placement(png_bytes()).unwrap_err();
        assert_eq!(err, ConfigError::CapacityExceeded { max: 5 });
        assert_eq!(s.partialize(), before);
        assert_eq!(s.undo_depth(), depth);
        assert_eq!(s.assets().len(), 5);
    }

    #[test]
    fn test_bad_image_rejected_without_change() {
        let mut s = session();
        let err = s.add_placement(b"not an image".to_vec()).unwrap_err();
        assert_eq!(err, ConfigError::Asset(AssetError::UnsupportedFormat));
        assert!(!s.can_undo());
    }

    #[test]
    fn test_add_requires_product_views() {
        let mut s = Session::new(Settings::default());
        let err = s.add_placement(png_bytes()).unwrap_err();
        assert_eq!(err, ConfigError::InvalidView { index: 0, count: 0 });
    }

    #[test]
    fn test_placement_bound_to_active_view() {
        let mut s = session();
        s.set_active_view(1).unwrap();
        let id = s.add_placement(png_bytes()).unwrap();
        assert_eq!(s.placement(id).unwrap().view_index(), 1);
        assert_eq!(s.set_active_view(2), Err(ConfigError::InvalidView { index: 2, count: 2 }));
        assert_eq!(s.active_view(), 1);
    }

    #[test]
    fn test_undo_round_trip() {
        let mut s = session();
        let initial = s.partialize();

        let id = s.add_placement(png_bytes()).unwrap();
        s.set_refinement(id, RefinementKind::Embroidery).unwrap();
        s.set_quantity("M", 10).unwrap();
        s.commit_transform(id, Transform { x: 10.0, y: 20.0, scale: 1.5, rotation: 45.0 }).unwrap();
        s.set_estimated_total(30);
        assert_eq!(s.undo_depth(), 5);

        let before_undo = s.partialize();
        while s.undo() {}
        assert_eq!(s.partialize(), initial);
        // Selection pointed at a placement that no longer exists.
        assert_eq!(s.selected(), None);

        assert!(s.redo());
        assert_eq!(s.placements().len(), 1);
        while s.redo() {}
        assert_eq!(s.partialize(), before_undo);
    }

    #[test]
    fn test_new_action_clears_redo() {
        let mut s = session();
        s.set_quantity("S", 3).unwrap();
        assert!(s.undo());
        assert!(s.can_redo());
        s.set_quantity("L", 2).unwrap();
        assert!(!s.can_redo());
    }

    #[test]
    fn test_unchanged_values_not_recorded() {
        let mut s = session();
        let id = s.add_placement(png_bytes()).unwrap();
        let depth = s.undo_depth();
        assert!(!s.set_refinement(id, RefinementKind::Print).unwrap());
        assert!(!s.set_quantity("M", 0).unwrap());
        assert!(!s.set_unsure_about_sizes(false));
        let t = s.placement(id).unwrap().transform();
        assert!(!s.commit_transform(id, t).unwrap());
        assert_eq!(s.undo_depth(), depth);
    }

    #[test]
    fn test_quantity_validation() {
        let mut s = session();
        assert!(s.set_quantity("M", -4).is_ok());
        assert_eq!(s.snapshot().quantities.get("M"), Some(0));
        assert_eq!(s.set_quantity("XXXL", 1), Err(ConfigError::UnknownSize("XXXL".into())));
        assert!(!s.set_estimated_total(-1));
        assert_eq!(s.snapshot().estimated_total, 0);
    }

    #[test]
    fn test_product_sizes() {
        let mut s = Session::new(Settings::default());
        s.set_product(ProductData {
            images: vec!["a.png".into()],
            sizes: Some(vec!["S".into(), "M".into()]),
            ..ProductData::default()
        });
        assert_eq!(s.snapshot().quantities.sizes().collect::<Vec<_>>(), vec!["S", "M"]);
        assert!(!s.quote().has_base_price);
    }

    #[test]
    fn test_commit_transform_clamps_and_rejects_nan() {
        let mut s = session();
        let id = s.add_placement(png_bytes()).unwrap();
        s.commit_transform(id, Transform { x: 150.0, y: -5.0, scale: 0.01, rotation: 10.0 }).unwrap();
        let p = s.placement(id).unwrap();
        assert!((p.x - 100.0).abs() < f64::EPSILON);
        assert!(p.y.abs() < f64::EPSILON);
        assert!((p.scale - 0.2).abs() < f64::EPSILON);

        let before = s.partialize();
        let err = s
            .commit_transform(id, Transform { x: f64::NAN, ..Transform::default() })
            .unwrap_err();
        assert_eq!(err, ConfigError::Geometry(GeometryError::NonFinite));
        assert_eq!(s.partialize(), before);
    }

    #[test]
    fn test_delete_releases_asset_after_history_drops_it() {
        let settings = Settings { history_limit: 1, ..Settings::default() };
        let mut s = Session::new(settings);
        s.set_product(product(1));
        let id = s.add_placement(png_bytes()).unwrap();
        s.delete_placement(id).unwrap();
        // The undo state still refers to the logo.
        assert_eq!(s.assets().len(), 1);
        assert!(s.undo());
        assert_eq!(s.selected(), None);
        assert!(s.placement(id).is_some());

        // A new action pushes the only state holding the old logo out of history.
        s.delete_placement(id).unwrap();
        s.set_quantity("M", 2).unwrap();
        assert!(s.assets().is_empty());
    }

    #[test]
    fn test_set_product_resets() {
        let mut s = session();
        s.add_placement(png_bytes()).unwrap();
        s.set_product(product(3));
        assert!(s.placements().is_empty());
        assert!(!s.can_undo());
        assert!(s.assets().is_empty());
        assert_eq!(s.images().len(), 3);
    }

    #[test]
    fn test_ai_suggestion_not_recorded() {
        let mut s = session();
        let id = s.add_placement(png_bytes()).unwrap();
        let depth = s.undo_depth();
        s.set_ai_suggestion(id, Some("Fine lines print better".into())).unwrap();
        assert_eq!(s.undo_depth(), depth);
        assert_eq!(
            s.placement(id).unwrap().ai_suggestion.as_deref(),
            Some("Fine lines print better")
        );
    }

    #[test]
    fn test_request_suggestion() {
        struct Embroider;
        impl RefinementAdvisor for Embroider {
            fn suggest(&self, _asset: &Asset) -> Result<Suggestion, crate::services::AdvisorError> {
                Ok(Suggestion {
                    kind: RefinementKind::Embroidery,
                    reasoning: "Bold shapes".into(),
                })
            }
        }
        struct Broken;
        impl RefinementAdvisor for Broken {
            fn suggest(&self, _asset: &Asset) -> Result<Suggestion, crate::services::AdvisorError> {
                Err(crate::services::AdvisorError("offline".into()))
            }
        }

        let mut s = session();
        let id = s.add_placement(png_bytes()).unwrap();
        assert_eq!(s.request_suggestion(id, &Broken).unwrap(), None);
        assert!(s.placement(id).unwrap().ai_suggestion.is_none());

        let suggestion = s.request_suggestion(id, &Embroider).unwrap().unwrap();
        assert_eq!(suggestion.kind, RefinementKind::Embroidery);
        let p = s.placement(id).unwrap();
        assert_eq!(p.ai_suggestion.as_deref(), Some("Bold shapes"));
        // Advisory only.
        assert_eq!(p.refinement, RefinementKind::Print);
    }

    #[test]
    fn test_quote_follows_configuration() {
        let mut s = session();
        let a = s.add_placement(png_bytes()).unwrap();
        s.add_placement(png_bytes()).unwrap();
        s.set_refinement(a, RefinementKind::Embroidery).unwrap();
        s.set_quantity("M", 3).unwrap();
        assert!(!s.quote().is_moq_satisfied);
        s.set_quantity("L", i64::from(MIN_EMBROIDERY_QTY)).unwrap();
        let quote = s.quote();
        assert!(quote.is_moq_satisfied);
        assert_eq!(quote.unit_price, Money::from_cents(2800));
        assert_eq!(quote.total_price, Money::from_cents(2800 * 8));
    }

    #[test]
    fn test_blueprint_success_replaces_views() {
        let mut s = session();
        s.set_active_view(1).unwrap();
        s.add_placement(png_bytes()).unwrap();
        let views: Vec<ImageRef> = (0..4).map(|i| format!("bp-{i}")).collect();

        s.generate_blueprints(&FixedService(Ok(views.clone()))).unwrap();
        assert_eq!(s.blueprint_status(), BlueprintStatus::Done);
        assert_eq!(s.images(), views.as_slice());
        assert_eq!(s.original_images().len(), 2);
        assert_eq!(s.active_view(), 0);
        // View 1 still exists in the new sequence.
        assert_eq!(s.placements().len(), 1);
        assert!(!s.can_undo());
    }

    #[test]
    fn test_blueprint_failure_falls_back() {
        let mut s = session();
        s.add_placement(png_bytes()).unwrap();
        let err = s
            .generate_blueprints(&FixedService(Err(BlueprintError::Service("quota".into()))))
            .unwrap_err();
        assert_eq!(err, BlueprintError::Service("quota".into()));
        assert_eq!(s.blueprint_status(), BlueprintStatus::Failed);
        assert!(s.blueprint_error().is_some());
        assert_eq!(s.images().len(), 2);
        // Same sequence: placements and history survive.
        assert_eq!(s.placements().len(), 1);
        assert!(s.can_undo());
    }

    #[test]
    fn test_blueprint_wrong_count_falls_back() {
        let mut s = session();
        let err = s
            .generate_blueprints(&FixedService(Ok(vec!["only-front".into()])))
            .unwrap_err();
        assert_eq!(err, BlueprintError::WrongViewCount { expected: 4, actual: 1 });
        assert_eq!(s.images().len(), 2);
    }

    #[test]
    fn test_blueprint_without_images() {
        let mut s = Session::new(Settings::default());
        let err = s.generate_blueprints(&FixedService(Ok(Vec::new()))).unwrap_err();
        assert_eq!(err, BlueprintError::NoReferenceImage);
        assert_eq!(s.blueprint_status(), BlueprintStatus::Idle);
    }

    #[test]
    fn test_fallback_drops_vanished_views() {
        let mut s = Session::new(Settings::default());
        s.set_product(product(1));
        let views: Vec<ImageRef> = (0..4).map(|i| format!("bp-{i}")).collect();
        s.generate_blueprints(&FixedService(Ok(views))).unwrap();
        s.set_active_view(3).unwrap();
        let kept_view = s.placements().len();
        s.add_placement(png_bytes()).unwrap();

        // A second run fails and restores the original single view.
        s.generate_blueprints(&FixedService(Err(BlueprintError::Service("down".into()))))
            .unwrap_err();
        assert_eq!(s.images().len(), 1);
        assert_eq!(s.placements().len(), kept_view);
        assert!(s.assets().is_empty());
    }

    #[test]
    fn test_partialize_excludes_transient_state() {
        let mut s = session();
        let id = s.add_placement(png_bytes()).unwrap();
        s.viewport_mut().zoom_in();
        let saved = s.partialize();
        let json = saved.to_json().unwrap();
        assert!(!json.contains("selected"));
        assert!(!json.contains("zoom"));

        let transient = s.transient();
        assert_eq!(transient.selected, Some(id));
        assert!((transient.zoom - 1.25).abs() < f64::EPSILON);

        s.delete_placement(id).unwrap();
        s.restore(saved.clone()).unwrap();
        assert_eq!(s.partialize(), saved);
        assert!(s.undo());
        assert!(s.placements().is_empty());
    }

    #[test]
    fn test_restore_clamps_out_of_range_values() {
        let mut s = session();
        s.add_placement(png_bytes()).unwrap();
        let mut saved = s.partialize();
        saved.placements[0].x = 250.0;
        saved.placements[0].y = -4.0;
        saved.placements[0].scale = 0.01;

        s.restore(saved).unwrap();
        let p = &s.placements()[0];
        assert!((p.x - 100.0).abs() < f64::EPSILON);
        assert!(p.y.abs() < f64::EPSILON);
        assert!((p.scale - crate::placement::MIN_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_restore_rejects_corrupt_snapshots() {
        let mut s = session();
        let id = s.add_placement(png_bytes()).unwrap();
        let depth = s.undo_depth();

        let mut nan = s.partialize();
        nan.placements[0].rotation = f64::NAN;
        assert_eq!(s.restore(nan), Err(ConfigError::Geometry(GeometryError::NonFinite)));

        let mut duplicated = s.partialize();
        duplicated.placements.push(duplicated.placements[0].clone());
        assert_eq!(s.restore(duplicated), Err(ConfigError::DuplicatePlacement(id)));

        assert_eq!(s.placements().len(), 1);
        assert!(s.placements()[0].rotation.is_finite());
        assert_eq!(s.undo_depth(), depth);
    }

    #[test]
    fn test_restore_rejects_released_assets() {
        let mut s = session();
        s.add_placement(png_bytes()).unwrap();
        let saved = s.partialize();
        let asset = saved.placements[0].asset().id();

        // Reloading the product clears history and releases the image.
        s.set_product(product(2));
        assert!(s.assets().get(asset).is_none());
        assert_eq!(s.restore(saved), Err(ConfigError::MissingAsset(asset)));
        assert!(s.placements().is_empty());
    }

    #[test]
    fn test_restore_rejects_invalid_view() {
        let mut s = session();
        s.set_active_view(1).unwrap();
        s.add_placement(png_bytes()).unwrap();
        let saved = s.partialize();

        s.set_product(product(1));
        assert_eq!(s.restore(saved), Err(ConfigError::InvalidView { index: 1, count: 1 }));
        assert!(s.placements().is_empty());
    }

    #[test]
    fn test_invalid_settings_fall_back_to_defaults() {
        let settings = Settings {
            min_zoom: 3.0,
            max_zoom: 0.5,
            max_placements: 1,
            ..Settings::default()
        };
        let s = Session::new(settings);
        assert_eq!(s.settings(), &Settings::default());
        assert!((s.viewport().zoom - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_not_recorded() {
        let mut s = session();
        s.viewport_mut().zoom_in();
        s.viewport_mut().zoom_in();
        assert!(!s.can_undo());
        assert!((s.viewport().zoom - 1.5).abs() < f64::EPSILON);
    }
}
