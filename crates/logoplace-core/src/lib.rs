//! LogoPlace Core Library
//!
//! Platform-agnostic core of the LogoPlace configurator: percentage-based
//! logo placements on product views, pointer gestures, undo/redo history
//! and quote pricing.

pub mod asset;
pub mod config;
pub mod coords;
pub mod gesture;
pub mod handles;
pub mod history;
pub mod input;
pub mod layout;
pub mod money;
pub mod placement;
pub mod pricing;
pub mod services;
pub mod session;
pub mod settings;

pub use asset::{Asset, AssetError, AssetId, AssetRef, AssetStore, ImageFormat, MemoryAssets};
pub use config::{ConfigurationSnapshot, DEFAULT_SIZES, SizeQuantities, SizeQuantity};
pub use coords::{GeometryError, Viewport};
pub use gesture::{GestureError, GestureKind, GestureOutcome, GestureState, Manipulator};
pub use handles::{Handle, HandleKind, hit_test, pick};
pub use history::History;
pub use input::{PointerEvent, RenderedGeometry, StaticGeometry};
pub use layout::{PrintLayout, PrintView, ViewMetrics, print_layout};
pub use money::Money;
pub use placement::{LogoPlacement, MIN_SCALE, PlacementId, RefinementKind, Transform};
pub use pricing::{MIN_EMBROIDERY_QTY, Quote, compute_quote};
pub use services::{
    AdvisorError, BLUEPRINT_VIEW_COUNT, BlueprintError, BlueprintService, BlueprintStatus, BlueprintView,
    ImageRef, RefinementAdvisor, Suggestion,
};
pub use session::{ConfigError, ProductData, Session, TransientState};
pub use settings::{Settings, SettingsError};
