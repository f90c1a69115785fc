//! Script replay against a configuration session.

use crate::AppError;
use crate::script::{BlueprintResponse, LogoSource, Script, ScriptPointer, Step};
use base64::{Engine, engine::general_purpose::STANDARD};
use logoplace_core::{
    Asset, AdvisorError, BlueprintError, BlueprintService, ConfigurationSnapshot, ImageRef, Manipulator,
    PlacementId, PointerEvent, PrintLayout, Quote, RefinementAdvisor, RefinementKind, Session, Settings,
    StaticGeometry, Suggestion, TransientState, ViewMetrics, pick, print_layout,
};
use kurbo::{Point, Size};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;

/// Blueprint service answering with a scripted response.
struct ScriptedBlueprints<'a>(&'a BlueprintResponse);

impl BlueprintService for ScriptedBlueprints<'_> {
    fn generate(&self, _reference: &str) -> Result<Vec<ImageRef>, BlueprintError> {
        match self.0 {
            BlueprintResponse::Views(views) => Ok(views.clone()),
            BlueprintResponse::Error(message) => Err(BlueprintError::Service(message.clone())),
        }
    }
}

/// Advisor answering with a scripted suggestion.
struct ScriptedAdvisor {
    kind: RefinementKind,
    reasoning: String,
}

impl RefinementAdvisor for ScriptedAdvisor {
    fn suggest(&self, _asset: &Asset) -> Result<Suggestion, AdvisorError> {
        Ok(Suggestion {
            kind: self.kind,
            reasoning: self.reasoning.clone(),
        })
    }
}

/// A step the session rejected. Rejections are reported, not fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub step: usize,
    pub message: String,
}

/// Final state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Placement ids in add order.
    pub logos: Vec<PlacementId>,
    pub snapshot: ConfigurationSnapshot,
    pub transient: TransientState,
    pub quote: Quote,
    pub moq_shortfall: u32,
    pub can_checkout: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub layout: PrintLayout,
    pub rejected: Vec<Rejection>,
}

impl Report {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

struct Replay<'a> {
    session: Session,
    manipulator: Manipulator,
    geometry: StaticGeometry,
    /// Centers from the script, by logo index, applied once the logo exists.
    centers: &'a HashMap<usize, Point>,
    origins: &'a HashMap<usize, Point>,
    logos: Vec<PlacementId>,
    rejected: Vec<Rejection>,
    base_dir: &'a Path,
}

impl Replay<'_> {
    fn logo(&self, step: usize, index: usize) -> Result<PlacementId, AppError> {
        self.logos
            .get(index)
            .copied()
            .ok_or(AppError::UnknownLogo { step, index })
    }

    fn reject(&mut self, step: usize, error: impl std::fmt::Display) {
        log::warn!("Step {step} rejected: {error}");
        self.rejected.push(Rejection {
            step,
            message: error.to_string(),
        });
    }

    fn load_logo(&self, step: usize, source: &LogoSource) -> Result<Vec<u8>, AppError> {
        match source {
            LogoSource::Base64(data) => STANDARD
                .decode(data.trim())
                .map_err(|source| AppError::Logo { step, source }),
            LogoSource::Path(path) => {
                let path = self.base_dir.join(path);
                std::fs::read(&path).map_err(|source| AppError::Io { path, source })
            }
        }
    }

    fn pointer_event(&self, step: usize, event: &ScriptPointer) -> Result<PointerEvent, AppError> {
        Ok(match *event {
            ScriptPointer::Down { position, target, logo } => PointerEvent::Down {
                position,
                target,
                placement: self.logo(step, logo)?,
            },
            ScriptPointer::Move { position } => PointerEvent::Move { position },
            ScriptPointer::Up { position } => PointerEvent::Up { position },
            ScriptPointer::CaptureLost => PointerEvent::CaptureLost,
        })
    }

    fn run_step(&mut self, step: usize, action: &Step) -> Result<(), AppError> {
        log::debug!("Step {step}: {action:?}");
        match action {
            Step::SetActiveView { index } => {
                if let Err(e) = self.session.set_active_view(*index) {
                    self.reject(step, e);
                }
            }
            Step::AddLogo { logo } => {
                let bytes = self.load_logo(step, logo)?;
                match self.session.add_placement(bytes) {
                    Ok(id) => {
                        if let Some(center) = self.centers.get(&self.logos.len()) {
                            self.geometry.set_center(id, *center);
                        }
                        self.logos.push(id);
                    }
                    Err(e) => self.reject(step, e),
                }
            }
            Step::DeleteLogo { logo } => {
                let id = self.logo(step, *logo)?;
                if let Err(e) = self.session.delete_placement(id) {
                    self.reject(step, e);
                }
            }
            Step::SetRefinement { logo, kind } => {
                let id = self.logo(step, *logo)?;
                if let Err(e) = self.session.set_refinement(id, *kind) {
                    self.reject(step, e);
                }
            }
            Step::SetQuantity { size, quantity } => {
                if let Err(e) = self.session.set_quantity(size, *quantity) {
                    self.reject(step, e);
                }
            }
            Step::SetUnsure { unsure } => {
                self.session.set_unsure_about_sizes(*unsure);
            }
            Step::SetEstimatedTotal { total } => {
                self.session.set_estimated_total(*total);
            }
            Step::Select { logo } => {
                let id = logo.map(|i| self.logo(step, i)).transpose()?;
                if let Err(e) = self.session.select(id) {
                    self.reject(step, e);
                }
            }
            Step::Pointer { event } => {
                let event = self.pointer_event(step, event)?;
                if let Err(e) = self
                    .manipulator
                    .handle_event(&mut self.session, &self.geometry, &event)
                {
                    self.reject(step, e);
                }
            }
            Step::Press { position } => {
                let view = self.session.active_view();
                let container = self.geometry.containers.get(&view).copied().unwrap_or(Size::ZERO);
                let origin = self.origins.get(&view).copied().unwrap_or(Point::ZERO);
                match pick(&self.session, container, origin, *position) {
                    Some((placement, target)) => {
                        let event = PointerEvent::Down {
                            position: *position,
                            target,
                            placement,
                        };
                        if let Err(e) = self
                            .manipulator
                            .handle_event(&mut self.session, &self.geometry, &event)
                        {
                            self.reject(step, e);
                        }
                    }
                    None => {
                        // Pressing empty canvas clears the selection.
                        if let Err(e) = self.session.select(None) {
                            self.reject(step, e);
                        }
                    }
                }
            }
            Step::SetContainer { view, size } => {
                self.geometry.containers.insert(*view, *size);
            }
            Step::SetCenter { logo, center } => {
                let id = self.logo(step, *logo)?;
                self.geometry.set_center(id, *center);
            }
            Step::SetZoom { zoom } => self.session.viewport_mut().set_zoom(*zoom),
            Step::ZoomIn => self.session.viewport_mut().zoom_in(),
            Step::ZoomOut => self.session.viewport_mut().zoom_out(),
            Step::ZoomReset => self.session.viewport_mut().reset(),
            Step::Undo => {
                self.session.undo();
            }
            Step::Redo => {
                self.session.redo();
            }
            Step::Blueprints { response } => {
                if let Err(e) = self.session.generate_blueprints(&ScriptedBlueprints(response)) {
                    self.reject(step, e);
                }
            }
            Step::Suggest { logo, kind, reasoning } => {
                let id = self.logo(step, *logo)?;
                let advisor = ScriptedAdvisor {
                    kind: *kind,
                    reasoning: reasoning.clone(),
                };
                if let Err(e) = self.session.request_suggestion(id, &advisor) {
                    self.reject(step, e);
                }
            }
        }
        Ok(())
    }
}

/// Replay a script and report the final configuration.
///
/// Actions the session rejects are collected in [`Report::rejected`]; only
/// malformed scripts (bad logo data, unknown logo index) fail the replay.
/// A gesture still running at the end of the script is committed.
pub fn run_script(script: &Script, settings: Settings, base_dir: &Path) -> Result<Report, AppError> {
    let mut session = Session::new(settings);
    session.set_product(script.product.clone());

    let mut geometry = StaticGeometry::new();
    geometry.containers = script.geometry.containers.clone();

    let mut replay = Replay {
        session,
        manipulator: Manipulator::new(),
        geometry,
        centers: &script.geometry.centers,
        origins: &script.geometry.origins,
        logos: Vec::new(),
        rejected: Vec::new(),
        base_dir,
    };

    for (step, action) in script.steps.iter().enumerate() {
        replay.run_step(step, action)?;
    }
    if !replay.manipulator.is_idle() {
        let step = script.steps.len();
        if let Err(e) = replay.manipulator.capture_lost(&mut replay.session) {
            replay.reject(step, e);
        }
    }

    let session = &replay.session;
    let metrics: HashMap<usize, ViewMetrics> = (0..session.images().len())
        .map(|view| {
            let m = ViewMetrics {
                container: replay.geometry.containers.get(&view).copied(),
                natural: script.geometry.natural.get(&view).copied(),
            };
            (view, m)
        })
        .collect();
    let layout = print_layout(
        session.snapshot(),
        session.images(),
        session.active_view(),
        &metrics,
        session.settings().base_size,
    );
    let quote = session.quote();
    log::info!(
        "Replayed {} steps: {} logos, total {} ({} rejected)",
        script.steps.len(),
        session.placements().len(),
        quote.total_price,
        replay.rejected.len()
    );

    Ok(Report {
        logos: replay.logos.clone(),
        snapshot: session.partialize(),
        transient: session.transient(),
        quote,
        moq_shortfall: quote.moq_shortfall(),
        can_checkout: quote.can_checkout(),
        can_undo: session.can_undo(),
        can_redo: session.can_redo(),
        layout,
        rejected: replay.rejected.clone(),
    })
}
