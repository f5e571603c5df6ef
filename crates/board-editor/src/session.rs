//! One open board: store, selection controller, reconciler and surface.
//!
//! Every entry point runs its store mutation first and then exactly one
//! reconciliation pass. Content loads requested by that pass are queued
//! and driven by the host through [`BoardSession::drive_loads`] (or
//! [`BoardSession::take_loads`] + [`BoardSession::finish_load`] when the
//! host schedules fetches itself).

use crate::error::BoardError;
use crate::input::InputEvent;
use crate::selection::{CanvasMode, Effects, SelectionController, SelectionEffect};
use crate::shortcuts::{BoardAction, ShortcutMap};
use crate::store::BoardStore;
use crate::workflows::{self, AssetService, GenerationRequest, GenerationService, PersistenceApi};
use board_core::kurbo::Point;
use board_core::{AssetId, NodeId};
use board_render::{
    ContentLoader, DrawingSurface, LoadError, LoadOutcome, LoadTicket, Pixels, ReconcileReport,
    SceneReconciler, load_content,
};

/// Non-fatal, per-node notification for the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    ContentFailed { id: NodeId, error: LoadError },
}

pub struct BoardSession<S: DrawingSurface> {
    store: BoardStore,
    selection: SelectionController,
    reconciler: SceneReconciler<S::Handle>,
    surface: S,
    pending: Vec<LoadTicket>,
}

impl<S: DrawingSurface> BoardSession<S> {
    pub fn new(store: BoardStore, surface: S) -> Self {
        let reconciler = SceneReconciler::new(store.config().epsilon);
        let mut session = Self {
            store,
            selection: SelectionController::new(),
            reconciler,
            surface,
            pending: Vec::new(),
        };
        session.sync();
        session
    }

    pub fn store(&self) -> &BoardStore {
        &self.store
    }

    /// Direct store access. Call [`sync`](Self::sync) afterwards.
    pub fn store_mut(&mut self) -> &mut BoardStore {
        &mut self.store
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn reconciler(&self) -> &SceneReconciler<S::Handle> {
        &self.reconciler
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn mode(&self) -> CanvasMode {
        self.selection.mode()
    }

    /// Loads requested so far and not yet taken.
    pub fn pending_loads(&self) -> &[LoadTicket] {
        &self.pending
    }

    pub fn take_loads(&mut self) -> Vec<LoadTicket> {
        std::mem::take(&mut self.pending)
    }

    /// Bring the surface in line with the store.
    pub fn sync(&mut self) -> ReconcileReport {
        self.selection.enforce(&mut self.store);
        self.surface.set_viewport(self.store.viewport());
        let report = self.reconciler.reconcile(self.store.nodes(), &mut self.surface);
        if !report.is_noop() {
            log::trace!("reconcile: {} surface mutation(s)", report.surface_mutations());
        }
        self.pending.extend(report.loads.iter().cloned());
        report
    }

    /// Throw away every drawable and rebuild from the store.
    pub fn rebuild(&mut self) -> ReconcileReport {
        self.reconciler.reset(&mut self.surface);
        self.pending.clear();
        self.sync()
    }

    pub fn set_mode(&mut self, mode: CanvasMode) {
        self.selection.set_mode(&mut self.store, mode);
        self.sync();
    }

    /// Execute one command.
    pub fn perform(&mut self, action: BoardAction) -> Effects {
        let store = &mut self.store;
        let mut effects = Effects::new();
        match action {
            BoardAction::Undo => {
                let _ = store.undo();
            }
            BoardAction::Redo => {
                let _ = store.redo();
            }
            BoardAction::Delete => {
                let _ = store.delete_selected_nodes();
            }
            BoardAction::Duplicate => {
                let copies = store.duplicate_selected();
                effects = self.selection.select_ids(store, copies);
            }
            BoardAction::SelectAll => {
                let ids: Vec<NodeId> = store.nodes().iter().map(|n| n.id).collect();
                effects = self.selection.select_ids(store, ids);
            }
            BoardAction::Deselect => store.clear_selection(),
            BoardAction::Align(alignment) => {
                let _ = store.align_nodes(alignment);
            }
            BoardAction::Nudge { dx, dy } => {
                let _ = store.move_selected(dx, dy);
            }
            BoardAction::BringForward => {
                let _ = store.bring_selected_forward();
            }
            BoardAction::SendBackward => {
                let _ = store.send_selected_backward();
            }
            BoardAction::BringToFront => {
                let _ = store.bring_selected_to_front();
            }
            BoardAction::SendToBack => {
                let _ = store.send_selected_to_back();
            }
            BoardAction::ZoomIn | BoardAction::ZoomOut => {
                let step = store.config().zoom_step;
                let factor = if action == BoardAction::ZoomIn { step } else { 1.0 / step };
                let canvas = store.canvas();
                let center = Point::new(canvas.width as f64 / 2.0, canvas.height as f64 / 2.0);
                store.zoom_by(factor, center);
            }
            BoardAction::ZoomReset => {
                store.set_zoom(1.0);
                store.set_pan(0.0, 0.0);
            }
            BoardAction::ToggleGrid => {
                let show = !store.flags().show_grid;
                store.set_show_grid(show);
            }
            BoardAction::ToggleSnap => {
                let snap = !store.flags().snap_to_grid;
                store.set_snap_to_grid(snap);
            }
            BoardAction::SetMode(mode) => self.selection.set_mode(store, mode),
        }
        self.sync();
        effects
    }

    /// Feed one host input event.
    pub fn handle_input(&mut self, event: &InputEvent) -> Effects {
        let effects = match event {
            InputEvent::Key { key, modifiers } => {
                return match ShortcutMap::resolve(key, *modifiers) {
                    Some(action) => self.perform(action),
                    None => Effects::new(),
                };
            }
            InputEvent::Wheel { dx, dy, zoom, x, y } => {
                if (*zoom - 1.0).abs() > f64::EPSILON {
                    self.store.zoom_by(*zoom, Point::new(*x, *y));
                } else {
                    self.store.pan_by(-*dx, -*dy);
                }
                Effects::new()
            }
            _ => self.selection.handle(&mut self.store, event),
        };
        self.sync();
        effects
    }

    /// Apply one finished content load.
    pub fn finish_load(&mut self, ticket: &LoadTicket, result: Result<Pixels, LoadError>) -> Option<Notice> {
        match self
            .reconciler
            .finish_load(ticket, result, self.store.nodes(), &mut self.surface)
        {
            LoadOutcome::Failed(error) => {
                log::debug!("notifying host: content for {} failed", ticket.id);
                Some(Notice::ContentFailed { id: ticket.id, error })
            }
            _ => None,
        }
    }

    /// Fetch every queued load through `loader`, applying each as it lands.
    pub async fn drive_loads<L: ContentLoader>(&mut self, loader: &L) -> Vec<Notice> {
        let mut notices = Vec::new();
        while !self.pending.is_empty() {
            for ticket in self.take_loads() {
                let result = load_content(loader, &ticket.url).await.map(|(pixels, path)| {
                    log::debug!("loaded {} via {path:?}", ticket.url);
                    pixels
                });
                notices.extend(self.finish_load(&ticket, result));
            }
        }
        notices
    }

    /// Run the generation a dragdrop pair asked for, then release the pair.
    pub async fn generate<G: GenerationService>(
        &mut self,
        service: &G,
        request: &GenerationRequest,
    ) -> Option<NodeId> {
        let created = workflows::run_generation(&mut self.store, service, request).await;
        self.selection.finish_generation();
        self.sync();
        created
    }

    /// Run every `Generate` effect in `effects`.
    pub async fn run_effects<G: GenerationService>(&mut self, service: &G, effects: &Effects) -> Vec<NodeId> {
        let mut created = Vec::new();
        for effect in effects {
            if let SelectionEffect::Generate(request) = effect {
                created.extend(self.generate(service, request).await);
            }
        }
        created
    }

    pub async fn load<P: PersistenceApi>(&mut self, api: &P, id: &str) -> bool {
        if !workflows::load_document(&mut self.store, api, id).await {
            return false;
        }
        self.selection.finish_generation();
        self.rebuild();
        true
    }

    pub async fn save<P: PersistenceApi>(&mut self, api: &P) -> bool {
        workflows::save_document(&mut self.store, api).await
    }

    /// Add a node for `asset_id` at screen point `at`.
    pub async fn add_asset<A: AssetService>(
        &mut self,
        service: &A,
        asset_id: &AssetId,
        at: Point,
    ) -> Option<NodeId> {
        let doc = self.store.viewport().screen_to_doc(at);
        let created = workflows::add_asset_node(&mut self.store, service, asset_id, doc).await;
        self.sync();
        created
    }

    /// PNG of the visible surface, or of one node's drawable.
    pub fn export_png(&self, node: Option<NodeId>) -> Result<Vec<u8>, BoardError> {
        let handle = match node {
            Some(id) => Some(self.reconciler.handle(id).ok_or_else(|| {
                board_render::SurfaceError::UnknownDrawable(format!("{id} is not materialized"))
            })?),
            None => None,
        };
        Ok(self.surface.export_png(handle)?)
    }
}
