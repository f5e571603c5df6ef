//! Mode-dependent selection.
//!
//! `select` mode allows any number of selected nodes. `chat` and
//! `dragdrop` allow at most one: an operation that would leave more than
//! one id selected clears the selection entirely instead of truncating it.
//!
//! In `chat` mode, selecting a single asset-backed image emits a
//! [`SelectionEffect::ChatFocus`] carrying the node's screen-space centroid.
//! In `dragdrop` mode, successive single selections accumulate into a pair;
//! once the pair is complete a [`SelectionEffect::Generate`] fires, and no
//! other generation fires until [`SelectionController::finish_generation`].

use crate::input::InputEvent;
use crate::store::BoardStore;
use crate::workflows::GenerationRequest;
use board_core::kurbo::{Point, Rect};
use board_core::{AssetId, NodeId, NodeKind};
use board_render::{hit_test, hit_test_rect};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CanvasMode {
    #[default]
    Select,
    Chat,
    DragDrop,
}

impl CanvasMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "select" => Some(Self::Select),
            "chat" => Some(Self::Chat),
            "dragdrop" => Some(Self::DragDrop),
            _ => None,
        }
    }

    /// Whether this mode caps the selection at one node.
    pub fn is_single(self) -> bool {
        !matches!(self, Self::Select)
    }
}

/// Side effects the host must act on.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEffect {
    /// Open the chat UI next to `node`.
    ChatFocus {
        node: NodeId,
        asset: AssetId,
        screen: Point,
    },
    /// Start a generation for the picked pair.
    Generate(GenerationRequest),
}

pub type Effects = SmallVec<[SelectionEffect; 1]>;

pub struct SelectionController {
    mode: CanvasMode,
    /// Distinct single selections accumulated in dragdrop mode.
    picks: SmallVec<[NodeId; 2]>,
    in_flight: Option<[NodeId; 2]>,
    dragging: bool,
    last: Point,
    marquee_start: Option<Point>,
    marquee_rect: Option<Rect>,
    /// Marquee extends the existing selection (shift held at press).
    additive: bool,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            mode: CanvasMode::Select,
            picks: SmallVec::new(),
            in_flight: None,
            dragging: false,
            last: Point::ZERO,
            marquee_start: None,
            marquee_rect: None,
            additive: false,
        }
    }

    pub fn mode(&self) -> CanvasMode {
        self.mode
    }

    pub fn picks(&self) -> &[NodeId] {
        &self.picks
    }

    pub fn generation_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Live marquee in document coordinates, for the host to draw.
    pub fn marquee_rect(&self) -> Option<Rect> {
        self.marquee_rect
    }

    /// Switch modes. A multi-node selection is dropped immediately so the
    /// new mode's invariant holds before the next interaction.
    pub fn set_mode(&mut self, store: &mut BoardStore, mode: CanvasMode) {
        if mode == self.mode {
            return;
        }
        log::debug!("canvas mode {:?} -> {mode:?}", self.mode);
        self.mode = mode;
        self.picks.clear();
        self.cancel_gesture(store);
        if store.selection().len() > 1 {
            store.clear_selection();
        }
    }

    /// Single click on `hit` (or empty canvas). `toggle` is the
    /// shift-click behavior.
    pub fn click(&mut self, store: &mut BoardStore, hit: Option<NodeId>, toggle: bool) -> Effects {
        match hit {
            Some(id) if toggle => store.select_node(id, true),
            Some(id) => store.select_node(id, false),
            None if toggle => {}
            None => store.clear_selection(),
        }
        self.after_selection(store)
    }

    /// Replace the selection, subject to the mode's cardinality rule.
    pub fn select_ids(&mut self, store: &mut BoardStore, ids: impl IntoIterator<Item = NodeId>) -> Effects {
        store.select_nodes(ids);
        self.after_selection(store)
    }

    /// Select every node intersecting `rect` (document space).
    pub fn select_rect(&mut self, store: &mut BoardStore, rect: Rect, additive: bool) -> Effects {
        let hits = hit_test_rect(store.nodes(), rect);
        if additive {
            let mut ids: Vec<NodeId> = store.selection().to_vec();
            ids.extend(hits);
            self.select_ids(store, ids)
        } else {
            self.select_ids(store, hits)
        }
    }

    /// Re-apply the cardinality rule after an operation outside the
    /// controller changed the selection. Returns whether it cleared.
    pub fn enforce(&mut self, store: &mut BoardStore) -> bool {
        if self.mode.is_single() && store.selection().len() > 1 {
            log::debug!(
                "{:?} mode: discarding {}-node selection",
                self.mode,
                store.selection().len()
            );
            store.clear_selection();
            return true;
        }
        false
    }

    /// Feed one pointer event. Positions are screen pixels.
    pub fn handle(&mut self, store: &mut BoardStore, event: &InputEvent) -> Effects {
        match event {
            InputEvent::PointerDown { x, y, modifiers } => {
                let p = store.viewport().screen_to_doc(Point::new(*x, *y));
                self.marquee_start = None;
                self.marquee_rect = None;

                if let Some(hit) = hit_test(store.nodes(), p) {
                    let effects = if modifiers.shift {
                        self.click(store, Some(hit), true)
                    } else if !store.is_selected(hit) {
                        self.click(store, Some(hit), false)
                    } else {
                        // Pressing an already-selected node keeps the selection for drag.
                        Effects::new()
                    };
                    if store.is_selected(hit) {
                        self.dragging = true;
                        self.last = p;
                        store.begin_batch();
                    }
                    effects
                } else {
                    let effects = if modifiers.shift {
                        Effects::new()
                    } else {
                        self.click(store, None, false)
                    };
                    self.additive = modifiers.shift;
                    self.marquee_start = Some(p);
                    self.marquee_rect = Some(Rect::from_points(p, p));
                    effects
                }
            }
            InputEvent::PointerMove { x, y, modifiers } => {
                let p = store.viewport().screen_to_doc(Point::new(*x, *y));
                if let Some(start) = self.marquee_start {
                    self.marquee_rect = Some(Rect::from_points(start, p));
                    return Effects::new();
                }
                if self.dragging {
                    let mut dx = p.x - self.last.x;
                    let mut dy = p.y - self.last.y;
                    self.last = p;
                    // Shift: constrain to dominant axis
                    if modifiers.shift {
                        if dx.abs() > dy.abs() {
                            dy = 0.0;
                        } else {
                            dx = 0.0;
                        }
                    }
                    let _ = store.move_selected(dx, dy);
                }
                Effects::new()
            }
            InputEvent::PointerUp { .. } => {
                if self.dragging {
                    self.dragging = false;
                    store.end_batch();
                }
                self.marquee_start = None;
                match self.marquee_rect.take() {
                    Some(rect) if rect.area() > 0.0 => self.select_rect(store, rect, self.additive),
                    _ => Effects::new(),
                }
            }
            InputEvent::Wheel { .. } | InputEvent::Key { .. } => Effects::new(),
        }
    }

    /// Level-triggered dragdrop check: fires a generation whenever a full
    /// pair is picked and none is in flight.
    pub fn poll(&mut self, store: &BoardStore) -> Option<SelectionEffect> {
        if self.mode != CanvasMode::DragDrop || self.in_flight.is_some() {
            return None;
        }
        self.picks.retain(|id| store.contains(*id));
        let [a, b] = self.picks.as_slice() else {
            return None;
        };
        let pair = [*a, *b];
        let request = GenerationRequest::from_nodes(store, &pair, store.config().dragdrop_prompt.clone())?;
        log::info!("dragdrop pair {a} + {b} complete, requesting generation");
        self.in_flight = Some(pair);
        Some(SelectionEffect::Generate(request))
    }

    /// The host reports the pending generation done (success or failure).
    pub fn finish_generation(&mut self) {
        self.in_flight = None;
        self.picks.clear();
    }

    fn cancel_gesture(&mut self, store: &mut BoardStore) {
        if self.dragging {
            self.dragging = false;
            store.end_batch();
        }
        self.marquee_start = None;
        self.marquee_rect = None;
    }

    fn after_selection(&mut self, store: &mut BoardStore) -> Effects {
        let mut effects = Effects::new();
        if self.enforce(store) {
            return effects;
        }
        let [id] = store.selection() else {
            return effects;
        };
        let id = *id;
        match self.mode {
            CanvasMode::Select => {}
            CanvasMode::Chat => {
                if let Some(node) = store.node(id)
                    && let (NodeKind::Image(_), Some(asset)) = (&node.kind, &node.asset_id)
                {
                    let screen = store.viewport().doc_to_screen(node.centroid());
                    effects.push(SelectionEffect::ChatFocus {
                        node: id,
                        asset: asset.clone(),
                        screen,
                    });
                }
            }
            CanvasMode::DragDrop => {
                let eligible = store.node(id).is_some_and(|n| n.content_ref().is_some());
                if eligible && self.in_flight.is_none() && !self.picks.contains(&id) && self.picks.len() < 2 {
                    self.picks.push(id);
                }
                effects.extend(self.poll(store));
            }
        }
        effects
    }
}
