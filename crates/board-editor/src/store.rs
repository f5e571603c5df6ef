//! Document state store.
//!
//! The store owns the authoritative node collection, the selection, the
//! viewport and per-document flags. Every operation is synchronous and
//! atomic. Operations that change the node collection bump the revision,
//! notify observers and capture one history snapshot; selection, viewport
//! and flag changes are never versioned.
//!
//! One store exists per open document. It is passed around explicitly;
//! observers register through [`BoardStore::subscribe`].

use crate::history::History;
use board_core::arrange::{Alignment, arrange};
use board_core::kurbo::Point;
use board_core::{
    BoardConfig, CanvasSize, DocumentFlags, DocumentSnapshot, Node, NodeDraft, NodeId, NodePatch,
    NodeType, Pan, Viewport,
};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZStep {
    Forward,
    Backward,
    Front,
    Back,
}

/// Which editor a document belongs to.
///
/// The video canvas keeps no history at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    ImageCanvas,
    VideoCanvas,
}

/// Result of a mutation that targets existing nodes.
///
/// Targeting an id that is not in the document is tolerated and reported
/// as `NoOp`; callers that delete idempotently rely on this.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    NoOp,
}

impl MutationOutcome {
    pub fn applied(self) -> bool {
        self == MutationOutcome::Applied
    }
}

/// Notifications delivered to observers after each operation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    NodesChanged { revision: u64 },
    SelectionChanged,
    ViewportChanged,
    FlagsChanged,
    HistoryChanged { index: usize, len: usize },
    ErrorChanged,
    DocumentLoaded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent)>;

pub type Selection = SmallVec<[NodeId; 4]>;

pub struct BoardStore {
    kind: DocumentKind,
    config: BoardConfig,
    document_id: String,
    name: String,
    nodes: Vec<Node>,
    selection: Selection,
    viewport: Viewport,
    flags: DocumentFlags,
    canvas: CanvasSize,
    history: Option<History>,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// Whether the node collection changed during the current batch.
    batch_dirty: bool,
    revision: u64,
    error: Option<String>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl BoardStore {
    /// An empty, untitled document.
    pub fn new(kind: DocumentKind, config: BoardConfig) -> Self {
        let history = match kind {
            DocumentKind::ImageCanvas => {
                let mut h = History::new(config.history_capacity);
                h.reset(&[]);
                Some(h)
            }
            DocumentKind::VideoCanvas => None,
        };
        Self {
            kind,
            config,
            document_id: String::new(),
            name: String::new(),
            nodes: Vec::new(),
            selection: Selection::new(),
            viewport: Viewport::default(),
            flags: DocumentFlags::default(),
            canvas: CanvasSize::default(),
            history,
            batch_depth: 0,
            batch_dirty: false,
            revision: 0,
            error: None,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    // ─── Observers ───────────────────────────────────────────────────────

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: StoreEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    // ─── Read surface ────────────────────────────────────────────────────

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    fn position(&self, id: NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.position(id).is_some()
    }

    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selection.contains(&id)
    }

    /// Selected nodes in selection order.
    pub fn selected_nodes(&self) -> Vec<&Node> {
        self.selection.iter().filter_map(|id| self.node(*id)).collect()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn flags(&self) -> DocumentFlags {
        self.flags
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Current history position, or `None` when this document keeps none.
    pub fn history_index(&self) -> Option<usize> {
        self.history.as_ref().map(History::index)
    }

    pub fn history_len(&self) -> usize {
        self.history.as_ref().map_or(0, History::len)
    }

    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(History::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(History::can_redo)
    }

    // ─── Load / save ─────────────────────────────────────────────────────

    /// Replace the whole document. Clears selection and restarts history
    /// from the loaded nodes.
    pub fn load(&mut self, snapshot: DocumentSnapshot) {
        log::info!(
            "loading document {} ({} nodes)",
            snapshot.id,
            snapshot.nodes.len()
        );
        self.document_id = snapshot.id;
        self.name = snapshot.name;
        self.nodes = snapshot.nodes;
        self.viewport = snapshot.viewport;
        self.viewport.zoom = self.config.clamp_zoom(self.viewport.zoom);
        self.flags = snapshot.flags;
        self.canvas = snapshot.canvas;
        self.selection.clear();
        self.batch_depth = 0;
        self.batch_dirty = false;
        if let Some(h) = self.history.as_mut() {
            h.reset(&self.nodes);
        }
        self.revision += 1;
        self.emit(StoreEvent::DocumentLoaded);
        self.emit(StoreEvent::NodesChanged {
            revision: self.revision,
        });
        self.emit(StoreEvent::SelectionChanged);
        self.emit_history();
    }

    /// Everything the persistence boundary saves.
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            id: self.document_id.clone(),
            name: self.name.clone(),
            nodes: self.nodes.clone(),
            viewport: self.viewport,
            flags: self.flags,
            canvas: self.canvas,
        }
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Record the node collection as a new history entry.
    pub fn save_history(&mut self) {
        if let Some(h) = self.history.as_mut() {
            h.record(&self.nodes);
            self.emit_history();
        }
    }

    fn emit_history(&mut self) {
        if let Some(h) = self.history.as_ref() {
            let event = StoreEvent::HistoryChanged {
                index: h.index(),
                len: h.len(),
            };
            self.emit(event);
        }
    }

    pub fn undo(&mut self) -> MutationOutcome {
        let restored = self.history.as_mut().and_then(History::undo);
        self.restore(restored)
    }

    pub fn redo(&mut self) -> MutationOutcome {
        let restored = self.history.as_mut().and_then(History::redo);
        self.restore(restored)
    }

    fn restore(&mut self, restored: Option<Vec<Node>>) -> MutationOutcome {
        let Some(nodes) = restored else {
            return MutationOutcome::NoOp;
        };
        self.nodes = nodes;
        self.selection.clear();
        self.revision += 1;
        self.emit(StoreEvent::NodesChanged {
            revision: self.revision,
        });
        self.emit(StoreEvent::SelectionChanged);
        self.emit_history();
        MutationOutcome::Applied
    }

    /// Start a gesture batch. Mutations apply live but history is captured
    /// once, when the outermost batch ends.
    pub fn begin_batch(&mut self) {
        if self.batch_depth == 0 {
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
    }

    /// End a gesture batch. Captures one entry if the nodes actually changed.
    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 && self.batch_dirty {
            self.batch_dirty = false;
            let changed = self
                .history
                .as_ref()
                .and_then(History::current)
                .is_none_or(|entry| entry.nodes != self.nodes);
            if changed {
                self.save_history();
            }
        }
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Finish a node-collection mutation: notify, then capture history
    /// (deferred while batching).
    fn commit(&mut self) {
        self.revision += 1;
        self.emit(StoreEvent::NodesChanged {
            revision: self.revision,
        });
        if self.batch_depth > 0 {
            self.batch_dirty = true;
        } else {
            self.save_history();
        }
    }

    fn prune_selection(&mut self) -> bool {
        let before = self.selection.len();
        let nodes = &self.nodes;
        self.selection.retain(|id| nodes.iter().any(|n| n.id == *id));
        self.selection.len() != before
    }

    fn fresh_id(&self, ty: NodeType) -> NodeId {
        loop {
            let id = NodeId::with_prefix(ty.id_prefix());
            if !self.contains(id) {
                return id;
            }
        }
    }

    // ─── Node mutations ──────────────────────────────────────────────────

    /// Append a node on top of the paint order. Geometry is taken as-is.
    pub fn add_node(&mut self, draft: NodeDraft) -> NodeId {
        let id = self.fresh_id(draft.kind.node_type());
        let z_index = self.nodes.len() as i64;
        self.nodes.push(draft.into_node(id, z_index));
        log::debug!("add {id} (z {z_index})");
        self.commit();
        id
    }

    /// Merge `patch` into node `id`.
    pub fn update_node(&mut self, id: NodeId, patch: &NodePatch) -> MutationOutcome {
        let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) else {
            log::debug!("update of unknown node {id} ignored");
            return MutationOutcome::NoOp;
        };
        node.apply_patch(patch);
        self.commit();
        MutationOutcome::Applied
    }

    pub fn delete_node(&mut self, id: NodeId) -> MutationOutcome {
        let Some(pos) = self.position(id) else {
            log::debug!("delete of unknown node {id} ignored");
            return MutationOutcome::NoOp;
        };
        self.nodes.remove(pos);
        if self.prune_selection() {
            self.emit(StoreEvent::SelectionChanged);
        }
        self.commit();
        MutationOutcome::Applied
    }

    pub fn delete_selected_nodes(&mut self) -> MutationOutcome {
        if self.selection.is_empty() {
            return MutationOutcome::NoOp;
        }
        let doomed = std::mem::take(&mut self.selection);
        let before = self.nodes.len();
        self.nodes.retain(|n| !doomed.contains(&n.id));
        self.emit(StoreEvent::SelectionChanged);
        if self.nodes.len() == before {
            return MutationOutcome::NoOp;
        }
        self.commit();
        MutationOutcome::Applied
    }

    /// Copy every selected node with a fresh id, offset by the configured
    /// delta. The copies become the selection. One history entry.
    pub fn duplicate_selected(&mut self) -> Vec<NodeId> {
        let offset = self.config.duplicate_offset;
        let sources: Vec<Node> = self.selected_nodes().into_iter().cloned().collect();
        if sources.is_empty() {
            return Vec::new();
        }

        let mut created = Vec::with_capacity(sources.len());
        for mut copy in sources {
            copy.id = self.fresh_id(copy.node_type());
            copy.geometry = copy.geometry.translated(offset, offset);
            copy.z_index = self.nodes.len() as i64;
            created.push(copy.id);
            self.nodes.push(copy);
        }
        log::debug!("duplicated {} node(s)", created.len());

        self.selection = created.iter().copied().collect();
        self.emit(StoreEvent::SelectionChanged);
        self.commit();
        created
    }

    /// Arrange the selection. Needs at least two selected nodes.
    pub fn align_nodes(&mut self, alignment: Alignment) -> MutationOutcome {
        let items: Vec<_> = self
            .selected_nodes()
            .into_iter()
            .map(|n| (n.id, n.geometry))
            .collect();
        let placements = arrange(&items, alignment, self.config.arrange_gap);
        if placements.is_empty() {
            return MutationOutcome::NoOp;
        }
        for p in placements {
            if let Some(node) = self.nodes.iter_mut().find(|n| n.id == p.id) {
                node.geometry.x = p.x;
                node.geometry.y = p.y;
            }
        }
        log::debug!("aligned {} node(s) as {alignment:?}", items.len());
        self.commit();
        MutationOutcome::Applied
    }

    /// Move the selected, unlocked nodes by `(dx, dy)`.
    pub fn move_selected(&mut self, dx: f64, dy: f64) -> MutationOutcome {
        let selection = &self.selection;
        let mut moved = false;
        for node in self
            .nodes
            .iter_mut()
            .filter(|n| !n.locked && selection.contains(&n.id))
        {
            node.geometry = node.geometry.translated(dx, dy);
            moved = true;
        }
        if !moved {
            return MutationOutcome::NoOp;
        }
        self.commit();
        MutationOutcome::Applied
    }

    // ─── Z-order ─────────────────────────────────────────────────────────

    /// Move `moved` as a block within paint order, then renumber `z_index`
    /// to match the new collection order. One history entry per call.
    fn reorder(&mut self, moved: &[NodeId], step: ZStep) -> MutationOutcome {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by_key(|&i| self.nodes[i].z_index);
        let before = order.clone();

        let nodes = &self.nodes;
        let is_moved = |i: usize| moved.contains(&nodes[i].id);
        match step {
            ZStep::Front | ZStep::Back => {
                let (block, rest): (Vec<usize>, Vec<usize>) = order.iter().partition(|&&i| is_moved(i));
                order = if step == ZStep::Front {
                    rest.into_iter().chain(block).collect()
                } else {
                    block.into_iter().chain(rest).collect()
                };
            }
            ZStep::Forward => {
                for k in (0..order.len().saturating_sub(1)).rev() {
                    if is_moved(order[k]) && !is_moved(order[k + 1]) {
                        order.swap(k, k + 1);
                    }
                }
            }
            ZStep::Backward => {
                for k in 1..order.len() {
                    if is_moved(order[k]) && !is_moved(order[k - 1]) {
                        order.swap(k - 1, k);
                    }
                }
            }
        }
        if order == before {
            return MutationOutcome::NoOp;
        }

        let mut slots: Vec<Option<Node>> = std::mem::take(&mut self.nodes).into_iter().map(Some).collect();
        self.nodes = order.iter().filter_map(|&i| slots[i].take()).collect();
        for (i, n) in self.nodes.iter_mut().enumerate() {
            n.z_index = i as i64;
        }
        self.commit();
        MutationOutcome::Applied
    }

    pub fn bring_to_front(&mut self, id: NodeId) -> MutationOutcome {
        self.reorder(&[id], ZStep::Front)
    }

    pub fn send_to_back(&mut self, id: NodeId) -> MutationOutcome {
        self.reorder(&[id], ZStep::Back)
    }

    pub fn bring_forward(&mut self, id: NodeId) -> MutationOutcome {
        self.reorder(&[id], ZStep::Forward)
    }

    pub fn send_backward(&mut self, id: NodeId) -> MutationOutcome {
        self.reorder(&[id], ZStep::Backward)
    }

    /// The selection moves as one block; its internal order is kept.
    pub fn bring_selected_to_front(&mut self) -> MutationOutcome {
        let ids = self.selection.to_vec();
        self.reorder(&ids, ZStep::Front)
    }

    pub fn send_selected_to_back(&mut self) -> MutationOutcome {
        let ids = self.selection.to_vec();
        self.reorder(&ids, ZStep::Back)
    }

    /// Each run of selected nodes hops over the next unselected node above it.
    pub fn bring_selected_forward(&mut self) -> MutationOutcome {
        let ids = self.selection.to_vec();
        self.reorder(&ids, ZStep::Forward)
    }

    pub fn send_selected_backward(&mut self) -> MutationOutcome {
        let ids = self.selection.to_vec();
        self.reorder(&ids, ZStep::Backward)
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// `multi = false`: select exactly `id`. `multi = true`: toggle `id`.
    /// Unknown ids are ignored.
    pub fn select_node(&mut self, id: NodeId, multi: bool) {
        if !self.contains(id) {
            return;
        }
        if multi {
            if let Some(pos) = self.selection.iter().position(|s| *s == id) {
                self.selection.remove(pos);
            } else {
                self.selection.push(id);
            }
        } else {
            self.selection.clear();
            self.selection.push(id);
        }
        self.emit(StoreEvent::SelectionChanged);
    }

    /// Replace the selection wholesale. The caller guarantees the ids are
    /// live (they come from materialized drawables).
    pub fn select_nodes(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        self.selection.clear();
        for id in ids {
            if !self.selection.contains(&id) {
                self.selection.push(id);
            }
        }
        self.emit(StoreEvent::SelectionChanged);
    }

    pub fn select_all(&mut self) {
        let ids: Vec<NodeId> = self.nodes.iter().map(|n| n.id).collect();
        self.select_nodes(ids);
    }

    pub fn clear_selection(&mut self) {
        if self.selection.is_empty() {
            return;
        }
        self.selection.clear();
        self.emit(StoreEvent::SelectionChanged);
    }

    // ─── Viewport & flags ────────────────────────────────────────────────

    pub fn set_zoom(&mut self, zoom: f64) {
        self.viewport.zoom = self.config.clamp_zoom(zoom);
        self.emit(StoreEvent::ViewportChanged);
    }

    /// Multiply zoom by `factor`, keeping the screen point `anchor` over
    /// the same document point.
    pub fn zoom_by(&mut self, factor: f64, anchor: Point) {
        let doc = self.viewport.screen_to_doc(anchor);
        let zoom = self.config.clamp_zoom(self.viewport.zoom * factor);
        self.viewport.zoom = zoom;
        self.viewport.pan = Pan {
            x: anchor.x - doc.x * zoom,
            y: anchor.y - doc.y * zoom,
        };
        self.emit(StoreEvent::ViewportChanged);
    }

    pub fn set_pan(&mut self, x: f64, y: f64) {
        self.viewport.pan = Pan { x, y };
        self.emit(StoreEvent::ViewportChanged);
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.viewport.pan.x += dx;
        self.viewport.pan.y += dy;
        self.emit(StoreEvent::ViewportChanged);
    }

    pub fn set_show_grid(&mut self, show: bool) {
        self.flags.show_grid = show;
        self.emit(StoreEvent::FlagsChanged);
    }

    pub fn set_snap_to_grid(&mut self, snap: bool) {
        self.flags.snap_to_grid = snap;
        self.emit(StoreEvent::FlagsChanged);
    }

    pub fn set_canvas_size(&mut self, width: u32, height: u32) {
        self.canvas = CanvasSize { width, height };
        self.emit(StoreEvent::ViewportChanged);
    }

    // ─── Errors ──────────────────────────────────────────────────────────

    pub fn set_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{message}");
        self.error = Some(message);
        self.emit(StoreEvent::ErrorChanged);
    }

    pub fn clear_error(&mut self) {
        if self.error.take().is_some() {
            self.emit(StoreEvent::ErrorChanged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_core::Geometry;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> BoardStore {
        BoardStore::new(DocumentKind::ImageCanvas, BoardConfig::default())
    }

    fn square(x: f64, y: f64, size: f64) -> NodeDraft {
        NodeDraft::image("https://cdn.test/sq.png", Geometry::new(x, y, size, size))
    }

    #[test]
    fn add_assigns_z_from_count() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        let b = s.add_node(square(0.0, 0.0, 10.0));
        assert_ne!(a, b);
        assert_eq!(s.node(a).unwrap().z_index, 0);
        assert_eq!(s.node(b).unwrap().z_index, 1);
        assert_eq!(s.nodes().last().unwrap().id, b);
    }

    #[test]
    fn update_unknown_is_explicit_noop() {
        let mut s = store();
        let before = s.history_len();
        let outcome = s.update_node(NodeId::intern("ghost"), &NodePatch::position(1.0, 1.0));
        assert_eq!(outcome, MutationOutcome::NoOp);
        assert_eq!(s.history_len(), before);
        assert_eq!(s.delete_node(NodeId::intern("ghost")), MutationOutcome::NoOp);
    }

    #[test]
    fn select_node_toggles_when_multi() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        let b = s.add_node(square(0.0, 0.0, 10.0));
        s.select_node(a, false);
        s.select_node(b, true);
        assert_eq!(s.selection(), &[a, b]);
        s.select_node(a, true);
        assert_eq!(s.selection(), &[b]);
        s.select_node(a, false);
        assert_eq!(s.selection(), &[a]);
    }

    #[test]
    fn delete_prunes_selection() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        let b = s.add_node(square(0.0, 0.0, 10.0));
        s.select_nodes([a, b]);
        let _ = s.delete_node(a);
        assert_eq!(s.selection(), &[b]);
        let _ = s.delete_selected_nodes();
        assert!(s.nodes().is_empty());
        assert!(s.selection().is_empty());
    }

    #[test]
    fn selection_changes_do_not_touch_history() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        let len = s.history_len();
        s.select_node(a, false);
        s.set_zoom(2.0);
        s.pan_by(5.0, 5.0);
        s.set_show_grid(true);
        assert_eq!(s.history_len(), len);
    }

    #[test]
    fn duplicate_is_one_history_entry() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        let b = s.add_node(square(50.0, 0.0, 10.0));
        s.select_nodes([a, b]);
        let len = s.history_len();
        let copies = s.duplicate_selected();
        assert_eq!(copies.len(), 2);
        assert_eq!(s.history_len(), len + 1);
        assert_eq!(s.selection(), copies.as_slice());
        assert_eq!(s.node(copies[1]).unwrap().geometry.x, 70.0);
        assert_eq!(s.node(copies[1]).unwrap().z_index, 3);
    }

    #[test]
    fn align_with_one_selected_is_noop() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        s.select_node(a, false);
        let len = s.history_len();
        assert_eq!(s.align_nodes(Alignment::Row), MutationOutcome::NoOp);
        assert_eq!(s.history_len(), len);
    }

    #[test]
    fn locked_nodes_are_not_dragged() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        let b = s.add_node(square(0.0, 0.0, 10.0));
        let _ = s.update_node(
            b,
            &NodePatch {
                locked: Some(true),
                ..NodePatch::default()
            },
        );
        s.select_nodes([a, b]);
        let _ = s.move_selected(5.0, 5.0);
        assert_eq!(s.node(a).unwrap().geometry.x, 5.0);
        assert_eq!(s.node(b).unwrap().geometry.x, 0.0);
    }

    #[test]
    fn batch_collapses_to_one_entry() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        s.select_node(a, false);
        let len = s.history_len();
        s.begin_batch();
        for _ in 0..5 {
            let _ = s.move_selected(2.0, 0.0);
        }
        s.end_batch();
        assert_eq!(s.history_len(), len + 1);
        let _ = s.undo();
        assert_eq!(s.node(a).unwrap().geometry.x, 0.0);
    }

    #[test]
    fn empty_batch_records_nothing() {
        let mut s = store();
        let len = s.history_len();
        s.begin_batch();
        s.end_batch();
        assert_eq!(s.history_len(), len);
    }

    #[test]
    fn z_order_renumbers() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        let b = s.add_node(square(0.0, 0.0, 10.0));
        let c = s.add_node(square(0.0, 0.0, 10.0));
        assert!(s.bring_to_front(a).applied());
        let order: Vec<NodeId> = s.nodes().iter().map(|n| n.id).collect();
        assert_eq!(order, vec![b, c, a]);
        assert_eq!(s.node(a).unwrap().z_index, 2);
        assert_eq!(s.bring_forward(a), MutationOutcome::NoOp);
        assert!(s.send_backward(a).applied());
        assert!(s.send_to_back(a).applied());
        assert_eq!(s.nodes()[0].id, a);
    }

    #[test]
    fn adjacent_selected_nodes_step_as_a_block() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        let b = s.add_node(square(0.0, 0.0, 10.0));
        let x = s.add_node(square(0.0, 0.0, 10.0));
        s.select_nodes([a, b]);
        let len = s.history_len();

        assert!(s.bring_selected_forward().applied());
        let order: Vec<NodeId> = s.nodes().iter().map(|n| n.id).collect();
        assert_eq!(order, vec![x, a, b]);
        assert_eq!(s.history_len(), len + 1);
        assert_eq!(s.bring_selected_forward(), MutationOutcome::NoOp);

        assert!(s.send_selected_backward().applied());
        let order: Vec<NodeId> = s.nodes().iter().map(|n| n.id).collect();
        assert_eq!(order, vec![a, b, x]);
        assert_eq!(s.send_selected_backward(), MutationOutcome::NoOp);
    }

    #[test]
    fn z_order_starts_from_paint_order() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        let b = s.add_node(square(0.0, 0.0, 10.0));
        // `a` paints on top despite coming first in the collection.
        let _ = s.update_node(
            a,
            &NodePatch {
                z_index: Some(7),
                ..NodePatch::default()
            },
        );
        assert_eq!(s.bring_to_front(a), MutationOutcome::NoOp);
        assert!(s.bring_forward(b).applied());
        let order: Vec<NodeId> = s.nodes().iter().map(|n| n.id).collect();
        assert_eq!(order, vec![a, b]);
        assert_eq!((s.node(a).unwrap().z_index, s.node(b).unwrap().z_index), (0, 1));
    }

    #[test]
    fn zoom_by_keeps_anchor_fixed() {
        let mut s = store();
        let anchor = Point::new(400.0, 300.0);
        let before = s.viewport().screen_to_doc(anchor);
        s.zoom_by(2.0, anchor);
        let after = s.viewport().screen_to_doc(anchor);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
        assert_eq!(s.viewport().zoom, 2.0);
    }

    #[test]
    fn observers_see_events_until_unsubscribed() {
        let mut s = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = s.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        s.add_node(square(0.0, 0.0, 10.0));
        assert!(matches!(seen.borrow()[0], StoreEvent::NodesChanged { .. }));
        assert!(matches!(seen.borrow()[1], StoreEvent::HistoryChanged { .. }));

        assert!(s.unsubscribe(sub));
        let count = seen.borrow().len();
        s.set_zoom(3.0);
        assert_eq!(seen.borrow().len(), count);
    }

    #[test]
    fn error_is_set_and_cleared() {
        let mut s = store();
        s.set_error("save failed");
        assert_eq!(s.error(), Some("save failed"));
        s.clear_error();
        assert_eq!(s.error(), None);
    }

    #[test]
    fn video_canvas_keeps_no_history() {
        let mut s = BoardStore::new(DocumentKind::VideoCanvas, BoardConfig::default());
        let a = s.add_node(square(0.0, 0.0, 10.0));
        assert_eq!(s.history_len(), 0);
        assert_eq!(s.history_index(), None);
        assert!(!s.can_undo());
        assert_eq!(s.undo(), MutationOutcome::NoOp);
        assert!(s.contains(a));
    }

    #[test]
    fn load_resets_selection_and_history() {
        let mut s = store();
        let a = s.add_node(square(0.0, 0.0, 10.0));
        s.select_node(a, false);
        let mut doc = DocumentSnapshot::empty("d-1", "Loaded");
        doc.viewport.zoom = 100.0;
        s.load(doc);
        assert!(s.nodes().is_empty());
        assert!(s.selection().is_empty());
        assert_eq!(s.history_len(), 1);
        assert!(!s.can_undo());
        assert_eq!(s.viewport().zoom, 10.0);
        assert_eq!(s.snapshot().name, "Loaded");
    }
}
