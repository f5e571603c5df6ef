//! Scene reconciler: node collection → retained drawables.
//!
//! Each node id moves through
//! `absent → materializing → materialized → [updated in place]* → removed`.
//! A pass diffs the desired nodes against the drawable map, removes stale
//! drawables first, then updates or creates the rest. Network content is
//! never fetched here: the pass hands out [`LoadTicket`]s and the host
//! reports completion through [`SceneReconciler::finish_load`].
//!
//! Every ticket carries a per-id version. A completion is applied only if
//! the version is still current *and* the node still wants that url, so a
//! load that was overtaken by a delete or a url change is dropped.
//!
//! The drawable map is a disposable cache: [`SceneReconciler::reset`] plus
//! one pass rebuilds it from the nodes alone.

use crate::loader::LoadError;
use crate::surface::{DrawableContent, DrawableProps, DrawingSurface, Pixels};
use board_core::{Epsilon, Node, NodeId, NodeKind, TextNode, paint_order};
use std::collections::{HashMap, HashSet};

/// Request to fetch content for one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub id: NodeId,
    pub url: String,
    pub version: u64,
}

/// Lifecycle state of one node id, as seen by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Absent,
    Materializing,
    Materialized,
    /// Last load failed; waiting for a different content reference.
    Failed,
}

/// What a node's drawable should show.
#[derive(Debug, Clone, PartialEq)]
enum ContentKey {
    Remote(String),
    Text(TextNode),
    Frame,
}

impl ContentKey {
    fn of(node: &Node) -> Option<Self> {
        match &node.kind {
            NodeKind::Image(_) | NodeKind::Video(_) => {
                node.content_ref().map(|url| ContentKey::Remote(url.to_string()))
            }
            NodeKind::Text(text) => Some(ContentKey::Text(text.clone())),
            NodeKind::Group(_) => Some(ContentKey::Frame),
        }
    }

    /// Content that needs no fetch, if any.
    fn local(&self) -> Option<DrawableContent> {
        match self {
            ContentKey::Remote(_) => None,
            ContentKey::Text(text) => Some(DrawableContent::Text(text.clone())),
            ContentKey::Frame => Some(DrawableContent::Frame),
        }
    }
}

#[derive(Debug)]
struct Drawable<H> {
    handle: H,
    content: ContentKey,
}

#[derive(Debug)]
enum Fetch {
    InFlight { version: u64, url: String },
    Failed { url: String },
}

#[derive(Debug)]
struct Slot<H> {
    drawable: Option<Drawable<H>>,
    fetch: Option<Fetch>,
}

impl<H> Default for Slot<H> {
    fn default() -> Self {
        Self {
            drawable: None,
            fetch: None,
        }
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReconcileReport {
    pub removed: Vec<NodeId>,
    pub created: Vec<NodeId>,
    pub updated: Vec<NodeId>,
    pub content_swapped: Vec<NodeId>,
    pub restacked: bool,
    /// Content fetches the host must start.
    pub loads: Vec<LoadTicket>,
}

impl ReconcileReport {
    /// Number of drawable writes performed on the surface.
    pub fn surface_mutations(&self) -> usize {
        self.removed.len()
            + self.created.len()
            + self.updated.len()
            + self.content_swapped.len()
            + usize::from(self.restacked)
    }

    pub fn is_noop(&self) -> bool {
        self.surface_mutations() == 0 && self.loads.is_empty()
    }
}

/// Result of applying a finished content load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// First content for the node; a drawable now exists.
    Materialized,
    /// Replaced the content of an existing drawable.
    Swapped,
    /// Overtaken by a delete, url change or newer request; ignored.
    Stale,
    /// The load failed. The node keeps no (or its previous) drawable.
    Failed(LoadError),
}

/// Whether realized properties differ from the desired ones by more than
/// the configured epsilons.
pub fn needs_update(realized: &DrawableProps, desired: &DrawableProps, eps: &Epsilon) -> bool {
    let (a, b) = (&realized.geometry, &desired.geometry);
    let moved = (a.x - b.x).abs() > eps.position
        || (a.y - b.y).abs() > eps.position
        || (a.width - b.width).abs() > eps.position
        || (a.height - b.height).abs() > eps.position;
    let turn = (realized.rotation - desired.rotation).rem_euclid(360.0);
    let rotated = turn.min(360.0 - turn) > eps.rotation;
    let faded = (realized.opacity - desired.opacity).abs() > eps.opacity;
    moved || rotated || faded || realized.visual != desired.visual
}

/// Keeps a drawing surface in correspondence with a node collection.
pub struct SceneReconciler<H> {
    slots: HashMap<NodeId, Slot<H>>,
    /// Survives removal so tickets for a deleted-then-restored id stay stale.
    versions: HashMap<NodeId, u64>,
    /// Paint order last pushed to the surface.
    stacked: Vec<NodeId>,
    epsilon: Epsilon,
}

impl<H: Clone + std::fmt::Debug + PartialEq> SceneReconciler<H> {
    pub fn new(epsilon: Epsilon) -> Self {
        Self {
            slots: HashMap::new(),
            versions: HashMap::new(),
            stacked: Vec::new(),
            epsilon,
        }
    }

    pub fn state(&self, id: NodeId) -> NodeState {
        match self.slots.get(&id) {
            None => NodeState::Absent,
            Some(Slot {
                drawable: Some(_), ..
            }) => NodeState::Materialized,
            Some(Slot {
                fetch: Some(Fetch::InFlight { .. }),
                ..
            }) => NodeState::Materializing,
            Some(Slot {
                fetch: Some(Fetch::Failed { .. }),
                ..
            }) => NodeState::Failed,
            Some(_) => NodeState::Absent,
        }
    }

    pub fn handle(&self, id: NodeId) -> Option<&H> {
        self.slots
            .get(&id)
            .and_then(|s| s.drawable.as_ref())
            .map(|d| &d.handle)
    }

    /// Ids that currently have a drawable.
    pub fn materialized_ids(&self) -> HashSet<NodeId> {
        self.slots
            .iter()
            .filter(|(_, s)| s.drawable.is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    fn issue(&mut self, id: NodeId, url: &str) -> LoadTicket {
        let version = self.bump(id);
        LoadTicket {
            id,
            url: url.to_string(),
            version,
        }
    }

    fn bump(&mut self, id: NodeId) -> u64 {
        let v = self.versions.entry(id).or_insert(0);
        *v += 1;
        *v
    }

    /// Run one diff-and-apply pass against `nodes` (paint order).
    pub fn reconcile<S>(&mut self, nodes: &[Node], surface: &mut S) -> ReconcileReport
    where
        S: DrawingSurface<Handle = H>,
    {
        let mut report = ReconcileReport::default();
        let desired: HashSet<NodeId> = nodes.iter().map(|n| n.id).collect();

        // 1. Removals strictly before any creation.
        let stale: Vec<NodeId> = self
            .slots
            .keys()
            .filter(|id| !desired.contains(id))
            .copied()
            .collect();
        for id in stale {
            if let Some(slot) = self.slots.remove(&id) {
                self.release(id, slot, surface, &mut report);
            }
        }

        // 2 + 3. Update in place, or start materializing.
        for node in nodes {
            self.reconcile_node(node, surface, &mut report);
        }

        report.restacked = self.sync_order(nodes, surface);

        if report.surface_mutations() > 0 {
            surface.redraw();
        }
        log::debug!(
            "reconcile: -{} +{} ~{} swap {} loads {}",
            report.removed.len(),
            report.created.len(),
            report.updated.len(),
            report.content_swapped.len(),
            report.loads.len()
        );
        report
    }

    fn release<S>(&mut self, id: NodeId, slot: Slot<H>, surface: &mut S, report: &mut ReconcileReport)
    where
        S: DrawingSurface<Handle = H>,
    {
        if let Some(d) = slot.drawable {
            surface.remove(&d.handle);
            report.removed.push(id);
        }
        if let Some(Fetch::InFlight { .. }) = slot.fetch {
            self.bump(id);
        }
    }

    fn reconcile_node<S>(&mut self, node: &Node, surface: &mut S, report: &mut ReconcileReport)
    where
        S: DrawingSurface<Handle = H>,
    {
        let id = node.id;
        let mut slot = self.slots.remove(&id).unwrap_or_default();

        let Some(key) = ContentKey::of(node) else {
            // Nothing to show (e.g. an image without a url yet).
            self.release(id, slot, surface, report);
            return;
        };

        let props = DrawableProps::from_node(node);
        if let Some(d) = &slot.drawable {
            let stale = match surface.realized(&d.handle) {
                Some(realized) => needs_update(&realized, &props, &self.epsilon),
                None => true,
            };
            if stale {
                log::trace!("update transform of {id}");
                surface.set_props(&d.handle, &props);
                report.updated.push(id);
            }
        }

        let showing = slot.drawable.as_ref().is_some_and(|d| d.content == key);
        if showing {
            if let Some(Fetch::InFlight { .. }) = slot.fetch.take() {
                // Content reverted while a reload was outstanding.
                self.bump(id);
            }
            slot.fetch = None;
        } else if let Some(content) = key.local() {
            if let Some(Fetch::InFlight { .. }) = slot.fetch.take() {
                self.bump(id);
            }
            match slot.drawable.as_mut() {
                Some(d) => {
                    surface.set_content(&d.handle, content);
                    d.content = key;
                    report.content_swapped.push(id);
                }
                None => {
                    let handle = surface.create(id, &props, content);
                    slot.drawable = Some(Drawable {
                        handle,
                        content: key,
                    });
                    report.created.push(id);
                }
            }
        } else if let ContentKey::Remote(url) = &key {
            let pending = matches!(
                &slot.fetch,
                Some(Fetch::InFlight { url: u, .. }) | Some(Fetch::Failed { url: u }) if u == url
            );
            if !pending {
                let ticket = self.issue(id, url);
                log::trace!("load {url} for {id} (v{})", ticket.version);
                slot.fetch = Some(Fetch::InFlight {
                    version: ticket.version,
                    url: url.clone(),
                });
                report.loads.push(ticket);
            }
        }

        self.slots.insert(id, slot);
    }

    /// Push paint order to the surface if the materialized order changed.
    fn sync_order<S>(&mut self, nodes: &[Node], surface: &mut S) -> bool
    where
        S: DrawingSurface<Handle = H>,
    {
        let order: Vec<NodeId> = paint_order(nodes)
            .into_iter()
            .filter(|n| self.handle(n.id).is_some())
            .map(|n| n.id)
            .collect();
        if order == self.stacked {
            return false;
        }
        let handles: Vec<H> = order.iter().filter_map(|id| self.handle(*id).cloned()).collect();
        surface.restack(&handles);
        self.stacked = order;
        true
    }

    fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.versions.get(&ticket.id) == Some(&ticket.version)
            && matches!(
                self.slots.get(&ticket.id),
                Some(Slot { fetch: Some(Fetch::InFlight { version, url }), .. })
                    if *version == ticket.version && *url == ticket.url
            )
    }

    /// Apply a finished load. `nodes` is the *current* collection: the
    /// result is re-validated against it, not against the state at request
    /// time.
    pub fn finish_load<S>(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Pixels, LoadError>,
        nodes: &[Node],
        surface: &mut S,
    ) -> LoadOutcome
    where
        S: DrawingSurface<Handle = H>,
    {
        let node = nodes.iter().find(|n| n.id == ticket.id);
        let wanted = node.is_some_and(|n| n.content_ref() == Some(ticket.url.as_str()));
        if !self.is_current(ticket) || !wanted {
            log::debug!("discarding stale load of {} for {}", ticket.url, ticket.id);
            return LoadOutcome::Stale;
        }
        let Some(node) = node else {
            return LoadOutcome::Stale;
        };
        let Some(mut slot) = self.slots.remove(&ticket.id) else {
            return LoadOutcome::Stale;
        };

        let outcome = match result {
            Ok(pixels) => {
                slot.fetch = None;
                let props = DrawableProps::from_node(node);
                let key = ContentKey::Remote(ticket.url.clone());
                match slot.drawable.as_mut() {
                    Some(d) => {
                        surface.set_props(&d.handle, &props);
                        surface.set_content(&d.handle, DrawableContent::Pixels(pixels));
                        d.content = key;
                        LoadOutcome::Swapped
                    }
                    None => {
                        let handle =
                            surface.create(ticket.id, &props, DrawableContent::Pixels(pixels));
                        slot.drawable = Some(Drawable {
                            handle,
                            content: key,
                        });
                        LoadOutcome::Materialized
                    }
                }
            }
            Err(err) => {
                log::warn!("content load failed for {}: {err}", ticket.id);
                slot.fetch = Some(Fetch::Failed {
                    url: ticket.url.clone(),
                });
                LoadOutcome::Failed(err)
            }
        };
        self.slots.insert(ticket.id, slot);

        if !matches!(outcome, LoadOutcome::Failed(_)) {
            self.sync_order(nodes, surface);
            surface.redraw();
        }
        outcome
    }

    /// Drop every drawable and forget all in-flight loads. The next pass
    /// rebuilds from node state.
    pub fn reset<S>(&mut self, surface: &mut S)
    where
        S: DrawingSurface<Handle = H>,
    {
        let ids: Vec<NodeId> = self.slots.keys().copied().collect();
        let mut report = ReconcileReport::default();
        for id in ids {
            if let Some(slot) = self.slots.remove(&id) {
                self.release(id, slot, surface, &mut report);
            }
        }
        self.stacked.clear();
        if !report.removed.is_empty() {
            surface.redraw();
        }
    }
}
