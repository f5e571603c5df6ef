//! Async workflows layered over the store.
//!
//! Each workflow awaits one external boundary, then applies the result to
//! the store in a single synchronous step. Boundary failures never
//! propagate: they land in the store's error field and the workflow
//! returns an empty result. Nothing is applied before success is known,
//! so no rollback is ever needed.

use crate::error::BoardError;
use crate::store::BoardStore;
use board_core::kurbo::Point;
use board_core::{Asset, AssetId, DocumentSnapshot, NodeId};

/// Document storage backend.
#[allow(async_fn_in_trait)]
pub trait PersistenceApi {
    async fn load_document(&self, id: &str) -> Result<DocumentSnapshot, BoardError>;
    async fn save_document(&self, id: &str, document: &DocumentSnapshot) -> Result<(), BoardError>;
}

/// Read-only asset lookup.
#[allow(async_fn_in_trait)]
pub trait AssetService {
    async fn resolve_asset(&self, id: &AssetId) -> Result<Asset, BoardError>;
}

/// Opaque AI generation capability. `Ok(None)` means "nothing produced".
#[allow(async_fn_in_trait)]
pub trait GenerationService {
    async fn generate(&self, request: &GenerationRequest) -> Result<Option<Asset>, BoardError>;
}

/// Inputs for one generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Nodes whose content feeds the generation, in pick order.
    pub sources: Vec<NodeId>,
    pub content_refs: Vec<String>,
    pub prompt: String,
}

impl GenerationRequest {
    /// Build a request from live nodes. Returns `None` if any source is
    /// missing or has no content reference.
    pub fn from_nodes(store: &BoardStore, sources: &[NodeId], prompt: impl Into<String>) -> Option<Self> {
        let content_refs = sources
            .iter()
            .map(|id| store.node(*id)?.content_ref().map(str::to_owned))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            sources: sources.to_vec(),
            content_refs,
            prompt: prompt.into(),
        })
    }
}

/// Replace the store's document with the persisted one.
pub async fn load_document<P: PersistenceApi>(store: &mut BoardStore, api: &P, id: &str) -> bool {
    match api.load_document(id).await {
        Ok(snapshot) => {
            let duplicates = snapshot.duplicate_ids();
            if !duplicates.is_empty() {
                log::warn!("document {id} has duplicate node ids: {duplicates:?}");
            }
            store.load(snapshot);
            store.clear_error();
            true
        }
        Err(e) => {
            store.set_error(format!("Failed to load document: {e}"));
            false
        }
    }
}

/// Persist the store's current document.
pub async fn save_document<P: PersistenceApi>(store: &mut BoardStore, api: &P) -> bool {
    let snapshot = store.snapshot();
    match api.save_document(&snapshot.id, &snapshot).await {
        Ok(()) => {
            log::info!("saved document {} ({} nodes)", snapshot.id, snapshot.nodes.len());
            true
        }
        Err(e) => {
            store.set_error(format!("Failed to save document: {e}"));
            false
        }
    }
}

/// Resolve `asset_id` and place a node showing it at document point `at`.
pub async fn add_asset_node<A: AssetService>(
    store: &mut BoardStore,
    service: &A,
    asset_id: &AssetId,
    at: Point,
) -> Option<NodeId> {
    match service.resolve_asset(asset_id).await {
        Ok(asset) => Some(store.add_node(asset.to_draft(at.x, at.y))),
        Err(e) => {
            store.set_error(format!("Failed to add asset {asset_id}: {e}"));
            None
        }
    }
}

/// Run a generation and append a node for the produced asset.
///
/// The result is placed to the right of the source nodes that still exist,
/// or at the origin if none do.
pub async fn run_generation<G: GenerationService>(
    store: &mut BoardStore,
    service: &G,
    request: &GenerationRequest,
) -> Option<NodeId> {
    log::info!("generation requested for {:?}", request.sources);
    match service.generate(request).await {
        Ok(Some(asset)) => {
            let at = placement_after(store, &request.sources);
            Some(store.add_node(asset.to_draft(at.x, at.y)))
        }
        Ok(None) => {
            log::info!("generation produced no asset");
            None
        }
        Err(e) => {
            store.set_error(format!("Generation failed: {e}"));
            None
        }
    }
}

fn placement_after(store: &BoardStore, sources: &[NodeId]) -> Point {
    let gap = store.config().arrange_gap;
    sources
        .iter()
        .filter_map(|id| store.node(*id))
        .map(|n| n.bounds())
        .reduce(|a, b| a.union(b))
        .map_or(Point::ZERO, |r| Point::new(r.x1 + gap, r.y0))
}
