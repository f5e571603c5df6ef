//! Persisted document form and its codecs.
//!
//! JSON is the canonical interchange format; MessagePack is the compact
//! form used for local caches.

use crate::model::{CanvasSize, DocumentFlags, Node, Viewport};
use serde::{Deserialize, Serialize};

/// Everything the persistence boundary loads and saves for one board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub flags: DocumentFlags,
    #[serde(default)]
    pub canvas: CanvasSize,
}

impl DocumentSnapshot {
    pub fn empty(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            nodes: Vec::new(),
            viewport: Viewport::default(),
            flags: DocumentFlags::default(),
            canvas: CanvasSize::default(),
        }
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("encode json: {e}"))
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        let doc: Self = serde_json::from_str(text).map_err(|e| format!("decode json: {e}"))?;
        log::debug!("decoded document {} ({} nodes) from json", doc.id, doc.nodes.len());
        Ok(doc)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>, String> {
        rmp_serde::to_vec_named(self).map_err(|e| format!("encode msgpack: {e}"))
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, String> {
        let doc: Self = rmp_serde::from_slice(bytes).map_err(|e| format!("decode msgpack: {e}"))?;
        log::debug!("decoded document {} ({} nodes) from msgpack", doc.id, doc.nodes.len());
        Ok(doc)
    }

    /// Ids that appear more than once. A well-formed document has none.
    pub fn duplicate_ids(&self) -> Vec<crate::NodeId> {
        let mut seen = std::collections::HashSet::new();
        let mut dups = Vec::new();
        for node in &self.nodes {
            if !seen.insert(node.id) && !dups.contains(&node.id) {
                dups.push(node.id);
            }
        }
        dups
    }
}
