//! Filesystem persistence: a document id is its path.
//!
//! `.msgpack` / `.mpk` files use the MessagePack codec; anything else is
//! JSON.

use board_core::DocumentSnapshot;
use board_editor::{BoardError, PersistenceApi};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    MsgPack,
}

impl Format {
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("msgpack" | "mpk") => Format::MsgPack,
            _ => Format::Json,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "json" => Some(Format::Json),
            "msgpack" | "mpk" => Some(Format::MsgPack),
            _ => None,
        }
    }

    pub fn encode(self, doc: &DocumentSnapshot) -> Result<Vec<u8>, BoardError> {
        let encoded = match self {
            Format::Json => doc.to_json().map(String::into_bytes),
            Format::MsgPack => doc.to_msgpack(),
        };
        encoded.map_err(BoardError::Codec)
    }

    pub fn decode(self, bytes: &[u8]) -> Result<DocumentSnapshot, BoardError> {
        let decoded = match self {
            Format::Json => {
                let text = std::str::from_utf8(bytes).map_err(|e| BoardError::Codec(e.to_string()))?;
                DocumentSnapshot::from_json(text)
            }
            Format::MsgPack => DocumentSnapshot::from_msgpack(bytes),
        };
        decoded.map_err(BoardError::Codec)
    }
}

/// Reads and writes documents under `root`.
pub struct FsPersistence {
    root: PathBuf,
}

impl FsPersistence {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }
}

impl PersistenceApi for FsPersistence {
    async fn load_document(&self, id: &str) -> Result<DocumentSnapshot, BoardError> {
        let path = self.path(id);
        let bytes = tokio::fs::read(&path).await?;
        let mut doc = Format::for_path(&path).decode(&bytes)?;
        // Saves go back to the file the document came from.
        doc.id = id.to_string();
        Ok(doc)
    }

    async fn save_document(&self, id: &str, document: &DocumentSnapshot) -> Result<(), BoardError> {
        let path = self.path(id);
        let bytes = Format::for_path(&path).encode(document)?;
        tokio::fs::write(&path, bytes).await?;
        log::debug!("wrote {}", path.display());
        Ok(())
    }
}
