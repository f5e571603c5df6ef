pub mod error;
pub mod history;
pub mod input;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod store;
pub mod workflows;

pub use error::BoardError;
pub use history::{History, HistoryEntry};
pub use input::{InputEvent, Modifiers};
pub use selection::{CanvasMode, Effects, SelectionController, SelectionEffect};
pub use session::{BoardSession, Notice};
pub use shortcuts::{BoardAction, ShortcutMap};
pub use store::{BoardStore, DocumentKind, MutationOutcome, StoreEvent, SubscriptionId};
pub use workflows::{
    AssetService, GenerationRequest, GenerationService, PersistenceApi, add_asset_node,
    load_document, run_generation, save_document,
};
