pub mod arrange;
pub mod config;
pub mod document;
pub mod id;
pub mod model;

pub use arrange::{Alignment, Placement, arrange};
pub use config::{BoardConfig, Epsilon};
pub use document::DocumentSnapshot;
pub use id::{AssetId, NodeId};
pub use model::*;

// Re-export kurbo so downstream crates share one geometry version.
pub use kurbo;
