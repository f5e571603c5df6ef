pub mod hit;
pub mod loader;
pub mod raster;
pub mod reconcile;
pub mod surface;

pub use hit::{hit_test, hit_test_rect};
pub use loader::{ContentLoader, LoadError, LoadPath, load_content};
pub use raster::RasterSurface;
pub use reconcile::{LoadOutcome, LoadTicket, NodeState, ReconcileReport, SceneReconciler};
pub use surface::{DrawableContent, DrawableProps, DrawingSurface, Pixels, SurfaceError};
