pub mod config;
pub mod error;
pub mod id;
pub mod layout;
pub mod measure;
pub mod model;
pub mod snapshot;
pub mod viewport;

pub use config::CanvasConfig;
pub use error::{ConfigError, GraphError};
pub use id::NodeId;
pub use layout::{LayoutAlgorithm, LayoutConfig, LayoutDirection, LayoutInput, TreeLayout, relayout};
pub use measure::{ApproxMetrics, SizingConfig, TextMetrics, measure_node};
pub use model::*;
pub use snapshot::BoardSnapshot;
pub use viewport::{ViewTransform, ViewportController, ZoomDirection};
