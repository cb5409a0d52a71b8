pub mod engine;
pub mod error;
pub mod gesture;
pub mod input;
pub mod orchestrator;
pub mod schedule;
pub mod service;
pub mod shortcuts;

pub use engine::{CanvasEngine, ExpandStatus, GraphMutation, Notice, TickReport};
pub use error::EngineError;
pub use gesture::{CursorHint, GestureAction, GestureController, GestureState};
pub use input::{InputEvent, Modifiers};
pub use orchestrator::{InFlightOp, OpId, OpKind, Outcome, ServiceRequest};
pub use service::{CombineResponse, ExpandResponse, IdeaService, ServiceError, TopicsResponse, drive, run_request};
pub use shortcuts::{ShortcutAction, ShortcutMap};
