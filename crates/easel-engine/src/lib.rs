//! Stateful design-canvas engine for easel.
//!
//! Builds on `easel-canvas`: undo/redo history over serialized
//! snapshots, the fixed-layer z-order invariant, guarded image
//! ingestion with deduplication, signature-checked session
//! persistence, and a headless preview. The [`DesignEngine`] facade
//! ties the pieces together; the submodules are usable on their own.

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod ingest;
pub mod layers;
pub mod preview;
pub mod session;
pub mod state;

pub use config::{ALLOWED_EXTENSIONS, EngineConfig};
pub use engine::{DesignData, DesignEngine, EngineStats};
pub use error::{IngestError, StateError, StoreError};
pub use history::HistoryManager;
pub use ingest::{
    BitmapDecoder, ImageDecoder, IngestReport, TicketDesk, TicketId, UploadFile,
};
pub use layers::apply_layer_order;
pub use session::{KeyValueStore, MemoryStore, SessionStore};
pub use state::{EngineState, StateMachine};
