//! Pure canvas data model for easel.
//!
//! This crate is sans-IO: it defines the drawable-object model, the
//! [`RenderSurface`] seam a renderer plugs into, the snapshot format
//! used by history and session persistence, raster decode helpers, and
//! the mask-derived printable-region geometry. Everything stateful
//! (history, ingestion, the engine facade) lives in `easel-engine`.

pub mod geometry;
pub mod object;
pub mod raster;
pub mod snapshot;
pub mod surface;

pub use geometry::{ClipBounds, resolve_clip_bounds};
pub use object::{
    DrawableObject, IdGenerator, ObjectContent, ObjectId, ObjectKind, Placement, ShapeKind,
    SourceRef, TextStyle,
};
pub use raster::{RasterError, decode_rgba, encode_png};
pub use snapshot::{DesignSnapshot, SnapshotError, SnapshotObject};
pub use surface::{BasicSurface, RenderSurface};
