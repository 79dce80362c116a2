//! The engine facade.
//!
//! A [`DesignEngine`] owns the object stack, the history, the upload
//! ticket desk, the session store, and the bitmap cache, and exposes
//! the operation surface callers use: load fixed layers, ingest
//! uploads, add text and shapes, edit placements, undo/redo, persist
//! and restore the session, and render a headless preview. One engine
//! is one design; there is no global state.

use std::collections::HashMap;
use std::time::Instant;

use image::RgbaImage;
use log::{debug, warn};

use easel_canvas::{
    BasicSurface, ClipBounds, DesignSnapshot, DrawableObject, IdGenerator, ObjectContent,
    ObjectId, ObjectKind, Placement, RasterError, RenderSurface, ShapeKind, SnapshotError,
    SourceRef, TextStyle, resolve_clip_bounds,
};

use crate::config::EngineConfig;
use crate::error::IngestError;
use crate::history::HistoryManager;
use crate::ingest::{
    BitmapDecoder, ImageDecoder, IngestReport, TicketDesk, UploadFile, fit_placement,
    is_low_resolution, validate_file,
};
use crate::layers::apply_layer_order;
use crate::preview;
use crate::session::{KeyValueStore, MemoryStore, SessionStore};
use crate::state::StateMachine;

/// Counters surfaced to callers and QA tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStats {
    /// User-content objects on the surface.
    pub total_objects: usize,
    /// User image objects.
    pub images: usize,
    /// User text objects.
    pub texts: usize,
    /// Whether a step backward exists.
    pub can_undo: bool,
    /// Whether a step forward exists.
    pub can_redo: bool,
    /// Whether fixed layers have been loaded.
    pub initialized: bool,
}

/// Exportable design state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesignData {
    /// Serialized user-content snapshot.
    pub snapshot: String,
    /// Product signature the design belongs to.
    pub signature: String,
    /// Save counter at export time.
    pub sequence: u64,
}

/// The stateful design engine.
///
/// Generic over its three collaborators: the rendering surface, the
/// session key-value store, and the bitmap decoder. [`DesignEngine::new`]
/// wires the in-process defaults.
#[derive(Debug)]
pub struct DesignEngine<S = BasicSurface, K = MemoryStore, D = ImageDecoder> {
    config: EngineConfig,
    surface: S,
    history: HistoryManager,
    machine: StateMachine,
    desk: TicketDesk,
    session: SessionStore<K>,
    decoder: D,
    ids: IdGenerator,
    bitmaps: HashMap<String, RgbaImage>,
    clip_bounds: Option<ClipBounds>,
    signature: String,
    sequence: u64,
    selected: Option<ObjectId>,
    initialized: bool,
}

impl DesignEngine {
    /// An engine over an in-memory surface and session store.
    #[must_use]
    pub fn new(config: EngineConfig, canvas: (u32, u32), signature: impl Into<String>) -> Self {
        Self::with_parts(
            config,
            BasicSurface::new(canvas.0, canvas.1),
            MemoryStore::new(),
            ImageDecoder,
            signature,
        )
    }
}

impl<S: RenderSurface, K: KeyValueStore, D: BitmapDecoder> DesignEngine<S, K, D> {
    /// An engine over caller-supplied collaborators.
    #[must_use]
    pub fn with_parts(
        config: EngineConfig,
        surface: S,
        store: K,
        decoder: D,
        signature: impl Into<String>,
    ) -> Self {
        let history = HistoryManager::from_config(&config);
        let desk = TicketDesk::from_config(&config);
        Self {
            config,
            surface,
            history,
            machine: StateMachine::new(),
            desk,
            session: SessionStore::new(store),
            decoder,
            ids: IdGenerator::new(),
            bitmaps: HashMap::new(),
            clip_bounds: None,
            signature: signature.into(),
            sequence: 0,
            selected: None,
            initialized: false,
        }
    }

    /// The rendering surface.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current printable region, when a mask defines one.
    #[must_use]
    pub const fn clip_bounds(&self) -> Option<ClipBounds> {
        self.clip_bounds
    }

    /// The product signature this design belongs to.
    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// The currently selected object, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    /// Decode and install the fixed product layers, replacing any
    /// already present. Each layer is scaled to fit the canvas and
    /// centered; the printable region is recomputed from the mask.
    ///
    /// # Errors
    ///
    /// Returns [`RasterError`] when a layer's bytes cannot be decoded;
    /// in that case no fixed layer is installed.
    pub fn load_fixed_layers(
        &mut self,
        background: Option<&[u8]>,
        mask: Option<&[u8]>,
    ) -> Result<(), RasterError> {
        let decoded_background = background
            .map(|bytes| self.decode_fixed(bytes, ObjectKind::Background))
            .transpose()?;
        let decoded_mask = mask
            .map(|bytes| self.decode_fixed(bytes, ObjectKind::Mask))
            .transpose()?;

        let fixed: Vec<ObjectId> = self
            .surface
            .objects()
            .iter()
            .filter(|object| object.is_fixed())
            .map(|object| object.id)
            .collect();
        for id in fixed {
            self.surface.remove_object(id);
        }
        if let Some(object) = decoded_background {
            self.surface.add_object(object);
        }
        if let Some(object) = decoded_mask {
            self.surface.add_object(object);
        }
        self.initialized = true;
        apply_layer_order(&mut self.surface);
        self.recompute_clip_bounds();
        Ok(())
    }

    fn decode_fixed(
        &mut self,
        bytes: &[u8],
        kind: ObjectKind,
    ) -> Result<DrawableObject, RasterError> {
        let pixels = self.decoder.decode(bytes)?;
        let source = SourceRef::from_bytes(bytes, pixels.width(), pixels.height());
        let placement = self.contain_placement((pixels.width(), pixels.height()));
        self.bitmaps.insert(source.id.clone(), pixels);
        let content = match kind {
            ObjectKind::Mask => ObjectContent::Mask(source),
            _ => ObjectContent::Background(source),
        };
        Ok(DrawableObject::new(self.ids.next_id(), content, placement))
    }

    fn contain_placement(&self, size: (u32, u32)) -> Placement {
        let (canvas_w, canvas_h) = self.canvas_size();
        let scale = (canvas_w / f64::from(size.0.max(1))).min(canvas_h / f64::from(size.1.max(1)));
        Placement {
            x: canvas_w / 2.0,
            y: canvas_h / 2.0,
            scale,
            ..Placement::default()
        }
    }

    fn canvas_size(&self) -> (f64, f64) {
        let (width, height) = self.surface.dimensions();
        (f64::from(width), f64::from(height))
    }

    fn recompute_clip_bounds(&mut self) {
        let canvas = self.canvas_size();
        self.clip_bounds = self
            .surface
            .objects()
            .iter()
            .find(|object| object.kind() == ObjectKind::Mask)
            .and_then(|mask| {
                let source = mask.source_ref()?;
                let pixels = self.bitmaps.get(&source.id)?;
                resolve_clip_bounds(pixels, mask.scaled_size(), canvas, self.config.opaque_threshold)
            });
        debug!("clip bounds recomputed: {:?}", self.clip_bounds);
    }

    fn placement_region(&self) -> ClipBounds {
        self.clip_bounds
            .unwrap_or_else(|| ClipBounds::full_canvas(self.canvas_size()))
    }

    fn has_image_source(&self, source_id: &str) -> bool {
        self.surface.objects().iter().any(|object| {
            object.kind() == ObjectKind::Image
                && object
                    .source_ref()
                    .is_some_and(|source| source.id == source_id)
        })
    }

    /// Ingest a batch of uploaded files.
    ///
    /// Per-file validation and decode failures land in the report
    /// without aborting the batch; duplicates of sources already on the
    /// surface are silently skipped and counted. Layer ordering,
    /// history, and session persistence run once at batch end.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::UploadInProgress`] when another batch
    /// holds the upload ticket.
    pub fn upload_images(&mut self, files: &[UploadFile]) -> Result<IngestReport, IngestError> {
        let ticket = self.desk.acquire(Instant::now())?;
        if self.machine.begin_ingest(ticket).is_err() {
            self.desk.retire(ticket);
            return Err(IngestError::UploadInProgress);
        }
        let mut report = IngestReport::default();
        for file in files {
            if let Err(error) = validate_file(file, &self.config) {
                report.rejected.push(error);
                continue;
            }
            let pixels = match self.decoder.decode(&file.bytes) {
                Ok(pixels) => pixels,
                Err(source) => {
                    report.rejected.push(IngestError::Decode {
                        name: file.name.clone(),
                        source,
                    });
                    continue;
                }
            };
            if !self.desk.is_active(ticket) {
                warn!(
                    "discarding decode of {} under retired ticket {ticket}",
                    file.name
                );
                report.rejected.push(IngestError::StaleTicket);
                break;
            }
            let source = SourceRef::from_bytes(&file.bytes, pixels.width(), pixels.height());
            if self.has_image_source(&source.id) {
                debug!("skipping duplicate upload {}", file.name);
                report.duplicates += 1;
                continue;
            }
            if is_low_resolution((pixels.width(), pixels.height()), &self.config) {
                report.low_resolution.push(file.name.clone());
            }
            let placement = fit_placement(
                (pixels.width(), pixels.height()),
                self.placement_region(),
                self.config.placement_fraction,
            );
            self.bitmaps.insert(source.id.clone(), pixels);
            self.surface.add_object(DrawableObject::new(
                self.ids.next_id(),
                ObjectContent::Image(source),
                placement,
            ));
            report.added += 1;
        }
        self.desk.retire(ticket);
        if let Err(error) = self.machine.finish_ingest(ticket) {
            warn!("{error}");
        }
        apply_layer_order(&mut self.surface);
        self.save_state();
        Ok(report)
    }

    /// Add a text object centered in the printable region.
    pub fn add_text(&mut self, text: impl Into<String>, style: TextStyle) -> ObjectId {
        let (x, y) = self.placement_region().center();
        let id = self.ids.next_id();
        self.surface.add_object(DrawableObject::new(
            id,
            ObjectContent::Text {
                text: text.into(),
                style,
            },
            Placement {
                x,
                y,
                ..Placement::default()
            },
        ));
        apply_layer_order(&mut self.surface);
        self.save_state();
        id
    }

    /// Add a filled shape centered in the printable region.
    pub fn add_shape(
        &mut self,
        shape: ShapeKind,
        fill: impl Into<String>,
        size: (f64, f64),
    ) -> ObjectId {
        let (x, y) = self.placement_region().center();
        let id = self.ids.next_id();
        self.surface.add_object(DrawableObject::new(
            id,
            ObjectContent::Shape {
                shape,
                fill: fill.into(),
                width: size.0,
                height: size.1,
            },
            Placement {
                x,
                y,
                ..Placement::default()
            },
        ));
        apply_layer_order(&mut self.surface);
        self.save_state();
        id
    }

    /// Select a user-content object. Fixed layers refuse selection.
    pub fn select(&mut self, id: ObjectId) -> bool {
        let selectable = self
            .surface
            .object(id)
            .is_some_and(|object| !object.locked());
        if selectable {
            self.selected = Some(id);
        }
        selectable
    }

    /// Drop the selection.
    pub fn deselect(&mut self) {
        self.selected = None;
    }

    /// Remove the selected object, capturing history.
    pub fn delete_selected(&mut self) -> bool {
        let Some(id) = self.selected.take() else {
            return false;
        };
        if self.surface.remove_object(id).is_none() {
            return false;
        }
        self.save_state();
        true
    }

    /// Replace a user-content object's placement, capturing history.
    pub fn set_placement(&mut self, id: ObjectId, placement: Placement) -> bool {
        let Some(object) = self.surface.object_mut(id) else {
            return false;
        };
        if object.locked() {
            return false;
        }
        object.placement = placement;
        self.save_state();
        true
    }

    /// Capture the current user content into history.
    ///
    /// Suppressed while restoring or ingesting, and when the content is
    /// unchanged from the snapshot at the cursor. On success the save
    /// counter advances and the session is persisted.
    pub fn save_state(&mut self) -> bool {
        if !self.machine.is_idle() {
            debug!(
                "save suppressed while the engine is {}",
                self.machine.state().name()
            );
            return false;
        }
        let candidate = DesignSnapshot::capture(self.surface.objects(), self.sequence + 1);
        if let Some(current) = self.history.current()
            && let Ok(snapshot) = DesignSnapshot::decode(current)
            && snapshot.objects == candidate.objects
        {
            return false;
        }
        let encoded = match candidate.encode() {
            Ok(encoded) => encoded,
            Err(error) => {
                warn!("snapshot encode failed, state not saved: {error}");
                return false;
            }
        };
        if self.history.record(encoded) {
            self.sequence += 1;
            self.persist_session();
            true
        } else {
            false
        }
    }

    /// Step backward in history and restore that snapshot.
    ///
    /// Returns `false` at the boundary, while the engine is busy, or
    /// when the stored snapshot is unreadable (the cursor is rolled
    /// back and the surface left untouched).
    pub fn undo(&mut self) -> bool {
        if !self.machine.is_idle() {
            warn!(
                "undo refused while the engine is {}",
                self.machine.state().name()
            );
            return false;
        }
        let Some(stored) = self.history.undo() else {
            return false;
        };
        if self.restore_snapshot(&stored, "undo") {
            true
        } else {
            let _ = self.history.redo();
            false
        }
    }

    /// Step forward in history and restore that snapshot.
    pub fn redo(&mut self) -> bool {
        if !self.machine.is_idle() {
            warn!(
                "redo refused while the engine is {}",
                self.machine.state().name()
            );
            return false;
        }
        let Some(stored) = self.history.redo() else {
            return false;
        };
        if self.restore_snapshot(&stored, "redo") {
            true
        } else {
            let _ = self.history.undo();
            false
        }
    }

    fn restore_snapshot(&mut self, stored: &str, action: &str) -> bool {
        match DesignSnapshot::decode(stored) {
            Ok(snapshot) => {
                if self.machine.begin_restore().is_err() {
                    return false;
                }
                self.apply_snapshot(&snapshot);
                if let Err(error) = self.machine.finish_restore() {
                    warn!("{error}");
                }
                self.persist_session();
                true
            }
            Err(error) => {
                warn!("{action} aborted, stored snapshot is unreadable: {error}");
                false
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: &DesignSnapshot) {
        let user: Vec<ObjectId> = self
            .surface
            .objects()
            .iter()
            .filter(|object| object.is_user_content())
            .map(|object| object.id)
            .collect();
        for id in user {
            self.surface.remove_object(id);
        }
        for object in snapshot.materialize(&mut self.ids) {
            self.surface.add_object(object);
        }
        self.selected = None;
        apply_layer_order(&mut self.surface);
    }

    /// Remove all user content and reset history.
    pub fn clear_design(&mut self) {
        let user: Vec<ObjectId> = self
            .surface
            .objects()
            .iter()
            .filter(|object| object.is_user_content())
            .map(|object| object.id)
            .collect();
        for id in user {
            self.surface.remove_object(id);
        }
        self.selected = None;
        self.history.clear();
        self.sequence = 0;
        apply_layer_order(&mut self.surface);
    }

    /// Export the current design for storage or checkout.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the snapshot cannot be encoded.
    pub fn design_data(&self) -> Result<DesignData, SnapshotError> {
        let snapshot = DesignSnapshot::capture(self.surface.objects(), self.sequence);
        Ok(DesignData {
            snapshot: snapshot.encode()?,
            signature: self.signature.clone(),
            sequence: self.sequence,
        })
    }

    /// Replace the user content from an exported snapshot, then record
    /// the loaded state as the new history baseline.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the stored string is not a valid
    /// snapshot; the surface is left untouched.
    pub fn load_design_data(&mut self, stored: &str) -> Result<(), SnapshotError> {
        let snapshot = DesignSnapshot::decode(stored)?;
        if self.machine.begin_restore().is_err() {
            warn!(
                "design load refused while the engine is {}",
                self.machine.state().name()
            );
            return Ok(());
        }
        self.sequence = self.sequence.max(snapshot.sequence);
        self.apply_snapshot(&snapshot);
        if let Err(error) = self.machine.finish_restore() {
            warn!("{error}");
        }
        self.save_state();
        Ok(())
    }

    /// Persist the current design to the session store, keyed by the
    /// product signature. Empty designs are not persisted.
    pub fn persist_session(&mut self) {
        let snapshot = DesignSnapshot::capture(self.surface.objects(), self.sequence);
        if snapshot.is_empty() {
            return;
        }
        match snapshot.encode() {
            Ok(encoded) => self.session.save(&self.signature, &encoded),
            Err(error) => warn!("session snapshot encode failed: {error}"),
        }
    }

    /// Restore the session design, if one is stored under this
    /// engine's exact product signature.
    pub fn restore_session(&mut self) -> bool {
        let Some(stored) = self.session.load(&self.signature) else {
            return false;
        };
        match self.load_design_data(&stored) {
            Ok(()) => true,
            Err(error) => {
                warn!("stored session design is unreadable: {error}");
                false
            }
        }
    }

    /// Resize the canvas, refit the fixed layers, and recompute the
    /// printable region. User-content placements are not adjusted.
    pub fn resize_canvas(&mut self, width: u32, height: u32) {
        self.surface.set_dimensions(width, height);
        let fixed: Vec<(ObjectId, (u32, u32))> = self
            .surface
            .objects()
            .iter()
            .filter(|object| object.is_fixed())
            .filter_map(|object| {
                object
                    .source_ref()
                    .map(|source| (object.id, (source.width, source.height)))
            })
            .collect();
        for (id, size) in fixed {
            let placement = self.contain_placement(size);
            if let Some(object) = self.surface.object_mut(id) {
                object.placement = placement;
            }
        }
        self.recompute_clip_bounds();
    }

    /// Counters for callers and QA tooling.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let mut total_objects = 0;
        let mut images = 0;
        let mut texts = 0;
        for object in self.surface.objects() {
            if !object.is_user_content() {
                continue;
            }
            total_objects += 1;
            match object.kind() {
                ObjectKind::Image => images += 1,
                ObjectKind::Text => texts += 1,
                _ => {}
            }
        }
        EngineStats {
            total_objects,
            images,
            texts,
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            initialized: self.initialized,
        }
    }

    /// Composite the current stack into an RGBA preview.
    #[must_use]
    pub fn render_preview(&self) -> RgbaImage {
        preview::render(&self.surface, &self.bitmaps)
    }
}
