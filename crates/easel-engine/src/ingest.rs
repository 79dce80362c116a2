//! Image-upload ingestion: the ticket guard, per-file validation, and
//! placement math.
//!
//! The engine orchestrates a batch (see `DesignEngine::upload_images`);
//! this module holds the pieces. One ticket exists at a time: a second
//! batch is rejected while it is held, and a ticket older than the
//! configured timeout is reclaimed by the next acquisition. Decode
//! results are applied only while their ticket is still the active one.

use std::fmt;
use std::time::{Duration, Instant};

use image::RgbaImage;
use log::warn;

use easel_canvas::{ClipBounds, Placement, RasterError, decode_rgba};

use crate::config::{ALLOWED_EXTENSIONS, EngineConfig};
use crate::error::IngestError;

/// Identifier of an upload batch's ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TicketId(u64);

impl TicketId {
    /// Wrap a raw ticket number.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One file handed to the ingest pipeline.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Client-supplied file name, used for extension validation and
    /// reporting.
    pub name: String,
    /// Raw encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Outcome of one upload batch.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Count of objects added to the surface.
    pub added: usize,
    /// Files skipped because an identical source already exists.
    pub duplicates: usize,
    /// Per-file validation or decode failures.
    pub rejected: Vec<IngestError>,
    /// Names of accepted files whose resolution falls below the print
    /// DPI floor.
    pub low_resolution: Vec<String>,
}

/// Issues and retires the single upload ticket.
#[derive(Debug)]
pub struct TicketDesk {
    active: Option<(TicketId, Instant)>,
    next: u64,
    timeout: Duration,
}

impl TicketDesk {
    /// A desk with no active ticket.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            active: None,
            next: 0,
            timeout,
        }
    }

    /// A desk using the configured upload timeout.
    #[must_use]
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.upload_timeout)
    }

    /// Acquire the ticket at time `now`.
    ///
    /// An active ticket younger than the timeout rejects the
    /// acquisition; one at or past the timeout is reclaimed.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::UploadInProgress`] while the ticket is
    /// held and fresh.
    pub fn acquire(&mut self, now: Instant) -> Result<TicketId, IngestError> {
        if let Some((held, created_at)) = self.active {
            if now.duration_since(created_at) < self.timeout {
                return Err(IngestError::UploadInProgress);
            }
            warn!("upload ticket {held} exceeded its timeout, reclaiming");
        }
        let id = TicketId(self.next);
        self.next += 1;
        self.active = Some((id, now));
        Ok(id)
    }

    /// Whether the given ticket is the active one.
    #[must_use]
    pub fn is_active(&self, id: TicketId) -> bool {
        self.active.is_some_and(|(held, _)| held == id)
    }

    /// Retire a ticket. Retiring a ticket that is no longer active is
    /// a no-op.
    pub fn retire(&mut self, id: TicketId) {
        if self.is_active(id) {
            self.active = None;
        }
    }
}

/// Decodes upload bytes into pixels.
///
/// The seam for the ingest suspension point; tests substitute decoders
/// that fail or return canned buffers.
pub trait BitmapDecoder {
    /// Decode encoded bytes into an RGBA buffer.
    ///
    /// # Errors
    ///
    /// Returns a [`RasterError`] when the bytes cannot be decoded.
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, RasterError>;
}

/// Default decoder backed by the `image` crate.
#[derive(Debug, Default)]
pub struct ImageDecoder;

impl BitmapDecoder for ImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, RasterError> {
        decode_rgba(bytes)
    }
}

fn has_allowed_extension(name: &str) -> bool {
    name.rsplit_once('.').is_some_and(|(_, extension)| {
        ALLOWED_EXTENSIONS
            .iter()
            .any(|allowed| extension.eq_ignore_ascii_case(allowed))
    })
}

/// Validate one file against the extension allow-list and size ceiling.
///
/// # Errors
///
/// Returns [`IngestError::UnsupportedType`] or [`IngestError::TooLarge`].
pub fn validate_file(file: &UploadFile, config: &EngineConfig) -> Result<(), IngestError> {
    if !has_allowed_extension(&file.name) {
        return Err(IngestError::UnsupportedType {
            name: file.name.clone(),
        });
    }
    if file.bytes.len() > config.max_upload_bytes {
        return Err(IngestError::TooLarge {
            name: file.name.clone(),
            size: file.bytes.len(),
            limit: config.max_upload_bytes,
        });
    }
    Ok(())
}

/// Scale and center a newly ingested image within the target region.
///
/// The image is scaled so its longer side fits `fraction` of the
/// region's shorter side, preserving aspect ratio, and centered on the
/// region's midpoint.
#[must_use]
pub fn fit_placement(image_size: (u32, u32), region: ClipBounds, fraction: f64) -> Placement {
    let max_size = region.width.min(region.height) * fraction;
    let width = f64::from(image_size.0.max(1));
    let height = f64::from(image_size.1.max(1));
    let scale = (max_size / width).min(max_size / height);
    let (x, y) = region.center();
    Placement {
        x,
        y,
        scale,
        ..Placement::default()
    }
}

/// Whether an image's native resolution falls below the print DPI
/// floor, assuming it prints across the configured physical width.
#[must_use]
pub fn is_low_resolution(image_size: (u32, u32), config: &EngineConfig) -> bool {
    let dpi = f64::from(image_size.0) / config.print_width_inches;
    dpi < config.min_print_dpi
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn file(name: &str, size: usize) -> UploadFile {
        UploadFile {
            name: name.to_owned(),
            bytes: vec![0; size],
        }
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        let config = EngineConfig::default();
        for name in ["photo.png", "photo.JPG", "photo.Jpeg", "photo.webp", "photo.BMP"] {
            assert!(
                validate_file(&file(name, 16), &config).is_ok(),
                "{name} must be accepted"
            );
        }
    }

    #[test]
    fn wrong_or_missing_extension_is_rejected() {
        let config = EngineConfig::default();
        for name in ["vector.svg", "animation.gif", "noextension", "trailingdot."] {
            let error = validate_file(&file(name, 16), &config).unwrap_err();
            assert!(
                matches!(error, IngestError::UnsupportedType { .. }),
                "{name} must be rejected"
            );
        }
    }

    #[test]
    fn oversized_file_is_rejected() {
        let config = EngineConfig::default();
        let error = validate_file(&file("big.png", config.max_upload_bytes + 1), &config)
            .unwrap_err();
        assert!(matches!(error, IngestError::TooLarge { .. }));
        assert!(validate_file(&file("ok.png", config.max_upload_bytes), &config).is_ok());
    }

    #[test]
    fn second_acquisition_is_rejected_while_fresh() {
        let mut desk = TicketDesk::new(Duration::from_secs(10));
        let now = Instant::now();
        let first = desk.acquire(now).unwrap();
        let error = desk.acquire(now + Duration::from_secs(5)).unwrap_err();
        assert!(matches!(error, IngestError::UploadInProgress));
        assert!(desk.is_active(first));
    }

    #[test]
    fn expired_ticket_is_reclaimed() {
        let mut desk = TicketDesk::new(Duration::from_secs(10));
        let start = Instant::now();
        let first = desk.acquire(start).unwrap();
        let second = desk.acquire(start + Duration::from_secs(10)).unwrap();
        assert_ne!(first, second);
        assert!(!desk.is_active(first), "the reclaimed ticket must be dead");
        assert!(desk.is_active(second));
    }

    #[test]
    fn retire_frees_the_desk() {
        let mut desk = TicketDesk::new(Duration::from_secs(10));
        let now = Instant::now();
        let ticket = desk.acquire(now).unwrap();
        desk.retire(ticket);
        assert!(!desk.is_active(ticket));
        assert!(desk.acquire(now).is_ok());
    }

    #[test]
    fn retiring_a_stale_ticket_is_a_no_op() {
        let mut desk = TicketDesk::new(Duration::from_secs(10));
        let start = Instant::now();
        let first = desk.acquire(start).unwrap();
        let second = desk.acquire(start + Duration::from_secs(11)).unwrap();
        desk.retire(first);
        assert!(desk.is_active(second), "a dead ticket must not retire a live one");
    }

    #[test]
    fn fit_placement_scales_to_the_region_fraction() {
        let region = ClipBounds {
            left: 60.0,
            top: 60.0,
            width: 100.0,
            height: 50.0,
        };
        let placement = fit_placement((200, 100), region, 0.8);
        // Shorter region side 50, fraction 0.8 -> max size 40; the
        // 200px side governs.
        assert!((placement.scale - 0.2).abs() < 1e-9, "scale was {}", placement.scale);
        assert!((placement.x - 110.0).abs() < 1e-9);
        assert!((placement.y - 85.0).abs() < 1e-9);
    }

    #[test]
    fn fit_placement_can_upscale_small_images() {
        let region = ClipBounds::full_canvas((100.0, 100.0));
        let placement = fit_placement((10, 10), region, 0.8);
        assert!(placement.scale > 1.0, "small images are scaled up to fit");
    }

    #[test]
    fn low_resolution_flags_small_sources() {
        let config = EngineConfig::default();
        // 720 px across 10 inches is exactly 72 DPI.
        assert!(!is_low_resolution((720, 720), &config));
        assert!(is_low_resolution((719, 719), &config));
    }

    #[test]
    fn image_decoder_rejects_garbage() {
        let decoder = ImageDecoder;
        assert!(decoder.decode(b"not an image").is_err());
    }
}
