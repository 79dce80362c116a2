//! Engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File extensions accepted by the ingest pipeline.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "webp"];

/// Tunable limits and thresholds for a [`DesignEngine`].
///
/// [`DesignEngine`]: crate::engine::DesignEngine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum retained history snapshots; the oldest is evicted beyond
    /// this.
    pub history_limit: usize,
    /// Per-file upload size ceiling in bytes.
    pub max_upload_bytes: usize,
    /// Age after which a stuck upload ticket is reclaimed.
    pub upload_timeout: Duration,
    /// Fraction of the clip region a newly placed image is scaled to
    /// fit.
    pub placement_fraction: f64,
    /// Mask channel value above which a pixel counts as opaque.
    pub opaque_threshold: u8,
    /// Print resolution below which an upload is flagged as
    /// low-resolution.
    pub min_print_dpi: f64,
    /// Assumed physical print width in inches, for the DPI check.
    pub print_width_inches: f64,
}

impl Default for EngineConfig {
    /// Defaults: 50 history snapshots, 5 MiB uploads, 10 s upload
    /// timeout, 80 % placement fit, opacity threshold 10, 72 DPI floor
    /// over a 10 inch print width.
    fn default() -> Self {
        Self {
            history_limit: 50,
            max_upload_bytes: 5 * 1024 * 1024,
            upload_timeout: Duration::from_secs(10),
            placement_fraction: 0.8,
            opaque_threshold: 10,
            min_print_dpi: 72.0,
            print_width_inches: 10.0,
        }
    }
}
