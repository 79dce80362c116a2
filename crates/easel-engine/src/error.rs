//! Engine error types.

use easel_canvas::RasterError;
use thiserror::Error;

/// Why a file, or a whole batch, failed to ingest.
///
/// `UploadInProgress` and `StaleTicket` are batch-level concurrency
/// failures; the other variants are per-file and are collected in the
/// [`IngestReport`] without aborting the batch.
///
/// [`IngestReport`]: crate::ingest::IngestReport
#[derive(Debug, Error)]
pub enum IngestError {
    /// The file extension is not in the allowed image set.
    #[error("unsupported file type: {name}")]
    UnsupportedType {
        /// Offending file name.
        name: String,
    },
    /// The file exceeds the configured size ceiling.
    #[error("{name} is {size} bytes, over the {limit} byte limit")]
    TooLarge {
        /// Offending file name.
        name: String,
        /// Actual size in bytes.
        size: usize,
        /// Configured ceiling in bytes.
        limit: usize,
    },
    /// The file bytes could not be decoded as an image.
    #[error("failed to decode {name}")]
    Decode {
        /// Offending file name.
        name: String,
        /// Underlying decode failure.
        #[source]
        source: RasterError,
    },
    /// Another upload batch holds the ticket.
    #[error("an upload is already in progress")]
    UploadInProgress,
    /// The decode completed after its ticket was retired.
    #[error("upload ticket is no longer active")]
    StaleTicket,
}

/// An operation was requested in an engine state that forbids it.
#[derive(Debug, Error)]
#[error("cannot {action} while the engine is {state}")]
pub struct StateError {
    /// The refused operation.
    pub action: &'static str,
    /// The state the engine was in.
    pub state: &'static str,
}

/// A key-value store rejected a write (quota and the like).
#[derive(Debug, Error)]
#[error("store rejected the write: {reason}")]
pub struct StoreError {
    /// Implementation-reported reason.
    pub reason: String,
}
