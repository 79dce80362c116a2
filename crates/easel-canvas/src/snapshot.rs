//! User-content snapshots.
//!
//! A snapshot is the serializable record of the user's design: every
//! non-fixed object in stack order, with placement and payload but
//! without ids (ids are engine-local and reissued on restore). The JSON
//! encoding of a snapshot is what history entries and session
//! persistence store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::object::{DrawableObject, IdGenerator, ObjectContent, Placement};

/// Snapshot encode/decode failure.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The snapshot could not be serialized to JSON.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[source] serde_json::Error),
    /// The stored string is not a valid snapshot.
    #[error("failed to decode snapshot: {0}")]
    Decode(#[source] serde_json::Error),
}

/// One object as persisted: placement plus payload, no id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotObject {
    /// Position, scale, rotation, opacity.
    #[serde(flatten)]
    pub placement: Placement,
    /// Kind-specific payload.
    pub content: ObjectContent,
}

/// The full serializable design state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSnapshot {
    /// User-content objects, bottom to top.
    pub objects: Vec<SnapshotObject>,
    /// Monotonic save counter, for ordering persisted states.
    pub sequence: u64,
}

impl DesignSnapshot {
    /// Capture the user-content portion of an object stack.
    ///
    /// Fixed layers (background, mask) are excluded; relative order of
    /// the remaining objects is preserved.
    #[must_use]
    pub fn capture(objects: &[DrawableObject], sequence: u64) -> Self {
        let objects = objects
            .iter()
            .filter(|object| object.is_user_content())
            .map(|object| SnapshotObject {
                placement: object.placement,
                content: object.content.clone(),
            })
            .collect();
        Self { objects, sequence }
    }

    /// Whether the snapshot carries any user content.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Serialize to the persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] when serialization fails.
    pub fn encode(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(SnapshotError::Encode)
    }

    /// Parse the persisted JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Decode`] when the string is not a
    /// valid snapshot.
    pub fn decode(stored: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(stored).map_err(SnapshotError::Decode)
    }

    /// Rebuild live objects from the snapshot, issuing fresh ids.
    #[must_use]
    pub fn materialize(&self, ids: &mut IdGenerator) -> Vec<DrawableObject> {
        self.objects
            .iter()
            .map(|object| {
                DrawableObject::new(ids.next_id(), object.content.clone(), object.placement)
            })
            .collect()
    }
}
