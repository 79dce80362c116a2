//! Drawable objects: the entities composed on a design surface.
//!
//! A design is an ordered stack of [`DrawableObject`]s. Two of them are
//! *fixed layers* supplied by the product (the background photo and the
//! printable-area mask); everything else is user content (uploaded
//! images, text, shapes). Fixed layers are locked: never selectable and
//! never part of a user-content snapshot.

use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use siphasher::sip::SipHasher13;

/// Stable identifier for a drawable object.
///
/// Issued by [`IdGenerator`]; unique within one engine instance for the
/// lifetime of the design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(u64);

impl ObjectId {
    /// The raw numeric value, for display and logging.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic [`ObjectId`] source.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Create a generator starting at id 0.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }

    /// Issue the next identifier.
    pub const fn next_id(&mut self) -> ObjectId {
        let id = ObjectId(self.next);
        self.next += 1;
        id
    }
}

/// Identity of a decoded image source.
///
/// The `id` is a SipHash-1-3 fingerprint of the source bytes rendered as
/// hex, so identical uploads always produce identical ids. Upload
/// deduplication is string equality on this field; byte-different
/// near-duplicates are distinct on purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Fingerprint of the source bytes.
    pub id: String,
    /// Natural pixel width of the decoded image.
    pub width: u32,
    /// Natural pixel height of the decoded image.
    pub height: u32,
}

impl SourceRef {
    /// Fingerprint raw source bytes together with the decoded dimensions.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], width: u32, height: u32) -> Self {
        let mut hasher = SipHasher13::new();
        hasher.write(bytes);
        Self {
            id: format!("{:016x}", hasher.finish()),
            width,
            height,
        }
    }
}

/// Font and color styling for a text object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Font family name.
    pub font_family: String,
    /// Font size in canvas units.
    pub font_size: f64,
    /// Fill color as a `#rrggbb` hex string.
    pub color: String,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_owned(),
            font_size: 30.0,
            color: "#000000".to_owned(),
        }
    }
}

/// Primitive shape variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    Rectangle,
    /// Axis-aligned ellipse.
    Ellipse,
}

/// Kind tag for a drawable object, used in snapshots and stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Fixed product background photo (bottom of the stack).
    Background,
    /// Fixed printable-area mask (top of the stack).
    Mask,
    /// User-uploaded image.
    Image,
    /// User text.
    Text,
    /// User shape.
    Shape,
}

/// Kind-specific payload of a drawable object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectContent {
    /// Fixed background photo.
    Background(SourceRef),
    /// Fixed alpha mask.
    Mask(SourceRef),
    /// Uploaded image.
    Image(SourceRef),
    /// Text with styling.
    Text {
        /// The text content.
        text: String,
        /// Font and color.
        style: TextStyle,
    },
    /// Filled primitive shape.
    Shape {
        /// Which primitive.
        shape: ShapeKind,
        /// Fill color as a `#rrggbb` hex string.
        fill: String,
        /// Unscaled width in canvas units.
        width: f64,
        /// Unscaled height in canvas units.
        height: f64,
    },
}

impl ObjectContent {
    /// The kind tag for this payload.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        match self {
            Self::Background(_) => ObjectKind::Background,
            Self::Mask(_) => ObjectKind::Mask,
            Self::Image(_) => ObjectKind::Image,
            Self::Text { .. } => ObjectKind::Text,
            Self::Shape { .. } => ObjectKind::Shape,
        }
    }
}

/// Position, scale, rotation, and opacity of an object on the canvas.
///
/// `x`/`y` locate the object's *center* in canvas coordinates, matching
/// how objects are placed (centered within the clip region).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Center x in canvas coordinates.
    pub x: f64,
    /// Center y in canvas coordinates.
    pub y: f64,
    /// Uniform scale factor.
    pub scale: f64,
    /// Rotation in degrees, clockwise.
    pub rotation: f64,
    /// Opacity in `0.0..=1.0`.
    pub opacity: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

/// One entity on the design surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawableObject {
    /// Stable identifier.
    pub id: ObjectId,
    /// Where and how the object is rendered.
    pub placement: Placement,
    /// Kind-specific payload.
    pub content: ObjectContent,
}

impl DrawableObject {
    /// Create an object with the given id, payload, and placement.
    #[must_use]
    pub const fn new(id: ObjectId, content: ObjectContent, placement: Placement) -> Self {
        Self {
            id,
            placement,
            content,
        }
    }

    /// The kind tag.
    #[must_use]
    pub const fn kind(&self) -> ObjectKind {
        self.content.kind()
    }

    /// Whether this is a fixed product layer (background or mask).
    #[must_use]
    pub const fn is_fixed(&self) -> bool {
        matches!(
            self.content,
            ObjectContent::Background(_) | ObjectContent::Mask(_)
        )
    }

    /// Fixed layers are locked: not selectable, not movable, excluded
    /// from user-content serialization.
    #[must_use]
    pub const fn locked(&self) -> bool {
        self.is_fixed()
    }

    /// Whether this object belongs to the user's design (everything
    /// that is not a fixed layer).
    #[must_use]
    pub const fn is_user_content(&self) -> bool {
        !self.is_fixed()
    }

    /// The image source reference, for image-bearing kinds.
    #[must_use]
    pub const fn source_ref(&self) -> Option<&SourceRef> {
        match &self.content {
            ObjectContent::Background(src) | ObjectContent::Mask(src) | ObjectContent::Image(src) => {
                Some(src)
            }
            ObjectContent::Text { .. } | ObjectContent::Shape { .. } => None,
        }
    }

    /// Unscaled (natural) size of the object in canvas units.
    ///
    /// Image kinds report their pixel dimensions; text approximates a
    /// bounding box from the font metrics; shapes report their declared
    /// size.
    #[must_use]
    pub fn natural_size(&self) -> (f64, f64) {
        match &self.content {
            ObjectContent::Background(src) | ObjectContent::Mask(src) | ObjectContent::Image(src) => {
                (f64::from(src.width), f64::from(src.height))
            }
            ObjectContent::Text { text, style } => {
                // Rough box: average glyph advance of 0.6em, one line.
                let chars = text.chars().count().max(1);
                #[allow(clippy::cast_precision_loss)]
                let width = chars as f64 * style.font_size * 0.6;
                (width, style.font_size * 1.2)
            }
            ObjectContent::Shape { width, height, .. } => (*width, *height),
        }
    }

    /// Size after applying the placement scale.
    #[must_use]
    pub fn scaled_size(&self) -> (f64, f64) {
        let (w, h) = self.natural_size();
        (w * self.placement.scale, h * self.placement.scale)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn image_object(id: ObjectId, bytes: &[u8]) -> DrawableObject {
        DrawableObject::new(
            id,
            ObjectContent::Image(SourceRef::from_bytes(bytes, 40, 20)),
            Placement::default(),
        )
    }

    #[test]
    fn id_generator_is_monotonic() {
        let mut ids = IdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert!(a.value() < b.value());
    }

    #[test]
    fn source_ref_fingerprint_is_stable() {
        let a = SourceRef::from_bytes(b"pixels", 10, 10);
        let b = SourceRef::from_bytes(b"pixels", 10, 10);
        assert_eq!(a.id, b.id, "identical bytes must fingerprint identically");
    }

    #[test]
    fn source_ref_fingerprint_differs_for_different_bytes() {
        let a = SourceRef::from_bytes(b"pixels", 10, 10);
        let b = SourceRef::from_bytes(b"other pixels", 10, 10);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn fixed_layers_are_locked() {
        let mut ids = IdGenerator::new();
        let bg = DrawableObject::new(
            ids.next_id(),
            ObjectContent::Background(SourceRef::from_bytes(b"bg", 1, 1)),
            Placement::default(),
        );
        let mask = DrawableObject::new(
            ids.next_id(),
            ObjectContent::Mask(SourceRef::from_bytes(b"mask", 1, 1)),
            Placement::default(),
        );
        assert!(bg.locked() && mask.locked());
        assert!(!bg.is_user_content());
        assert_eq!(bg.kind(), ObjectKind::Background);
        assert_eq!(mask.kind(), ObjectKind::Mask);
    }

    #[test]
    fn user_content_is_not_locked() {
        let mut ids = IdGenerator::new();
        let img = image_object(ids.next_id(), b"a");
        let text = DrawableObject::new(
            ids.next_id(),
            ObjectContent::Text {
                text: "hello".to_owned(),
                style: TextStyle::default(),
            },
            Placement::default(),
        );
        assert!(img.is_user_content() && !img.locked());
        assert!(text.is_user_content());
        assert_eq!(text.kind(), ObjectKind::Text);
    }

    #[test]
    fn default_placement_is_identity() {
        let p = Placement::default();
        assert!((p.scale - 1.0).abs() < f64::EPSILON);
        assert!((p.opacity - 1.0).abs() < f64::EPSILON);
        assert!(p.rotation.abs() < f64::EPSILON);
    }

    #[test]
    fn scaled_size_applies_placement_scale() {
        let mut ids = IdGenerator::new();
        let mut img = image_object(ids.next_id(), b"a");
        img.placement.scale = 0.5;
        let (w, h) = img.scaled_size();
        assert!((w - 20.0).abs() < f64::EPSILON);
        assert!((h - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn text_natural_size_grows_with_length() {
        let style = TextStyle::default();
        let short = DrawableObject::new(
            ObjectId(0),
            ObjectContent::Text {
                text: "hi".to_owned(),
                style: style.clone(),
            },
            Placement::default(),
        );
        let long = DrawableObject::new(
            ObjectId(1),
            ObjectContent::Text {
                text: "hello world".to_owned(),
                style,
            },
            Placement::default(),
        );
        assert!(long.natural_size().0 > short.natural_size().0);
    }

    #[test]
    fn source_ref_only_on_image_kinds() {
        let mut ids = IdGenerator::new();
        let img = image_object(ids.next_id(), b"a");
        assert!(img.source_ref().is_some());
        let shape = DrawableObject::new(
            ids.next_id(),
            ObjectContent::Shape {
                shape: ShapeKind::Rectangle,
                fill: "#ff0000".to_owned(),
                width: 10.0,
                height: 10.0,
            },
            Placement::default(),
        );
        assert!(shape.source_ref().is_none());
    }

    #[test]
    fn drawable_object_serde_round_trip() {
        let mut ids = IdGenerator::new();
        let obj = image_object(ids.next_id(), b"round-trip");
        let json = serde_json::to_string(&obj).unwrap();
        let back: DrawableObject = serde_json::from_str(&json).unwrap();
        assert_eq!(obj, back);
    }
}
