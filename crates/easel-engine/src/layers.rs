//! Stack-order enforcement.
//!
//! The z-order invariant: background at the bottom, user content above
//! it in its current relative order, mask on top. Run after any
//! operation that adds or restores objects; once per batch during
//! ingest.

use easel_canvas::{ObjectId, ObjectKind, RenderSurface};

/// Restore the canonical stack order on a surface.
///
/// Idempotent. Absent fixed layers are tolerated; an object that
/// disappears between collection and move is skipped.
pub fn apply_layer_order<S: RenderSurface + ?Sized>(surface: &mut S) {
    let mut background: Option<ObjectId> = None;
    let mut mask: Option<ObjectId> = None;
    let mut user: Vec<ObjectId> = Vec::new();
    for object in surface.objects() {
        match object.kind() {
            ObjectKind::Background => {
                if background.is_none() {
                    background = Some(object.id);
                }
            }
            ObjectKind::Mask => {
                if mask.is_none() {
                    mask = Some(object.id);
                }
            }
            ObjectKind::Image | ObjectKind::Text | ObjectKind::Shape => user.push(object.id),
        }
    }

    let mut next = 0;
    if let Some(id) = background
        && surface.move_to_index(id, 0)
    {
        next = 1;
    }
    for id in user {
        if surface.move_to_index(id, next) {
            next += 1;
        }
    }
    if let Some(id) = mask {
        let top = surface.objects().len().saturating_sub(1);
        surface.move_to_index(id, top);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use easel_canvas::{
        BasicSurface, DrawableObject, IdGenerator, ObjectContent, Placement, SourceRef, TextStyle,
    };

    fn object(ids: &mut IdGenerator, content: ObjectContent) -> DrawableObject {
        DrawableObject::new(ids.next_id(), content, Placement::default())
    }

    fn background(ids: &mut IdGenerator) -> DrawableObject {
        object(ids, ObjectContent::Background(SourceRef::from_bytes(b"bg", 1, 1)))
    }

    fn mask(ids: &mut IdGenerator) -> DrawableObject {
        object(ids, ObjectContent::Mask(SourceRef::from_bytes(b"mask", 1, 1)))
    }

    fn image(ids: &mut IdGenerator, bytes: &[u8]) -> DrawableObject {
        object(ids, ObjectContent::Image(SourceRef::from_bytes(bytes, 1, 1)))
    }

    fn text(ids: &mut IdGenerator, content: &str) -> DrawableObject {
        object(
            ids,
            ObjectContent::Text {
                text: content.to_owned(),
                style: TextStyle::default(),
            },
        )
    }

    fn kinds(surface: &BasicSurface) -> Vec<ObjectKind> {
        surface.objects().iter().map(DrawableObject::kind).collect()
    }

    #[test]
    fn scrambled_stack_is_restored() {
        let mut ids = IdGenerator::new();
        let mut surface = BasicSurface::new(100, 100);
        surface.add_object(mask(&mut ids));
        surface.add_object(image(&mut ids, b"a"));
        surface.add_object(background(&mut ids));
        surface.add_object(text(&mut ids, "hi"));
        apply_layer_order(&mut surface);
        assert_eq!(
            kinds(&surface),
            vec![
                ObjectKind::Background,
                ObjectKind::Image,
                ObjectKind::Text,
                ObjectKind::Mask,
            ]
        );
    }

    #[test]
    fn user_relative_order_is_preserved() {
        let mut ids = IdGenerator::new();
        let mut surface = BasicSurface::new(100, 100);
        surface.add_object(background(&mut ids));
        let first = image(&mut ids, b"a");
        let second = image(&mut ids, b"b");
        let (first_id, second_id) = (first.id, second.id);
        surface.add_object(first);
        surface.add_object(second);
        surface.add_object(mask(&mut ids));
        apply_layer_order(&mut surface);
        let order: Vec<_> = surface.objects().iter().map(|o| o.id).collect();
        assert_eq!(order[1], first_id);
        assert_eq!(order[2], second_id);
    }

    #[test]
    fn idempotent_on_an_ordered_stack() {
        let mut ids = IdGenerator::new();
        let mut surface = BasicSurface::new(100, 100);
        surface.add_object(background(&mut ids));
        surface.add_object(image(&mut ids, b"a"));
        surface.add_object(mask(&mut ids));
        apply_layer_order(&mut surface);
        let before: Vec<_> = surface.objects().iter().map(|o| o.id).collect();
        apply_layer_order(&mut surface);
        let after: Vec<_> = surface.objects().iter().map(|o| o.id).collect();
        assert_eq!(before, after, "a second pass must change nothing");
    }

    #[test]
    fn tolerates_missing_fixed_layers() {
        let mut ids = IdGenerator::new();
        let mut surface = BasicSurface::new(100, 100);
        surface.add_object(text(&mut ids, "only"));
        surface.add_object(image(&mut ids, b"a"));
        apply_layer_order(&mut surface);
        assert_eq!(kinds(&surface), vec![ObjectKind::Text, ObjectKind::Image]);
    }

    #[test]
    fn mask_alone_stays_put() {
        let mut ids = IdGenerator::new();
        let mut surface = BasicSurface::new(100, 100);
        surface.add_object(mask(&mut ids));
        apply_layer_order(&mut surface);
        assert_eq!(kinds(&surface), vec![ObjectKind::Mask]);
    }

    #[test]
    fn empty_surface_is_a_no_op() {
        let mut surface = BasicSurface::new(100, 100);
        apply_layer_order(&mut surface);
        assert!(surface.objects().is_empty());
    }
}
