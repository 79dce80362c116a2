//! The rendering-surface seam.
//!
//! The engine never draws; it manipulates an ordered object stack owned
//! by a [`RenderSurface`] implementation. The trait is the boundary a
//! real renderer plugs into; [`BasicSurface`] is the in-memory
//! reference implementation used by the engine tests and the headless
//! preview path.

use crate::object::{DrawableObject, ObjectId};

/// An ordered stack of drawable objects with canvas dimensions.
///
/// Index 0 is the bottom of the stack. Implementations own the live
/// object graph exclusively; callers address objects by [`ObjectId`].
pub trait RenderSurface {
    /// Canvas width and height in canvas units.
    fn dimensions(&self) -> (u32, u32);

    /// Resize the canvas. Object placements are not adjusted.
    fn set_dimensions(&mut self, width: u32, height: u32);

    /// All objects, bottom to top.
    fn objects(&self) -> &[DrawableObject];

    /// Look up an object by id.
    fn object(&self, id: ObjectId) -> Option<&DrawableObject>;

    /// Mutable lookup, for placement edits.
    fn object_mut(&mut self, id: ObjectId) -> Option<&mut DrawableObject>;

    /// Push an object onto the top of the stack.
    fn add_object(&mut self, object: DrawableObject);

    /// Remove an object, returning it if present.
    fn remove_object(&mut self, id: ObjectId) -> Option<DrawableObject>;

    /// Move an object to a stack index, shifting its neighbors.
    ///
    /// The index is clamped to the stack. Returns `false` when the id
    /// is not on the surface (an object removed concurrently is not an
    /// error).
    fn move_to_index(&mut self, id: ObjectId, index: usize) -> bool;

    /// Remove every object.
    fn clear(&mut self);
}

/// In-memory [`RenderSurface`].
#[derive(Debug, Clone)]
pub struct BasicSurface {
    width: u32,
    height: u32,
    objects: Vec<DrawableObject>,
}

impl BasicSurface {
    /// An empty surface with the given canvas dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            objects: Vec::new(),
        }
    }

    fn position_of(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|object| object.id == id)
    }
}

impl RenderSurface for BasicSurface {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn objects(&self) -> &[DrawableObject] {
        &self.objects
    }

    fn object(&self, id: ObjectId) -> Option<&DrawableObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    fn object_mut(&mut self, id: ObjectId) -> Option<&mut DrawableObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    fn add_object(&mut self, object: DrawableObject) {
        self.objects.push(object);
    }

    fn remove_object(&mut self, id: ObjectId) -> Option<DrawableObject> {
        let position = self.position_of(id)?;
        Some(self.objects.remove(position))
    }

    fn move_to_index(&mut self, id: ObjectId, index: usize) -> bool {
        let Some(position) = self.position_of(id) else {
            return false;
        };
        let object = self.objects.remove(position);
        let index = index.min(self.objects.len());
        self.objects.insert(index, object);
        true
    }

    fn clear(&mut self) {
        self.objects.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::object::{IdGenerator, ObjectContent, Placement, SourceRef};

    fn surface_with(count: usize) -> (BasicSurface, Vec<ObjectId>) {
        let mut ids = IdGenerator::new();
        let mut surface = BasicSurface::new(200, 200);
        let mut added = Vec::new();
        for i in 0..count {
            let id = ids.next_id();
            surface.add_object(DrawableObject::new(
                id,
                ObjectContent::Image(SourceRef::from_bytes(&[u8::try_from(i).unwrap()], 1, 1)),
                Placement::default(),
            ));
            added.push(id);
        }
        (surface, added)
    }

    #[test]
    fn add_pushes_to_top() {
        let (surface, ids) = surface_with(3);
        let order: Vec<_> = surface.objects().iter().map(|o| o.id).collect();
        assert_eq!(order, ids, "insertion order must be bottom to top");
    }

    #[test]
    fn remove_returns_the_object() {
        let (mut surface, ids) = surface_with(3);
        let removed = surface.remove_object(ids[1]).unwrap();
        assert_eq!(removed.id, ids[1]);
        assert_eq!(surface.objects().len(), 2);
        assert!(surface.remove_object(ids[1]).is_none(), "double remove");
    }

    #[test]
    fn move_to_index_reorders() {
        let (mut surface, ids) = surface_with(3);
        assert!(surface.move_to_index(ids[2], 0));
        let order: Vec<_> = surface.objects().iter().map(|o| o.id).collect();
        assert_eq!(order, vec![ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn move_to_index_clamps_out_of_range() {
        let (mut surface, ids) = surface_with(2);
        assert!(surface.move_to_index(ids[0], 99));
        let order: Vec<_> = surface.objects().iter().map(|o| o.id).collect();
        assert_eq!(order, vec![ids[1], ids[0]]);
    }

    #[test]
    fn move_of_missing_id_is_not_an_error() {
        let (mut surface, _) = surface_with(1);
        let mut ids = IdGenerator::new();
        ids.next_id();
        let stranger = ids.next_id();
        assert!(!surface.move_to_index(stranger, 0));
        assert_eq!(surface.objects().len(), 1, "stack must be untouched");
    }

    #[test]
    fn object_mut_edits_in_place() {
        let (mut surface, ids) = surface_with(1);
        surface.object_mut(ids[0]).unwrap().placement.x = 42.0;
        let x = surface.object(ids[0]).unwrap().placement.x;
        assert!((x - 42.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clear_empties_the_stack() {
        let (mut surface, _) = surface_with(3);
        surface.clear();
        assert!(surface.objects().is_empty());
        assert_eq!(surface.dimensions(), (200, 200), "dimensions survive clear");
    }
}
