//! Game objects and their owning store.
//!
//! Ids come from an explicit [`IdAllocator`] owned by each
//! [`GameObjectMap`], so separate worlds never share an id sequence and
//! tests get deterministic ids.

use std::collections::BTreeMap;
use std::sync::Arc;

use glam::Vec3;

use glimmer_resources::Model;

use crate::light::PointLight;
use crate::transform::Transform;

/// Identifier of a game object, unique within its map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameObjectId(u64);

impl GameObjectId {
    /// Returns the raw id value.
    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Hands out monotonically increasing game object ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    /// Creates an allocator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next id.
    pub fn allocate(&mut self) -> GameObjectId {
        let id = GameObjectId(self.next);
        self.next += 1;
        id
    }
}

/// An entity in the scene.
///
/// Purely data: a transform, an optional model to draw, a color, and an
/// optional point light component. Render systems decide what to do with
/// each component.
pub struct GameObject {
    id: GameObjectId,
    /// Mesh to render, if any.
    pub model: Option<Arc<Model>>,
    /// Base color.
    pub color: Vec3,
    /// Position, rotation, and scale.
    pub transform: Transform,
    /// Point light component, if this object emits light.
    pub point_light: Option<PointLight>,
}

impl GameObject {
    fn new(id: GameObjectId) -> Self {
        Self {
            id,
            model: None,
            color: Vec3::ONE,
            transform: Transform::default(),
            point_light: None,
        }
    }

    /// Returns this object's id.
    #[inline]
    pub fn id(&self) -> GameObjectId {
        self.id
    }
}

/// Owning store of game objects with its own id sequence.
#[derive(Default)]
pub struct GameObjectMap {
    objects: BTreeMap<GameObjectId, GameObject>,
    allocator: IdAllocator,
}

impl GameObjectMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new game object with default components and returns its id.
    pub fn spawn(&mut self) -> GameObjectId {
        let id = self.allocator.allocate();
        self.objects.insert(id, GameObject::new(id));
        id
    }

    /// Returns the object with the given id.
    pub fn get(&self, id: GameObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    /// Returns the object with the given id mutably.
    pub fn get_mut(&mut self, id: GameObjectId) -> Option<&mut GameObject> {
        self.objects.get_mut(&id)
    }

    /// Iterates over all objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = &GameObject> {
        self.objects.values()
    }

    /// Iterates over all objects mutably in id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut GameObject> {
        self.objects.values_mut()
    }

    /// Number of objects in the map.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the map holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_ids_are_monotonic() {
        let mut allocator = IdAllocator::new();
        let a = allocator.allocate();
        let b = allocator.allocate();
        let c = allocator.allocate();
        assert!(a < b && b < c);
        assert_eq!(a.value(), 0);
        assert_eq!(c.value(), 2);
    }

    #[test]
    fn test_separate_maps_have_independent_sequences() {
        let mut world_a = GameObjectMap::new();
        let mut world_b = GameObjectMap::new();

        let a0 = world_a.spawn();
        let b0 = world_b.spawn();

        // Both start from zero; neither map's spawns affect the other
        assert_eq!(a0.value(), 0);
        assert_eq!(b0.value(), 0);
    }

    #[test]
    fn test_spawn_creates_default_object() {
        let mut map = GameObjectMap::new();
        let id = map.spawn();

        let object = map.get(id).unwrap();
        assert_eq!(object.id(), id);
        assert!(object.model.is_none());
        assert!(object.point_light.is_none());
        assert_eq!(object.color, Vec3::ONE);
        assert_eq!(object.transform, Transform::default());
    }

    #[test]
    fn test_get_mut_modifies_object() {
        let mut map = GameObjectMap::new();
        let id = map.spawn();

        map.get_mut(id).unwrap().color = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(map.get(id).unwrap().color, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_iter_in_id_order() {
        let mut map = GameObjectMap::new();
        let ids: Vec<_> = (0..4).map(|_| map.spawn()).collect();

        let seen: Vec<_> = map.iter().map(|o| o.id()).collect();
        assert_eq!(seen, ids);
        assert_eq!(map.len(), 4);
    }
}
