//! The [`World`] owns every live [`Entity`], keyed by id, and the allocator
//! that mints those ids.
//!
//! Iteration follows insertion order, so update, collision and draw passes
//! visit entities in the same order every frame. During a tick, entities are
//! removed only through a [`CommandBuffer`](crate::command::CommandBuffer);
//! [`World::purge`] is the immediate primitive the buffer applies.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::canvas::Canvas;
use crate::component::{ComponentKind, Shape};
use crate::entity::{Entity, EntityAllocator, EntityId};
use crate::geometry::Vec2;
use crate::input::InputFrame;
use crate::EcsError;

/// Source of world tags. Tag 0 is never handed out.
static NEXT_WORLD_TAG: AtomicU64 = AtomicU64::new(1);

/// Registry of live entities.
///
/// Each world stamps the entities it creates with its own tag, and only
/// accepts entities carrying that tag. An id is registrable while it is
/// *detached*: created but not yet inserted, or taken out again with
/// [`despawn`](Self::despawn). Purging or clearing retires an id for good.
#[derive(Debug)]
pub struct World {
    tag: u64,
    allocator: EntityAllocator,
    entities: HashMap<EntityId, Entity>,
    /// Insertion order of the live ids.
    order: Vec<EntityId>,
    /// Ids minted here that are outside the registry but may come back.
    detached: HashSet<EntityId>,
}

impl Default for World {
    fn default() -> Self {
        Self {
            tag: NEXT_WORLD_TAG.fetch_add(1, Ordering::Relaxed),
            allocator: EntityAllocator::new(),
            entities: HashMap::new(),
            order: Vec::new(),
            detached: HashSet::new(),
        }
    }
}

impl World {
    /// An empty world with its own id space.
    pub fn new() -> Self {
        Self::default()
    }

    // -- creation -----------------------------------------------------------

    /// Build an unregistered entity with a freshly allocated id. Attach its
    /// components, then hand it to [`insert`](Self::insert).
    pub fn create(&mut self, position: Vec2) -> Entity {
        let id = self.allocator.allocate();
        self.detached.insert(id);
        Entity::owned(id, position, self.tag)
    }

    /// Create and register a bare entity at `position`.
    pub fn spawn(&mut self, position: Vec2) -> EntityId {
        let entity = self.create(position);
        let id = entity.id();
        self.detached.remove(&id);
        self.order.push(id);
        self.entities.insert(id, entity);
        id
    }

    /// Register an entity built by [`create`](Self::create) (or one previously
    /// taken out with [`despawn`](Self::despawn)). It goes to the end of the
    /// iteration order.
    ///
    /// Entities from another world, built by hand, or whose id was purged
    /// are rejected with [`EcsError::UnknownEntity`].
    pub fn insert(&mut self, entity: Entity) -> Result<EntityId, EcsError> {
        let id = entity.id();
        if self.entities.contains_key(&id) {
            return Err(EcsError::DuplicateEntity { entity: id });
        }
        if entity.owner() != self.tag || !self.detached.remove(&id) {
            return Err(EcsError::UnknownEntity { entity: id });
        }
        self.order.push(id);
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Remove an entity immediately and hand it back. It may be
    /// [`insert`](Self::insert)ed again later under the same id.
    ///
    /// Never call this while iterating the world; queue a removal in a
    /// [`CommandBuffer`](crate::command::CommandBuffer) instead.
    pub fn despawn(&mut self, id: EntityId) -> Result<Entity, EcsError> {
        let entity = self.unlink(id)?;
        self.detached.insert(id);
        Ok(entity)
    }

    /// Remove an entity for good. Its id is retired and can never be
    /// registered again, not even from a clone of the entity.
    pub fn purge(&mut self, id: EntityId) -> Result<(), EcsError> {
        self.unlink(id).map(drop)
    }

    fn unlink(&mut self, id: EntityId) -> Result<Entity, EcsError> {
        let entity = self
            .entities
            .remove(&id)
            .ok_or(EcsError::UnknownEntity { entity: id })?;
        self.order.retain(|e| *e != id);
        Ok(entity)
    }

    /// Drop every registered entity, retiring their ids. The id allocator
    /// keeps counting, and detached entities may still be inserted.
    pub fn clear(&mut self) {
        self.entities.clear();
        self.order.clear();
    }

    // -- access -------------------------------------------------------------

    /// The registered entity with `id`.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable access to the registered entity with `id`.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Like [`get`](Self::get) but with an error naming the missing id.
    pub fn try_get(&self, id: EntityId) -> Result<&Entity, EcsError> {
        self.get(id).ok_or(EcsError::UnknownEntity { entity: id })
    }

    /// The shape of `id`, or an error naming what is missing.
    pub fn try_shape(&self, id: EntityId) -> Result<&Shape, EcsError> {
        self.try_get(id)?.shape().ok_or(EcsError::MissingComponent {
            entity: id,
            kind: ComponentKind::Shape,
        })
    }

    /// Whether `id` is currently registered.
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no entity is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live ids in iteration order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied()
    }

    /// Live entities in iteration order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Number of ids minted so far, live or not.
    pub fn allocated_ids(&self) -> u64 {
        self.allocator.allocated()
    }

    // -- passes -------------------------------------------------------------

    /// Run every entity's update hooks, in iteration order.
    pub fn update_all(&mut self, input: &InputFrame) {
        for id in &self.order {
            if let Some(entity) = self.entities.get_mut(id) {
                entity.update(input);
            }
        }
    }

    /// Run every entity's draw hooks, in iteration order.
    pub fn draw_all(&self, canvas: &mut dyn Canvas) {
        for entity in self.iter() {
            entity.draw(canvas);
        }
    }

    /// Make the shape of every registered entity ignore every other
    /// registered entity. Entities registered afterwards are not added to
    /// these ignore sets. Entities without a shape are skipped.
    pub fn ignore_all_pairs(&mut self) {
        for a in &self.order {
            let Some(shape) = self.entities.get_mut(a).and_then(Entity::shape_mut) else {
                continue;
            };
            for b in self.order.iter().filter(|b| *b != a) {
                shape.ignore(*b);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
