//! Entity identifiers, allocation, and the [`Entity`] aggregate.
//!
//! Ids are handed out by an [`EntityAllocator`] that only ever counts upward:
//! an id is never reused for the lifetime of the allocator, so a stale id can
//! never alias a newer entity.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::component::{Component, ComponentKind, Counter};
use crate::geometry::Vec2;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// A unique, monotonically increasing entity identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Allocates [`EntityId`]s from an upward counter. Nothing is recycled.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    /// Create a new allocator starting at id 0.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Allocate a fresh [`EntityId`].
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next
    }
}

// ---------------------------------------------------------------------------
// Transform / stats
// ---------------------------------------------------------------------------

/// Where an entity is and how large its shapes are drawn and collided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Centre of the entity in canvas pixels.
    pub position: Vec2,
    /// Multiplier applied to every shape dimension.
    pub scale: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

/// Per-entity counters bumped by collision reactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
    /// Sparks collected.
    pub sparks: u32,
    /// Times killed by a hazard.
    pub deaths: u32,
}

impl EntityStats {
    /// Current value of `counter`.
    pub fn get(&self, counter: Counter) -> u32 {
        match counter {
            Counter::Sparks => self.sparks,
            Counter::Deaths => self.deaths,
        }
    }

    /// Increment `counter` by one (saturating).
    pub fn bump(&mut self, counter: Counter) {
        let slot = match counter {
            Counter::Sparks => &mut self.sparks,
            Counter::Deaths => &mut self.deaths,
        };
        *slot = slot.saturating_add(1);
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A simulated object: an id, a transform, counters, and at most one
/// component of each [`ComponentKind`].
///
/// Components are kept in kind order, which is also their dispatch order.
/// They do not point back at the entity; `update`/`draw` receive the
/// entity's transform and stats instead.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    /// Tag of the world that minted `id`; 0 for entities built by hand.
    owner: u64,
    /// Position and scale.
    pub transform: Transform,
    /// Where [`Reaction::RespawnAtStart`](crate::component::Reaction::RespawnAtStart)
    /// sends this entity.
    pub start_position: Vec2,
    /// Counters bumped by collision reactions.
    pub stats: EntityStats,
    components: BTreeMap<ComponentKind, Component>,
}

impl Entity {
    /// Create an entity at `position` with scale 1 and no components. The
    /// start position is initialised to `position`.
    ///
    /// An entity built this way belongs to no world and cannot be
    /// registered; use [`World::create`](crate::world::World::create) for
    /// that.
    pub fn new(id: EntityId, position: Vec2) -> Self {
        Self::owned(id, position, 0)
    }

    pub(crate) fn owned(id: EntityId, position: Vec2, owner: u64) -> Self {
        Self {
            id,
            owner,
            transform: Transform {
                position,
                scale: 1.0,
            },
            start_position: position,
            stats: EntityStats::default(),
            components: BTreeMap::new(),
        }
    }

    /// The id this entity was minted with.
    pub fn id(&self) -> EntityId {
        self.id
    }

    pub(crate) fn owner(&self) -> u64 {
        self.owner
    }

    /// Current position (shorthand for `transform.position`).
    pub fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// Move the entity. The start position is left alone.
    pub fn set_position(&mut self, position: Vec2) {
        self.transform.position = position;
    }

    /// Shape scale factor.
    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    /// Attach a component, replacing (and returning) any previous component
    /// of the same kind.
    pub fn add_component(&mut self, component: impl Into<Component>) -> Option<Component> {
        let component = component.into();
        self.components.insert(component.kind(), component)
    }

    /// Builder-style [`add_component`](Self::add_component).
    pub fn with(mut self, component: impl Into<Component>) -> Self {
        self.add_component(component);
        self
    }

    /// Detach and return the component of `kind`, if any.
    pub fn remove_component(&mut self, kind: ComponentKind) -> Option<Component> {
        self.components.remove(&kind)
    }

    /// The component of `kind`, if attached.
    pub fn component(&self, kind: ComponentKind) -> Option<&Component> {
        self.components.get(&kind)
    }

    /// Mutable access to the component of `kind`, if attached.
    pub fn component_mut(&mut self, kind: ComponentKind) -> Option<&mut Component> {
        self.components.get_mut(&kind)
    }

    /// Whether a component of `kind` is attached.
    pub fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.contains_key(&kind)
    }

    /// Component kinds held, in dispatch order.
    pub fn component_kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.components.keys().copied()
    }

    /// The entity's shape, if it has one.
    pub fn shape(&self) -> Option<&crate::component::Shape> {
        match self.components.get(&ComponentKind::Shape) {
            Some(Component::Shape(shape)) => Some(shape),
            _ => None,
        }
    }

    /// Mutable access to the shape, e.g. to extend its ignore set.
    pub fn shape_mut(&mut self) -> Option<&mut crate::component::Shape> {
        match self.components.get_mut(&ComponentKind::Shape) {
            Some(Component::Shape(shape)) => Some(shape),
            _ => None,
        }
    }

    /// Run every component's update hook in kind order.
    pub fn update(&mut self, input: &crate::input::InputFrame) {
        for component in self.components.values() {
            component.update(&mut self.transform, input);
        }
    }

    /// Run every component's draw hook in kind order.
    pub fn draw(&self, canvas: &mut dyn crate::canvas::Canvas) {
        for component in self.components.values() {
            component.draw(&self.transform, &self.stats, canvas);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
