//! SparkFly ECS -- a small entity/component core for a tile-based arcade game.
//!
//! Entities live in a [`World`](world::World) keyed by monotonically
//! increasing ids and iterated in insertion order. Each entity carries at
//! most one component of each kind (Shape, Controller, Label, Drift). A
//! frame runs the update hooks, a pairwise collision pass that fires shape
//! reactions, and then purges removals that were deferred into a
//! [`CommandBuffer`](command::CommandBuffer).
//!
//! # Quick Start
//!
//! ```
//! use sparkfly_ecs::prelude::*;
//!
//! let mut world = World::new();
//! let spark = world
//!     .create(Vec2::new(8.0, 8.0))
//!     .with(Shape::circle(8.0, Color::WHITE)
//!         .with_reaction(Reaction::RemoveSelf)
//!         .with_reaction(Reaction::IncrementCounter(Counter::Sparks)));
//! let spark = world.insert(spark).unwrap();
//!
//! let fly = world.create(Vec2::new(10.0, 8.0)).with(Shape::circle(4.0, Color::WHITE));
//! let fly = world.insert(fly).unwrap();
//!
//! let mut cmds = CommandBuffer::new();
//! resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);
//! cmds.apply(&mut world);
//!
//! assert!(!world.contains(spark));
//! assert_eq!(world.get(fly).unwrap().stats.sparks, 1);
//! ```

#![deny(unsafe_code)]

pub mod canvas;
pub mod collision;
pub mod command;
pub mod component;
pub mod entity;
pub mod geometry;
pub mod input;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by registry operations.
#[derive(Debug, thiserror::Error)]
pub enum EcsError {
    /// The id is not registered (already removed, or never minted here).
    #[error("entity {entity} is not registered")]
    UnknownEntity { entity: entity::EntityId },

    /// An entity with this id is already registered.
    #[error("entity {entity} is already registered")]
    DuplicateEntity { entity: entity::EntityId },

    /// The entity lacks a component the caller required.
    #[error("entity {entity} has no {kind} component")]
    MissingComponent {
        entity: entity::EntityId,
        kind: component::ComponentKind,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::canvas::{Canvas, Color, TextureId};
    pub use crate::collision::{resolve_collisions, CollisionReport, Contact};
    pub use crate::command::{ApplyReport, CausalReason, Command, CommandBuffer};
    pub use crate::component::{
        Component, ComponentKind, Controller, Counter, Drift, Label, LabelText, Reaction, Shape,
        ShapeKind,
    };
    pub use crate::entity::{Entity, EntityId, EntityStats, Transform};
    pub use crate::geometry::{BoxOverlap, Vec2};
    pub use crate::input::{InputFrame, Key, Modifiers, MouseButton};
    pub use crate::world::World;
    pub use crate::EcsError;
}
