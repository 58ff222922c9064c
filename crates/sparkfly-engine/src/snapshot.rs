//! Game state snapshots with BLAKE3 hashing.
//!
//! A [`WorldSnapshot`] is a plain, serializable view of a [`TickLoop`]: the
//! tick counter, level progress and every entity's transform, counters and
//! component kinds in registry order. Its [`state_hash`](WorldSnapshot::state_hash)
//! is the BLAKE3 digest of its JSON encoding, which makes two runs easy to
//! compare:
//!
//! ```
//! use sparkfly_engine::prelude::*;
//!
//! let config = TickConfig { seed: Some(3), headless: true, ..Default::default() };
//! let mut a = TickLoop::new(config.clone()).unwrap();
//! let mut b = TickLoop::new(config).unwrap();
//! a.run_ticks(20).unwrap();
//! b.run_ticks(20).unwrap();
//!
//! let hash = a.state_hash().unwrap();
//! assert_eq!(hash.len(), 64); // BLAKE3 hex digest
//! assert_eq!(hash, b.state_hash().unwrap());
//! ```
//!
//! Snapshots are for comparison only; a game cannot be restored from one.

use serde::{Deserialize, Serialize};

use sparkfly_ecs::component::ComponentKind;
use sparkfly_ecs::entity::{Entity, EntityId, EntityStats};
use sparkfly_ecs::geometry::Vec2;

use crate::tick::{GamePhase, TickLoop};
use crate::EngineError;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// One entity as captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub position: Vec2,
    pub start_position: Vec2,
    pub scale: f64,
    pub stats: EntityStats,
    /// Attached component kinds in dispatch order.
    pub components: Vec<ComponentKind>,
}

impl From<&Entity> for EntitySnapshot {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id(),
            position: entity.position(),
            start_position: entity.start_position,
            scale: entity.scale(),
            stats: entity.stats,
            components: entity.component_kinds().collect(),
        }
    }
}

/// The whole game as captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    /// Levels completed.
    pub level: u32,
    pub phase: GamePhase,
    pub total_sparks: u32,
    pub player: EntityId,
    /// Entities in registry order.
    pub entities: Vec<EntitySnapshot>,
}

impl WorldSnapshot {
    pub fn capture(game: &TickLoop) -> Self {
        Self {
            tick: game.tick_count(),
            level: game.level(),
            phase: game.phase(),
            total_sparks: game.total_sparks(),
            player: game.player(),
            entities: game.world().iter().map(EntitySnapshot::from).collect(),
        }
    }

    /// BLAKE3 hex digest (64 lowercase hex chars) of the JSON encoding.
    pub fn state_hash(&self) -> Result<String, EngineError> {
        let json_bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&json_bytes).to_hex().to_string())
    }

    /// The captured player, if it was registered.
    pub fn player_entity(&self) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == self.player)
    }
}

// ---------------------------------------------------------------------------
// TickLoop snapshot methods
// ---------------------------------------------------------------------------

impl TickLoop {
    /// Capture the current state.
    pub fn capture_snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(self)
    }

    /// Equivalent to `capture_snapshot().state_hash()`.
    pub fn state_hash(&self) -> Result<String, EngineError> {
        self.capture_snapshot().state_hash()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
