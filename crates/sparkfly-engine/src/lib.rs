//! SparkFly Engine -- level generation and the game loop for SparkFly.
//!
//! This crate builds on [`sparkfly_ecs`] to provide the game itself: a seeded
//! tile-grid generator, the prefabs that populate a level, and the
//! [`TickLoop`](tick::TickLoop) state machine that runs update, collision,
//! deferred removal and level progression once per frame.
//!
//! # Quick Start
//!
//! ```
//! use sparkfly_engine::prelude::*;
//!
//! let config = TickConfig { seed: Some(7), headless: true, ..Default::default() };
//! let mut game = TickLoop::new(config).unwrap();
//!
//! game.run_ticks(10).unwrap();
//! assert_eq!(game.tick_count(), 10);
//! assert!(game.world().contains(game.player()));
//! ```

#![deny(unsafe_code)]

pub mod level;
pub mod prefab;
pub mod render;
pub mod snapshot;
pub mod tick;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

/// Re-export the ECS crate for convenience.
pub use sparkfly_ecs;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while setting up or advancing the game.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The grid has no interior cell to start the player on.
    #[error("grid {width}x{height} is too small: needs at least 3x3")]
    GridTooSmall { width: usize, height: usize },

    /// A hand-written grid could not be used as a level.
    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    /// The player entity is neither registered nor held by the loop.
    #[error("player entity {entity} is missing")]
    MissingPlayer { entity: sparkfly_ecs::entity::EntityId },

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A snapshot could not be encoded for hashing.
    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error(transparent)]
    Ecs(#[from] sparkfly_ecs::EcsError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common engine usage.
pub mod prelude {
    // Re-export everything from the ECS prelude.
    pub use sparkfly_ecs::prelude::*;

    // Engine-specific exports.
    pub use crate::level::{build_level, LevelSummary, Tile, TileGrid};
    pub use crate::render::{DrawCommand, FrameRecorder};
    pub use crate::snapshot::{EntitySnapshot, WorldSnapshot};
    pub use crate::tick::{GamePhase, TickConfig, TickDiagnostics, TickLoop};
    pub use crate::EngineError;

    #[cfg(feature = "renderer")]
    pub use crate::render::{run_windowed, Camera2D, DebugRenderer};
}
