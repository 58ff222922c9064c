//! Deferred removal buffer.
//!
//! Nothing is ever removed from the [`World`] while it is being iterated.
//! Update hooks and collision reactions queue removals into a
//! [`CommandBuffer`]; the tick driver purges them in one pass with
//! [`CommandBuffer::apply`] once the collision pass is over. Each queued
//! removal records why it was issued.
//!
//! # Example
//!
//! ```
//! use sparkfly_ecs::prelude::*;
//!
//! let mut world = World::new();
//! let spark = world.spawn(Vec2::new(8.0, 8.0));
//!
//! let mut cmds = CommandBuffer::new();
//! cmds.despawn(spark, CausalReason::GameRule("collected".to_owned()));
//! assert!(world.contains(spark));
//!
//! let applied = cmds.apply(&mut world);
//! assert_eq!(applied.len(), 1);
//! assert!(!world.contains(spark));
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::EntityId;
use crate::world::World;

// ---------------------------------------------------------------------------
// CausalReason
// ---------------------------------------------------------------------------

/// Why a removal was queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CausalReason {
    /// A collision callback on the first entity fired against the second.
    CollisionResponse(EntityId, EntityId),
    /// A game rule (e.g. "level_reset").
    GameRule(String),
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// One queued removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    /// Entity to remove.
    pub target: EntityId,
    pub reason: CausalReason,
    /// Sequential index within the buffer (set on insertion).
    pub command_index: u32,
    /// `false` before `apply()`, and after it when the target was already
    /// gone (a duplicate, or an id that was never registered).
    #[serde(default)]
    pub applied_successfully: bool,
}

// ---------------------------------------------------------------------------
// ApplyReport
// ---------------------------------------------------------------------------

/// Summary of the last [`CommandBuffer::apply`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Targets queued more than once in the same pass.
    pub duplicate_count: usize,
    pub failed_count: usize,
    pub success_count: usize,
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

/// Collects removals during a tick and applies them in FIFO order.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    next_index: u32,
    last_apply_report: ApplyReport,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `target` for removal.
    pub fn despawn(&mut self, target: EntityId, reason: CausalReason) {
        let index = self.next_index;
        self.next_index += 1;
        self.commands.push(Command {
            target,
            reason,
            command_index: index,
            applied_successfully: false,
        });
    }

    /// Whether `target` is already queued.
    pub fn is_pending(&self, target: EntityId) -> bool {
        self.commands.iter().any(|c| c.target == target)
    }

    /// Queued commands in insertion order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Report from the last [`apply`](Self::apply) call. All zero before the
    /// first call.
    pub fn last_apply_report(&self) -> &ApplyReport {
        &self.last_apply_report
    }

    /// Remove every queued target from `world`, in insertion order, and
    /// clear the buffer.
    ///
    /// Returns every processed command. Targets that are no longer in the
    /// world are skipped with a warning; a target queued twice in the same
    /// pass is counted as a duplicate and only its first removal succeeds.
    pub fn apply(&mut self, world: &mut World) -> Vec<Command> {
        let mut commands = std::mem::take(&mut self.commands);
        self.next_index = 0;

        let mut seen = std::collections::HashSet::new();
        let mut report = ApplyReport::default();

        for cmd in &mut commands {
            if !seen.insert(cmd.target) {
                report.duplicate_count += 1;
            }
            match world.purge(cmd.target) {
                Ok(()) => {
                    cmd.applied_successfully = true;
                    report.success_count += 1;
                }
                Err(e) => {
                    report.failed_count += 1;
                    warn!(
                        command_index = cmd.command_index,
                        target = %cmd.target,
                        reason = ?cmd.reason,
                        error = %e,
                        "deferred removal skipped"
                    );
                }
            }
        }

        self.last_apply_report = report;
        commands
    }

    /// Drop all queued commands without applying them.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.next_index = 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
