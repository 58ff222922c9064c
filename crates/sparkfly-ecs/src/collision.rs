//! Pairwise collision pass.
//!
//! For every ordered pair `(A, B)` of distinct live entities that both carry
//! a [`Shape`](crate::component::Shape), if A's shape does not ignore B and
//! the predicate for the two shape kinds reports overlap, A's reactions fire
//! against B. The check is directional: B's reactions against A are decided
//! separately when the pair comes up the other way round.
//!
//! Geometry is read fresh for every pair, so a nudge applied earlier in the
//! pass is seen by later pairs. Removals are only queued in the
//! [`CommandBuffer`]; a removed entity keeps colliding until the buffer is
//! applied after the pass.
//!
//! The pass is O(n²) in the number of live entities. That is fine for a
//! screenful of tiles; larger worlds would want a broad phase in front of it.

use tracing::warn;

use crate::command::{CausalReason, CommandBuffer};
use crate::component::{Placed, Reaction};
use crate::entity::EntityId;
use crate::geometry::{
    box_intersects_box, circle_intersects_box, circle_intersects_circle, BoxOverlap,
};
use crate::world::World;

/// An ordered pair whose reactions fired: `reactor`'s shape touched `other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub reactor: EntityId,
    pub other: EntityId,
}

/// What one collision pass did.
#[derive(Debug, Clone, Default)]
pub struct CollisionReport {
    /// Contacts whose reactions fired, in pass order.
    pub contacts: Vec<Contact>,
    /// Ordered pairs where both sides had a shape.
    pub pairs_tested: usize,
    /// Ordered pairs skipped by an ignore set.
    pub pairs_ignored: usize,
}

/// Overlap between two placed shapes. Circle/box is the same test whichever
/// side the circle is on.
pub fn placed_overlap(a: Placed, b: Placed, policy: BoxOverlap) -> bool {
    match (a, b) {
        (Placed::Circle(a), Placed::Circle(b)) => circle_intersects_circle(a, b),
        (Placed::Circle(c), Placed::Box(r)) | (Placed::Box(r), Placed::Circle(c)) => {
            circle_intersects_box(c, r)
        }
        (Placed::Box(a), Placed::Box(b)) => box_intersects_box(a, b, policy),
    }
}

/// Run one full collision pass over `world`.
pub fn resolve_collisions(
    world: &mut World,
    commands: &mut CommandBuffer,
    policy: BoxOverlap,
) -> CollisionReport {
    let ids: Vec<EntityId> = world.ids().collect();
    let mut report = CollisionReport::default();

    for &a in &ids {
        for &b in &ids {
            if a == b {
                continue;
            }
            let Some(reactions) = test_pair(world, a, b, policy, &mut report) else {
                continue;
            };
            report.contacts.push(Contact { reactor: a, other: b });
            for reaction in reactions {
                apply_reaction(world, commands, a, b, reaction);
            }
        }
    }

    report
}

/// The reactions to fire if A's shape touches B, `None` otherwise.
fn test_pair(
    world: &World,
    a: EntityId,
    b: EntityId,
    policy: BoxOverlap,
    report: &mut CollisionReport,
) -> Option<Vec<Reaction>> {
    let ea = world.get(a)?;
    let eb = world.get(b)?;
    let (sa, sb) = (ea.shape()?, eb.shape()?);
    report.pairs_tested += 1;
    if sa.ignores(b) {
        report.pairs_ignored += 1;
        return None;
    }
    placed_overlap(sa.placed(&ea.transform), sb.placed(&eb.transform), policy)
        .then(|| sa.reactions.clone())
}

/// Apply one reaction of `reactor` against `other`.
pub fn apply_reaction(
    world: &mut World,
    commands: &mut CommandBuffer,
    reactor: EntityId,
    other: EntityId,
    reaction: Reaction,
) {
    let cause = || CausalReason::CollisionResponse(reactor, other);
    match reaction {
        Reaction::RemoveSelf => commands.despawn(reactor, cause()),
        Reaction::RemoveOther => commands.despawn(other, cause()),
        Reaction::IncrementCounter(counter) => {
            if let Some(e) = world.get_mut(other) {
                e.stats.bump(counter);
            }
        }
        Reaction::RespawnAtStart => {
            if let Some(e) = world.get_mut(other) {
                e.transform.position = e.start_position;
            }
        }
        Reaction::RepelFrom { strength } => nudge(world, reactor, other, strength),
        Reaction::AttractTo { strength } => nudge(world, reactor, other, -strength),
    }
}

/// Move `other` by `strength` along the unit vector from `reactor` to it.
/// Coincident centres have no direction; the nudge is skipped.
fn nudge(world: &mut World, reactor: EntityId, other: EntityId, strength: f64) {
    let Some(from) = world.get(reactor).map(|e| e.position()) else {
        return;
    };
    let Some(target) = world.get_mut(other) else {
        return;
    };
    match (target.position() - from).normalized() {
        Some(dir) => target.transform.position += dir * strength,
        None => warn!(
            reactor = %reactor,
            other = %other,
            "coincident centres, nudge skipped"
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Color;
    use crate::component::{Counter, Shape};
    use crate::geometry::Vec2;

    fn spawn_shape(world: &mut World, x: f64, y: f64, shape: Shape) -> EntityId {
        let e = world.create(Vec2::new(x, y)).with(shape);
        world.insert(e).unwrap()
    }

    #[test]
    fn reactions_fire_only_on_the_reacting_side() {
        let mut world = World::new();
        let hazard = spawn_shape(
            &mut world,
            0.0,
            0.0,
            Shape::circle(8.0, Color::WHITE).with_reaction(Reaction::IncrementCounter(Counter::Deaths)),
        );
        let player = spawn_shape(&mut world, 5.0, 0.0, Shape::circle(4.0, Color::WHITE));

        let mut cmds = CommandBuffer::new();
        let report = resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);

        // Both orderings overlap; the player has no reactions but still
        // registers as a contact.
        assert_eq!(report.contacts.len(), 2);
        assert_eq!(report.pairs_tested, 2);
        assert_eq!(world.get(player).unwrap().stats.deaths, 1);
        assert_eq!(world.get(hazard).unwrap().stats.deaths, 0);
    }

    #[test]
    fn entities_without_shapes_are_skipped() {
        let mut world = World::new();
        spawn_shape(
            &mut world,
            0.0,
            0.0,
            Shape::circle(8.0, Color::WHITE).with_reaction(Reaction::RemoveOther),
        );
        let bare = world.spawn(Vec2::ZERO);
        let mut cmds = CommandBuffer::new();
        let report = resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);
        assert_eq!(report.pairs_tested, 0);
        assert!(cmds.is_empty());
        assert!(world.contains(bare));
    }

    #[test]
    fn remove_other_queues_the_touched_entity() {
        let mut world = World::new();
        let eater = spawn_shape(
            &mut world,
            0.0,
            0.0,
            Shape::circle(8.0, Color::WHITE).with_reaction(Reaction::RemoveOther),
        );
        let prey = spawn_shape(&mut world, 6.0, 0.0, Shape::circle(4.0, Color::WHITE));

        let mut cmds = CommandBuffer::new();
        resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);
        assert!(cmds.is_pending(prey));
        assert!(!cmds.is_pending(eater));
        assert!(world.contains(prey));

        let applied = cmds.apply(&mut world);
        assert_eq!(applied.len(), 1);
        assert_eq!(
            applied[0].reason,
            CausalReason::CollisionResponse(eater, prey)
        );
        assert!(!world.contains(prey));
        assert!(world.contains(eater));
    }

    #[test]
    fn legacy_policy_box_pairs_fire_one_way() {
        // Legacy compares A's far y edge (0 + 4) with B's height (50), so
        // the short box never reaches the tall one, while the reverse does.
        let mut world = World::new();
        let short = spawn_shape(
            &mut world,
            0.0,
            0.0,
            Shape::rect(10.0, 4.0, Color::WHITE).with_reaction(Reaction::IncrementCounter(Counter::Deaths)),
        );
        let tall = spawn_shape(
            &mut world,
            0.0,
            2.0,
            Shape::rect(10.0, 50.0, Color::WHITE).with_reaction(Reaction::IncrementCounter(Counter::Deaths)),
        );

        let mut cmds = CommandBuffer::new();
        let report = resolve_collisions(&mut world, &mut cmds, BoxOverlap::Legacy);
        assert_eq!(report.contacts, vec![Contact { reactor: tall, other: short }]);
        assert_eq!(world.get(short).unwrap().stats.deaths, 1);
        assert_eq!(world.get(tall).unwrap().stats.deaths, 0);

        let report = resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);
        assert_eq!(report.contacts.len(), 2);
        assert_eq!(world.get(tall).unwrap().stats.deaths, 1);
    }

    #[test]
    fn ignore_set_blocks_only_its_own_direction() {
        let mut world = World::new();
        let a = spawn_shape(
            &mut world,
            0.0,
            0.0,
            Shape::circle(8.0, Color::WHITE).with_reaction(Reaction::IncrementCounter(Counter::Sparks)),
        );
        let b = spawn_shape(
            &mut world,
            1.0,
            0.0,
            Shape::circle(8.0, Color::WHITE).with_reaction(Reaction::IncrementCounter(Counter::Sparks)),
        );
        world.get_mut(a).unwrap().shape_mut().unwrap().ignore(b);

        let mut cmds = CommandBuffer::new();
        let report = resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);

        assert_eq!(report.pairs_ignored, 1);
        assert_eq!(report.contacts, vec![Contact { reactor: b, other: a }]);
        assert_eq!(world.get(a).unwrap().stats.sparks, 1);
        assert_eq!(world.get(b).unwrap().stats.sparks, 0);
    }

    #[test]
    fn circle_box_pairs_match_either_way_round() {
        let mut world = World::new();
        let wall = spawn_shape(
            &mut world,
            0.0,
            0.0,
            Shape::rect(16.0, 16.0, Color::WHITE).with_reaction(Reaction::IncrementCounter(Counter::Deaths)),
        );
        let fly = spawn_shape(
            &mut world,
            11.0,
            0.0,
            Shape::circle(4.0, Color::WHITE).with_reaction(Reaction::IncrementCounter(Counter::Deaths)),
        );
        let mut cmds = CommandBuffer::new();
        resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);
        assert_eq!(world.get(fly).unwrap().stats.deaths, 1);
        assert_eq!(world.get(wall).unwrap().stats.deaths, 1);
    }

    #[test]
    fn respawn_teleports_other_to_start() {
        let mut world = World::new();
        spawn_shape(
            &mut world,
            50.0,
            50.0,
            Shape::rect(16.0, 16.0, Color::WHITE).with_reaction(Reaction::RespawnAtStart),
        );
        let mut fly = world.create(Vec2::new(50.0, 44.0)).with(Shape::circle(4.0, Color::WHITE));
        fly.start_position = Vec2::new(8.0, 8.0);
        let fly = world.insert(fly).unwrap();

        let mut cmds = CommandBuffer::new();
        resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);
        assert_eq!(world.get(fly).unwrap().position(), Vec2::new(8.0, 8.0));
    }

    #[test]
    fn repel_and_attract_nudge_along_separation() {
        let mut world = World::new();
        let minus = spawn_shape(
            &mut world,
            0.0,
            0.0,
            Shape::circle(48.0, Color::WHITE).with_reaction(Reaction::RepelFrom { strength: 0.5 }),
        );
        let fly = spawn_shape(&mut world, 3.0, 4.0, Shape::circle(4.0, Color::WHITE));
        let mut cmds = CommandBuffer::new();
        resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);
        let p = world.get(fly).unwrap().position();
        assert!((p.x - 3.3).abs() < 1e-12 && (p.y - 4.4).abs() < 1e-12);

        world.get_mut(minus).unwrap().shape_mut().unwrap().reactions =
            vec![Reaction::AttractTo { strength: 0.5 }];
        resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);
        let p = world.get(fly).unwrap().position();
        assert!((p.x - 3.0).abs() < 1e-12 && (p.y - 4.0).abs() < 1e-12);
    }

    #[test]
    fn coincident_centres_do_not_nudge() {
        let mut world = World::new();
        spawn_shape(
            &mut world,
            10.0,
            10.0,
            Shape::circle(48.0, Color::WHITE).with_reaction(Reaction::AttractTo { strength: 0.5 }),
        );
        let fly = spawn_shape(&mut world, 10.0, 10.0, Shape::circle(4.0, Color::WHITE));
        let mut cmds = CommandBuffer::new();
        resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);
        let p = world.get(fly).unwrap().position();
        assert!(p.x.is_finite() && p.y.is_finite());
        assert_eq!(p, Vec2::new(10.0, 10.0));
    }

    #[test]
    fn removal_is_deferred_until_apply() {
        let mut world = World::new();
        let spark = spawn_shape(
            &mut world,
            0.0,
            0.0,
            Shape::circle(8.0, Color::WHITE)
                .with_reaction(Reaction::RemoveSelf)
                .with_reaction(Reaction::IncrementCounter(Counter::Sparks)),
        );
        let fly = spawn_shape(&mut world, 2.0, 0.0, Shape::circle(4.0, Color::WHITE));
        // A second collector touching the spark later in the same pass.
        let other_fly = spawn_shape(&mut world, -2.0, 0.0, Shape::circle(4.0, Color::WHITE));

        let mut cmds = CommandBuffer::new();
        resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);

        // The spark was still collidable for both flies in this pass.
        assert_eq!(world.get(fly).unwrap().stats.sparks, 1);
        assert_eq!(world.get(other_fly).unwrap().stats.sparks, 1);
        assert!(world.contains(spark));
        assert_eq!(cmds.len(), 2);

        cmds.apply(&mut world);
        assert!(!world.contains(spark));
        assert_eq!(cmds.last_apply_report().success_count, 1);
    }
}
