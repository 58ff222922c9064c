//! Property tests for the overlap predicates and the collision pass.
//!
//! These tests use `proptest` to generate random shapes and layouts and check
//! that symmetry, ignore sets, and deferred removal hold for every one of them.

use proptest::prelude::*;
use sparkfly_ecs::geometry::{
    box_intersects_box, circle_intersects_box, circle_intersects_circle, Aabb, Circle,
};
use sparkfly_ecs::prelude::*;

fn coord() -> impl Strategy<Value = f64> {
    -200.0..200.0f64
}

fn extent() -> impl Strategy<Value = f64> {
    0.5..64.0f64
}

fn circle_strategy() -> impl Strategy<Value = Circle> {
    (coord(), coord(), extent()).prop_map(|(x, y, r)| Circle::new(Vec2::new(x, y), r))
}

fn aabb_strategy() -> impl Strategy<Value = Aabb> {
    (coord(), coord(), extent(), extent()).prop_map(|(x, y, w, h)| Aabb::new(Vec2::new(x, y), w, h))
}

/// A spark-like collectible: removes itself and bumps the toucher's counter.
fn collectible(world: &mut World, pos: Vec2, radius: f64) -> EntityId {
    let e = world.create(pos).with(
        Shape::circle(radius, Color::WHITE)
            .with_reaction(Reaction::RemoveSelf)
            .with_reaction(Reaction::IncrementCounter(Counter::Sparks)),
    );
    world.insert(e).unwrap()
}

proptest! {
    #[test]
    fn circle_overlap_is_symmetric(a in circle_strategy(), b in circle_strategy()) {
        prop_assert_eq!(circle_intersects_circle(a, b), circle_intersects_circle(b, a));
    }

    #[test]
    fn corrected_box_overlap_is_symmetric(a in aabb_strategy(), b in aabb_strategy()) {
        prop_assert_eq!(
            box_intersects_box(a, b, BoxOverlap::Corrected),
            box_intersects_box(b, a, BoxOverlap::Corrected)
        );
    }

    #[test]
    fn circle_at_box_center_always_hits(c in circle_strategy(), w in extent(), h in extent()) {
        let aabb = Aabb::new(c.center, w, h);
        prop_assert!(circle_intersects_box(c, aabb));
    }

    #[test]
    fn ignored_direction_never_fires(
        ax in coord(), ay in coord(),
        dx in -4.0..4.0f64, dy in -4.0..4.0f64,
    ) {
        let mut world = World::new();
        let a = collectible(&mut world, Vec2::new(ax, ay), 8.0);
        let b = collectible(&mut world, Vec2::new(ax + dx, ay + dy), 8.0);
        world.get_mut(a).unwrap().shape_mut().unwrap().ignore(b);

        let mut cmds = CommandBuffer::new();
        let report = resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);

        let a_on_b = Contact { reactor: a, other: b };
        let b_on_a = Contact { reactor: b, other: a };
        prop_assert!(!report.contacts.contains(&a_on_b));
        prop_assert!(report.contacts.contains(&b_on_a));
        prop_assert_eq!(report.pairs_ignored, 1);
        prop_assert_eq!(world.get(a).unwrap().stats.sparks, 1);
        prop_assert_eq!(world.get(b).unwrap().stats.sparks, 0);
    }

    #[test]
    fn removals_wait_for_apply(count in 1usize..12, spread in 0.0..6.0f64) {
        let mut world = World::new();
        let ids: Vec<EntityId> = (0..count)
            .map(|i| collectible(&mut world, Vec2::new(i as f64 * spread, 0.0), 4.0))
            .collect();

        let mut cmds = CommandBuffer::new();
        let report = resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);

        // Every entity is still registered until the buffer is applied.
        prop_assert_eq!(world.len(), count);
        let mut reactors: Vec<EntityId> = report.contacts.iter().map(|c| c.reactor).collect();
        reactors.sort();
        reactors.dedup();

        cmds.apply(&mut world);
        for id in &ids {
            prop_assert_eq!(world.contains(*id), !reactors.contains(id));
        }
    }
}
