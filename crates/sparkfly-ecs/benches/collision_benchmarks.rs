//! Collision pass benchmark.
//!
//! The pass is a brute-force ordered-pair sweep, so its cost grows with the
//! square of the entity count. A 30x30 level holds well under a few hundred
//! shaped entities; these benchmarks bracket that range.
//!
//! Run with: `cargo bench --bench collision_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use sparkfly_ecs::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A grid of alternating circles and boxes, 16 units apart, plus one player
/// circle inserted last.
fn setup_world(entity_count: usize) -> World {
    let mut world = World::new();
    let side = (entity_count as f64).sqrt().ceil() as usize;
    for i in 0..entity_count {
        let pos = Vec2::new((i % side) as f64 * 16.0 + 8.0, (i / side) as f64 * 16.0 + 8.0);
        let shape = if i % 2 == 0 {
            Shape::circle(8.0, Color::WHITE).with_reaction(Reaction::IncrementCounter(Counter::Sparks))
        } else {
            Shape::rect(16.0, 16.0, Color::WHITE).with_reaction(Reaction::RespawnAtStart)
        };
        let e = world.create(pos).with(shape);
        world.insert(e).unwrap();
    }
    world.ignore_all_pairs();
    let player = world
        .create(Vec2::new(8.0, 8.0))
        .with(Shape::circle(4.0, Color::WHITE));
    world.insert(player).unwrap();
    world
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_collisions");
    for count in [64usize, 256, 900] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut world = setup_world(count);
            let mut cmds = CommandBuffer::new();
            b.iter(|| {
                let report = resolve_collisions(&mut world, &mut cmds, BoxOverlap::Corrected);
                cmds.clear();
                black_box(report.pairs_tested)
            });
        });
    }
    group.finish();
}

fn bench_update_all(c: &mut Criterion) {
    let mut world = setup_world(900);
    let input = InputFrame::new();
    c.bench_function("update_all_900", |b| {
        b.iter(|| world.update_all(black_box(&input)));
    });
}

criterion_group!(benches, bench_resolve, bench_update_all);
criterion_main!(benches);
