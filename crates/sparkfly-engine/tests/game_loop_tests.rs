//! Whole-game runs in headless mode: frame order, level progression and
//! reproducibility.

use sparkfly_engine::level::tile_center;
use sparkfly_engine::prelude::*;

fn headless(seed: u64, level_cap: u32) -> TickLoop {
    TickLoop::new(TickConfig {
        seed: Some(seed),
        level_cap,
        headless: true,
        ..Default::default()
    })
    .unwrap()
}

/// Start at (2, 2) with a spark right next door.
fn one_spark_grid() -> TileGrid {
    TileGrid::from_rows(&["#######", "#.....#", "#.@*..#", "#.....#", "#######"]).unwrap()
}

// ---------------------------------------------------------------------------
// Frame order
// ---------------------------------------------------------------------------

#[test]
fn collected_spark_is_gone_once_the_frame_ends() {
    let mut game = headless(5, 10);
    let grid = TileGrid::from_rows(&[
        "#########",
        "#.......#",
        "#.@*...*#",
        "#.......#",
        "#########",
    ])
    .unwrap();
    game.load_level(&grid).unwrap();
    let spark = game
        .world()
        .iter()
        .find(|e| e.position() == tile_center(3, 2, 16.0))
        .map(|e| e.id())
        .unwrap();
    let before = game.world().len();
    game.input_mut().press_key(Key::Right);

    assert_eq!(game.tick().unwrap(), GamePhase::Running);
    assert!(game.world().contains(spark));
    assert_eq!(game.last_diagnostics().removed, 0);

    assert_eq!(game.tick().unwrap(), GamePhase::Running);
    assert!(!game.world().contains(spark));
    assert_eq!(game.world().len(), before - 1);
    assert_eq!(game.sparks(), 1);
    assert_eq!(game.last_diagnostics().removed, 1);

    // The frame drawn after the purge no longer shows the spark.
    assert_eq!(game.frame().texture_count(TextureId::Spark), 1);
}

// ---------------------------------------------------------------------------
// Progression
// ---------------------------------------------------------------------------

#[test]
fn each_cleared_level_advances_the_counter_by_one() {
    let mut game = headless(33, 10);
    game.input_mut().press_key(Key::D);
    for expected in 1..=3 {
        game.load_level(&one_spark_grid()).unwrap();
        assert_eq!(game.run_ticks(1).unwrap(), 1);
        assert_eq!(game.tick().unwrap(), GamePhase::LevelComplete);
        assert_eq!(game.level(), expected);
        assert_eq!(game.current_level(), expected + 1);
    }
}

#[test]
fn the_cap_level_ends_the_game() {
    let mut game = headless(33, 2);
    game.input_mut().press_key(Key::D);

    game.load_level(&one_spark_grid()).unwrap();
    game.run_ticks(2).unwrap();
    assert_eq!(game.level(), 1);
    assert_eq!(game.phase(), GamePhase::Running);

    game.load_level(&one_spark_grid()).unwrap();
    assert_eq!(game.run_ticks(50).unwrap(), 2);
    assert_eq!(game.phase(), GamePhase::Finished);
    assert_eq!(game.level(), 2);
    assert_eq!(game.current_level(), 2);
    assert_eq!(game.title(), "SparkFly | Level 2 | Deaths 0");
    assert_eq!(game.world().len(), 1);
}

#[test]
fn exit_request_stops_before_the_next_frame() {
    let mut game = headless(1, 10);
    game.run_ticks(3).unwrap();
    game.input_mut().request_exit();
    assert_eq!(game.tick().unwrap(), GamePhase::Exited);
    assert_eq!(game.run_ticks(10).unwrap(), 0);
    assert_eq!(game.tick_count(), 3);
}

// ---------------------------------------------------------------------------
// Reproducibility
// ---------------------------------------------------------------------------

#[test]
fn equal_seeds_and_inputs_give_equal_states() {
    let mut a = headless(77, 10);
    let mut b = headless(77, 10);
    for game in [&mut a, &mut b] {
        game.input_mut().press_key(Key::Left);
        game.run_ticks(15).unwrap();
        game.input_mut().release_key(Key::Left);
        game.input_mut().press_key(Key::Up);
        game.run_ticks(15).unwrap();
    }
    assert_eq!(a.capture_snapshot(), b.capture_snapshot());
    assert_eq!(a.state_hash().unwrap(), b.state_hash().unwrap());
    assert_eq!(a.frame().commands(), b.frame().commands());
}

#[test]
fn seed_is_reported_when_drawn_from_the_os() {
    let game = TickLoop::new(TickConfig {
        headless: true,
        ..Default::default()
    })
    .unwrap();
    let replay = headless(game.seed(), 10);
    assert_eq!(game.state_hash().unwrap(), replay.state_hash().unwrap());
}
