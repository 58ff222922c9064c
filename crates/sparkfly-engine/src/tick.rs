//! The per-frame game loop.
//!
//! The [`TickLoop`] owns the [`World`], the deferred-removal
//! [`CommandBuffer`], the current [`InputFrame`] and the level bookkeeping.
//! Each tick:
//!
//! 1. If the exit flag is set, the loop stops in [`GamePhase::Exited`].
//! 2. Every entity's components run their update hooks (registry order).
//! 3. The collision pass fires shape reactions; removals are only queued.
//! 4. Queued removals are purged in one FIFO pass.
//! 5. If the player holds at least as many sparks as the level had, the
//!    level counter advances and either a new level is generated or, at the
//!    cap, the game is [`GamePhase::Finished`].
//! 6. Edge-triggered input (clicks, pointer velocity) is cleared.
//! 7. The frame is cleared and every entity draws into the frame recorder.
//!
//! Level layouts come from a PCG generator seeded once per game, so a fixed
//! [`TickConfig::seed`] replays the same sequence of levels.
//!
//! # Example
//!
//! ```
//! use sparkfly_engine::tick::{GamePhase, TickConfig, TickLoop};
//! use sparkfly_ecs::input::Key;
//!
//! let mut game = TickLoop::new(TickConfig { seed: Some(1), ..Default::default() }).unwrap();
//! game.input_mut().press_key(Key::Right);
//! assert_eq!(game.tick().unwrap(), GamePhase::Running);
//!
//! game.input_mut().request_exit();
//! assert_eq!(game.tick().unwrap(), GamePhase::Exited);
//! ```

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use sparkfly_ecs::canvas::{Canvas, Color};
use sparkfly_ecs::collision::resolve_collisions;
use sparkfly_ecs::command::CommandBuffer;
use sparkfly_ecs::entity::{EntityId, EntityStats};
use sparkfly_ecs::geometry::{BoxOverlap, Vec2};
use sparkfly_ecs::input::InputFrame;
use sparkfly_ecs::world::World;

use crate::level::{build_level, LevelSummary, TileGrid};
use crate::prefab;
use crate::render::FrameRecorder;
use crate::EngineError;

// ---------------------------------------------------------------------------
// TickConfig
// ---------------------------------------------------------------------------

/// Configuration for a game.
///
/// The play field is `canvas_width` x `canvas_height` pixels, split into
/// square tiles of `tile_size`; the window shows it scaled by `pixel_scale`.
#[derive(Debug, Clone)]
pub struct TickConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Window pixels per canvas pixel.
    pub pixel_scale: u32,
    pub tile_size: u32,
    /// Number of levels to complete before the game is finished.
    pub level_cap: u32,
    /// Seed for the level sequence. `None` draws one from the OS RNG.
    pub seed: Option<u64>,
    /// Box/box overlap rule used by the collision pass.
    pub box_overlap: BoxOverlap,
    pub clear_color: Color,
    /// Headless mode: no window, tick as fast as the caller asks.
    pub headless: bool,
}

impl Default for TickConfig {
    /// A 480x480 canvas of 16px tiles (30x30 grid), doubled on screen, ten
    /// levels.
    fn default() -> Self {
        Self {
            canvas_width: 480,
            canvas_height: 480,
            pixel_scale: 2,
            tile_size: 16,
            level_cap: 10,
            seed: None,
            box_overlap: BoxOverlap::Corrected,
            clear_color: Color::BLACK,
            headless: false,
        }
    }
}

impl TickConfig {
    /// Grid columns.
    pub fn map_width(&self) -> usize {
        self.canvas_width.checked_div(self.tile_size).unwrap_or(0) as usize
    }

    /// Grid rows.
    pub fn map_height(&self) -> usize {
        self.canvas_height.checked_div(self.tile_size).unwrap_or(0) as usize
    }

    /// Window size in physical pixels.
    pub fn window_size(&self) -> (u32, u32) {
        (
            self.canvas_width.saturating_mul(self.pixel_scale),
            self.canvas_height.saturating_mul(self.pixel_scale),
        )
    }

    /// Reject values the game cannot run with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.tile_size == 0 {
            return Err(EngineError::InvalidConfig("tile_size must be positive".into()));
        }
        if self.pixel_scale == 0 {
            return Err(EngineError::InvalidConfig("pixel_scale must be positive".into()));
        }
        if self.level_cap == 0 {
            return Err(EngineError::InvalidConfig("level_cap must be at least 1".into()));
        }
        let (width, height) = (self.map_width(), self.map_height());
        if width < 3 || height < 3 {
            return Err(EngineError::GridTooSmall { width, height });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// Where the game stands after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Running,
    /// A level was completed this tick and the next one is already loaded.
    /// Only ever returned by [`TickLoop::tick`]; the stored phase goes back
    /// to `Running`.
    LevelComplete,
    /// The level cap was reached.
    Finished,
    /// The user asked to quit.
    Exited,
}

impl GamePhase {
    /// Whether further ticks are no-ops.
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Finished | GamePhase::Exited)
    }
}

// ---------------------------------------------------------------------------
// TickDiagnostics
// ---------------------------------------------------------------------------

/// Timing and counts for the last tick.
#[derive(Debug, Clone, Default)]
pub struct TickDiagnostics {
    pub update_time: Duration,
    pub collision_time: Duration,
    /// Time spent purging deferred removals.
    pub command_apply_time: Duration,
    pub draw_time: Duration,
    pub total_time: Duration,
    /// Ordered pairs whose reactions fired.
    pub contacts: usize,
    pub pairs_tested: usize,
    /// Entities actually removed by the purge.
    pub removed: usize,
}

// ---------------------------------------------------------------------------
// TickLoop
// ---------------------------------------------------------------------------

/// The game: world, player, level progression and the frame it last drew.
pub struct TickLoop {
    world: World,
    command_buffer: CommandBuffer,
    input: InputFrame,
    config: TickConfig,
    player: EntityId,
    /// Levels completed so far.
    level: u32,
    summary: LevelSummary,
    phase: GamePhase,
    seed: u64,
    rng: Pcg64Mcg,
    tick_counter: u64,
    frame: FrameRecorder,
    last_diagnostics: TickDiagnostics,
}

impl TickLoop {
    /// Validate `config`, create the player and generate the first level.
    pub fn new(config: TickConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!(seed, levels = config.level_cap, "starting game");

        let mut world = World::new();
        let player = prefab::fly(&mut world, Vec2::ZERO);
        let player_id = world.insert(player)?;

        let mut game = Self {
            world,
            command_buffer: CommandBuffer::new(),
            input: InputFrame::new(),
            config,
            player: player_id,
            level: 0,
            summary: LevelSummary {
                total_sparks: 0,
                start: Vec2::ZERO,
                hazards: 0,
            },
            phase: GamePhase::Running,
            seed,
            rng: Pcg64Mcg::seed_from_u64(seed),
            tick_counter: 0,
            frame: FrameRecorder::new(),
            last_diagnostics: TickDiagnostics::default(),
        };
        game.start_level()?;
        Ok(game)
    }

    /// Replace the current level with `grid`. The player keeps its id and
    /// death count; the level counter is unchanged.
    pub fn load_level(&mut self, grid: &TileGrid) -> Result<LevelSummary, EngineError> {
        if grid.player_start().is_none() {
            return Err(EngineError::InvalidGrid("no player start cell".to_owned()));
        }
        let player = self.take_player()?;
        self.world.clear();
        self.command_buffer.clear();
        self.summary = build_level(
            &mut self.world,
            grid,
            player,
            f64::from(self.config.tile_size),
        )?;
        Ok(self.summary)
    }

    /// Execute one frame. Returns the phase the game is in afterwards, or
    /// [`GamePhase::LevelComplete`] if a new level was loaded this tick.
    ///
    /// Once the game is finished or exited, further calls do nothing.
    pub fn tick(&mut self) -> Result<GamePhase, EngineError> {
        if self.phase.is_terminal() {
            return Ok(self.phase);
        }
        if self.input.exit_requested() {
            info!(level = self.current_level(), ticks = self.tick_counter, "exit requested");
            self.phase = GamePhase::Exited;
            return Ok(self.phase);
        }
        let tick_start = Instant::now();

        // Phase 1: component updates.
        let update_start = Instant::now();
        self.world.update_all(&self.input);
        let update_time = update_start.elapsed();

        // Phase 2: collisions. Removals are only queued.
        let collision_start = Instant::now();
        let report = resolve_collisions(
            &mut self.world,
            &mut self.command_buffer,
            self.config.box_overlap,
        );
        let collision_time = collision_start.elapsed();

        // Phase 3: purge.
        let apply_start = Instant::now();
        let applied = self.command_buffer.apply(&mut self.world);
        let command_apply_time = apply_start.elapsed();

        // Phase 4: level progression.
        let outcome = self.check_level_complete()?;

        // Phase 5: input edges.
        self.input.clear_edges();

        // Phase 6: draw.
        let draw_start = Instant::now();
        self.frame.clear(self.config.clear_color);
        self.world.draw_all(&mut self.frame);
        let draw_time = draw_start.elapsed();

        self.tick_counter += 1;
        self.last_diagnostics = TickDiagnostics {
            update_time,
            collision_time,
            command_apply_time,
            draw_time,
            total_time: tick_start.elapsed(),
            contacts: report.contacts.len(),
            pairs_tested: report.pairs_tested,
            removed: applied.iter().filter(|c| c.applied_successfully).count(),
        };
        Ok(outcome)
    }

    /// Run up to `count` ticks, stopping early once the game is finished or
    /// exited. Returns the number of ticks executed.
    pub fn run_ticks(&mut self, count: u64) -> Result<u64, EngineError> {
        let mut executed = 0;
        for _ in 0..count {
            if self.phase.is_terminal() {
                break;
            }
            self.tick()?;
            executed += 1;
        }
        Ok(executed)
    }

    fn check_level_complete(&mut self) -> Result<GamePhase, EngineError> {
        let stats = self.player_stats()?;
        if stats.sparks < self.summary.total_sparks {
            return Ok(GamePhase::Running);
        }
        self.level += 1;
        info!(
            level = self.level,
            sparks = stats.sparks,
            deaths = stats.deaths,
            "level complete"
        );

        if self.level < self.config.level_cap {
            self.start_level()?;
            return Ok(GamePhase::LevelComplete);
        }

        // Keep the player alone in the world so its final stats stay readable.
        let player = self.take_player()?;
        self.world.clear();
        self.command_buffer.clear();
        self.world.insert(player)?;
        self.phase = GamePhase::Finished;
        info!(levels = self.level, deaths = stats.deaths, "all levels complete");
        Ok(GamePhase::Finished)
    }

    /// Generate the next layout from the game RNG and load it.
    fn start_level(&mut self) -> Result<(), EngineError> {
        let level_seed: u64 = self.rng.gen();
        let grid = TileGrid::generate_seeded(
            self.config.map_width(),
            self.config.map_height(),
            level_seed,
        )?;
        debug!(level = self.level, seed = level_seed, "generating level");
        self.load_level(&grid)?;
        Ok(())
    }

    fn take_player(&mut self) -> Result<sparkfly_ecs::entity::Entity, EngineError> {
        self.world
            .despawn(self.player)
            .map_err(|_| EngineError::MissingPlayer {
                entity: self.player,
            })
    }

    fn player_stats(&self) -> Result<EntityStats, EngineError> {
        self.world
            .get(self.player)
            .map(|e| e.stats)
            .ok_or(EngineError::MissingPlayer {
                entity: self.player,
            })
    }

    // -- accessors ----------------------------------------------------------

    /// Number of frames executed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    /// Read-only access to the world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup and tests. During a tick all
    /// removals go through the command buffer.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn input(&self) -> &InputFrame {
        &self.input
    }

    /// Input state for the next tick.
    pub fn input_mut(&mut self) -> &mut InputFrame {
        &mut self.input
    }

    pub fn player(&self) -> EntityId {
        self.player
    }

    /// Levels completed so far.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// One-based number of the level being played, never above the cap.
    pub fn current_level(&self) -> u32 {
        (self.level + 1).min(self.config.level_cap)
    }

    /// Sparks the player must hold to finish the current level.
    pub fn total_sparks(&self) -> u32 {
        self.summary.total_sparks
    }

    pub fn level_summary(&self) -> &LevelSummary {
        &self.summary
    }

    /// Sparks collected on the current level.
    pub fn sparks(&self) -> u32 {
        self.player_stats().map_or(0, |s| s.sparks)
    }

    /// Deaths over the whole game.
    pub fn deaths(&self) -> u32 {
        self.player_stats().map_or(0, |s| s.deaths)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Seed of the level sequence.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Window caption for the current state.
    pub fn title(&self) -> String {
        format!(
            "SparkFly | Level {} | Deaths {}",
            self.current_level(),
            self.deaths()
        )
    }

    /// Draw calls of the last frame.
    pub fn frame(&self) -> &FrameRecorder {
        &self.frame
    }

    /// Diagnostics from the last tick.
    pub fn last_diagnostics(&self) -> &TickDiagnostics {
        &self.last_diagnostics
    }

    /// Whether headless mode is enabled.
    pub fn is_headless(&self) -> bool {
        self.config.headless
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sparkfly_ecs::canvas::TextureId;
    use sparkfly_ecs::input::Key;

    fn seeded(seed: u64) -> TickLoop {
        TickLoop::new(TickConfig {
            seed: Some(seed),
            headless: true,
            ..Default::default()
        })
        .unwrap()
    }

    /// Player two tiles left of a lone spark, away from every wall.
    fn one_spark_grid() -> TileGrid {
        TileGrid::from_rows(&["#######", "#.....#", "#.@*..#", "#.....#", "#######"]).unwrap()
    }

    // -- 1. Config ----------------------------------------------------------

    #[test]
    fn default_config_is_a_30_by_30_grid_in_a_960_window() {
        let config = TickConfig::default();
        assert_eq!((config.map_width(), config.map_height()), (30, 30));
        assert_eq!(config.window_size(), (960, 960));
        assert_eq!(config.level_cap, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let zero_tile = TickConfig {
            tile_size: 0,
            ..Default::default()
        };
        assert!(matches!(zero_tile.validate(), Err(EngineError::InvalidConfig(_))));

        let no_levels = TickConfig {
            level_cap: 0,
            ..Default::default()
        };
        assert!(matches!(no_levels.validate(), Err(EngineError::InvalidConfig(_))));

        let tiny = TickConfig {
            canvas_width: 32,
            ..Default::default()
        };
        assert!(matches!(
            tiny.validate(),
            Err(EngineError::GridTooSmall { width: 2, height: 30 })
        ));
        assert!(TickLoop::new(tiny).is_err());
    }

    // -- 2. Startup ---------------------------------------------------------

    #[test]
    fn new_game_inserts_player_last_with_no_sparks() {
        let game = seeded(5);
        assert_eq!(game.world().ids().last(), Some(game.player()));
        assert_eq!(game.sparks(), 0);
        assert_eq!(game.level(), 0);
        assert_eq!(game.phase(), GamePhase::Running);
        assert_eq!(game.title(), "SparkFly | Level 1 | Deaths 0");
    }

    #[test]
    fn same_seed_same_first_level() {
        let a = seeded(99);
        let b = seeded(99);
        assert_eq!(a.total_sparks(), b.total_sparks());
        assert_eq!(a.level_summary(), b.level_summary());
        assert_eq!(a.world().len(), b.world().len());
    }

    // -- 3. Frame pipeline --------------------------------------------------

    #[test]
    fn tick_draws_every_entity_after_a_clear() {
        let mut game = seeded(3);
        game.tick().unwrap();
        let frame = game.frame();
        assert!(matches!(frame.commands()[0], crate::render::DrawCommand::Clear(_)));
        assert_eq!(frame.texture_count(TextureId::Fly), 1);
        assert_eq!(
            frame.texture_count(TextureId::Spark) as u32,
            game.total_sparks() - game.sparks()
        );
        let caption = format!("Sparks: {}", game.sparks());
        assert_eq!(frame.texts().collect::<Vec<_>>(), vec![caption.as_str()]);
    }

    #[test]
    fn clicks_last_one_tick() {
        let mut game = seeded(3);
        game.input_mut().press_key(Key::Space);
        assert!(game.input().is_key_clicked(Key::Space));
        game.tick().unwrap();
        assert!(!game.input().is_key_clicked(Key::Space));
        assert!(game.input().is_key_down(Key::Space));
    }

    #[test]
    fn exit_flag_stops_the_loop() {
        let mut game = seeded(3);
        game.run_ticks(3).unwrap();
        game.input_mut().request_exit();
        assert_eq!(game.tick().unwrap(), GamePhase::Exited);
        assert_eq!(game.run_ticks(5).unwrap(), 0);
        assert_eq!(game.tick_count(), 3);
    }

    // -- 4. Level progression -----------------------------------------------

    #[test]
    fn collecting_every_spark_advances_exactly_one_level() {
        let mut game = seeded(8);
        game.load_level(&one_spark_grid()).unwrap();
        assert_eq!(game.total_sparks(), 1);
        game.input_mut().press_key(Key::D);

        assert_eq!(game.tick().unwrap(), GamePhase::Running);
        assert_eq!(game.tick().unwrap(), GamePhase::LevelComplete);
        assert_eq!(game.level(), 1);
        assert_eq!(game.phase(), GamePhase::Running);
        assert_eq!(game.sparks(), 0);
        assert_eq!(game.world().ids().last(), Some(game.player()));
        assert_eq!(game.title(), "SparkFly | Level 2 | Deaths 0");
    }

    #[test]
    fn reaching_the_cap_finishes_the_game() {
        let mut game = TickLoop::new(TickConfig {
            seed: Some(8),
            level_cap: 1,
            ..Default::default()
        })
        .unwrap();
        game.load_level(&one_spark_grid()).unwrap();
        game.input_mut().press_key(Key::D);

        assert_eq!(game.run_ticks(10).unwrap(), 2);
        assert_eq!(game.phase(), GamePhase::Finished);
        assert_eq!(game.level(), 1);
        assert_eq!(game.world().len(), 1);
        assert!(game.world().contains(game.player()));
        assert_eq!(game.tick().unwrap(), GamePhase::Finished);
        assert_eq!(game.tick_count(), 2);
    }

    #[test]
    fn walls_respawn_the_player_and_count_deaths() {
        let mut game = seeded(4);
        let grid = TileGrid::from_rows(&["#######", "#@...*#", "#######"]).unwrap();
        let summary = game.load_level(&grid).unwrap();

        // Drift carries the fly one pixel down per tick into the wall below.
        game.run_ticks(4).unwrap();
        let player = game.world().get(game.player()).unwrap();
        assert_eq!(player.position(), summary.start);
        assert_eq!(game.deaths(), 1);
        assert_eq!(game.title(), "SparkFly | Level 1 | Deaths 1");
    }

    #[test]
    fn deaths_persist_across_levels() {
        let mut game = seeded(8);
        let player = game.player();
        game.world_mut().get_mut(player).unwrap().stats.deaths = 6;
        game.load_level(&one_spark_grid()).unwrap();
        game.input_mut().press_key(Key::D);
        game.run_ticks(2).unwrap();
        assert_eq!(game.level(), 1);
        assert_eq!(game.deaths(), 6);
    }

    #[test]
    fn removed_player_is_an_error() {
        let mut game = seeded(2);
        let player = game.player();
        game.world_mut().despawn(player).unwrap();
        assert!(matches!(
            game.tick(),
            Err(EngineError::MissingPlayer { entity }) if entity == player
        ));
    }
}
