//! Entity prefabs: the player fly and the four tile hazards.
//!
//! Every builder returns an unregistered [`Entity`] with a freshly minted id;
//! the caller decides when it enters the world (the level builder inserts the
//! fly last, after the hazards have been made to ignore each other).

use sparkfly_ecs::prelude::*;

/// Fly collision radius.
pub const FLY_RADIUS: f64 = 4.0;
/// Fly movement per frame per held direction.
pub const FLY_SPEED: f64 = 3.0;
/// Spark collision radius.
pub const SPARK_RADIUS: f64 = 8.0;
/// Side of an insulator (wall) box.
pub const INSULATOR_SIZE: f64 = 16.0;
/// Radius of the minus and plus charge fields.
pub const CHARGE_RADIUS: f64 = 48.0;
/// Per-frame push of a minus field.
pub const MINUS_STRENGTH: f64 = 0.1;
/// Per-frame pull of a plus field.
pub const PLUS_STRENGTH: f64 = 0.5;

/// The player: arrow/WASD control, a constant downward drift, and a caption
/// showing the sparks collected on the current level.
pub fn fly(world: &mut World, position: Vec2) -> Entity {
    world
        .create(position)
        .with(Shape::circle(FLY_RADIUS, Color::WHITE).with_texture(TextureId::Fly))
        .with(Controller::new(FLY_SPEED))
        .with(Drift::new(Vec2::new(0.0, 1.0), 1.0))
        .with(
            Label::new(
                LabelText::Counter {
                    prefix: "Sparks: ".to_owned(),
                    counter: Counter::Sparks,
                },
                Vec2::new(0.0, -16.0),
                Color::WHITE,
            )
            .with_size(15)
            .centered(),
        )
}

/// A collectible: disappears and credits whoever touched it.
pub fn spark(world: &mut World, position: Vec2) -> Entity {
    world.create(position).with(
        Shape::circle(SPARK_RADIUS, Color::WHITE)
            .with_texture(TextureId::Spark)
            .with_reaction(Reaction::RemoveSelf)
            .with_reaction(Reaction::IncrementCounter(Counter::Sparks)),
    )
}

/// A wall: sends whoever touched it back to their start and counts a death.
pub fn insulator(world: &mut World, position: Vec2) -> Entity {
    world.create(position).with(
        Shape::rect(INSULATOR_SIZE, INSULATOR_SIZE, Color::WHITE)
            .with_texture(TextureId::Insulator)
            .with_reaction(Reaction::RespawnAtStart)
            .with_reaction(Reaction::IncrementCounter(Counter::Deaths)),
    )
}

/// A repelling charge field.
pub fn minus(world: &mut World, position: Vec2) -> Entity {
    world.create(position).with(
        Shape::circle(CHARGE_RADIUS, Color::WHITE)
            .with_texture(TextureId::Minus)
            .with_reaction(Reaction::RepelFrom {
                strength: MINUS_STRENGTH,
            }),
    )
}

/// An attracting charge field.
pub fn plus(world: &mut World, position: Vec2) -> Entity {
    world.create(position).with(
        Shape::circle(CHARGE_RADIUS, Color::WHITE)
            .with_texture(TextureId::Plus)
            .with_reaction(Reaction::AttractTo {
                strength: PLUS_STRENGTH,
            }),
    )
}
