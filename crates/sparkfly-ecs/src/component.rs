//! Component kinds and their per-frame `update`/`draw` hooks.
//!
//! Components form a closed set ([`Component`]) dispatched by `match`.
//! Collision callbacks are data, not closures: a [`Shape`] carries a list of
//! [`Reaction`]s that the collision engine applies in order when the shape
//! touches another one.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::canvas::{Canvas, Color, TextureId};
use crate::entity::{EntityId, EntityStats, Transform};
use crate::geometry::{Aabb, Circle, Vec2};
use crate::input::{InputFrame, Key};

// ---------------------------------------------------------------------------
// ComponentKind
// ---------------------------------------------------------------------------

/// Discriminant of a [`Component`]. The derived order is the dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Shape,
    Controller,
    Label,
    Drift,
}

impl ComponentKind {
    /// Lowercase name used in logs and error messages.
    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Shape => "shape",
            ComponentKind::Controller => "controller",
            ComponentKind::Label => "label",
            ComponentKind::Drift => "drift",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

/// One behaviour unit attached to an entity.
#[derive(Debug, Clone)]
pub enum Component {
    Shape(Shape),
    Controller(Controller),
    Label(Label),
    Drift(Drift),
}

impl Component {
    /// The discriminant of this component.
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Shape(_) => ComponentKind::Shape,
            Component::Controller(_) => ComponentKind::Controller,
            Component::Label(_) => ComponentKind::Label,
            Component::Drift(_) => ComponentKind::Drift,
        }
    }

    /// Per-frame update. Only Controller and Drift move the entity.
    pub fn update(&self, transform: &mut Transform, input: &InputFrame) {
        match self {
            Component::Controller(controller) => controller.update(transform, input),
            Component::Drift(drift) => drift.update(transform),
            Component::Shape(_) | Component::Label(_) => {}
        }
    }

    /// Per-frame draw. Controller and Drift are invisible.
    pub fn draw(&self, transform: &Transform, stats: &EntityStats, canvas: &mut dyn Canvas) {
        match self {
            Component::Shape(shape) => shape.draw(transform, canvas),
            Component::Label(label) => label.draw(transform, stats, canvas),
            Component::Controller(_) | Component::Drift(_) => {}
        }
    }
}

impl From<Shape> for Component {
    fn from(shape: Shape) -> Self {
        Component::Shape(shape)
    }
}

impl From<Controller> for Component {
    fn from(controller: Controller) -> Self {
        Component::Controller(controller)
    }
}

impl From<Label> for Component {
    fn from(label: Label) -> Self {
        Component::Label(label)
    }
}

impl From<Drift> for Component {
    fn from(drift: Drift) -> Self {
        Component::Drift(drift)
    }
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// Collision geometry in unscaled units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Circle around the entity position.
    Circle { radius: f64 },
    /// Box centred on the entity position, full extents.
    Box { width: f64, height: f64 },
}

/// Counters a reaction can bump on the other entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Counter {
    Sparks,
    Deaths,
}

/// What happens when this shape touches another one.
///
/// "Self" is the entity owning the shape; "other" is the entity it touched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Reaction {
    /// Queue self for removal at the end of the frame.
    RemoveSelf,
    /// Queue other for removal at the end of the frame.
    RemoveOther,
    /// Bump a counter on other.
    IncrementCounter(Counter),
    /// Teleport other back to its start position.
    RespawnAtStart,
    /// Nudge other away from self by `strength` along the unit separation.
    RepelFrom { strength: f64 },
    /// Nudge other toward self by `strength` along the unit separation.
    AttractTo { strength: f64 },
}

/// Scaled geometry of a shape placed in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placed {
    Circle(Circle),
    Box(Aabb),
}

/// Collision geometry, appearance, ignore set, and collision reactions.
#[derive(Debug, Clone)]
pub struct Shape {
    /// Unscaled geometry.
    pub kind: ShapeKind,
    /// Fill colour when no texture is set.
    pub color: Color,
    /// Sprite drawn instead of the filled shape.
    pub texture: Option<TextureId>,
    /// Fired in order on every contact where this shape's owner is self.
    pub reactions: Vec<Reaction>,
    ignored: HashSet<EntityId>,
}

impl Shape {
    /// Untextured shape with no reactions and an empty ignore set.
    pub fn new(kind: ShapeKind, color: Color) -> Self {
        Self {
            kind,
            color,
            texture: None,
            reactions: Vec::new(),
            ignored: HashSet::new(),
        }
    }

    /// Shorthand for a [`ShapeKind::Circle`].
    pub fn circle(radius: f64, color: Color) -> Self {
        Self::new(ShapeKind::Circle { radius }, color)
    }

    /// Shorthand for a [`ShapeKind::Box`].
    pub fn rect(width: f64, height: f64, color: Color) -> Self {
        Self::new(ShapeKind::Box { width, height }, color)
    }

    /// Draw `texture` instead of the filled shape.
    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.texture = Some(texture);
        self
    }

    /// Append a reaction; reactions fire in the order they were added.
    pub fn with_reaction(mut self, reaction: Reaction) -> Self {
        self.reactions.push(reaction);
        self
    }

    /// Never collide this shape against `entity`. One-directional: `entity`
    /// may still collide against this shape's owner.
    pub fn ignore(&mut self, entity: EntityId) {
        self.ignored.insert(entity);
    }

    /// Whether contacts against `entity` are skipped.
    pub fn ignores(&self, entity: EntityId) -> bool {
        self.ignored.contains(&entity)
    }

    /// Size of the ignore set.
    pub fn ignored_count(&self) -> usize {
        self.ignored.len()
    }

    /// Geometry with the entity's scale applied.
    pub fn placed(&self, transform: &Transform) -> Placed {
        let scale = transform.scale;
        match self.kind {
            ShapeKind::Circle { radius } => {
                Placed::Circle(Circle::new(transform.position, radius * scale))
            }
            ShapeKind::Box { width, height } => Placed::Box(Aabb::new(
                transform.position,
                width * scale,
                height * scale,
            )),
        }
    }

    fn draw(&self, transform: &Transform, canvas: &mut dyn Canvas) {
        if let Some(texture) = self.texture {
            canvas.draw_texture(transform.position, texture, true);
            return;
        }
        match self.placed(transform) {
            Placed::Circle(c) => canvas.draw_circle(c.center, c.radius, self.color),
            Placed::Box(b) => canvas.draw_box(b.center, b.width, b.height, self.color, true),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Moves the entity by `speed` per frame along each held direction key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Controller {
    /// Pixels per frame per held direction.
    pub speed: f64,
}

impl Controller {
    /// Controller moving `speed` pixels per frame.
    pub fn new(speed: f64) -> Self {
        Self { speed }
    }

    fn update(&self, transform: &mut Transform, input: &InputFrame) {
        let held = |a: Key, b: Key| input.is_key_down(a) || input.is_key_down(b);
        let pos = &mut transform.position;
        if held(Key::W, Key::Up) {
            pos.y -= self.speed;
        }
        if held(Key::S, Key::Down) {
            pos.y += self.speed;
        }
        if held(Key::A, Key::Left) {
            pos.x -= self.speed;
        }
        if held(Key::D, Key::Right) {
            pos.x += self.speed;
        }
    }
}

// ---------------------------------------------------------------------------
// Label
// ---------------------------------------------------------------------------

/// What a [`Label`] shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelText {
    /// Fixed text.
    Static(String),
    /// `prefix` followed by the live value of one of the entity's counters.
    Counter { prefix: String, counter: Counter },
}

/// Text drawn at an offset from the entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    /// What to show.
    pub text: LabelText,
    /// Draw position relative to the entity.
    pub offset: Vec2,
    /// Text colour.
    pub color: Color,
    /// Font size in points.
    pub size: u32,
    /// Whether `offset` marks the middle of the text rather than its corner.
    pub centered: bool,
}

impl Label {
    /// Default font size.
    pub const DEFAULT_SIZE: u32 = 20;

    /// Left-aligned label at [`DEFAULT_SIZE`](Self::DEFAULT_SIZE).
    pub fn new(text: LabelText, offset: Vec2, color: Color) -> Self {
        Self {
            text,
            offset,
            color,
            size: Self::DEFAULT_SIZE,
            centered: false,
        }
    }

    /// Override the font size.
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Centre the text on its anchor.
    pub fn centered(mut self) -> Self {
        self.centered = true;
        self
    }

    /// The string to draw for an entity with these `stats`.
    pub fn render_text(&self, stats: &EntityStats) -> String {
        match &self.text {
            LabelText::Static(text) => text.clone(),
            LabelText::Counter { prefix, counter } => format!("{prefix}{}", stats.get(*counter)),
        }
    }

    fn draw(&self, transform: &Transform, stats: &EntityStats, canvas: &mut dyn Canvas) {
        canvas.draw_text(
            &self.render_text(stats),
            transform.position + self.offset,
            self.size,
            self.color,
            self.centered,
        );
    }
}

// ---------------------------------------------------------------------------
// Drift
// ---------------------------------------------------------------------------

/// Constant per-frame motion: `direction * speed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Drift {
    /// Direction of travel; not normalized.
    pub direction: Vec2,
    /// Multiplier on `direction` each frame.
    pub speed: f64,
}

impl Drift {
    /// Drift along `direction` at `speed`.
    pub fn new(direction: Vec2, speed: f64) -> Self {
        Self { direction, speed }
    }

    fn update(&self, transform: &mut Transform) {
        transform.position += self.direction * self.speed;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Calls(Vec<String>);

    impl Canvas for Calls {
        fn clear(&mut self, _color: Color) {
            self.0.push("clear".into());
        }
        fn draw_circle(&mut self, center: Vec2, radius: f64, _color: Color) {
            self.0.push(format!("circle {} {} {}", center.x, center.y, radius));
        }
        fn draw_box(&mut self, p: Vec2, w: f64, h: f64, _color: Color, centered: bool) {
            self.0.push(format!("box {} {} {w} {h} {centered}", p.x, p.y));
        }
        fn draw_line(&mut self, _s: Vec2, _e: Vec2, _color: Color, _t: f64) {
            self.0.push("line".into());
        }
        fn draw_text(&mut self, text: &str, p: Vec2, size: u32, _color: Color, centered: bool) {
            self.0.push(format!("text {text} {} {} {size} {centered}", p.x, p.y));
        }
        fn draw_texture(&mut self, p: Vec2, texture: TextureId, centered: bool) {
            self.0.push(format!("texture {texture:?} {} {} {centered}", p.x, p.y));
        }
    }

    fn transform(x: f64, y: f64, scale: f64) -> Transform {
        Transform {
            position: Vec2::new(x, y),
            scale,
        }
    }

    #[test]
    fn placed_geometry_is_scaled() {
        let circle = Shape::circle(4.0, Color::WHITE);
        assert_eq!(
            circle.placed(&transform(1.0, 2.0, 2.5)),
            Placed::Circle(Circle::new(Vec2::new(1.0, 2.0), 10.0))
        );
        let rect = Shape::rect(16.0, 8.0, Color::WHITE);
        assert_eq!(
            rect.placed(&transform(0.0, 0.0, 0.5)),
            Placed::Box(Aabb::new(Vec2::ZERO, 8.0, 4.0))
        );
    }

    #[test]
    fn untextured_shape_draws_primitive_centered() {
        let mut calls = Calls::default();
        let shape = Component::from(Shape::rect(16.0, 16.0, Color::WHITE));
        shape.draw(&transform(8.0, 8.0, 2.0), &EntityStats::default(), &mut calls);
        assert_eq!(calls.0, vec!["box 8 8 32 32 true"]);
    }

    #[test]
    fn textured_shape_draws_texture_only() {
        let mut calls = Calls::default();
        let shape = Component::from(Shape::circle(8.0, Color::WHITE).with_texture(TextureId::Spark));
        shape.draw(&transform(3.0, 4.0, 1.0), &EntityStats::default(), &mut calls);
        assert_eq!(calls.0, vec!["texture Spark 3 4 true"]);
    }

    #[test]
    fn counter_label_follows_stats() {
        let label = Label::new(
            LabelText::Counter {
                prefix: "Sparks: ".into(),
                counter: Counter::Sparks,
            },
            Vec2::new(0.0, -16.0),
            Color::WHITE,
        )
        .with_size(15)
        .centered();
        let stats = EntityStats {
            sparks: 7,
            deaths: 0,
        };
        let mut calls = Calls::default();
        Component::from(label).draw(&transform(10.0, 20.0, 1.0), &stats, &mut calls);
        assert_eq!(calls.0, vec!["text Sparks: 7 10 4 15 true"]);
    }

    #[test]
    fn diagonal_input_combines() {
        let mut input = InputFrame::new();
        input.press_key(Key::W);
        input.press_key(Key::Left);
        let mut t = transform(10.0, 10.0, 1.0);
        Component::from(Controller::new(3.0)).update(&mut t, &input);
        assert_eq!(t.position, Vec2::new(7.0, 7.0));
    }

    #[test]
    fn drift_applies_direction_times_speed() {
        let mut t = transform(0.0, 0.0, 1.0);
        let drift = Component::from(Drift::new(Vec2::new(-1.0, 0.5), 2.0));
        drift.update(&mut t, &InputFrame::new());
        drift.update(&mut t, &InputFrame::new());
        assert_eq!(t.position, Vec2::new(-4.0, 2.0));
    }

    #[test]
    fn ignore_is_one_directional() {
        let mut shape = Shape::circle(1.0, Color::WHITE);
        shape.ignore(EntityId::from_raw(3));
        assert!(shape.ignores(EntityId::from_raw(3)));
        assert!(!shape.ignores(EntityId::from_raw(4)));
        assert_eq!(shape.ignored_count(), 1);
    }
}
