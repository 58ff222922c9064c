//! Stateless overlap predicates for circles and axis-aligned boxes.
//!
//! Boxes are described by their *centre* and full width/height. Callers pass
//! dimensions that are already multiplied by the owning entity's scale.
//!
//! # Box/box policy
//!
//! The arcade game these predicates were lifted from shipped an AABB test
//! whose y-axis lower bound compared box A's far edge against box B's extent
//! field instead of box B's y coordinate, and which read `(x, y)` as a corner.
//! [`BoxOverlap::Legacy`] reproduces that formula literally;
//! [`BoxOverlap::Corrected`] is the centre-based test. Every box the game
//! itself builds is square and mutually ignored, so the policy only changes
//! results for API users mixing box shapes.

use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Vec2
// ---------------------------------------------------------------------------

/// A 2D vector in canvas pixels (y grows downward).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Vec2 {
    /// The origin.
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    /// Construct a vector.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean length.
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero-length (or
    /// non-finite) vector.
    pub fn normalized(self) -> Option<Vec2> {
        let len = self.length();
        if len == 0.0 || !len.is_finite() {
            return None;
        }
        Some(Vec2::new(self.x / len, self.y / len))
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

/// A circle given by centre and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    /// Centre point.
    pub center: Vec2,
    /// Radius; contact is inclusive at exactly this distance.
    pub radius: f64,
}

impl Circle {
    /// Circle at `center` with `radius`.
    pub fn new(center: Vec2, radius: f64) -> Self {
        Self { center, radius }
    }
}

/// An axis-aligned box given by centre and full extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Centre point.
    pub center: Vec2,
    /// Full width, not the half-extent.
    pub width: f64,
    /// Full height, not the half-extent.
    pub height: f64,
}

impl Aabb {
    /// Box centred on `center` spanning `width` by `height`.
    pub fn new(center: Vec2, width: f64, height: f64) -> Self {
        Self {
            center,
            width,
            height,
        }
    }

    /// A zero-size box at `point`.
    pub fn point(point: Vec2) -> Self {
        Self::new(point, 0.0, 0.0)
    }
}

/// Which box/box overlap formula to use. See the module docs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoxOverlap {
    /// Centre-based AABB test on both axes.
    #[default]
    Corrected,
    /// The original game's formula, kept bug-for-bug.
    Legacy,
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// `true` iff the squared centre distance is at most `(r1 + r2)^2`.
pub fn circle_intersects_circle(a: Circle, b: Circle) -> bool {
    let radii = a.radius + b.radius;
    (a.center - b.center).length_squared() <= radii * radii
}

/// Clamp the circle centre into the box to find the closest point, then
/// compare the squared distance to it against `r^2`.
pub fn circle_intersects_box(circle: Circle, aabb: Aabb) -> bool {
    let half_w = aabb.width / 2.0;
    let half_h = aabb.height / 2.0;
    let closest = Vec2::new(
        circle
            .center
            .x
            .min(aabb.center.x + half_w)
            .max(aabb.center.x - half_w),
        circle
            .center
            .y
            .min(aabb.center.y + half_h)
            .max(aabb.center.y - half_h),
    );
    (circle.center - closest).length_squared() <= circle.radius * circle.radius
}

/// AABB overlap under the chosen [`BoxOverlap`] policy. Touching edges count
/// as overlapping under both policies.
pub fn box_intersects_box(a: Aabb, b: Aabb, policy: BoxOverlap) -> bool {
    match policy {
        BoxOverlap::Corrected => {
            let dx = (a.center.x - b.center.x).abs();
            let dy = (a.center.y - b.center.y).abs();
            dx <= (a.width + b.width) / 2.0 && dy <= (a.height + b.height) / 2.0
        }
        BoxOverlap::Legacy => {
            let (ax, ay) = (a.center.x, a.center.y);
            let (bx, by) = (b.center.x, b.center.y);
            let overlap_x = ax + a.width >= bx && bx + b.width >= ax;
            // B's extent stands where B's y coordinate belongs.
            let overlap_y = ay + a.height >= b.height && by + b.height >= ay;
            overlap_x && overlap_y
        }
    }
}

/// Point containment, expressed as a box test against a zero-size box.
pub fn point_in_box(point: Vec2, aabb: Aabb, policy: BoxOverlap) -> bool {
    box_intersects_box(Aabb::point(point), aabb, policy)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
