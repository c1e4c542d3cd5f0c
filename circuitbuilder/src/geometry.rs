//! Grid geometry
//!
//! Every entity in a circuit lives on a square grid with pitch [`SPACING`].
//! World coordinates are integer pairs; grid coordinates are the same pairs
//! divided by the pitch. Rotation is always by quarter turns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Grid pitch in world units
pub const SPACING: i32 = 50;

/// Largest coordinate magnitude a loaded snapshot may carry, in world units
pub const WORLD_LIMIT: i32 = 1_000_000;

/// A 2D point or displacement in world (or grid) units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert a real-valued pointer position into world units.
    pub fn from_world(x: f64, y: f64) -> Self {
        Self::new(x.round() as i32, y.round() as i32)
    }

    /// Nearest grid-aligned point in world units.
    pub fn snap_to_grid(self) -> Self {
        self.to_grid() * SPACING
    }

    /// Grid cell containing this world point, i.e. `round(self / SPACING)`.
    pub fn to_grid(self) -> Self {
        Self::new(cells(self.x), cells(self.y))
    }

    /// World position of a grid cell.
    pub fn from_grid(cell: Point) -> Self {
        cell * SPACING
    }

    pub fn is_grid_aligned(self) -> bool {
        self.x % SPACING == 0 && self.y % SPACING == 0
    }

    pub fn is_zero(self) -> bool {
        self == Self::ORIGIN
    }

    /// True when both coordinates lie within `±WORLD_LIMIT`.
    pub fn in_world(self) -> bool {
        (-WORLD_LIMIT..=WORLD_LIMIT).contains(&self.x) && (-WORLD_LIMIT..=WORLD_LIMIT).contains(&self.y)
    }

    /// One quarter turn: the row vector `(x, y)` times `[[0, -1], [1, 0]]`.
    pub fn rotate_quarter(self) -> Self {
        Self::new(self.y, -self.x)
    }

    pub fn rotated(self, rotation: Rotation) -> Self {
        (0..rotation.quarter_turns()).fold(self, |p, _| p.rotate_quarter())
    }

    /// Quarter turn about `center`.
    pub fn rotate_about(self, center: Point) -> Self {
        (self - center).rotate_quarter() + center
    }

    /// True when the two points are within `half_extent` of each other on
    /// both axes (exclusive).
    pub fn within(self, center: Point, half_extent: i32) -> bool {
        (self.x - center.x).abs() < half_extent && (self.y - center.y).abs() < half_extent
    }
}

fn cells(value: i32) -> i32 {
    (f64::from(value) / f64::from(SPACING)).round() as i32
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Point) {
        *self = *self + rhs;
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Point) {
        *self = *self - rhs;
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<i32> for Point {
    type Output = Point;

    fn mul(self, rhs: i32) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// Orientation in quarter turns, always in `0..4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rotation(u8);

impl Rotation {
    pub fn new(quarter_turns: u8) -> Self {
        Self(quarter_turns % 4)
    }

    pub fn quarter_turns(self) -> u8 {
        self.0
    }

    pub fn next(self) -> Self {
        Self::new(self.0 + 1)
    }

    pub fn advance(&mut self) {
        *self = self.next();
    }
}
