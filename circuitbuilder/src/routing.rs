//! Orthogonal wire routing
//!
//! A wire is routed as a path of unit grid steps ("links") with a single
//! bend. The path leaves the origin along a departure vector, so the first
//! link is `origin + departure` in grid coordinates and the last link is the
//! destination's grid cell.
//!
//! Which axis is walked first depends on whether leaving along the departure
//! vector would head away from the destination. If it would, the other axis
//! goes first so the wire does not fold back across the component that owns
//! the origin.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, SPACING};

/// Which axis a wire walks before its bend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    HorizontalFirst,
    VerticalFirst,
}

/// Pick the bend orientation for a span from grid cell `o` to grid cell `t`
/// that departed along `departure`.
pub fn orientation(o: Point, t: Point, departure: Point) -> Orientation {
    if departure.x != 0 {
        let overshoots = (o.x < t.x && departure.x < 0) || (o.x > t.x && departure.x > 0);
        if overshoots {
            Orientation::VerticalFirst
        } else {
            Orientation::HorizontalFirst
        }
    } else if departure.y != 0 {
        let overshoots = (o.y < t.y && departure.y < 0) || (o.y > t.y && departure.y > 0);
        if overshoots {
            Orientation::HorizontalFirst
        } else {
            Orientation::VerticalFirst
        }
    } else {
        Orientation::HorizontalFirst
    }
}

/// Route a span between two world points.
///
/// Returns the orientation used and the links in grid coordinates. The path
/// is empty when the departure cell already is the destination cell.
pub fn route(origin: Point, dest: Point, departure: Point) -> (Orientation, Vec<Point>) {
    let o = origin.to_grid() + departure;
    let t = dest.to_grid();
    let orientation = orientation(o, t, departure);

    if o == t {
        return (orientation, Vec::new());
    }

    let mut links = Vec::with_capacity(((o.x - t.x).abs() + (o.y - t.y).abs() + 1) as usize);
    match orientation {
        Orientation::HorizontalFirst => {
            run_x(&mut links, o.x, t.x, o.y);
            run_y(&mut links, o.y, t.y, t.x);
        }
        Orientation::VerticalFirst => {
            run_y(&mut links, o.y, t.y, o.x);
            run_x(&mut links, o.x, t.x, t.y);
        }
    }
    links.push(t);

    (orientation, links)
}

/// Push `(from..to, y)` stepping by one cell, excluding `to`.
fn run_x(links: &mut Vec<Point>, from: i32, to: i32, y: i32) {
    let step = (to - from).signum();
    let mut x = from;
    while x != to {
        links.push(Point::new(x, y));
        x += step;
    }
}

/// Push `(x, from..to)` stepping by one cell, excluding `to`.
fn run_y(links: &mut Vec<Point>, from: i32, to: i32, x: i32) {
    let step = (to - from).signum();
    let mut y = from;
    while y != to {
        links.push(Point::new(x, y));
        y += step;
    }
}

/// One routed span of a connection
///
/// Wires are derived data: they are rebuilt from their endpoints whenever
/// the geometry of the owning connection changes and are never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wire {
    origin: Point,
    dest: Point,
    direction: Point,
    orientation: Orientation,
    links: Vec<Point>,
}

impl Wire {
    pub fn new(origin: Point, dest: Point, direction: Point) -> Self {
        let (orientation, links) = route(origin, dest, direction);
        Self {
            origin,
            dest,
            direction,
            orientation,
            links,
        }
    }

    /// Recompute the path from the current endpoints.
    pub fn rewire(&mut self) {
        let (orientation, links) = route(self.origin, self.dest, self.direction);
        self.orientation = orientation;
        self.links = links;
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn dest(&self) -> Point {
        self.dest
    }

    pub fn direction(&self) -> Point {
        self.direction
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Links in grid coordinates.
    pub fn links(&self) -> &[Point] {
        &self.links
    }

    /// An empty wire has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Straight segments in world coordinates, ending at the exact destination.
    pub fn segments(&self) -> Vec<(Point, Point)> {
        let Some(last) = self.links.last() else {
            return Vec::new();
        };

        let mut segments: Vec<(Point, Point)> = self
            .links
            .windows(2)
            .map(|pair| (Point::from_grid(pair[0]), Point::from_grid(pair[1])))
            .collect();
        let tail = Point::from_grid(*last);
        if tail != self.dest {
            segments.push((tail, self.dest));
        }
        segments
    }

    /// The interior link under `point`, if any. The first and last links sit
    /// on the owning component and the destination and are never reported.
    pub fn hit_link(&self, point: Point) -> Option<Point> {
        let interior = self.links.get(1..self.links.len().saturating_sub(1))?;
        interior
            .iter()
            .copied()
            .find(|link| point.within(Point::from_grid(*link), SPACING / 2))
    }
}
