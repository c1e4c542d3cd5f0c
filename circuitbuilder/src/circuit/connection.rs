//! Connections and anchors
//!
//! A connection is the routed edge from one element terminal to its
//! destination node. User-inserted anchors split it into a chain of wires:
//! terminal -> anchor 1 -> ... -> anchor n -> node. Only the first wire
//! carries the terminal's departure vector.

use std::iter;

use super::{AnchorId, ConnectionId, ElementId, NodeId};
use crate::geometry::Point;
use crate::routing::Wire;

#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub(crate) element: ElementId,
    pub(crate) terminal: usize,
    pub(crate) dest: NodeId,
    pub(crate) direction: Point,
    /// Anchors in path order
    pub(crate) anchors: Vec<AnchorId>,
    pub(crate) wires: Vec<Wire>,
}

impl Connection {
    pub(crate) fn new(element: ElementId, terminal: usize, dest: NodeId, direction: Point) -> Self {
        Self {
            element,
            terminal,
            dest,
            direction,
            anchors: Vec::new(),
            wires: Vec::new(),
        }
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn terminal(&self) -> usize {
        self.terminal
    }

    pub fn dest(&self) -> NodeId {
        self.dest
    }

    /// Departure vector of the first wire, in grid cells.
    pub fn direction(&self) -> Point {
        self.direction
    }

    pub fn anchors(&self) -> &[AnchorId] {
        &self.anchors
    }

    /// Always `anchors().len() + 1` wires once routed.
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Rebuild the wire chain from resolved endpoint positions.
    pub(crate) fn reroute(&mut self, origin: Point, waypoints: &[Point], dest: Point) {
        self.wires.clear();
        let mut from = origin;
        let mut direction = self.direction;
        for &to in waypoints.iter().chain(iter::once(&dest)) {
            self.wires.push(Wire::new(from, to, direction));
            from = to;
            direction = Point::ORIGIN;
        }
    }

    /// Index of the wire with an interior link under `point`.
    pub fn hit_wire(&self, point: Point) -> Option<usize> {
        self.wires.iter().position(|w| w.hit_link(point).is_some())
    }
}

/// A user-placed routing waypoint, owned by exactly one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub(crate) position: Point,
    pub(crate) connection: ConnectionId,
}

impl Anchor {
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }
}
