//! Electrical nodes and grounds

use serde::{Deserialize, Serialize};

use super::{ConnectionId, ElementId};
use crate::geometry::{Point, Rotation};

/// Distinguishes plain junctions from ground references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// A plain junction, numbered densely from 1
    Junction,
    /// A reference-potential node; always numbered 0 and never merged away
    Ground,
}

/// An electrical junction point
///
/// `elements` holds one entry per incident terminal, so an element whose
/// two terminals land on the same node is listed twice.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) idx: usize,
    pub(crate) kind: NodeKind,
    pub(crate) position: Point,
    pub(crate) rotation: Rotation,
    pub(crate) connections: Vec<ConnectionId>,
    pub(crate) elements: Vec<ElementId>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, position: Point) -> Self {
        Self {
            idx: 0,
            kind,
            position: position.snap_to_grid(),
            rotation: Rotation::default(),
            connections: Vec::new(),
            elements: Vec::new(),
        }
    }

    /// Dense index among plain junctions (1-based); 0 for grounds.
    pub fn idx(&self) -> usize {
        self.idx
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn is_ground(&self) -> bool {
        self.kind == NodeKind::Ground
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    /// True when exactly one terminal uses this node.
    pub fn is_exclusive(&self) -> bool {
        self.elements.len() == 1
    }

    /// Drop one incidence of `element`.
    pub(crate) fn detach_element(&mut self, element: ElementId) {
        if let Some(pos) = self.elements.iter().position(|e| *e == element) {
            self.elements.remove(pos);
        }
    }

    pub(crate) fn detach_connection(&mut self, connection: ConnectionId) {
        self.connections.retain(|c| *c != connection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn test_new_node_is_snapped() {
        let node = Node::new(NodeKind::Junction, Point::new(61, -38));
        assert_eq!(node.position(), Point::new(50, -50));
        assert!(!node.is_ground());
        assert!(node.elements().is_empty());
    }

    #[test]
    fn test_detach_element_removes_one_incidence() {
        let mut elements: SlotMap<ElementId, ()> = SlotMap::with_key();
        let e = elements.insert(());
        let mut node = Node::new(NodeKind::Ground, Point::ORIGIN);
        node.elements.push(e);
        node.elements.push(e);
        assert!(!node.is_exclusive());

        node.detach_element(e);
        assert_eq!(node.elements(), &[e]);
        assert!(node.is_exclusive());
    }
}
