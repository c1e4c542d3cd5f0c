//! Circuit Graph Container
//!
//! The circuit is the sole owner of every node, ground, branch element,
//! connection and anchor. Entities refer to each other through typed
//! handles resolved against the circuit's arenas, so removals and merges
//! only ever have to repair handle lists.
//!
//! Structural requests that make no sense for the entities involved
//! (merging a ground away, splitting a node with a single terminal, dropping
//! onto an incompatible target) are no-ops reported through the return value.

mod connection;
mod element;
mod node;

pub use connection::{Anchor, Connection};
pub use element::{BranchElement, ElementKind, Placement, Properties, RenderDescriptor};
pub use node::{Node, NodeKind};

use serde::{Deserialize, Serialize};
use slotmap::{Key, SlotMap};

use crate::geometry::{Point, Rotation, SPACING};

slotmap::new_key_type! {
    /// Handle to a node or ground
    pub struct NodeId;
    /// Handle to a branch element
    pub struct ElementId;
    /// Handle to a connection
    pub struct ConnectionId;
    /// Handle to an anchor
    pub struct AnchorId;
}

/// Half-size of an element's hit box in world units
const ELEMENT_HIT_EXTENT: i32 = SPACING;
/// Half-size of a node's or anchor's hit box in world units
const POINT_HIT_EXTENT: i32 = SPACING / 2;

/// Slot map plus insertion order
///
/// Slot reuse makes slot-map iteration order unrelated to insertion order,
/// while dense node numbering and the rendering order both follow insertion.
#[derive(Debug, Clone)]
struct Arena<K: Key, V> {
    items: SlotMap<K, V>,
    order: Vec<K>,
}

impl<K: Key, V> Default for Arena<K, V> {
    fn default() -> Self {
        Self {
            items: SlotMap::with_key(),
            order: Vec::new(),
        }
    }
}

impl<K: Key, V> Arena<K, V> {
    fn insert(&mut self, value: V) -> K {
        let key = self.items.insert(value);
        self.order.push(key);
        key
    }

    fn remove(&mut self, key: K) -> Option<V> {
        let value = self.items.remove(key)?;
        self.order.retain(|k| *k != key);
        Some(value)
    }

    fn get(&self, key: K) -> Option<&V> {
        self.items.get(key)
    }

    fn get_mut(&mut self, key: K) -> Option<&mut V> {
        self.items.get_mut(key)
    }

    fn contains(&self, key: K) -> bool {
        self.items.contains_key(key)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.order.iter().copied()
    }

    fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.order
            .iter()
            .filter_map(move |k| self.items.get(*k).map(|v| (*k, v)))
    }

    fn clear(&mut self) {
        self.items.clear();
        self.order.clear();
    }
}

/// Any addressable entity of a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    Element(ElementId),
    /// A plain node or a ground
    Node(NodeId),
    Anchor(AnchorId),
    Connection(ConnectionId),
}

/// Construction data for one element terminal
#[derive(Debug, Clone)]
pub(crate) struct TerminalSpec {
    pub node: NodeId,
    pub direction: Point,
    pub anchors: Vec<Point>,
}

/// Entity counts of a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStats {
    pub node_count: usize,
    pub ground_count: usize,
    pub element_count: usize,
    pub connection_count: usize,
    pub anchor_count: usize,
}

/// The editable circuit graph
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    nodes: Arena<NodeId, Node>,
    elements: Arena<ElementId, BranchElement>,
    connections: Arena<ConnectionId, Connection>,
    anchors: Arena<AnchorId, Anchor>,
}

impl Circuit {
    /// Create a new empty circuit
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn element(&self, id: ElementId) -> Option<&BranchElement> {
        self.elements.get(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.get(id)
    }

    /// Plain nodes in index order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().filter(|(_, n)| !n.is_ground())
    }

    pub fn grounds(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.nodes.iter().filter(|(_, n)| n.is_ground())
    }

    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &BranchElement)> + '_ {
        self.elements.iter()
    }

    pub fn connections(&self) -> impl Iterator<Item = (ConnectionId, &Connection)> + '_ {
        self.connections.iter()
    }

    pub fn anchors(&self) -> impl Iterator<Item = (AnchorId, &Anchor)> + '_ {
        self.anchors.iter()
    }

    /// Plain node carrying the dense index `idx`
    pub fn node_by_index(&self, idx: usize) -> Option<NodeId> {
        self.nodes().find(|(_, n)| n.idx == idx).map(|(id, _)| id)
    }

    /// Every entity in drawing order: elements, nodes, grounds, anchors,
    /// connections.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.elements
            .keys()
            .map(Entity::Element)
            .chain(self.nodes().map(|(id, _)| Entity::Node(id)))
            .chain(self.grounds().map(|(id, _)| Entity::Node(id)))
            .chain(self.anchors.keys().map(Entity::Anchor))
            .chain(self.connections.keys().map(Entity::Connection))
    }

    pub fn contains(&self, entity: Entity) -> bool {
        match entity {
            Entity::Element(id) => self.elements.contains(id),
            Entity::Node(id) => self.nodes.contains(id),
            Entity::Anchor(id) => self.anchors.contains(id),
            Entity::Connection(id) => self.connections.contains(id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len() == 0 && self.nodes.len() == 0
    }

    pub fn stats(&self) -> CircuitStats {
        CircuitStats {
            node_count: self.nodes().count(),
            ground_count: self.grounds().count(),
            element_count: self.elements.len(),
            connection_count: self.connections.len(),
            anchor_count: self.anchors.len(),
        }
    }

    /// A node that only one terminal uses and whose connections carry no
    /// anchors. Such nodes follow their element when it moves or rotates.
    pub fn is_free_terminal(&self, id: NodeId) -> bool {
        let Some(node) = self.nodes.get(id) else {
            return false;
        };
        node.is_exclusive()
            && node.connections.iter().all(|c| {
                self.connections
                    .get(*c)
                    .map_or(true, |conn| conn.anchors.is_empty())
            })
    }

    // ------------------------------------------------------------------
    // Factories
    // ------------------------------------------------------------------

    pub fn add_node(&mut self, point: Point) -> NodeId {
        self.insert_node(NodeKind::Junction, point, Rotation::default())
    }

    pub fn add_ground(&mut self, point: Point) -> NodeId {
        self.insert_node(NodeKind::Ground, point, Rotation::default())
    }

    pub(crate) fn insert_node(&mut self, kind: NodeKind, point: Point, rotation: Rotation) -> NodeId {
        let mut node = Node::new(kind, point);
        node.rotation = rotation;
        let id = self.nodes.insert(node);
        self.renumber();
        id
    }

    /// Place a new element with two fresh terminal nodes on its local x-axis.
    pub fn add_element(&mut self, kind: ElementKind, point: Point) -> ElementId {
        let position = point.snap_to_grid();
        let s = kind.handle_distance();
        let offset = Point::new(SPACING * (1 + s), 0);

        let right = self.add_node(position + offset);
        let left = self.add_node(position - offset);
        let id = self.insert_element(
            kind,
            position,
            Rotation::default(),
            kind.default_properties(),
            [
                TerminalSpec {
                    node: right,
                    direction: Point::new(s, 0),
                    anchors: Vec::new(),
                },
                TerminalSpec {
                    node: left,
                    direction: Point::new(-s, 0),
                    anchors: Vec::new(),
                },
            ],
        );
        tracing::debug!("Placed {} at {}", kind, position);
        id
    }

    /// Create a palette item at `point`.
    pub fn place(&mut self, placement: Placement, point: Point) -> Entity {
        match placement {
            Placement::Element(kind) => Entity::Element(self.add_element(kind, point)),
            Placement::Ground => Entity::Node(self.add_ground(point)),
        }
    }

    pub(crate) fn insert_element(
        &mut self,
        kind: ElementKind,
        position: Point,
        rotation: Rotation,
        properties: Properties,
        terminals: [TerminalSpec; 2],
    ) -> ElementId {
        let id = self.elements.insert(BranchElement {
            kind,
            position,
            rotation,
            properties,
            nodes: [terminals[0].node, terminals[1].node],
            connections: [ConnectionId::null(); 2],
        });

        for (terminal, spec) in terminals.into_iter().enumerate() {
            let connection = self.add_connection(id, terminal, spec.node, spec.direction);
            for (slot, point) in spec.anchors.into_iter().enumerate() {
                self.add_anchor(connection, slot, point);
            }
            self.reroute(connection);
        }
        id
    }

    pub(crate) fn add_connection(
        &mut self,
        element: ElementId,
        terminal: usize,
        dest: NodeId,
        direction: Point,
    ) -> ConnectionId {
        let id = self
            .connections
            .insert(Connection::new(element, terminal, dest, direction));
        if let Some(node) = self.nodes.get_mut(dest) {
            node.connections.push(id);
            node.elements.push(element);
        }
        if let Some(e) = self.elements.get_mut(element) {
            e.connections[terminal] = id;
            e.nodes[terminal] = dest;
        }
        self.reroute(id);
        id
    }

    /// Insert an anchor at chain position `slot`. The caller reroutes.
    pub(crate) fn add_anchor(&mut self, connection: ConnectionId, slot: usize, point: Point) -> Option<AnchorId> {
        if !self.connections.contains(connection) {
            return None;
        }
        let id = self.anchors.insert(Anchor {
            position: point.snap_to_grid(),
            connection,
        });
        if let Some(conn) = self.connections.get_mut(connection) {
            let slot = slot.min(conn.anchors.len());
            conn.anchors.insert(slot, id);
        }
        Some(id)
    }

    /// Split the wire under `point` with a new anchor.
    ///
    /// Returns `None` when no interior link of the connection is under the
    /// point.
    pub fn insert_anchor(&mut self, connection: ConnectionId, point: Point) -> Option<AnchorId> {
        let wire = self.connections.get(connection)?.hit_wire(point)?;
        let id = self.add_anchor(connection, wire, point)?;
        self.reroute(connection);
        tracing::debug!("Inserted anchor at {} on wire {}", point.snap_to_grid(), wire);
        Some(id)
    }

    /// Remove an anchor, contracting its two wires into one.
    pub fn delete_anchor(&mut self, id: AnchorId) -> bool {
        let Some(anchor) = self.anchors.remove(id) else {
            return false;
        };
        if let Some(conn) = self.connections.get_mut(anchor.connection) {
            conn.anchors.retain(|a| *a != id);
        }
        self.reroute(anchor.connection);
        tracing::debug!("Deleted anchor at {}", anchor.position);
        true
    }

    // ------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------

    /// Remove an element and its connections. Terminal nodes that no other
    /// element uses go with it.
    pub fn remove_element(&mut self, id: ElementId) -> bool {
        let Some(element) = self.elements.remove(id) else {
            return false;
        };
        for connection in element.connections {
            self.remove_connection(connection);
        }
        for node_id in element.nodes {
            let Some(node) = self.nodes.get_mut(node_id) else {
                continue;
            };
            node.detach_element(id);
            if node.elements.is_empty() {
                self.remove_node(node_id);
            }
        }
        tracing::debug!("Removed {} at {}", element.kind, element.position);
        true
    }

    /// Remove a node or ground that no element uses, then renumber.
    pub fn remove_node(&mut self, id: NodeId) -> bool {
        match self.nodes.get(id) {
            Some(node) if node.elements.is_empty() => {}
            Some(node) => {
                tracing::debug!("Node {} still has {} terminal(s); not removed", node.idx, node.elements.len());
                return false;
            }
            None => return false,
        }
        self.nodes.remove(id);
        self.renumber();
        true
    }

    /// Drop a connection together with its anchors.
    pub(crate) fn remove_connection(&mut self, id: ConnectionId) -> bool {
        let Some(conn) = self.connections.remove(id) else {
            return false;
        };
        for anchor in conn.anchors {
            self.anchors.remove(anchor);
        }
        if let Some(node) = self.nodes.get_mut(conn.dest) {
            node.detach_connection(id);
        }
        true
    }

    /// Generic delete. Connections belong to their element and cannot be
    /// removed on their own.
    pub fn remove(&mut self, entity: Entity) -> bool {
        match entity {
            Entity::Element(id) => self.remove_element(id),
            Entity::Node(id) => self.remove_node(id),
            Entity::Anchor(id) => self.delete_anchor(id),
            Entity::Connection(_) => {
                tracing::debug!("Connections are removed with their element");
                false
            }
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.elements.clear();
        self.connections.clear();
        self.anchors.clear();
    }

    /// Plain nodes get 1..=N in insertion order; grounds get 0.
    fn renumber(&mut self) {
        let mut next = 1;
        for id in &self.nodes.order {
            if let Some(node) = self.nodes.items.get_mut(*id) {
                if node.is_ground() {
                    node.idx = 0;
                } else {
                    node.idx = next;
                    next += 1;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Topology edits
    // ------------------------------------------------------------------

    /// Fold `source` into `target`.
    ///
    /// The target takes over all of the source's connections and terminals.
    /// Grounds are never merged away.
    pub fn merge(&mut self, source: NodeId, target: NodeId) -> bool {
        if source == target || !self.nodes.contains(target) {
            return false;
        }
        let Some(node) = self.nodes.get_mut(source) else {
            return false;
        };
        if node.is_ground() {
            tracing::debug!("Ground at {} cannot be merged away", node.position);
            return false;
        }
        let connections = std::mem::take(&mut node.connections);
        let elements = std::mem::take(&mut node.elements);

        for c in &connections {
            if let Some(conn) = self.connections.get_mut(*c) {
                conn.dest = target;
            }
        }
        for e in &elements {
            if let Some(element) = self.elements.get_mut(*e) {
                for slot in element.nodes.iter_mut().filter(|slot| **slot == source) {
                    *slot = target;
                }
            }
        }
        if let Some(node) = self.nodes.get_mut(target) {
            node.connections.extend(connections.iter().copied());
            node.elements.extend(elements);
        }

        self.remove_node(source);
        for c in connections {
            self.reroute(c);
        }
        tracing::debug!(
            "Merged node into {}",
            self.nodes.get(target).map_or(0, |n| n.idx)
        );
        true
    }

    /// Give every terminal on a shared junction its own new node next to
    /// the element body, then delete the junction.
    ///
    /// Returns the new nodes; empty when there was nothing to split.
    pub fn split(&mut self, id: NodeId) -> Vec<NodeId> {
        let connections = match self.nodes.get(id) {
            Some(node) if !node.is_ground() && node.elements.len() > 1 => node.connections.clone(),
            _ => {
                tracing::debug!("Nothing to split");
                return Vec::new();
            }
        };

        let mut created = Vec::with_capacity(connections.len());
        for c in connections {
            let Some(conn) = self.connections.get_mut(c) else {
                continue;
            };
            let anchors = std::mem::take(&mut conn.anchors);
            let (element_id, terminal, direction) = (conn.element, conn.terminal, conn.direction);
            for anchor in anchors {
                self.anchors.remove(anchor);
            }
            let Some(position) = self.elements.get(element_id).map(|e| e.position) else {
                continue;
            };

            let new_node = self.add_node(position + direction * SPACING);
            if let Some(conn) = self.connections.get_mut(c) {
                conn.dest = new_node;
            }
            if let Some(node) = self.nodes.get_mut(new_node) {
                node.connections.push(c);
                node.elements.push(element_id);
            }
            if let Some(element) = self.elements.get_mut(element_id) {
                element.nodes[terminal] = new_node;
            }
            self.reroute(c);
            created.push(new_node);
        }

        if let Some(node) = self.nodes.get_mut(id) {
            node.connections.clear();
            node.elements.clear();
        }
        self.remove_node(id);
        tracing::debug!("Split node into {} nodes", created.len());
        created
    }

    /// Drop a dragged entity onto another.
    ///
    /// Node onto node merges; anchor onto an anchor of another connection
    /// moves the dragged anchor onto the target. Anything else is ignored.
    pub fn drop_onto(&mut self, source: Entity, target: Entity) -> bool {
        match (source, target) {
            (Entity::Node(s), Entity::Node(t)) => self.merge(s, t),
            (Entity::Anchor(s), Entity::Anchor(t)) => self.merge_anchor(s, t),
            _ => {
                tracing::debug!("Ignored drop of {:?} onto {:?}", source, target);
                false
            }
        }
    }

    fn merge_anchor(&mut self, source: AnchorId, target: AnchorId) -> bool {
        let (Some(src), Some(tgt)) = (self.anchors.get(source), self.anchors.get(target)) else {
            return false;
        };
        if src.connection == tgt.connection {
            return false;
        }
        let (position, connection) = (tgt.position, src.connection);
        if let Some(anchor) = self.anchors.get_mut(source) {
            anchor.position = position;
        }
        self.reroute(connection);
        true
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    /// Move an entity to the grid point nearest `point`.
    ///
    /// Dragging an element carries its free terminals along; shared or
    /// anchored nodes stay put and their wires reroute.
    pub fn drag(&mut self, entity: Entity, point: Point) {
        let target = point.snap_to_grid();
        match entity {
            Entity::Element(id) => self.drag_element(id, target),
            Entity::Node(id) => {
                let Some(node) = self.nodes.get_mut(id) else {
                    return;
                };
                node.position = target;
                for c in node.connections.clone() {
                    self.reroute(c);
                }
            }
            Entity::Anchor(id) => {
                let Some(anchor) = self.anchors.get_mut(id) else {
                    return;
                };
                anchor.position = target;
                let connection = anchor.connection;
                self.reroute(connection);
            }
            Entity::Connection(_) => {}
        }
    }

    fn drag_element(&mut self, id: ElementId, target: Point) {
        let Some(element) = self.elements.get_mut(id) else {
            return;
        };
        let old = std::mem::replace(&mut element.position, target);
        let (nodes, connections) = (element.nodes, element.connections);

        let free: Vec<NodeId> = nodes.into_iter().filter(|n| self.is_free_terminal(*n)).collect();
        for n in free {
            if let Some(node) = self.nodes.get_mut(n) {
                node.position = target + (node.position - old);
            }
        }
        for c in connections {
            self.reroute(c);
        }
    }

    /// Quarter-turn an element or a ground. Plain nodes, anchors and
    /// connections have no orientation.
    pub fn rotate(&mut self, entity: Entity) {
        match entity {
            Entity::Element(id) => self.rotate_element(id),
            Entity::Node(id) => {
                if let Some(node) = self.nodes.get_mut(id).filter(|n| n.is_ground()) {
                    node.rotation.advance();
                }
            }
            Entity::Anchor(_) | Entity::Connection(_) => {}
        }
    }

    fn rotate_element(&mut self, id: ElementId) {
        let Some(element) = self.elements.get_mut(id) else {
            return;
        };
        element.rotation.advance();
        let (center, nodes, connections) = (element.position, element.nodes, element.connections);

        for c in connections {
            if let Some(conn) = self.connections.get_mut(c) {
                conn.direction = conn.direction.rotate_quarter();
            }
        }
        let free: Vec<NodeId> = nodes.into_iter().filter(|n| self.is_free_terminal(*n)).collect();
        for n in free {
            if let Some(node) = self.nodes.get_mut(n) {
                node.position = node.position.rotate_about(center);
                if node.is_ground() {
                    node.rotation.advance();
                }
            }
        }
        for c in connections {
            self.reroute(c);
        }
    }

    /// Edit a property in place. Unknown names are rejected with `None`.
    pub fn set_property(&mut self, element: ElementId, name: &str, value: f64) -> Option<f64> {
        self.elements.get_mut(element)?.properties.set(name, value)
    }

    /// Recompute a connection's wires from the current positions.
    pub(crate) fn reroute(&mut self, id: ConnectionId) {
        let Some(conn) = self.connections.get(id) else {
            return;
        };
        let Some(origin) = self.elements.get(conn.element).map(|e| e.position) else {
            return;
        };
        let Some(dest) = self.nodes.get(conn.dest).map(|n| n.position) else {
            return;
        };
        let waypoints: Vec<Point> = conn
            .anchors
            .iter()
            .filter_map(|a| self.anchors.get(*a))
            .map(|a| a.position)
            .collect();
        if let Some(conn) = self.connections.get_mut(id) {
            conn.reroute(origin, &waypoints, dest);
        }
    }

    // ------------------------------------------------------------------
    // Hit-testing
    // ------------------------------------------------------------------

    /// First entity in drawing order under `point`.
    pub fn hit_test(&self, point: Point) -> Option<Entity> {
        self.entities().find(|e| self.hits(*e, point))
    }

    /// Like [`Circuit::hit_test`], skipping the entity being dragged.
    pub fn hit_test_excluding(&self, point: Point, skip: Entity) -> Option<Entity> {
        self.entities()
            .filter(|e| *e != skip)
            .find(|e| self.hits(*e, point))
    }

    pub fn hits(&self, entity: Entity, point: Point) -> bool {
        match entity {
            Entity::Element(id) => self
                .elements
                .get(id)
                .map_or(false, |e| point.within(e.position, ELEMENT_HIT_EXTENT)),
            Entity::Node(id) => self
                .nodes
                .get(id)
                .map_or(false, |n| point.within(n.position, POINT_HIT_EXTENT)),
            Entity::Anchor(id) => self
                .anchors
                .get(id)
                .map_or(false, |a| point.within(a.position, POINT_HIT_EXTENT)),
            Entity::Connection(id) => self
                .connections
                .get(id)
                .map_or(false, |c| c.hit_wire(point).is_some()),
        }
    }
}
