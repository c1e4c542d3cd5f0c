//! Circuit snapshots
//!
//! A [`CircuitMemento`] describes a whole circuit with value data and
//! integer indices only. Plain nodes keep their live index `1..=N`; grounds,
//! which are all numbered 0 while live, are given `N+1..=N+G` so that a single
//! integer addresses any node in the snapshot.
//!
//! Loading always builds into a scratch circuit and swaps it in on success,
//! so a rejected snapshot never leaves the live circuit half rebuilt.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::circuit::{
    Circuit, ElementKind, Entity, NodeId, NodeKind, Properties, TerminalSpec,
};
use crate::geometry::{Point, Rotation};

/// Version written into every snapshot. Bumped on any layout change.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Snapshot references node {index}, which matches no node or ground")]
    UnresolvedNode { index: usize },
    #[error("Snapshot references element {index}, which does not exist")]
    UnknownElement { index: usize },
    #[error("Snapshot connections do not cover each element terminal exactly once")]
    MalformedConnection,
    #[error("Snapshot {field} {value} is out of bounds")]
    OutOfBounds { field: &'static str, value: Point },
    #[error("Snapshot format version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("Snapshot decode error: {0}")]
    Decode(#[from] bincode::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMemento {
    pub idx: usize,
    pub position: Point,
    pub rotation: Rotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMemento {
    pub kind: ElementKind,
    pub position: Point,
    pub rotation: Rotation,
    pub properties: Properties,
}

/// One terminal's connection: owner, destination and anchor path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionMemento {
    /// Position of the owning element in [`CircuitMemento::elements`]
    pub element: usize,
    pub terminal: usize,
    /// Snapshot-local node index
    pub dest: usize,
    pub direction: Point,
    /// Anchor positions in path order
    pub anchors: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitMemento {
    pub format_version: u32,
    pub nodes: Vec<NodeMemento>,
    pub grounds: Vec<NodeMemento>,
    pub elements: Vec<ElementMemento>,
    pub connections: Vec<ConnectionMemento>,
}

impl Default for CircuitMemento {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            nodes: Vec::new(),
            grounds: Vec::new(),
            elements: Vec::new(),
            connections: Vec::new(),
        }
    }
}

impl CircuitMemento {
    /// Snapshot the current state of `circuit`.
    pub fn capture(circuit: &Circuit) -> Self {
        let mut node_index: HashMap<NodeId, usize> = HashMap::new();

        let nodes: Vec<NodeMemento> = circuit
            .nodes()
            .map(|(id, node)| {
                node_index.insert(id, node.idx());
                NodeMemento {
                    idx: node.idx(),
                    position: node.position(),
                    rotation: node.rotation(),
                }
            })
            .collect();

        let base = nodes.len();
        let grounds: Vec<NodeMemento> = circuit
            .grounds()
            .enumerate()
            .map(|(i, (id, ground))| {
                let idx = base + 1 + i;
                node_index.insert(id, idx);
                NodeMemento {
                    idx,
                    position: ground.position(),
                    rotation: ground.rotation(),
                }
            })
            .collect();

        let mut element_index = HashMap::new();
        let elements = circuit
            .elements()
            .enumerate()
            .map(|(i, (id, element))| {
                element_index.insert(id, i);
                ElementMemento {
                    kind: element.kind(),
                    position: element.position(),
                    rotation: element.rotation(),
                    properties: element.properties().clone(),
                }
            })
            .collect();

        let connections = circuit
            .connections()
            .filter_map(|(_, conn)| {
                Some(ConnectionMemento {
                    element: *element_index.get(&conn.element())?,
                    terminal: conn.terminal(),
                    dest: *node_index.get(&conn.dest())?,
                    direction: conn.direction(),
                    anchors: conn
                        .anchors()
                        .iter()
                        .filter_map(|a| circuit.anchor(*a))
                        .map(|a| a.position())
                        .collect(),
                })
            })
            .collect();

        Self {
            format_version: FORMAT_VERSION,
            nodes,
            grounds,
            elements,
            connections,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.grounds.is_empty() && self.elements.is_empty()
    }

    fn check_version(&self) -> Result<(), SnapshotError> {
        if self.format_version != FORMAT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: self.format_version,
                expected: FORMAT_VERSION,
            });
        }
        Ok(())
    }

    /// Encode as the binary `.circuit` blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode a `.circuit` blob, rejecting other format versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let memento: Self = bincode::deserialize(bytes)?;
        memento.check_version()?;
        Ok(memento)
    }
}

/// Reject coordinates outside the world and departures no element can have.
fn check_bounds(memento: &CircuitMemento) -> Result<(), SnapshotError> {
    let out_of_bounds = |field, value| Err(SnapshotError::OutOfBounds { field, value });

    for node in memento.nodes.iter().chain(&memento.grounds) {
        if !node.position.in_world() {
            return out_of_bounds("node position", node.position);
        }
    }
    for element in &memento.elements {
        if !element.position.in_world() {
            return out_of_bounds("element position", element.position);
        }
    }

    let max_departure = ElementKind::ALL
        .iter()
        .map(|k| k.handle_distance())
        .max()
        .unwrap_or(0);
    for conn in &memento.connections {
        let d = conn.direction;
        let axis_aligned = d.x == 0 || d.y == 0;
        if !axis_aligned || d.x.abs().max(d.y.abs()) > max_departure {
            return out_of_bounds("departure", d);
        }
        if let Some(anchor) = conn.anchors.iter().find(|a| !a.in_world()) {
            return out_of_bounds("anchor position", *anchor);
        }
    }
    Ok(())
}

/// Outcome of looking a snapshot index up among the recreated nodes
enum Resolved {
    Node(NodeId),
    Ground(NodeId),
    NotFound,
}

#[derive(Default)]
struct IndexTable {
    nodes: HashMap<usize, NodeId>,
    grounds: HashMap<usize, NodeId>,
}

impl IndexTable {
    fn resolve(&self, index: usize) -> Resolved {
        if let Some(id) = self.nodes.get(&index) {
            Resolved::Node(*id)
        } else if let Some(id) = self.grounds.get(&index) {
            Resolved::Ground(*id)
        } else {
            Resolved::NotFound
        }
    }

    fn terminal(&self, conn: &ConnectionMemento) -> Result<TerminalSpec, SnapshotError> {
        let node = match self.resolve(conn.dest) {
            Resolved::Node(id) | Resolved::Ground(id) => id,
            Resolved::NotFound => return Err(SnapshotError::UnresolvedNode { index: conn.dest }),
        };
        Ok(TerminalSpec {
            node,
            direction: conn.direction,
            anchors: conn.anchors.clone(),
        })
    }
}

/// Append everything in `memento` to `circuit`, returning what was created.
///
/// `circuit` may be left partially populated on error; callers pass a
/// scratch circuit.
fn load_into(circuit: &mut Circuit, memento: &CircuitMemento) -> Result<Vec<Entity>, SnapshotError> {
    memento.check_version()?;
    check_bounds(memento)?;

    // Every element terminal needs exactly one connection.
    let mut terminals: Vec<[Option<&ConnectionMemento>; 2]> = vec![[None, None]; memento.elements.len()];
    for conn in &memento.connections {
        let slots = terminals
            .get_mut(conn.element)
            .ok_or(SnapshotError::UnknownElement { index: conn.element })?;
        let slot = slots
            .get_mut(conn.terminal)
            .ok_or(SnapshotError::MalformedConnection)?;
        if slot.replace(conn).is_some() {
            return Err(SnapshotError::MalformedConnection);
        }
    }

    let mut imported = Vec::new();
    let mut table = IndexTable::default();

    let mut nodes: Vec<&NodeMemento> = memento.nodes.iter().collect();
    nodes.sort_by_key(|n| n.idx);
    for node in nodes {
        // Only grounds carry an orientation.
        let id = circuit.insert_node(NodeKind::Junction, node.position, Rotation::default());
        table.nodes.insert(node.idx, id);
        imported.push(Entity::Node(id));
    }
    for ground in &memento.grounds {
        let rotation = Rotation::new(ground.rotation.quarter_turns());
        let id = circuit.insert_node(NodeKind::Ground, ground.position, rotation);
        table.grounds.insert(ground.idx, id);
        imported.push(Entity::Node(id));
    }

    for (element, slots) in memento.elements.iter().zip(terminals) {
        let [Some(first), Some(second)] = slots else {
            return Err(SnapshotError::MalformedConnection);
        };
        let specs = [table.terminal(first)?, table.terminal(second)?];
        let id = circuit.insert_element(
            element.kind,
            element.position.snap_to_grid(),
            Rotation::new(element.rotation.quarter_turns()),
            element.properties.clone(),
            specs,
        );
        imported.push(Entity::Element(id));

        let anchors = circuit
            .element(id)
            .map(|e| e.connections())
            .into_iter()
            .flatten()
            .filter_map(|c| circuit.connection(c))
            .flat_map(|c| c.anchors().iter().copied().map(Entity::Anchor));
        let anchors: Vec<Entity> = anchors.collect();
        imported.extend(anchors);
    }

    Ok(imported)
}

impl Circuit {
    /// Snapshot this circuit.
    pub fn memento(&self) -> CircuitMemento {
        CircuitMemento::capture(self)
    }

    /// Replace the whole circuit with the one described by `memento`.
    ///
    /// On error the circuit is left untouched.
    pub fn restore(&mut self, memento: &CircuitMemento) -> Result<(), SnapshotError> {
        *self = Self::from_memento(memento)?;
        Ok(())
    }

    pub fn from_memento(memento: &CircuitMemento) -> Result<Circuit, SnapshotError> {
        let mut scratch = Circuit::new();
        load_into(&mut scratch, memento).map_err(|e| {
            tracing::warn!("Rejected snapshot: {}", e);
            e
        })?;
        Ok(scratch)
    }

    /// Add the contents of `memento` next to the existing entities.
    ///
    /// Imported plain nodes are numbered after the existing ones. Returns the
    /// created entities. On error the circuit is left untouched.
    pub fn import(&mut self, memento: &CircuitMemento) -> Result<Vec<Entity>, SnapshotError> {
        let mut scratch = self.clone();
        let imported = load_into(&mut scratch, memento).map_err(|e| {
            tracing::warn!("Rejected snapshot import: {}", e);
            e
        })?;
        *self = scratch;
        Ok(imported)
    }

    /// Copy every entity of `other` into this circuit.
    pub fn add_circuit(&mut self, other: &Circuit) -> Result<Vec<Entity>, SnapshotError> {
        self.import(&other.memento())
    }
}
