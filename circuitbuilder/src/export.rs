//! Plain-text export and the electrical topology graph
//!
//! The text export lists one line per branch element for external circuit
//! analysis tools:
//!
//! ```text
//! branches:
//! - [C, 1, 2, 0.02]
//! - [JJ, 2, 0, 1.2, 21]
//! ```
//!
//! Node references use the dense node numbering; grounds are written as `0`.

use std::fmt::Write;

use petgraph::graph::{NodeIndex, UnGraph};
use serde::Serialize;
use std::collections::HashMap;

use crate::circuit::{Circuit, ElementKind, NodeId, Properties};
use crate::geometry::{Point, Rotation};

/// An electrical node in the topology view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyNode {
    /// Export index: dense index for plain nodes, 0 for grounds
    pub index: usize,
    pub ground: bool,
    pub position: Point,
}

/// A branch element in the topology view
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopologyBranch {
    pub kind: ElementKind,
    pub rotation: Rotation,
    pub properties: Properties,
}

/// Undirected multigraph: electrical nodes joined by branch elements
pub type Topology = UnGraph<TopologyNode, TopologyBranch>;

impl Circuit {
    /// Render the plain-text branch listing.
    pub fn export_text(&self) -> String {
        let mut out = String::from("branches:\n");
        for (_, element) in self.elements() {
            let [a, b] = element.nodes().map(|n| self.node(n).map_or(0, |node| node.idx()));
            let _ = write!(out, "- [{}, {}, {}", element.kind().symbol(), a, b);
            for value in element.properties().values() {
                let _ = write!(out, ", {}", value);
            }
            out.push_str("]\n");
        }
        out
    }

    /// Build the petgraph view of the electrical topology.
    pub fn topology(&self) -> Topology {
        let mut graph = Topology::default();
        let mut indices: HashMap<NodeId, NodeIndex> = HashMap::new();

        for (id, node) in self.nodes().chain(self.grounds()) {
            let ix = graph.add_node(TopologyNode {
                index: node.idx(),
                ground: node.is_ground(),
                position: node.position(),
            });
            indices.insert(id, ix);
        }

        for (_, element) in self.elements() {
            let [a, b] = element.nodes();
            if let (Some(&a), Some(&b)) = (indices.get(&a), indices.get(&b)) {
                graph.add_edge(
                    a,
                    b,
                    TopologyBranch {
                        kind: element.kind(),
                        rotation: element.rotation(),
                        properties: element.properties().clone(),
                    },
                );
            }
        }
        graph
    }
}

/// Number of electrically separate sub-circuits.
pub fn subcircuit_count(topology: &Topology) -> usize {
    petgraph::algo::connected_components(topology)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Entity;
    use petgraph::algo::is_isomorphic_matching;

    #[test]
    fn test_export_header_only_when_empty() {
        assert_eq!(Circuit::new().export_text(), "branches:\n");
    }

    #[test]
    fn test_export_lines() {
        let mut circuit = Circuit::new();
        circuit.add_element(ElementKind::Capacitor, Point::ORIGIN);
        let jj = circuit.add_element(ElementKind::JosephsonJunction, Point::new(0, 300));
        let ground = circuit.add_ground(Point::new(-300, 300));
        let left = circuit.element(jj).unwrap().nodes()[1];
        circuit.merge(left, ground);

        assert_eq!(
            circuit.export_text(),
            "branches:\n- [C, 1, 2, 0.02]\n- [JJ, 3, 0, 1.2, 21]\n"
        );
    }

    #[test]
    fn test_topology_counts() {
        let mut circuit = Circuit::new();
        let a = circuit.add_element(ElementKind::Capacitor, Point::ORIGIN);
        let b = circuit.add_element(ElementKind::Inductor, Point::new(0, 300));
        let topology = circuit.topology();
        assert_eq!(topology.node_count(), 4);
        assert_eq!(topology.edge_count(), 2);
        assert_eq!(subcircuit_count(&topology), 2);

        let shared = circuit.element(a).unwrap().nodes()[0];
        circuit.drop_onto(Entity::Node(circuit.element(b).unwrap().nodes()[0]), Entity::Node(shared));
        let topology = circuit.topology();
        assert_eq!(topology.node_count(), 3);
        assert_eq!(subcircuit_count(&topology), 1);
    }

    #[test]
    fn test_topology_isomorphic_after_restore() {
        let mut circuit = Circuit::new();
        let cap = circuit.add_element(ElementKind::Capacitor, Point::ORIGIN);
        let [right, left] = circuit.element(cap).unwrap().nodes();
        circuit.merge(right, left);

        let restored = Circuit::from_memento(&circuit.memento()).unwrap();
        assert!(is_isomorphic_matching(
            &circuit.topology(),
            &restored.topology(),
            |a, b| a == b,
            |a, b| a == b,
        ));
    }
}
