//! CircuitBuilder - editable circuit graph for schematic editors
//!
//! This library keeps two-terminal components (capacitors, inductors,
//! Josephson junctions), the electrical nodes they connect to and the
//! orthogonally routed wires between them mutually consistent under merges,
//! splits, rotations and deletions, with snapshot-based undo/redo.
//!
//! # Quick Start
//!
//! ```no_run
//! use circuitbuilder::prelude::*;
//! use std::path::Path;
//!
//! let mut editor = CircuitEditor::new();
//! editor.place(Placement::Element(ElementKind::Capacitor), Point::ORIGIN);
//! editor.place("junction".parse().unwrap(), Point::new(0, 300));
//!
//! let n1 = editor.circuit().node_by_index(1).unwrap();
//! editor.drag_and_drop(Entity::Node(n1), Point::new(100, 300));
//! editor.undo().unwrap();
//!
//! editor.save(Path::new("design.circuit")).unwrap();
//! println!("{}", editor.circuit().export_text());
//! ```
//!
//! # Features
//!
//! - **Graph model**: nodes, grounds, branch elements, connections, anchors
//! - **Routing**: deterministic single-bend wires on a fixed grid
//! - **History**: linear undo/redo over whole-circuit snapshots
//! - **Files**: binary `.circuit` snapshots and a plain-text branch export

pub mod caretaker;
pub mod circuit;
pub mod config;
pub mod core;
pub mod export;
pub mod geometry;
pub mod memento;
pub mod routing;

// Re-export main types
pub use caretaker::{Caretaker, HistoryError};
pub use circuit::{
    Anchor, AnchorId, BranchElement, Circuit, CircuitStats, Connection, ConnectionId, ElementId,
    ElementKind, Entity, Node, NodeId, NodeKind, Placement, Properties, RenderDescriptor,
};
pub use config::EditorOptions;
pub use crate::core::{
    discover_circuit_files, read_memento, with_default_extension, CircuitEditor, EditorError,
    CIRCUIT_EXTENSION, EXPORT_EXTENSION,
};
pub use export::{subcircuit_count, Topology, TopologyBranch, TopologyNode};
pub use geometry::{Point, Rotation, SPACING, WORLD_LIMIT};
pub use memento::{
    CircuitMemento, ConnectionMemento, ElementMemento, NodeMemento, SnapshotError, FORMAT_VERSION,
};
pub use routing::{route, Orientation, Wire};

/// Load a `.circuit` file into a fresh circuit (convenience wrapper).
pub fn load_circuit(path: &std::path::Path) -> Result<Circuit, EditorError> {
    let memento = read_memento(path)?;
    Ok(Circuit::from_memento(&memento)?)
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        Circuit, CircuitEditor, CircuitMemento, EditorError, EditorOptions, ElementKind, Entity,
        HistoryError, Placement, Point, SnapshotError,
    };
}
