//! Two-terminal branch elements
//!
//! Capacitors, inductors and Josephson junctions share one graph behavior.
//! They differ only in the metadata looked up through [`ElementKind`]:
//! default properties, export symbol, handle distance and render descriptor.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ConnectionId, NodeId};
use crate::geometry::{Point, Rotation};

/// The closed set of branch element kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Capacitor,
    Inductor,
    JosephsonJunction,
}

/// Static display metadata consumed by renderers and palettes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderDescriptor {
    /// Human readable name shown in the palette
    pub label: &'static str,
    /// Drag-and-drop key
    pub palette_key: &'static str,
    /// Icon file name
    pub icon: &'static str,
    /// Icon size in grid cells (width, height)
    pub icon_cells: (u8, u8),
}

const CAPACITOR: RenderDescriptor = RenderDescriptor {
    label: "Capacitor",
    palette_key: "capacitor",
    icon: "capacitor.svg",
    icon_cells: (2, 1),
};

const INDUCTOR: RenderDescriptor = RenderDescriptor {
    label: "Inductor",
    palette_key: "inductor",
    icon: "inductor.svg",
    icon_cells: (3, 1),
};

const JUNCTION: RenderDescriptor = RenderDescriptor {
    label: "Josephson Junction",
    palette_key: "junction",
    icon: "junction.svg",
    icon_cells: (2, 1),
};

impl ElementKind {
    pub const ALL: [ElementKind; 3] = [
        ElementKind::Capacitor,
        ElementKind::Inductor,
        ElementKind::JosephsonJunction,
    ];

    /// Symbol used in the plain-text export.
    pub fn symbol(self) -> &'static str {
        match self {
            ElementKind::Capacitor => "C",
            ElementKind::Inductor => "L",
            ElementKind::JosephsonJunction => "JJ",
        }
    }

    /// Distance in grid cells from the body center to each terminal tip.
    /// Terminal nodes are placed one cell further out.
    pub fn handle_distance(self) -> i32 {
        match self {
            ElementKind::Inductor => 2,
            ElementKind::Capacitor | ElementKind::JosephsonJunction => 1,
        }
    }

    pub fn default_properties(self) -> Properties {
        match self {
            ElementKind::Capacitor => Properties::from_pairs([("C", 0.02)]),
            ElementKind::Inductor => Properties::from_pairs([("L", 1.2)]),
            ElementKind::JosephsonJunction => Properties::from_pairs([("EC", 1.2), ("EJ", 21.0)]),
        }
    }

    pub fn descriptor(self) -> &'static RenderDescriptor {
        match self {
            ElementKind::Capacitor => &CAPACITOR,
            ElementKind::Inductor => &INDUCTOR,
            ElementKind::JosephsonJunction => &JUNCTION,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Ordered mapping of named numeric parameters
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Properties(Vec<(String, f64)>);

impl Properties {
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| *v)
    }

    /// Replace the value of an existing property, returning the old value.
    /// Unknown names are rejected with `None`.
    pub fn set(&mut self, name: &str, value: f64) -> Option<f64> {
        let slot = self.0.iter_mut().find(|(k, _)| k == name)?;
        Some(std::mem::replace(&mut slot.1, value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|(_, v)| *v)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a palette drop creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    Element(ElementKind),
    Ground,
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ground") {
            return Ok(Placement::Ground);
        }
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.descriptor().palette_key.eq_ignore_ascii_case(s))
            .map(Placement::Element)
            .ok_or_else(|| format!("Unknown palette item: {}", s))
    }
}

/// A placed two-terminal component
///
/// Invariant: `nodes[i]` is the destination of `connections[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchElement {
    pub(crate) kind: ElementKind,
    pub(crate) position: Point,
    pub(crate) rotation: Rotation,
    pub(crate) properties: Properties,
    pub(crate) nodes: [NodeId; 2],
    pub(crate) connections: [ConnectionId; 2],
}

impl BranchElement {
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn nodes(&self) -> [NodeId; 2] {
        self.nodes
    }

    pub fn connections(&self) -> [ConnectionId; 2] {
        self.connections
    }

    /// Terminal index whose connection is `connection`.
    pub fn terminal_of(&self, connection: ConnectionId) -> Option<usize> {
        self.connections.iter().position(|c| *c == connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_properties_keep_order() {
        let props = ElementKind::JosephsonJunction.default_properties();
        let names: Vec<&str> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["EC", "EJ"]);
        assert_eq!(props.get("EJ"), Some(21.0));
    }

    #[test]
    fn test_set_property() {
        let mut props = ElementKind::Capacitor.default_properties();
        assert_eq!(props.set("C", 0.5), Some(0.02));
        assert_eq!(props.get("C"), Some(0.5));
        assert_eq!(props.set("L", 1.0), None);
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_inductor_is_wider() {
        assert!(ElementKind::Inductor.handle_distance() > ElementKind::Capacitor.handle_distance());
    }

    #[test]
    fn test_placement_from_palette_key() {
        assert_eq!("capacitor".parse::<Placement>(), Ok(Placement::Element(ElementKind::Capacitor)));
        assert_eq!("Junction".parse::<Placement>(), Ok(Placement::Element(ElementKind::JosephsonJunction)));
        assert_eq!("ground".parse::<Placement>(), Ok(Placement::Ground));
        assert!("resistor".parse::<Placement>().is_err());
    }
}
