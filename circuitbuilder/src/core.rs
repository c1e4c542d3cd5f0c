//! Editor session shared by GUI and CLI front ends.
//! No rendering or windowing dependencies.

use std::path::{Path, PathBuf};

use crate::caretaker::{Caretaker, HistoryError};
use crate::circuit::{Circuit, ElementId, Entity, NodeId, Placement};
use crate::config::EditorOptions;
use crate::geometry::Point;
use crate::memento::{CircuitMemento, SnapshotError};

/// Extension of saved snapshot files.
pub const CIRCUIT_EXTENSION: &str = "circuit";
/// Extension of plain-text exports.
pub const EXPORT_EXTENSION: &str = "yml";

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("History error: {0}")]
    History(#[from] HistoryError),
    #[error("Config error: {0}")]
    Config(String),
}

/// Append `extension` unless the path already has one.
pub fn with_default_extension(path: &Path, extension: &str) -> PathBuf {
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        path.with_extension(extension)
    }
}

/// Read and decode a `.circuit` file.
pub fn read_memento(path: &Path) -> Result<CircuitMemento, EditorError> {
    let bytes = std::fs::read(path)?;
    Ok(CircuitMemento::from_bytes(&bytes)?)
}

/// Recursively discover `.circuit` files in a directory.
pub fn discover_circuit_files(dir: &Path) -> Result<Vec<PathBuf>, EditorError> {
    let mut files = Vec::new();
    walk_dir(dir, &mut files, 0)?;
    files.sort();
    Ok(files)
}

fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>, depth: usize) -> Result<(), EditorError> {
    if depth > 20 {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with('.') || name == "target" {
                continue;
            }
            walk_dir(&path, files, depth + 1)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some(CIRCUIT_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

/// One open circuit with its undo history.
///
/// Every gesture method is one complete user action: it mutates the circuit
/// and pushes at most one snapshot afterwards. Gestures that change nothing
/// push nothing.
#[derive(Debug, Clone)]
pub struct CircuitEditor {
    circuit: Circuit,
    history: Caretaker,
    options: EditorOptions,
}

impl Default for CircuitEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl CircuitEditor {
    pub fn new() -> Self {
        Self::with_options(EditorOptions::default())
    }

    /// Start with an empty circuit; the empty state is the first snapshot.
    pub fn with_options(options: EditorOptions) -> Self {
        let history = match options.history_limit {
            Some(limit) => Caretaker::with_limit(limit),
            None => Caretaker::new(),
        };
        let mut editor = Self {
            circuit: Circuit::new(),
            history,
            options,
        };
        editor.take_snapshot();
        editor
    }

    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Direct access for in-progress interaction. Nothing done through this
    /// is recorded until [`CircuitEditor::take_snapshot`].
    pub fn circuit_mut(&mut self) -> &mut Circuit {
        &mut self.circuit
    }

    pub fn history(&self) -> &Caretaker {
        &self.history
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn take_snapshot(&mut self) {
        self.history.add_snapshot(self.circuit.memento());
    }

    fn commit(&mut self, changed: bool) -> bool {
        if changed {
            self.take_snapshot();
        }
        changed
    }

    pub fn undo(&mut self) -> Result<(), EditorError> {
        let previous = self.history.cursor();
        let memento = self.history.undo()?.clone();
        if let Err(e) = self.circuit.restore(&memento) {
            self.history.rewind_to(previous);
            return Err(e.into());
        }
        tracing::debug!("Undo to snapshot {:?}", self.history.cursor());
        Ok(())
    }

    pub fn redo(&mut self) -> Result<(), EditorError> {
        let previous = self.history.cursor();
        let memento = self.history.redo()?.clone();
        if let Err(e) = self.circuit.restore(&memento) {
            self.history.rewind_to(previous);
            return Err(e.into());
        }
        tracing::debug!("Redo to snapshot {:?}", self.history.cursor());
        Ok(())
    }

    /// Drop a palette item at `point`. Nothing happens over an existing
    /// entity.
    pub fn place(&mut self, placement: Placement, point: Point) -> Option<Entity> {
        if let Some(hit) = self.circuit.hit_test(point) {
            tracing::debug!("Drop point {} is occupied by {:?}", point, hit);
            return None;
        }
        let entity = self.circuit.place(placement, point);
        self.take_snapshot();
        Some(entity)
    }

    /// Drag `entity` to `point` and drop it onto whatever else is there.
    ///
    /// Returns whether the drop changed topology. The move itself is kept
    /// either way.
    pub fn drag_and_drop(&mut self, entity: Entity, point: Point) -> bool {
        if !self.circuit.contains(entity) {
            return false;
        }
        self.circuit.drag(entity, point);
        let dropped = match self.circuit.hit_test_excluding(point, entity) {
            Some(target) => self.circuit.drop_onto(entity, target),
            None => false,
        };
        self.take_snapshot();
        dropped
    }

    /// Rotate what is under `point`; on a wire, insert an anchor instead.
    pub fn click(&mut self, point: Point) -> Option<Entity> {
        let entity = self.circuit.hit_test(point)?;
        let changed = match entity {
            Entity::Connection(id) => self.circuit.insert_anchor(id, point).is_some(),
            Entity::Element(_) => {
                self.circuit.rotate(entity);
                true
            }
            Entity::Node(id) if self.circuit.node(id).map_or(false, |n| n.is_ground()) => {
                self.circuit.rotate(entity);
                true
            }
            Entity::Node(_) | Entity::Anchor(_) => false,
        };
        self.commit(changed);
        Some(entity)
    }

    pub fn split(&mut self, node: NodeId) -> Vec<NodeId> {
        let created = self.circuit.split(node);
        self.commit(!created.is_empty());
        created
    }

    pub fn remove(&mut self, entity: Entity) -> bool {
        let removed = self.circuit.remove(entity);
        self.commit(removed)
    }

    pub fn set_property(&mut self, element: ElementId, name: &str, value: f64) -> Option<f64> {
        let previous = self.circuit.set_property(element, name, value);
        self.commit(previous.is_some());
        previous
    }

    pub fn clear(&mut self) {
        tracing::info!("Clearing circuit");
        self.circuit.clear();
        self.take_snapshot();
    }

    /// Save the circuit as a `.circuit` blob. Returns the path written.
    pub fn save(&self, path: &Path) -> Result<PathBuf, EditorError> {
        let path = with_default_extension(path, CIRCUIT_EXTENSION);
        let bytes = self.circuit.memento().to_bytes()?;
        std::fs::write(&path, bytes)?;
        tracing::info!("Saved circuit to {}", path.display());
        Ok(path)
    }

    /// Replace the circuit with a saved one.
    pub fn open(&mut self, path: &Path) -> Result<(), EditorError> {
        let memento = read_memento(path)?;
        self.circuit.restore(&memento)?;
        tracing::info!("Opened {}", path.display());
        if self.options.snapshot_on_open {
            self.take_snapshot();
        }
        Ok(())
    }

    /// Add a saved circuit next to the current one.
    pub fn import(&mut self, path: &Path) -> Result<Vec<Entity>, EditorError> {
        let memento = read_memento(path)?;
        let imported = self.circuit.import(&memento)?;
        tracing::info!("Imported {} entities from {}", imported.len(), path.display());
        if self.options.snapshot_on_open {
            self.take_snapshot();
        }
        Ok(imported)
    }

    /// Write the plain-text export. Returns the path written.
    pub fn export(&self, path: &Path) -> Result<PathBuf, EditorError> {
        let path = with_default_extension(path, EXPORT_EXTENSION);
        std::fs::write(&path, self.circuit.export_text())?;
        tracing::info!("Exported circuit to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::ElementKind;

    fn capacitor() -> Placement {
        Placement::Element(ElementKind::Capacitor)
    }

    #[test]
    fn test_new_editor_has_initial_snapshot() {
        let editor = CircuitEditor::new();
        assert_eq!(editor.history().len(), 1);
        assert!(editor.circuit().is_empty());
    }

    #[test]
    fn test_place_then_undo_redo() {
        let mut editor = CircuitEditor::new();
        editor.place(capacitor(), Point::ORIGIN).unwrap();
        assert_eq!(editor.circuit().stats().element_count, 1);

        editor.undo().unwrap();
        assert!(editor.circuit().is_empty());
        editor.redo().unwrap();
        assert_eq!(editor.circuit().stats().element_count, 1);
        assert!(matches!(editor.redo(), Err(EditorError::History(_))));
    }

    #[test]
    fn test_failed_undo_keeps_cursor_and_circuit() {
        let mut editor = CircuitEditor::new();
        let mut unreadable = CircuitMemento::default();
        unreadable.format_version += 1;
        editor.history.add_snapshot(unreadable);
        editor.place(capacitor(), Point::ORIGIN).unwrap();
        let before = editor.circuit().memento();

        assert!(matches!(editor.undo(), Err(EditorError::Snapshot(_))));
        assert_eq!(editor.history().cursor(), Some(2));
        assert_eq!(editor.circuit().memento(), before);
    }

    #[test]
    fn test_place_on_occupied_point_is_ignored() {
        let mut editor = CircuitEditor::new();
        editor.place(capacitor(), Point::ORIGIN).unwrap();
        assert!(editor.place(Placement::Ground, Point::new(10, 10)).is_none());
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_drag_node_onto_node_merges() {
        let mut editor = CircuitEditor::new();
        editor.place(capacitor(), Point::ORIGIN).unwrap();
        let n1 = editor.circuit().node_by_index(1).unwrap();

        assert!(editor.drag_and_drop(Entity::Node(n1), Point::new(-100, 0)));
        assert_eq!(editor.circuit().stats().node_count, 1);
        assert_eq!(editor.history().len(), 3);

        editor.undo().unwrap();
        assert_eq!(editor.circuit().stats().node_count, 2);
    }

    #[test]
    fn test_click_rotates_and_inserts_anchor() {
        let mut editor = CircuitEditor::new();
        let Some(Entity::Element(cap)) = editor.place(capacitor(), Point::ORIGIN) else {
            panic!("expected an element");
        };
        editor.click(Point::ORIGIN);
        assert_eq!(editor.circuit().element(cap).unwrap().rotation().quarter_turns(), 1);

        let right = editor.circuit().element(cap).unwrap().nodes()[0];
        editor.drag_and_drop(Entity::Node(right), Point::new(300, -300));
        let snapshots = editor.history().len();

        let conn = editor.circuit().element(cap).unwrap().connections()[0];
        let link = editor.circuit().connection(conn).unwrap().wires()[0].links()[2];
        let hit = editor.click(Point::from_grid(link));
        assert_eq!(hit, Some(Entity::Connection(conn)));
        assert_eq!(editor.circuit().stats().anchor_count, 1);
        assert_eq!(editor.history().len(), snapshots + 1);
    }

    #[test]
    fn test_clicking_empty_space_does_nothing() {
        let mut editor = CircuitEditor::new();
        assert!(editor.click(Point::new(500, 500)).is_none());
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_noop_gestures_do_not_snapshot() {
        let mut editor = CircuitEditor::new();
        let Some(Entity::Element(cap)) = editor.place(capacitor(), Point::ORIGIN) else {
            panic!("expected an element");
        };
        let n1 = editor.circuit().node_by_index(1).unwrap();

        assert!(editor.split(n1).is_empty());
        assert!(!editor.remove(Entity::Node(n1)));
        assert!(editor.set_property(cap, "L", 1.0).is_none());
        assert_eq!(editor.history().len(), 2);

        assert_eq!(editor.set_property(cap, "C", 1.0), Some(0.02));
        assert_eq!(editor.history().len(), 3);
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = CircuitEditor::new();
        editor.place(capacitor(), Point::ORIGIN).unwrap();
        editor.place(Placement::Ground, Point::new(0, 200)).unwrap();

        let written = editor.save(&dir.path().join("design")).unwrap();
        assert_eq!(written.extension().and_then(|e| e.to_str()), Some(CIRCUIT_EXTENSION));

        let mut other = CircuitEditor::new();
        other.open(&written).unwrap();
        assert_eq!(other.circuit().memento(), editor.circuit().memento());
        assert_eq!(other.history().len(), 2);
    }

    #[test]
    fn test_open_garbage_keeps_circuit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.circuit");
        std::fs::write(&path, b"nope").unwrap();

        let mut editor = CircuitEditor::new();
        editor.place(capacitor(), Point::ORIGIN).unwrap();
        assert!(matches!(editor.open(&path), Err(EditorError::Snapshot(_))));
        assert_eq!(editor.circuit().stats().element_count, 1);
    }

    #[test]
    fn test_export_appends_extension() {
        let dir = tempfile::tempdir().unwrap();
        let mut editor = CircuitEditor::new();
        editor.place(capacitor(), Point::ORIGIN).unwrap();

        let written = editor.export(&dir.path().join("netlist")).unwrap();
        assert!(written.ends_with("netlist.yml"));
        let text = std::fs::read_to_string(written).unwrap();
        assert_eq!(text, "branches:\n- [C, 1, 2, 0.02]\n");
    }

    #[test]
    fn test_history_limit_from_options() {
        let options = EditorOptions {
            history_limit: Some(2),
            ..EditorOptions::default()
        };
        let mut editor = CircuitEditor::with_options(options);
        editor.place(capacitor(), Point::ORIGIN).unwrap();
        editor.place(capacitor(), Point::new(0, 400)).unwrap();

        editor.undo().unwrap();
        assert!(editor.undo().is_err());
        assert_eq!(editor.circuit().stats().element_count, 1);
    }

    #[test]
    fn test_discover_circuit_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.circuit"), b"").unwrap();
        std::fs::write(dir.path().join("nested").join("b.circuit"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let files = discover_circuit_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
    }
}
