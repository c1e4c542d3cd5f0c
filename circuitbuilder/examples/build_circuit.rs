//! Build a small circuit, exercise undo, and print the export.

use circuitbuilder::prelude::*;
use std::path::Path;

fn main() -> Result<(), EditorError> {
    let out = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "example.circuit".to_string());

    let mut editor = CircuitEditor::new();
    editor.place(Placement::Element(ElementKind::JosephsonJunction), Point::ORIGIN);
    editor.place(Placement::Element(ElementKind::Capacitor), Point::new(0, 300));
    editor.place(Placement::Ground, Point::new(-100, 600));

    // Tie the capacitor across the junction.
    let circuit = editor.circuit();
    let nodes: Vec<_> = circuit.nodes().map(|(id, _)| id).collect();
    if let &[jj_right, jj_left, c_right, c_left] = nodes.as_slice() {
        editor.drag_and_drop(Entity::Node(c_right), Point::new(100, 0));
        editor.drag_and_drop(Entity::Node(c_left), Point::new(-100, 0));
        editor.drag_and_drop(Entity::Node(jj_left), Point::new(-100, 600));
        println!("Shared node: {:?}", editor.circuit().node(jj_right).map(|n| n.idx()));
    }

    // Rotate the junction and take it back.
    editor.click(Point::ORIGIN);
    editor.undo()?;

    let stats = editor.circuit().stats();
    println!(
        "{} elements, {} nodes, {} grounds, {} snapshots",
        stats.element_count,
        stats.node_count,
        stats.ground_count,
        editor.history().len()
    );
    println!();
    print!("{}", editor.circuit().export_text());

    let written = editor.save(Path::new(&out))?;
    println!();
    println!("Saved to {}", written.display());
    Ok(())
}
