//! Integration tests for the headless Editor.
//!
//! Drives scene loading, object creation, gestures and appearance changes
//! through the public editor API.

use std::f64::consts::FRAC_PI_2;

use molscene_editor_lib::fixtures;
use molscene_editor_lib::harness::Editor;
use shared::{ObjectRef, Point2D};

fn p(x: f64, y: f64) -> Point2D {
    Point2D::new(x, y)
}

fn near(a: Option<Point2D>, b: Point2D) -> bool {
    a.is_some_and(|a| a.distance(b) < 1e-9)
}

#[test]
fn test_editor_load_and_export_roundtrip() {
    let mut e = Editor::new();
    e.load_scene(fixtures::ligand_receptor_scene()).unwrap();
    assert_eq!(e.structure_count(), 2);
    assert_eq!(e.intermolecular_count(), 1);
    assert!(!e.scene.can_revert());

    let json = e.export_scene_json();
    let mut e2 = Editor::new();
    e2.load_scene_json(&json).unwrap();
    assert_eq!(e2.structure_count(), 2);
    assert_eq!(e2.intermolecular_count(), 1);
}

#[test]
fn test_editor_rejects_bad_json() {
    let mut e = Editor::new();
    let err = e.load_scene_json("{ not json").unwrap_err();
    assert!(err.contains("Invalid scene JSON"));
}

#[test]
fn test_editor_add_objects() {
    let mut e = Editor::new();
    let ligand = e.add_structure(fixtures::chain("ligand", &[(0.0, 0.0), (1.0, 0.0)]));
    let receptor = e.add_structure(fixtures::benzene("receptor", p(6.0, 0.0), 1.0));
    let mut note = fixtures::annotation("binding site", p(6.0, 2.0));
    note.structure_ids.insert(receptor);
    e.add_annotation(note);
    e.add_spline(fixtures::spline(&[(1.0, 0.0), (3.0, 1.0), (5.0, 0.0)]));
    let edge = e.add_intermolecular(
        shared::IntermolecularKind::CationPi,
        fixtures::atom_endpoint(ligand, 1),
        fixtures::ring_endpoint(receptor, 0),
    );

    assert!(edge.is_some());
    assert_eq!(e.structure_count(), 2);
    assert_eq!(e.annotation_count(), 1);
    assert_eq!(e.spline_count(), 1);
    assert_eq!(e.intermolecular_count(), 1);
    assert_eq!(e.scene.step_count(), 5);
}

#[test]
fn test_editor_rejects_unresolved_intermolecular() {
    let mut e = Editor::new();
    let s = e.add_structure(fixtures::chain("s", &[(0.0, 0.0)]));
    let edge = e.add_intermolecular(
        shared::IntermolecularKind::AtomPair,
        fixtures::atom_endpoint(s, 0),
        fixtures::atom_endpoint(s, 7),
    );
    assert!(edge.is_none());
    assert_eq!(e.scene.step_count(), 1);
}

#[test]
fn test_editor_move_carries_attached_annotation() {
    let mut e = Editor::new();
    let s = e.add_structure(fixtures::chain("s", &[(0.0, 0.0), (1.0, 0.0)]));
    let mut note = fixtures::annotation("label", p(0.0, 2.0));
    note.structure_ids.insert(s);
    let a = e.add_annotation(note);

    e.select(&[ObjectRef::Structure { structure_id: s }]);
    assert!(e.begin_move(p(0.0, 0.0)));
    e.drag_to(p(3.0, 0.0));
    assert!(e.end_gesture().is_some());

    assert_eq!(e.atom_position(s, 1), Some(p(4.0, 0.0)));
    assert_eq!(e.scene.get_annotation(a).map(|n| n.position), Some(p(3.0, 2.0)));
}

#[test]
fn test_editor_rotation_quarter_turn() {
    let mut e = Editor::new();
    let s = e.add_structure(fixtures::chain("s", &[(1.0, 0.0), (2.0, 0.0)]));
    e.select(&[ObjectRef::Structure { structure_id: s }]);
    assert!(e.begin_rotation(p(0.0, 0.0)));
    e.rotate_to(FRAC_PI_2 / 2.0);
    e.rotate_to(FRAC_PI_2);
    assert!(e.end_gesture().is_some());

    assert!(near(e.atom_position(s, 0), p(0.0, 1.0)));
    assert!(near(e.atom_position(s, 1), p(0.0, 2.0)));
    assert_eq!(e.scene.step_count(), 2);
}

#[test]
fn test_editor_mirror_and_undo() {
    let mut e = Editor::new();
    let s = e.add_structure(fixtures::chain("s", &[(1.0, 0.0), (2.0, 1.0)]));
    e.select(&[ObjectRef::Structure { structure_id: s }]);
    assert!(e.mirror_selection(p(0.0, -1.0), p(0.0, 1.0)).is_some());
    assert!(near(e.atom_position(s, 0), p(-1.0, 0.0)));
    assert!(near(e.atom_position(s, 1), p(-2.0, 1.0)));

    assert!(e.undo());
    assert_eq!(e.atom_position(s, 0), Some(p(1.0, 0.0)));
    assert_eq!(e.atom_position(s, 1), Some(p(2.0, 1.0)));
}

#[test]
fn test_editor_gesture_without_selection() {
    let mut e = Editor::new();
    e.add_structure(fixtures::chain("s", &[(0.0, 0.0)]));
    assert!(!e.begin_move(p(0.0, 0.0)));
    assert!(e.mirror_selection(p(0.0, 0.0), p(0.0, 1.0)).is_none());
    assert_eq!(e.scene.step_count(), 1);
}

#[test]
fn test_editor_hide_and_show() {
    let mut e = Editor::new();
    let a = e.add_structure(fixtures::chain("a", &[(0.0, 0.0)]));
    e.add_structure(fixtures::chain("b", &[(5.0, 0.0)]));
    e.select(&[ObjectRef::Structure { structure_id: a }]);

    assert_eq!(e.set_selection_hidden(true), 1);
    assert_eq!(e.visible_structure_count(), 1);
    assert_eq!(e.set_selection_hidden(true), 0);

    assert!(e.undo());
    assert_eq!(e.visible_structure_count(), 2);
}

#[test]
fn test_editor_color_callback() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let mut e = Editor::new();
    let s = e.add_structure(fixtures::chain("s", &[(0.0, 0.0)]));
    let seen: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    e.scene
        .set_color_callback(move |colors| sink.borrow_mut().push(colors.entries.len()));

    e.select(&[ObjectRef::Structure { structure_id: s }]);
    assert_eq!(e.set_selection_color(Some("#ff0000".to_string())), 1);
    assert_eq!(seen.borrow().as_slice(), &[1]);
    assert_eq!(
        e.scene.get_structure(s).and_then(|st| st.color.clone()),
        Some("#ff0000".to_string())
    );

    assert!(e.undo());
    assert_eq!(seen.borrow().as_slice(), &[1, 0]);
    assert_eq!(e.scene.get_structure(s).and_then(|st| st.color.clone()), None);
}

#[test]
fn test_editor_circle_mode_toggle() {
    let mut e = Editor::new();
    e.load_scene(fixtures::ligand_receptor_scene()).unwrap();
    assert!(e.set_circle_mode(1, true));
    assert!(e.scene.get_structure(1).is_some_and(|s| s.is_circle_mode()));
    assert!(!e.set_circle_mode(1, true));

    assert!(e.set_circle_mode(1, false));
    let circle = e.scene.get_structure(1).and_then(|s| s.circle);
    assert!(circle.is_some_and(|c| !c.active));

    assert!(e.undo());
    assert!(e.scene.get_structure(1).is_some_and(|s| s.is_circle_mode()));
    assert!(e.undo());
    assert!(e.scene.get_structure(1).is_some_and(|s| s.circle.is_none()));
}
