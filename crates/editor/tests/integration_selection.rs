//! Integration tests for click, rectangle, lasso and proximity queries.

use molscene_editor_lib::closest::CircleMode;
use molscene_editor_lib::collision::Hit;
use molscene_editor_lib::fixtures;
use molscene_editor_lib::harness::Editor;
use shared::{IntermolecularKind, ObjectRef, Point2D};

fn p(x: f64, y: f64) -> Point2D {
    Point2D::new(x, y)
}

fn atom(structure_id: u32, atom_id: u32) -> ObjectRef {
    ObjectRef::Atom {
        structure_id,
        atom_id,
    }
}

fn loaded() -> Editor {
    let mut e = Editor::new();
    e.load_scene(fixtures::ligand_receptor_scene()).unwrap();
    e
}

#[test]
fn test_click_prefers_annotation_over_structure() {
    let mut e = Editor::new();
    e.add_structure(fixtures::chain("s", &[(0.0, 0.0)]));
    let a = e.add_annotation(fixtures::annotation("label", p(0.0, 0.0)));
    let hit = e.click(p(0.0, 0.0), false);
    assert_eq!(hit, Some(Hit::Annotation { annotation_id: a }));
}

#[test]
fn test_click_prefers_intermolecular_over_atom() {
    let mut e = loaded();
    let hit = e.click(p(2.0, 0.0), false);
    assert_eq!(
        hit,
        Some(Hit::Intermolecular {
            kind: IntermolecularKind::AtomPair,
            id: 0
        })
    );
    let hit = e.click(p(1.0, 0.0), false);
    assert_eq!(hit, Some(Hit::Atom {
        structure_id: 0,
        atom_id: 1
    }));
}

#[test]
fn test_click_prefers_control_point_over_atom() {
    let mut e = Editor::new();
    e.add_structure(fixtures::chain("s", &[(3.0, 0.0)]));
    let sp = e.add_spline(fixtures::spline(&[(0.0, 5.0), (3.0, 0.0)]));
    let hit = e.click(p(3.0, 0.0), false);
    assert_eq!(
        hit,
        Some(Hit::SplineControlPoint {
            spline_id: sp,
            point_id: 1
        })
    );
}

#[test]
fn test_click_ignores_removed_structure() {
    let mut e = Editor::new();
    let s = e.add_structure(fixtures::chain("s", &[(0.0, 0.0)]));
    e.add_structure(fixtures::chain("other", &[(9.0, 0.0)]));
    e.remove(&[ObjectRef::Structure { structure_id: s }]);
    assert!(e.click(p(0.0, 0.0), false).is_none());
}

#[test]
fn test_click_on_circle_selects_structure() {
    let mut e = loaded();
    assert!(e.set_circle_mode(1, true));
    let hit = e.click(p(10.0, 0.0), false);
    assert_eq!(hit, Some(Hit::StructureCircle { structure_id: 1 }));
    assert_eq!(e.selection.all(), &[ObjectRef::Structure { structure_id: 1 }]);
}

#[test]
fn test_rectangle_selects_touching_parts() {
    let mut e = Editor::new();
    let s = e.add_structure(fixtures::chain("s", &[(0.0, 0.0), (1.0, 0.0), (5.0, 0.0)]));
    let found = e.select_rectangle(p(-0.5, -0.5), p(1.5, 0.5), false);
    assert_eq!(found, 4);
    assert!(e.selection.is_selected(atom(s, 0)));
    assert!(e.selection.is_selected(atom(s, 1)));
    assert!(!e.selection.is_selected(atom(s, 2)));

    assert_eq!(e.select_rectangle(p(4.5, -0.5), p(5.5, 0.5), true), 2);
    assert!(e.selection.is_selected(atom(s, 2)));
    assert!(e.selection.is_selected(atom(s, 0)));
}

#[test]
fn test_lasso_encloses_atom() {
    let mut e = Editor::new();
    let s = e.add_structure(fixtures::chain("s", &[(5.0, 5.0)]));
    e.add_structure(fixtures::chain("outside", &[(20.0, 20.0)]));
    e.begin_lasso(p(0.0, 0.0));
    for v in [p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)] {
        assert!(e.extend_lasso(v));
    }
    assert!(e.lasso().is_some_and(|l| l.is_selected(atom(s, 0))));
    assert_eq!(e.end_lasso(false), 1);
    assert_eq!(e.selection.all(), &[atom(s, 0)]);
    assert!(e.lasso().is_none());
}

#[test]
fn test_lasso_crossing_commits() {
    let mut e = Editor::new();
    let s = e.add_structure(fixtures::chain("s", &[(5.0, 0.0)]));
    e.begin_lasso(p(0.0, -5.0));
    e.extend_lasso(p(10.0, 5.0));
    assert!(e.lasso().is_some_and(|l| l.committed().contains(&atom(s, 0))));
    e.extend_lasso(p(10.0, 20.0));
    assert!(e.lasso().is_some_and(|l| l.is_selected(atom(s, 0))));
    e.end_lasso(false);
    assert!(e.selection.is_selected(atom(s, 0)));
}

#[test]
fn test_lasso_cancel_keeps_selection() {
    let mut e = Editor::new();
    let s = e.add_structure(fixtures::chain("s", &[(5.0, 5.0), (30.0, 30.0)]));
    e.click(p(30.0, 30.0), false);
    e.begin_lasso(p(0.0, 0.0));
    e.extend_lasso(p(10.0, 0.0));
    e.extend_lasso(p(10.0, 10.0));
    e.cancel_lasso();
    assert!(!e.extend_lasso(p(0.0, 10.0)));
    assert_eq!(e.end_lasso(false), 0);
    assert_eq!(e.selection.all(), &[atom(s, 1)]);
}

#[test]
fn test_closest_atom_and_ring() {
    let e = loaded();
    let found = e.closest_atom(p(8.5, 0.0), None).unwrap();
    assert_eq!((found.structure_id, found.atom_id), (1, 3));
    assert!((found.distance - 0.5).abs() < 1e-9);

    let ring = e.closest_ring(p(0.0, 0.0), None).unwrap();
    assert_eq!((ring.structure_id, ring.ring_id), (1, 0));
    assert!(ring.position.distance(p(10.0, 0.0)) < 1e-9);
}

#[test]
fn test_closest_respects_circle_modes() {
    let mut e = loaded();
    assert!(e.set_circle_mode(1, true));

    let excluded = e.closest_atom(p(8.0, 0.0), Some(CircleMode::Exclude)).unwrap();
    assert_eq!(excluded.structure_id, 0);

    let detailed = e.closest_atom(p(8.0, 0.0), Some(CircleMode::Detailed)).unwrap();
    assert_eq!((detailed.structure_id, detailed.atom_id), (1, 3));
    assert!(!detailed.via_circle);

    let center = e.closest_structure(p(8.0, 0.0), Some(CircleMode::Center)).unwrap();
    assert_eq!(center.structure_id, 1);
    assert!(center.via_circle);

    let resolved = e.closest_atom_detailed(p(8.0, 0.0)).unwrap();
    assert_eq!((resolved.structure_id, resolved.atom_id), (1, 3));
}

#[test]
fn test_closest_skips_hidden_structures() {
    let mut e = loaded();
    e.select(&[ObjectRef::Structure { structure_id: 1 }]);
    e.set_selection_hidden(true);
    let found = e.closest_atom(p(9.0, 0.0), None).unwrap();
    assert_eq!(found.structure_id, 0);
}

#[test]
fn test_closest_control_point() {
    let mut e = Editor::new();
    e.add_structure(fixtures::chain("s", &[(0.0, 0.0)]));
    let sp = e.add_spline(fixtures::spline(&[(1.0, 1.0), (4.0, 1.0)]));
    let found = e.closest_control_point(p(3.5, 0.0)).unwrap();
    assert_eq!((found.spline_id, found.point_id), (sp, 1));
}
