//! Factory functions for creating test data.
//!
//! Provides helpers to construct `Structure`, `Annotation`, `Spline` and
//! whole `Scene` values used in tests and by the command interface.

use std::collections::BTreeSet;

use shared::*;

use crate::shape::structure_boundary;

// ── Structure factories ─────────────────────────────────────────

/// Carbon chain through the given points, one bond per consecutive pair.
pub fn chain(name: &str, points: &[(f64, f64)]) -> Structure {
    let mut s = Structure::new(name);
    let mut previous: Option<AtomId> = None;
    for &(x, y) in points {
        let id = s.atoms.insert(Atom {
            element: "C".to_string(),
            position: Point2D::new(x, y),
            hidden: false,
            color: None,
        });
        if let Some(prev) = previous {
            s.edges.insert(Edge {
                from: prev,
                to: id,
                order: 1,
                hidden: false,
            });
        }
        previous = Some(id);
    }
    s.boundary = structure_boundary(&s);
    s
}

/// Regular six-membered aromatic ring.
pub fn benzene(name: &str, center: Point2D, radius: f64) -> Structure {
    let points: Vec<(f64, f64)> = (0..6)
        .map(|i| {
            let angle = std::f64::consts::PI / 3.0 * i as f64;
            (center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect();
    let mut s = chain(name, &points);
    s.edges.insert(Edge {
        from: 5,
        to: 0,
        order: 1,
        hidden: false,
    });
    s.rings.insert(Ring {
        atoms: (0..6).collect(),
        aromatic: true,
    });
    s
}

/// Single-atom structure with a custom element.
pub fn single_atom(name: &str, element: &str, at: Point2D) -> Structure {
    let mut s = chain(name, &[(at.x, at.y)]);
    if let Some(atom) = s.atoms.get_mut(0) {
        atom.element = element.to_string();
    }
    s
}

// ── Annotation / spline factories ───────────────────────────────

/// Free label of 2x1 centered on `position`.
pub fn annotation(text: &str, position: Point2D) -> Annotation {
    Annotation {
        text: text.to_string(),
        position,
        width: 2.0,
        height: 1.0,
        hidden: false,
        enabled: true,
        color: None,
        created_at_step: None,
        structure_ids: BTreeSet::new(),
    }
}

/// Spline through the given control points.
pub fn spline(points: &[(f64, f64)]) -> Spline {
    let mut control_points = Collection::new();
    for &(x, y) in points {
        control_points.insert(ControlPoint {
            position: Point2D::new(x, y),
        });
    }
    Spline {
        control_points,
        hidden: false,
        enabled: true,
        color: None,
        created_at_step: None,
        structure_ids: BTreeSet::new(),
    }
}

// ── Endpoint helpers ────────────────────────────────────────────

pub fn atom_endpoint(structure_id: StructureId, atom_id: AtomId) -> Endpoint {
    Endpoint::Atom {
        structure_id,
        atom_id,
    }
}

pub fn ring_endpoint(structure_id: StructureId, ring_id: RingId) -> Endpoint {
    Endpoint::Ring {
        structure_id,
        ring_id,
    }
}

// ── Scene factories ─────────────────────────────────────────────

/// Ligand and receptor side by side with an atom-pair contact between them.
///
/// Ligand: structure 0, atoms at (0,0) (1,0) (2,0).
/// Receptor: structure 1, benzene centered at (10,0), radius 1.
pub fn ligand_receptor_scene() -> Scene {
    let mut scene = Scene::default();
    let ligand = scene.insert_structure(chain("ligand", &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]));
    let receptor = scene.insert_structure(benzene("receptor", Point2D::new(10.0, 0.0), 1.0));
    scene.insert_intermolecular(
        IntermolecularKind::AtomPair,
        IntermolecularEdge::new(atom_endpoint(ligand, 2), atom_endpoint(receptor, 3)),
    );
    scene
}

/// Scene as JSON, for feeding the command interface.
pub fn scene_json(scene: &Scene) -> String {
    serde_json::to_string(scene).unwrap_or_default()
}
