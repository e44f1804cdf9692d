//! Display helper functions for scene objects

use shared::{IntermolecularKind, IntermolecularRef, ObjectRef, Scene};

/// Get display name for any object reference
pub fn object_display_name(scene: &Scene, target: ObjectRef) -> String {
    match target {
        ObjectRef::Structure { structure_id } => match scene.structure(structure_id) {
            Some(s) => format!("{} (#{})", s.name, structure_id),
            None => format!("Structure #{}", structure_id),
        },
        ObjectRef::Atom {
            structure_id,
            atom_id,
        } => {
            let element = scene
                .structure(structure_id)
                .and_then(|s| s.atoms.get(atom_id))
                .map(|a| a.element.as_str())
                .unwrap_or("?");
            format!("{}{} in {}", element, atom_id, structure_name(scene, structure_id))
        }
        ObjectRef::Edge {
            structure_id,
            edge_id,
        } => format!("Bond {} in {}", edge_id, structure_name(scene, structure_id)),
        ObjectRef::Ring {
            structure_id,
            ring_id,
        } => format!("Ring {} in {}", ring_id, structure_name(scene, structure_id)),
        ObjectRef::Annotation { annotation_id } => match scene.annotation(annotation_id) {
            Some(a) => format!("\"{}\"", a.text),
            None => format!("Annotation #{}", annotation_id),
        },
        ObjectRef::Intermolecular { kind, id } => {
            let ends = scene
                .intermolecular
                .get(IntermolecularRef { kind, id })
                .map(|e| {
                    let names: Vec<String> = e
                        .structure_ids()
                        .map(|sid| structure_name(scene, sid))
                        .collect();
                    names.join(" - ")
                })
                .unwrap_or_default();
            if ends.is_empty() {
                format!("{} #{}", kind_label(kind), id)
            } else {
                format!("{} #{} ({})", kind_label(kind), id, ends)
            }
        }
        ObjectRef::Spline { spline_id } => format!("Contact #{}", spline_id),
        ObjectRef::ControlPoint {
            spline_id,
            point_id,
        } => format!("Point {} of contact #{}", point_id, spline_id),
    }
}

/// One-word kind of an object reference
pub fn short_kind(target: ObjectRef) -> &'static str {
    match target {
        ObjectRef::Structure { .. } => "structure",
        ObjectRef::Atom { .. } => "atom",
        ObjectRef::Edge { .. } => "bond",
        ObjectRef::Ring { .. } => "ring",
        ObjectRef::Annotation { .. } => "annotation",
        ObjectRef::Intermolecular { .. } => "intermolecular",
        ObjectRef::Spline { .. } => "spline",
        ObjectRef::ControlPoint { .. } => "control_point",
    }
}

fn kind_label(kind: IntermolecularKind) -> &'static str {
    match kind {
        IntermolecularKind::AtomPair => "Atom pair",
        IntermolecularKind::PiStacking => "Pi stacking",
        IntermolecularKind::CationPi => "Cation-pi",
        IntermolecularKind::Distance => "Distance",
        IntermolecularKind::Line => "Line",
    }
}

fn structure_name(scene: &Scene, structure_id: u32) -> String {
    scene
        .structure(structure_id)
        .map(|s| s.name.clone())
        .unwrap_or_else(|| format!("#{}", structure_id))
}
