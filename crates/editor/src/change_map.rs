//! Change-map builder
//!
//! Turns the temporary coordinates of a finished gesture into old/new
//! value pairs, grouped by kind of mutation. The builder only reads the
//! scene; committing the resulting changes is the history's job.

use serde::{Deserialize, Serialize};
use shared::{
    AnnotationId, AtomId, ControlPointId, Point2D, Scene, SplineId, StructureCircle, StructureId,
};

use crate::geometry::{convex_hull, from_point, to_point};
use crate::state::interaction::InteractionObject;
use crate::state::scene::Change;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomMove {
    pub structure_id: StructureId,
    pub atom_id: AtomId,
    pub from: Point2D,
    pub to: Point2D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircleMove {
    pub structure_id: StructureId,
    pub from: StructureCircle,
    pub to: StructureCircle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryUpdate {
    pub structure_id: StructureId,
    pub from: Vec<Point2D>,
    pub to: Vec<Point2D>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationMove {
    pub annotation_id: AnnotationId,
    pub from: Point2D,
    pub to: Point2D,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPointMove {
    pub spline_id: SplineId,
    pub point_id: ControlPointId,
    pub from: Point2D,
    pub to: Point2D,
}

/// Coordinate changes produced by one gesture
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeMap {
    #[serde(default)]
    pub atoms: Vec<AtomMove>,
    #[serde(default)]
    pub circles: Vec<CircleMove>,
    #[serde(default)]
    pub boundaries: Vec<BoundaryUpdate>,
    #[serde(default)]
    pub annotations: Vec<AnnotationMove>,
    #[serde(default)]
    pub control_points: Vec<ControlPointMove>,
}

impl ChangeMap {
    /// True when the gesture changed nothing and must not be committed
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
            && self.circles.is_empty()
            && self.boundaries.is_empty()
            && self.annotations.is_empty()
            && self.control_points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
            + self.circles.len()
            + self.boundaries.len()
            + self.annotations.len()
            + self.control_points.len()
    }

    /// Concrete changes, coordinates first and cached boundaries after
    pub fn into_changes(self) -> Vec<Change> {
        let mut changes = Vec::with_capacity(self.len());
        changes.extend(self.atoms.into_iter().map(|m| Change::MoveAtom {
            structure_id: m.structure_id,
            atom_id: m.atom_id,
            from: m.from,
            to: m.to,
        }));
        changes.extend(self.circles.into_iter().map(|m| Change::SetCircle {
            structure_id: m.structure_id,
            from: Some(m.from),
            to: Some(m.to),
        }));
        changes.extend(self.boundaries.into_iter().map(|m| Change::SetBoundary {
            structure_id: m.structure_id,
            from: m.from,
            to: m.to,
        }));
        changes.extend(self.annotations.into_iter().map(|m| Change::MoveAnnotation {
            annotation_id: m.annotation_id,
            from: m.from,
            to: m.to,
        }));
        changes.extend(self.control_points.into_iter().map(|m| Change::MoveControlPoint {
            spline_id: m.spline_id,
            point_id: m.point_id,
            from: m.from,
            to: m.to,
        }));
        changes
    }
}

/// Change map of a move gesture
pub fn build_movement_change_map(scene: &Scene, interaction: &InteractionObject) -> ChangeMap {
    collect(scene, interaction, true)
}

/// Change map of a rotation; spline control points stay where they are
pub fn build_rotation_change_map(scene: &Scene, interaction: &InteractionObject) -> ChangeMap {
    collect(scene, interaction, false)
}

/// Change map of a mirror operation; spline control points stay where they are
pub fn build_mirror_change_map(scene: &Scene, interaction: &InteractionObject) -> ChangeMap {
    collect(scene, interaction, false)
}

fn collect(scene: &Scene, interaction: &InteractionObject, with_control_points: bool) -> ChangeMap {
    let temp = interaction.temp();
    let mut map = ChangeMap::default();

    for (&(structure_id, atom_id), &to) in &temp.atoms {
        let Some(from) = scene
            .structure(structure_id)
            .and_then(|s| s.atom_position(atom_id))
        else {
            continue;
        };
        if from != to {
            map.atoms.push(AtomMove {
                structure_id,
                atom_id,
                from,
                to,
            });
        }
    }

    for (&structure_id, &center) in &temp.circles {
        let Some(from) = scene.structure(structure_id).and_then(|s| s.circle) else {
            continue;
        };
        if from.center != center {
            map.circles.push(CircleMove {
                structure_id,
                from,
                to: StructureCircle { center, ..from },
            });
        }
    }

    for structure_id in &interaction.affected().structures {
        let Some(s) = scene.structure(*structure_id) else {
            continue;
        };
        if !map.atoms.iter().any(|m| m.structure_id == *structure_id) {
            continue;
        }
        let moved: Vec<kurbo::Point> = s
            .atoms
            .iter()
            .map(|(aid, a)| {
                let p = temp.atoms.get(&(*structure_id, aid)).copied().unwrap_or(a.position);
                to_point(p)
            })
            .collect();
        let to: Vec<Point2D> = convex_hull(&moved).into_iter().map(from_point).collect();
        if to != s.boundary {
            map.boundaries.push(BoundaryUpdate {
                structure_id: *structure_id,
                from: s.boundary.clone(),
                to,
            });
        }
    }

    for (&annotation_id, &to) in &temp.annotations {
        let Some(from) = scene.annotation(annotation_id).map(|a| a.position) else {
            continue;
        };
        if from != to {
            map.annotations.push(AnnotationMove {
                annotation_id,
                from,
                to,
            });
        }
    }

    if with_control_points {
        for (&(spline_id, point_id), &to) in &temp.control_points {
            let Some(from) = scene
                .spline(spline_id)
                .and_then(|sp| sp.control_points.get(point_id))
                .map(|cp| cp.position)
            else {
                continue;
            };
            if from != to {
                map.control_points.push(ControlPointMove {
                    spline_id,
                    point_id,
                    from,
                    to,
                });
            }
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::state::interaction::{AffectedObjects, GestureKind};
    use shared::ObjectRef;

    fn moving(scene: &Scene, selection: &[ObjectRef]) -> InteractionObject {
        let mut interaction = InteractionObject::default();
        let affected = AffectedObjects::from_selection(scene, selection);
        interaction.begin(GestureKind::Move, affected, Point2D::new(0.0, 0.0));
        interaction
    }

    #[test]
    fn test_zero_length_drag_gives_empty_map() {
        let mut scene = Scene::default();
        let sid = scene.insert_structure(fixtures::chain("s", &[(0.0, 0.0), (1.0, 0.0)]));
        let mut interaction = moving(&scene, &[ObjectRef::Structure { structure_id: sid }]);
        interaction.translate_to(&scene, Point2D::new(0.0, 0.0));
        let map = build_movement_change_map(&scene, &interaction);
        assert!(map.is_empty());
        assert!(map.into_changes().is_empty());
    }

    #[test]
    fn test_movement_map_carries_old_and_new_values() {
        let mut scene = Scene::default();
        let sid = scene.insert_structure(fixtures::chain("s", &[(0.0, 0.0), (1.0, 0.0)]));
        let mut note = fixtures::annotation("label", Point2D::new(0.0, 1.0));
        note.structure_ids.insert(sid);
        scene.insert_annotation(note);

        let mut interaction = moving(&scene, &[ObjectRef::Structure { structure_id: sid }]);
        interaction.translate_to(&scene, Point2D::new(2.0, 0.0));
        let map = build_movement_change_map(&scene, &interaction);

        assert_eq!(map.atoms.len(), 2);
        assert_eq!(map.atoms[1].from, Point2D::new(1.0, 0.0));
        assert_eq!(map.atoms[1].to, Point2D::new(3.0, 0.0));
        assert_eq!(map.annotations.len(), 1);
        assert_eq!(map.boundaries.len(), 1);
        assert_eq!(
            map.boundaries[0].to,
            vec![Point2D::new(2.0, 0.0), Point2D::new(3.0, 0.0)]
        );
    }

    #[test]
    fn test_builder_does_not_mutate_scene() {
        let mut scene = Scene::default();
        let sid = scene.insert_structure(fixtures::chain("s", &[(0.0, 0.0)]));
        let before = scene.clone();
        let mut interaction = moving(&scene, &[ObjectRef::Structure { structure_id: sid }]);
        interaction.translate_to(&scene, Point2D::new(5.0, 5.0));
        let _ = build_movement_change_map(&scene, &interaction);
        assert_eq!(scene, before);
    }

    #[test]
    fn test_rotation_map_ignores_control_points() {
        let mut scene = Scene::default();
        let spline = scene.insert_spline(fixtures::spline(&[(1.0, 0.0), (2.0, 0.0)]));
        let mut interaction = moving(&scene, &[ObjectRef::Spline { spline_id: spline }]);
        interaction.translate_to(&scene, Point2D::new(1.0, 1.0));
        assert_eq!(build_movement_change_map(&scene, &interaction).control_points.len(), 2);
        assert!(build_rotation_change_map(&scene, &interaction).is_empty());
        assert!(build_mirror_change_map(&scene, &interaction).is_empty());
    }

    #[test]
    fn test_circle_moves_with_structure() {
        let mut scene = Scene::default();
        let mut s = fixtures::chain("s", &[(0.0, 0.0)]);
        s.circle = Some(StructureCircle {
            center: Point2D::new(0.0, 0.0),
            radius: 1.0,
            active: true,
        });
        let sid = scene.insert_structure(s);
        let mut interaction = moving(&scene, &[ObjectRef::Structure { structure_id: sid }]);
        interaction.translate_to(&scene, Point2D::new(1.0, 0.0));
        let map = build_movement_change_map(&scene, &interaction);
        assert_eq!(map.circles.len(), 1);
        assert_eq!(map.circles[0].to.center, Point2D::new(1.0, 0.0));
        assert_eq!(map.circles[0].to.radius, 1.0);
        assert!(map.circles[0].to.active);
    }
}
