//! Reversible scene mutations
//!
//! Each variant carries both the old and the new value, so the inverse of
//! a change is always the same variant with the payload swapped. Reverting
//! is applying the inverse.

use serde::{Deserialize, Serialize};
use shared::{
    AnnotationId, AtomId, ControlPointId, ObjectRef, Point2D, Scene, SplineId, StructureCircle,
    StructureId,
};

/// One reversible mutation of the scene catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    MoveAtom {
        structure_id: StructureId,
        atom_id: AtomId,
        from: Point2D,
        to: Point2D,
    },
    /// Replace the simplified circle (centre, radius and active flag)
    SetCircle {
        structure_id: StructureId,
        from: Option<StructureCircle>,
        to: Option<StructureCircle>,
    },
    SetBoundary {
        structure_id: StructureId,
        from: Vec<Point2D>,
        to: Vec<Point2D>,
    },
    MoveAnnotation {
        annotation_id: AnnotationId,
        from: Point2D,
        to: Point2D,
    },
    MoveControlPoint {
        spline_id: SplineId,
        point_id: ControlPointId,
        from: Point2D,
        to: Point2D,
    },
    SetHidden {
        target: ObjectRef,
        from: bool,
        to: bool,
    },
    SetEnabled {
        target: ObjectRef,
        from: bool,
        to: bool,
    },
    SetColor {
        target: ObjectRef,
        from: Option<String>,
        to: Option<String>,
    },
    SetAnnotationText {
        annotation_id: AnnotationId,
        from: String,
        to: String,
    },
    LinkAnnotation {
        annotation_id: AnnotationId,
        structure_id: StructureId,
    },
    UnlinkAnnotation {
        annotation_id: AnnotationId,
        structure_id: StructureId,
    },
}

impl Change {
    /// Make a previously inserted (disabled) object live
    pub fn enable(target: ObjectRef) -> Self {
        Change::SetEnabled {
            target,
            from: false,
            to: true,
        }
    }

    /// Retire a live object; reverting brings it back
    pub fn disable(target: ObjectRef) -> Self {
        Change::SetEnabled {
            target,
            from: true,
            to: false,
        }
    }

    /// The change that undoes this one
    pub fn inverse(&self) -> Change {
        match self.clone() {
            Change::MoveAtom {
                structure_id,
                atom_id,
                from,
                to,
            } => Change::MoveAtom {
                structure_id,
                atom_id,
                from: to,
                to: from,
            },
            Change::SetCircle {
                structure_id,
                from,
                to,
            } => Change::SetCircle {
                structure_id,
                from: to,
                to: from,
            },
            Change::SetBoundary {
                structure_id,
                from,
                to,
            } => Change::SetBoundary {
                structure_id,
                from: to,
                to: from,
            },
            Change::MoveAnnotation {
                annotation_id,
                from,
                to,
            } => Change::MoveAnnotation {
                annotation_id,
                from: to,
                to: from,
            },
            Change::MoveControlPoint {
                spline_id,
                point_id,
                from,
                to,
            } => Change::MoveControlPoint {
                spline_id,
                point_id,
                from: to,
                to: from,
            },
            Change::SetHidden { target, from, to } => Change::SetHidden {
                target,
                from: to,
                to: from,
            },
            Change::SetEnabled { target, from, to } => Change::SetEnabled {
                target,
                from: to,
                to: from,
            },
            Change::SetColor { target, from, to } => Change::SetColor {
                target,
                from: to,
                to: from,
            },
            Change::SetAnnotationText {
                annotation_id,
                from,
                to,
            } => Change::SetAnnotationText {
                annotation_id,
                from: to,
                to: from,
            },
            Change::LinkAnnotation {
                annotation_id,
                structure_id,
            } => Change::UnlinkAnnotation {
                annotation_id,
                structure_id,
            },
            Change::UnlinkAnnotation {
                annotation_id,
                structure_id,
            } => Change::LinkAnnotation {
                annotation_id,
                structure_id,
            },
        }
    }

    /// Apply the change. Returns false when the target no longer exists,
    /// in which case the scene is left untouched.
    pub fn apply(&self, scene: &mut Scene) -> bool {
        let applied = match self {
            Change::MoveAtom {
                structure_id,
                atom_id,
                to,
                ..
            } => scene
                .structure_mut(*structure_id)
                .and_then(|s| s.atoms.get_mut(*atom_id))
                .map(|a| a.position = *to)
                .is_some(),
            Change::SetCircle {
                structure_id, to, ..
            } => scene
                .structure_mut(*structure_id)
                .map(|s| s.circle = *to)
                .is_some(),
            Change::SetBoundary {
                structure_id, to, ..
            } => scene
                .structure_mut(*structure_id)
                .map(|s| s.boundary = to.clone())
                .is_some(),
            Change::MoveAnnotation {
                annotation_id, to, ..
            } => scene
                .annotations
                .get_mut(*annotation_id)
                .map(|a| a.position = *to)
                .is_some(),
            Change::MoveControlPoint {
                spline_id,
                point_id,
                to,
                ..
            } => scene
                .splines
                .get_mut(*spline_id)
                .and_then(|sp| sp.control_points.get_mut(*point_id))
                .map(|cp| cp.position = *to)
                .is_some(),
            Change::SetHidden { target, to, .. } => scene.set_hidden(*target, *to).is_some(),
            Change::SetEnabled { target, to, .. } => scene.set_enabled(*target, *to).is_some(),
            Change::SetColor { target, to, .. } => scene.set_color(*target, to.clone()).is_some(),
            Change::SetAnnotationText {
                annotation_id, to, ..
            } => scene
                .annotations
                .get_mut(*annotation_id)
                .map(|a| a.text = to.clone())
                .is_some(),
            Change::LinkAnnotation {
                annotation_id,
                structure_id,
            } => {
                scene.link_annotation(*annotation_id, *structure_id);
                scene.contains(ObjectRef::Annotation {
                    annotation_id: *annotation_id,
                }) && scene.structures.contains(*structure_id)
            }
            Change::UnlinkAnnotation {
                annotation_id,
                structure_id,
            } => {
                scene.unlink_annotation(*annotation_id, *structure_id);
                scene.contains(ObjectRef::Annotation {
                    annotation_id: *annotation_id,
                })
            }
        };
        if !applied {
            tracing::debug!("Skipped change on missing target: {:?}", self.target());
        }
        applied
    }

    /// Undo the change
    pub fn revert(&self, scene: &mut Scene) -> bool {
        self.inverse().apply(scene)
    }

    /// Object the change is about
    pub fn target(&self) -> ObjectRef {
        match self {
            Change::MoveAtom {
                structure_id,
                atom_id,
                ..
            } => ObjectRef::Atom {
                structure_id: *structure_id,
                atom_id: *atom_id,
            },
            Change::SetCircle { structure_id, .. } | Change::SetBoundary { structure_id, .. } => {
                ObjectRef::Structure {
                    structure_id: *structure_id,
                }
            }
            Change::MoveAnnotation { annotation_id, .. }
            | Change::SetAnnotationText { annotation_id, .. }
            | Change::LinkAnnotation { annotation_id, .. }
            | Change::UnlinkAnnotation { annotation_id, .. } => ObjectRef::Annotation {
                annotation_id: *annotation_id,
            },
            Change::MoveControlPoint {
                spline_id,
                point_id,
                ..
            } => ObjectRef::ControlPoint {
                spline_id: *spline_id,
                point_id: *point_id,
            },
            Change::SetHidden { target, .. }
            | Change::SetEnabled { target, .. }
            | Change::SetColor { target, .. } => *target,
        }
    }

    /// Whether applying this change alters colours
    pub fn affects_color(&self) -> bool {
        matches!(self, Change::SetColor { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn scene_with_chain() -> (Scene, StructureId) {
        let mut scene = Scene::default();
        let sid = scene.insert_structure(fixtures::chain("s", &[(0.0, 0.0), (1.0, 0.0)]));
        (scene, sid)
    }

    #[test]
    fn test_move_atom_apply_and_revert() {
        let (mut scene, sid) = scene_with_chain();
        let before = scene.clone();
        let change = Change::MoveAtom {
            structure_id: sid,
            atom_id: 1,
            from: Point2D::new(1.0, 0.0),
            to: Point2D::new(3.0, 4.0),
        };
        assert!(change.apply(&mut scene));
        assert_eq!(
            scene.structure(sid).unwrap().atom_position(1),
            Some(Point2D::new(3.0, 4.0))
        );
        assert!(change.revert(&mut scene));
        assert_eq!(scene, before);
    }

    #[test]
    fn test_inverse_is_involution() {
        let change = Change::SetColor {
            target: ObjectRef::Structure { structure_id: 0 },
            from: None,
            to: Some("#ff0000".into()),
        };
        assert_eq!(change.inverse().inverse(), change);
        let link = Change::LinkAnnotation {
            annotation_id: 1,
            structure_id: 2,
        };
        assert!(matches!(link.inverse(), Change::UnlinkAnnotation { .. }));
        assert_eq!(link.inverse().inverse(), link);
    }

    #[test]
    fn test_link_change_patches_both_sides() {
        let (mut scene, sid) = scene_with_chain();
        let aid = scene.insert_annotation(fixtures::annotation("note", Point2D::new(5.0, 5.0)));
        let before = scene.clone();
        let link = Change::LinkAnnotation {
            annotation_id: aid,
            structure_id: sid,
        };
        assert!(link.apply(&mut scene));
        assert!(scene.structure(sid).unwrap().annotation_ids.contains(&aid));
        assert!(scene.annotation(aid).unwrap().structure_ids.contains(&sid));
        assert!(link.revert(&mut scene));
        assert_eq!(scene, before);
    }

    #[test]
    fn test_apply_on_missing_target_is_noop() {
        let (mut scene, _) = scene_with_chain();
        let before = scene.clone();
        let change = Change::MoveAtom {
            structure_id: 99,
            atom_id: 0,
            from: Point2D::new(0.0, 0.0),
            to: Point2D::new(1.0, 1.0),
        };
        assert!(!change.apply(&mut scene));
        assert_eq!(scene, before);
    }

    #[test]
    fn test_enable_disable_roundtrip() {
        let (mut scene, sid) = scene_with_chain();
        let target = ObjectRef::Structure { structure_id: sid };
        Change::disable(target).apply(&mut scene);
        assert!(!scene.has_visible_structures());
        Change::disable(target).revert(&mut scene);
        assert!(scene.has_visible_structures());
    }

    #[test]
    fn test_change_serde_tag() {
        let change = Change::enable(ObjectRef::Annotation { annotation_id: 3 });
        let json = serde_json::to_string(&change).unwrap();
        assert!(json.contains(r#""type":"set_enabled""#));
        let back: Change = serde_json::from_str(&json).unwrap();
        assert_eq!(back, change);
    }
}
