//! Gesture tracking
//!
//! One `InteractionObject` is shared by every move / rotate / mirror
//! gesture. It records which objects the gesture affects and the
//! temporary coordinates they are drawn at; the scene itself is not
//! touched until the gesture ends and its change map is committed.

use std::collections::{BTreeMap, BTreeSet};

use kurbo::Line;
use serde::{Deserialize, Serialize};
use shared::{
    AnnotationId, AtomId, ControlPointId, IntermolecularRef, ObjectRef, Point2D, Scene, SplineId,
    StructureId,
};

use crate::geometry::{from_point, reflect_across, rotate_about, to_point};

/// Kind of the gesture in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureKind {
    Move,
    Rotate,
    Mirror,
}

/// Objects a gesture moves
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffectedObjects {
    pub structures: BTreeSet<StructureId>,
    pub annotations: BTreeSet<AnnotationId>,
    pub control_points: BTreeSet<(SplineId, ControlPointId)>,
}

impl AffectedObjects {
    /// Expand a selection into what a gesture on it moves: whole
    /// structures for any selected part, annotations attached to those
    /// structures, and spline control points
    pub fn from_selection<'a>(scene: &Scene, selection: impl IntoIterator<Item = &'a ObjectRef>) -> Self {
        let mut affected = Self::default();
        for target in selection {
            match *target {
                ObjectRef::Structure { structure_id }
                | ObjectRef::Atom { structure_id, .. }
                | ObjectRef::Edge { structure_id, .. }
                | ObjectRef::Ring { structure_id, .. } => {
                    if scene.structures.contains(structure_id) {
                        affected.structures.insert(structure_id);
                    }
                }
                ObjectRef::Annotation { annotation_id } => {
                    if scene.annotations.contains(annotation_id) {
                        affected.annotations.insert(annotation_id);
                    }
                }
                ObjectRef::Intermolecular { kind, id } => {
                    if let Some(edge) = scene.intermolecular.get(IntermolecularRef { kind, id }) {
                        affected.structures.extend(edge.structure_ids());
                    }
                }
                ObjectRef::Spline { spline_id } => {
                    if let Some(sp) = scene.spline(spline_id) {
                        affected
                            .control_points
                            .extend(sp.control_points.ids().map(|pid| (spline_id, pid)));
                    }
                }
                ObjectRef::ControlPoint {
                    spline_id,
                    point_id,
                } => {
                    if scene.contains(*target) {
                        affected.control_points.insert((spline_id, point_id));
                    }
                }
            }
        }

        for sid in &affected.structures {
            if let Some(s) = scene.structure(*sid) {
                affected.annotations.extend(s.annotation_ids.iter().copied());
            }
        }
        affected
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty() && self.annotations.is_empty() && self.control_points.is_empty()
    }
}

/// Positions objects are drawn at while a gesture runs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TempCoordinates {
    pub atoms: BTreeMap<(StructureId, AtomId), Point2D>,
    pub circles: BTreeMap<StructureId, Point2D>,
    pub annotations: BTreeMap<AnnotationId, Point2D>,
    pub control_points: BTreeMap<(SplineId, ControlPointId), Point2D>,
}

impl TempCoordinates {
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
            && self.circles.is_empty()
            && self.annotations.is_empty()
            && self.control_points.is_empty()
    }
}

/// Shared gesture state, reset between gestures
#[derive(Debug, Clone, Default)]
pub struct InteractionObject {
    gesture: Option<GestureKind>,
    affected: AffectedObjects,
    temp: TempCoordinates,
    origin: Point2D,
}

impl InteractionObject {
    /// Start a gesture; any previous gesture state is dropped
    pub fn begin(&mut self, kind: GestureKind, affected: AffectedObjects, origin: Point2D) {
        self.reset();
        self.gesture = Some(kind);
        self.affected = affected;
        self.origin = origin;
    }

    pub fn gesture(&self) -> Option<GestureKind> {
        self.gesture
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn affected(&self) -> &AffectedObjects {
        &self.affected
    }

    pub fn temp(&self) -> &TempCoordinates {
        &self.temp
    }

    /// Pointer position the gesture started at
    pub fn origin(&self) -> Point2D {
        self.origin
    }

    /// Drawn position of an atom: temporary if the gesture moved it
    pub fn atom_position(&self, scene: &Scene, structure_id: StructureId, atom_id: AtomId) -> Option<Point2D> {
        self.temp
            .atoms
            .get(&(structure_id, atom_id))
            .copied()
            .or_else(|| scene.structure(structure_id)?.atom_position(atom_id))
    }

    /// Translate everything affected by the pointer offset from the origin
    pub fn translate_to(&mut self, scene: &Scene, current: Point2D) {
        let dx = current.x - self.origin.x;
        let dy = current.y - self.origin.y;
        self.transform_all(scene, true, |p| p.offset(dx, dy));
    }

    /// Rotate affected structures and their annotations about `pivot`
    pub fn rotate_by(&mut self, scene: &Scene, pivot: Point2D, angle: f64) {
        let center = to_point(pivot);
        self.transform_all(scene, false, |p| {
            from_point(rotate_about(to_point(p), center, angle))
        });
    }

    /// Mirror affected structures and their annotations across the line a-b
    pub fn mirror_across(&mut self, scene: &Scene, a: Point2D, b: Point2D) {
        let axis = Line::new(to_point(a), to_point(b));
        self.transform_all(scene, false, |p| from_point(reflect_across(to_point(p), axis)));
    }

    /// Recompute every temporary coordinate from the committed one
    fn transform_all(&mut self, scene: &Scene, with_control_points: bool, f: impl Fn(Point2D) -> Point2D) {
        self.temp = TempCoordinates::default();

        for &sid in &self.affected.structures {
            let Some(s) = scene.structure(sid) else {
                continue;
            };
            for (aid, atom) in s.atoms.iter() {
                self.temp.atoms.insert((sid, aid), f(atom.position));
            }
            if let Some(circle) = &s.circle {
                self.temp.circles.insert(sid, f(circle.center));
            }
        }
        for &aid in &self.affected.annotations {
            if let Some(a) = scene.annotation(aid) {
                self.temp.annotations.insert(aid, f(a.position));
            }
        }
        if with_control_points {
            for &(spline_id, point_id) in &self.affected.control_points {
                if let Some(cp) = scene
                    .spline(spline_id)
                    .and_then(|sp| sp.control_points.get(point_id))
                {
                    self.temp.control_points.insert((spline_id, point_id), f(cp.position));
                }
            }
        }
    }

    /// Forget the gesture and its temporary coordinates
    pub fn reset(&mut self) {
        self.gesture = None;
        self.affected = AffectedObjects::default();
        self.temp = TempCoordinates::default();
        self.origin = Point2D::default();
    }
}
