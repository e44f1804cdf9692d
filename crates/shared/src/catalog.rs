//! Scene catalog operations: lookups, insertion with cross-reference
//! maintenance, truncation cleanup and validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    Annotation, AnnotationId, Endpoint, IntermolecularEdge, IntermolecularKind, IntermolecularRef,
    ObjectRef, Point2D, Scene, Spline, SplineId, Structure, StructureId,
};

/// Problems found in a scene that was loaded from outside
#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Bond or ring refers to an atom the structure does not own
    UnknownAtom {
        structure_id: StructureId,
        atom_id: u32,
    },
    /// Endpoint refers to a ring the structure does not own
    UnknownRing {
        structure_id: StructureId,
        ring_id: u32,
    },
    /// Reference to a structure that is not in the catalog
    UnknownStructure(StructureId),
    /// Endpoint pair not allowed for the edge kind
    InvalidEndpoints(IntermolecularRef),
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::UnknownAtom {
                structure_id,
                atom_id,
            } => write!(f, "Structure {} has no atom {}", structure_id, atom_id),
            SceneError::UnknownRing {
                structure_id,
                ring_id,
            } => write!(f, "Structure {} has no ring {}", structure_id, ring_id),
            SceneError::UnknownStructure(id) => write!(f, "Structure {} not found", id),
            SceneError::InvalidEndpoints(r) => {
                write!(f, "Invalid endpoints for {:?} edge {}", r.kind, r.id)
            }
        }
    }
}

impl std::error::Error for SceneError {}

/// Colour of one object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorEntry {
    pub target: ObjectRef,
    pub color: String,
}

/// Every explicit colour in the scene, delivered to recolor listeners
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorState {
    pub entries: Vec<ColorEntry>,
}

impl Scene {
    // ── Lookups ───────────────────────────────────────────────

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.get(id)
    }

    pub fn structure_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.structures.get_mut(id)
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(id)
    }

    pub fn spline(&self, id: SplineId) -> Option<&Spline> {
        self.splines.get(id)
    }

    /// Whether the referenced entry exists in the catalog
    pub fn contains(&self, target: ObjectRef) -> bool {
        match target {
            ObjectRef::Structure { structure_id } => self.structures.contains(structure_id),
            ObjectRef::Atom {
                structure_id,
                atom_id,
            } => self
                .structure(structure_id)
                .is_some_and(|s| s.atoms.contains(atom_id)),
            ObjectRef::Edge {
                structure_id,
                edge_id,
            } => self
                .structure(structure_id)
                .is_some_and(|s| s.edges.contains(edge_id)),
            ObjectRef::Ring {
                structure_id,
                ring_id,
            } => self
                .structure(structure_id)
                .is_some_and(|s| s.rings.contains(ring_id)),
            ObjectRef::Annotation { annotation_id } => self.annotations.contains(annotation_id),
            ObjectRef::Intermolecular { kind, id } => {
                self.intermolecular.of_kind(kind).contains(id)
            }
            ObjectRef::Spline { spline_id } => self.splines.contains(spline_id),
            ObjectRef::ControlPoint {
                spline_id,
                point_id,
            } => self
                .spline(spline_id)
                .is_some_and(|s| s.control_points.contains(point_id)),
        }
    }

    /// At least one structure is enabled and visible
    pub fn has_visible_structures(&self) -> bool {
        self.structures.values().any(Structure::is_live)
    }

    /// Coordinate an endpoint currently resolves to
    pub fn resolve_endpoint(&self, endpoint: &Endpoint) -> Option<Point2D> {
        match endpoint {
            Endpoint::Atom {
                structure_id,
                atom_id,
            } => self.structure(*structure_id)?.atom_position(*atom_id),
            Endpoint::Ring {
                structure_id,
                ring_id,
            } => self.structure(*structure_id)?.ring_center(*ring_id),
            Endpoint::Point { position } => Some(*position),
        }
    }

    /// Segment an inter-structure edge currently spans
    pub fn intermolecular_segment(&self, r: IntermolecularRef) -> Option<(Point2D, Point2D)> {
        let edge = self.intermolecular.get(r)?;
        Some((
            self.resolve_endpoint(&edge.from)?,
            self.resolve_endpoint(&edge.to)?,
        ))
    }

    // ── Flags ─────────────────────────────────────────────────

    /// Enabled flag of a top-level object. Owned entries (atoms, bonds,
    /// rings, control points) follow their owner and report `None`.
    pub fn is_enabled(&self, target: ObjectRef) -> Option<bool> {
        match target {
            ObjectRef::Structure { structure_id } => self.structure(structure_id).map(|s| s.enabled),
            ObjectRef::Annotation { annotation_id } => {
                self.annotation(annotation_id).map(|a| a.enabled)
            }
            ObjectRef::Intermolecular { kind, id } => self
                .intermolecular
                .get(IntermolecularRef { kind, id })
                .map(|e| e.enabled),
            ObjectRef::Spline { spline_id } => self.spline(spline_id).map(|s| s.enabled),
            _ => None,
        }
    }

    /// Set the enabled flag, returning the previous value
    pub fn set_enabled(&mut self, target: ObjectRef, enabled: bool) -> Option<bool> {
        let slot = match target {
            ObjectRef::Structure { structure_id } => &mut self.structures.get_mut(structure_id)?.enabled,
            ObjectRef::Annotation { annotation_id } => {
                &mut self.annotations.get_mut(annotation_id)?.enabled
            }
            ObjectRef::Intermolecular { kind, id } => {
                &mut self.intermolecular.get_mut(IntermolecularRef { kind, id })?.enabled
            }
            ObjectRef::Spline { spline_id } => &mut self.splines.get_mut(spline_id)?.enabled,
            _ => return None,
        };
        Some(std::mem::replace(slot, enabled))
    }

    pub fn is_hidden(&self, target: ObjectRef) -> Option<bool> {
        match target {
            ObjectRef::Structure { structure_id } => self.structure(structure_id).map(|s| s.hidden),
            ObjectRef::Atom {
                structure_id,
                atom_id,
            } => self
                .structure(structure_id)?
                .atoms
                .get(atom_id)
                .map(|a| a.hidden),
            ObjectRef::Edge {
                structure_id,
                edge_id,
            } => self
                .structure(structure_id)?
                .edges
                .get(edge_id)
                .map(|e| e.hidden),
            ObjectRef::Annotation { annotation_id } => {
                self.annotation(annotation_id).map(|a| a.hidden)
            }
            ObjectRef::Intermolecular { kind, id } => self
                .intermolecular
                .get(IntermolecularRef { kind, id })
                .map(|e| e.hidden),
            ObjectRef::Spline { spline_id } => self.spline(spline_id).map(|s| s.hidden),
            ObjectRef::Ring { .. } | ObjectRef::ControlPoint { .. } => None,
        }
    }

    /// Set the hidden flag, returning the previous value
    pub fn set_hidden(&mut self, target: ObjectRef, hidden: bool) -> Option<bool> {
        let slot = match target {
            ObjectRef::Structure { structure_id } => &mut self.structures.get_mut(structure_id)?.hidden,
            ObjectRef::Atom {
                structure_id,
                atom_id,
            } => {
                &mut self
                    .structures
                    .get_mut(structure_id)?
                    .atoms
                    .get_mut(atom_id)?
                    .hidden
            }
            ObjectRef::Edge {
                structure_id,
                edge_id,
            } => {
                &mut self
                    .structures
                    .get_mut(structure_id)?
                    .edges
                    .get_mut(edge_id)?
                    .hidden
            }
            ObjectRef::Annotation { annotation_id } => {
                &mut self.annotations.get_mut(annotation_id)?.hidden
            }
            ObjectRef::Intermolecular { kind, id } => {
                &mut self.intermolecular.get_mut(IntermolecularRef { kind, id })?.hidden
            }
            ObjectRef::Spline { spline_id } => &mut self.splines.get_mut(spline_id)?.hidden,
            ObjectRef::Ring { .. } | ObjectRef::ControlPoint { .. } => return None,
        };
        Some(std::mem::replace(slot, hidden))
    }

    /// Explicit colour of an object. The outer `None` means the object
    /// cannot carry a colour (or does not exist).
    pub fn color(&self, target: ObjectRef) -> Option<Option<String>> {
        match target {
            ObjectRef::Structure { structure_id } => {
                self.structure(structure_id).map(|s| s.color.clone())
            }
            ObjectRef::Atom {
                structure_id,
                atom_id,
            } => self
                .structure(structure_id)?
                .atoms
                .get(atom_id)
                .map(|a| a.color.clone()),
            ObjectRef::Annotation { annotation_id } => {
                self.annotation(annotation_id).map(|a| a.color.clone())
            }
            ObjectRef::Intermolecular { kind, id } => self
                .intermolecular
                .get(IntermolecularRef { kind, id })
                .map(|e| e.color.clone()),
            ObjectRef::Spline { spline_id } => self.spline(spline_id).map(|s| s.color.clone()),
            _ => None,
        }
    }

    /// Set an explicit colour, returning the previous one
    pub fn set_color(&mut self, target: ObjectRef, color: Option<String>) -> Option<Option<String>> {
        let slot = match target {
            ObjectRef::Structure { structure_id } => &mut self.structures.get_mut(structure_id)?.color,
            ObjectRef::Atom {
                structure_id,
                atom_id,
            } => {
                &mut self
                    .structures
                    .get_mut(structure_id)?
                    .atoms
                    .get_mut(atom_id)?
                    .color
            }
            ObjectRef::Annotation { annotation_id } => {
                &mut self.annotations.get_mut(annotation_id)?.color
            }
            ObjectRef::Intermolecular { kind, id } => {
                &mut self.intermolecular.get_mut(IntermolecularRef { kind, id })?.color
            }
            ObjectRef::Spline { spline_id } => &mut self.splines.get_mut(spline_id)?.color,
            _ => return None,
        };
        Some(std::mem::replace(slot, color))
    }

    /// Snapshot of every explicit colour
    pub fn color_state(&self) -> ColorState {
        let mut entries = Vec::new();
        for (structure_id, s) in self.structures.iter() {
            if let Some(color) = &s.color {
                entries.push(ColorEntry {
                    target: ObjectRef::Structure { structure_id },
                    color: color.clone(),
                });
            }
            for (atom_id, a) in s.atoms.iter() {
                if let Some(color) = &a.color {
                    entries.push(ColorEntry {
                        target: ObjectRef::Atom {
                            structure_id,
                            atom_id,
                        },
                        color: color.clone(),
                    });
                }
            }
        }
        for (annotation_id, a) in self.annotations.iter() {
            if let Some(color) = &a.color {
                entries.push(ColorEntry {
                    target: ObjectRef::Annotation { annotation_id },
                    color: color.clone(),
                });
            }
        }
        for (r, e) in self.intermolecular.iter() {
            if let Some(color) = &e.color {
                entries.push(ColorEntry {
                    target: r.into(),
                    color: color.clone(),
                });
            }
        }
        for (spline_id, s) in self.splines.iter() {
            if let Some(color) = &s.color {
                entries.push(ColorEntry {
                    target: ObjectRef::Spline { spline_id },
                    color: color.clone(),
                });
            }
        }
        ColorState { entries }
    }

    // ── Insertion ─────────────────────────────────────────────

    pub fn insert_structure(&mut self, structure: Structure) -> StructureId {
        self.structures.insert(structure)
    }

    /// Insert an annotation and register it with the structures it names
    pub fn insert_annotation(&mut self, annotation: Annotation) -> AnnotationId {
        let structure_ids = annotation.structure_ids.clone();
        let id = self.annotations.insert(annotation);
        for sid in structure_ids {
            if let Some(s) = self.structures.get_mut(sid) {
                s.annotation_ids.insert(id);
            }
        }
        id
    }

    /// Insert a spline and register it with the structures it connects
    pub fn insert_spline(&mut self, spline: Spline) -> SplineId {
        let structure_ids = spline.structure_ids.clone();
        let id = self.splines.insert(spline);
        for sid in structure_ids {
            if let Some(s) = self.structures.get_mut(sid) {
                s.spline_ids.insert(id);
            }
        }
        id
    }

    /// Insert an inter-structure edge and register it with its endpoints'
    /// structures
    pub fn insert_intermolecular(
        &mut self,
        kind: IntermolecularKind,
        edge: IntermolecularEdge,
    ) -> IntermolecularRef {
        let structure_ids: Vec<_> = edge.structure_ids().collect();
        let id = self.intermolecular.of_kind_mut(kind).insert(edge);
        let r = IntermolecularRef { kind, id };
        for sid in structure_ids {
            if let Some(s) = self.structures.get_mut(sid) {
                s.intermolecular_ids.insert(r);
            }
        }
        r
    }

    /// Attach an annotation to a structure (both directions).
    /// Returns false if either side is missing or already linked.
    pub fn link_annotation(&mut self, annotation_id: AnnotationId, structure_id: StructureId) -> bool {
        if !self.structures.contains(structure_id) {
            return false;
        }
        let Some(annotation) = self.annotations.get_mut(annotation_id) else {
            return false;
        };
        let inserted = annotation.structure_ids.insert(structure_id);
        if let Some(s) = self.structures.get_mut(structure_id) {
            s.annotation_ids.insert(annotation_id);
        }
        inserted
    }

    /// Detach an annotation from a structure (both directions)
    pub fn unlink_annotation(&mut self, annotation_id: AnnotationId, structure_id: StructureId) -> bool {
        let removed = self
            .annotations
            .get_mut(annotation_id)
            .is_some_and(|a| a.structure_ids.remove(&structure_id));
        if let Some(s) = self.structures.get_mut(structure_id) {
            s.annotation_ids.remove(&annotation_id);
        }
        removed
    }

    // ── Cross references ──────────────────────────────────────

    /// Recompute every structure-side back-reference set from the forward
    /// links held by annotations, splines and inter-structure edges.
    /// Forward links to structures that no longer exist are dropped.
    pub fn rebuild_cross_references(&mut self) {
        for (_, s) in self.structures.iter_mut() {
            s.annotation_ids.clear();
            s.spline_ids.clear();
            s.intermolecular_ids.clear();
        }

        let existing: BTreeSet<StructureId> = self.structures.ids().collect();

        for (id, a) in self.annotations.iter_mut() {
            a.structure_ids.retain(|sid| existing.contains(sid));
            for sid in &a.structure_ids {
                if let Some(s) = self.structures.get_mut(*sid) {
                    s.annotation_ids.insert(id);
                }
            }
        }
        for (id, sp) in self.splines.iter_mut() {
            sp.structure_ids.retain(|sid| existing.contains(sid));
            for sid in &sp.structure_ids {
                if let Some(s) = self.structures.get_mut(*sid) {
                    s.spline_ids.insert(id);
                }
            }
        }
        let edges: Vec<(IntermolecularRef, Vec<StructureId>)> = self
            .intermolecular
            .iter()
            .map(|(r, e)| (r, e.structure_ids().collect()))
            .collect();
        for (r, sids) in edges {
            for sid in sids {
                if let Some(s) = self.structures.get_mut(sid) {
                    s.intermolecular_ids.insert(r);
                }
            }
        }
    }

    /// Remove one identifier from every cross-reference set in the scene
    fn scrub(&mut self, target: ObjectRef) {
        match target {
            ObjectRef::Structure { structure_id } => {
                for (_, a) in self.annotations.iter_mut() {
                    a.structure_ids.remove(&structure_id);
                }
                for (_, sp) in self.splines.iter_mut() {
                    sp.structure_ids.remove(&structure_id);
                }
            }
            ObjectRef::Annotation { annotation_id } => {
                for (_, s) in self.structures.iter_mut() {
                    s.annotation_ids.remove(&annotation_id);
                }
            }
            ObjectRef::Spline { spline_id } => {
                for (_, s) in self.structures.iter_mut() {
                    s.spline_ids.remove(&spline_id);
                }
            }
            ObjectRef::Intermolecular { kind, id } => {
                let r = IntermolecularRef { kind, id };
                for (_, s) in self.structures.iter_mut() {
                    s.intermolecular_ids.remove(&r);
                }
            }
            _ => {}
        }
    }

    // ── Truncation cleanup ────────────────────────────────────

    /// Physically delete every object created at a history step after
    /// `cursor` (all stepped objects when `cursor` is `None`) and scrub
    /// their identifiers from the remaining objects.
    ///
    /// Inter-structure edges whose endpoint structure is deleted go with it.
    /// Returns the deleted references.
    pub fn delete_created_after(&mut self, cursor: Option<usize>) -> Vec<ObjectRef> {
        let is_future = |step: Option<usize>| match (step, cursor) {
            (Some(s), Some(c)) => s > c,
            (Some(_), None) => true,
            (None, _) => false,
        };

        let mut doomed: Vec<ObjectRef> = Vec::new();
        for (structure_id, s) in self.structures.iter() {
            if is_future(s.created_at_step) {
                doomed.push(ObjectRef::Structure { structure_id });
            }
        }
        let doomed_structures: BTreeSet<StructureId> =
            doomed.iter().filter_map(|r| r.owning_structure()).collect();

        for (annotation_id, a) in self.annotations.iter() {
            if is_future(a.created_at_step) {
                doomed.push(ObjectRef::Annotation { annotation_id });
            }
        }
        for (spline_id, sp) in self.splines.iter() {
            if is_future(sp.created_at_step) {
                doomed.push(ObjectRef::Spline { spline_id });
            }
        }
        for (r, e) in self.intermolecular.iter() {
            let orphaned = e.structure_ids().any(|sid| doomed_structures.contains(&sid));
            if is_future(e.created_at_step) || orphaned {
                doomed.push(r.into());
            }
        }

        for target in &doomed {
            match *target {
                ObjectRef::Structure { structure_id } => {
                    self.structures.remove(structure_id);
                }
                ObjectRef::Annotation { annotation_id } => {
                    self.annotations.remove(annotation_id);
                }
                ObjectRef::Spline { spline_id } => {
                    self.splines.remove(spline_id);
                }
                ObjectRef::Intermolecular { kind, id } => {
                    self.intermolecular.of_kind_mut(kind).remove(id);
                }
                _ => {}
            }
            self.scrub(*target);
        }

        if !doomed.is_empty() {
            tracing::debug!("Deleted {} objects created after step {:?}", doomed.len(), cursor);
        }
        doomed
    }

    /// Drop every creation stamp, making all objects part of the baseline
    pub fn forget_creation_steps(&mut self) {
        for (_, s) in self.structures.iter_mut() {
            s.created_at_step = None;
        }
        for (_, a) in self.annotations.iter_mut() {
            a.created_at_step = None;
        }
        for (_, sp) in self.splines.iter_mut() {
            sp.created_at_step = None;
        }
        for kind in IntermolecularKind::ALL {
            for (_, e) in self.intermolecular.of_kind_mut(kind).iter_mut() {
                e.created_at_step = None;
            }
        }
    }

    // ── Validation ────────────────────────────────────────────

    /// Check internal references and repair id allocators after loading
    pub fn validate(&mut self) -> Result<(), SceneError> {
        self.structures.normalize();
        self.annotations.normalize();
        self.splines.normalize();
        for kind in IntermolecularKind::ALL {
            self.intermolecular.of_kind_mut(kind).normalize();
        }

        for (structure_id, s) in self.structures.iter_mut() {
            s.atoms.normalize();
            s.edges.normalize();
            s.rings.normalize();
            for (_, e) in s.edges.iter() {
                for atom_id in [e.from, e.to] {
                    if !s.atoms.contains(atom_id) {
                        return Err(SceneError::UnknownAtom {
                            structure_id,
                            atom_id,
                        });
                    }
                }
            }
            for (_, ring) in s.rings.iter() {
                if let Some(atom_id) = ring.atoms.iter().find(|a| !s.atoms.contains(**a)) {
                    return Err(SceneError::UnknownAtom {
                        structure_id,
                        atom_id: *atom_id,
                    });
                }
            }
        }
        for (_, sp) in self.splines.iter_mut() {
            sp.control_points.normalize();
        }

        for (r, e) in self.intermolecular.iter() {
            if !r.kind.accepts(&e.from, &e.to) {
                return Err(SceneError::InvalidEndpoints(r));
            }
            for endpoint in [&e.from, &e.to] {
                self.check_endpoint(endpoint)?;
            }
        }
        for (_, a) in self.annotations.iter() {
            if let Some(sid) = a.structure_ids.iter().find(|sid| !self.structures.contains(**sid)) {
                return Err(SceneError::UnknownStructure(*sid));
            }
        }

        self.rebuild_cross_references();
        Ok(())
    }

    fn check_endpoint(&self, endpoint: &Endpoint) -> Result<(), SceneError> {
        match *endpoint {
            Endpoint::Atom {
                structure_id,
                atom_id,
            } => {
                let s = self
                    .structure(structure_id)
                    .ok_or(SceneError::UnknownStructure(structure_id))?;
                if !s.atoms.contains(atom_id) {
                    return Err(SceneError::UnknownAtom {
                        structure_id,
                        atom_id,
                    });
                }
            }
            Endpoint::Ring {
                structure_id,
                ring_id,
            } => {
                let s = self
                    .structure(structure_id)
                    .ok_or(SceneError::UnknownStructure(structure_id))?;
                if !s.rings.contains(ring_id) {
                    return Err(SceneError::UnknownRing {
                        structure_id,
                        ring_id,
                    });
                }
            }
            Endpoint::Point { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Atom, Ring};

    fn structure_with_atoms(name: &str, positions: &[(f64, f64)]) -> Structure {
        let mut s = Structure::new(name);
        for (x, y) in positions {
            s.atoms.insert(Atom {
                element: "C".into(),
                position: Point2D::new(*x, *y),
                hidden: false,
                color: None,
            });
        }
        s
    }

    fn label(text: &str, structure_ids: &[StructureId]) -> Annotation {
        Annotation {
            text: text.into(),
            position: Point2D::new(0.0, 0.0),
            width: 1.0,
            height: 1.0,
            hidden: false,
            enabled: true,
            color: None,
            created_at_step: None,
            structure_ids: structure_ids.iter().copied().collect(),
        }
    }

    #[test]
    fn test_insert_annotation_registers_back_reference() {
        let mut scene = Scene::default();
        let sid = scene.insert_structure(structure_with_atoms("a", &[(0.0, 0.0)]));
        let aid = scene.insert_annotation(label("L", &[sid]));
        assert!(scene.structure(sid).unwrap().annotation_ids.contains(&aid));
    }

    #[test]
    fn test_insert_intermolecular_registers_both_structures() {
        let mut scene = Scene::default();
        let s0 = scene.insert_structure(structure_with_atoms("a", &[(0.0, 0.0)]));
        let s1 = scene.insert_structure(structure_with_atoms("b", &[(5.0, 0.0)]));
        let r = scene.insert_intermolecular(
            IntermolecularKind::AtomPair,
            IntermolecularEdge::new(
                Endpoint::Atom {
                    structure_id: s0,
                    atom_id: 0,
                },
                Endpoint::Atom {
                    structure_id: s1,
                    atom_id: 0,
                },
            ),
        );
        assert!(scene.structure(s0).unwrap().intermolecular_ids.contains(&r));
        assert!(scene.structure(s1).unwrap().intermolecular_ids.contains(&r));
        assert_eq!(
            scene.intermolecular_segment(r),
            Some((Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0)))
        );
    }

    #[test]
    fn test_link_unlink_annotation() {
        let mut scene = Scene::default();
        let sid = scene.insert_structure(structure_with_atoms("a", &[(0.0, 0.0)]));
        let aid = scene.insert_annotation(label("L", &[]));
        assert!(scene.link_annotation(aid, sid));
        assert!(!scene.link_annotation(aid, sid));
        assert!(scene.annotation(aid).unwrap().structure_ids.contains(&sid));
        assert!(scene.unlink_annotation(aid, sid));
        assert!(scene.structure(sid).unwrap().annotation_ids.is_empty());
        assert!(!scene.link_annotation(aid, 42));
    }

    #[test]
    fn test_set_flags_return_previous_value() {
        let mut scene = Scene::default();
        let sid = scene.insert_structure(structure_with_atoms("a", &[(0.0, 0.0)]));
        let target = ObjectRef::Structure { structure_id: sid };
        assert_eq!(scene.set_hidden(target, true), Some(false));
        assert_eq!(scene.is_hidden(target), Some(true));
        assert_eq!(scene.set_enabled(target, false), Some(true));
        assert!(!scene.has_visible_structures());
        assert_eq!(
            scene.set_hidden(
                ObjectRef::Ring {
                    structure_id: sid,
                    ring_id: 0
                },
                true
            ),
            None
        );
    }

    #[test]
    fn test_delete_created_after_scrubs_references() {
        let mut scene = Scene::default();
        let base = scene.insert_structure(structure_with_atoms("base", &[(0.0, 0.0)]));
        let mut late = structure_with_atoms("late", &[(4.0, 0.0)]);
        late.created_at_step = Some(2);
        let late_id = scene.insert_structure(late);

        let mut note = label("old note", &[base]);
        note.created_at_step = Some(0);
        let note_id = scene.insert_annotation(note);
        scene.link_annotation(note_id, late_id);

        let edge = scene.insert_intermolecular(
            IntermolecularKind::Distance,
            IntermolecularEdge::new(
                Endpoint::Atom {
                    structure_id: base,
                    atom_id: 0,
                },
                Endpoint::Atom {
                    structure_id: late_id,
                    atom_id: 0,
                },
            ),
        );

        let deleted = scene.delete_created_after(Some(1));
        assert!(deleted.contains(&ObjectRef::Structure {
            structure_id: late_id
        }));
        assert!(deleted.contains(&edge.into()));
        assert!(scene.structure(late_id).is_none());
        assert!(scene.annotation(note_id).is_some());
        assert!(!scene.annotation(note_id).unwrap().structure_ids.contains(&late_id));
        assert!(scene.structure(base).unwrap().intermolecular_ids.is_empty());

        // identifiers are not recycled after deletion
        let again = scene.insert_structure(structure_with_atoms("again", &[]));
        assert!(again > late_id);
    }

    #[test]
    fn test_delete_created_after_start_keeps_loaded_objects() {
        let mut scene = Scene::default();
        scene.insert_structure(structure_with_atoms("loaded", &[(0.0, 0.0)]));
        let mut fresh = structure_with_atoms("fresh", &[(1.0, 0.0)]);
        fresh.created_at_step = Some(0);
        scene.insert_structure(fresh);
        let deleted = scene.delete_created_after(None);
        assert_eq!(deleted.len(), 1);
        assert_eq!(scene.structures.len(), 1);
    }

    #[test]
    fn test_forget_creation_steps_protects_from_truncation() {
        let mut scene = Scene::default();
        let mut fresh = structure_with_atoms("fresh", &[(1.0, 0.0)]);
        fresh.created_at_step = Some(0);
        let sid = scene.insert_structure(fresh);
        let mut note = label("note", &[sid]);
        note.created_at_step = Some(1);
        scene.insert_annotation(note);

        scene.forget_creation_steps();
        assert!(scene.delete_created_after(None).is_empty());
        assert!(scene.structure(sid).is_some());
        assert_eq!(scene.annotations.len(), 1);
    }

    #[test]
    fn test_validate_rejects_dangling_ring_atom() {
        let mut scene = Scene::default();
        let mut s = structure_with_atoms("a", &[(0.0, 0.0), (1.0, 0.0)]);
        s.rings.insert(Ring {
            atoms: vec![0, 1, 5],
            aromatic: false,
        });
        let sid = scene.insert_structure(s);
        assert_eq!(
            scene.validate(),
            Err(SceneError::UnknownAtom {
                structure_id: sid,
                atom_id: 5
            })
        );
    }

    #[test]
    fn test_validate_rejects_wrong_endpoint_kind() {
        let mut scene = Scene::default();
        let sid = scene.insert_structure(structure_with_atoms("a", &[(0.0, 0.0)]));
        let r = scene.insert_intermolecular(
            IntermolecularKind::PiStacking,
            IntermolecularEdge::new(
                Endpoint::Atom {
                    structure_id: sid,
                    atom_id: 0,
                },
                Endpoint::Atom {
                    structure_id: sid,
                    atom_id: 0,
                },
            ),
        );
        assert_eq!(scene.validate(), Err(SceneError::InvalidEndpoints(r)));
    }

    #[test]
    fn test_validate_rebuilds_back_references() {
        let mut scene = Scene::default();
        let sid = scene.insert_structure(structure_with_atoms("a", &[(0.0, 0.0)]));
        let aid = scene.annotations.insert(label("L", &[sid]));
        assert!(scene.structure(sid).unwrap().annotation_ids.is_empty());
        scene.validate().unwrap();
        assert!(scene.structure(sid).unwrap().annotation_ids.contains(&aid));
    }

    #[test]
    fn test_color_state_lists_explicit_colors() {
        let mut scene = Scene::default();
        let sid = scene.insert_structure(structure_with_atoms("a", &[(0.0, 0.0)]));
        scene.set_color(ObjectRef::Structure { structure_id: sid }, Some("#ff0000".into()));
        scene.set_color(
            ObjectRef::Atom {
                structure_id: sid,
                atom_id: 0,
            },
            Some("#00ff00".into()),
        );
        let colors = scene.color_state();
        assert_eq!(colors.entries.len(), 2);
        assert_eq!(colors.entries[0].color, "#ff0000");
    }

    #[test]
    fn test_scene_error_display() {
        let err = SceneError::UnknownAtom {
            structure_id: 1,
            atom_id: 7,
        };
        assert_eq!(err.to_string(), "Structure 1 has no atom 7");
    }
}
