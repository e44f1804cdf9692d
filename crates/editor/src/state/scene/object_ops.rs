//! Object CRUD operations
//!
//! New objects go into the catalog disabled and tagged with the step that
//! creates them; the committed step's `SetEnabled` change is what makes
//! them live, so undo hides them and redo brings the same record back.

use shared::{
    Annotation, AnnotationId, Endpoint, IntermolecularEdge, IntermolecularKind, IntermolecularRef,
    ObjectRef, Scene, Spline, SplineId, Structure, StructureId,
};

use super::{Change, HistoryStep, SceneState, StepAction};
use crate::shape::{enclosing_circle, structure_boundary};
use crate::state::settings::EditorConfig;

impl SceneState {
    fn commit_creation(&mut self, target: ObjectRef) {
        self.commit(HistoryStep::new(vec![Change::enable(target)]).with_action(StepAction::EmitSnapshot));
    }

    /// Add a structure as a new undoable step
    pub fn add_structure(&mut self, mut structure: Structure) -> StructureId {
        self.discard_future();
        structure.enabled = false;
        structure.created_at_step = Some(self.next_step_index());
        if structure.boundary.is_empty() {
            structure.boundary = structure_boundary(&structure);
        }
        let structure_id = self.scene.insert_structure(structure);
        self.commit_creation(ObjectRef::Structure { structure_id });
        tracing::info!("Added structure {}", structure_id);
        structure_id
    }

    /// Add an annotation; links to unknown structures are dropped
    pub fn add_annotation(&mut self, mut annotation: Annotation) -> AnnotationId {
        self.discard_future();
        annotation
            .structure_ids
            .retain(|sid| self.scene.structures.contains(*sid));
        annotation.enabled = false;
        annotation.created_at_step = Some(self.next_step_index());
        let annotation_id = self.scene.insert_annotation(annotation);
        self.commit_creation(ObjectRef::Annotation { annotation_id });
        tracing::info!("Added annotation {}", annotation_id);
        annotation_id
    }

    /// Add a spline; links to unknown structures are dropped
    pub fn add_spline(&mut self, mut spline: Spline) -> SplineId {
        self.discard_future();
        spline
            .structure_ids
            .retain(|sid| self.scene.structures.contains(*sid));
        spline.enabled = false;
        spline.created_at_step = Some(self.next_step_index());
        let spline_id = self.scene.insert_spline(spline);
        self.commit_creation(ObjectRef::Spline { spline_id });
        tracing::info!("Added spline {}", spline_id);
        spline_id
    }

    /// Add an inter-structure edge. `None` if the kind does not accept the
    /// endpoints or an endpoint does not resolve.
    pub fn add_intermolecular(
        &mut self,
        kind: IntermolecularKind,
        from: Endpoint,
        to: Endpoint,
    ) -> Option<IntermolecularRef> {
        if !kind.accepts(&from, &to) {
            tracing::warn!("{:?} edge cannot connect {:?} and {:?}", kind, from, to);
            return None;
        }
        if self.scene.resolve_endpoint(&from).is_none() || self.scene.resolve_endpoint(&to).is_none() {
            tracing::warn!("{:?} edge has an unresolved endpoint", kind);
            return None;
        }
        self.discard_future();
        let mut edge = IntermolecularEdge::new(from, to);
        edge.enabled = false;
        edge.created_at_step = Some(self.next_step_index());
        let r = self.scene.insert_intermolecular(kind, edge);
        self.commit_creation(r.into());
        tracing::info!("Added {:?} edge {}", kind, r.id);
        Some(r)
    }

    /// Disable top-level objects in one step. Returns how many were removed.
    pub fn remove_objects(&mut self, targets: &[ObjectRef]) -> usize {
        let changes: Vec<Change> = unique(targets)
            .filter(|t| self.scene.is_enabled(*t) == Some(true))
            .map(Change::disable)
            .collect();
        self.commit_if_any(changes, StepAction::EmitSnapshot)
    }

    /// Hide or show objects in one step. Returns how many changed.
    pub fn set_hidden(&mut self, targets: &[ObjectRef], hidden: bool) -> usize {
        let changes: Vec<Change> = unique(targets)
            .filter_map(|target| {
                let from = self.scene.is_hidden(target)?;
                (from != hidden).then_some(Change::SetHidden {
                    target,
                    from,
                    to: hidden,
                })
            })
            .collect();
        self.commit_if_any(changes, StepAction::EmitSnapshot)
    }

    /// Set or clear explicit colours in one step. Returns how many changed.
    pub fn set_color(&mut self, targets: &[ObjectRef], color: Option<String>) -> usize {
        let changes: Vec<Change> = unique(targets)
            .filter_map(|target| {
                let from = self.scene.color(target)?;
                (from != color).then(|| Change::SetColor {
                    target,
                    from,
                    to: color.clone(),
                })
            })
            .collect();
        self.commit_if_any(changes, StepAction::Recolor)
    }

    /// Switch a structure between its atoms and its simplified circle.
    /// The circle is created around the atoms the first time.
    pub fn set_circle_mode(&mut self, structure_id: StructureId, active: bool) -> bool {
        let Some(s) = self.scene.structure(structure_id) else {
            return false;
        };
        let from = s.circle;
        let to = match from {
            Some(c) => Some(shared::StructureCircle { active, ..c }),
            None if active => enclosing_circle(s, self.config.proximity.circle_padding, &self.config.hit)
                .map(|c| shared::StructureCircle { active: true, ..c }),
            None => None,
        };
        if to == from {
            return false;
        }
        self.commit(
            HistoryStep::new(vec![Change::SetCircle {
                structure_id,
                from,
                to,
            }])
            .with_action(StepAction::EmitSnapshot),
        );
        true
    }

    pub fn set_annotation_text(&mut self, annotation_id: AnnotationId, text: String) -> bool {
        let Some(from) = self.scene.annotation(annotation_id).map(|a| a.text.clone()) else {
            return false;
        };
        if from == text {
            return false;
        }
        self.commit(
            HistoryStep::new(vec![Change::SetAnnotationText {
                annotation_id,
                from,
                to: text,
            }])
            .with_action(StepAction::EmitSnapshot),
        );
        true
    }

    /// Attach an annotation to a structure as an undoable step
    pub fn link_annotation(&mut self, annotation_id: AnnotationId, structure_id: StructureId) -> bool {
        let linkable = self.scene.structures.contains(structure_id)
            && self
                .scene
                .annotation(annotation_id)
                .is_some_and(|a| !a.structure_ids.contains(&structure_id));
        if !linkable {
            return false;
        }
        self.commit(HistoryStep::new(vec![Change::LinkAnnotation {
            annotation_id,
            structure_id,
        }]));
        true
    }

    pub fn unlink_annotation(&mut self, annotation_id: AnnotationId, structure_id: StructureId) -> bool {
        let linked = self
            .scene
            .annotation(annotation_id)
            .is_some_and(|a| a.structure_ids.contains(&structure_id));
        if !linked {
            return false;
        }
        self.commit(HistoryStep::new(vec![Change::UnlinkAnnotation {
            annotation_id,
            structure_id,
        }]));
        true
    }

    /// Change the configuration as an undoable step
    pub fn update_config(&mut self, update: impl FnOnce(&mut EditorConfig)) -> bool {
        let mut next = self.config.clone();
        update(&mut next);
        if next == self.config {
            return false;
        }
        self.config = next;
        self.commit(HistoryStep::new(Vec::new()).with_action(StepAction::Recolor));
        true
    }

    fn commit_if_any(&mut self, changes: Vec<Change>, action: StepAction) -> usize {
        let count = changes.len();
        if count > 0 {
            self.commit(HistoryStep::new(changes).with_action(action));
        }
        count
    }

    /// Objects of the scene that are not live any more (disabled, or owned
    /// by a disabled structure)
    pub fn is_retired(&self, target: ObjectRef) -> bool {
        is_retired(&self.scene, target)
    }
}

/// Missing, disabled, or part of a disabled parent
pub fn is_retired(scene: &Scene, target: ObjectRef) -> bool {
    if !scene.contains(target) {
        return true;
    }
    if let Some(sid) = target.owning_structure() {
        return scene.structure(sid).is_some_and(|s| !s.enabled);
    }
    match target {
        ObjectRef::ControlPoint { spline_id, .. } => scene.spline(spline_id).is_some_and(|s| !s.enabled),
        other => scene.is_enabled(other) == Some(false),
    }
}

fn unique(targets: &[ObjectRef]) -> impl Iterator<Item = ObjectRef> + '_ {
    let mut seen = std::collections::BTreeSet::new();
    targets.iter().copied().filter(move |t| seen.insert(*t))
}
