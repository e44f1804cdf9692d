//! Headless editor for programmatic scene manipulation.
//!
//! `Editor` owns the scene state, the committed selection, the gesture
//! tracker and an in-progress lasso. It drives the same selection, gesture
//! and history code a front-end would, without any rendering.

use shared::{
    Annotation, AnnotationId, Endpoint, IntermolecularKind, IntermolecularRef, ObjectRef, Point2D,
    Scene, Spline, SplineId, Structure, StructureId,
};

use crate::change_map::{build_mirror_change_map, build_movement_change_map, build_rotation_change_map};
use crate::closest::{
    closest_atom_resolving_circles, closest_enabled_atom, closest_enabled_ring,
    closest_enabled_spline_control_point, closest_enabled_structure, CircleMode, ClosestAtom,
    ClosestControlPoint, ClosestRing, ClosestStructure,
};
use crate::collision::{find_all_collisions, find_topmost_hit, CollisionQuery, Hit};
use crate::lasso::LassoSelector;
use crate::state::interaction::{AffectedObjects, GestureKind, InteractionObject};
use crate::state::scene::SceneState;
use crate::state::selection::SelectionState;
use crate::state::settings::EditorConfig;

/// Headless editor: scene, selection, gestures and history
#[derive(Default)]
pub struct Editor {
    pub scene: SceneState,
    pub selection: SelectionState,
    pub interaction: InteractionObject,
    lasso: Option<LassoSelector>,
}

impl Editor {
    /// Create a new empty editor with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            scene: SceneState::with_config(config),
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.scene.config
    }

    // ── Scene load / export ───────────────────────────────────

    /// Load a scene (replaces current, starts a fresh history)
    pub fn load_scene(&mut self, scene: Scene) -> Result<(), String> {
        self.scene.load_scene(scene).map_err(|e| e.to_string())?;
        self.selection.clear();
        self.interaction.reset();
        self.lasso = None;
        Ok(())
    }

    /// Load a scene from JSON string
    pub fn load_scene_json(&mut self, json: &str) -> Result<(), String> {
        let scene = SceneState::parse_scene(json)?;
        self.load_scene(scene)
    }

    /// Export the current scene as JSON
    pub fn export_scene_json(&self) -> String {
        self.scene.scene_json().unwrap_or_default()
    }

    // ── Object creation / removal ─────────────────────────────

    pub fn add_structure(&mut self, structure: Structure) -> StructureId {
        self.abort_gestures();
        self.scene.add_structure(structure)
    }

    pub fn add_annotation(&mut self, annotation: Annotation) -> AnnotationId {
        self.abort_gestures();
        self.scene.add_annotation(annotation)
    }

    pub fn set_annotation_text(&mut self, annotation_id: AnnotationId, text: String) -> bool {
        self.abort_gestures();
        self.scene.set_annotation_text(annotation_id, text)
    }

    pub fn link_annotation(&mut self, annotation_id: AnnotationId, structure_id: StructureId) -> bool {
        self.abort_gestures();
        self.scene.link_annotation(annotation_id, structure_id)
    }

    pub fn unlink_annotation(&mut self, annotation_id: AnnotationId, structure_id: StructureId) -> bool {
        self.abort_gestures();
        self.scene.unlink_annotation(annotation_id, structure_id)
    }

    pub fn add_spline(&mut self, spline: Spline) -> SplineId {
        self.abort_gestures();
        self.scene.add_spline(spline)
    }

    pub fn add_intermolecular(
        &mut self,
        kind: IntermolecularKind,
        from: Endpoint,
        to: Endpoint,
    ) -> Option<IntermolecularRef> {
        self.abort_gestures();
        self.scene.add_intermolecular(kind, from, to)
    }

    /// Remove the objects owning the selected entries
    pub fn remove_selected(&mut self) -> usize {
        let targets: Vec<ObjectRef> = self.selection.all().iter().map(|t| top_level(*t)).collect();
        self.remove(&targets)
    }

    pub fn remove(&mut self, targets: &[ObjectRef]) -> usize {
        self.abort_gestures();
        let removed = self.scene.remove_objects(targets);
        self.selection.retain_existing(&self.scene.scene);
        removed
    }

    // ── Selection ─────────────────────────────────────────────

    /// Select the topmost object under `point`. With `additive` the hit
    /// toggles in the current selection; without it, a miss clears it.
    pub fn click(&mut self, point: Point2D, additive: bool) -> Option<Hit> {
        let query = CollisionQuery::point(point);
        let hit = find_topmost_hit(&self.scene.scene, &query, &self.scene.config.hit);
        match (&hit, additive) {
            (Some(h), true) => self.selection.toggle(h.object_ref()),
            (Some(h), false) => self.selection.select(h.object_ref()),
            (None, true) => {}
            (None, false) => self.selection.clear(),
        }
        hit
    }

    /// Select everything touching the rectangle spanned by `a` and `b`.
    /// Returns the number of objects found.
    pub fn select_rectangle(&mut self, a: Point2D, b: Point2D, additive: bool) -> usize {
        let query = CollisionQuery::rectangle(a, b);
        let found = find_all_collisions(&self.scene.scene, &query, &self.scene.config.hit);
        let count = found.len();
        if additive {
            self.selection.extend(found);
        } else {
            self.selection.replace(found);
        }
        count
    }

    pub fn select(&mut self, targets: &[ObjectRef]) {
        self.selection.replace(targets.iter().copied());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn begin_lasso(&mut self, start: Point2D) {
        self.lasso = Some(LassoSelector::begin(
            &self.scene.scene,
            &self.scene.config.hit,
            start,
        ));
    }

    /// Add a vertex to the running lasso. False if no lasso is active.
    pub fn extend_lasso(&mut self, point: Point2D) -> bool {
        match self.lasso.as_mut() {
            Some(lasso) => {
                lasso.extend(point);
                true
            }
            None => false,
        }
    }

    pub fn lasso(&self) -> Option<&LassoSelector> {
        self.lasso.as_ref()
    }

    /// Finish the lasso and apply its result to the selection.
    /// Returns the number of objects the lasso picked.
    pub fn end_lasso(&mut self, additive: bool) -> usize {
        let Some(lasso) = self.lasso.take() else {
            return 0;
        };
        let picked = lasso.finish();
        let count = picked.len();
        if additive {
            self.selection.extend(picked);
        } else {
            self.selection.replace(picked);
        }
        count
    }

    pub fn cancel_lasso(&mut self) {
        if let Some(lasso) = self.lasso.take() {
            lasso.cancel();
        }
    }

    // ── Gestures ──────────────────────────────────────────────

    fn begin_gesture(&mut self, kind: GestureKind, origin: Point2D) -> bool {
        let affected = AffectedObjects::from_selection(&self.scene.scene, self.selection.all());
        if affected.is_empty() {
            return false;
        }
        self.interaction.begin(kind, affected, origin);
        true
    }

    /// Start dragging the selection. False if nothing selected can move.
    pub fn begin_move(&mut self, at: Point2D) -> bool {
        self.begin_gesture(GestureKind::Move, at)
    }

    pub fn drag_to(&mut self, at: Point2D) {
        if self.interaction.gesture() == Some(GestureKind::Move) {
            self.interaction.translate_to(&self.scene.scene, at);
        }
    }

    /// Start rotating the selection about `pivot`
    pub fn begin_rotation(&mut self, pivot: Point2D) -> bool {
        self.begin_gesture(GestureKind::Rotate, pivot)
    }

    /// Set the rotation angle (radians, counter-clockwise) of the running gesture
    pub fn rotate_to(&mut self, angle: f64) {
        if self.interaction.gesture() == Some(GestureKind::Rotate) {
            let pivot = self.interaction.origin();
            self.interaction.rotate_by(&self.scene.scene, pivot, angle);
        }
    }

    /// Finish the running gesture and commit what it changed.
    /// Returns the index of the committed step, if any.
    pub fn end_gesture(&mut self) -> Option<usize> {
        let map = match self.interaction.gesture()? {
            GestureKind::Move => build_movement_change_map(&self.scene.scene, &self.interaction),
            GestureKind::Rotate => build_rotation_change_map(&self.scene.scene, &self.interaction),
            GestureKind::Mirror => build_mirror_change_map(&self.scene.scene, &self.interaction),
        };
        self.interaction.reset();
        self.scene.commit_change_map(map)
    }

    /// Reflect the selection across the line through `a` and `b` in one step
    pub fn mirror_selection(&mut self, a: Point2D, b: Point2D) -> Option<usize> {
        if !self.begin_gesture(GestureKind::Mirror, a) {
            return None;
        }
        self.interaction.mirror_across(&self.scene.scene, a, b);
        self.end_gesture()
    }

    /// Drop the running gesture; the scene keeps its committed coordinates
    pub fn cancel_gesture(&mut self) {
        self.interaction.reset();
    }

    fn abort_gestures(&mut self) {
        self.cancel_gesture();
        self.cancel_lasso();
    }

    // ── Appearance / config ───────────────────────────────────

    /// Hide or show the selected objects
    pub fn set_selection_hidden(&mut self, hidden: bool) -> usize {
        let targets = self.selection.all().to_vec();
        self.scene.set_hidden(&targets, hidden)
    }

    /// Set or clear the colour of the selected objects
    pub fn set_selection_color(&mut self, color: Option<String>) -> usize {
        let targets = self.selection.all().to_vec();
        self.scene.set_color(&targets, color)
    }

    pub fn set_circle_mode(&mut self, structure_id: StructureId, active: bool) -> bool {
        self.abort_gestures();
        self.scene.set_circle_mode(structure_id, active)
    }

    pub fn update_config(&mut self, update: impl FnOnce(&mut EditorConfig)) -> bool {
        self.scene.update_config(update)
    }

    // ── History ───────────────────────────────────────────────

    /// Undo the last operation
    pub fn undo(&mut self) -> bool {
        self.abort_gestures();
        let undone = self.scene.revert();
        self.selection.retain_existing(&self.scene.scene);
        undone
    }

    /// Redo the last undone operation
    pub fn redo(&mut self) -> bool {
        self.abort_gestures();
        let redone = self.scene.advance();
        self.selection.retain_existing(&self.scene.scene);
        redone
    }

    // ── Proximity queries ─────────────────────────────────────

    fn mode(&self, mode: Option<CircleMode>) -> CircleMode {
        mode.unwrap_or(self.scene.config.proximity.circle_mode)
    }

    pub fn closest_structure(&self, point: Point2D, mode: Option<CircleMode>) -> Option<ClosestStructure> {
        closest_enabled_structure(&self.scene.scene, point, None, self.mode(mode))
    }

    pub fn closest_atom(&self, point: Point2D, mode: Option<CircleMode>) -> Option<ClosestAtom> {
        closest_enabled_atom(&self.scene.scene, point, None, self.mode(mode))
    }

    /// Nearest real atom, looking inside structures shown as circles
    pub fn closest_atom_detailed(&self, point: Point2D) -> Option<ClosestAtom> {
        closest_atom_resolving_circles(&self.scene.scene, point, None)
    }

    pub fn closest_ring(&self, point: Point2D, mode: Option<CircleMode>) -> Option<ClosestRing> {
        closest_enabled_ring(&self.scene.scene, point, None, self.mode(mode))
    }

    pub fn closest_control_point(&self, point: Point2D) -> Option<ClosestControlPoint> {
        closest_enabled_spline_control_point(&self.scene.scene, point, None, CircleMode::default())
    }

    // ── Inspection ────────────────────────────────────────────

    /// Number of enabled structures
    pub fn structure_count(&self) -> usize {
        self.scene.scene.structures.values().filter(|s| s.enabled).count()
    }

    /// Number of enabled, visible structures
    pub fn visible_structure_count(&self) -> usize {
        self.scene.scene.structures.values().filter(|s| s.is_live()).count()
    }

    pub fn annotation_count(&self) -> usize {
        self.scene.scene.annotations.values().filter(|a| a.enabled).count()
    }

    pub fn spline_count(&self) -> usize {
        self.scene.scene.splines.values().filter(|s| s.enabled).count()
    }

    pub fn intermolecular_count(&self) -> usize {
        self.scene
            .scene
            .intermolecular
            .iter()
            .filter(|(_, e)| e.enabled)
            .count()
    }

    pub fn atom_position(&self, structure_id: StructureId, atom_id: u32) -> Option<Point2D> {
        self.scene.get_structure(structure_id)?.atom_position(atom_id)
    }
}

/// Object a selection entry belongs to for removal
fn top_level(target: ObjectRef) -> ObjectRef {
    match target {
        ObjectRef::ControlPoint { spline_id, .. } => ObjectRef::Spline { spline_id },
        other => other
            .owning_structure()
            .map_or(other, |structure_id| ObjectRef::Structure { structure_id }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn p(x: f64, y: f64) -> Point2D {
        Point2D::new(x, y)
    }

    #[test]
    fn test_new_editor_empty() {
        let e = Editor::new();
        assert_eq!(e.structure_count(), 0);
        assert!(!e.scene.can_revert());
    }

    #[test]
    fn test_add_and_undo_structure() {
        let mut e = Editor::new();
        e.add_structure(fixtures::chain("s", &[(0.0, 0.0), (1.0, 0.0)]));
        assert_eq!(e.structure_count(), 1);
        assert!(e.undo());
        assert_eq!(e.structure_count(), 0);
        assert!(e.redo());
        assert_eq!(e.structure_count(), 1);
    }

    #[test]
    fn test_click_selects_atom_and_miss_clears() {
        let mut e = Editor::new();
        let sid = e.add_structure(fixtures::chain("s", &[(0.0, 0.0), (5.0, 0.0)]));
        let hit = e.click(p(5.0, 0.1), false);
        assert_eq!(
            hit.map(|h| h.object_ref()),
            Some(ObjectRef::Atom {
                structure_id: sid,
                atom_id: 1
            })
        );
        assert_eq!(e.selection.count(), 1);
        assert!(e.click(p(50.0, 50.0), false).is_none());
        assert_eq!(e.selection.count(), 0);
    }

    #[test]
    fn test_additive_click_toggles() {
        let mut e = Editor::new();
        e.add_structure(fixtures::chain("s", &[(0.0, 0.0), (5.0, 0.0)]));
        e.click(p(0.0, 0.0), false);
        e.click(p(5.0, 0.0), true);
        assert_eq!(e.selection.count(), 2);
        e.click(p(0.0, 0.0), true);
        assert_eq!(e.selection.count(), 1);
    }

    #[test]
    fn test_move_commits_one_step() {
        let mut e = Editor::new();
        let sid = e.add_structure(fixtures::chain("s", &[(0.0, 0.0), (1.0, 0.0)]));
        e.select(&[ObjectRef::Structure { structure_id: sid }]);
        assert!(e.begin_move(p(0.0, 0.0)));
        e.drag_to(p(1.0, 1.0));
        e.drag_to(p(2.0, 3.0));
        assert_eq!(e.atom_position(sid, 0), Some(p(0.0, 0.0)));
        let step = e.end_gesture();
        assert_eq!(step, Some(1));
        assert_eq!(e.atom_position(sid, 0), Some(p(2.0, 3.0)));
        assert!(e.undo());
        assert_eq!(e.atom_position(sid, 0), Some(p(0.0, 0.0)));
    }

    #[test]
    fn test_zero_move_is_not_committed() {
        let mut e = Editor::new();
        let sid = e.add_structure(fixtures::chain("s", &[(0.0, 0.0)]));
        e.select(&[ObjectRef::Structure { structure_id: sid }]);
        e.begin_move(p(0.0, 0.0));
        e.drag_to(p(0.0, 0.0));
        assert_eq!(e.end_gesture(), None);
        assert_eq!(e.scene.step_count(), 1);
    }

    #[test]
    fn test_cancel_gesture_leaves_scene() {
        let mut e = Editor::new();
        let sid = e.add_structure(fixtures::chain("s", &[(0.0, 0.0)]));
        e.select(&[ObjectRef::Structure { structure_id: sid }]);
        e.begin_move(p(0.0, 0.0));
        e.drag_to(p(4.0, 0.0));
        e.cancel_gesture();
        assert_eq!(e.end_gesture(), None);
        assert_eq!(e.atom_position(sid, 0), Some(p(0.0, 0.0)));
    }

    #[test]
    fn test_remove_selected_atom_removes_structure() {
        let mut e = Editor::new();
        let sid = e.add_structure(fixtures::chain("s", &[(0.0, 0.0)]));
        e.select(&[ObjectRef::Atom {
            structure_id: sid,
            atom_id: 0,
        }]);
        assert_eq!(e.remove_selected(), 1);
        assert_eq!(e.structure_count(), 0);
        assert_eq!(e.selection.count(), 0);
    }

    #[test]
    fn test_undo_drops_selection_of_retired_objects() {
        let mut e = Editor::new();
        e.add_structure(fixtures::chain("a", &[(0.0, 0.0)]));
        let b = e.add_structure(fixtures::chain("b", &[(5.0, 0.0)]));
        e.select(&[ObjectRef::Structure { structure_id: b }]);
        assert!(e.undo());
        assert_eq!(e.selection.count(), 0);
    }

    #[test]
    fn test_top_level_mapping() {
        assert_eq!(
            top_level(ObjectRef::Edge {
                structure_id: 3,
                edge_id: 1
            }),
            ObjectRef::Structure { structure_id: 3 }
        );
        assert_eq!(
            top_level(ObjectRef::ControlPoint {
                spline_id: 2,
                point_id: 0
            }),
            ObjectRef::Spline { spline_id: 2 }
        );
        assert_eq!(
            top_level(ObjectRef::Annotation { annotation_id: 4 }),
            ObjectRef::Annotation { annotation_id: 4 }
        );
    }
}
