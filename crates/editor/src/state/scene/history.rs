//! Undo/redo functionality
//!
//! History is a list of committed steps plus a cursor pointing at the
//! last applied one (`None` before the first step). Undo reverts the step
//! under the cursor and moves back; redo re-applies the next step.
//! Committing while the cursor is not at the end discards the later steps
//! and physically deletes the objects they created.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use shared::{ColorState, Scene};

use super::{Change, SceneState};
use crate::state::settings::EditorConfig;

/// Notification a step asks for whenever it is applied or reverted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    /// Hand the full scene to the snapshot listener
    EmitSnapshot,
    /// Hand the colour state to the colour listener
    Recolor,
}

/// One undoable unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStep {
    pub changes: Vec<Change>,
    #[serde(default)]
    pub actions: BTreeSet<StepAction>,
    /// Editor configuration captured when the step was committed
    #[serde(default)]
    pub config: EditorConfig,
}

impl HistoryStep {
    pub fn new(changes: Vec<Change>) -> Self {
        let mut actions = BTreeSet::new();
        if changes.iter().any(Change::affects_color) {
            actions.insert(StepAction::Recolor);
        }
        Self {
            changes,
            actions,
            config: EditorConfig::default(),
        }
    }

    pub fn with_action(mut self, action: StepAction) -> Self {
        self.actions.insert(action);
        self
    }
}

/// Committed steps and the cursor into them
#[derive(Debug, Clone, Default)]
pub struct History {
    steps: Vec<HistoryStep>,
    cursor: Option<usize>,
}

impl History {
    /// Index of the last applied step, `None` at the start
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[HistoryStep] {
        &self.steps
    }

    /// Index the next committed step will get
    pub fn next_index(&self) -> usize {
        self.cursor.map_or(0, |c| c + 1)
    }

    pub fn can_revert(&self) -> bool {
        self.cursor.is_some()
    }

    pub fn can_advance(&self) -> bool {
        self.next_index() < self.steps.len()
    }

    /// Drop every step after the cursor. Returns whether anything was dropped.
    fn truncate(&mut self) -> bool {
        let keep = self.next_index();
        if keep >= self.steps.len() {
            return false;
        }
        self.steps.truncate(keep);
        true
    }

    fn clear(&mut self) {
        self.steps.clear();
        self.cursor = None;
    }
}

/// Listeners fired by step actions
#[derive(Default)]
pub struct HistoryHooks {
    snapshot: Option<Box<dyn FnMut(&Scene)>>,
    color: Option<Box<dyn FnMut(&ColorState)>>,
}

impl std::fmt::Debug for HistoryHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryHooks")
            .field("snapshot", &self.snapshot.is_some())
            .field("color", &self.color.is_some())
            .finish()
    }
}

impl SceneState {
    /// Register the listener for `StepAction::EmitSnapshot`
    pub fn set_snapshot_callback(&mut self, callback: impl FnMut(&Scene) + 'static) {
        self.hooks.snapshot = Some(Box::new(callback));
    }

    /// Register the listener for `StepAction::Recolor`
    pub fn set_color_callback(&mut self, callback: impl FnMut(&ColorState) + 'static) {
        self.hooks.color = Some(Box::new(callback));
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn cursor(&self) -> Option<usize> {
        self.history.cursor()
    }

    pub fn step_count(&self) -> usize {
        self.history.len()
    }

    /// Check if undo is available
    pub fn can_revert(&self) -> bool {
        self.history.can_revert()
    }

    /// Check if redo is available
    pub fn can_advance(&self) -> bool {
        self.history.can_advance()
    }

    /// Step index objects created now will be committed under
    pub fn next_step_index(&self) -> usize {
        self.history.next_index()
    }

    /// Discard the redo tail and delete the objects it created.
    /// Returns the deleted objects.
    pub fn discard_future(&mut self) -> Vec<shared::ObjectRef> {
        let before = self.history.len();
        if !self.history.truncate() {
            return Vec::new();
        }
        let deleted = self.scene.delete_created_after(self.history.cursor());
        tracing::info!(
            "Discarded {} history steps, deleted {} objects",
            before - self.history.len(),
            deleted.len()
        );
        self.version += 1;
        deleted
    }

    /// Record and apply a step. Returns its index.
    pub fn commit(&mut self, mut step: HistoryStep) -> usize {
        self.discard_future();

        for change in &step.changes {
            change.apply(&mut self.scene);
        }
        step.config = self.config.clone();

        let index = self.history.steps.len();
        let actions = step.actions.clone();
        tracing::debug!("Committed step {} ({} changes)", index, step.changes.len());
        self.history.steps.push(step);
        self.history.cursor = Some(index);
        self.version += 1;
        self.fire(&actions);
        index
    }

    /// Undo the current step, then keep undoing while the scene shows no
    /// structure and there is more to undo. Returns false at the start.
    pub fn revert(&mut self) -> bool {
        if !self.revert_one() {
            return false;
        }
        while !self.scene.has_visible_structures() && self.history.can_revert() {
            tracing::debug!("Skipping empty scene state while reverting");
            self.revert_one();
        }
        true
    }

    /// Redo the next step, then keep redoing while the scene shows no
    /// structure and there is more to redo. Returns false at the end.
    pub fn advance(&mut self) -> bool {
        if !self.advance_one() {
            return false;
        }
        while !self.scene.has_visible_structures() && self.history.can_advance() {
            tracing::debug!("Skipping empty scene state while advancing");
            self.advance_one();
        }
        true
    }

    fn revert_one(&mut self) -> bool {
        let Some(index) = self.history.cursor else {
            return false;
        };
        let Some(step) = self.history.steps.get(index) else {
            return false;
        };
        // Reverse order so changes to the same field unwind correctly
        for change in step.changes.iter().rev() {
            change.revert(&mut self.scene);
        }
        let actions = step.actions.clone();

        self.history.cursor = index.checked_sub(1);
        self.config = match self.history.cursor {
            Some(prev) => self.history.steps[prev].config.clone(),
            None => self.base_config.clone(),
        };
        self.version += 1;
        tracing::debug!("Reverted step {}", index);
        self.fire(&actions);
        true
    }

    fn advance_one(&mut self) -> bool {
        let index = self.history.next_index();
        let Some(step) = self.history.steps.get(index) else {
            return false;
        };
        for change in &step.changes {
            change.apply(&mut self.scene);
        }
        let actions = step.actions.clone();
        self.config = step.config.clone();

        self.history.cursor = Some(index);
        self.version += 1;
        tracing::debug!("Advanced to step {}", index);
        self.fire(&actions);
        true
    }

    /// Forget all history; the current config becomes the base config.
    ///
    /// Objects whose creation was undone are deleted, and the survivors
    /// lose their creation stamps so later truncations leave them alone.
    pub fn reset_history(&mut self) {
        tracing::info!("History reset ({} steps dropped)", self.history.len());
        self.scene.delete_created_after(self.history.cursor());
        self.scene.forget_creation_steps();
        self.history.clear();
        self.base_config = self.config.clone();
        self.version += 1;
    }

    fn fire(&mut self, actions: &BTreeSet<StepAction>) {
        for action in actions {
            match action {
                StepAction::EmitSnapshot => {
                    if let Some(cb) = self.hooks.snapshot.as_mut() {
                        cb(&self.scene);
                    }
                }
                StepAction::Recolor => {
                    if let Some(cb) = self.hooks.color.as_mut() {
                        cb(&self.scene.color_state());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::fixtures;
    use shared::{ObjectRef, Point2D};

    fn state_with_structure() -> (SceneState, u32) {
        let mut state = SceneState::default();
        let sid = state
            .scene
            .insert_structure(fixtures::chain("s", &[(0.0, 0.0), (1.0, 0.0)]));
        (state, sid)
    }

    fn move_atom(sid: u32, from: (f64, f64), to: (f64, f64)) -> HistoryStep {
        HistoryStep::new(vec![Change::MoveAtom {
            structure_id: sid,
            atom_id: 0,
            from: Point2D::new(from.0, from.1),
            to: Point2D::new(to.0, to.1),
        }])
    }

    #[test]
    fn test_commit_revert_advance_roundtrip() {
        let (mut state, sid) = state_with_structure();
        let start = state.scene.clone();
        state.commit(move_atom(sid, (0.0, 0.0), (5.0, 5.0)));
        state.commit(move_atom(sid, (5.0, 5.0), (7.0, 1.0)));
        let end = state.scene.clone();

        assert!(state.revert());
        assert!(state.revert());
        assert_eq!(state.scene, start);
        assert!(!state.revert());
        assert_eq!(state.cursor(), None);

        assert!(state.advance());
        assert!(state.advance());
        assert_eq!(state.scene, end);
        assert!(!state.advance());
        assert_eq!(state.cursor(), Some(1));
    }

    #[test]
    fn test_commit_after_revert_discards_tail() {
        let (mut state, sid) = state_with_structure();
        state.commit(move_atom(sid, (0.0, 0.0), (1.0, 1.0)));
        state.commit(move_atom(sid, (1.0, 1.0), (2.0, 2.0)));
        state.revert();
        let index = state.commit(move_atom(sid, (1.0, 1.0), (9.0, 9.0)));
        assert_eq!(index, 1);
        assert_eq!(state.step_count(), 2);
        assert!(!state.can_advance());
    }

    #[test]
    fn test_truncation_deletes_objects_created_in_discarded_steps() {
        let (mut state, sid) = state_with_structure();
        state.commit(move_atom(sid, (0.0, 0.0), (1.0, 1.0)));

        // object created by step 1
        let mut late = fixtures::chain("late", &[(9.0, 9.0)]);
        late.enabled = false;
        late.created_at_step = Some(state.next_step_index());
        let late_id = state.scene.insert_structure(late);
        state.commit(HistoryStep::new(vec![Change::enable(ObjectRef::Structure {
            structure_id: late_id,
        })]));

        state.revert();
        assert!(state.scene.structure(late_id).is_some());
        state.commit(move_atom(sid, (1.0, 1.0), (3.0, 3.0)));
        assert!(state.scene.structure(late_id).is_none());
    }

    #[test]
    fn test_revert_skips_empty_scene_states() {
        let (mut state, sid) = state_with_structure();
        let target = ObjectRef::Structure { structure_id: sid };
        state.commit(move_atom(sid, (0.0, 0.0), (1.0, 1.0)));
        state.commit(HistoryStep::new(vec![Change::disable(target)]));
        state.commit(HistoryStep::new(vec![Change::SetColor {
            target,
            from: None,
            to: Some("#ff0000".into()),
        }]));

        // step 2 leaves the scene empty-looking, so undo lands on step 0
        assert!(state.revert());
        assert_eq!(state.cursor(), Some(0));
        assert!(state.scene.has_visible_structures());

        // and redo jumps across it to step 2
        assert!(state.advance());
        assert_eq!(state.cursor(), Some(2));
    }

    #[test]
    fn test_config_snapshot_travels_with_steps() {
        let (mut state, sid) = state_with_structure();
        let base = state.config.clone();
        state.config.display.structure_color = "#abcdef".into();
        state.commit(move_atom(sid, (0.0, 0.0), (1.0, 1.0)));
        state.config.display.structure_color = "#000000".into();

        state.revert();
        assert_eq!(state.config, base);
        state.advance();
        assert_eq!(state.config.display.structure_color, "#abcdef");
    }

    #[test]
    fn test_step_actions_fire_callbacks() {
        let (mut state, sid) = state_with_structure();
        let snapshots = Rc::new(RefCell::new(0));
        let colors = Rc::new(RefCell::new(Vec::new()));
        {
            let snapshots = snapshots.clone();
            state.set_snapshot_callback(move |_| *snapshots.borrow_mut() += 1);
            let colors = colors.clone();
            state.set_color_callback(move |c| colors.borrow_mut().push(c.entries.len()));
        }
        let target = ObjectRef::Structure { structure_id: sid };
        state.commit(
            HistoryStep::new(vec![Change::SetColor {
                target,
                from: None,
                to: Some("#00ff00".into()),
            }])
            .with_action(StepAction::EmitSnapshot),
        );
        state.revert();
        assert_eq!(*snapshots.borrow(), 2);
        assert_eq!(*colors.borrow(), vec![1, 0]);
    }

    #[test]
    fn test_reset_history_rebases_config() {
        let (mut state, sid) = state_with_structure();
        state.commit(move_atom(sid, (0.0, 0.0), (1.0, 1.0)));
        state.config.hit.atom_radius = 2.0;
        state.reset_history();
        assert_eq!(state.step_count(), 0);
        assert!(!state.can_revert());
        state.commit(move_atom(sid, (1.0, 1.0), (2.0, 2.0)));
        state.config.hit.atom_radius = 9.0;
        state.revert();
        assert_eq!(state.config.hit.atom_radius, 2.0);
    }
}
