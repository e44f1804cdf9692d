//! Gesture commit operations

use super::{HistoryStep, SceneState, StepAction};
use crate::change_map::ChangeMap;

impl SceneState {
    /// Commit the outcome of a gesture. Empty maps (the gesture moved
    /// nothing) leave history untouched and return `None`.
    pub fn commit_change_map(&mut self, map: ChangeMap) -> Option<usize> {
        if map.is_empty() {
            tracing::debug!("Gesture produced no changes");
            return None;
        }
        let changes = map.into_changes();
        Some(self.commit(HistoryStep::new(changes).with_action(StepAction::EmitSnapshot)))
    }
}
