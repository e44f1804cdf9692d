use shared::{ObjectRef, Scene};

use super::scene::is_retired;

/// Committed selection (supports multi-select)
#[derive(Default)]
pub struct SelectionState {
    /// Selected objects (in order of selection)
    selected: Vec<ObjectRef>,
    /// Version counter for selection changes (for cache invalidation)
    pub version: u64,
}

impl SelectionState {
    /// Primary (first) selected object
    pub fn primary(&self) -> Option<&ObjectRef> {
        self.selected.first()
    }

    /// All selected objects
    pub fn all(&self) -> &[ObjectRef] {
        &self.selected
    }

    /// Check if an object is selected
    pub fn is_selected(&self, target: ObjectRef) -> bool {
        self.selected.contains(&target)
    }

    /// Select a single object (clears previous selection)
    pub fn select(&mut self, target: ObjectRef) {
        self.selected.clear();
        self.selected.push(target);
        self.version += 1;
    }

    /// Toggle selection (Ctrl+click behavior)
    pub fn toggle(&mut self, target: ObjectRef) {
        if let Some(pos) = self.selected.iter().position(|s| *s == target) {
            self.selected.remove(pos);
        } else {
            self.selected.push(target);
        }
        self.version += 1;
    }

    /// Add objects that are not selected yet, keeping their order
    pub fn extend(&mut self, targets: impl IntoIterator<Item = ObjectRef>) -> usize {
        let mut added = 0;
        for target in targets {
            if !self.selected.contains(&target) {
                self.selected.push(target);
                added += 1;
            }
        }
        if added > 0 {
            self.version += 1;
        }
        added
    }

    /// Replace the selection
    pub fn replace(&mut self, targets: impl IntoIterator<Item = ObjectRef>) -> usize {
        self.selected.clear();
        self.version += 1;
        self.extend(targets)
    }

    /// Clear all selection
    pub fn clear(&mut self) {
        if !self.selected.is_empty() {
            self.selected.clear();
            self.version += 1;
        }
    }

    /// Number of selected objects
    pub fn count(&self) -> usize {
        self.selected.len()
    }

    /// Drop entries that were deleted or retired by history
    pub fn retain_existing(&mut self, scene: &Scene) {
        let before = self.selected.len();
        self.selected.retain(|t| !is_retired(scene, *t));
        if self.selected.len() != before {
            self.version += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    fn s(structure_id: u32) -> ObjectRef {
        ObjectRef::Structure { structure_id }
    }

    #[test]
    fn test_initial_empty() {
        let sel = SelectionState::default();
        assert!(sel.primary().is_none());
        assert!(sel.all().is_empty());
        assert_eq!(sel.count(), 0);
    }

    #[test]
    fn test_select_clears_previous() {
        let mut sel = SelectionState::default();
        sel.select(s(0));
        sel.select(s(1));
        assert_eq!(sel.count(), 1);
        assert!(!sel.is_selected(s(0)));
        assert!(sel.is_selected(s(1)));
    }

    #[test]
    fn test_toggle_add_and_remove() {
        let mut sel = SelectionState::default();
        sel.select(s(0));
        sel.toggle(s(1));
        assert_eq!(sel.count(), 2);
        sel.toggle(s(0));
        assert_eq!(sel.all(), &[s(1)]);
    }

    #[test]
    fn test_extend_dedups_and_preserves_order() {
        let mut sel = SelectionState::default();
        sel.select(s(2));
        assert_eq!(sel.extend([s(0), s(2), s(1), s(0)]), 2);
        assert_eq!(sel.all(), &[s(2), s(0), s(1)]);
        assert_eq!(sel.primary(), Some(&s(2)));
    }

    #[test]
    fn test_clear_bumps_version_only_when_needed() {
        let mut sel = SelectionState::default();
        sel.clear();
        assert_eq!(sel.version, 0);
        sel.select(s(0));
        sel.clear();
        assert_eq!(sel.version, 2);
    }

    #[test]
    fn test_retain_existing_drops_retired_entries() {
        let mut scene = Scene::default();
        let live = scene.insert_structure(fixtures::chain("live", &[(0.0, 0.0)]));
        let mut off = fixtures::chain("off", &[(1.0, 0.0)]);
        off.enabled = false;
        let off = scene.insert_structure(off);

        let mut sel = SelectionState::default();
        sel.extend([
            s(live),
            ObjectRef::Atom {
                structure_id: off,
                atom_id: 0,
            },
            s(42),
        ]);
        sel.retain_existing(&scene);
        assert_eq!(sel.all(), &[s(live)]);
    }
}
