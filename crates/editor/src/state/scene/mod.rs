//! Scene state management
//!
//! This module provides the scene catalog together with its undo/redo
//! history and the editor configuration that travels with it.

mod changes;
mod display;
mod history;
mod object_ops;
mod persistence;
mod transform_ops;

pub use changes::Change;
pub use display::{object_display_name, short_kind};
pub use history::{History, HistoryHooks, HistoryStep, StepAction};
pub use object_ops::is_retired;

use shared::{Annotation, AnnotationId, Scene, SceneError, Structure, StructureId};

use crate::shape::structure_boundary;
use crate::state::settings::EditorConfig;

/// Scene catalog with its history
#[derive(Default)]
pub struct SceneState {
    /// Current scene catalog
    pub scene: Scene,
    /// Live editor configuration
    pub config: EditorConfig,
    /// Configuration in force before the first step
    pub(crate) base_config: EditorConfig,
    pub(crate) history: History,
    pub(crate) hooks: HistoryHooks,
    /// Monotonically increasing version counter for cache invalidation
    pub(crate) version: u64,
}

impl SceneState {
    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            base_config: config.clone(),
            config,
            ..Self::default()
        }
    }

    /// Current scene version (increments on every mutation)
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Get a structure by ID
    pub fn get_structure(&self, id: StructureId) -> Option<&Structure> {
        self.scene.structure(id)
    }

    /// Get an annotation by ID
    pub fn get_annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.scene.annotation(id)
    }

    /// Replace the scene, validating it and starting a fresh history
    pub fn load_scene(&mut self, mut scene: Scene) -> Result<(), SceneError> {
        scene.validate()?;
        scene.forget_creation_steps();
        for (_, s) in scene.structures.iter_mut() {
            if s.boundary.is_empty() {
                s.boundary = structure_boundary(s);
            }
        }
        tracing::info!(
            "Loaded scene: {} structures, {} annotations, {} splines, {} intermolecular edges",
            scene.structures.len(),
            scene.annotations.len(),
            scene.splines.len(),
            scene.intermolecular.len()
        );
        self.scene = scene;
        self.reset_history();
        Ok(())
    }
}
