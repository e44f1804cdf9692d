pub mod interaction;
pub mod scene;
pub mod selection;
pub mod settings;

pub use interaction::{AffectedObjects, GestureKind, InteractionObject, TempCoordinates};
pub use scene::{object_display_name, short_kind, Change, HistoryStep, SceneState, StepAction};
pub use selection::SelectionState;
pub use settings::{DisplaySettings, EditorConfig, HitSettings, ProximitySettings};
