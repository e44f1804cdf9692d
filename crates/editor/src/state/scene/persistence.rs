//! Scene file load/save

use std::path::Path;

use shared::Scene;

use super::SceneState;

impl SceneState {
    /// Parse a scene from JSON text
    pub fn parse_scene(json: &str) -> Result<Scene, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid scene JSON: {}", e))
    }

    /// Read a scene file
    pub fn read_scene_file(path: &Path) -> Result<Scene, String> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {}", path.display(), e))?;
        Self::parse_scene(&json)
    }

    /// Serialize the current scene
    pub fn scene_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(&self.scene).map_err(|e| format!("Serialization failed: {}", e))
    }

    /// Write the current scene to a file
    pub fn write_scene_file(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Cannot create {}: {}", parent.display(), e))?;
            }
        }
        let json = self.scene_json()?;
        std::fs::write(path, json).map_err(|e| format!("Cannot write {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scene_error_message() {
        let err = SceneState::parse_scene("{not json").unwrap_err();
        assert!(err.starts_with("Invalid scene JSON"));
    }

    #[test]
    fn test_scene_json_reparses() {
        let state = SceneState::default();
        let json = state.scene_json().unwrap();
        assert_eq!(SceneState::parse_scene(&json).unwrap(), state.scene);
    }
}
