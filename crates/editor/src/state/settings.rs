//! Editor settings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::closest::CircleMode;

/// Hit-testing sizes, in diagram units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitSettings {
    /// Radius of the circle an atom is hit-tested as
    pub atom_radius: f64,
    /// Stroke width of a bond
    pub edge_width: f64,
    /// Stroke width of an inter-structure edge
    pub intermolecular_width: f64,
    /// Radius of a spline control point handle
    pub control_point_radius: f64,
    /// Stroke width of a spline path
    pub spline_width: f64,
    /// Radius of the proxy circle hidden objects are tested with
    pub hidden_proxy_radius: f64,
}

impl Default for HitSettings {
    fn default() -> Self {
        Self {
            atom_radius: 0.4,
            edge_width: 0.2,
            intermolecular_width: 0.2,
            control_point_radius: 0.3,
            spline_width: 0.3,
            hidden_proxy_radius: 0.15,
        }
    }
}

/// Closest-object search defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximitySettings {
    /// How structures shown as a circle take part in searches
    pub circle_mode: CircleMode,
    /// Extra radius added around the atoms when a circle is first created
    #[serde(default = "default_circle_padding")]
    pub circle_padding: f64,
}

fn default_circle_padding() -> f64 {
    0.5
}

impl Default for ProximitySettings {
    fn default() -> Self {
        Self {
            circle_mode: CircleMode::default(),
            circle_padding: default_circle_padding(),
        }
    }
}

/// Display state that travels with history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Colour used for structures without an explicit colour
    pub structure_color: String,
    /// Selection highlight colour
    pub highlight_color: String,
    /// Draw hidden objects as faint placeholders
    pub show_hidden: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            structure_color: "#303030".to_string(),
            highlight_color: "#00dcff".to_string(),
            show_hidden: false,
        }
    }
}

/// All editor settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Hit-testing sizes
    #[serde(default)]
    pub hit: HitSettings,
    /// Closest-object search defaults
    #[serde(default)]
    pub proximity: ProximitySettings,
    /// Display state
    #[serde(default)]
    pub display: DisplaySettings,
}

impl EditorConfig {
    /// Settings file under the platform config directory
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("org", "molscene", "molscene-editor")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings from file, or return default if not found
    pub fn load() -> Self {
        Self::default_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Read settings from `path`. None when missing or unreadable.
    pub fn load_from(path: &Path) -> Option<Self> {
        let json = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&json) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!("Ignoring unreadable settings {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Save settings to file
    pub fn save(&self) {
        let Some(path) = Self::default_path() else {
            return;
        };
        if let Err(e) = self.save_to(&path) {
            tracing::warn!("{e}");
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| format!("Cannot create {}: {}", dir.display(), e))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize settings: {e}"))?;
        std::fs::write(path, json)
            .map_err(|e| format!("Failed to save settings to {}: {}", path.display(), e))?;
        tracing::info!("Saved settings to {}", path.display());
        Ok(())
    }
}
